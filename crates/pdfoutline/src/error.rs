#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("Input folder not found: {0}")]
    InputDirMissing(String),

    #[error("Invalid configuration file {path}: {reason}")]
    InvalidConfig { path: String, reason: String },
}
