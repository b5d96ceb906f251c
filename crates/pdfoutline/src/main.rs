use std::path::{Path, PathBuf};

use crate::prelude::*;
use crate::prelude::println;
use clap::Parser;
use outline_core::{ExtractorConfig, OutlineExtractor};

mod batch;
mod error;
mod extract;
mod inspect;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Extract the title and H1/H2/H3 outline of PDF documents as JSON"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// JSON file overriding the default extractor configuration
    #[clap(long, env = "PDFOUTLINE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "PDFOUTLINE_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

impl Global {
    /// The effective configuration: defaults, overridden by `--config`.
    pub fn extractor_config(&self) -> Result<ExtractorConfig> {
        match &self.config {
            Some(path) => load_config(path),
            None => Ok(ExtractorConfig::default()),
        }
    }

    pub fn extractor(&self) -> Result<OutlineExtractor> {
        let config = self.extractor_config()?;
        OutlineExtractor::new(config).map_err(|e| eyre!(e))
    }
}

fn load_config(path: &Path) -> Result<ExtractorConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| f!("Failed to read configuration file {}", path.display()))?;
    let config = serde_json::from_str(&raw).map_err(|e| Error::InvalidConfig {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    log::debug!("loaded configuration from {}", path.display());
    Ok(config)
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Extract the outline of a single PDF
    Extract(crate::extract::App),

    /// Extract outlines for every PDF in a folder
    Batch(crate::batch::App),

    /// Show font statistics and the classified row stream of a PDF
    Inspect(crate::inspect::App),

    /// Print document metadata
    Info {
        /// Path to the PDF file
        path: PathBuf,
    },

    /// Print the effective extractor configuration
    Config,
}

fn main() -> Result<()> {
    let app = App::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if app.global.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();
    color_eyre::install()?;

    match app.command {
        SubCommands::Extract(sub_app) => crate::extract::run(sub_app, app.global),
        SubCommands::Batch(sub_app) => crate::batch::run(sub_app, app.global),
        SubCommands::Inspect(sub_app) => crate::inspect::run(sub_app, app.global),
        SubCommands::Info { path } => {
            let bytes = std::fs::read(&path)
                .with_context(|| f!("Failed to read {}", path.display()))?;
            let meta = pdf::info(&bytes).map_err(|e| eyre!(e))?;
            println!("{}", serde_json::to_string_pretty(&meta)?);
            Ok(())
        }
        SubCommands::Config => {
            let config = app.global.extractor_config()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
