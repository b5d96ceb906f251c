use std::path::{Path, PathBuf};

use outline_core::{DocumentOutline, OutlineExtractor};

use crate::prelude::{println, *};

#[derive(Debug, clap::Args)]
pub struct App {
    /// Path to the PDF file
    path: PathBuf,

    /// Write the JSON outline to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(app: App, global: crate::Global) -> Result<()> {
    let extractor = global.extractor()?;
    let outline = outline_for(&app.path, &extractor)?;
    let json = serde_json::to_string_pretty(&outline)?;

    match app.output {
        Some(out) => std::fs::write(&out, json)
            .with_context(|| f!("Failed to write {}", out.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

/// Read and classify one document.
pub fn outline_for(path: &Path, extractor: &OutlineExtractor) -> Result<DocumentOutline> {
    let bytes =
        std::fs::read(path).with_context(|| f!("Failed to read {}", path.display()))?;
    pdf::extract_outline(&bytes, extractor)
        .map_err(|e| eyre!("{}: {}", path.display(), e))
}
