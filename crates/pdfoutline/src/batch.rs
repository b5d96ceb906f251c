//! Folder driver: one `<stem>_structure.json` per input PDF.

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use outline_core::{DocumentOutline, OutlineExtractor};

use crate::prelude::{println, *};

#[derive(Debug, clap::Args)]
pub struct App {
    /// Folder scanned for `*.pdf` files
    #[arg(default_value = "pdfs")]
    pub input: PathBuf,

    /// Folder receiving the JSON outlines
    #[arg(default_value = "output")]
    pub output: PathBuf,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub processed: usize,
    pub failed: usize,
}

pub fn run(app: App, global: crate::Global) -> Result<()> {
    let extractor = global.extractor()?;
    let files = collect_pdfs(&app.input)?;

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar().template("{bar:40.cyan/blue} {pos}/{len} {msg}")?,
    );

    let summary = process(&files, &app.output, &extractor, &progress)?;
    progress.finish_and_clear();

    println!(
        "Processed {} PDF(s) into {} ({} unreadable)",
        summary.processed,
        app.output.display(),
        summary.failed
    );
    Ok(())
}

/// Every `*.pdf` in `dir` (extension matched case-insensitively), sorted by
/// file name.
pub fn collect_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::InputDirMissing(dir.display().to_string()).into());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| f!("Failed to list {}", dir.display()))?
    {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// `report.PDF` becomes `report_structure.json`.
pub fn output_path(output_dir: &Path, pdf: &Path) -> PathBuf {
    let stem = pdf
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.join(f!("{stem}_structure.json"))
}

/// Extract every file and write its outline.
///
/// A document that cannot be read is logged and recorded with an empty
/// outline; only failures to write the output abort the batch.
pub fn process(
    files: &[PathBuf],
    output_dir: &Path,
    extractor: &OutlineExtractor,
    progress: &ProgressBar,
) -> Result<Summary> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| f!("Failed to create {}", output_dir.display()))?;

    let mut summary = Summary::default();
    for path in files {
        if let Some(name) = path.file_name() {
            progress.set_message(name.to_string_lossy().into_owned());
        }

        let outline = match crate::extract::outline_for(path, extractor) {
            Ok(outline) => outline,
            Err(err) => {
                log::error!("{err:#}");
                summary.failed += 1;
                DocumentOutline::unreadable()
            }
        };

        let target = output_path(output_dir, path);
        let json = serde_json::to_string_pretty(&outline)?;
        std::fs::write(&target, json)
            .with_context(|| f!("Failed to write {}", target.display()))?;
        log::debug!("wrote {}", target.display());

        summary.processed += 1;
        progress.inc(1);
    }
    Ok(summary)
}
