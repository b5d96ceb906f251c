//! Diagnostic view of what the classifier sees, for tuning thresholds.

use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use outline_core::{FontSizeStatistics, NoiseFilter, OutlineExtractor, Page};
use prettytable::{row, Table};

use crate::prelude::{println, *};

#[derive(Debug, clap::Args)]
pub struct App {
    /// Path to the PDF file
    path: PathBuf,

    /// Only list rows of this 0-based page index
    #[arg(long)]
    page: Option<usize>,
}

pub fn run(app: App, global: crate::Global) -> Result<()> {
    let extractor = global.extractor()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(f!("Reading {}", app.path.display()));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let document = pdf::ParsedDocument::open(&app.path).map_err(|e| eyre!(e));
    let pages = document.map(|d| d.pages());
    spinner.finish_and_clear();
    let pages = pages?;

    if let Some(index) = app.page {
        if index >= pages.len() {
            return Err(eyre!(
                "Page {} out of range (document has {} pages)",
                index,
                pages.len()
            ));
        }
    }

    let analysis = extractor.analyze(&pages);

    println!("Font sizes (first {} pages)", extractor.config().statistics.sample_pages);
    statistics_table(&analysis.statistics).printstd();

    println!();
    println!("Title candidates");
    candidates_table(&extractor, &pages, &analysis.statistics).printstd();
    println!("Selected title: {:?} ({:.1}pt)", analysis.title.text, analysis.title.font_size);

    println!();
    println!("Rows");
    rows_table(&pages, extractor.noise_filter(), app.page).printstd();

    Ok(())
}

fn statistics_table(stats: &FontSizeStatistics) -> Table {
    let mut table = new_table();
    table.add_row(row!["RANK", "SIZE", "SPANS"]);
    for (rank, size) in stats.sizes_descending().into_iter().enumerate() {
        table.add_row(row![rank + 1, f!("{size:.1}"), stats.count(size)]);
    }
    table
}

fn candidates_table(extractor: &OutlineExtractor, pages: &[Page], stats: &FontSizeStatistics) -> Table {
    let mut candidates = extractor.title_candidates(pages, stats);
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut table = new_table();
    table.add_row(row!["SCORE", "PAGE", "Y", "SIZE", "TEXT"]);
    for candidate in candidates {
        table.add_row(row![
            f!("{:.1}", candidate.score),
            candidate.page,
            f!("{:.1}", candidate.y_pos()),
            f!("{:.1}", candidate.font_size),
            candidate.text
        ]);
    }
    table
}

/// One line per row: position, dominant size, whether the noise filter
/// drops it entirely.
fn rows_table(pages: &[Page], noise: &NoiseFilter, only: Option<usize>) -> Table {
    let mut table = new_table();
    table.add_row(row!["PAGE", "Y", "SIZE", "NOISE", "TEXT"]);

    for page in pages.iter().filter(|p| only.is_none_or(|i| p.index == i)) {
        for row in page.rows() {
            let Some(first) = row.spans.first() else {
                continue;
            };
            let size = row.spans.iter().map(|s| s.font_size).fold(0.0_f32, f32::max);
            let text: Vec<&str> = row.spans.iter().map(|s| s.text.trim()).collect();
            let is_noise = noise.content_line(row, page.index, page.height).is_none();

            table.add_row(row![
                page.index,
                f!("{:.1}", first.bbox.y0),
                f!("{size:.1}"),
                if is_noise { "yes" } else { "" },
                text.join(" ")
            ]);
        }
    }
    table
}
