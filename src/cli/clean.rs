//! `clean` subcommand: run the preprocessing pipeline and write the result to CSV

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use console::style;

use super::args::default_clean_output;
use super::prompts::confirm_overwrite;
use crate::pipeline::loader::{load_dataset_with_progress, DataSource};
use crate::pipeline::preprocess::{preprocess, PreprocessConfig};
use crate::report::export::write_csv;
use crate::utils::create_spinner;

/// Clean `input` with the default thresholds and write it to `output`
/// (or `<stem>_clean.csv` beside the input).
pub fn run_clean(
    input: &Path,
    output: Option<&Path>,
    infer_schema_length: usize,
    no_confirm: bool,
) -> Result<()> {
    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_clean_output(input));

    println!("\n {} Cleaning application table", style("◆").cyan().bold());
    println!("   Input:  {}", style(input.display()).dim());
    println!("   Output: {}", style(output_path.display()).dim());
    println!();

    if !confirm_overwrite(&output_path, no_confirm)? {
        println!("   {}", style("Skipped: output exists").yellow());
        return Ok(());
    }

    let start = Instant::now();
    let source = DataSource::path(input);
    let (raw, rows, cols, _) = load_dataset_with_progress(&source, infer_schema_length)?;

    let spinner = create_spinner("Preprocessing...");
    let prepared = match preprocess(&raw, &PreprocessConfig::default()) {
        Ok(prepared) => prepared,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e);
        }
    };
    spinner.finish_with_message(format!("{} Preprocessed", style("✓").green()));

    let spinner = create_spinner("Writing CSV...");
    write_csv(&prepared.table, &output_path)
        .with_context(|| format!("Failed to write cleaned table to {}", output_path.display()))?;
    spinner.finish_with_message(format!("{} CSV written", style("✓").green()));

    println!();
    println!(
        "   {} rows × {} → {} columns",
        style(rows).yellow(),
        style(cols).yellow(),
        style(prepared.table.width()).yellow()
    );
    println!(
        "   {} dropped, {} imputed, {} derived",
        prepared.report.dropped_columns.len(),
        prepared.report.imputed.len(),
        prepared.report.derived_columns.len()
    );
    println!();
    println!(
        " {} Clean complete in {:.2}s",
        style("✓").green().bold(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
