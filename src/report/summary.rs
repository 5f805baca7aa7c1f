//! Preprocessing summary shown after the table is cleaned

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::preprocess::PreprocessReport;

/// Summary of the cleaning pipeline and of the current filter
#[derive(Debug, Default)]
pub struct PreprocessSummary {
    pub input_rows: usize,
    pub input_columns: usize,
    pub output_columns: usize,
    pub derived: Vec<String>,
    pub dropped_missing: Vec<(String, f64)>,
    pub imputed_columns: usize,
    pub collapsed_columns: Vec<(String, usize)>,
    pub clipped_values: usize,
    pub relabelled_cells: usize,
    pub filtered_rows: Option<usize>,
}

impl PreprocessSummary {
    pub fn from_report(report: &PreprocessReport) -> Self {
        Self {
            input_rows: report.input_rows,
            input_columns: report.input_columns,
            output_columns: report.output_columns,
            derived: report.derived_columns.clone(),
            dropped_missing: report.dropped_columns.clone(),
            imputed_columns: report.imputed.len(),
            collapsed_columns: report
                .collapsed
                .iter()
                .map(|c| (c.column.clone(), c.levels.len()))
                .collect(),
            clipped_values: report.clipped.iter().map(|c| c.clipped).sum(),
            relabelled_cells: report.relabelled_cells,
            filtered_rows: None,
        }
    }

    pub fn set_filtered_rows(&mut self, rows: usize) {
        self.filtered_rows = Some(rows);
    }

    fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("📁 Input rows"), Cell::new(self.input_rows)]);
        table.add_row(vec![Cell::new("📁 Input columns"), Cell::new(self.input_columns)]);
        table.add_row(vec![
            Cell::new("✨ Derived features"),
            Cell::new(self.derived.len()).fg(Color::Cyan),
        ]);
        table.add_row(vec![
            Cell::new("🗑️  Dropped (missing)"),
            Cell::new(self.dropped_missing.len()).fg(if self.dropped_missing.is_empty() {
                Color::White
            } else {
                Color::Red
            }),
        ]);
        table.add_row(vec![
            Cell::new("🩹 Imputed columns"),
            Cell::new(self.imputed_columns),
        ]);
        table.add_row(vec![
            Cell::new("📦 Columns with rare levels"),
            Cell::new(self.collapsed_columns.len()),
        ]);
        table.add_row(vec![
            Cell::new("✂️  Winsorized values"),
            Cell::new(self.clipped_values).fg(if self.clipped_values == 0 {
                Color::White
            } else {
                Color::Yellow
            }),
        ]);
        table.add_row(vec![
            Cell::new("🏷️  Relabelled cells"),
            Cell::new(self.relabelled_cells),
        ]);
        table.add_row(vec![
            Cell::new("✅ Output columns"),
            Cell::new(self.output_columns)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);

        if let Some(rows) = self.filtered_rows {
            let pct = if self.input_rows > 0 {
                rows as f64 / self.input_rows as f64 * 100.0
            } else {
                0.0
            };
            table.add_row(vec![
                Cell::new("🔎 Rows after filters"),
                Cell::new(format!("{} ({:.1}%)", rows, pct))
                    .fg(Color::Green)
                    .add_attribute(Attribute::Bold),
            ]);
        }
        table
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("PREPROCESSING SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        for line in self.to_table().to_string().lines() {
            println!("    {}", line);
        }

        if !self.dropped_missing.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("High Missing Values").yellow(),
                style(format!("({})", self.dropped_missing.len())).dim()
            );
            for (column, ratio) in &self.dropped_missing {
                println!(
                    "        {} {} {}",
                    style("•").dim(),
                    column,
                    style(format!("{:.1}%", ratio * 100.0)).dim()
                );
            }
        }

        if !self.collapsed_columns.is_empty() {
            println!();
            println!("      {}:", style("Rare Levels Collapsed").yellow());
            for (column, levels) in &self.collapsed_columns {
                println!(
                    "        {} {} {}",
                    style("•").dim(),
                    column,
                    style(format!("({} level(s) -> Other)", levels)).dim()
                );
            }
        }
    }
}
