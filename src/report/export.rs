//! Exports: filtered rows as CSV, page models as JSON, and a zip bundle of both

use std::io::{Cursor, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use serde::Serialize;

use super::pages::DashboardPages;
use crate::pipeline::error::DashboardError;
use crate::pipeline::filter::FilterSpec;
use crate::pipeline::preprocess::{PreprocessConfig, PreprocessReport};

/// Entry names inside the bundle
pub const BUNDLE_CSV_NAME: &str = "filtered.csv";
pub const BUNDLE_JSON_NAME: &str = "dashboard.json";

fn export_error(path: &Path, reason: impl ToString) -> DashboardError {
    DashboardError::Export {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Serialise a table as CSV with a header row.
pub fn csv_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    let mut df = df.clone();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .finish(&mut df)
        .context("Failed to serialize table as CSV")?;
    Ok(buffer.into_inner())
}

/// Write the filtered table to `path`, keeping the cleaned table's columns.
pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
    let bytes = csv_bytes(df)?;
    std::fs::write(path, bytes).map_err(|e| export_error(path, e))?;
    log::debug!("wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Run context recorded alongside the page models
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub version: String,
    pub source: String,
    pub rows_total: usize,
    pub rows_filtered: usize,
    pub filters: FilterSpec,
    pub preprocessing: PreprocessConfig,
}

/// Everything the JSON export contains
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub preprocess: PreprocessReport,
    pub pages: DashboardPages,
}

/// Inputs of one dashboard report
pub struct ReportParams<'a> {
    pub source: String,
    pub rows_total: usize,
    pub filtered: &'a DataFrame,
    pub filters: &'a FilterSpec,
    pub config: &'a PreprocessConfig,
    pub preprocess: &'a PreprocessReport,
}

impl DashboardReport {
    pub fn build(params: ReportParams<'_>) -> Result<Self> {
        Ok(Self {
            metadata: ReportMetadata {
                generated_at: Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                source: params.source,
                rows_total: params.rows_total,
                rows_filtered: params.filtered.height(),
                filters: params.filters.clone(),
                preprocessing: params.config.clone(),
            },
            preprocess: params.preprocess.clone(),
            pages: DashboardPages::compute(params.filtered)?,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize dashboard report to JSON")
    }
}

pub fn export_dashboard_report(report: &DashboardReport, path: &Path) -> Result<()> {
    let json = report.to_json()?;
    std::fs::write(path, json).map_err(|e| export_error(path, e))?;
    Ok(())
}

/// Zip the filtered rows and the report into one archive.
pub fn package_bundle(filtered: &DataFrame, report: &DashboardReport, zip_path: &Path) -> Result<()> {
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    let zip_file = std::fs::File::create(zip_path).map_err(|e| export_error(zip_path, e))?;
    let mut zip = ZipWriter::new(zip_file);
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let entries = [
        (BUNDLE_CSV_NAME, csv_bytes(filtered)?),
        (BUNDLE_JSON_NAME, report.to_json()?.into_bytes()),
    ];
    for (name, content) in entries {
        zip.start_file(name, options)
            .with_context(|| format!("Failed to add {} to zip", name))?;
        zip.write_all(&content)?;
    }

    zip.finish().map_err(|e| export_error(zip_path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_csv_bytes_has_header() {
        let df = df! { "a" => [1i64, 2], "b" => ["x", "y"] }.unwrap();
        let text = String::from_utf8(csv_bytes(&df).unwrap()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("a,b"));
        assert_eq!(lines.next(), Some("1,x"));
    }

    #[test]
    fn test_write_to_missing_directory_is_export_error() {
        let df = df! { "a" => [1i64] }.unwrap();
        let err = write_csv(&df, Path::new("/nonexistent-dir/out.csv")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DashboardError>(),
            Some(DashboardError::Export { .. })
        ));
    }
}
