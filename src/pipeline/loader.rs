//! Dataset loader for CSV files and uploaded byte streams

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use polars::prelude::*;

use super::error::DashboardError;
use crate::utils::{create_spinner, finish_with_success};

/// Rows sampled for CSV schema inference unless overridden
pub const DEFAULT_INFER_SCHEMA_LENGTH: usize = 10_000;

/// Where a table comes from
#[derive(Debug, Clone)]
pub enum DataSource {
    /// A CSV file on the local filesystem
    Path(PathBuf),
    /// An uploaded CSV stream, identified by its name
    Upload { name: String, bytes: Arc<[u8]> },
}

/// Identity of a source, used as the cache key.
///
/// Identity is the path as given (or the upload name), never the content:
/// a file rewritten in place keeps its key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKey {
    Path(PathBuf),
    Upload(String),
}

impl DataSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        DataSource::Path(path.into())
    }

    pub fn upload(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        DataSource::Upload {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn key(&self) -> SourceKey {
        match self {
            DataSource::Path(path) => SourceKey::Path(path.clone()),
            DataSource::Upload { name, .. } => SourceKey::Upload(name.clone()),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            DataSource::Path(path) => path.display().to_string(),
            DataSource::Upload { name, .. } => format!("upload:{}", name),
        }
    }
}

fn csv_options(infer_schema_length: usize) -> CsvReadOptions {
    // 0 means full table scan
    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(schema_length)
}

fn check_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if extension != "csv" {
        return Err(DashboardError::UnsupportedFormat { extension }.into());
    }
    Ok(())
}

/// Read a source into memory. Columns match the CSV header exactly.
pub fn load_source(source: &DataSource, infer_schema_length: usize) -> Result<DataFrame> {
    let source_name = source.display_name();
    let read_error = |reason: String| DashboardError::SourceRead {
        source_name: source_name.clone(),
        reason,
    };

    let df = match source {
        DataSource::Path(path) => {
            check_extension(path)?;
            if !path.is_file() {
                return Err(read_error("file does not exist".to_string()).into());
            }
            csv_options(infer_schema_length)
                .try_into_reader_with_file_path(Some(path.clone()))
                .and_then(|reader| reader.finish())
                .map_err(|e| read_error(e.to_string()))?
        }
        DataSource::Upload { bytes, .. } => csv_options(infer_schema_length)
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish()
            .map_err(|e| read_error(e.to_string()))?,
    };

    log::debug!(
        "loaded {} rows x {} columns from {}",
        df.height(),
        df.width(),
        source_name
    );
    Ok(df)
}

/// Load a source with a spinner, returning the table and its
/// `(rows, columns, estimated memory in MB)`.
pub fn load_dataset_with_progress(
    source: &DataSource,
    infer_schema_length: usize,
) -> Result<(DataFrame, usize, usize, f64)> {
    let spinner = create_spinner(&format!("Loading {}...", source.display_name()));
    let result = load_source(source, infer_schema_length);
    let df = match result {
        Ok(df) => df,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e);
        }
    };

    let (rows, cols) = df.shape();
    let memory_mb = df.estimated_size() as f64 / (1024.0 * 1024.0);
    finish_with_success(&spinner, &format!("Loaded {} rows", rows));

    Ok((df, rows, cols, memory_mb))
}

/// Read only the header of a CSV file.
pub fn get_column_names(path: &Path) -> Result<Vec<String>> {
    check_extension(path)?;
    let schema = LazyCsvReader::new(path)
        .with_has_header(true)
        .finish()
        .and_then(|mut lf| lf.collect_schema())
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?;

    Ok(schema.iter_names().map(|name| name.to_string()).collect())
}

/// Fail with [`DashboardError::MissingColumn`] naming the first absent column.
pub fn require_columns(df: &DataFrame, names: &[&str]) -> Result<()> {
    let present = df.get_column_names();
    for name in names {
        if !present.iter().any(|p| p.as_str() == *name) {
            return Err(DashboardError::MissingColumn(name.to_string()).into());
        }
    }
    Ok(())
}
