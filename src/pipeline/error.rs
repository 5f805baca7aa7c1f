//! Error taxonomy for loading, preprocessing, filtering and exporting.
//!
//! Pipeline functions return `anyhow::Result` and attach context as they
//! propagate; the variants here are the failures a caller may want to tell
//! apart (via `downcast_ref`) before surfacing them to the user.

use thiserror::Error;

/// Errors raised by the dashboard pipeline.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The source file is missing, unreadable, or not valid CSV.
    #[error("Failed to read data source '{source_name}': {reason}")]
    SourceRead { source_name: String, reason: String },

    /// The source path does not carry a supported extension.
    #[error("Unsupported file format: '{extension}'. Supported formats: csv")]
    UnsupportedFormat { extension: String },

    /// A column the pipeline depends on is absent.
    #[error("Required column '{0}' not found in dataset")]
    MissingColumn(String),

    /// A preprocessing threshold is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A filter range is malformed.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Writing an export artefact failed.
    #[error("Failed to export to '{path}': {reason}")]
    Export { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_item() {
        let err = DashboardError::MissingColumn("DAYS_BIRTH".to_string());
        assert!(err.to_string().contains("DAYS_BIRTH"));

        let err = DashboardError::SourceRead {
            source_name: "train.csv".to_string(),
            reason: "No such file".to_string(),
        };
        assert!(err.to_string().contains("train.csv"));
        assert!(err.to_string().contains("No such file"));
    }

    #[test]
    fn test_downcast_through_anyhow_context() {
        use anyhow::Context;

        let result: anyhow::Result<()> =
            Err(DashboardError::MissingColumn("TARGET".to_string())).context("while preprocessing");
        let err = result.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DashboardError>(),
            Some(DashboardError::MissingColumn(name)) if name == "TARGET"
        ));
    }
}
