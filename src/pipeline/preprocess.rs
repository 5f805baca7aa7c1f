//! Cleaning and feature pipeline: raw application table to analysis table
//!
//! Steps run in a fixed order because later steps depend on earlier ones:
//!
//! 1. derive age, tenure and affordability ratios
//! 2. drop columns with too many missing values
//! 3. impute the remaining gaps (median / mode)
//! 4. collapse rare categorical levels into "Other"
//! 5. winsorize numeric columns (on the imputed data)
//! 6. cut income into Low / Mid / High brackets
//! 7. apply the fixed categorical relabelling

use std::time::Instant;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;

use super::binning::add_income_bracket;
use super::categories::{apply_relabels, collapse_rare_levels, CollapsedLevels};
use super::columns::{INCOME_BRACKET, REQUIRED_RAW_COLUMNS, WINSOR_EXEMPT};
use super::error::DashboardError;
use super::features::{derive_features, derived_feature_names};
use super::loader::require_columns;
use super::missing::{analyze_missing_values, get_columns_above_threshold, impute_missing, ImputedColumn};
use super::outliers::{winsorize, ClipBounds};

/// Thresholds of the cleaning pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreprocessConfig {
    /// Drop columns whose missing fraction is above this value
    pub missing_threshold: f64,
    /// Categorical levels rarer than this fraction become "Other"
    pub rare_threshold: f64,
    /// Lower winsorization quantile
    pub winsor_lower: f64,
    /// Upper winsorization quantile
    pub winsor_upper: f64,
    /// Inner cut points of the income brackets
    pub bracket_quantiles: (f64, f64),
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            missing_threshold: 0.6,
            rare_threshold: 0.01,
            winsor_lower: 0.01,
            winsor_upper: 0.99,
            bracket_quantiles: (0.25, 0.75),
        }
    }
}

impl PreprocessConfig {
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f64| -> Result<()> {
            if !(0.0..=1.0).contains(&value) {
                return Err(DashboardError::InvalidConfig(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, value
                ))
                .into());
            }
            Ok(())
        };
        unit("missing_threshold", self.missing_threshold)?;
        unit("rare_threshold", self.rare_threshold)?;
        unit("winsor_lower", self.winsor_lower)?;
        unit("winsor_upper", self.winsor_upper)?;

        if self.winsor_lower > self.winsor_upper {
            return Err(DashboardError::InvalidConfig(format!(
                "winsor_lower ({}) must not exceed winsor_upper ({})",
                self.winsor_lower, self.winsor_upper
            ))
            .into());
        }

        let (low, high) = self.bracket_quantiles;
        if !(0.0 < low && low < high && high < 1.0) {
            return Err(DashboardError::InvalidConfig(format!(
                "bracket quantiles must satisfy 0 < low < high < 1, got ({}, {})",
                low, high
            ))
            .into());
        }
        Ok(())
    }
}

/// What the pipeline changed, for display and export
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreprocessReport {
    pub input_rows: usize,
    pub input_columns: usize,
    pub output_columns: usize,
    pub derived_columns: Vec<String>,
    /// Dropped columns with their missing ratio
    pub dropped_columns: Vec<(String, f64)>,
    pub imputed: Vec<ImputedColumn>,
    pub collapsed: Vec<CollapsedLevels>,
    pub clipped: Vec<ClipBounds>,
    pub income_bracket_edges: Option<[f64; 4]>,
    pub relabelled_cells: usize,
    pub elapsed_ms: u128,
}

/// A cleaned table together with the report of how it was produced
#[derive(Debug, Clone)]
pub struct PreparedTable {
    pub table: DataFrame,
    pub report: PreprocessReport,
}

/// Run the full cleaning pipeline. Pure: the input is not modified and the
/// same input always yields the same output.
pub fn preprocess(raw: &DataFrame, config: &PreprocessConfig) -> Result<PreparedTable> {
    config.validate()?;
    require_columns(raw, &REQUIRED_RAW_COLUMNS)?;

    let start = Instant::now();
    let mut report = PreprocessReport {
        input_rows: raw.height(),
        input_columns: raw.width(),
        ..Default::default()
    };

    // Step 1: feature derivation
    let df = derive_features(raw).context("Failed to derive features")?;
    report.derived_columns = derived_feature_names();
    log::debug!("derived {} feature columns", report.derived_columns.len());

    // Step 2: drop sparse columns
    let missing_ratios = analyze_missing_values(&df)?;
    let to_drop = get_columns_above_threshold(&missing_ratios, config.missing_threshold);
    let df = if to_drop.is_empty() {
        df
    } else {
        log::debug!("dropping {} sparse column(s): {:?}", to_drop.len(), to_drop);
        report.dropped_columns = missing_ratios
            .iter()
            .filter(|(name, _)| to_drop.contains(name))
            .cloned()
            .collect();
        df.drop_many(&to_drop)
    };

    // Step 3: imputation
    let (df, imputed) = impute_missing(&df).context("Failed to impute missing values")?;
    log::debug!("imputed {} column(s)", imputed.len());
    report.imputed = imputed;

    // Step 4: rare levels
    let (df, collapsed) = collapse_rare_levels(&df, config.rare_threshold)
        .context("Failed to collapse rare categories")?;
    report.collapsed = collapsed;

    // Step 5: winsorization
    let (df, clipped) = winsorize(&df, config.winsor_lower, config.winsor_upper, &WINSOR_EXEMPT)
        .context("Failed to winsorize numeric columns")?;
    report.clipped = clipped;

    // Step 6: income brackets
    let (df, edges) = add_income_bracket(&df, config.bracket_quantiles)
        .context("Failed to compute income brackets")?;
    report.income_bracket_edges = edges;
    report.derived_columns.push(INCOME_BRACKET.to_string());

    // Step 7: fixed relabelling
    let (df, relabelled) = apply_relabels(&df).context("Failed to relabel categories")?;
    report.relabelled_cells = relabelled;

    report.output_columns = df.width();
    report.elapsed_ms = start.elapsed().as_millis();
    log::debug!(
        "preprocessed {} rows: {} -> {} columns in {} ms",
        report.input_rows,
        report.input_columns,
        report.output_columns,
        report.elapsed_ms
    );

    Ok(PreparedTable { table: df, report })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PreprocessConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let config = PreprocessConfig {
            missing_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PreprocessConfig {
            winsor_lower: 0.9,
            winsor_upper: 0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PreprocessConfig {
            bracket_quantiles: (0.75, 0.25),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DashboardError>(),
            Some(DashboardError::InvalidConfig(_))
        ));
    }
}
