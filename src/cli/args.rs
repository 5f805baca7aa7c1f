//! Command-line argument definitions using clap

use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::pipeline::filter::{FilterOptions, FilterSpec, NumericRange};
use crate::pipeline::loader::DEFAULT_INFER_SCHEMA_LENGTH;
use crate::pipeline::preprocess::PreprocessConfig;
use crate::report::pages::PageKind;

/// Credscope - explore credit default risk in a loan application table
#[derive(Parser, Debug)]
#[command(name = "credscope")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Input CSV file with one row per loan application
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Pages to print (comma-separated). Defaults to all five.
    #[arg(short, long, value_enum, value_delimiter = ',')]
    pub page: Vec<PageKind>,

    /// Keep only these genders (comma-separated). Defaults to every observed value.
    #[arg(long, value_delimiter = ',')]
    pub gender: Vec<String>,

    /// Keep only these education levels (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub education: Vec<String>,

    /// Keep only these family statuses (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub family_status: Vec<String>,

    /// Keep only these housing types (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub housing: Vec<String>,

    /// Minimum age in years (inclusive)
    #[arg(long)]
    pub age_min: Option<f64>,

    /// Maximum age in years (inclusive)
    #[arg(long)]
    pub age_max: Option<f64>,

    /// Minimum annual income (inclusive)
    #[arg(long)]
    pub income_min: Option<f64>,

    /// Maximum annual income (inclusive)
    #[arg(long)]
    pub income_max: Option<f64>,

    /// Write the filtered rows to this CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Write every page model as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Write a zip archive holding the filtered CSV and the JSON report
    #[arg(long)]
    pub bundle: Option<PathBuf>,

    /// Drop columns whose missing ratio is above this value
    #[arg(long, default_value = "0.6", value_parser = validate_unit_interval)]
    pub missing_threshold: f64,

    /// Collapse categorical levels rarer than this share into "Other"
    #[arg(long, default_value = "0.01", value_parser = validate_unit_interval)]
    pub rare_threshold: f64,

    /// Lower winsorization quantile
    #[arg(long, default_value = "0.01", value_parser = validate_unit_interval)]
    pub winsor_lower: f64,

    /// Upper winsorization quantile
    #[arg(long, default_value = "0.99", value_parser = validate_unit_interval)]
    pub winsor_upper: f64,

    /// Number of rows to use for schema inference.
    /// Use 0 for full table scan (slow for large files).
    #[arg(long, default_value_t = DEFAULT_INFER_SCHEMA_LENGTH)]
    pub infer_schema_length: usize,

    /// Browse the pages in an interactive terminal dashboard
    #[arg(long, default_value = "false")]
    pub interactive: bool,

    /// Skip interactive confirmation prompts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clean a CSV file and write the prepared table to CSV
    Clean {
        /// Input CSV file
        input: PathBuf,

        /// Output file path (optional, defaults to '<input>_clean.csv')
        output: Option<PathBuf>,

        /// Number of rows to use for schema inference.
        /// Use 0 for full table scan (slow for large files).
        #[arg(long, default_value_t = DEFAULT_INFER_SCHEMA_LENGTH)]
        infer_schema_length: usize,
    },
}

impl Cli {
    pub fn input(&self) -> Option<&PathBuf> {
        self.input.as_ref()
    }

    /// Pages to show, all of them when none were named.
    pub fn pages(&self) -> Vec<PageKind> {
        if self.page.is_empty() {
            PageKind::ALL.to_vec()
        } else {
            let mut seen = HashSet::new();
            self.page.iter().copied().filter(|p| seen.insert(*p)).collect()
        }
    }

    pub fn preprocess_config(&self) -> PreprocessConfig {
        PreprocessConfig {
            missing_threshold: self.missing_threshold,
            rare_threshold: self.rare_threshold,
            winsor_lower: self.winsor_lower,
            winsor_upper: self.winsor_upper,
            ..PreprocessConfig::default()
        }
    }

    /// The select-all spec with every dimension named on the command line
    /// replaced by the user's choice.
    pub fn filter_spec(&self, options: &FilterOptions) -> FilterSpec {
        let mut spec = FilterSpec::select_all(options);

        let overrides = [
            (&mut spec.gender, &self.gender),
            (&mut spec.education, &self.education),
            (&mut spec.family_status, &self.family_status),
            (&mut spec.housing, &self.housing),
        ];
        for (selected, requested) in overrides {
            if !requested.is_empty() {
                *selected = requested.iter().map(|v| v.trim().to_string()).collect();
            }
        }

        spec.age = override_range(spec.age, self.age_min, self.age_max);
        spec.income = override_range(spec.income, self.income_min, self.income_max);
        spec
    }

    pub fn has_exports(&self) -> bool {
        self.export.is_some() || self.report.is_some() || self.bundle.is_some()
    }
}

fn override_range(base: NumericRange, min: Option<f64>, max: Option<f64>) -> NumericRange {
    NumericRange::new(min.unwrap_or(base.min), max.unwrap_or(base.max))
}

/// Default output path of the `clean` subcommand: `<stem>_clean.csv` beside the input.
pub fn default_clean_output(input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    parent.join(format!("{}_clean.csv", stem))
}

/// Validator for thresholds that are fractions
fn validate_unit_interval(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(0.0..=1.0).contains(&value) {
        Err(format!("value must be between 0.0 and 1.0, got {}", value))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> FilterOptions {
        FilterOptions {
            gender: vec!["F".to_string(), "M".to_string()],
            education: vec!["Higher education".to_string(), "Secondary".to_string()],
            family_status: vec!["Married".to_string()],
            housing: vec!["House / apartment".to_string()],
            age: Some(NumericRange::new(21.0, 69.0)),
            income: Some(NumericRange::new(25_000.0, 900_000.0)),
        }
    }

    #[test]
    fn test_defaults_select_everything() {
        let cli = Cli::parse_from(["credscope", "-i", "data.csv"]);
        let spec = cli.filter_spec(&options());
        assert_eq!(spec, FilterSpec::select_all(&options()));
        assert_eq!(cli.pages(), PageKind::ALL.to_vec());
        assert_eq!(cli.preprocess_config(), PreprocessConfig::default());
    }

    #[test]
    fn test_flags_override_dimensions() {
        let cli = Cli::parse_from([
            "credscope",
            "-i",
            "data.csv",
            "--gender",
            "F",
            "--age-min",
            "30",
            "--income-max",
            "100000",
            "--page",
            "risk,financial,risk",
        ]);
        let spec = cli.filter_spec(&options());

        assert_eq!(spec.gender.len(), 1);
        assert!(spec.gender.contains("F"));
        assert_eq!(spec.education.len(), 2);
        assert_eq!(spec.age, NumericRange::new(30.0, 69.0));
        assert_eq!(spec.income, NumericRange::new(25_000.0, 100_000.0));
        assert_eq!(cli.pages(), vec![PageKind::Risk, PageKind::Financial]);
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let result = Cli::try_parse_from(["credscope", "--missing-threshold", "1.5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_clean_output() {
        let out = default_clean_output(Path::new("/data/application_train.csv"));
        assert_eq!(out, PathBuf::from("/data/application_train_clean.csv"));
    }
}
