//! Page 1: portfolio overview and data quality

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

use super::{Chart, Metric, MetricValue, PageKind, PageView};
use crate::pipeline::aggregate::{
    default_count, default_rate, histogram_of, mean_of, median_of, target_classes, unique_count,
    value_counts, HistogramBin, ValueCount,
};
use crate::pipeline::columns::*;
use crate::pipeline::missing::analyze_missing_values;
use crate::pipeline::stats::mean;

const TOP_MISSING: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct OverviewPage {
    pub total_applicants: Option<usize>,
    pub default_rate: Option<f64>,
    pub repaid_rate: Option<f64>,
    pub total_features: usize,
    /// Mean over columns of each column's missing fraction
    pub avg_missing: Option<f64>,
    pub numeric_features: usize,
    pub categorical_features: usize,
    pub median_age: Option<f64>,
    pub median_income: Option<f64>,
    pub avg_credit: Option<f64>,
    pub target_counts: Vec<ValueCount>,
    pub top_missing: Vec<(String, f64)>,
    pub age_histogram: Vec<HistogramBin>,
    pub income_histogram: Vec<HistogramBin>,
    pub credit_histogram: Vec<HistogramBin>,
    pub gender_counts: Vec<ValueCount>,
    pub family_status_counts: Vec<ValueCount>,
    pub education_counts: Vec<ValueCount>,
}

/// Repaid / Default counts with their shares of labelled rows.
pub(super) fn target_counts(df: &DataFrame) -> Result<Vec<ValueCount>> {
    let Some(classes) = target_classes(df)? else {
        return Ok(Vec::new());
    };
    let labelled: Vec<bool> = classes.into_iter().flatten().collect();
    if labelled.is_empty() {
        return Ok(Vec::new());
    }
    let defaulted = labelled.iter().filter(|d| **d).count();
    let repaid = labelled.len() - defaulted;
    let total = labelled.len() as f64;

    Ok(vec![
        ValueCount {
            value: "Repaid (0)".to_string(),
            count: repaid,
            share: repaid as f64 / total,
        },
        ValueCount {
            value: "Default (1)".to_string(),
            count: defaulted,
            share: defaulted as f64 / total,
        },
    ])
}

impl OverviewPage {
    pub fn compute(df: &DataFrame) -> Result<Self> {
        let default_rate = default_rate(df)?;
        let missing = analyze_missing_values(df)?;
        let ratios: Vec<f64> = missing.iter().map(|(_, r)| *r).collect();

        let numeric_features = df
            .get_columns()
            .iter()
            .filter(|c| c.dtype().is_primitive_numeric())
            .count();
        let categorical_features = df
            .get_columns()
            .iter()
            .filter(|c| matches!(c.dtype(), DataType::String))
            .count();

        log::debug!(
            "overview: {} rows, {:?} defaults",
            df.height(),
            default_count(df)?
        );

        Ok(Self {
            total_applicants: unique_count(df, ID)?,
            default_rate,
            repaid_rate: default_rate.map(|r| 1.0 - r),
            total_features: df.width(),
            avg_missing: mean(&ratios),
            numeric_features,
            categorical_features,
            median_age: median_of(df, AGE_YEARS)?,
            median_income: median_of(df, INCOME_TOTAL)?,
            avg_credit: mean_of(df, CREDIT)?,
            target_counts: target_counts(df)?,
            top_missing: missing.into_iter().take(TOP_MISSING).collect(),
            age_histogram: histogram_of(df, AGE_YEARS, 40)?,
            income_histogram: histogram_of(df, INCOME_TOTAL, 50)?,
            credit_histogram: histogram_of(df, CREDIT, 50)?,
            gender_counts: value_counts(df, GENDER)?,
            family_status_counts: value_counts(df, FAMILY_STATUS)?,
            education_counts: value_counts(df, EDUCATION)?,
        })
    }

    pub fn view(&self) -> PageView {
        let metrics = vec![
            Metric::new("Total applicants", MetricValue::Count(self.total_applicants)),
            Metric::new("Default rate", MetricValue::Percent(self.default_rate)),
            Metric::new("Repaid rate", MetricValue::Percent(self.repaid_rate)),
            Metric::new("Total features", MetricValue::Count(Some(self.total_features))),
            Metric::new("Avg missing per feature", MetricValue::Percent(self.avg_missing)),
            Metric::new("Numerical features", MetricValue::Count(Some(self.numeric_features))),
            Metric::new(
                "Categorical features",
                MetricValue::Count(Some(self.categorical_features)),
            ),
            Metric::new("Median age", MetricValue::Years(self.median_age)),
            Metric::new("Median annual income", MetricValue::Amount(self.median_income)),
            Metric::new("Avg credit amount", MetricValue::Amount(self.avg_credit)),
        ];

        let charts = vec![
            Chart::from_counts("Target distribution", &self.target_counts),
            Chart::from_missing("Top 20 features by missing %", &self.top_missing),
            Chart::from_histogram("Age distribution", &self.age_histogram),
            Chart::from_histogram("Income distribution", &self.income_histogram),
            Chart::from_histogram("Credit amount distribution", &self.credit_histogram),
            Chart::from_counts("Gender distribution", &self.gender_counts),
            Chart::from_counts("Family status distribution", &self.family_status_counts),
            Chart::from_counts("Education distribution", &self.education_counts),
        ];

        PageView {
            kind: PageKind::Overview,
            title: PageKind::Overview.title().to_string(),
            metrics,
            charts,
        }
    }
}
