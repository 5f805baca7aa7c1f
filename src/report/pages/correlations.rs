//! Page 5: correlations and risk drivers

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

use super::{Chart, Metric, MetricValue, PageKind, PageView};
use crate::pipeline::aggregate::{
    binned_default_rate, default_rate_by, summarize_by, BinRate, GroupRate, GroupSummary,
};
use crate::pipeline::columns::*;
use crate::pipeline::correlation::{correlation_matrix, numeric_columns, CorrelationMatrix};

const TOP_DRIVERS: usize = 5;
const TOP_ABS: usize = 20;
const STRONG_CORRELATION: f64 = 0.5;

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationsPage {
    /// Correlation of every numeric column with the target, descending
    pub target_correlations: Vec<(String, f64)>,
    pub top_positive: Vec<(String, f64)>,
    pub top_negative: Vec<(String, f64)>,
    pub most_correlated_with_income: Option<String>,
    pub most_correlated_with_credit: Option<String>,
    pub income_credit: Option<f64>,
    pub age_target: Option<f64>,
    pub employment_target: Option<f64>,
    pub family_size_target: Option<f64>,
    /// Sum of the five largest `|corr|` with the target
    pub top_abs_sum: Option<f64>,
    pub strong_count: usize,
    pub heatmap: CorrelationMatrix,
    pub top_abs: Vec<(String, f64)>,
    pub employment_default_rate: Vec<BinRate>,
    pub credit_by_education: Vec<GroupSummary>,
    pub income_by_family_status: Vec<GroupSummary>,
    pub rate_by_gender: Vec<GroupRate>,
    pub rate_by_education: Vec<GroupRate>,
}

fn format_drivers(drivers: &[(String, f64)]) -> Option<String> {
    if drivers.is_empty() {
        return None;
    }
    Some(
        drivers
            .iter()
            .map(|(name, corr)| format!("{} ({:.2})", name, corr))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

impl CorrelationsPage {
    pub fn compute(df: &DataFrame) -> Result<Self> {
        let numeric = numeric_columns(df);
        let names: Vec<&str> = numeric.iter().map(String::as_str).collect();
        let matrix = correlation_matrix(df, &names)?;

        let target_correlations = matrix.column_correlations(TARGET);
        let top_positive: Vec<(String, f64)> =
            target_correlations.iter().take(TOP_DRIVERS).cloned().collect();
        let top_negative: Vec<(String, f64)> = target_correlations
            .iter()
            .rev()
            .take(TOP_DRIVERS)
            .cloned()
            .collect();

        let mut top_abs: Vec<(String, f64)> = target_correlations
            .iter()
            .map(|(name, corr)| (name.clone(), corr.abs()))
            .collect();
        top_abs.sort_by(|a, b| b.1.total_cmp(&a.1));

        let top_abs_sum: Option<f64> = (!top_abs.is_empty())
            .then(|| top_abs.iter().take(TOP_DRIVERS).map(|(_, c)| c).sum());
        let strong_count = top_abs
            .iter()
            .filter(|(_, c)| *c > STRONG_CORRELATION)
            .count();
        top_abs.truncate(TOP_ABS);

        Ok(Self {
            most_correlated_with_income: matrix.strongest_partner(INCOME_TOTAL).map(|p| p.0),
            most_correlated_with_credit: matrix.strongest_partner(CREDIT).map(|p| p.0),
            income_credit: matrix.get(INCOME_TOTAL, CREDIT),
            age_target: matrix.get(AGE_YEARS, TARGET),
            employment_target: matrix.get(EMPLOYMENT_YEARS, TARGET),
            family_size_target: matrix.get(FAMILY_MEMBERS, TARGET),
            top_abs_sum,
            strong_count,
            heatmap: correlation_matrix(df, &[TARGET, CREDIT, INCOME_TOTAL, ANNUITY])?,
            top_abs,
            employment_default_rate: binned_default_rate(df, EMPLOYMENT_YEARS, 20)?,
            credit_by_education: summarize_by(df, CREDIT, EDUCATION)?,
            income_by_family_status: summarize_by(df, INCOME_TOTAL, FAMILY_STATUS)?,
            rate_by_gender: default_rate_by(df, GENDER)?,
            rate_by_education: default_rate_by(df, EDUCATION)?,
            target_correlations,
            top_positive,
            top_negative,
        })
    }

    pub fn view(&self) -> PageView {
        let metrics = vec![
            Metric::new(
                "Top 5 +corr (target)",
                MetricValue::Text(format_drivers(&self.top_positive)),
            ),
            Metric::new(
                "Top 5 -corr (target)",
                MetricValue::Text(format_drivers(&self.top_negative)),
            ),
            Metric::new(
                "Most correlated with income",
                MetricValue::Text(self.most_correlated_with_income.clone()),
            ),
            Metric::new(
                "Most correlated with credit",
                MetricValue::Text(self.most_correlated_with_credit.clone()),
            ),
            Metric::new("Corr(income, credit)", MetricValue::Ratio(self.income_credit)),
            Metric::new("Corr(age, target)", MetricValue::Ratio(self.age_target)),
            Metric::new("Corr(employment years, target)", MetricValue::Ratio(self.employment_target)),
            Metric::new("Corr(family size, target)", MetricValue::Ratio(self.family_size_target)),
            Metric::new("Variance explained (top 5)", MetricValue::Ratio(self.top_abs_sum)),
            Metric::new("Features |corr| > 0.5", MetricValue::Count(Some(self.strong_count))),
        ];

        let charts = vec![
            Chart::heatmap("Heatmap (selected columns)", &self.heatmap),
            Chart::from_correlations("|Correlation| with target (top 20)", &self.top_abs),
            Chart::from_bin_rates("Employment years vs default rate", &self.employment_default_rate),
            Chart::from_group_summaries("Credit by education", &self.credit_by_education),
            Chart::from_group_summaries("Income by family status", &self.income_by_family_status),
            Chart::from_rates("Default rate by gender", &self.rate_by_gender),
            Chart::from_rates("Default rate by education", &self.rate_by_education),
        ];

        PageView {
            kind: PageKind::Correlations,
            title: PageKind::Correlations.title().to_string(),
            metrics,
            charts,
        }
    }
}
