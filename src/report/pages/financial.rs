//! Page 4: financial health and affordability

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

use super::{Chart, Metric, MetricValue, PageKind, PageView};
use crate::pipeline::aggregate::{
    default_rate_by, five_number_by_target, histogram_of, mean_by_target, mean_of, median_of,
    numeric_share_where, ordered_rates, GroupRate, HistogramBin, TargetSplit,
};
use crate::pipeline::binning::BRACKET_LABELS;
use crate::pipeline::columns::*;
use crate::pipeline::correlation::{correlation_matrix, CorrelationMatrix};
use crate::pipeline::stats::FiveNumberSummary;

/// Credit amount above which a loan counts as high credit
pub const HIGH_CREDIT: f64 = 1_000_000.0;

#[derive(Debug, Clone, Serialize)]
pub struct FinancialPage {
    pub avg_income: Option<f64>,
    pub median_income: Option<f64>,
    pub avg_credit: Option<f64>,
    pub avg_annuity: Option<f64>,
    pub avg_goods_price: Option<f64>,
    pub avg_debt_to_income: Option<f64>,
    pub avg_loan_to_income: Option<f64>,
    /// Mean income of non-defaulters minus that of defaulters
    pub income_gap: Option<f64>,
    pub credit_gap: Option<f64>,
    pub high_credit_share: Option<f64>,
    pub income_histogram: Vec<HistogramBin>,
    pub credit_histogram: Vec<HistogramBin>,
    pub annuity_histogram: Vec<HistogramBin>,
    pub credit_by_target: TargetSplit<FiveNumberSummary>,
    pub income_by_target: TargetSplit<FiveNumberSummary>,
    pub financial_correlation: CorrelationMatrix,
    pub rate_by_income_bracket: Vec<GroupRate>,
}

fn gap(split: TargetSplit<f64>) -> Option<f64> {
    Some(split.repaid? - split.defaulted?)
}

impl FinancialPage {
    pub fn compute(df: &DataFrame) -> Result<Self> {
        Ok(Self {
            avg_income: mean_of(df, INCOME_TOTAL)?,
            median_income: median_of(df, INCOME_TOTAL)?,
            avg_credit: mean_of(df, CREDIT)?,
            avg_annuity: mean_of(df, ANNUITY)?,
            avg_goods_price: mean_of(df, GOODS_PRICE)?,
            avg_debt_to_income: mean_of(df, DEBT_TO_INCOME)?,
            avg_loan_to_income: mean_of(df, LOAN_TO_INCOME)?,
            income_gap: gap(mean_by_target(df, INCOME_TOTAL)?),
            credit_gap: gap(mean_by_target(df, CREDIT)?),
            high_credit_share: numeric_share_where(df, CREDIT, |c| c > HIGH_CREDIT)?,
            income_histogram: histogram_of(df, INCOME_TOTAL, 50)?,
            credit_histogram: histogram_of(df, CREDIT, 50)?,
            annuity_histogram: histogram_of(df, ANNUITY, 50)?,
            credit_by_target: five_number_by_target(df, CREDIT)?,
            income_by_target: five_number_by_target(df, INCOME_TOTAL)?,
            financial_correlation: correlation_matrix(
                df,
                &[INCOME_TOTAL, CREDIT, ANNUITY, DEBT_TO_INCOME, LOAN_TO_INCOME, TARGET],
            )?,
            rate_by_income_bracket: ordered_rates(
                default_rate_by(df, INCOME_BRACKET)?,
                &BRACKET_LABELS,
            ),
        })
    }

    pub fn view(&self) -> PageView {
        let metrics = vec![
            Metric::new("Avg annual income", MetricValue::Amount(self.avg_income)),
            Metric::new("Median annual income", MetricValue::Amount(self.median_income)),
            Metric::new("Avg credit amount", MetricValue::Amount(self.avg_credit)),
            Metric::new("Avg annuity", MetricValue::Amount(self.avg_annuity)),
            Metric::new("Avg goods price", MetricValue::Amount(self.avg_goods_price)),
            Metric::new("Avg DTI", MetricValue::Ratio(self.avg_debt_to_income)),
            Metric::new("Avg loan-to-income", MetricValue::Ratio(self.avg_loan_to_income)),
            Metric::new("Income gap (non-def - def)", MetricValue::Amount(self.income_gap)),
            Metric::new("Credit gap (non-def - def)", MetricValue::Amount(self.credit_gap)),
            Metric::new("% High credit (>1M)", MetricValue::Percent(self.high_credit_share)),
        ];

        let charts = vec![
            Chart::from_histogram("Income distribution", &self.income_histogram),
            Chart::from_histogram("Credit distribution", &self.credit_histogram),
            Chart::from_histogram("Annuity distribution", &self.annuity_histogram),
            Chart::from_five_numbers("Credit by target", &self.credit_by_target),
            Chart::from_five_numbers("Income by target", &self.income_by_target),
            Chart::heatmap("Correlation (financial variables)", &self.financial_correlation),
            Chart::from_rates("Default rate by income bracket", &self.rate_by_income_bracket),
        ];

        PageView {
            kind: PageKind::Financial,
            title: PageKind::Financial.title().to_string(),
            metrics,
            charts,
        }
    }
}
