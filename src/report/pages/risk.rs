//! Page 2: target and risk segmentation

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

use super::overview::target_counts;
use super::{Chart, Metric, MetricValue, PageKind, PageView};
use crate::pipeline::aggregate::{
    crosstab_by_target, default_count, default_rate, default_rate_by, five_number_by_target,
    histogram_by_target, mean_by_target, mean_rate, CrossTabRow, GroupRate, SplitHistogramBin,
    TargetSplit, ValueCount,
};
use crate::pipeline::columns::*;
use crate::pipeline::stats::FiveNumberSummary;

#[derive(Debug, Clone, Serialize)]
pub struct RiskPage {
    pub total_defaults: Option<usize>,
    pub default_rate: Option<f64>,
    pub rate_by_gender: Vec<GroupRate>,
    pub rate_by_education: Vec<GroupRate>,
    pub rate_by_family_status: Vec<GroupRate>,
    pub rate_by_housing: Vec<GroupRate>,
    pub avg_income_defaulters: Option<f64>,
    pub avg_credit_defaulters: Option<f64>,
    pub avg_annuity_defaulters: Option<f64>,
    pub avg_employment_defaulters: Option<f64>,
    pub target_counts: Vec<ValueCount>,
    pub income_by_target: TargetSplit<FiveNumberSummary>,
    pub credit_by_target: TargetSplit<FiveNumberSummary>,
    pub age_by_target: TargetSplit<FiveNumberSummary>,
    pub employment_by_target: Vec<SplitHistogramBin>,
    pub contract_by_target: Vec<CrossTabRow>,
}

impl RiskPage {
    pub fn compute(df: &DataFrame) -> Result<Self> {
        Ok(Self {
            total_defaults: default_count(df)?,
            default_rate: default_rate(df)?,
            rate_by_gender: default_rate_by(df, GENDER)?,
            rate_by_education: default_rate_by(df, EDUCATION)?,
            rate_by_family_status: default_rate_by(df, FAMILY_STATUS)?,
            rate_by_housing: default_rate_by(df, HOUSING)?,
            avg_income_defaulters: mean_by_target(df, INCOME_TOTAL)?.defaulted,
            avg_credit_defaulters: mean_by_target(df, CREDIT)?.defaulted,
            avg_annuity_defaulters: mean_by_target(df, ANNUITY)?.defaulted,
            avg_employment_defaulters: mean_by_target(df, EMPLOYMENT_YEARS)?.defaulted,
            target_counts: target_counts(df)?,
            income_by_target: five_number_by_target(df, INCOME_TOTAL)?,
            credit_by_target: five_number_by_target(df, CREDIT)?,
            age_by_target: five_number_by_target(df, AGE_YEARS)?,
            employment_by_target: histogram_by_target(df, EMPLOYMENT_YEARS, 30)?,
            contract_by_target: crosstab_by_target(df, CONTRACT_TYPE)?,
        })
    }

    pub fn view(&self) -> PageView {
        let metrics = vec![
            Metric::new("Total defaults", MetricValue::Count(self.total_defaults)),
            Metric::new("Default rate", MetricValue::Percent(self.default_rate)),
            Metric::new(
                "Avg income (defaulters)",
                MetricValue::Amount(self.avg_income_defaulters),
            ),
            Metric::new(
                "Avg credit (defaulters)",
                MetricValue::Amount(self.avg_credit_defaulters),
            ),
            Metric::new(
                "Avg annuity (defaulters)",
                MetricValue::Amount(self.avg_annuity_defaulters),
            ),
            Metric::new(
                "Avg employment years (defaulters)",
                MetricValue::Years(self.avg_employment_defaulters),
            ),
            Metric::new(
                "Default rate by gender (mean)",
                MetricValue::Percent(mean_rate(&self.rate_by_gender)),
            ),
            Metric::new(
                "Default rate by education (mean)",
                MetricValue::Percent(mean_rate(&self.rate_by_education)),
            ),
            Metric::new(
                "Default rate by family status (mean)",
                MetricValue::Percent(mean_rate(&self.rate_by_family_status)),
            ),
            Metric::new(
                "Default rate by housing (mean)",
                MetricValue::Percent(mean_rate(&self.rate_by_housing)),
            ),
        ];

        let charts = vec![
            Chart::from_counts("Default vs repaid counts", &self.target_counts),
            Chart::from_rates("Default rate by gender", &self.rate_by_gender),
            Chart::from_rates("Default rate by education", &self.rate_by_education),
            Chart::from_rates("Default rate by family status", &self.rate_by_family_status),
            Chart::from_rates("Default rate by housing type", &self.rate_by_housing),
            Chart::from_five_numbers("Income by target", &self.income_by_target),
            Chart::from_five_numbers("Credit by target", &self.credit_by_target),
            Chart::from_five_numbers("Age by target", &self.age_by_target),
            Chart::from_split_histogram("Employment years by target", &self.employment_by_target),
            Chart::from_crosstab("Contract type vs target", &self.contract_by_target),
        ];

        PageView {
            kind: PageKind::Risk,
            title: PageKind::Risk.title().to_string(),
            metrics,
            charts,
        }
    }
}
