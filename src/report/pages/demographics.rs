//! Page 3: demographics and household profile

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

use super::{Chart, Metric, MetricValue, PageKind, PageView};
use crate::pipeline::aggregate::{
    five_number_by_target, histogram_by_target, histogram_of, integer_counts, mean_by_target,
    mean_of, numeric_share_where, share_where, value_counts, HistogramBin, SplitHistogramBin,
    TargetSplit, ValueCount,
};
use crate::pipeline::columns::*;
use crate::pipeline::correlation::{correlation_matrix, CorrelationMatrix};
use crate::pipeline::stats::FiveNumberSummary;

const TOP_OCCUPATIONS: usize = 10;

/// Family status levels counted as living without a partner
const UNPARTNERED: [&str; 4] = ["Single", "Separated", "Widow", "Divorced"];

/// Education levels counted as higher education
const HIGHER_EDUCATION: [&str; 3] = ["Higher education", "Academic degree", "Incomplete higher"];

#[derive(Debug, Clone, Serialize)]
pub struct DemographicsPage {
    pub male_share: Option<f64>,
    pub female_share: Option<f64>,
    pub avg_age_defaulters: Option<f64>,
    pub avg_age_non_defaulters: Option<f64>,
    pub with_children_share: Option<f64>,
    pub avg_family_size: Option<f64>,
    pub married_share: Option<f64>,
    pub unpartnered_share: Option<f64>,
    pub higher_education_share: Option<f64>,
    pub with_parents_share: Option<f64>,
    pub working_share: Option<f64>,
    pub avg_employment_years: Option<f64>,
    pub age_histogram: Vec<HistogramBin>,
    pub age_histogram_by_target: Vec<SplitHistogramBin>,
    pub gender_counts: Vec<ValueCount>,
    pub family_status_counts: Vec<ValueCount>,
    pub education_counts: Vec<ValueCount>,
    pub top_occupations: Vec<ValueCount>,
    pub housing_shares: Vec<ValueCount>,
    pub children_counts: Vec<(i64, usize)>,
    pub age_by_target: TargetSplit<FiveNumberSummary>,
    pub household_correlation: CorrelationMatrix,
}

impl DemographicsPage {
    pub fn compute(df: &DataFrame) -> Result<Self> {
        let age_means = mean_by_target(df, AGE_YEARS)?;
        let mut top_occupations = value_counts(df, OCCUPATION)?;
        top_occupations.truncate(TOP_OCCUPATIONS);

        Ok(Self {
            male_share: share_where(df, GENDER, |g| g == "M")?,
            female_share: share_where(df, GENDER, |g| g == "F")?,
            avg_age_defaulters: age_means.defaulted,
            avg_age_non_defaulters: age_means.repaid,
            with_children_share: numeric_share_where(df, CHILDREN, |n| n > 0.0)?,
            avg_family_size: mean_of(df, FAMILY_MEMBERS)?,
            married_share: share_where(df, FAMILY_STATUS, |s| s.contains("Married"))?,
            unpartnered_share: share_where(df, FAMILY_STATUS, |s| {
                UNPARTNERED.iter().any(|level| s.contains(level))
            })?,
            higher_education_share: share_where(df, EDUCATION, |e| {
                HIGHER_EDUCATION.iter().any(|level| *level == e)
            })?,
            with_parents_share: share_where(df, HOUSING, |h| h == "With parents")?,
            working_share: share_where(df, OCCUPATION, |_| true)?,
            avg_employment_years: mean_of(df, EMPLOYMENT_YEARS)?,
            age_histogram: histogram_of(df, AGE_YEARS, 40)?,
            age_histogram_by_target: histogram_by_target(df, AGE_YEARS, 40)?,
            gender_counts: value_counts(df, GENDER)?,
            family_status_counts: value_counts(df, FAMILY_STATUS)?,
            education_counts: value_counts(df, EDUCATION)?,
            top_occupations,
            housing_shares: value_counts(df, HOUSING)?,
            children_counts: integer_counts(df, CHILDREN)?,
            age_by_target: five_number_by_target(df, AGE_YEARS)?,
            household_correlation: correlation_matrix(
                df,
                &[AGE_YEARS, CHILDREN, FAMILY_MEMBERS, TARGET],
            )?,
        })
    }

    pub fn view(&self) -> PageView {
        let metrics = vec![
            Metric::new("% Male", MetricValue::Percent(self.male_share)),
            Metric::new("% Female", MetricValue::Percent(self.female_share)),
            Metric::new("Avg age (defaulters)", MetricValue::Years(self.avg_age_defaulters)),
            Metric::new(
                "Avg age (non-defaulters)",
                MetricValue::Years(self.avg_age_non_defaulters),
            ),
            Metric::new("% With children", MetricValue::Percent(self.with_children_share)),
            Metric::new("Avg family size", MetricValue::Ratio(self.avg_family_size)),
            Metric::new("% Married", MetricValue::Percent(self.married_share)),
            Metric::new(
                "% Single / separated / widowed",
                MetricValue::Percent(self.unpartnered_share),
            ),
            Metric::new("% Higher education", MetricValue::Percent(self.higher_education_share)),
            Metric::new("% With parents", MetricValue::Percent(self.with_parents_share)),
            Metric::new("% Working", MetricValue::Percent(self.working_share)),
            Metric::new("Avg employment years", MetricValue::Years(self.avg_employment_years)),
        ];

        let charts = vec![
            Chart::from_histogram("Age distribution", &self.age_histogram),
            Chart::from_split_histogram("Age distribution by target", &self.age_histogram_by_target),
            Chart::from_counts("Gender distribution", &self.gender_counts),
            Chart::from_counts("Family status distribution", &self.family_status_counts),
            Chart::from_counts("Education distribution", &self.education_counts),
            Chart::from_counts("Top 10 occupations", &self.top_occupations),
            Chart::from_counts("Housing type distribution", &self.housing_shares),
            Chart::from_integer_counts("Children count distribution", &self.children_counts),
            Chart::from_five_numbers("Age vs target", &self.age_by_target),
            Chart::heatmap(
                "Correlation: age, children, family size, target",
                &self.household_correlation,
            ),
        ];

        PageView {
            kind: PageKind::Demographics,
            title: PageKind::Demographics.title().to_string(),
            metrics,
            charts,
        }
    }
}
