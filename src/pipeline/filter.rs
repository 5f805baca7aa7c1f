//! Row filtering of the cleaned table
//!
//! A row passes when it matches every dimension: its value is one of the
//! selected levels of each categorical dimension, and its age and income lie
//! within the inclusive ranges.

use std::collections::BTreeSet;
use std::fmt;

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

use super::columns::{AGE_YEARS, EDUCATION, FAMILY_STATUS, GENDER, HOUSING, INCOME_TOTAL};
use super::error::DashboardError;
use super::stats::{numeric_values, present_values, string_values};

/// Inclusive numeric range
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A range that admits every finite value
    pub fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    /// Observed `[min, max]` of the values, or unbounded when there are none.
    pub fn spanning(values: &[f64]) -> Self {
        let min = values.iter().copied().reduce(f64::min);
        let max = values.iter().copied().reduce(f64::max);
        match (min, max) {
            (Some(min), Some(max)) => Self { min, max },
            _ => Self::unbounded(),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        if self.min.is_nan() || self.max.is_nan() {
            return Err(DashboardError::InvalidFilter(format!("{} range has a NaN bound", name)).into());
        }
        if self.min > self.max {
            return Err(DashboardError::InvalidFilter(format!(
                "{} range minimum {} exceeds maximum {}",
                name, self.min, self.max
            ))
            .into());
        }
        Ok(())
    }
}

impl fmt::Display for NumericRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Categorical filter dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CategoryDimension {
    Gender,
    Education,
    FamilyStatus,
    Housing,
}

impl CategoryDimension {
    pub const ALL: [CategoryDimension; 4] = [
        CategoryDimension::Gender,
        CategoryDimension::Education,
        CategoryDimension::FamilyStatus,
        CategoryDimension::Housing,
    ];

    pub fn column(self) -> &'static str {
        match self {
            CategoryDimension::Gender => GENDER,
            CategoryDimension::Education => EDUCATION,
            CategoryDimension::FamilyStatus => FAMILY_STATUS,
            CategoryDimension::Housing => HOUSING,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoryDimension::Gender => "Gender",
            CategoryDimension::Education => "Education",
            CategoryDimension::FamilyStatus => "Family status",
            CategoryDimension::Housing => "Housing",
        }
    }
}

/// Values a filter can choose from, as observed in the cleaned table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub gender: Vec<String>,
    pub education: Vec<String>,
    pub family_status: Vec<String>,
    pub housing: Vec<String>,
    pub age: Option<NumericRange>,
    pub income: Option<NumericRange>,
}

fn sorted_levels(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    if df.column(column).is_err() {
        return Ok(Vec::new());
    }
    let levels: BTreeSet<String> = string_values(df, column)?.into_iter().flatten().collect();
    Ok(levels.into_iter().collect())
}

fn observed_range(df: &DataFrame, column: &str) -> Result<Option<NumericRange>> {
    if df.column(column).is_err() {
        return Ok(None);
    }
    let values = present_values(df, column)?;
    if values.is_empty() {
        return Ok(None);
    }
    Ok(Some(NumericRange::spanning(&values)))
}

impl FilterOptions {
    pub fn from_table(df: &DataFrame) -> Result<Self> {
        Ok(Self {
            gender: sorted_levels(df, GENDER)?,
            education: sorted_levels(df, EDUCATION)?,
            family_status: sorted_levels(df, FAMILY_STATUS)?,
            housing: sorted_levels(df, HOUSING)?,
            age: observed_range(df, AGE_YEARS)?,
            income: observed_range(df, INCOME_TOTAL)?,
        })
    }

    pub fn levels(&self, dimension: CategoryDimension) -> &[String] {
        match dimension {
            CategoryDimension::Gender => &self.gender,
            CategoryDimension::Education => &self.education,
            CategoryDimension::FamilyStatus => &self.family_status,
            CategoryDimension::Housing => &self.housing,
        }
    }
}

/// The user's current selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSpec {
    pub gender: BTreeSet<String>,
    pub education: BTreeSet<String>,
    pub family_status: BTreeSet<String>,
    pub housing: BTreeSet<String>,
    pub age: NumericRange,
    pub income: NumericRange,
}

impl FilterSpec {
    /// Every observed level and the full observed ranges.
    pub fn select_all(options: &FilterOptions) -> Self {
        let set = |levels: &[String]| levels.iter().cloned().collect::<BTreeSet<_>>();
        Self {
            gender: set(&options.gender),
            education: set(&options.education),
            family_status: set(&options.family_status),
            housing: set(&options.housing),
            age: options.age.unwrap_or_else(NumericRange::unbounded),
            income: options.income.unwrap_or_else(NumericRange::unbounded),
        }
    }

    pub fn values(&self, dimension: CategoryDimension) -> &BTreeSet<String> {
        match dimension {
            CategoryDimension::Gender => &self.gender,
            CategoryDimension::Education => &self.education,
            CategoryDimension::FamilyStatus => &self.family_status,
            CategoryDimension::Housing => &self.housing,
        }
    }

    pub fn values_mut(&mut self, dimension: CategoryDimension) -> &mut BTreeSet<String> {
        match dimension {
            CategoryDimension::Gender => &mut self.gender,
            CategoryDimension::Education => &mut self.education,
            CategoryDimension::FamilyStatus => &mut self.family_status,
            CategoryDimension::Housing => &mut self.housing,
        }
    }

    /// Add the level when absent, remove it when present.
    pub fn toggle(&mut self, dimension: CategoryDimension, level: &str) {
        let values = self.values_mut(dimension);
        if !values.remove(level) {
            values.insert(level.to_string());
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.age.validate("age")?;
        self.income.validate("income")
    }
}

/// Per-row membership mask of `spec` over `df`.
///
/// A dimension whose column is absent from the table is not applied.
/// Rows with a missing value in an applied dimension never match.
pub fn filter_mask(df: &DataFrame, spec: &FilterSpec) -> Result<Vec<bool>> {
    spec.validate()?;
    let mut mask = vec![true; df.height()];

    for dimension in CategoryDimension::ALL {
        let column = dimension.column();
        if df.column(column).is_err() {
            log::debug!("filter dimension {} skipped: column absent", column);
            continue;
        }
        let selected = spec.values(dimension);
        for (keep, value) in mask.iter_mut().zip(string_values(df, column)?) {
            *keep &= value.is_some_and(|v| selected.contains(&v));
        }
    }

    for (column, range) in [(AGE_YEARS, spec.age), (INCOME_TOTAL, spec.income)] {
        if df.column(column).is_err() {
            log::debug!("filter dimension {} skipped: column absent", column);
            continue;
        }
        for (keep, value) in mask.iter_mut().zip(numeric_values(df, column)?) {
            *keep &= value.is_some_and(|v| range.contains(v));
        }
    }

    Ok(mask)
}

/// Rows of `df` matching `spec`, in their original order.
pub fn apply_filters(df: &DataFrame, spec: &FilterSpec) -> Result<DataFrame> {
    let mask = filter_mask(df, spec)?;
    let mask = BooleanChunked::from_slice("mask".into(), &mask);
    let filtered = df.filter(&mask)?;
    log::debug!("filter kept {} of {} rows", filtered.height(), df.height());
    Ok(filtered)
}

/// Per-session record of the last applied filter
#[derive(Debug, Clone, Default)]
pub struct FilterSession {
    last: Option<FilterSpec>,
    applications: usize,
}

impl FilterSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter `df` and remember `spec` as the last applied selection.
    pub fn apply(&mut self, df: &DataFrame, spec: &FilterSpec) -> Result<DataFrame> {
        let filtered = apply_filters(df, spec)?;
        self.last = Some(spec.clone());
        self.applications += 1;
        Ok(filtered)
    }

    pub fn last(&self) -> Option<&FilterSpec> {
        self.last.as_ref()
    }

    pub fn applications(&self) -> usize {
        self.applications
    }

    /// Forget the last selection and restart the application count.
    pub fn reset(&mut self) {
        self.last = None;
        self.applications = 0;
    }
}
