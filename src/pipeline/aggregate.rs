//! Descriptive aggregates over the filtered table
//!
//! Every statistic over an empty set is `None`. Columns the cleaned table no
//! longer carries (dropped as too sparse, or a `TARGET`-less upload) behave
//! like empty columns instead of failing the page.

use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

use super::binning::EqualWidthBins;
use super::columns::TARGET;
use super::stats::{mean, median, numeric_values, string_values, FiveNumberSummary};

/// Default rate of one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRate {
    pub group: String,
    pub count: usize,
    /// Fraction of defaulters in `[0, 1]`
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Histogram bin with counts split by target class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitHistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub repaid: usize,
    pub defaulted: usize,
}

/// Mean, median and max of a value within one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub max: Option<f64>,
}

/// A statistic computed separately for repaid (0) and defaulted (1) rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSplit<T> {
    pub repaid: Option<T>,
    pub defaulted: Option<T>,
}

impl<T> Default for TargetSplit<T> {
    fn default() -> Self {
        Self {
            repaid: None,
            defaulted: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTabRow {
    pub value: String,
    pub repaid: usize,
    pub defaulted: usize,
}

/// Default rate within one equal-width bin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinRate {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    pub rate: Option<f64>,
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

/// Numeric values of a column, or `None` when the table lacks it.
pub fn optional_numeric(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<f64>>>> {
    if !has_column(df, name) {
        return Ok(None);
    }
    numeric_values(df, name).map(Some)
}

fn optional_strings(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<String>>>> {
    if !has_column(df, name) {
        return Ok(None);
    }
    string_values(df, name).map(Some)
}

fn present(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    Ok(optional_numeric(df, name)?
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .collect())
}

/// Target class per row: `Some(false)` repaid, `Some(true)` defaulted,
/// `None` for missing or unexpected labels. `None` overall without `TARGET`.
pub fn target_classes(df: &DataFrame) -> Result<Option<Vec<Option<bool>>>> {
    Ok(optional_numeric(df, TARGET)?.map(|values| {
        values
            .into_iter()
            .map(|v| match v {
                Some(x) if x == 0.0 => Some(false),
                Some(x) if x == 1.0 => Some(true),
                _ => None,
            })
            .collect()
    }))
}

pub fn mean_of(df: &DataFrame, name: &str) -> Result<Option<f64>> {
    Ok(mean(&present(df, name)?))
}

pub fn median_of(df: &DataFrame, name: &str) -> Result<Option<f64>> {
    Ok(median(&present(df, name)?))
}

/// Number of distinct present values.
pub fn unique_count(df: &DataFrame, name: &str) -> Result<Option<usize>> {
    let Some(values) = optional_strings(df, name)? else {
        return Ok(None);
    };
    let distinct: HashSet<String> = values.into_iter().flatten().collect();
    Ok(Some(distinct.len()))
}

/// Number of rows labelled as defaulted.
pub fn default_count(df: &DataFrame) -> Result<Option<usize>> {
    Ok(target_classes(df)?.map(|classes| classes.into_iter().filter(|c| *c == Some(true)).count()))
}

/// Fraction of labelled rows that defaulted.
pub fn default_rate(df: &DataFrame) -> Result<Option<f64>> {
    let Some(classes) = target_classes(df)? else {
        return Ok(None);
    };
    let labelled: Vec<bool> = classes.into_iter().flatten().collect();
    if labelled.is_empty() {
        return Ok(None);
    }
    let defaults = labelled.iter().filter(|d| **d).count();
    Ok(Some(defaults as f64 / labelled.len() as f64))
}

/// Default rate per level of `group_column`, levels in ascending order.
pub fn default_rate_by(df: &DataFrame, group_column: &str) -> Result<Vec<GroupRate>> {
    let (Some(groups), Some(classes)) = (optional_strings(df, group_column)?, target_classes(df)?)
    else {
        return Ok(Vec::new());
    };

    let mut tally: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for (group, class) in groups.into_iter().zip(classes) {
        if let (Some(group), Some(defaulted)) = (group, class) {
            let entry = tally.entry(group).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += usize::from(defaulted);
        }
    }

    Ok(tally
        .into_iter()
        .map(|(group, (count, defaults))| GroupRate {
            group,
            count,
            rate: (count > 0).then(|| defaults as f64 / count as f64),
        })
        .collect())
}

/// Unweighted mean of the group rates.
pub fn mean_rate(rates: &[GroupRate]) -> Option<f64> {
    let values: Vec<f64> = rates.iter().filter_map(|r| r.rate).collect();
    mean(&values)
}

/// Reorder rates to follow `order`; groups outside it keep their place after.
pub fn ordered_rates(rates: Vec<GroupRate>, order: &[&str]) -> Vec<GroupRate> {
    let mut rates = rates;
    rates.sort_by_key(|r| {
        order
            .iter()
            .position(|o| *o == r.group)
            .unwrap_or(order.len())
    });
    rates
}

/// Level frequencies, most frequent first (ties by ascending value).
pub fn value_counts(df: &DataFrame, name: &str) -> Result<Vec<ValueCount>> {
    let Some(values) = optional_strings(df, name)? else {
        return Ok(Vec::new());
    };

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total = 0usize;
    for value in values.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
        total += 1;
    }

    let mut out: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value,
            count,
            share: count as f64 / total as f64,
        })
        .collect();
    // stable sort keeps ascending value order among equal counts
    out.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(out)
}

/// Counts per integral value, in ascending value order.
pub fn integer_counts(df: &DataFrame, name: &str) -> Result<Vec<(i64, usize)>> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for value in present(df, name)? {
        *counts.entry(value.round() as i64).or_insert(0) += 1;
    }
    Ok(counts.into_iter().collect())
}

pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let Some(edges) = EqualWidthBins::from_values(values, bins) else {
        return Vec::new();
    };
    let mut counts = vec![0usize; edges.len()];
    for value in values {
        if let Some(i) = edges.index_of(*value) {
            counts[i] += 1;
        }
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let (lower, upper) = edges.bounds(i);
            HistogramBin {
                lower,
                upper,
                count,
            }
        })
        .collect()
}

pub fn histogram_of(df: &DataFrame, name: &str, bins: usize) -> Result<Vec<HistogramBin>> {
    Ok(histogram(&present(df, name)?, bins))
}

/// `(value, defaulted)` for rows with both a present value and a label.
fn labelled_values(df: &DataFrame, name: &str) -> Result<Vec<(f64, bool)>> {
    let (Some(values), Some(classes)) = (optional_numeric(df, name)?, target_classes(df)?) else {
        return Ok(Vec::new());
    };
    Ok(values
        .into_iter()
        .zip(classes)
        .filter_map(|(v, c)| Some((v?, c?)))
        .collect())
}

/// Histogram of a column with counts split by target class.
pub fn histogram_by_target(df: &DataFrame, name: &str, bins: usize) -> Result<Vec<SplitHistogramBin>> {
    let pairs = labelled_values(df, name)?;
    let values: Vec<f64> = pairs.iter().map(|(v, _)| *v).collect();
    let Some(edges) = EqualWidthBins::from_values(&values, bins) else {
        return Ok(Vec::new());
    };

    let mut counts = vec![(0usize, 0usize); edges.len()];
    for (value, defaulted) in pairs {
        if let Some(i) = edges.index_of(value) {
            if defaulted {
                counts[i].1 += 1;
            } else {
                counts[i].0 += 1;
            }
        }
    }

    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, (repaid, defaulted))| {
            let (lower, upper) = edges.bounds(i);
            SplitHistogramBin {
                lower,
                upper,
                repaid,
                defaulted,
            }
        })
        .collect())
}

/// Default rate over equal-width bins of a numeric column; empty bins are kept.
pub fn binned_default_rate(df: &DataFrame, name: &str, bins: usize) -> Result<Vec<BinRate>> {
    Ok(histogram_by_target(df, name, bins)?
        .into_iter()
        .map(|bin| {
            let count = bin.repaid + bin.defaulted;
            BinRate {
                lower: bin.lower,
                upper: bin.upper,
                count,
                rate: (count > 0).then(|| bin.defaulted as f64 / count as f64),
            }
        })
        .collect())
}

/// Mean, median and max of `value_column` per level of `group_column`.
pub fn summarize_by(df: &DataFrame, value_column: &str, group_column: &str) -> Result<Vec<GroupSummary>> {
    let (Some(values), Some(groups)) = (
        optional_numeric(df, value_column)?,
        optional_strings(df, group_column)?,
    ) else {
        return Ok(Vec::new());
    };

    let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (value, group) in values.into_iter().zip(groups) {
        if let (Some(value), Some(group)) = (value, group) {
            grouped.entry(group).or_default().push(value);
        }
    }

    Ok(grouped
        .into_iter()
        .map(|(group, values)| GroupSummary {
            group,
            count: values.len(),
            mean: mean(&values),
            median: median(&values),
            max: values.iter().copied().reduce(f64::max),
        })
        .collect())
}

fn split_by_target(df: &DataFrame, name: &str) -> Result<(Vec<f64>, Vec<f64>)> {
    let (repaid, defaulted): (Vec<(f64, bool)>, Vec<(f64, bool)>) =
        labelled_values(df, name)?.into_iter().partition(|(_, d)| !*d);
    Ok((
        repaid.into_iter().map(|(v, _)| v).collect(),
        defaulted.into_iter().map(|(v, _)| v).collect(),
    ))
}

pub fn five_number_by_target(df: &DataFrame, name: &str) -> Result<TargetSplit<FiveNumberSummary>> {
    let (repaid, defaulted) = split_by_target(df, name)?;
    Ok(TargetSplit {
        repaid: FiveNumberSummary::from_values(&repaid),
        defaulted: FiveNumberSummary::from_values(&defaulted),
    })
}

pub fn mean_by_target(df: &DataFrame, name: &str) -> Result<TargetSplit<f64>> {
    let (repaid, defaulted) = split_by_target(df, name)?;
    Ok(TargetSplit {
        repaid: mean(&repaid),
        defaulted: mean(&defaulted),
    })
}

/// Fraction of all rows whose string value satisfies `predicate`.
/// Missing values count as not matching.
pub fn share_where<F>(df: &DataFrame, name: &str, predicate: F) -> Result<Option<f64>>
where
    F: Fn(&str) -> bool,
{
    let Some(values) = optional_strings(df, name)? else {
        return Ok(None);
    };
    if values.is_empty() {
        return Ok(None);
    }
    let hits = values
        .iter()
        .filter(|v| v.as_deref().is_some_and(&predicate))
        .count();
    Ok(Some(hits as f64 / values.len() as f64))
}

/// Fraction of all rows whose numeric value satisfies `predicate`.
pub fn numeric_share_where<F>(df: &DataFrame, name: &str, predicate: F) -> Result<Option<f64>>
where
    F: Fn(f64) -> bool,
{
    let Some(values) = optional_numeric(df, name)? else {
        return Ok(None);
    };
    if values.is_empty() {
        return Ok(None);
    }
    let hits = values.iter().filter(|v| v.is_some_and(&predicate)).count();
    Ok(Some(hits as f64 / values.len() as f64))
}

/// Counts of each level split by target class, levels ascending.
pub fn crosstab_by_target(df: &DataFrame, name: &str) -> Result<Vec<CrossTabRow>> {
    let (Some(values), Some(classes)) = (optional_strings(df, name)?, target_classes(df)?) else {
        return Ok(Vec::new());
    };

    let mut table: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for (value, class) in values.into_iter().zip(classes) {
        if let (Some(value), Some(defaulted)) = (value, class) {
            let entry = table.entry(value).or_insert((0, 0));
            if defaulted {
                entry.1 += 1;
            } else {
                entry.0 += 1;
            }
        }
    }

    Ok(table
        .into_iter()
        .map(|(value, (repaid, defaulted))| CrossTabRow {
            value,
            repaid,
            defaulted,
        })
        .collect())
}
