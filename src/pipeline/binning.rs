//! Income brackets (quantile cut) and equal-width bins

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

use super::columns::{INCOME_BRACKET, INCOME_TOTAL};
use super::stats::{numeric_values, quantile_sorted, sorted};

/// Bracket labels in ascending income order
pub const BRACKET_LABELS: [&str; 3] = ["Low", "Mid", "High"];

/// Edges `[min, q_low, q_high, max]` of a three-way quantile cut.
pub fn bracket_edges(values: &[f64], quantiles: (f64, f64)) -> Option<[f64; 4]> {
    let sorted = sorted(values);
    Some([
        quantile_sorted(&sorted, 0.0)?,
        quantile_sorted(&sorted, quantiles.0)?,
        quantile_sorted(&sorted, quantiles.1)?,
        quantile_sorted(&sorted, 1.0)?,
    ])
}

/// Intervals are right-closed, the lowest one also including its left edge.
pub fn assign_bracket(value: f64, edges: &[f64; 4]) -> &'static str {
    if value <= edges[1] {
        BRACKET_LABELS[0]
    } else if value <= edges[2] {
        BRACKET_LABELS[1]
    } else {
        BRACKET_LABELS[2]
    }
}

/// Add the `INCOME_BRACKET` column; returns the edges used, if any.
pub fn add_income_bracket(
    df: &DataFrame,
    quantiles: (f64, f64),
) -> Result<(DataFrame, Option<[f64; 4]>)> {
    let income = numeric_values(df, INCOME_TOTAL)?;
    let present: Vec<f64> = income.iter().flatten().copied().collect();
    let edges = bracket_edges(&present, quantiles);

    let brackets: Vec<Option<&str>> = income
        .iter()
        .map(|v| match (v, &edges) {
            (Some(x), Some(e)) => Some(assign_bracket(*x, e)),
            _ => None,
        })
        .collect();

    let mut out = df.clone();
    out.with_column(Column::new(INCOME_BRACKET.into(), brackets))?;
    Ok((out, edges))
}

/// Equal-width bins over `[min, max]`, right-closed like a histogram cut.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EqualWidthBins {
    pub edges: Vec<f64>,
}

impl EqualWidthBins {
    /// Bins spanning the values; `None` when there are no values or `bins == 0`.
    ///
    /// A zero-width range is widened by 0.1% on each side (or by 0.001 around
    /// zero) so every value still lands in a bin.
    pub fn from_values(values: &[f64], bins: usize) -> Option<Self> {
        if bins == 0 {
            return None;
        }
        let min = values.iter().copied().reduce(f64::min)?;
        let max = values.iter().copied().reduce(f64::max)?;

        let (lo, hi) = if max > min {
            (min, max)
        } else {
            let pad = if min == 0.0 { 0.001 } else { min.abs() * 0.001 };
            (min - pad, max + pad)
        };

        let width = (hi - lo) / bins as f64;
        let mut edges: Vec<f64> = (0..bins).map(|i| lo + width * i as f64).collect();
        edges.push(hi);
        Some(Self { edges })
    }

    pub fn len(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the bin holding `value`, or `None` outside the range.
    pub fn index_of(&self, value: f64) -> Option<usize> {
        let lo = *self.edges.first()?;
        let hi = *self.edges.last()?;
        if value < lo || value > hi || !value.is_finite() {
            return None;
        }
        // first edge strictly >= value closes the bin
        let idx = self.edges[1..].partition_point(|edge| *edge < value);
        Some(idx.min(self.len() - 1))
    }

    pub fn bounds(&self, index: usize) -> (f64, f64) {
        (self.edges[index], self.edges[index + 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stats::string_values;

    #[test]
    fn test_bracket_assignment_example() {
        let df = df! {
            INCOME_TOTAL => [20000.0f64, 50000.0, 50000.0, 90000.0],
        }
        .unwrap();

        let (out, edges) = add_income_bracket(&df, (0.25, 0.75)).unwrap();
        let brackets = string_values(&out, INCOME_BRACKET).unwrap();

        assert_eq!(edges, Some([20000.0, 42500.0, 60000.0, 90000.0]));
        assert_eq!(
            brackets,
            vec![
                Some("Low".to_string()),
                Some("Mid".to_string()),
                Some("Mid".to_string()),
                Some("High".to_string())
            ]
        );
    }

    #[test]
    fn test_bracket_duplicate_edges() {
        let edges = bracket_edges(&[10.0, 10.0, 10.0, 10.0], (0.25, 0.75)).unwrap();
        assert_eq!(assign_bracket(10.0, &edges), "Low");
    }

    #[test]
    fn test_bracket_empty_table() {
        let df = df! { INCOME_TOTAL => Vec::<f64>::new() }.unwrap();
        let (out, edges) = add_income_bracket(&df, (0.25, 0.75)).unwrap();
        assert!(edges.is_none());
        assert_eq!(out.height(), 0);
    }

    #[test]
    fn test_equal_width_bins() {
        let bins = EqualWidthBins::from_values(&[0.0, 10.0], 5).unwrap();
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.index_of(0.0), Some(0));
        assert_eq!(bins.index_of(2.0), Some(0));
        assert_eq!(bins.index_of(2.5), Some(1));
        assert_eq!(bins.index_of(10.0), Some(4));
        assert_eq!(bins.index_of(10.5), None);
        assert_eq!(bins.bounds(4), (8.0, 10.0));
    }

    #[test]
    fn test_equal_width_constant_values() {
        let bins = EqualWidthBins::from_values(&[3.0, 3.0], 4).unwrap();
        assert!(bins.index_of(3.0).is_some());
        assert!(EqualWidthBins::from_values(&[], 4).is_none());
        assert!(EqualWidthBins::from_values(&[1.0], 0).is_none());
    }
}
