//! Categorical level standardisation: rare-level collapsing and relabelling

use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

use super::columns::*;
use super::stats::{require_column, string_values};

/// Fixed relabelling applied after rare-level collapsing:
/// `(column, from, to)`.
pub const RELABELS: [(&str, &str, &str); 4] = [
    (GENDER, "XNA", OTHER_LEVEL),
    (EDUCATION, "Academic degree", "Higher education"),
    (FAMILY_STATUS, "Unknown", OTHER_LEVEL),
    (HOUSING, "Co-op apartment", OTHER_LEVEL),
];

/// Levels of one column that were folded into "Other"
#[derive(Debug, Clone, Serialize)]
pub struct CollapsedLevels {
    pub column: String,
    pub levels: Vec<String>,
    /// Rows whose value changed
    pub rows: usize,
}

/// Levels whose relative frequency among present values is below `threshold`.
pub fn rare_levels(values: &[Option<String>], threshold: f64) -> BTreeSet<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut total = 0usize;
    for value in values.iter().flatten() {
        *counts.entry(value.as_str()).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return BTreeSet::new();
    }

    counts
        .into_iter()
        .filter(|(_, count)| (*count as f64 / total as f64) < threshold)
        .map(|(level, _)| level.to_string())
        .collect()
}

/// Collapse rare levels of every string column into "Other".
pub fn collapse_rare_levels(
    df: &DataFrame,
    threshold: f64,
) -> Result<(DataFrame, Vec<CollapsedLevels>)> {
    let string_columns: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|col| matches!(col.dtype(), DataType::String))
        .map(|col| col.name().to_string())
        .collect();

    let mut out = df.clone();
    let mut records = Vec::new();

    for name in string_columns {
        let values = string_values(&out, &name)?;
        let mut rare = rare_levels(&values, threshold);
        rare.remove(OTHER_LEVEL);
        if rare.is_empty() {
            continue;
        }

        let mut rows = 0usize;
        let collapsed: Vec<Option<String>> = values
            .into_iter()
            .map(|v| match v {
                Some(level) if rare.contains(&level) => {
                    rows += 1;
                    Some(OTHER_LEVEL.to_string())
                }
                other => other,
            })
            .collect();

        out.with_column(Column::new(name.as_str().into(), collapsed))?;
        records.push(CollapsedLevels {
            column: name,
            levels: rare.into_iter().collect(),
            rows,
        });
    }

    Ok((out, records))
}

/// Replace every occurrence of `from` with `to` in a string column.
///
/// Returns the number of replaced cells.
pub fn replace_level(df: &mut DataFrame, column: &str, from: &str, to: &str) -> Result<usize> {
    require_column(df, column)?;
    let values = string_values(df, column)?;

    let mut replaced = 0usize;
    let relabelled: Vec<Option<String>> = values
        .into_iter()
        .map(|v| match v {
            Some(level) if level == from => {
                replaced += 1;
                Some(to.to_string())
            }
            other => other,
        })
        .collect();

    if replaced > 0 {
        df.with_column(Column::new(column.into(), relabelled))?;
    }
    Ok(replaced)
}

/// Apply the fixed [`RELABELS`] table.
pub fn apply_relabels(df: &DataFrame) -> Result<(DataFrame, usize)> {
    let mut out = df.clone();
    let mut total = 0usize;
    for (column, from, to) in RELABELS {
        total += replace_level(&mut out, column, from, to)?;
    }
    Ok((out, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|s| Some(s.to_string())).collect()
    }

    #[test]
    fn test_rare_levels_below_threshold() {
        let mut values = strings(&["a"; 99]);
        values.extend(strings(&["b"]));
        values.push(None);

        // b is exactly 1% of present values: not rare
        assert!(rare_levels(&values, 0.01).is_empty());
        assert_eq!(rare_levels(&values, 0.02), BTreeSet::from(["b".to_string()]));
    }

    #[test]
    fn test_collapse_all_levels_rare() {
        let df = df! {
            "c" => ["a", "b", "c", "d"],
        }
        .unwrap();

        let (out, records) = collapse_rare_levels(&df, 0.5).unwrap();
        let values: Vec<Option<&str>> = out.column("c").unwrap().str().unwrap().into_iter().collect();

        assert!(values.iter().all(|v| *v == Some(OTHER_LEVEL)));
        assert_eq!(records[0].rows, 4);
    }

    #[test]
    fn test_collapse_leaves_numeric_columns() {
        let df = df! {
            "n" => [1.0f64, 2.0, 3.0],
            "c" => ["x", "x", "y"],
        }
        .unwrap();

        let (out, records) = collapse_rare_levels(&df, 0.01).unwrap();
        assert!(records.is_empty());
        assert!(out.equals(&df));
    }

    #[test]
    fn test_existing_other_level_not_reported() {
        let df = df! {
            "c" => ["x", "x", "x", "Other"],
        }
        .unwrap();

        let (_, records) = collapse_rare_levels(&df, 0.3).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_apply_relabels() {
        let df = df! {
            GENDER => ["M", "XNA", "F"],
            EDUCATION => ["Academic degree", "Secondary / secondary special", "Higher education"],
            FAMILY_STATUS => ["Unknown", "Married", "Married"],
            HOUSING => ["Co-op apartment", "House / apartment", "With parents"],
        }
        .unwrap();

        let (out, replaced) = apply_relabels(&df).unwrap();
        assert_eq!(replaced, 4);

        let gender: Vec<Option<&str>> = out.column(GENDER).unwrap().str().unwrap().into_iter().collect();
        assert_eq!(gender, vec![Some("M"), Some("Other"), Some("F")]);

        let education: Vec<Option<&str>> =
            out.column(EDUCATION).unwrap().str().unwrap().into_iter().collect();
        assert_eq!(education[0], Some("Higher education"));
    }

    #[test]
    fn test_relabel_missing_column_is_error() {
        let df = df! { GENDER => ["M"] }.unwrap();
        assert!(apply_relabels(&df).is_err());
    }
}
