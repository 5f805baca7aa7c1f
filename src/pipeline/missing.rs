//! Missing value analysis, column dropping and imputation

use anyhow::Result;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

use super::stats::{median, mode};

/// Analyze the fraction of missing values per column.
///
/// Returns `(column, ratio)` pairs sorted by ratio descending.
pub fn analyze_missing_values(df: &DataFrame) -> Result<Vec<(String, f64)>> {
    // Handle empty DataFrame
    if df.height() == 0 {
        return Ok(Vec::new());
    }

    let total = df.height() as f64;

    let mut missing_ratios: Vec<(String, f64)> = df
        .get_columns()
        .iter()
        .map(|col| (col.name().to_string(), col.null_count() as f64 / total))
        .collect();

    // Sort by missing ratio descending
    missing_ratios.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    Ok(missing_ratios)
}

/// Get columns whose missing ratio is strictly above the threshold
pub fn get_columns_above_threshold(missing_ratios: &[(String, f64)], threshold: f64) -> Vec<String> {
    missing_ratios
        .iter()
        .filter(|(_, ratio)| *ratio > threshold)
        .map(|(name, _)| name.clone())
        .collect()
}

/// Value used to fill a column's missing entries
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FillValue {
    Integer(i64),
    Number(f64),
    Text(String),
    Flag(bool),
}

impl std::fmt::Display for FillValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FillValue::Integer(v) => write!(f, "{}", v),
            FillValue::Number(v) => write!(f, "{:.4}", v),
            FillValue::Text(v) => write!(f, "\"{}\"", v),
            FillValue::Flag(v) => write!(f, "{}", v),
        }
    }
}

/// Record of one imputed column
#[derive(Debug, Clone, Serialize)]
pub struct ImputedColumn {
    pub column: String,
    /// Number of cells that were filled
    pub filled: usize,
    pub fill_value: FillValue,
}

/// Fill missing values: numeric columns with the median, string columns
/// with the mode (ties broken by the smallest value), boolean columns with
/// the majority value.
///
/// Integer columns stay integral: their median is rounded half to even.
/// Columns with no present values at all are left untouched.
pub fn impute_missing(df: &DataFrame) -> Result<(DataFrame, Vec<ImputedColumn>)> {
    let filled: Vec<Option<(Column, ImputedColumn)>> = df
        .get_columns()
        .par_iter()
        .map(impute_column)
        .collect::<Result<Vec<_>>>()?;

    let mut out = df.clone();
    let mut records = Vec::new();
    for (column, record) in filled.into_iter().flatten() {
        out.with_column(column)?;
        records.push(record);
    }

    Ok((out, records))
}

fn impute_column(col: &Column) -> Result<Option<(Column, ImputedColumn)>> {
    let nulls = col.null_count();
    if nulls == 0 || nulls == col.len() {
        return Ok(None);
    }

    let name = col.name().clone();
    let dtype = col.dtype();

    let (column, fill_value) = if dtype.is_integer() {
        let ints = col.cast(&DataType::Int64)?;
        let ca = ints.i64()?;
        let present: Vec<f64> = ca.into_iter().flatten().map(|v| v as f64).collect();
        let fill = match median(&present) {
            Some(m) => m.round_ties_even() as i64,
            None => return Ok(None),
        };
        let values: Vec<i64> = ca.into_iter().map(|v| v.unwrap_or(fill)).collect();
        (Column::new(name.clone(), values), FillValue::Integer(fill))
    } else if dtype.is_primitive_numeric() {
        let floats = col.cast(&DataType::Float64)?;
        let ca = floats.f64()?;
        let present: Vec<f64> = ca.into_iter().flatten().filter(|x| x.is_finite()).collect();
        let fill = match median(&present) {
            Some(m) => m,
            None => return Ok(None),
        };
        let values: Vec<f64> = ca.into_iter().map(|v| v.unwrap_or(fill)).collect();
        (Column::new(name.clone(), values), FillValue::Number(fill))
    } else if matches!(dtype, DataType::String) {
        let ca = col.str()?;
        let fill = match mode(ca.into_iter().flatten()) {
            Some(m) => m,
            None => return Ok(None),
        };
        let values: Vec<&str> = ca.into_iter().map(|v| v.unwrap_or(fill.as_str())).collect();
        (Column::new(name.clone(), values), FillValue::Text(fill))
    } else if matches!(dtype, DataType::Boolean) {
        let ca = col.bool()?;
        let trues = ca.into_iter().flatten().filter(|&b| b).count();
        let falses = ca.len() - nulls - trues;
        let fill = trues > falses;
        let values: Vec<bool> = ca.into_iter().map(|v| v.unwrap_or(fill)).collect();
        (Column::new(name.clone(), values), FillValue::Flag(fill))
    } else {
        log::warn!("Leaving missing values in column '{}' of type {}", name, dtype);
        return Ok(None);
    };

    Ok(Some((
        column,
        ImputedColumn {
            column: name.to_string(),
            filled: nulls,
            fill_value,
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impute_numeric_median() {
        let df = df! {
            "x" => [Some(1.0f64), None, Some(3.0), Some(10.0)],
        }
        .unwrap();

        let (out, records) = impute_missing(&df).unwrap();
        let values: Vec<Option<f64>> = out.column("x").unwrap().f64().unwrap().into_iter().collect();

        assert_eq!(values, vec![Some(1.0), Some(3.0), Some(3.0), Some(10.0)]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].filled, 1);
        assert_eq!(records[0].fill_value, FillValue::Number(3.0));
    }

    #[test]
    fn test_impute_integer_keeps_integer_type() {
        let df = df! {
            "n" => [Some(1i64), Some(2), None, Some(3), Some(4)],
        }
        .unwrap();

        let (out, records) = impute_missing(&df).unwrap();
        let col = out.column("n").unwrap();

        assert_eq!(col.dtype(), &DataType::Int64);
        assert_eq!(col.null_count(), 0);
        // median 2.5 rounds half to even
        assert_eq!(records[0].fill_value, FillValue::Integer(2));
    }

    #[test]
    fn test_impute_string_mode_tie_break() {
        let df = df! {
            "s" => [Some("b"), Some("a"), None, Some("b"), Some("a")],
        }
        .unwrap();

        let (out, records) = impute_missing(&df).unwrap();
        let values: Vec<Option<&str>> = out.column("s").unwrap().str().unwrap().into_iter().collect();

        assert_eq!(values[2], Some("a"));
        assert_eq!(records[0].fill_value, FillValue::Text("a".to_string()));
    }

    #[test]
    fn test_complete_and_all_null_columns_untouched() {
        let df = df! {
            "complete" => [1.0f64, 2.0],
            "empty" => [None::<f64>, None],
        }
        .unwrap();

        let (out, records) = impute_missing(&df).unwrap();

        assert!(records.is_empty());
        assert_eq!(out.column("empty").unwrap().null_count(), 2);
    }

    #[test]
    fn test_impute_boolean_majority() {
        let df = df! {
            "flag" => [Some(true), Some(true), None, Some(false)],
        }
        .unwrap();

        let (out, records) = impute_missing(&df).unwrap();
        assert_eq!(out.column("flag").unwrap().null_count(), 0);
        assert_eq!(records[0].fill_value, FillValue::Flag(true));
    }
}
