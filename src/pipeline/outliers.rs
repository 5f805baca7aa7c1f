//! Percentile winsorization of numeric columns

use anyhow::Result;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

use super::stats::{quantile_sorted, sorted};

/// Clip bounds applied to one column
#[derive(Debug, Clone, Serialize)]
pub struct ClipBounds {
    pub column: String,
    pub lower: f64,
    pub upper: f64,
    /// Number of values moved onto a bound
    pub clipped: usize,
}

/// Quantile bounds `(lower_q, upper_q)` of a sample.
pub fn winsor_bounds(values: &[f64], lower_q: f64, upper_q: f64) -> Option<(f64, f64)> {
    let sorted = sorted(values);
    Some((
        quantile_sorted(&sorted, lower_q)?,
        quantile_sorted(&sorted, upper_q)?,
    ))
}

/// Clip every numeric column not listed in `exempt` to its
/// `[lower_q, upper_q]` quantile range.
///
/// Integer columns are clipped to `[ceil(lower), floor(upper)]` so they stay
/// integral; when that interval is empty the column is clipped as `f64`.
pub fn winsorize(
    df: &DataFrame,
    lower_q: f64,
    upper_q: f64,
    exempt: &[&str],
) -> Result<(DataFrame, Vec<ClipBounds>)> {
    let targets: Vec<&Column> = df
        .get_columns()
        .iter()
        .filter(|col| {
            col.dtype().is_primitive_numeric() && !exempt.contains(&col.name().as_str())
        })
        .collect();

    let clipped: Vec<Option<(Column, ClipBounds)>> = targets
        .par_iter()
        .map(|col| winsorize_column(col, lower_q, upper_q))
        .collect::<Result<Vec<_>>>()?;

    let mut out = df.clone();
    let mut records = Vec::new();
    for (column, bounds) in clipped.into_iter().flatten() {
        out.with_column(column)?;
        records.push(bounds);
    }

    Ok((out, records))
}

fn winsorize_column(
    col: &Column,
    lower_q: f64,
    upper_q: f64,
) -> Result<Option<(Column, ClipBounds)>> {
    let floats = col.cast(&DataType::Float64)?;
    let ca = floats.f64()?;
    let present: Vec<f64> = ca.into_iter().flatten().filter(|x| x.is_finite()).collect();

    let Some((lower, upper)) = winsor_bounds(&present, lower_q, upper_q) else {
        return Ok(None);
    };

    let name = col.name().clone();

    if col.dtype().is_integer() {
        let (int_lower, int_upper) = (lower.ceil(), upper.floor());
        if int_lower <= int_upper {
            let (lo, hi) = (int_lower as i64, int_upper as i64);
            let ints = col.cast(&DataType::Int64)?;
            let mut clipped = 0usize;
            let values: Vec<Option<i64>> = ints
                .i64()?
                .into_iter()
                .map(|v| {
                    v.map(|x| {
                        let c = x.clamp(lo, hi);
                        if c != x {
                            clipped += 1;
                        }
                        c
                    })
                })
                .collect();
            return Ok(Some((
                Column::new(name.clone(), values),
                ClipBounds {
                    column: name.to_string(),
                    lower: int_lower,
                    upper: int_upper,
                    clipped,
                },
            )));
        }
    }

    let mut clipped = 0usize;
    let values: Vec<Option<f64>> = ca
        .into_iter()
        .map(|v| {
            v.map(|x| {
                let c = x.clamp(lower, upper);
                if c != x {
                    clipped += 1;
                }
                c
            })
        })
        .collect();

    Ok(Some((
        Column::new(name.clone(), values),
        ClipBounds {
            column: name.to_string(),
            lower,
            upper,
            clipped,
        },
    )))
}
