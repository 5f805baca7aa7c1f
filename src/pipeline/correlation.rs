//! Pearson correlation matrices over numeric columns

use anyhow::Result;
use faer::Mat;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

use super::stats::numeric_values;

/// A pair of columns and their correlation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelatedPair {
    pub feature1: String,
    pub feature2: String,
    pub correlation: f64,
}

/// Symmetric correlation matrix; `None` where a correlation is undefined
/// (a constant column or fewer than two complete pairs).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        self.values[i][j]
    }

    /// Correlations of `column` with every other column, sorted descending.
    /// Undefined correlations are left out.
    pub fn column_correlations(&self, column: &str) -> Vec<(String, f64)> {
        let Some(i) = self.index_of(column) else {
            return Vec::new();
        };
        let mut out: Vec<(String, f64)> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .filter_map(|(j, name)| self.values[i][j].map(|c| (name.clone(), c)))
            .collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    /// The other column with the largest `|corr|` against `column`.
    pub fn strongest_partner(&self, column: &str) -> Option<(String, f64)> {
        self.column_correlations(column)
            .into_iter()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()).then_with(|| b.0.cmp(&a.0)))
    }

    /// Off-diagonal pairs with `|corr| > threshold`, strongest first.
    pub fn pairs_above(&self, threshold: f64) -> Vec<CorrelatedPair> {
        let n = self.columns.len();
        let mut pairs = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if let Some(corr) = self.values[i][j] {
                    if corr.abs() > threshold {
                        pairs.push(CorrelatedPair {
                            feature1: self.columns[i].clone(),
                            feature2: self.columns[j].clone(),
                            correlation: corr,
                        });
                    }
                }
            }
        }
        pairs.sort_by(|a, b| b.correlation.abs().total_cmp(&a.correlation.abs()));
        pairs
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Names of all numeric columns, in table order.
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| col.dtype().is_primitive_numeric())
        .map(|col| col.name().to_string())
        .collect()
}

/// Pearson correlation of two samples over their complete pairs.
///
/// Single-pass Welford update for numerical stability.
pub fn pearson_correlation(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let mut n = 0.0;
    let mut mean_x = 0.0;
    let mut mean_y = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    let mut cov_xy = 0.0;

    for (x, y) in xs.iter().zip(ys.iter()) {
        if let (Some(x), Some(y)) = (x, y) {
            n += 1.0;
            let dx = x - mean_x;
            let dy = y - mean_y;
            mean_x += dx / n;
            mean_y += dy / n;
            var_x += dx * (x - mean_x);
            var_y += dy * (y - mean_y);
            cov_xy += dx * (y - mean_y);
        }
    }

    if n < 2.0 || var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    let r = cov_xy / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Standardised column `(x - mean) / (std * sqrt(n))`, or `None` when constant.
fn standardize(values: &[f64]) -> Option<Vec<f64>> {
    let n = values.len() as f64;
    if n < 2.0 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|x| (x - mean) * (x - mean)).sum();
    if ss <= 0.0 {
        return None;
    }
    let scale = ss.sqrt();
    Some(values.iter().map(|x| (x - mean) / scale).collect())
}

/// Matrix path for null-free columns: R = Z^T Z on standardised columns.
fn dense_correlation(columns: &[Vec<f64>]) -> Vec<Vec<Option<f64>>> {
    let k = columns.len();
    let n_rows = columns.first().map_or(0, |c| c.len());

    let standardized: Vec<Option<Vec<f64>>> =
        columns.par_iter().map(|values| standardize(values)).collect();

    let mut z = Mat::<f64>::zeros(n_rows, k);
    for (col_idx, col) in standardized.iter().enumerate() {
        if let Some(values) = col {
            for (row_idx, &v) in values.iter().enumerate() {
                z[(row_idx, col_idx)] = v;
            }
        }
    }
    let r = z.transpose() * &z;

    (0..k)
        .map(|i| {
            (0..k)
                .map(|j| match (&standardized[i], &standardized[j]) {
                    (Some(_), Some(_)) if i == j => Some(1.0),
                    (Some(_), Some(_)) => Some(r[(i, j)].clamp(-1.0, 1.0)),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

/// Correlation matrix over the requested columns.
///
/// Columns absent from the table or not numeric are skipped. Null-free input
/// goes through one matrix product; otherwise each pair uses its complete rows.
pub fn correlation_matrix(df: &DataFrame, columns: &[&str]) -> Result<CorrelationMatrix> {
    let names: Vec<String> = columns
        .iter()
        .filter(|name| {
            df.column(name)
                .map(|c| c.dtype().is_primitive_numeric())
                .unwrap_or(false)
        })
        .map(|name| name.to_string())
        .collect();

    let data: Vec<Vec<Option<f64>>> = names
        .iter()
        .map(|name| numeric_values(df, name))
        .collect::<Result<Vec<_>>>()?;

    let values = if data.iter().all(|col| col.iter().all(Option::is_some)) {
        let dense: Vec<Vec<f64>> = data
            .iter()
            .map(|col| col.iter().flatten().copied().collect())
            .collect();
        dense_correlation(&dense)
    } else {
        let k = names.len();
        let pairs: Vec<(usize, usize)> = (0..k)
            .flat_map(|i| (i..k).map(move |j| (i, j)))
            .collect();
        let computed: Vec<((usize, usize), Option<f64>)> = pairs
            .par_iter()
            .map(|&(i, j)| {
                let corr = pearson_correlation(&data[i], &data[j]);
                let corr = if i == j { corr.map(|_| 1.0) } else { corr };
                ((i, j), corr)
            })
            .collect();

        let mut values = vec![vec![None; k]; k];
        for ((i, j), corr) in computed {
            values[i][j] = corr;
            values[j][i] = corr;
        }
        values
    };

    Ok(CorrelationMatrix {
        columns: names,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Option<f64>, b: f64) {
        let a = a.expect("correlation should be defined");
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_perfect_correlations() {
        let df = df! {
            "x" => [1.0f64, 2.0, 3.0, 4.0],
            "y" => [2.0f64, 4.0, 6.0, 8.0],
            "z" => [4.0f64, 3.0, 2.0, 1.0],
        }
        .unwrap();

        let m = correlation_matrix(&df, &["x", "y", "z"]).unwrap();
        assert_close(m.get("x", "y"), 1.0);
        assert_close(m.get("x", "z"), -1.0);
        assert_close(m.get("y", "y"), 1.0);
    }

    #[test]
    fn test_dense_and_pairwise_paths_agree() {
        let x = [1.0f64, 5.0, 2.0, 8.0, 3.0];
        let y = [2.0f64, 3.0, 1.0, 9.0, 4.0];
        let dense = df! { "x" => x, "y" => y }.unwrap();
        let with_null = df! {
            "x" => [Some(1.0f64), Some(5.0), Some(2.0), Some(8.0), Some(3.0), None],
            "y" => [Some(2.0f64), Some(3.0), Some(1.0), Some(9.0), Some(4.0), Some(100.0)],
        }
        .unwrap();

        let a = correlation_matrix(&dense, &["x", "y"]).unwrap().get("x", "y");
        let b = correlation_matrix(&with_null, &["x", "y"]).unwrap().get("x", "y");
        assert_close(a, b.unwrap());
    }

    #[test]
    fn test_constant_column_is_undefined() {
        let df = df! {
            "x" => [1.0f64, 2.0, 3.0],
            "c" => [7.0f64, 7.0, 7.0],
        }
        .unwrap();

        let m = correlation_matrix(&df, &["x", "c"]).unwrap();
        assert_eq!(m.get("x", "c"), None);
        assert_eq!(m.get("c", "c"), None);
        assert!(m.column_correlations("x").is_empty());
    }

    #[test]
    fn test_absent_and_string_columns_skipped() {
        let df = df! {
            "x" => [1.0f64, 2.0],
            "s" => ["a", "b"],
        }
        .unwrap();

        let m = correlation_matrix(&df, &["x", "s", "missing"]).unwrap();
        assert_eq!(m.columns, vec!["x"]);
    }

    #[test]
    fn test_pairs_above_threshold() {
        let df = df! {
            "x" => [1.0f64, 2.0, 3.0, 4.0],
            "y" => [1.0f64, 2.0, 3.0, 5.0],
            "z" => [1.0f64, -1.0, 1.0, -1.0],
        }
        .unwrap();

        let m = correlation_matrix(&df, &["x", "y", "z"]).unwrap();
        let pairs = m.pairs_above(0.9);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].feature1, "x");
    }
}
