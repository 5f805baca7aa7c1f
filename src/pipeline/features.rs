//! Derived applicant features: age, tenure and affordability ratios

use anyhow::Result;
use polars::prelude::*;

use super::columns::*;
use super::stats::numeric_values;

pub const DAYS_PER_YEAR: f64 = 365.25;

/// Employment tenure is capped here; the raw data encodes pensioners with a
/// large positive day count which lands at 0 after the sign flip.
pub const MAX_EMPLOYMENT_YEARS: f64 = 60.0;

/// Age in whole years from a (negative) day offset, rounding half to even.
pub fn age_from_days(days_birth: f64) -> i64 {
    (-days_birth / DAYS_PER_YEAR).round_ties_even() as i64
}

pub fn employment_years_from_days(days_employed: f64) -> f64 {
    (-days_employed / DAYS_PER_YEAR).clamp(0.0, MAX_EMPLOYMENT_YEARS)
}

/// Ratio of two optional amounts.
///
/// A zero denominator or any other non-finite result yields `None`; the
/// imputation step later fills it with the column median.
pub fn safe_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let ratio = numerator? / denominator?;
    ratio.is_finite().then_some(ratio)
}

/// Add `AGE_YEARS`, `EMPLOYMENT_YEARS`, `DTI`, `LOAN_TO_INCOME` and
/// `ANNUITY_TO_CREDIT` to a copy of the table.
pub fn derive_features(df: &DataFrame) -> Result<DataFrame> {
    let days_birth = numeric_values(df, DAYS_BIRTH)?;
    let days_employed = numeric_values(df, DAYS_EMPLOYED)?;
    let income = numeric_values(df, INCOME_TOTAL)?;
    let credit = numeric_values(df, CREDIT)?;
    let annuity = numeric_values(df, ANNUITY)?;

    let age: Vec<Option<i64>> = days_birth.iter().map(|d| d.map(age_from_days)).collect();
    let employment: Vec<Option<f64>> = days_employed
        .iter()
        .map(|d| d.map(employment_years_from_days))
        .collect();

    let ratio = |num: &[Option<f64>], den: &[Option<f64>]| -> Vec<Option<f64>> {
        num.iter()
            .zip(den.iter())
            .map(|(&n, &d)| safe_ratio(n, d))
            .collect()
    };
    let dti = ratio(&annuity, &income);
    let lti = ratio(&credit, &income);
    let atc = ratio(&annuity, &credit);

    let mut out = df.clone();
    out.with_column(Column::new(AGE_YEARS.into(), age))?;
    out.with_column(Column::new(EMPLOYMENT_YEARS.into(), employment))?;
    out.with_column(Column::new(DEBT_TO_INCOME.into(), dti))?;
    out.with_column(Column::new(LOAN_TO_INCOME.into(), lti))?;
    out.with_column(Column::new(ANNUITY_TO_CREDIT.into(), atc))?;

    Ok(out)
}

/// Names of the columns [`derive_features`] adds.
pub fn derived_feature_names() -> Vec<String> {
    [
        AGE_YEARS,
        EMPLOYMENT_YEARS,
        DEBT_TO_INCOME,
        LOAN_TO_INCOME,
        ANNUITY_TO_CREDIT,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_from_days() {
        assert_eq!(age_from_days(-365.25 * 30.0), 30);
        assert_eq!(age_from_days(-12000.0), 33);
        // 30.5 years rounds to the even neighbour
        assert_eq!(age_from_days(-365.25 * 30.5), 30);
    }

    #[test]
    fn test_employment_years_clipped() {
        assert_eq!(employment_years_from_days(365243.0), 0.0);
        assert_eq!(employment_years_from_days(-365.25 * 100.0), MAX_EMPLOYMENT_YEARS);
        assert!((employment_years_from_days(-730.5) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_safe_ratio_zero_denominator_is_missing() {
        assert_eq!(safe_ratio(Some(10.0), Some(0.0)), None);
        assert_eq!(safe_ratio(Some(0.0), Some(0.0)), None);
        assert_eq!(safe_ratio(None, Some(2.0)), None);
        assert_eq!(safe_ratio(Some(10.0), None), None);
        assert_eq!(safe_ratio(Some(10.0), Some(4.0)), Some(2.5));
    }

    #[test]
    fn test_derive_features_adds_columns() {
        let df = df! {
            DAYS_BIRTH => [-10957i64, -14610],
            DAYS_EMPLOYED => [-730i64, 365243],
            INCOME_TOTAL => [100000.0f64, 0.0],
            CREDIT => [200000.0f64, 50000.0],
            ANNUITY => [10000.0f64, 5000.0],
        }
        .unwrap();

        let out = derive_features(&df).unwrap();

        let age = numeric_values(&out, AGE_YEARS).unwrap();
        assert_eq!(age, vec![Some(30.0), Some(40.0)]);

        let dti = numeric_values(&out, DEBT_TO_INCOME).unwrap();
        assert_eq!(dti[0], Some(0.1));
        assert_eq!(dti[1], None, "zero income must not produce an infinite ratio");

        let atc = numeric_values(&out, ANNUITY_TO_CREDIT).unwrap();
        assert_eq!(atc, vec![Some(0.05), Some(0.1)]);

        let employment = numeric_values(&out, EMPLOYMENT_YEARS).unwrap();
        assert_eq!(employment[1], Some(0.0));
    }
}
