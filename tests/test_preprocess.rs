//! Integration tests for the cleaning pipeline

use std::collections::{HashMap, HashSet};

use credscope::pipeline::columns::*;
use credscope::pipeline::features::derive_features;
use credscope::pipeline::missing::impute_missing;
use credscope::pipeline::stats::{numeric_values, present_values, quantile, string_values};
use credscope::pipeline::{preprocess, DashboardError, PreprocessConfig};
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

fn prepared() -> (DataFrame, credscope::pipeline::PreparedTable) {
    let raw = common::create_application_dataframe(2_000, 7);
    let prepared = preprocess(&raw, &PreprocessConfig::default()).unwrap();
    (raw, prepared)
}

#[test]
fn test_no_missing_values_after_preprocessing() {
    let (_, prepared) = prepared();

    for col in prepared.table.get_columns() {
        assert_eq!(col.null_count(), 0, "column {} still has nulls", col.name());
    }
}

#[test]
fn test_sparse_columns_dropped() {
    let (_, prepared) = prepared();

    assert!(prepared.table.column("EXT_SOURCE_1").is_err());
    assert!(prepared
        .report
        .dropped_columns
        .iter()
        .any(|(name, ratio)| name == "EXT_SOURCE_1" && *ratio > 0.6));
    // Occupation is ~30% missing and survives with its mode filled in
    assert!(prepared.table.column(OCCUPATION).is_ok());
}

/// Rebuild the table as it was after imputation, before levels are collapsed
/// and values clipped.
fn imputed_table(raw: &DataFrame, prepared: &credscope::pipeline::PreparedTable) -> DataFrame {
    let derived = derive_features(raw).unwrap();
    let dropped: Vec<String> = prepared
        .report
        .dropped_columns
        .iter()
        .map(|(name, _)| name.clone())
        .collect();
    impute_missing(&derived.drop_many(&dropped)).unwrap().0
}

#[test]
fn test_numeric_columns_within_imputed_percentiles() {
    let (raw, prepared) = prepared();

    let imputed = imputed_table(&raw, &prepared);

    for col in prepared.table.get_columns() {
        let name = col.name().as_str();
        if !col.dtype().is_primitive_numeric() || WINSOR_EXEMPT.contains(&name) {
            continue;
        }
        let before = present_values(&imputed, name).unwrap();
        let lo = quantile(&before, 0.01).unwrap();
        let hi = quantile(&before, 0.99).unwrap();

        for value in present_values(&prepared.table, name).unwrap() {
            assert!(
                value >= lo - 1e-9 && value <= hi + 1e-9,
                "{} = {} outside [{}, {}]",
                name,
                value,
                lo,
                hi
            );
        }
    }
}

#[test]
fn test_identifier_and_target_not_clipped() {
    let (raw, prepared) = prepared();

    assert_eq!(
        numeric_values(&raw, ID).unwrap(),
        numeric_values(&prepared.table, ID).unwrap()
    );
    assert_eq!(
        numeric_values(&raw, TARGET).unwrap(),
        numeric_values(&prepared.table, TARGET).unwrap()
    );
    assert!(!prepared.report.clipped.iter().any(|c| c.column == ID || c.column == TARGET));
}

#[test]
fn test_no_rare_levels_survive() {
    let (raw, prepared) = prepared();
    let imputed = imputed_table(&raw, &prepared);
    let rare_threshold = PreprocessConfig::default().rare_threshold;

    for col in imputed.get_columns() {
        if !matches!(col.dtype(), DataType::String) {
            continue;
        }
        let name = col.name().as_str();
        let mut counts: HashMap<String, usize> = HashMap::new();
        for value in string_values(&imputed, name).unwrap().into_iter().flatten() {
            *counts.entry(value).or_default() += 1;
        }

        let output: HashSet<String> = string_values(&prepared.table, name)
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        for (level, count) in counts {
            let share = count as f64 / imputed.height() as f64;
            if share < rare_threshold && level != OTHER_LEVEL {
                assert!(
                    !output.contains(&level),
                    "{} level '{}' had share {} but survived",
                    name,
                    level,
                    share
                );
            }
        }
    }

    let education = string_values(&prepared.table, EDUCATION).unwrap();
    assert!(!education.iter().flatten().any(|e| e == "Lower secondary"));
    assert!(education.iter().flatten().any(|e| e == OTHER_LEVEL));
}

#[test]
fn test_xna_gender_relabelled() {
    let (_, prepared) = prepared();
    let gender = string_values(&prepared.table, GENDER).unwrap();
    assert!(!gender.iter().flatten().any(|g| g == "XNA"));
}

#[test]
fn test_age_is_non_negative_integer() {
    let (_, prepared) = prepared();
    let age = prepared.table.column(AGE_YEARS).unwrap();

    assert!(age.dtype().is_integer());
    for value in present_values(&prepared.table, AGE_YEARS).unwrap() {
        assert!(value >= 0.0);
        assert_eq!(value.fract(), 0.0);
    }
}

#[test]
fn test_employment_years_capped() {
    let (_, prepared) = prepared();
    for value in present_values(&prepared.table, EMPLOYMENT_YEARS).unwrap() {
        assert!((0.0..=60.0).contains(&value), "employment years {}", value);
    }
}

#[test]
fn test_income_brackets_assigned() {
    let (_, prepared) = prepared();
    let brackets = string_values(&prepared.table, INCOME_BRACKET).unwrap();

    assert!(brackets.iter().all(|b| b.is_some()));
    for label in ["Low", "Mid", "High"] {
        assert!(brackets.iter().flatten().any(|b| b == label), "no {} bracket", label);
    }
    assert!(prepared.report.income_bracket_edges.is_some());
}

#[test]
fn test_small_table_preprocesses() {
    let raw = common::create_small_application_dataframe();
    let prepared = preprocess(&raw, &PreprocessConfig::default()).unwrap();

    assert_eq!(prepared.table.height(), 8);
    assert_eq!(prepared.report.input_columns, raw.width());
    // Pensioner marker lands at (winsorized) zero tenure
    let employment = present_values(&prepared.table, EMPLOYMENT_YEARS).unwrap();
    assert!(employment[7] < 0.1);
}

#[test]
fn test_missing_required_column_is_reported() {
    let raw = common::create_small_application_dataframe().drop(DAYS_BIRTH).unwrap();
    let err = preprocess(&raw, &PreprocessConfig::default()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<DashboardError>(),
        Some(DashboardError::MissingColumn(name)) if name == DAYS_BIRTH
    ));
}

#[test]
fn test_preprocess_is_deterministic() {
    let raw = common::create_application_dataframe(500, 3);
    let a = preprocess(&raw, &PreprocessConfig::default()).unwrap();
    let b = preprocess(&raw, &PreprocessConfig::default()).unwrap();
    assert!(a.table.equals_missing(&b.table));
}
