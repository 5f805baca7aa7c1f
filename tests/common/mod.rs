//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tempfile::TempDir;

const EDUCATION_LEVELS: [&str; 3] = [
    "Secondary / secondary special",
    "Higher education",
    "Incomplete higher",
];
const FAMILY_STATUSES: [&str; 4] = ["Married", "Single / not married", "Civil marriage", "Widow"];
const HOUSING_TYPES: [&str; 3] = ["House / apartment", "With parents", "Rented apartment"];
const OCCUPATIONS: [&str; 5] = ["Laborers", "Sales staff", "Core staff", "Managers", "Drivers"];

/// Pensioner marker used by the source data for `DAYS_EMPLOYED`
pub const PENSIONER_DAYS: i64 = 365_243;

/// Create a random raw application table with realistic structure.
///
/// This DataFrame includes:
/// - every column the preprocessor requires, plus `SK_ID_CURR` and `TARGET`
/// - about 10% defaults
/// - missing annuity, income, occupation and family-member values
/// - `EXT_SOURCE_1`: about 70% missing (dropped at the 60% threshold)
/// - "Lower secondary": every 300th row, well under 1% (collapsed to "Other")
/// - "XNA" gender codes on every 500th row and pensioner `DAYS_EMPLOYED` markers
pub fn create_application_dataframe(rows: usize, seed: u64) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);

    let ids: Vec<i64> = (0..rows as i64).map(|i| 100_000 + i).collect();
    let target: Vec<i32> = (0..rows).map(|_| rng.gen_bool(0.1) as i32).collect();
    let days_birth: Vec<i64> = (0..rows).map(|_| -rng.gen_range(7_700..25_000)).collect();
    let days_employed: Vec<i64> = (0..rows)
        .map(|_| {
            if rng.gen_bool(0.15) {
                PENSIONER_DAYS
            } else {
                -rng.gen_range(0..15_000)
            }
        })
        .collect();

    let income: Vec<Option<f64>> = (0..rows)
        .map(|_| {
            if rng.gen_bool(0.02) {
                None
            } else {
                Some((rng.gen_range(25_000.0..400_000.0_f64) / 500.0).round() * 500.0)
            }
        })
        .collect();
    let credit: Vec<f64> = (0..rows)
        .map(|_| (rng.gen_range(45_000.0..2_000_000.0_f64) / 100.0).round() * 100.0)
        .collect();
    let annuity: Vec<Option<f64>> = credit
        .iter()
        .map(|c| {
            if rng.gen_bool(0.05) {
                None
            } else {
                Some((c * rng.gen_range(0.03..0.08)).round())
            }
        })
        .collect();
    let goods: Vec<f64> = credit.iter().map(|c| (c * 0.9).round()).collect();

    let gender: Vec<&str> = (0..rows)
        .map(|i| {
            if i % 500 == 1 {
                "XNA"
            } else if rng.gen_bool(0.65) {
                "F"
            } else {
                "M"
            }
        })
        .collect();
    let education: Vec<&str> = (0..rows)
        .map(|i| {
            if i % 300 == 0 {
                "Lower secondary"
            } else {
                EDUCATION_LEVELS[rng.gen_range(0..EDUCATION_LEVELS.len())]
            }
        })
        .collect();
    let family: Vec<Option<&str>> = (0..rows)
        .map(|_| {
            if rng.gen_bool(0.01) {
                None
            } else {
                Some(FAMILY_STATUSES[rng.gen_range(0..FAMILY_STATUSES.len())])
            }
        })
        .collect();
    let housing: Vec<&str> = (0..rows)
        .map(|_| HOUSING_TYPES[rng.gen_range(0..HOUSING_TYPES.len())])
        .collect();
    let occupation: Vec<Option<&str>> = (0..rows)
        .map(|_| {
            if rng.gen_bool(0.3) {
                None
            } else {
                Some(OCCUPATIONS[rng.gen_range(0..OCCUPATIONS.len())])
            }
        })
        .collect();
    let contract: Vec<&str> = (0..rows)
        .map(|_| {
            if rng.gen_bool(0.9) {
                "Cash loans"
            } else {
                "Revolving loans"
            }
        })
        .collect();
    let children: Vec<i64> = (0..rows).map(|_| rng.gen_range(0..4)).collect();
    let family_members: Vec<Option<f64>> = children
        .iter()
        .map(|c| {
            if rng.gen_bool(0.01) {
                None
            } else {
                Some(*c as f64 + rng.gen_range(1..3) as f64)
            }
        })
        .collect();
    let ext_source: Vec<Option<f64>> = (0..rows)
        .map(|_| {
            if rng.gen_bool(0.7) {
                None
            } else {
                Some(rng.gen::<f64>())
            }
        })
        .collect();

    DataFrame::new(vec![
        Column::new("SK_ID_CURR".into(), ids),
        Column::new("TARGET".into(), target),
        Column::new("NAME_CONTRACT_TYPE".into(), contract),
        Column::new("CODE_GENDER".into(), gender),
        Column::new("CNT_CHILDREN".into(), children),
        Column::new("AMT_INCOME_TOTAL".into(), income),
        Column::new("AMT_CREDIT".into(), credit),
        Column::new("AMT_ANNUITY".into(), annuity),
        Column::new("AMT_GOODS_PRICE".into(), goods),
        Column::new("NAME_EDUCATION_TYPE".into(), education),
        Column::new("NAME_FAMILY_STATUS".into(), family),
        Column::new("NAME_HOUSING_TYPE".into(), housing),
        Column::new("DAYS_BIRTH".into(), days_birth),
        Column::new("DAYS_EMPLOYED".into(), days_employed),
        Column::new("OCCUPATION_TYPE".into(), occupation),
        Column::new("CNT_FAM_MEMBERS".into(), family_members),
        Column::new("EXT_SOURCE_1".into(), ext_source),
    ])
    .unwrap()
}

/// Create a small raw table with hand-picked values
pub fn create_small_application_dataframe() -> DataFrame {
    df! {
        "SK_ID_CURR" => [1i64, 2, 3, 4, 5, 6, 7, 8],
        "TARGET" => [0i32, 1, 0, 0, 1, 0, 0, 0],
        "CODE_GENDER" => ["F", "M", "F", "F", "M", "F", "M", "F"],
        "NAME_EDUCATION_TYPE" => [
            "Higher education",
            "Secondary / secondary special",
            "Higher education",
            "Secondary / secondary special",
            "Secondary / secondary special",
            "Higher education",
            "Secondary / secondary special",
            "Higher education",
        ],
        "NAME_FAMILY_STATUS" => [
            Some("Married"), Some("Single / not married"), Some("Married"), None,
            Some("Married"), Some("Widow"), Some("Married"), Some("Single / not married"),
        ],
        "NAME_HOUSING_TYPE" => [
            "House / apartment", "With parents", "House / apartment", "House / apartment",
            "Rented apartment", "House / apartment", "With parents", "House / apartment",
        ],
        "AMT_INCOME_TOTAL" => [
            Some(135_000.0f64), Some(90_000.0), Some(202_500.0), None,
            Some(67_500.0), Some(180_000.0), Some(112_500.0), Some(157_500.0),
        ],
        "AMT_CREDIT" => [
            406_597.5f64, 1_293_502.5, 135_000.0, 312_682.5, 513_000.0, 490_495.5, 1_560_726.0, 270_000.0,
        ],
        "AMT_ANNUITY" => [
            Some(24_700.5f64), Some(35_698.5), Some(6_750.0), Some(29_686.5),
            None, Some(27_517.5), Some(41_301.0), Some(13_500.0),
        ],
        "DAYS_BIRTH" => [-9_461i64, -16_765, -19_046, -19_005, -19_932, -16_941, -13_778, -18_850],
        "DAYS_EMPLOYED" => [-637i64, -1_188, -225, -3_039, -3_038, -1_588, -3_130, 365_243],
        "OCCUPATION_TYPE" => [
            Some("Laborers"), Some("Core staff"), Some("Laborers"), None,
            Some("Core staff"), Some("Laborers"), Some("Managers"), None,
        ],
        "CNT_CHILDREN" => [0i64, 0, 0, 0, 0, 0, 1, 0],
        "CNT_FAM_MEMBERS" => [1.0f64, 2.0, 1.0, 2.0, 1.0, 2.0, 3.0, 2.0],
    }
    .unwrap()
}

/// Create a temporary directory with a CSV file holding `df`
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("application_train.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}
