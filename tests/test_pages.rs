//! Integration tests for the dashboard pages

use std::collections::BTreeSet;

use credscope::pipeline::columns::*;
use credscope::pipeline::{apply_filters, preprocess, FilterOptions, FilterSpec, PreprocessConfig};
use credscope::report::pages::{
    compute_page, CorrelationsPage, DashboardPages, FinancialPage, OverviewPage, PageKind,
    RiskPage, NO_DATA,
};
use credscope::report::render_page;
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

fn cleaned() -> DataFrame {
    let raw = common::create_application_dataframe(1_200, 42);
    preprocess(&raw, &PreprocessConfig::default()).unwrap().table
}

fn bracket_example() -> DataFrame {
    let raw = df! {
        "SK_ID_CURR" => [1i64, 2, 3, 4],
        "TARGET" => [0i32, 1, 0, 1],
        "CODE_GENDER" => ["F", "M", "F", "M"],
        "NAME_EDUCATION_TYPE" => ["Higher education"; 4],
        "NAME_FAMILY_STATUS" => ["Married"; 4],
        "NAME_HOUSING_TYPE" => ["House / apartment"; 4],
        "AMT_INCOME_TOTAL" => [20_000.0f64, 50_000.0, 50_000.0, 90_000.0],
        "AMT_CREDIT" => [100_000.0f64, 200_000.0, 300_000.0, 400_000.0],
        "AMT_ANNUITY" => [5_000.0f64, 10_000.0, 15_000.0, 20_000.0],
        "DAYS_BIRTH" => [-10_000i64, -12_000, -14_000, -16_000],
        "DAYS_EMPLOYED" => [-1_000i64, -2_000, -3_000, -4_000],
    }
    .unwrap();
    let config = PreprocessConfig {
        winsor_lower: 0.0,
        winsor_upper: 1.0,
        ..PreprocessConfig::default()
    };
    preprocess(&raw, &config).unwrap().table
}

#[test]
fn test_income_bracket_default_rates() {
    let page = FinancialPage::compute(&bracket_example()).unwrap();

    let groups: Vec<&str> = page
        .rate_by_income_bracket
        .iter()
        .map(|r| r.group.as_str())
        .collect();
    assert_eq!(groups, vec!["Low", "Mid", "High"]);

    let mid = &page.rate_by_income_bracket[1];
    assert_eq!(mid.count, 2);
    assert_eq!(mid.rate, Some(0.5));
    assert_eq!(page.rate_by_income_bracket[0].rate, Some(0.0));
    assert_eq!(page.rate_by_income_bracket[2].rate, Some(1.0));
}

#[test]
fn test_overview_counts_applicants() {
    let df = cleaned();
    let page = OverviewPage::compute(&df).unwrap();

    assert_eq!(page.total_applicants, Some(1_200));
    let default_rate = page.default_rate.unwrap();
    let repaid_rate = page.repaid_rate.unwrap();
    assert!((default_rate + repaid_rate - 1.0).abs() < 1e-12);
    assert!((0.0..=1.0).contains(&default_rate));
    assert_eq!(page.total_features, df.width());
    assert_eq!(page.numeric_features + page.categorical_features, df.width());
}

#[test]
fn test_risk_rates_are_fractions() {
    let page = RiskPage::compute(&cleaned()).unwrap();

    for rate in page
        .rate_by_gender
        .iter()
        .chain(&page.rate_by_education)
        .chain(&page.rate_by_housing)
    {
        let r = rate.rate.unwrap();
        assert!((0.0..=1.0).contains(&r), "{} rate {}", rate.group, r);
    }
    assert!(page.total_defaults.unwrap() > 0);
}

#[test]
fn test_correlations_page_ranks_target_drivers() {
    let page = CorrelationsPage::compute(&cleaned()).unwrap();

    let values: Vec<f64> = page.target_correlations.iter().map(|(_, c)| *c).collect();
    assert!(values.windows(2).all(|w| w[0] >= w[1]));
    assert!(page.top_positive.len() <= 5);
    assert!(page.top_abs.len() <= 20);
    assert_eq!(page.heatmap.columns.len(), 4);
    assert!(!page.target_correlations.iter().any(|(name, _)| name == TARGET));
}

#[test]
fn test_empty_selection_reports_no_data() {
    let df = cleaned();
    let options = FilterOptions::from_table(&df).unwrap();
    let mut spec = FilterSpec::select_all(&options);
    spec.gender = BTreeSet::new();
    let empty = apply_filters(&df, &spec).unwrap();
    assert_eq!(empty.height(), 0);

    let pages = DashboardPages::compute(&empty).unwrap();
    assert_eq!(pages.overview.default_rate, None);
    assert_eq!(pages.financial.avg_income, None);
    assert_eq!(pages.demographics.male_share, None);

    for kind in PageKind::ALL {
        let text = render_page(&pages.view(kind));
        assert!(text.contains(NO_DATA), "{:?} page has no placeholder", kind);
        assert!(!text.contains("NaN"));
    }
}

#[test]
fn test_pages_without_target_column() {
    let df = cleaned().drop(TARGET).unwrap();

    let overview = OverviewPage::compute(&df).unwrap();
    assert_eq!(overview.default_rate, None);
    assert!(overview.total_applicants.is_some());

    let risk = RiskPage::compute(&df).unwrap();
    assert_eq!(risk.total_defaults, None);
    assert!(risk.rate_by_gender.is_empty());

    let view = compute_page(PageKind::Risk, &df).unwrap();
    assert!(render_page(&view).contains(NO_DATA));
}

#[test]
fn test_every_page_renders() {
    let df = cleaned();
    for kind in PageKind::ALL {
        let view = compute_page(kind, &df).unwrap();
        assert_eq!(view.kind, kind);
        assert!(!view.metrics.is_empty());
        let text = render_page(&view);
        assert!(text.starts_with(kind.title()));
    }
}
