//! The five dashboard pages
//!
//! Each page is a typed, serialisable model computed from the filtered table
//! alone, plus a [`PageView`] that lays it out as metrics and charts for the
//! terminal renderers.

mod correlations;
mod demographics;
mod financial;
mod overview;
mod risk;

pub use correlations::CorrelationsPage;
pub use demographics::DemographicsPage;
pub use financial::FinancialPage;
pub use overview::OverviewPage;
pub use risk::RiskPage;

use std::fmt;

use anyhow::Result;
use clap::ValueEnum;
use polars::prelude::*;
use serde::Serialize;

use crate::pipeline::aggregate::{
    BinRate, CrossTabRow, GroupRate, GroupSummary, HistogramBin, SplitHistogramBin, TargetSplit,
    ValueCount,
};
use crate::pipeline::correlation::CorrelationMatrix;
use crate::pipeline::stats::FiveNumberSummary;

/// Dashboard page selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    /// Overview and data quality
    Overview,
    /// Target and risk segmentation
    Risk,
    /// Demographics and household profile
    Demographics,
    /// Financial health and affordability
    Financial,
    /// Correlations and drivers
    Correlations,
}

impl PageKind {
    pub const ALL: [PageKind; 5] = [
        PageKind::Overview,
        PageKind::Risk,
        PageKind::Demographics,
        PageKind::Financial,
        PageKind::Correlations,
    ];

    pub fn title(self) -> &'static str {
        match self {
            PageKind::Overview => "Overview & Data Quality",
            PageKind::Risk => "Target & Risk Segmentation",
            PageKind::Demographics => "Demographics & Household",
            PageKind::Financial => "Financial Health & Affordability",
            PageKind::Correlations => "Correlations & Drivers",
        }
    }

    pub fn short_title(self) -> &'static str {
        match self {
            PageKind::Overview => "Overview",
            PageKind::Risk => "Risk",
            PageKind::Demographics => "Demographics",
            PageKind::Financial => "Financial",
            PageKind::Correlations => "Correlations",
        }
    }
}

/// Text shown in place of a statistic over an empty set
pub const NO_DATA: &str = "no data";

/// A displayable metric value; `None` renders as "no data"
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MetricValue {
    Count(Option<usize>),
    /// Fraction in `[0, 1]`, shown as a percentage
    Percent(Option<f64>),
    Amount(Option<f64>),
    Ratio(Option<f64>),
    Years(Option<f64>),
    Text(Option<String>),
}

/// Group digits of the integral part with commas.
pub fn format_amount(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, ch) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 && rounded != "0" {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(Some(n)) => write!(f, "{}", format_amount(*n as f64)),
            MetricValue::Percent(Some(p)) => write!(f, "{:.2}%", p * 100.0),
            MetricValue::Amount(Some(a)) => write!(f, "{}", format_amount(*a)),
            MetricValue::Ratio(Some(r)) => write!(f, "{:.2}", r),
            MetricValue::Years(Some(y)) => write!(f, "{:.1} yrs", y),
            MetricValue::Text(Some(t)) => write!(f, "{}", t),
            _ => write!(f, "{}", NO_DATA),
        }
    }
}

impl MetricValue {
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            MetricValue::Count(None)
                | MetricValue::Percent(None)
                | MetricValue::Amount(None)
                | MetricValue::Ratio(None)
                | MetricValue::Years(None)
                | MetricValue::Text(None)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: MetricValue,
}

impl Metric {
    pub fn new(label: &str, value: MetricValue) -> Self {
        Self {
            label: label.to_string(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Histogram,
    Table,
    Heatmap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

/// Tabular form of a chart: one row per bar, bin or group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub kind: ChartKind,
    pub columns: Vec<String>,
    pub rows: Vec<ChartRow>,
}

/// `(lower, upper]` bin label with precision suited to the magnitude.
pub fn bin_label(lower: f64, upper: f64) -> String {
    let width = (upper - lower).abs();
    if width >= 10.0 {
        format!("({}, {}]", format_amount(lower), format_amount(upper))
    } else if width >= 0.1 {
        format!("({:.1}, {:.1}]", lower, upper)
    } else {
        format!("({:.3}, {:.3}]", lower, upper)
    }
}

fn percent(rate: Option<f64>) -> Option<f64> {
    rate.map(|r| r * 100.0)
}

impl Chart {
    fn new(title: &str, kind: ChartKind, columns: &[&str], rows: Vec<ChartRow>) -> Self {
        Self {
            title: title.to_string(),
            kind,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn from_rates(title: &str, rates: &[GroupRate]) -> Self {
        let rows = rates
            .iter()
            .map(|r| ChartRow {
                label: r.group.clone(),
                values: vec![percent(r.rate), Some(r.count as f64)],
            })
            .collect();
        Self::new(title, ChartKind::Bar, &["Default rate %", "Applicants"], rows)
    }

    pub fn from_counts(title: &str, counts: &[ValueCount]) -> Self {
        let rows = counts
            .iter()
            .map(|c| ChartRow {
                label: c.value.clone(),
                values: vec![Some(c.count as f64), Some(c.share * 100.0)],
            })
            .collect();
        Self::new(title, ChartKind::Bar, &["Count", "Share %"], rows)
    }

    pub fn from_integer_counts(title: &str, counts: &[(i64, usize)]) -> Self {
        let rows = counts
            .iter()
            .map(|(value, count)| ChartRow {
                label: value.to_string(),
                values: vec![Some(*count as f64)],
            })
            .collect();
        Self::new(title, ChartKind::Bar, &["Count"], rows)
    }

    pub fn from_histogram(title: &str, bins: &[HistogramBin]) -> Self {
        let rows = bins
            .iter()
            .map(|b| ChartRow {
                label: bin_label(b.lower, b.upper),
                values: vec![Some(b.count as f64)],
            })
            .collect();
        Self::new(title, ChartKind::Histogram, &["Count"], rows)
    }

    pub fn from_split_histogram(title: &str, bins: &[SplitHistogramBin]) -> Self {
        let rows = bins
            .iter()
            .map(|b| ChartRow {
                label: bin_label(b.lower, b.upper),
                values: vec![Some(b.repaid as f64), Some(b.defaulted as f64)],
            })
            .collect();
        Self::new(title, ChartKind::Histogram, &["Repaid", "Default"], rows)
    }

    pub fn from_bin_rates(title: &str, bins: &[BinRate]) -> Self {
        let rows = bins
            .iter()
            .map(|b| ChartRow {
                label: bin_label(b.lower, b.upper),
                values: vec![percent(b.rate), Some(b.count as f64)],
            })
            .collect();
        Self::new(title, ChartKind::Bar, &["Default rate %", "Applicants"], rows)
    }

    pub fn from_group_summaries(title: &str, summaries: &[GroupSummary]) -> Self {
        let rows = summaries
            .iter()
            .map(|s| ChartRow {
                label: s.group.clone(),
                values: vec![s.mean, s.median, s.max],
            })
            .collect();
        Self::new(title, ChartKind::Table, &["Mean", "Median", "Max"], rows)
    }

    pub fn from_five_numbers(title: &str, split: &TargetSplit<FiveNumberSummary>) -> Self {
        let row = |label: &str, summary: &Option<FiveNumberSummary>| ChartRow {
            label: label.to_string(),
            values: match summary {
                Some(s) => vec![Some(s.min), Some(s.q1), Some(s.median), Some(s.q3), Some(s.max)],
                None => vec![None; 5],
            },
        };
        Self::new(
            title,
            ChartKind::Table,
            &["Min", "Q1", "Median", "Q3", "Max"],
            vec![row("Repaid", &split.repaid), row("Default", &split.defaulted)],
        )
    }

    pub fn from_crosstab(title: &str, rows: &[CrossTabRow]) -> Self {
        let rows = rows
            .iter()
            .map(|r| ChartRow {
                label: r.value.clone(),
                values: vec![Some(r.repaid as f64), Some(r.defaulted as f64)],
            })
            .collect();
        Self::new(title, ChartKind::Bar, &["Repaid", "Default"], rows)
    }

    pub fn from_correlations(title: &str, pairs: &[(String, f64)]) -> Self {
        let rows = pairs
            .iter()
            .map(|(name, corr)| ChartRow {
                label: name.clone(),
                values: vec![Some(*corr)],
            })
            .collect();
        Self::new(title, ChartKind::Bar, &["Correlation"], rows)
    }

    pub fn from_missing(title: &str, ratios: &[(String, f64)]) -> Self {
        let rows = ratios
            .iter()
            .map(|(name, ratio)| ChartRow {
                label: name.clone(),
                values: vec![Some(ratio * 100.0)],
            })
            .collect();
        Self::new(title, ChartKind::Bar, &["Missing %"], rows)
    }

    pub fn heatmap(title: &str, matrix: &CorrelationMatrix) -> Self {
        let rows = matrix
            .columns
            .iter()
            .zip(&matrix.values)
            .map(|(name, values)| ChartRow {
                label: name.clone(),
                values: values.clone(),
            })
            .collect();
        Self {
            title: title.to_string(),
            kind: ChartKind::Heatmap,
            columns: matrix.columns.clone(),
            rows,
        }
    }
}

/// Metrics and charts of one page, ready to render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub kind: PageKind,
    pub title: String,
    pub metrics: Vec<Metric>,
    pub charts: Vec<Chart>,
}

/// Every page model, computed from the same filtered table
#[derive(Debug, Clone, Serialize)]
pub struct DashboardPages {
    pub overview: OverviewPage,
    pub risk: RiskPage,
    pub demographics: DemographicsPage,
    pub financial: FinancialPage,
    pub correlations: CorrelationsPage,
}

impl DashboardPages {
    pub fn compute(df: &DataFrame) -> Result<Self> {
        Ok(Self {
            overview: OverviewPage::compute(df)?,
            risk: RiskPage::compute(df)?,
            demographics: DemographicsPage::compute(df)?,
            financial: FinancialPage::compute(df)?,
            correlations: CorrelationsPage::compute(df)?,
        })
    }

    pub fn view(&self, kind: PageKind) -> PageView {
        match kind {
            PageKind::Overview => self.overview.view(),
            PageKind::Risk => self.risk.view(),
            PageKind::Demographics => self.demographics.view(),
            PageKind::Financial => self.financial.view(),
            PageKind::Correlations => self.correlations.view(),
        }
    }
}

/// Compute a single page from the filtered table.
pub fn compute_page(kind: PageKind, df: &DataFrame) -> Result<PageView> {
    let view = match kind {
        PageKind::Overview => OverviewPage::compute(df)?.view(),
        PageKind::Risk => RiskPage::compute(df)?.view(),
        PageKind::Demographics => DemographicsPage::compute(df)?.view(),
        PageKind::Financial => FinancialPage::compute(df)?.view(),
        PageKind::Correlations => CorrelationsPage::compute(df)?.view(),
    };
    Ok(view)
}
