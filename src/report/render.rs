//! Terminal rendering of page views as styled tables and text bar charts

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use super::pages::{format_amount, Chart, ChartKind, Metric, PageView, NO_DATA};

/// Width of the longest text bar
pub const BAR_WIDTH: usize = 30;

/// Horizontal bar of `value` scaled against `max`.
pub fn bar(value: f64, max: f64, width: usize) -> String {
    if !(value.is_finite() && max.is_finite()) || max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let filled = ((value / max) * width as f64).round() as usize;
    "█".repeat(filled.clamp(1, width))
}

/// Cell text of a chart value.
pub fn format_value(value: Option<f64>, kind: ChartKind) -> String {
    match value {
        None => NO_DATA.to_string(),
        Some(v) if kind == ChartKind::Heatmap => format!("{:.2}", v),
        Some(v) if v.abs() >= 1000.0 => format_amount(v),
        Some(v) if v.fract() == 0.0 => format!("{:.0}", v),
        Some(v) => format!("{:.2}", v),
    }
}

fn heatmap_color(value: Option<f64>) -> Color {
    match value {
        Some(v) if v >= 0.5 => Color::Red,
        Some(v) if v >= 0.1 => Color::Yellow,
        Some(v) if v <= -0.5 => Color::Blue,
        Some(v) if v <= -0.1 => Color::Cyan,
        Some(_) => Color::White,
        None => Color::DarkGrey,
    }
}

fn header(columns: impl IntoIterator<Item = String>) -> Vec<Cell> {
    columns
        .into_iter()
        .map(|c| Cell::new(c).add_attribute(Attribute::Bold))
        .collect()
}

pub fn metrics_table(metrics: &[Metric]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(header(["Metric".to_string(), "Value".to_string()]));

    for metric in metrics {
        let value = Cell::new(metric.value.to_string()).set_alignment(CellAlignment::Right);
        let value = if metric.value.is_missing() {
            value.fg(Color::DarkGrey)
        } else {
            value.fg(Color::Cyan).add_attribute(Attribute::Bold)
        };
        table.add_row(vec![Cell::new(&metric.label), value]);
    }
    table
}

pub fn chart_table(chart: &Chart) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);

    let mut columns = vec![String::new()];
    columns.extend(chart.columns.iter().cloned());
    let with_bar = matches!(chart.kind, ChartKind::Bar | ChartKind::Histogram);
    if with_bar {
        columns.push(String::new());
    }
    table.set_header(header(columns));

    let max = chart
        .rows
        .iter()
        .filter_map(|r| r.values.first().copied().flatten())
        .map(f64::abs)
        .fold(0.0, f64::max);

    for row in &chart.rows {
        let mut cells = vec![Cell::new(&row.label)];
        for value in &row.values {
            let cell = Cell::new(format_value(*value, chart.kind)).set_alignment(CellAlignment::Right);
            let cell = match chart.kind {
                ChartKind::Heatmap => cell.fg(heatmap_color(*value)),
                _ if value.is_none() => cell.fg(Color::DarkGrey),
                _ => cell,
            };
            cells.push(cell);
        }
        if with_bar {
            let first = row.values.first().copied().flatten().map(f64::abs);
            cells.push(Cell::new(bar(first.unwrap_or(0.0), max, BAR_WIDTH)).fg(Color::Green));
        }
        table.add_row(cells);
    }
    table
}

fn indent(table: &Table, prefix: &str) -> String {
    table
        .to_string()
        .lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain-text rendering of a whole page, without terminal escape codes.
pub fn render_page(view: &PageView) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", view.title));
    let mut metrics = metrics_table(&view.metrics);
    metrics.force_no_tty();
    out.push_str(&indent(&metrics, "    "));
    out.push('\n');

    for chart in &view.charts {
        out.push_str(&format!("\n    {}\n", chart.title));
        if chart.is_empty() {
            out.push_str(&format!("      {}\n", NO_DATA));
            continue;
        }
        let mut table = chart_table(chart);
        table.force_no_tty();
        out.push_str(&indent(&table, "    "));
        out.push('\n');
    }
    out
}

/// Print a page with a styled header.
pub fn print_page(view: &PageView) {
    println!();
    println!(
        "    {} {}",
        style("▌").cyan().bold(),
        style(view.title.to_uppercase()).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!("{}", indent(&metrics_table(&view.metrics), "    "));

    for chart in &view.charts {
        println!();
        println!("    {}", style(&chart.title).cyan());
        if chart.is_empty() {
            println!("      {}", style(NO_DATA).dim());
            continue;
        }
        println!("{}", indent(&chart_table(chart), "    "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::pages::{ChartRow, MetricValue, PageKind};

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(10.0, 10.0, 4), "████");
        assert_eq!(bar(5.0, 10.0, 4), "██");
        assert_eq!(bar(0.01, 10.0, 4), "█");
        assert_eq!(bar(0.0, 10.0, 4), "");
        assert_eq!(bar(1.0, 0.0, 4), "");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(None, ChartKind::Bar), NO_DATA);
        assert_eq!(format_value(Some(12.0), ChartKind::Bar), "12");
        assert_eq!(format_value(Some(0.456), ChartKind::Bar), "0.46");
        assert_eq!(format_value(Some(250000.0), ChartKind::Table), "250,000");
        assert_eq!(format_value(Some(1.0), ChartKind::Heatmap), "1.00");
    }

    #[test]
    fn test_render_page_marks_empty_charts() {
        let view = PageView {
            kind: PageKind::Overview,
            title: "Overview".to_string(),
            metrics: vec![Metric::new("Default rate", MetricValue::Percent(None))],
            charts: vec![Chart {
                title: "Empty".to_string(),
                kind: ChartKind::Bar,
                columns: vec!["Count".to_string()],
                rows: Vec::<ChartRow>::new(),
            }],
        };

        let text = render_page(&view);
        assert!(text.contains("Default rate"));
        assert!(text.contains(NO_DATA));
    }
}
