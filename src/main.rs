//! Credscope: Credit Default EDA CLI Tool
//!
//! Loads a loan application table, cleans it, filters it and prints the
//! dashboard pages or opens them in an interactive terminal UI.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use console::style;

use credscope::cli::{self, confirm_overwrite, run_dashboard, Cli, Commands};
use credscope::pipeline::{DataSource, FilterOptions, FilterSession, TableCache};
use credscope::report::{
    compute_page, export_dashboard_report, package_bundle, print_page, write_csv, DashboardReport,
    PreprocessSummary, ReportParams,
};
use credscope::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_completion,
    print_config, print_count, print_info, print_step_header, print_step_time, print_success,
    print_warning,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    // Handle subcommands
    if let Some(command) = &cli.command {
        return match command {
            Commands::Clean {
                input,
                output,
                infer_schema_length,
            } => cli::clean::run_clean(input, output.as_deref(), *infer_schema_length, cli.no_confirm),
        };
    }

    let input = cli.input().ok_or_else(|| {
        anyhow::anyhow!("Input file is required. Use -i/--input to specify a file.")
    })?;

    let config = cli.preprocess_config();
    config.validate()?;

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(input, &config);

    // Step 1: Load and clean
    print_step_header(1, "Load & Clean");

    let step_start = Instant::now();
    let source = DataSource::path(input);
    let mut cache = TableCache::default().with_infer_schema_length(cli.infer_schema_length);

    let spinner = create_spinner(&format!("Loading {}...", source.display_name()));
    let raw = match cache.get_or_load(&source) {
        Ok(raw) => raw,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e);
        }
    };
    finish_with_success(&spinner, &format!("Loaded {} rows", raw.height()));

    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", raw.height());
    println!("      Columns: {}", raw.width());
    println!(
        "      Estimated memory: {:.2} MB",
        raw.estimated_size() as f64 / (1024.0 * 1024.0)
    );

    let spinner = create_spinner("Preprocessing...");
    let prepared = match cache.get_or_prepare(&source, &config) {
        Ok(prepared) => prepared,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e);
        }
    };
    finish_with_success(&spinner, "Preprocessing complete");

    let report = &prepared.report;
    if report.dropped_columns.is_empty() {
        print_info("No columns exceed the missing value threshold");
    } else {
        print_count(
            "column(s) with high missing values",
            report.dropped_columns.len(),
            Some(&format!("(>{:.1}%)", config.missing_threshold * 100.0)),
        );
    }
    let load_elapsed = step_start.elapsed();
    log::debug!("load and clean took {:?}", load_elapsed);
    print_step_time(load_elapsed.as_secs_f64());

    let mut summary = PreprocessSummary::from_report(report);

    // Step 2: Filter
    print_step_header(2, "Filter");

    let step_start = Instant::now();
    let options = FilterOptions::from_table(&prepared.table)?;
    let mut spec = cli.filter_spec(&options);
    if cli.interactive {
        spec = run_dashboard(&prepared.table, options, spec)?;
    }

    let mut session = FilterSession::new();
    let filtered = session.apply(&prepared.table, &spec)?;
    summary.set_filtered_rows(filtered.height());

    if filtered.height() == 0 {
        print_warning("No rows match the current filters");
    } else {
        print_success(&format!(
            "{} of {} rows match",
            filtered.height(),
            prepared.table.height()
        ));
    }
    let filter_elapsed = step_start.elapsed();
    log::debug!("filtering took {:?}", filter_elapsed);
    print_step_time(filter_elapsed.as_secs_f64());

    // Step 3: Pages
    if !cli.interactive {
        print_step_header(3, "Dashboard");
        for kind in cli.pages() {
            let page_start = Instant::now();
            let view = compute_page(kind, &filtered)?;
            log::debug!("{} page computed in {:?}", kind.short_title(), page_start.elapsed());
            print_page(&view);
        }
    }

    // Step 4: Exports
    if cli.has_exports() {
        print_step_header(4, "Export");

        let step_start = Instant::now();
        if let Some(path) = &cli.export {
            write_if_confirmed(path, cli.no_confirm, "Filtered rows", || {
                write_csv(&filtered, path)
            })?;
        }

        if cli.report.is_some() || cli.bundle.is_some() {
            let spinner = create_spinner("Building report...");
            let dashboard = DashboardReport::build(ReportParams {
                source: source.display_name(),
                rows_total: prepared.table.height(),
                filtered: &filtered,
                filters: &spec,
                config: &config,
                preprocess: report,
            })?;
            finish_with_success(&spinner, "Report built");

            if let Some(path) = &cli.report {
                write_if_confirmed(path, cli.no_confirm, "Report", || {
                    export_dashboard_report(&dashboard, path)
                })?;
            }
            if let Some(path) = &cli.bundle {
                write_if_confirmed(path, cli.no_confirm, "Bundle", || {
                    package_bundle(&filtered, &dashboard, path)
                })?;
            }
        }
        print_step_time(step_start.elapsed().as_secs_f64());
    }

    let stats = cache.stats();
    log::debug!(
        "cache: {} hit(s), {} miss(es), {} eviction(s)",
        stats.hits,
        stats.misses,
        stats.evictions
    );

    summary.display();
    print_completion();

    Ok(())
}

fn write_if_confirmed(
    path: &Path,
    no_confirm: bool,
    what: &str,
    write: impl FnOnce() -> Result<()>,
) -> Result<()> {
    if !confirm_overwrite(path, no_confirm)? {
        print_info(&format!("{} export skipped", what));
        return Ok(());
    }
    let spinner = create_spinner(&format!("Writing {}...", path.display()));
    match write() {
        Ok(()) => {
            finish_with_success(&spinner, &format!("{} saved to {}", what, path.display()));
            Ok(())
        }
        Err(e) => {
            finish_with_warning(&spinner, &format!("{} export failed", what));
            Err(e)
        }
    }
}
