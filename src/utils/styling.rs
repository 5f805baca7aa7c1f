//! Terminal styling for the banner, config card and step headers

use console::{style, Emoji};
use std::path::Path;

use crate::pipeline::preprocess::PreprocessConfig;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static SCISSORS: Emoji<'_, '_> = Emoji("✂️  ", "");
pub static TAG: Emoji<'_, '_> = Emoji("🏷️  ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    let banner = r#"
     ██████╗██████╗ ███████╗██████╗ ███████╗ ██████╗ ██████╗ ██████╗ ███████╗
    ██╔════╝██╔══██╗██╔════╝██╔══██╗██╔════╝██╔════╝██╔═══██╗██╔══██╗██╔════╝
    ██║     ██████╔╝█████╗  ██║  ██║███████╗██║     ██║   ██║██████╔╝█████╗
    ██║     ██╔══██╗██╔══╝  ██║  ██║╚════██║██║     ██║   ██║██╔═══╝ ██╔══╝
    ╚██████╗██║  ██║███████╗██████╔╝███████║╚██████╗╚██████╔╝██║     ███████╗
     ╚═════╝╚═╝  ╚═╝╚══════╝╚═════╝ ╚══════╝ ╚═════╝ ╚═════╝ ╚═╝     ╚══════╝
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!(
        "    {} {}",
        style("◆").magenta().bold(),
        style("Credit default risk at a glance").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print the configuration card
pub fn print_config(input: &Path, config: &PreprocessConfig) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(box_width - 20)
    );
    println!("    ├{}┤", line);
    println!("    │  {} Input:  {:<39}│", FOLDER, truncate_path(input, 38));
    println!("    ├{}┤", line);
    println!(
        "    │  {} Missing threshold: {:<28}│",
        CHART,
        style(format!("{:.1}%", config.missing_threshold * 100.0)).yellow()
    );
    println!(
        "    │  {} Rare level share:  {:<28}│",
        TAG,
        style(format!("{:.1}%", config.rare_threshold * 100.0)).yellow()
    );
    println!(
        "    │  {} Winsorize:         {:<28}│",
        SCISSORS,
        style(format!(
            "[{:.2}, {:.2}]",
            config.winsor_lower, config.winsor_upper
        ))
        .yellow()
    );
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("    {} {}", WARN, style(message).yellow());
}

/// Print how long a step took
pub fn print_step_time(elapsed_secs: f64) {
    println!(
        "      {}",
        style(format!("⏱  {:.2}s", elapsed_secs)).dim()
    );
}

/// Print the final completion message
pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style("Credscope dashboard complete!").green().bold()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    if let Some(info) = detail {
        println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!("      Found {} {}", style(count).yellow().bold(), description);
    }
}

pub fn truncate_path(path: &Path, max_len: usize) -> String {
    truncate_string(&path.display().to_string(), max_len)
}

/// Keep the tail of `s` so that it fits in `max_len` characters.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        return s.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("...{}", tail)
}
