// Terminal UI utilities
// Colored status lines and change report rendering.

use colored::{ColoredString, Colorize};

use crate::domain::plan::{ChangeReport, ChangeSymbol, PlannedChange};

pub fn print_header(title: &str) {
    println!();
    println!("{}", "═".repeat(62).bright_blue());
    println!("{}", format!("  {}", title).bright_blue().bold());
    println!("{}", "═".repeat(62).bright_blue());
    println!();
}

pub fn print_success(message: &str) {
    println!("{}", format!("✅ {}", message).bright_green().bold());
}

pub fn print_error(message: &str) {
    eprintln!("{}", format!("❌ {}", message).bright_red().bold());
}

pub fn print_info(message: &str) {
    println!("{}", format!("ℹ️  {}", message).bright_cyan());
}

pub fn print_warning(message: &str) {
    println!("{}", format!("⚠️  {}", message).bright_yellow());
}

fn paint(symbol: ChangeSymbol, text: &str) -> ColoredString {
    match symbol {
        ChangeSymbol::Add => text.green(),
        ChangeSymbol::Modify => text.yellow(),
        ChangeSymbol::Remove => text.red(),
    }
}

/// Headline plus indented detail, diff lines colored by their first character
pub fn print_change(change: &PlannedChange) {
    println!("{}", paint(change.symbol, &change.headline()).bold());

    let Some(detail) = change.detail.as_deref() else {
        return;
    };
    for line in detail.lines() {
        let painted = if line.starts_with("+++") || line.starts_with("---") {
            line.bold()
        } else if line.starts_with('+') {
            line.green()
        } else if line.starts_with('-') {
            line.red()
        } else if line.starts_with("@@") {
            line.cyan()
        } else {
            line.normal()
        };
        println!("    {}", painted);
    }
}

pub fn print_report(report: &ChangeReport) {
    if report.is_empty() {
        print_info("No changes");
        return;
    }
    for change in &report.changes {
        print_change(change);
    }
    println!();
    if report.dry_run {
        print_warning(&format!("Dry run: {} change(s) not applied", report.changes.len()));
    }
}
