//! Terminal dashboard for an audit run

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use owo_colors::OwoColorize;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::report::Report;

const AGING_ROWS_SHOWN: usize = 5;
const MISSING_ROWS_SHOWN: usize = 5;
const PROGRESS_BLOCKS: usize = 20;

/// Print the audit dashboard to stdout.
pub fn print_dashboard(report: &Report) {
    let summary = &report.summary;

    println!();
    println!("{}", format!("📒 Inventory audit — {}", report.update_at).bright_blue().bold());
    println!("{}", "─".repeat(55));

    println!(" 💰 Total investment:   {}", format_money(summary.total_investment));
    println!(" ✅ Realized cash:      {}", format_money(summary.realized_cash));
    println!(" ⏳ Floating asset:     {}", format_money(summary.floating_asset));
    println!(" 📈 Current profit:     {}", format_signed(summary.current_profit));
    println!(" 🔮 Expected profit:    {}", format_signed(summary.expected_profit));
    println!(" 📊 Recovery: {}", recovery_bar(summary.recovery_rate));
    println!("{}", "─".repeat(55));

    if !report.details.on_shelf_aging.is_empty() {
        println!("{}", " 🕒 Slowest listings".bright_yellow());
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Days", "Price", "Listing"]);
        for entry in report.details.on_shelf_aging.iter().take(AGING_ROWS_SHOWN) {
            table.add_row(vec![
                Cell::new(entry.days),
                Cell::new(format!("{:.2}", entry.price)),
                Cell::new(&entry.name),
            ]);
        }
        println!("{table}");
    } else if summary.stats.active == 0 {
        println!(" ✨ Shelf is empty");
    }

    let missing = &report.details.missing;
    if missing.is_empty() {
        println!(" {}", "✅ Every purchased unit is accounted for".green());
    } else {
        println!(
            " {}",
            format!("⚠️  {} unit(s) purchased but never listed", missing.len()).yellow()
        );
        for entry in missing.iter().take(MISSING_ROWS_SHOWN) {
            println!("    ❓ {} ({})", entry.name, entry.key);
        }
        if missing.len() > MISSING_ROWS_SHOWN {
            println!("    … and {} more", missing.len() - MISSING_ROWS_SHOWN);
        }
    }

    if !report.details.ghost_inventory.is_empty() {
        println!(
            " {}",
            format!(
                "👻 {} sale-side listing(s) with no purchase record (informational)",
                report.details.ghost_inventory.len()
            )
            .bright_magenta()
        );
    }

    println!("{}", "─".repeat(55));
    let stats = &summary.stats;
    println!(
        " 📦 sold({}) active({}) missing({}) damaged({}) ghost({}) blacklisted({})",
        stats.sold, stats.active, stats.missing, stats.damaged, stats.ghost, stats.blacklisted
    );
    println!();
}

fn format_money(value: Decimal) -> String {
    format!("¥ {:.2}", value)
}

fn format_signed(value: Decimal) -> String {
    if value >= Decimal::ZERO {
        format!("¥ {:.2}", value).green().to_string()
    } else {
        format!("¥ {:.2}", value).red().to_string()
    }
}

fn recovery_bar(rate: Decimal) -> String {
    let pct = rate.to_f64().unwrap_or(0.0).clamp(0.0, 100.0);
    let filled = ((pct / 100.0) * PROGRESS_BLOCKS as f64).round() as usize;
    let bar: String =
        "█".repeat(filled.min(PROGRESS_BLOCKS)) + &"░".repeat(PROGRESS_BLOCKS - filled.min(PROGRESS_BLOCKS));
    format!("[{}] {:.1}%", bar, rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_recovery_bar_bounds() {
        assert!(recovery_bar(dec!(0)).contains(&"░".repeat(20)));
        assert!(recovery_bar(dec!(100)).contains(&"█".repeat(20)));
        // Values beyond 100% clamp instead of overflowing the bar.
        assert!(recovery_bar(dec!(250)).contains(&"█".repeat(20)));
        assert!(recovery_bar(dec!(40)).contains("40.0%"));
    }
}
