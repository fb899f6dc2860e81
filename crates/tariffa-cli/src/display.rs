//! Vertical card display for price-table entries and table summaries.

use std::io::{self, Write};

use rust_decimal::Decimal;
use tariffa_core::estimate::capitalize;
use tariffa_core::{PriceEntry, TableSummary};

/// Print a lookup result as a card, or a not-found notice.
pub fn write_entry_card(
    out: &mut impl Write,
    code: &str,
    entry: Option<&PriceEntry>,
) -> io::Result<()> {
    writeln!(out, "=== {code} ===")?;
    match entry {
        Some(e) => {
            writeln!(out, "  {:<14} {}", "description", capitalize(&e.description))?;
            writeln!(out, "  {:<14} € {}", "price", e.price)?;
        }
        None => writeln!(out, "  not found")?,
    }
    writeln!(out)
}

/// Print price-table summary statistics.
pub fn write_summary(out: &mut impl Write, summary: &TableSummary) -> io::Result<()> {
    writeln!(out, "Price table")?;
    writeln!(out, "  {:<14} {}", "entries", summary.entries)?;
    writeln!(out, "  {:<14} {}", "min price", money(summary.min_price))?;
    writeln!(out, "  {:<14} {}", "max price", money(summary.max_price))?;
    writeln!(out, "  {:<14} {}", "mean price", money(summary.mean_price))?;
    Ok(())
}

fn money(value: Option<Decimal>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("€ {v}"))
}
