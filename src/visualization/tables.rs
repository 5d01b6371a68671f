use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::{
    modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement,
    Table,
};

use crate::io::BlastLogRow;
use crate::models::{RoyaltyCalculationResult, RoyaltyRecord, RoyaltySettings};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn amount(value: f64) -> Cell {
    Cell::new(format!("{value:.2}")).set_alignment(CellAlignment::Right)
}

fn date(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Format the full breakdown of one royalty calculation as a string.
pub fn format_calculation_summary(result: &RoyaltyCalculationResult) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", "Royalty Calculation".bold().green()));
    output.push_str(&format!(
        "{}\n",
        format!(
            "Calculated {} | Payment due {}",
            date(&result.calculation_date),
            date(&result.payment_due_date)
        )
        .dimmed()
    ));
    output.push_str(&format!("{}\n", "=".repeat(50)));

    if let Some(warning) = &result.warning_message {
        output.push_str(&format!("{}\n", warning.yellow()));
    }

    let inputs = &result.inputs;
    let c = &result.calculations;
    let rates = &result.rates_applied;

    let mut table = new_table(vec!["Item", "Value", "Unit"]);
    table.add_row(vec![
        Cell::new("Water gel"),
        amount(inputs.water_gel_kg),
        Cell::new("kg"),
    ]);
    table.add_row(vec![
        Cell::new("NH4NO3"),
        amount(inputs.nh4no3_kg),
        Cell::new("kg"),
    ]);
    table.add_row(vec![
        Cell::new("Powder factor"),
        Cell::new(format!("{}", inputs.powder_factor)).set_alignment(CellAlignment::Right),
        Cell::new(""),
    ]);
    table.add_row(vec![
        Cell::new("Total explosive quantity"),
        amount(c.total_explosive_quantity),
        Cell::new("kg"),
    ]);
    table.add_row(vec![
        Cell::new("Basic volume"),
        amount(c.basic_volume),
        Cell::new("m³"),
    ]);
    table.add_row(vec![
        Cell::new("Blasted rock volume"),
        amount(c.blasted_rock_volume),
        Cell::new("m³"),
    ]);
    table.add_row(vec![
        Cell::new(format!("Base royalty @ {:.2}/m³", rates.royalty_rate_per_cubic_meter)),
        amount(c.base_royalty),
        Cell::new("LKR"),
    ]);
    table.add_row(vec![
        Cell::new(format!("Royalty with SSCL ({})", rates.sscl_rate)),
        amount(c.royalty_with_sscl),
        Cell::new("LKR"),
    ]);
    table.add_row(vec![
        Cell::new(format!("Total with VAT ({})", rates.vat_rate)).fg(comfy_table::Color::Green),
        amount(c.total_amount_with_vat).fg(comfy_table::Color::Green),
        Cell::new("LKR"),
    ]);

    output.push_str(&format!("{table}\n"));
    output
}

/// Print the breakdown of one royalty calculation.
pub fn print_calculation_summary(result: &RoyaltyCalculationResult) {
    print!("{}", format_calculation_summary(result));
}

/// Format one line per blast plus a grand total.
pub fn format_batch_table(rows: &[BlastLogRow], results: &[RoyaltyCalculationResult]) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", "Blast Log Royalties".bold().green()));
    output.push_str(&format!("{}\n", "=".repeat(70)));

    let mut table = new_table(vec![
        "#",
        "Label",
        "Water gel (kg)",
        "NH4NO3 (kg)",
        "PF",
        "Volume (m³)",
        "Total (LKR)",
    ]);

    let mut grand_total = 0.0;
    for (i, (row, result)) in rows.iter().zip(results).enumerate() {
        grand_total += result.calculations.total_amount_with_vat;
        let pf = if result.has_warning() {
            format!("{}*", result.inputs.powder_factor)
        } else {
            format!("{}", result.inputs.powder_factor)
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(row.label.as_deref().unwrap_or("")),
            amount(result.inputs.water_gel_kg),
            amount(result.inputs.nh4no3_kg),
            Cell::new(pf).set_alignment(CellAlignment::Right),
            amount(result.calculations.blasted_rock_volume),
            amount(result.calculations.total_amount_with_vat),
        ]);
    }
    table.add_row(vec![
        Cell::new(""),
        Cell::new("Total").fg(comfy_table::Color::Green),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        amount(grand_total).fg(comfy_table::Color::Green),
    ]);

    output.push_str(&format!("{table}\n"));
    if results.iter().any(RoyaltyCalculationResult::has_warning) {
        output.push_str(&format!(
            "{}\n",
            "* powder factor was zero; the default was used".yellow()
        ));
    }
    output
}

pub fn print_batch_table(rows: &[BlastLogRow], results: &[RoyaltyCalculationResult]) {
    print!("{}", format_batch_table(rows, results));
}

/// Format the current royalty settings as a string.
pub fn format_settings_table(settings: &RoyaltySettings) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", "Royalty Settings".bold().green()));
    output.push_str(&format!("{}\n", "=".repeat(50)));

    let mut table = new_table(vec!["Setting", "Value"]);
    for (name, value) in settings.fields() {
        let shown = if name.ends_with("Percentage") {
            format!("{value}%")
        } else {
            format!("{value}")
        };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(shown).set_alignment(CellAlignment::Right),
        ]);
    }

    output.push_str(&format!("{table}\n"));
    output
}

pub fn print_settings_table(settings: &RoyaltySettings) {
    print!("{}", format_settings_table(settings));
}

/// Format saved royalty records, flagging those overdue at `now`.
pub fn format_history_table(records: &[RoyaltyRecord], now: DateTime<Utc>) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", "Royalty History".bold().green()));
    output.push_str(&format!("{}\n", "=".repeat(70)));

    if records.is_empty() {
        output.push_str("  No saved royalties.\n");
        return output;
    }

    let mut table = new_table(vec![
        "ID",
        "Miner",
        "Calculated",
        "Due",
        "Volume (m³)",
        "Total (LKR)",
    ]);
    for record in records {
        let due = if record.is_overdue(now) {
            Cell::new(format!("{} (overdue)", date(&record.payment_due_date)))
                .fg(comfy_table::Color::Red)
        } else {
            Cell::new(date(&record.payment_due_date))
        };
        table.add_row(vec![
            Cell::new(record.id),
            Cell::new(&record.miner_id),
            Cell::new(date(&record.calculation_date)),
            due,
            amount(record.blasted_rock_volume),
            amount(record.total_amount),
        ]);
    }

    output.push_str(&format!("{table}\n"));
    output
}

pub fn print_history_table(records: &[RoyaltyRecord], now: DateTime<Utc>) {
    print!("{}", format_history_table(records, now));
}
