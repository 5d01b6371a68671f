use colored::Colorize;

use crate::models::ChargeBreakdown;

const BAR_WIDTH: usize = 40;

/// Format a text bar chart of how the total splits into royalty, SSCL and VAT.
pub fn format_charge_breakdown(breakdown: &ChargeBreakdown) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", "Charge Breakdown".bold().green()));
    output.push_str(&format!("{}\n", "=".repeat(60)));

    if breakdown.total <= 0.0 {
        output.push_str("  Nothing payable.\n");
        return output;
    }

    let parts = [
        ("Base royalty", breakdown.base_royalty),
        ("SSCL", breakdown.sscl_amount),
        ("VAT", breakdown.vat_amount),
    ];

    for (label, value) in parts {
        let share = value / breakdown.total;
        let bar_len = (share * BAR_WIDTH as f64).round() as usize;
        let bar = "\u{2588}".repeat(bar_len);
        output.push_str(&format!(
            "  {:<12}  {:>14.2}  {:>5.1}%  {}\n",
            label,
            value,
            share * 100.0,
            bar.green()
        ));
    }
    output.push_str(&format!("  {}\n", "-".repeat(56)));
    output.push_str(&format!("  {:<12}  {:>14.2}\n", "Total", breakdown.total));

    output
}

/// Print the charge breakdown chart.
pub fn print_charge_breakdown(breakdown: &ChargeBreakdown) {
    print!("{}", format_charge_breakdown(breakdown));
}
