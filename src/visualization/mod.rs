mod charts;
mod tables;

pub use charts::{format_charge_breakdown, print_charge_breakdown};
pub use tables::{
    format_batch_table, format_calculation_summary, format_history_table, format_settings_table,
    print_batch_table, print_calculation_summary, print_history_table, print_settings_table,
};
