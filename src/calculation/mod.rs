mod calculator;
mod payment;
mod royalty;

pub use calculator::RoyaltyCalculator;
pub use payment::{default_payment_due_date, parse_due_date, DEFAULT_PAYMENT_TERMS_DAYS};
pub use royalty::{calculate_royalty, percentage_label, round_to_cents, zero_powder_factor_warning};
