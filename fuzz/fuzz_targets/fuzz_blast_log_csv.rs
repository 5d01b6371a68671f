#![no_main]

use libfuzzer_sys::fuzz_target;
use mining_royalty::io::read_blast_log_csv_from_bytes;
use mining_royalty::{RoyaltyCalculator, RoyaltyError};

fuzz_target!(|data: &[u8]| {
    let Ok(rows) = read_blast_log_csv_from_bytes(data) else {
        return;
    };
    let inputs: Vec<_> = rows.iter().map(|r| r.input()).collect();
    // Rows that parse are valid; only overflowing amounts may still be refused.
    match RoyaltyCalculator::default().calculate_batch(&inputs) {
        Ok(results) => assert!(results
            .iter()
            .all(|r| r.calculations.total_amount_with_vat.is_finite())),
        Err(e) => assert!(matches!(e, RoyaltyError::InvalidInput(_))),
    }
});
