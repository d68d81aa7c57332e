//! # Engine Configuration & Constants
//!
//! Every magic number in coffer lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! These values define the accounting behavior of the pool. The fixed-point
//! scale and the basis-point denominator are part of the arithmetic contract
//! with every adapter — changing them is a breaking change for anyone who
//! has capital in the pool.

// ---------------------------------------------------------------------------
// Fixed-Point Scale
// ---------------------------------------------------------------------------

/// WAD — the conventional 10^18 fixed-point scale.
///
/// A value of `WAD` represents 1.0. Per-second growth rates, adapter
/// exchange rates, and every intermediate product in [`crate::rate`] are
/// expressed on this scale. `u128` because squaring an exchange rate in
/// `u64` space overflows immediately.
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Seconds in a 365-day year. The exponent for annualized compounding.
///
/// 365 days exactly — no leap-year cleverness. Rate figures are indicative,
/// not contractual, and every venue we compare against uses the same 31.5M.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

// ---------------------------------------------------------------------------
// Basis Points
// ---------------------------------------------------------------------------

/// Basis-point denominator. 10,000 bps = 100%.
pub const BPS_SCALE: u64 = 10_000;

/// Hard ceiling on the reserve target: 2,000 bps = 20% of total valuation.
///
/// Above this the pool stops being a yield vehicle and starts being a
/// checking account. Enforced at configuration time, not at withdrawal time.
pub const MAX_RESERVE_BPS: u16 = 2_000;

/// Default reserve target for a freshly constructed ledger: 10%.
pub const DEFAULT_RESERVE_BPS: u16 = 1_000;

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Returns `true` if `bps` is an acceptable reserve target.
pub fn is_valid_reserve_bps(bps: u16) -> bool {
    bps <= MAX_RESERVE_BPS
}

/// Renders a basis-point figure as a human-readable percentage, mainly
/// for logging. 1250 -> "12.50%".
pub fn bps_display(bps: u64) -> String {
    format!("{}.{:02}%", bps / 100, bps % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wad_is_ten_to_the_eighteen() {
        assert_eq!(WAD, 10u128.pow(18));
    }

    #[test]
    fn seconds_per_year_is_365_days() {
        assert_eq!(SECONDS_PER_YEAR, 365 * 24 * 60 * 60);
    }

    #[test]
    fn reserve_bps_bounds() {
        assert!(is_valid_reserve_bps(0));
        assert!(is_valid_reserve_bps(MAX_RESERVE_BPS));
        assert!(!is_valid_reserve_bps(MAX_RESERVE_BPS + 1));
        assert!(is_valid_reserve_bps(DEFAULT_RESERVE_BPS));
    }

    #[test]
    fn bps_display_formatting() {
        assert_eq!(bps_display(1250), "12.50%");
        assert_eq!(bps_display(500), "5.00%");
        assert_eq!(bps_display(7), "0.07%");
        assert_eq!(bps_display(10_000), "100.00%");
    }
}
