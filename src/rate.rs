//! # Fixed-Point Rate Derivation
//!
//! Adapters report yield as a per-second growth rate on the WAD scale
//! (10^18 = 1.0). This module turns that raw rate into the two annualized
//! figures the rest of the system quotes:
//!
//! - **Simple APR** — linear extrapolation over a year, in basis points.
//! - **Compounded APY** — `(1 + r)^seconds_per_year - 1`, in basis points,
//!   computed by exponentiation by squaring so a year of per-second
//!   compounding costs ~25 multiplies instead of 31.5 million.
//!
//! All arithmetic is integer `u128` on the WAD scale and truncates toward
//! zero, the same conservative direction as the share math in
//! [`crate::ledger::vault`].
//!
//! ## Overflow
//!
//! A WAD multiply computes `a * b / WAD` and the intermediate product lives
//! in `u128`. It exceeds the native width as soon as both operands pass
//! `sqrt(u128::MAX)` ≈ 18.4 WAD — i.e., a growth factor above ~18.4x within
//! the squaring ladder. Rather than saturate silently, every function here
//! propagates [`RateError::Overflow`]; a rate hot enough to overflow the
//! ladder is a misconfigured adapter, not a number worth clamping.

use thiserror::Error;

use crate::config::{BPS_SCALE, SECONDS_PER_YEAR, WAD};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during rate computation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateError {
    /// An intermediate fixed-point product exceeded `u128`, or a final
    /// basis-point figure exceeded `u64`.
    #[error("fixed-point overflow while computing rate")]
    Overflow,
}

// ---------------------------------------------------------------------------
// WAD Primitives
// ---------------------------------------------------------------------------

/// Fixed-point multiply: `a * b / WAD`, truncating the remainder.
///
/// # Errors
///
/// Returns [`RateError::Overflow`] if `a * b` exceeds `u128`.
pub fn wad_mul(a: u128, b: u128) -> Result<u128, RateError> {
    Ok(a.checked_mul(b).ok_or(RateError::Overflow)? / WAD)
}

/// Fixed-point exponentiation by squaring: `base^exp` on the WAD scale.
///
/// Maintains a running result initialized to the WAD identity (1.0) and a
/// squaring base; multiplies the base into the result whenever the
/// corresponding bit of `exp` is set. `O(log exp)` WAD multiplies, each
/// truncating toward zero.
///
/// # Errors
///
/// Returns [`RateError::Overflow`] if any intermediate square or product
/// exceeds `u128` (see the module docs for when that happens).
pub fn wad_pow(base: u128, exp: u64) -> Result<u128, RateError> {
    let mut result = WAD;
    let mut b = base;
    let mut e = exp;

    loop {
        if e & 1 == 1 {
            result = wad_mul(result, b)?;
        }
        e >>= 1;
        if e == 0 {
            break;
        }
        b = wad_mul(b, b)?;
    }

    Ok(result)
}

// ---------------------------------------------------------------------------
// Annualized Figures
// ---------------------------------------------------------------------------

/// Simple (non-compounding) annualized rate in basis points.
///
/// `rate_per_second * SECONDS_PER_YEAR * 10_000 / WAD`, truncated.
///
/// # Errors
///
/// Returns [`RateError::Overflow`] for rates large enough that the
/// annualized figure doesn't fit the intermediate `u128` or the final `u64`.
pub fn simple_apr_bps(rate_per_second: u128) -> Result<u64, RateError> {
    if rate_per_second == 0 {
        return Ok(0);
    }

    let annual = rate_per_second
        .checked_mul(SECONDS_PER_YEAR as u128)
        .ok_or(RateError::Overflow)?
        .checked_mul(BPS_SCALE as u128)
        .ok_or(RateError::Overflow)?
        / WAD;

    u64::try_from(annual).map_err(|_| RateError::Overflow)
}

/// Compounded annualized rate in basis points.
///
/// `((1 + rate_per_second)^SECONDS_PER_YEAR - 1) * 10_000 / WAD`, with the
/// power computed by [`wad_pow`]. A zero input short-circuits to zero —
/// the `(1 + 0)^n - 1` path is correct but pointless.
///
/// # Errors
///
/// Returns [`RateError::Overflow`] if the growth factor overflows the
/// squaring ladder or the final figure exceeds `u64`.
pub fn compound_apy_bps(rate_per_second: u128) -> Result<u64, RateError> {
    if rate_per_second == 0 {
        return Ok(0);
    }

    let base = WAD
        .checked_add(rate_per_second)
        .ok_or(RateError::Overflow)?;
    let growth = wad_pow(base, SECONDS_PER_YEAR)?;

    // growth >= WAD for any nonzero rate; the subtraction cannot underflow.
    let apy = (growth - WAD)
        .checked_mul(BPS_SCALE as u128)
        .ok_or(RateError::Overflow)?
        / WAD;

    u64::try_from(apy).map_err(|_| RateError::Overflow)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wad_mul_identity() {
        assert_eq!(wad_mul(WAD, WAD).unwrap(), WAD);
        assert_eq!(wad_mul(5 * WAD, WAD).unwrap(), 5 * WAD);
    }

    #[test]
    fn wad_mul_truncates_toward_zero() {
        // 0.5 * 0.5 = 0.25 exactly.
        assert_eq!(wad_mul(WAD / 2, WAD / 2).unwrap(), WAD / 4);
        // Sub-WAD product truncates to zero.
        assert_eq!(wad_mul(1, 1).unwrap(), 0);
    }

    #[test]
    fn wad_mul_overflow() {
        assert_eq!(wad_mul(u128::MAX, 2), Err(RateError::Overflow));
    }

    #[test]
    fn wad_pow_zero_exponent_is_identity() {
        assert_eq!(wad_pow(3 * WAD, 0).unwrap(), WAD);
    }

    #[test]
    fn wad_pow_one_is_base() {
        assert_eq!(wad_pow(7 * WAD, 1).unwrap(), 7 * WAD);
    }

    #[test]
    fn wad_pow_exact_integer_powers() {
        assert_eq!(wad_pow(2 * WAD, 10).unwrap(), 1024 * WAD);
        assert_eq!(wad_pow(WAD, SECONDS_PER_YEAR).unwrap(), WAD);
    }

    #[test]
    fn wad_pow_overflow_propagates() {
        // 18.4x growth per squaring step blows the u128 ladder quickly.
        assert_eq!(wad_pow(100 * WAD, 64), Err(RateError::Overflow));
    }

    #[test]
    fn zero_rate_short_circuits() {
        assert_eq!(simple_apr_bps(0).unwrap(), 0);
        assert_eq!(compound_apy_bps(0).unwrap(), 0);
    }

    #[test]
    fn known_rate_simple_apr() {
        // 1e9 WAD/sec = 1e-9/sec. Annualized:
        // 1e9 * 31_536_000 * 10_000 / 1e18 = 315.36 -> 315 bps.
        assert_eq!(simple_apr_bps(1_000_000_000).unwrap(), 315);
    }

    #[test]
    fn known_rate_compound_apy() {
        // (1 + 1e-9)^31_536_000 - 1 = 3.2038...% -> 320 bps.
        assert_eq!(compound_apy_bps(1_000_000_000).unwrap(), 320);
    }

    #[test]
    fn compounding_beats_simple() {
        // The defining property: for any positive rate, per-second
        // compounding yields strictly more than linear extrapolation.
        for rate in [1_000_000_000u128, 3_000_000_000, 10_000_000_000] {
            let simple = simple_apr_bps(rate).unwrap();
            let compound = compound_apy_bps(rate).unwrap();
            assert!(
                compound > simple,
                "rate {rate}: compound {compound} must exceed simple {simple}"
            );
        }
    }

    #[test]
    fn absurd_rate_overflows_rather_than_saturating() {
        // A "rate" of 20 WAD per second grows 21x each second; the squaring
        // ladder leaves u128 range almost immediately.
        assert_eq!(compound_apy_bps(20 * WAD), Err(RateError::Overflow));
    }
}
