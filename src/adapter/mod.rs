//! # Adapter Module — Pluggable Yield Destinations
//!
//! An adapter is where idle pool capital goes to work. The ledger treats
//! every destination polymorphically through the [`Adapter`] trait: it
//! holds a registry of opaque `Box<dyn Adapter>` handles and never
//! branches on concrete adapter identity.
//!
//! ## Capability Contract
//!
//! ```text
//! deposit(asset, amount)            — take custody, route in, return position size
//! withdraw(asset, amount, to)       — clamp, burn, forward proceeds; partial is not an error
//! total_assets()                    — read-only valuation, possibly stale
//! harvest()                         — optional secondary-yield claim, zero is valid
//! ```
//!
//! Valuation is a read, not an accrual trigger. An adapter's reported value
//! may lag its destination's internal accrual clock — the ledger accepts
//! that staleness as a documented approximation.

pub mod lending;

use thiserror::Error;

use crate::asset::{AccountId, AssetId, TokenError};
use crate::rate::RateError;

pub use lending::LendingAdapter;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur inside an adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The caller handed the adapter an asset it doesn't manage.
    #[error("asset mismatch: adapter manages {expected}, got {got}")]
    AssetMismatch {
        /// The asset this adapter was configured for.
        expected: AssetId,
        /// The asset the caller presented.
        got: AssetId,
    },

    /// Zero-amount operations are a no-op and likely a caller bug.
    #[error("zero-amount operations are not permitted")]
    ZeroAmount,

    /// A token movement against the destination failed.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Rate math overflowed while accruing or valuing the position.
    #[error("rate error: {0}")]
    Rate(#[from] RateError),
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// A pluggable yield destination.
///
/// Implementations own whatever destination-specific state they need
/// (position sizes, exchange rates, reward accounting). The ledger only
/// sees this surface.
pub trait Adapter: Send {
    /// The account identity this adapter spends and custodies through.
    ///
    /// The ledger approves this account before a push and resets the
    /// approval to zero afterward.
    fn account(&self) -> &AccountId;

    /// Accepts custody of `amount` and routes it into the destination.
    ///
    /// Returns the destination-specific position size acquired (e.g.,
    /// market shares). Must reject a mismatched asset and a zero amount.
    fn deposit(&mut self, asset: &AssetId, amount: u64) -> Result<u64, AdapterError>;

    /// Redeems up to `amount` (in underlying units, pre-accrual) and
    /// forwards the proceeds to `recipient`.
    ///
    /// The position burned is clamped to what the adapter actually holds:
    /// a caller requesting more than available receives partial or zero
    /// fulfillment, not an error. Returns the amount forwarded.
    fn withdraw(
        &mut self,
        asset: &AssetId,
        amount: u64,
        recipient: &AccountId,
    ) -> Result<u64, AdapterError>;

    /// Read-only valuation of the position in underlying-asset units.
    ///
    /// Must not mutate adapter state. May be stale until the destination's
    /// own accrual mechanism runs — potentially understated, never a
    /// trigger.
    fn total_assets(&self) -> u64;

    /// Claims any secondary yield (liquidity-mining rewards and the like).
    ///
    /// Destinations without auxiliary rewards keep this default no-op.
    fn harvest(&mut self) -> Result<u64, AdapterError> {
        Ok(0)
    }
}
