//! # Lending-Market Adapter
//!
//! Routes pool capital into a lending market that tracks positions as
//! destination shares with a monotonically growing WAD exchange rate —
//! the classic interest-bearing-receipt model. One destination share is
//! worth `exchange_rate / WAD` underlying units.
//!
//! The stored exchange rate only advances when [`accrue`](LendingAdapter::accrue)
//! runs, so [`total_assets`](LendingAdapter::total_assets) is potentially
//! understated between accruals. That staleness is the documented
//! approximation the ledger accepts; valuation never triggers accrual.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::asset::{AccountId, AssetId, SharedBook};
use crate::config::WAD;
use crate::rate::{compound_apy_bps, simple_apr_bps, wad_mul, wad_pow, RateError};

use super::{Adapter, AdapterError};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// The serializable accounting state of a lending position, separate from
/// the live token-book handle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LendingPosition {
    /// Destination shares currently held.
    pub shares: u64,

    /// Underlying units per destination share, WAD-scaled. Starts at 1.0
    /// and only grows under accrual.
    pub exchange_rate: u128,

    /// Per-second growth rate of the exchange rate, WAD-scaled.
    pub rate_per_second: u128,
}

// ---------------------------------------------------------------------------
// LendingAdapter
// ---------------------------------------------------------------------------

/// A yield adapter backed by a simulated lending market.
///
/// Deposits pull underlying from the configured funding account (the
/// vault's custody account, which must have approved this adapter) and
/// mint destination shares at the current exchange rate. Withdrawals burn
/// shares — clamped to the held position — and forward proceeds to the
/// recipient. The market has no auxiliary reward token, so `harvest` is
/// the trait's zero no-op.
pub struct LendingAdapter {
    /// Shared token book the market settles against.
    book: SharedBook,

    /// This adapter's account: the spender identity for pulls and the
    /// backing account for the position's cash.
    account: AccountId,

    /// The account deposits are pulled from.
    funder: AccountId,

    /// The single asset this market accepts.
    asset: AssetId,

    /// Position accounting.
    position: LendingPosition,
}

impl LendingAdapter {
    /// Creates an adapter with an empty position at a 1:1 exchange rate.
    ///
    /// `rate_per_second` is the WAD-scaled per-second growth rate the
    /// market pays (e.g., `1_000_000_000` = 1e-9/sec ≈ 3.15% APR).
    pub fn new(
        book: SharedBook,
        account: AccountId,
        funder: AccountId,
        asset: AssetId,
        rate_per_second: u128,
    ) -> Self {
        Self {
            book,
            account,
            funder,
            asset,
            position: LendingPosition {
                shares: 0,
                exchange_rate: WAD,
                rate_per_second,
            },
        }
    }

    /// Returns a snapshot of the position accounting.
    pub fn position(&self) -> &LendingPosition {
        &self.position
    }

    /// Simple annualized rate of this market, in basis points.
    pub fn simple_apr_bps(&self) -> Result<u64, RateError> {
        simple_apr_bps(self.position.rate_per_second)
    }

    /// Compounded annualized rate of this market, in basis points.
    pub fn compound_apy_bps(&self) -> Result<u64, RateError> {
        compound_apy_bps(self.position.rate_per_second)
    }

    /// Advances the market's accrual clock by `elapsed_secs`.
    ///
    /// Compounds the exchange rate by `(1 + rate_per_second)^elapsed_secs`
    /// and mints the accrued value into the position's backing account so
    /// every reported unit stays redeemable. Returns the value gained.
    ///
    /// This models the destination's own accrual mechanism; the ledger
    /// never calls it.
    pub fn accrue(&mut self, elapsed_secs: u64) -> Result<u64, AdapterError> {
        if elapsed_secs == 0 || self.position.rate_per_second == 0 {
            return Ok(0);
        }

        let old_value = self.position_value(self.position.exchange_rate)?;
        let growth = wad_pow(WAD + self.position.rate_per_second, elapsed_secs)?;
        let new_rate = wad_mul(self.position.exchange_rate, growth)?;
        let new_value = self.position_value(new_rate)?;

        self.position.exchange_rate = new_rate;
        let gained = new_value - old_value;
        if gained > 0 {
            self.book.write().mint(&self.account, gained)?;
        }

        debug!(
            adapter = %self.account,
            elapsed_secs,
            gained,
            "lending market accrued"
        );
        Ok(gained)
    }

    /// Values the position at the given exchange rate, truncating.
    fn position_value(&self, rate: u128) -> Result<u64, RateError> {
        let value = (self.position.shares as u128)
            .checked_mul(rate)
            .ok_or(RateError::Overflow)?
            / WAD;
        u64::try_from(value).map_err(|_| RateError::Overflow)
    }

    fn check_asset(&self, asset: &AssetId) -> Result<(), AdapterError> {
        if *asset != self.asset {
            return Err(AdapterError::AssetMismatch {
                expected: self.asset.clone(),
                got: asset.clone(),
            });
        }
        Ok(())
    }
}

impl Adapter for LendingAdapter {
    fn account(&self) -> &AccountId {
        &self.account
    }

    fn deposit(&mut self, asset: &AssetId, amount: u64) -> Result<u64, AdapterError> {
        self.check_asset(asset)?;
        if amount == 0 {
            return Err(AdapterError::ZeroAmount);
        }

        // Pull underlying from the funder under the approval the ledger
        // granted for this push.
        self.book
            .write()
            .transfer_from(&self.account, &self.funder, &self.account, amount)?;

        // u64 * WAD fits u128 comfortably; the division floors so the
        // position is never over-credited relative to the cash received.
        let minted = (amount as u128) * WAD / self.position.exchange_rate;
        let minted = u64::try_from(minted).map_err(|_| RateError::Overflow)?;
        self.position.shares = self
            .position
            .shares
            .checked_add(minted)
            .ok_or(RateError::Overflow)?;

        debug!(
            adapter = %self.account,
            amount,
            minted,
            "lending market deposit"
        );
        Ok(minted)
    }

    fn withdraw(
        &mut self,
        asset: &AssetId,
        amount: u64,
        recipient: &AccountId,
    ) -> Result<u64, AdapterError> {
        self.check_asset(asset)?;
        if amount == 0 {
            return Err(AdapterError::ZeroAmount);
        }

        // Shares needed for the requested amount, clamped to the position:
        // redeeming more than held is a partial fill, not an error.
        let needed = (amount as u128) * WAD / self.position.exchange_rate;
        let needed = u64::try_from(needed).unwrap_or(u64::MAX);
        let to_burn = needed.min(self.position.shares);
        if to_burn == 0 {
            return Ok(0);
        }

        let proceeds = (to_burn as u128) * self.position.exchange_rate / WAD;
        let proceeds = u64::try_from(proceeds).map_err(|_| RateError::Overflow)?;

        self.position.shares -= to_burn;
        self.book
            .write()
            .transfer(&self.account, recipient, proceeds)?;

        debug!(
            adapter = %self.account,
            requested = amount,
            burned = to_burn,
            proceeds,
            "lending market withdrawal"
        );
        Ok(proceeds)
    }

    fn total_assets(&self) -> u64 {
        // Valuation is a read; saturate rather than fail on a pathological
        // exchange rate.
        let value = (self.position.shares as u128)
            .saturating_mul(self.position.exchange_rate)
            / WAD;
        u64::try_from(value).unwrap_or(u64::MAX)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
