//! # Vault Ledger
//!
//! The central accounting component. Owns the share book, the adapter
//! registry, and the pool's custody account on the token book; converts
//! between asset units and share units; enforces the reserve floor at
//! allocation time; and runs the liquidity waterfall when a withdrawal
//! outgrows idle balance.
//!
//! ## Rounding
//!
//! Both conversion directions floor toward zero: deposits never
//! over-credit shares, withdrawals never over-pay assets. The dust lost to
//! truncation accrues to the remaining pool — the conservative direction.
//!
//! ## Valuation
//!
//! `total_assets` is recomputed on every call, never cached, because
//! adapter positions accrue value between calls. It is also a pure read:
//! an adapter's reported value may lag its destination's accrual clock,
//! and the ledger accepts that staleness rather than triggering accrual
//! from a valuation path.
//!
//! ## Reentrancy
//!
//! Push, pull, and the waterfall call out to externally supplied adapters.
//! A busy flag, acquired by every mutating entry point through an RAII
//! guard and released on all exit paths, rejects any re-entrant call that
//! would otherwise observe shares updated with assets still in flight.
//! `VaultLedger` is `Send`; a multi-threaded host should wrap it in a
//! mutex scoped to the whole ledger.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::adapter::{Adapter, AdapterError};
use crate::asset::{AccountId, AssetId, SharedBook, TokenError};
use crate::config::{bps_display, is_valid_reserve_bps, BPS_SCALE, MAX_RESERVE_BPS};

use super::registry::{AdapterId, AdapterRecord, AdapterRegistry};
use super::shares::{ShareBook, ShareError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Zero-amount operations are a no-op and likely a caller bug.
    #[error("zero-amount operations are not permitted")]
    ZeroAmount,

    /// The deposit is too small to mint a single share at the current
    /// price; accepting it would gift the assets to the pool.
    #[error("deposit of {amount} converts to zero shares at the current price")]
    ZeroSharesOut {
        /// The deposit amount that floored to zero shares.
        amount: u64,
    },

    /// No adapter is registered under this id.
    #[error("unknown adapter {0}")]
    UnknownAdapter(AdapterId),

    /// The adapter exists but has been disabled.
    #[error("adapter {0} is inactive")]
    AdapterInactive(AdapterId),

    /// A push would consume the reserve rather than the surplus above it.
    #[error("reserve floor breached: idle {idle}, target {target}, requested {requested}")]
    ReserveBreached {
        /// Idle balance at the time of the push.
        idle: u64,
        /// The reserve target idle balance must not drop below.
        target: u64,
        /// The push amount that was rejected.
        requested: u64,
    },

    /// An adapter's withdraw produced no observable proceeds. Surfaced
    /// rather than treated as success — paying a requester against zero
    /// proceeds would slowly render the pool insolvent.
    #[error("no funds received from adapter {0}")]
    NoFundsReceived(AdapterId),

    /// The waterfall exhausted every active adapter with value still
    /// owing. Whatever was already pulled stays in the idle balance.
    #[error("insufficient liquidity: shortfall {shortfall}, recovered {recovered}")]
    InsufficientLiquidity {
        /// The amount the waterfall set out to reclaim.
        shortfall: u64,
        /// The amount actually reclaimed before giving up.
        recovered: u64,
    },

    /// Strict-refill mode only: an adapter delivered less than requested
    /// during the waterfall.
    #[error("adapter {adapter} under-delivered: requested {requested}, received {received}")]
    PartialFill {
        /// The adapter that under-delivered.
        adapter: AdapterId,
        /// The amount requested from it.
        requested: u64,
        /// The amount observed on the idle balance.
        received: u64,
    },

    /// Reserve targets above the hard ceiling are rejected.
    #[error("reserve target {bps} bps exceeds the {max} bps ceiling")]
    ReserveTargetTooHigh {
        /// The rejected target.
        bps: u16,
        /// The ceiling.
        max: u16,
    },

    /// A mutating operation re-entered the ledger mid-update.
    #[error("re-entrant call into a mutating ledger operation")]
    Reentrancy,

    /// A share/asset conversion left `u64` range.
    #[error("conversion result exceeds representable amount")]
    AmountOverflow,

    /// A share-book operation failed.
    #[error("share error: {0}")]
    Shares(#[from] ShareError),

    /// A token movement failed.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// An adapter call failed outright.
    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),
}

// ---------------------------------------------------------------------------
// Reentrancy Guard
// ---------------------------------------------------------------------------

/// RAII handle for the ledger's busy flag. Dropping it — on success or on
/// any error path — releases the flag.
struct OpGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for OpGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// VaultLedger
// ---------------------------------------------------------------------------

/// The pooled-custody accounting ledger.
///
/// Execution is strictly serialized: every mutating operation runs to
/// completion with no interleaving, and the busy flag rejects re-entrant
/// invocation through adapter callbacks.
pub struct VaultLedger {
    /// The single asset the pool custodies.
    asset: AssetId,

    /// The pool's custody account on the token book. Its balance is the
    /// idle balance.
    account: AccountId,

    /// Shared token book handle.
    book: SharedBook,

    /// Total supply and per-holder claim units.
    shares: ShareBook,

    /// Append-only adapter arena.
    registry: AdapterRegistry,

    /// Reserve floor in basis points of total valuation (max 2,000).
    reserve_bps: u16,

    /// Waterfall policy: when `true`, an adapter delivering less than
    /// requested is an error instead of a tolerated partial fill.
    strict_refill: bool,

    /// Busy flag for the reentrancy guard.
    busy: Arc<AtomicBool>,
}

impl VaultLedger {
    /// Creates a ledger custodying `asset` through `account` on `book`,
    /// with the default reserve target and tolerant waterfall policy.
    pub fn new(asset: AssetId, account: AccountId, book: SharedBook) -> Self {
        Self {
            asset,
            account,
            book,
            shares: ShareBook::new(),
            registry: AdapterRegistry::new(),
            reserve_bps: crate::config::DEFAULT_RESERVE_BPS,
            strict_refill: false,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    // -----------------------------------------------------------------------
    // Read-Only Queries
    // -----------------------------------------------------------------------

    /// The asset this pool custodies.
    pub fn asset(&self) -> &AssetId {
        &self.asset
    }

    /// The pool's custody account.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Asset units held directly by the pool, immediately withdrawable.
    pub fn idle_balance(&self) -> u64 {
        self.book.read().balance_of(&self.account)
    }

    /// Total valuation: idle balance plus every active adapter's reported
    /// position value. Recomputed on demand, never cached.
    pub fn total_assets(&self) -> u64 {
        self.idle_balance()
            .saturating_add(self.registry.total_active_value())
    }

    /// Total share supply.
    pub fn total_shares(&self) -> u64 {
        self.shares.total()
    }

    /// A holder's share balance.
    pub fn share_balance_of(&self, holder: &AccountId) -> u64 {
        self.shares.balance_of(holder)
    }

    /// The current reserve target in basis points.
    pub fn reserve_bps(&self) -> u16 {
        self.reserve_bps
    }

    /// The idle balance the reserve policy asks voluntary allocation to
    /// preserve: `floor(total_assets * reserve_bps / 10_000)`.
    ///
    /// A soft target — withdrawals may draw idle below it through the
    /// waterfall; only pushes are refused against it.
    pub fn idle_target(&self) -> u64 {
        let target = (self.total_assets() as u128) * (self.reserve_bps as u128)
            / (BPS_SCALE as u128);
        // Bounded by total_assets, so the cast cannot truncate.
        target as u64
    }

    /// Number of registered adapters, active or not.
    pub fn adapter_count(&self) -> usize {
        self.registry.count()
    }

    /// Whether an adapter exists and is active.
    pub fn is_active_adapter(&self, id: AdapterId) -> bool {
        self.registry.is_active(id)
    }

    /// An adapter's reported valuation, or `None` if unknown.
    pub fn adapter_value(&self, id: AdapterId) -> Option<u64> {
        self.registry.value_of(id)
    }

    /// Audit records for every registered adapter, registration order.
    pub fn adapter_records(&self) -> Vec<AdapterRecord> {
        self.registry.records().cloned().collect()
    }

    /// Current waterfall policy (see [`set_strict_refill`](Self::set_strict_refill)).
    pub fn strict_refill(&self) -> bool {
        self.strict_refill
    }

    // -----------------------------------------------------------------------
    // Share Conversion
    // -----------------------------------------------------------------------

    /// Converts asset units to share units at the current price.
    ///
    /// With an empty pool (`total_assets == 0` or `total_shares == 0`)
    /// the bootstrap exchange rate is 1:1, which both fixes the initial
    /// price and avoids dividing by zero. Otherwise
    /// `floor(amount * total_shares / total_assets)`.
    pub fn assets_to_shares(&self, amount: u64) -> Result<u64, VaultError> {
        let total_assets = self.total_assets();
        let total_shares = self.shares.total();
        if total_assets == 0 || total_shares == 0 {
            return Ok(amount);
        }
        let shares = (amount as u128) * (total_shares as u128) / (total_assets as u128);
        u64::try_from(shares).map_err(|_| VaultError::AmountOverflow)
    }

    /// Converts share units to asset units at the current price:
    /// `floor(shares * total_assets / total_shares)`, zero when no shares
    /// exist.
    pub fn shares_to_assets(&self, shares: u64) -> Result<u64, VaultError> {
        let total_shares = self.shares.total();
        if total_shares == 0 {
            return Ok(0);
        }
        let assets = (shares as u128) * (self.total_assets() as u128) / (total_shares as u128);
        u64::try_from(assets).map_err(|_| VaultError::AmountOverflow)
    }

    // -----------------------------------------------------------------------
    // Holder Operations
    // -----------------------------------------------------------------------

    /// Deposits `amount` of the underlying asset and credits proportional
    /// shares.
    ///
    /// The share count is fixed against the valuation snapshot taken
    /// before the incoming transfer lands — otherwise the transfer would
    /// retroactively inflate its own snapshot. The transfer pulls from the
    /// holder under an approval they granted the pool's custody account.
    ///
    /// # Errors
    ///
    /// [`VaultError::ZeroAmount`] / [`VaultError::ZeroSharesOut`] on
    /// degenerate amounts; [`VaultError::Token`] if the holder has
    /// insufficient balance or allowance. No state changes on failure.
    pub fn deposit(&mut self, holder: &AccountId, amount: u64) -> Result<u64, VaultError> {
        let _guard = self.enter()?;
        if amount == 0 {
            return Err(VaultError::ZeroAmount);
        }

        let shares = self.assets_to_shares(amount)?;
        if shares == 0 {
            return Err(VaultError::ZeroSharesOut { amount });
        }
        if self.shares.total().checked_add(shares).is_none() {
            return Err(ShareError::SupplyOverflow {
                total: self.shares.total(),
                mint: shares,
            }
            .into());
        }

        // Snapshot fixed above; custody transfer, then the mint that can
        // no longer fail.
        self.book
            .write()
            .transfer_from(&self.account, holder, &self.account, amount)?;
        self.shares.mint(holder, shares)?;

        info!(holder = %holder, amount, shares, "deposit credited");
        Ok(shares)
    }

    /// Burns `shares_to_burn` of the holder's shares and pays out the
    /// proportional assets, reclaiming from adapters if idle balance
    /// falls short.
    ///
    /// All-or-nothing: the waterfall runs *before* any ledger mutation, so
    /// a failed reclamation leaves shares and balances untouched (capital
    /// already drained from earlier adapters in the loop stays in the
    /// idle balance — a legitimate side effect of reaching for liquidity).
    ///
    /// # Errors
    ///
    /// [`VaultError::Shares`] if the holder owns fewer shares;
    /// [`VaultError::InsufficientLiquidity`] if the waterfall cannot
    /// cover the payout.
    pub fn withdraw(
        &mut self,
        holder: &AccountId,
        shares_to_burn: u64,
    ) -> Result<u64, VaultError> {
        let _guard = self.enter()?;
        if shares_to_burn == 0 {
            return Err(VaultError::ZeroAmount);
        }

        let held = self.shares.balance_of(holder);
        if held < shares_to_burn {
            return Err(ShareError::InsufficientShares {
                holder: holder.clone(),
                held,
                requested: shares_to_burn,
            }
            .into());
        }

        // Pre-burn valuation fixes the payout.
        let assets = self.shares_to_assets(shares_to_burn)?;

        let idle = self.idle_balance();
        if idle < assets {
            self.refill(assets - idle)?;
        }

        // Liquidity confirmed; mutate and pay.
        self.shares.burn(holder, shares_to_burn)?;
        self.book.write().transfer(&self.account, holder, assets)?;

        info!(holder = %holder, shares = shares_to_burn, assets, "withdrawal paid");
        Ok(assets)
    }

    // -----------------------------------------------------------------------
    // Allocation Operations
    // -----------------------------------------------------------------------

    /// Registers an adapter, active immediately. Returns its id.
    pub fn register_adapter(&mut self, name: &str, adapter: Box<dyn Adapter>) -> AdapterId {
        let id = self.registry.register(name, adapter);
        info!(adapter = %id, name, "adapter registered");
        id
    }

    /// Enables or disables an adapter. Returns the previous state.
    ///
    /// Disabled adapters keep their registry slot (and any stranded
    /// position) but stop participating in valuation and the waterfall.
    pub fn set_adapter_active(
        &mut self,
        id: AdapterId,
        active: bool,
    ) -> Result<bool, VaultError> {
        let previous = self
            .registry
            .set_active(id, active)
            .ok_or(VaultError::UnknownAdapter(id))?;
        info!(adapter = %id, active, "adapter activity changed");
        Ok(previous)
    }

    /// Sets the reserve target.
    ///
    /// # Errors
    ///
    /// [`VaultError::ReserveTargetTooHigh`] above the 2,000 bps ceiling.
    pub fn set_reserve_bps(&mut self, bps: u16) -> Result<(), VaultError> {
        if !is_valid_reserve_bps(bps) {
            return Err(VaultError::ReserveTargetTooHigh {
                bps,
                max: MAX_RESERVE_BPS,
            });
        }
        self.reserve_bps = bps;
        info!(reserve = %bps_display(bps as u64), "reserve target changed");
        Ok(())
    }

    /// Sets the waterfall policy: `true` turns a per-adapter partial fill
    /// into an error; `false` (the default) tolerates partial fills and
    /// only fails on residual shortfall.
    pub fn set_strict_refill(&mut self, strict: bool) {
        self.strict_refill = strict;
        info!(strict, "waterfall policy changed");
    }

    /// Pushes `amount` of idle capital into an active adapter.
    ///
    /// Only the surplus above the reserve target may leave the pool. The
    /// adapter is approved for exactly `amount` and the approval is reset
    /// to zero afterward regardless of how much it actually consumed.
    ///
    /// Returns the destination position size acquired.
    pub fn push_to_adapter(&mut self, id: AdapterId, amount: u64) -> Result<u64, VaultError> {
        let _guard = self.enter()?;
        if amount == 0 {
            return Err(VaultError::ZeroAmount);
        }
        self.ensure_active(id)?;

        let idle = self.idle_balance();
        let target = self.idle_target();
        if idle <= target || idle - target < amount {
            return Err(VaultError::ReserveBreached {
                idle,
                target,
                requested: amount,
            });
        }

        let book = Arc::clone(&self.book);
        let asset = self.asset.clone();
        let custody = self.account.clone();
        let adapter = self
            .registry
            .adapter_mut(id)
            .ok_or(VaultError::UnknownAdapter(id))?;
        let spender = adapter.account().clone();

        book.write().approve(&custody, &spender, amount);
        let result = adapter.deposit(&asset, amount);
        // Reset regardless of outcome or partial consumption.
        book.write().approve(&custody, &spender, 0);
        let position = result?;

        info!(adapter = %id, amount, position, "capital pushed to adapter");
        Ok(position)
    }

    /// Pulls `amount` back from an active adapter into the idle balance.
    ///
    /// The amount credited is the *observed* idle-balance delta, not the
    /// requested figure — adapters may return less than asked.
    ///
    /// # Errors
    ///
    /// [`VaultError::NoFundsReceived`] if the observed delta is zero.
    pub fn pull_from_adapter(&mut self, id: AdapterId, amount: u64) -> Result<u64, VaultError> {
        let _guard = self.enter()?;
        if amount == 0 {
            return Err(VaultError::ZeroAmount);
        }
        self.ensure_active(id)?;

        let received = self.pull_observed(id, amount)?;
        if received == 0 {
            return Err(VaultError::NoFundsReceived(id));
        }

        info!(adapter = %id, requested = amount, received, "capital pulled from adapter");
        Ok(received)
    }

    /// Claims an active adapter's secondary yield. Returns the amount
    /// gained (zero for destinations without auxiliary rewards).
    pub fn harvest(&mut self, id: AdapterId) -> Result<u64, VaultError> {
        let _guard = self.enter()?;
        self.ensure_active(id)?;

        let adapter = self
            .registry
            .adapter_mut(id)
            .ok_or(VaultError::UnknownAdapter(id))?;
        let gained = adapter.harvest()?;

        info!(adapter = %id, gained, "secondary yield harvested");
        Ok(gained)
    }

    // -----------------------------------------------------------------------
    // Liquidity Waterfall
    // -----------------------------------------------------------------------

    /// Reclaims `shortfall` from adapters in registration order.
    ///
    /// Skips inactive and zero-value adapters, requests
    /// `min(remaining, value)` from each, reduces `remaining` by what was
    /// *observed* to arrive, and stops early once covered. On exhaustion,
    /// fails with the residual — capital already pulled is not rolled
    /// back.
    fn refill(&mut self, shortfall: u64) -> Result<(), VaultError> {
        let mut remaining = shortfall;

        for id in self.registry.ids() {
            if remaining == 0 {
                break;
            }
            if !self.registry.is_active(id) {
                continue;
            }
            let value = self.registry.value_of(id).unwrap_or(0);
            if value == 0 {
                continue;
            }

            let to_pull = remaining.min(value);
            let received = self.pull_observed(id, to_pull)?;
            if self.strict_refill && received < to_pull {
                return Err(VaultError::PartialFill {
                    adapter: id,
                    requested: to_pull,
                    received,
                });
            }

            remaining -= received.min(remaining);
            debug!(adapter = %id, requested = to_pull, received, remaining, "waterfall step");
        }

        if remaining > 0 {
            return Err(VaultError::InsufficientLiquidity {
                shortfall,
                recovered: shortfall - remaining,
            });
        }
        Ok(())
    }

    /// Invokes an adapter's withdraw toward the custody account and
    /// reports the observed idle-balance delta.
    fn pull_observed(&mut self, id: AdapterId, amount: u64) -> Result<u64, VaultError> {
        let before = self.idle_balance();
        let asset = self.asset.clone();
        let custody = self.account.clone();

        let adapter = self
            .registry
            .adapter_mut(id)
            .ok_or(VaultError::UnknownAdapter(id))?;
        adapter.withdraw(&asset, amount, &custody)?;

        Ok(self.idle_balance().saturating_sub(before))
    }

    // -----------------------------------------------------------------------
    // Internal Helpers
    // -----------------------------------------------------------------------

    fn ensure_active(&self, id: AdapterId) -> Result<(), VaultError> {
        match self.registry.record(id) {
            None => Err(VaultError::UnknownAdapter(id)),
            Some(r) if !r.active => Err(VaultError::AdapterInactive(id)),
            Some(_) => Ok(()),
        }
    }

    /// Acquires the busy flag; the returned guard releases it on drop.
    fn enter(&self) -> Result<OpGuard, VaultError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(VaultError::Reentrancy);
        }
        Ok(OpGuard {
            flag: Arc::clone(&self.busy),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
