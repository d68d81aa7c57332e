//! # Allocation Controller
//!
//! The authorization layer over the [`VaultLedger`]. Two roles:
//!
//! - **owner** — governance. Appoints the operator, tunes the reserve
//!   target and waterfall policy, manages the adapter set, and can pause
//!   the engine.
//! - **operator** — day-to-day capital allocation. Pushes idle capital to
//!   adapters, pulls it back, harvests secondary yield. The owner can do
//!   everything the operator can.
//!
//! Holder operations (deposit, withdraw) carry no role: anyone with an
//! approved balance may use the pool. While paused, every mutating
//! operation is rejected except `unpause` itself; reads stay available so
//! an incident can be observed while frozen.

use thiserror::Error;
use tracing::{info, warn};

use crate::adapter::Adapter;
use crate::asset::AccountId;
use crate::ledger::{AdapterId, VaultError, VaultLedger};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the controller's authorization layer.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The operation is restricted to the owner.
    #[error("caller {0} is not the owner")]
    NotOwner(AccountId),

    /// The operation is restricted to the owner or the operator.
    #[error("caller {0} is neither owner nor operator")]
    NotAuthorized(AccountId),

    /// The engine is paused; only `unpause` is accepted.
    #[error("the engine is paused")]
    Paused,

    /// Pause/unpause called in the state it would re-assert.
    #[error("pause state is already {0}")]
    PauseUnchanged(bool),

    /// The underlying ledger operation failed.
    #[error(transparent)]
    Vault(#[from] VaultError),
}

// ---------------------------------------------------------------------------
// AllocationController
// ---------------------------------------------------------------------------

/// Role-checked front door to a [`VaultLedger`].
///
/// Every mutating method takes the caller's identity explicitly; the
/// controller trusts the host to have authenticated it.
pub struct AllocationController {
    ledger: VaultLedger,
    owner: AccountId,
    operator: AccountId,
    paused: bool,
}

impl AllocationController {
    /// Wraps a ledger under an owner and an initial operator.
    pub fn new(ledger: VaultLedger, owner: AccountId, operator: AccountId) -> Self {
        Self {
            ledger,
            owner,
            operator,
            paused: false,
        }
    }

    // -----------------------------------------------------------------------
    // Read-Only Queries
    // -----------------------------------------------------------------------

    /// The underlying ledger, for read-only queries. Mutation only goes
    /// through the role-checked methods.
    pub fn ledger(&self) -> &VaultLedger {
        &self.ledger
    }

    /// The current owner.
    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    /// The current operator.
    pub fn operator(&self) -> &AccountId {
        &self.operator
    }

    /// Whether the engine is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // -----------------------------------------------------------------------
    // Governance (owner only)
    // -----------------------------------------------------------------------

    /// Hands ownership to another account. Single-step and immediate.
    pub fn transfer_ownership(
        &mut self,
        caller: &AccountId,
        new_owner: AccountId,
    ) -> Result<(), ControllerError> {
        self.require_owner(caller)?;
        self.require_unpaused()?;
        info!(from = %self.owner, to = %new_owner, "ownership transferred");
        self.owner = new_owner;
        Ok(())
    }

    /// Appoints a new operator, replacing the previous one.
    pub fn set_operator(
        &mut self,
        caller: &AccountId,
        new_operator: AccountId,
    ) -> Result<(), ControllerError> {
        self.require_owner(caller)?;
        self.require_unpaused()?;
        info!(from = %self.operator, to = %new_operator, "operator changed");
        self.operator = new_operator;
        Ok(())
    }

    /// Freezes every mutating operation.
    pub fn pause(&mut self, caller: &AccountId) -> Result<(), ControllerError> {
        self.require_owner(caller)?;
        if self.paused {
            return Err(ControllerError::PauseUnchanged(true));
        }
        self.paused = true;
        warn!("engine paused");
        Ok(())
    }

    /// Lifts the freeze. The only mutating operation accepted while
    /// paused.
    pub fn unpause(&mut self, caller: &AccountId) -> Result<(), ControllerError> {
        self.require_owner(caller)?;
        if !self.paused {
            return Err(ControllerError::PauseUnchanged(false));
        }
        self.paused = false;
        info!("engine unpaused");
        Ok(())
    }

    /// Sets the reserve target, subject to the ledger's ceiling.
    pub fn set_reserve_bps(
        &mut self,
        caller: &AccountId,
        bps: u16,
    ) -> Result<(), ControllerError> {
        self.require_owner(caller)?;
        self.require_unpaused()?;
        Ok(self.ledger.set_reserve_bps(bps)?)
    }

    /// Sets the waterfall partial-fill policy.
    pub fn set_strict_refill(
        &mut self,
        caller: &AccountId,
        strict: bool,
    ) -> Result<(), ControllerError> {
        self.require_owner(caller)?;
        self.require_unpaused()?;
        self.ledger.set_strict_refill(strict);
        Ok(())
    }

    /// Registers a yield adapter, active immediately.
    pub fn register_adapter(
        &mut self,
        caller: &AccountId,
        name: &str,
        adapter: Box<dyn Adapter>,
    ) -> Result<AdapterId, ControllerError> {
        self.require_owner(caller)?;
        self.require_unpaused()?;
        Ok(self.ledger.register_adapter(name, adapter))
    }

    /// Enables or disables an adapter. Returns the previous state.
    pub fn set_adapter_active(
        &mut self,
        caller: &AccountId,
        id: AdapterId,
        active: bool,
    ) -> Result<bool, ControllerError> {
        self.require_owner(caller)?;
        self.require_unpaused()?;
        Ok(self.ledger.set_adapter_active(id, active)?)
    }

    // -----------------------------------------------------------------------
    // Allocation (owner or operator)
    // -----------------------------------------------------------------------

    /// Pushes idle capital into an adapter, respecting the reserve floor.
    pub fn push_to_adapter(
        &mut self,
        caller: &AccountId,
        id: AdapterId,
        amount: u64,
    ) -> Result<u64, ControllerError> {
        self.require_allocator(caller)?;
        self.require_unpaused()?;
        let position = self.ledger.push_to_adapter(id, amount)?;
        info!(caller = %caller, adapter = %id, amount, "push authorized");
        Ok(position)
    }

    /// Pulls capital back from an adapter into the idle balance.
    pub fn pull_from_adapter(
        &mut self,
        caller: &AccountId,
        id: AdapterId,
        amount: u64,
    ) -> Result<u64, ControllerError> {
        self.require_allocator(caller)?;
        self.require_unpaused()?;
        let received = self.ledger.pull_from_adapter(id, amount)?;
        info!(caller = %caller, adapter = %id, amount, received, "pull authorized");
        Ok(received)
    }

    /// Claims an adapter's secondary yield.
    pub fn harvest(
        &mut self,
        caller: &AccountId,
        id: AdapterId,
    ) -> Result<u64, ControllerError> {
        self.require_allocator(caller)?;
        self.require_unpaused()?;
        let gained = self.ledger.harvest(id)?;
        info!(caller = %caller, adapter = %id, gained, "harvest authorized");
        Ok(gained)
    }

    // -----------------------------------------------------------------------
    // Holder Operations (no role)
    // -----------------------------------------------------------------------

    /// Deposits assets for shares on the holder's behalf.
    pub fn deposit(
        &mut self,
        holder: &AccountId,
        amount: u64,
    ) -> Result<u64, ControllerError> {
        self.require_unpaused()?;
        Ok(self.ledger.deposit(holder, amount)?)
    }

    /// Burns the holder's shares for assets.
    pub fn withdraw(
        &mut self,
        holder: &AccountId,
        shares: u64,
    ) -> Result<u64, ControllerError> {
        self.require_unpaused()?;
        Ok(self.ledger.withdraw(holder, shares)?)
    }

    // -----------------------------------------------------------------------
    // Internal Helpers
    // -----------------------------------------------------------------------

    fn require_owner(&self, caller: &AccountId) -> Result<(), ControllerError> {
        if caller != &self.owner {
            return Err(ControllerError::NotOwner(caller.clone()));
        }
        Ok(())
    }

    fn require_allocator(&self, caller: &AccountId) -> Result<(), ControllerError> {
        if caller != &self.owner && caller != &self.operator {
            return Err(ControllerError::NotAuthorized(caller.clone()));
        }
        Ok(())
    }

    fn require_unpaused(&self) -> Result<(), ControllerError> {
        if self.paused {
            return Err(ControllerError::Paused);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
