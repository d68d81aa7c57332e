//! # Fungible-Asset Collaborator
//!
//! The pool custodies exactly one fungible asset. This module models that
//! asset's transfer interface the way an external token ledger exposes it:
//! `balance_of`, `transfer`, `approve`/`allowance`, `transfer_from`. The
//! vault ledger and the adapters *consume* this interface — they never
//! implement token semantics themselves.
//!
//! A [`TokenBook`] is an in-memory implementation of that interface. In a
//! deployed system the book is the external token contract; here it is the
//! shared substrate that lets the vault, its holders, and every adapter
//! move value against each other under one consistent set of balances.
//!
//! ## Sharing Model
//!
//! The vault and each adapter hold an `Arc<parking_lot::RwLock<TokenBook>>`
//! ([`SharedBook`]). All mutating pool operations are strictly serialized
//! (see [`crate::ledger::vault`]), so the lock is coordination, not a
//! correctness mechanism.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during token-book operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Attempted to move more than the account holds.
    #[error("insufficient balance: available {available}, requested {requested} (account {account})")]
    InsufficientBalance {
        /// The account that was being debited.
        account: AccountId,
        /// The current balance.
        available: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// A `transfer_from` exceeded the spender's approved allowance.
    #[error("insufficient allowance: approved {approved}, requested {requested} (owner {owner}, spender {spender})")]
    InsufficientAllowance {
        /// The account whose funds were being spent.
        owner: AccountId,
        /// The account doing the spending.
        spender: AccountId,
        /// The currently approved amount.
        approved: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// Arithmetic overflow during a credit or mint.
    ///
    /// If you're hitting this, someone is trying to credit more than
    /// 18.4 quintillion units. That's either a bug or an attack.
    #[error("balance overflow: current {current}, credit {credit} (account {account})")]
    Overflow {
        /// The account that was being credited.
        account: AccountId,
        /// The balance before the failed credit.
        current: u64,
        /// The amount that caused the overflow.
        credit: u64,
    },
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// An opaque account address on the token book.
///
/// Holders, the vault's custody account, adapter position accounts, and
/// controller actors are all just accounts. The engine never interprets
/// the string — it is an identity, nothing more.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Creates an account id from any address-like string.
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// Returns the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// AssetId
// ---------------------------------------------------------------------------

/// Identity of a fungible asset.
///
/// The pool is single-asset; this exists so that adapters can reject a
/// mismatched asset instead of silently custodying the wrong thing.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Creates an asset id from a symbol-like string.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// Returns the raw symbol string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({})", self.0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TokenBook
// ---------------------------------------------------------------------------

/// In-memory fungible-asset ledger with standard transfer semantics.
///
/// All amounts are `u64` in smallest-unit denomination. No floating point,
/// no decimals in arithmetic. Credits use checked addition; debits enforce
/// non-negative balances.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenBook {
    /// The asset this book tracks.
    asset: AssetId,

    /// Account balances in smallest units. Absent entry means zero.
    balances: HashMap<AccountId, u64>,

    /// Approvals: owner -> spender -> remaining approved amount.
    allowances: HashMap<AccountId, HashMap<AccountId, u64>>,

    /// Sum of all balances. Updated on mint/burn only.
    total_supply: u64,
}

impl TokenBook {
    /// Creates an empty book for the given asset.
    pub fn new(asset: AssetId) -> Self {
        Self {
            asset,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: 0,
        }
    }

    /// Returns the asset identity this book tracks.
    pub fn asset(&self) -> &AssetId {
        &self.asset
    }

    /// Returns the balance of an account (zero if never credited).
    pub fn balance_of(&self, account: &AccountId) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Returns the total minted supply.
    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    /// Mints new units into an account.
    ///
    /// Used by tests to seed holders and by simulated yield destinations
    /// to back accrued interest with real units.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Overflow`] if the account balance or the
    /// total supply would exceed `u64::MAX`.
    pub fn mint(&mut self, to: &AccountId, amount: u64) -> Result<u64, TokenError> {
        let new_supply =
            self.total_supply
                .checked_add(amount)
                .ok_or_else(|| TokenError::Overflow {
                    account: to.clone(),
                    current: self.total_supply,
                    credit: amount,
                })?;
        let new_balance = self.credit(to, amount)?;
        self.total_supply = new_supply;
        Ok(new_balance)
    }

    /// Moves `amount` from one account to another.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InsufficientBalance`] if `from` holds less
    /// than `amount`.
    pub fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), TokenError> {
        self.debit(from, amount)?;
        // Debit succeeded, so the credit cannot overflow total supply.
        self.credit(to, amount)?;
        Ok(())
    }

    /// Sets the spender's allowance over the owner's funds.
    ///
    /// Overwrites any previous approval. Setting zero revokes.
    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: u64) {
        let entry = self.allowances.entry(owner.clone()).or_default();
        if amount == 0 {
            entry.remove(spender);
        } else {
            entry.insert(spender.clone(), amount);
        }
    }

    /// Returns the spender's remaining allowance over the owner's funds.
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u64 {
        self.allowances
            .get(owner)
            .and_then(|m| m.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Moves `amount` from `from` to `to` on behalf of `spender`,
    /// consuming allowance.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InsufficientAllowance`] if the spender's
    /// approval does not cover `amount`, or
    /// [`TokenError::InsufficientBalance`] if the owner's funds don't.
    /// Allowance is only consumed when the transfer succeeds.
    pub fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), TokenError> {
        let approved = self.allowance(from, spender);
        if approved < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: from.clone(),
                spender: spender.clone(),
                approved,
                requested: amount,
            });
        }

        self.transfer(from, to, amount)?;
        self.approve(from, spender, approved - amount);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internal Helpers
    // -----------------------------------------------------------------------

    fn credit(&mut self, account: &AccountId, amount: u64) -> Result<u64, TokenError> {
        let balance = self.balances.entry(account.clone()).or_insert(0);
        let new_balance = balance
            .checked_add(amount)
            .ok_or_else(|| TokenError::Overflow {
                account: account.clone(),
                current: *balance,
                credit: amount,
            })?;
        *balance = new_balance;
        Ok(new_balance)
    }

    fn debit(&mut self, account: &AccountId, amount: u64) -> Result<u64, TokenError> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                account: account.clone(),
                available,
                requested: amount,
            });
        }
        let remaining = available - amount;
        if remaining == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.clone(), remaining);
        }
        Ok(remaining)
    }
}

// ---------------------------------------------------------------------------
// SharedBook
// ---------------------------------------------------------------------------

/// Shared handle to a token book.
///
/// The vault ledger and each adapter hold a clone of this handle.
pub type SharedBook = Arc<RwLock<TokenBook>>;

/// Creates a fresh shared token book for the given asset.
pub fn shared_book(asset: AssetId) -> SharedBook {
    Arc::new(RwLock::new(TokenBook::new(asset)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(s: &str) -> AccountId {
        AccountId::new(s)
    }

    fn book() -> TokenBook {
        TokenBook::new(AssetId::new("USDX"))
    }

    #[test]
    fn mint_credits_balance_and_supply() {
        let mut b = book();
        let alice = acct("alice");

        let balance = b.mint(&alice, 1_000).unwrap();
        assert_eq!(balance, 1_000);
        assert_eq!(b.balance_of(&alice), 1_000);
        assert_eq!(b.total_supply(), 1_000);
    }

    #[test]
    fn mint_overflow_rejected() {
        let mut b = book();
        let alice = acct("alice");

        b.mint(&alice, u64::MAX).unwrap();
        let result = b.mint(&alice, 1);
        assert!(matches!(result, Err(TokenError::Overflow { .. })));
    }

    #[test]
    fn transfer_moves_funds() {
        let mut b = book();
        let (alice, bob) = (acct("alice"), acct("bob"));

        b.mint(&alice, 1_000).unwrap();
        b.transfer(&alice, &bob, 400).unwrap();

        assert_eq!(b.balance_of(&alice), 600);
        assert_eq!(b.balance_of(&bob), 400);
        assert_eq!(b.total_supply(), 1_000);
    }

    #[test]
    fn transfer_insufficient_rejected() {
        let mut b = book();
        let (alice, bob) = (acct("alice"), acct("bob"));

        b.mint(&alice, 100).unwrap();
        let result = b.transfer(&alice, &bob, 200);
        assert!(matches!(
            result,
            Err(TokenError::InsufficientBalance {
                available: 100,
                requested: 200,
                ..
            })
        ));
        // Failed transfer must not move anything.
        assert_eq!(b.balance_of(&alice), 100);
        assert_eq!(b.balance_of(&bob), 0);
    }

    #[test]
    fn full_debit_removes_entry() {
        let mut b = book();
        let (alice, bob) = (acct("alice"), acct("bob"));

        b.mint(&alice, 500).unwrap();
        b.transfer(&alice, &bob, 500).unwrap();
        assert_eq!(b.balance_of(&alice), 0);
    }

    #[test]
    fn approve_and_transfer_from() {
        let mut b = book();
        let (alice, vault, spender) = (acct("alice"), acct("vault"), acct("spender"));

        b.mint(&alice, 1_000).unwrap();
        b.approve(&alice, &spender, 600);
        assert_eq!(b.allowance(&alice, &spender), 600);

        b.transfer_from(&spender, &alice, &vault, 400).unwrap();
        assert_eq!(b.balance_of(&vault), 400);
        assert_eq!(b.allowance(&alice, &spender), 200);
    }

    #[test]
    fn transfer_from_without_allowance_rejected() {
        let mut b = book();
        let (alice, vault, spender) = (acct("alice"), acct("vault"), acct("spender"));

        b.mint(&alice, 1_000).unwrap();
        let result = b.transfer_from(&spender, &alice, &vault, 100);
        assert!(matches!(
            result,
            Err(TokenError::InsufficientAllowance { approved: 0, .. })
        ));
    }

    #[test]
    fn transfer_from_insufficient_balance_keeps_allowance() {
        let mut b = book();
        let (alice, vault, spender) = (acct("alice"), acct("vault"), acct("spender"));

        b.mint(&alice, 100).unwrap();
        b.approve(&alice, &spender, 1_000);

        let result = b.transfer_from(&spender, &alice, &vault, 500);
        assert!(matches!(
            result,
            Err(TokenError::InsufficientBalance { .. })
        ));
        // Allowance is only consumed on success.
        assert_eq!(b.allowance(&alice, &spender), 1_000);
    }

    #[test]
    fn approve_zero_revokes() {
        let mut b = book();
        let (alice, spender) = (acct("alice"), acct("spender"));

        b.approve(&alice, &spender, 500);
        b.approve(&alice, &spender, 0);
        assert_eq!(b.allowance(&alice, &spender), 0);
    }

    #[test]
    fn book_serialization_roundtrip() {
        let mut b = book();
        let alice = acct("alice");
        b.mint(&alice, 42).unwrap();

        let json = serde_json::to_string(&b).expect("serialize");
        let recovered: TokenBook = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(recovered.balance_of(&alice), 42);
        assert_eq!(recovered.total_supply(), 42);
        assert_eq!(recovered.asset().as_str(), "USDX");
    }
}
