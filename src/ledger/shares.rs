//! # Share Book
//!
//! Claim units for the pool. A share is a proportional claim on the pool's
//! total valuation — not a transferable asset, just a ledger entry. The
//! [`ShareBook`] owns the total supply and every per-holder balance, and it
//! is the only code allowed to touch either, which is how the conservation
//! invariant (`total == Σ balances`) holds by construction rather than by
//! audit.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset::AccountId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during share-book operations.
#[derive(Debug, Error)]
pub enum ShareError {
    /// Attempted to burn more shares than the holder owns.
    #[error("insufficient shares: held {held}, requested {requested} (holder {holder})")]
    InsufficientShares {
        /// The holder whose shares were being burned.
        holder: AccountId,
        /// Shares currently held.
        held: u64,
        /// Shares requested for burning.
        requested: u64,
    },

    /// Minting would overflow the total supply.
    #[error("share supply overflow: total {total}, mint {mint}")]
    SupplyOverflow {
        /// Current total supply.
        total: u64,
        /// The mint amount that caused the overflow.
        mint: u64,
    },
}

// ---------------------------------------------------------------------------
// ShareBook
// ---------------------------------------------------------------------------

/// Total share supply plus per-holder balances.
///
/// A holder's entry is created on first mint, removed when their balance
/// reaches zero, and can never go negative — the debit path enforces it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ShareBook {
    /// Sum of all holder balances. Monotonically consistent with the map.
    total: u64,

    /// Per-holder claim units. Insertion order is irrelevant.
    balances: HashMap<AccountId, u64>,
}

impl ShareBook {
    /// Creates an empty share book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total share supply.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Returns the holder's share balance (zero if never minted).
    pub fn balance_of(&self, holder: &AccountId) -> u64 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Returns the number of holders with a nonzero balance.
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Mints shares to a holder, growing the total supply.
    ///
    /// # Errors
    ///
    /// Returns [`ShareError::SupplyOverflow`] if the total supply would
    /// exceed `u64::MAX`. The holder's balance cannot overflow separately
    /// because it is bounded by the total.
    pub fn mint(&mut self, holder: &AccountId, shares: u64) -> Result<u64, ShareError> {
        let new_total = self
            .total
            .checked_add(shares)
            .ok_or(ShareError::SupplyOverflow {
                total: self.total,
                mint: shares,
            })?;

        let balance = self.balances.entry(holder.clone()).or_insert(0);
        *balance += shares;
        let new_balance = *balance;
        self.total = new_total;
        Ok(new_balance)
    }

    /// Burns shares from a holder, shrinking the total supply.
    ///
    /// A holder whose balance reaches zero is removed from the map.
    ///
    /// # Errors
    ///
    /// Returns [`ShareError::InsufficientShares`] if the holder owns fewer
    /// than `shares`.
    pub fn burn(&mut self, holder: &AccountId, shares: u64) -> Result<u64, ShareError> {
        let held = self.balance_of(holder);
        if held < shares {
            return Err(ShareError::InsufficientShares {
                holder: holder.clone(),
                held,
                requested: shares,
            });
        }

        let remaining = held - shares;
        if remaining == 0 {
            self.balances.remove(holder);
        } else {
            self.balances.insert(holder.clone(), remaining);
        }
        self.total -= shares;
        Ok(remaining)
    }

    /// Returns all nonzero holdings as `(holder, shares)` pairs.
    pub fn all_holdings(&self) -> Vec<(AccountId, u64)> {
        self.balances
            .iter()
            .map(|(h, s)| (h.clone(), *s))
            .collect()
    }

    /// Recomputes `Σ balances` from the map. Exposed so tests and audits
    /// can assert conservation against [`total`](Self::total).
    pub fn checked_sum(&self) -> u64 {
        self.balances.values().sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn holder(s: &str) -> AccountId {
        AccountId::new(s)
    }

    #[test]
    fn new_book_is_empty() {
        let book = ShareBook::new();
        assert_eq!(book.total(), 0);
        assert_eq!(book.holder_count(), 0);
        assert_eq!(book.balance_of(&holder("alice")), 0);
    }

    #[test]
    fn mint_creates_and_accumulates() {
        let mut book = ShareBook::new();
        let alice = holder("alice");

        assert_eq!(book.mint(&alice, 100).unwrap(), 100);
        assert_eq!(book.mint(&alice, 50).unwrap(), 150);
        assert_eq!(book.total(), 150);
        assert_eq!(book.holder_count(), 1);
    }

    #[test]
    fn burn_reduces_and_removes_at_zero() {
        let mut book = ShareBook::new();
        let alice = holder("alice");

        book.mint(&alice, 100).unwrap();
        assert_eq!(book.burn(&alice, 40).unwrap(), 60);
        assert_eq!(book.holder_count(), 1);

        assert_eq!(book.burn(&alice, 60).unwrap(), 0);
        assert_eq!(book.holder_count(), 0);
        assert_eq!(book.total(), 0);
    }

    #[test]
    fn burn_undershoot_rejected() {
        let mut book = ShareBook::new();
        let alice = holder("alice");

        book.mint(&alice, 100).unwrap();
        let result = book.burn(&alice, 101);
        assert!(matches!(
            result,
            Err(ShareError::InsufficientShares {
                held: 100,
                requested: 101,
                ..
            })
        ));
        // Failed burn must not change state.
        assert_eq!(book.balance_of(&alice), 100);
        assert_eq!(book.total(), 100);
    }

    #[test]
    fn burn_from_unknown_holder_rejected() {
        let mut book = ShareBook::new();
        let result = book.burn(&holder("ghost"), 1);
        assert!(matches!(
            result,
            Err(ShareError::InsufficientShares { held: 0, .. })
        ));
    }

    #[test]
    fn supply_overflow_rejected() {
        let mut book = ShareBook::new();
        book.mint(&holder("alice"), u64::MAX).unwrap();
        let result = book.mint(&holder("bob"), 1);
        assert!(matches!(result, Err(ShareError::SupplyOverflow { .. })));
    }

    #[test]
    fn conservation_across_many_holders() {
        let mut book = ShareBook::new();
        book.mint(&holder("a"), 10).unwrap();
        book.mint(&holder("b"), 20).unwrap();
        book.mint(&holder("c"), 30).unwrap();
        book.burn(&holder("b"), 5).unwrap();

        assert_eq!(book.total(), 55);
        assert_eq!(book.checked_sum(), book.total());
    }

    #[test]
    fn share_book_serialization_roundtrip() {
        let mut book = ShareBook::new();
        book.mint(&holder("alice"), 77).unwrap();

        let json = serde_json::to_string(&book).expect("serialize");
        let recovered: ShareBook = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(recovered.total(), 77);
        assert_eq!(recovered.balance_of(&holder("alice")), 77);
        assert_eq!(recovered.checked_sum(), 77);
    }
}
