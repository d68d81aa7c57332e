//! # Ledger Module — Pooled-Custody Share Accounting
//!
//! The accounting core of the engine. Three layers:
//!
//! - [`shares`] — claim-unit supply and per-holder balances, with the
//!   conservation invariant held by construction.
//! - [`registry`] — the append-only arena of yield adapters, iterated in
//!   registration order.
//! - [`vault`] — the [`VaultLedger`] tying them together: share/asset
//!   conversion, the reserve floor, and the liquidity waterfall.
//!
//! Rounding always favors the pool, valuation is always recomputed, and
//! every mutating entry point is serialized behind a reentrancy guard.

pub mod registry;
pub mod shares;
pub mod vault;

pub use registry::{AdapterId, AdapterRecord, AdapterRegistry};
pub use shares::{ShareBook, ShareError};
pub use vault::{VaultError, VaultLedger};
