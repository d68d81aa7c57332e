// Copyright (c) 2026 Coffer Labs. MIT License.
// See LICENSE for details.

//! # Coffer — Pooled-Custody Vault Accounting Engine
//!
//! Coffer is the accounting core of a yield-bearing asset pool: holders
//! deposit a single underlying asset, receive proportional claim shares,
//! and an allocation controller routes the idle capital into pluggable
//! yield destinations. No network, no persistence, no consensus — just
//! the arithmetic that has to be exactly right.
//!
//! A few positions we hold deliberately:
//!
//! - Rounding always floors, and always in the pool's favor. Dust goes to
//!   the remaining holders, never out the door.
//! - Valuation is recomputed every time it is asked for. Cached prices
//!   are how pools end up insolvent politely.
//! - Liquidity comes back in registration order. A waterfall you can
//!   predict beats a clever one you can't audit.
//! - Every mutating entry point is serialized behind a reentrancy guard.
//!   Adapters are third-party code; we treat them accordingly.
//!
//! ## Architecture
//!
//! The crate splits along the actual concerns of a custody pool:
//!
//! - **asset** — Account/asset newtypes and the balance-and-allowance
//!   token book everything settles on.
//! - **rate** — WAD fixed-point math: per-second rates to APR and APY.
//! - **adapter** — The yield-destination trait and the in-crate lending
//!   market implementation.
//! - **ledger** — Share accounting, the adapter registry, and the
//!   [`VaultLedger`] with its reserve floor and liquidity waterfall.
//! - **controller** — Owner/operator role checks and the pause switch.
//! - **config** — Scales, ceilings, and defaults.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use coffer::asset::{shared_book, AccountId, AssetId};
//! use coffer::controller::AllocationController;
//! use coffer::ledger::VaultLedger;
//!
//! let asset = AssetId::new("USDX");
//! let book = shared_book(asset.clone());
//! let custody = AccountId::new("pool");
//! let alice = AccountId::new("alice");
//!
//! {
//!     let mut b = book.write();
//!     b.mint(&alice, 1_000).unwrap();
//!     b.approve(&alice, &custody, 1_000);
//! }
//!
//! let ledger = VaultLedger::new(asset, custody, Arc::clone(&book));
//! let mut pool = AllocationController::new(
//!     ledger,
//!     AccountId::new("owner"),
//!     AccountId::new("operator"),
//! );
//!
//! let shares = pool.deposit(&alice, 1_000).unwrap();
//! assert_eq!(shares, 1_000); // bootstrap price is 1:1
//! ```

pub mod adapter;
pub mod asset;
pub mod config;
pub mod controller;
pub mod ledger;
pub mod rate;

pub use adapter::{Adapter, AdapterError, LendingAdapter};
pub use asset::{AccountId, AssetId, SharedBook, TokenBook, TokenError};
pub use controller::{AllocationController, ControllerError};
pub use ledger::{AdapterId, AdapterRecord, ShareBook, ShareError, VaultError, VaultLedger};
pub use rate::RateError;
