//! # Adapter Registry
//!
//! An append-only arena of yield adapters. Registration assigns each
//! adapter a position-stable [`AdapterId`]; nothing is ever physically
//! removed. Disabling an adapter flips its `active` flag instead, so the
//! liquidity waterfall's iteration order stays deterministic and every
//! adapter that ever held pool capital remains auditable.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adapter::Adapter;

// ---------------------------------------------------------------------------
// AdapterId
// ---------------------------------------------------------------------------

/// Position-stable identifier for a registered adapter.
///
/// The id doubles as the adapter's index in the registration sequence.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdapterId(pub u32);

impl fmt::Debug for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AdapterId({})", self.0)
    }
}

impl fmt::Display for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "adapter#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AdapterRecord
// ---------------------------------------------------------------------------

/// Audit metadata for one registry slot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdapterRecord {
    /// The slot's position-stable id.
    pub id: AdapterId,

    /// Operator-chosen label, for logs and audits.
    pub name: String,

    /// Whether the adapter participates in valuation and the waterfall.
    pub active: bool,

    /// When the adapter was registered.
    pub registered_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// AdapterRegistry
// ---------------------------------------------------------------------------

struct Entry {
    record: AdapterRecord,
    adapter: Box<dyn Adapter>,
}

/// The ordered adapter arena.
///
/// Iteration is always registration order — a deliberate simplicity
/// choice over value- or risk-weighted ordering.
#[derive(Default)]
pub struct AdapterRegistry {
    entries: Vec<Entry>,
}

impl AdapterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an adapter, active by default. Returns its id.
    pub fn register(&mut self, name: &str, adapter: Box<dyn Adapter>) -> AdapterId {
        let id = AdapterId(self.entries.len() as u32);
        self.entries.push(Entry {
            record: AdapterRecord {
                id,
                name: name.to_string(),
                active: true,
                registered_at: Utc::now(),
            },
            adapter,
        });
        id
    }

    /// Returns the number of registered adapters, active or not.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the record for an adapter, or `None` if unknown.
    pub fn record(&self, id: AdapterId) -> Option<&AdapterRecord> {
        self.entries.get(id.0 as usize).map(|e| &e.record)
    }

    /// Returns `true` if the adapter exists and is active.
    pub fn is_active(&self, id: AdapterId) -> bool {
        self.record(id).map(|r| r.active).unwrap_or(false)
    }

    /// Flips an adapter's active flag. Returns the previous state, or
    /// `None` if the id is unknown.
    pub fn set_active(&mut self, id: AdapterId, active: bool) -> Option<bool> {
        let entry = self.entries.get_mut(id.0 as usize)?;
        let previous = entry.record.active;
        entry.record.active = active;
        Some(previous)
    }

    /// Returns an adapter's reported valuation, or `None` if unknown.
    pub fn value_of(&self, id: AdapterId) -> Option<u64> {
        self.entries
            .get(id.0 as usize)
            .map(|e| e.adapter.total_assets())
    }

    /// Mutable access to an adapter's capability surface.
    pub fn adapter_mut(&mut self, id: AdapterId) -> Option<&mut dyn Adapter> {
        match self.entries.get_mut(id.0 as usize) {
            Some(e) => Some(e.adapter.as_mut()),
            None => None,
        }
    }

    /// All ids in registration order. Collected so callers can iterate
    /// while mutating adapters slot by slot.
    pub fn ids(&self) -> Vec<AdapterId> {
        self.entries.iter().map(|e| e.record.id).collect()
    }

    /// All audit records in registration order.
    pub fn records(&self) -> impl Iterator<Item = &AdapterRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    /// Sum of active adapters' reported valuations.
    ///
    /// Saturates rather than wrapping — a sum past `u64::MAX` means an
    /// adapter is reporting garbage, and valuation is a read path.
    pub fn total_active_value(&self) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.record.active)
            .fold(0u64, |acc, e| acc.saturating_add(e.adapter.total_assets()))
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("records", &self.entries.iter().map(|e| &e.record).collect::<Vec<_>>())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterError;
    use crate::asset::{AccountId, AssetId};

    /// Fixed-value stub: enough surface to exercise the registry.
    struct StaticAdapter {
        account: AccountId,
        value: u64,
    }

    impl StaticAdapter {
        fn boxed(name: &str, value: u64) -> Box<dyn Adapter> {
            Box::new(Self {
                account: AccountId::new(name),
                value,
            })
        }
    }

    impl Adapter for StaticAdapter {
        fn account(&self) -> &AccountId {
            &self.account
        }

        fn deposit(&mut self, _asset: &AssetId, amount: u64) -> Result<u64, AdapterError> {
            self.value += amount;
            Ok(amount)
        }

        fn withdraw(
            &mut self,
            _asset: &AssetId,
            amount: u64,
            _recipient: &AccountId,
        ) -> Result<u64, AdapterError> {
            let paid = amount.min(self.value);
            self.value -= paid;
            Ok(paid)
        }

        fn total_assets(&self) -> u64 {
            self.value
        }
    }

    #[test]
    fn registration_assigns_sequential_ids() {
        let mut reg = AdapterRegistry::new();
        let a = reg.register("a", StaticAdapter::boxed("a", 0));
        let b = reg.register("b", StaticAdapter::boxed("b", 0));

        assert_eq!(a, AdapterId(0));
        assert_eq!(b, AdapterId(1));
        assert_eq!(reg.count(), 2);
    }

    #[test]
    fn new_adapters_are_active() {
        let mut reg = AdapterRegistry::new();
        let id = reg.register("a", StaticAdapter::boxed("a", 0));
        assert!(reg.is_active(id));
    }

    #[test]
    fn set_active_toggles_and_reports_previous() {
        let mut reg = AdapterRegistry::new();
        let id = reg.register("a", StaticAdapter::boxed("a", 0));

        assert_eq!(reg.set_active(id, false), Some(true));
        assert!(!reg.is_active(id));
        assert_eq!(reg.set_active(id, true), Some(false));
        assert!(reg.is_active(id));
    }

    #[test]
    fn unknown_id_is_inert() {
        let mut reg = AdapterRegistry::new();
        let ghost = AdapterId(9);

        assert!(!reg.is_active(ghost));
        assert_eq!(reg.set_active(ghost, true), None);
        assert_eq!(reg.value_of(ghost), None);
        assert!(reg.record(ghost).is_none());
        assert!(reg.adapter_mut(ghost).is_none());
    }

    #[test]
    fn inactive_adapters_excluded_from_active_value() {
        let mut reg = AdapterRegistry::new();
        reg.register("a", StaticAdapter::boxed("a", 100));
        let b = reg.register("b", StaticAdapter::boxed("b", 50));
        reg.register("c", StaticAdapter::boxed("c", 7));

        assert_eq!(reg.total_active_value(), 157);
        reg.set_active(b, false);
        assert_eq!(reg.total_active_value(), 107);
        // Disabling never shrinks the registry.
        assert_eq!(reg.count(), 3);
    }

    #[test]
    fn ids_preserve_registration_order() {
        let mut reg = AdapterRegistry::new();
        let a = reg.register("a", StaticAdapter::boxed("a", 0));
        let b = reg.register("b", StaticAdapter::boxed("b", 0));
        let c = reg.register("c", StaticAdapter::boxed("c", 0));

        assert_eq!(reg.ids(), vec![a, b, c]);
    }

    #[test]
    fn record_serialization_roundtrip() {
        let mut reg = AdapterRegistry::new();
        let id = reg.register("prime-market", StaticAdapter::boxed("a", 0));

        let record = reg.record(id).unwrap();
        let json = serde_json::to_string(record).expect("serialize");
        let recovered: AdapterRecord = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(recovered.id, id);
        assert_eq!(recovered.name, "prime-market");
        assert!(recovered.active);
    }
}
