//! Selector dispatch tables.
//!
//! A [`DispatchTable`] maps each selector an implementation answers to the
//! signature and operation it runs. Building one is where selector
//! collisions are caught: two distinct signatures that hash to the same four
//! bytes cannot both be routed, so the table refuses to exist.

use std::collections::BTreeMap;

use thiserror::Error;

use super::call::{Operation, Selector};

/// Two distinct signatures share a selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("selector {selector} is claimed by both {first} and {second}")]
pub struct SelectorCollision {
    pub selector: Selector,
    pub first: &'static str,
    pub second: &'static str,
}

/// One routable entry of an implementation's interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceEntry {
    pub signature: &'static str,
    pub selector: Selector,
    pub operation: Operation,
}

impl InterfaceEntry {
    /// The canonical entry for `operation`.
    pub fn of(operation: Operation) -> Self {
        Self {
            signature: operation.signature(),
            selector: operation.selector(),
            operation,
        }
    }
}

/// Selector-to-operation routing for one implementation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchTable {
    routes: BTreeMap<Selector, InterfaceEntry>,
}

impl DispatchTable {
    /// Builds a table from `entries`. Repeating an identical signature is
    /// harmless; a second signature under an existing selector is not.
    pub fn build<I>(entries: I) -> Result<Self, SelectorCollision>
    where
        I: IntoIterator<Item = InterfaceEntry>,
    {
        let mut routes: BTreeMap<Selector, InterfaceEntry> = BTreeMap::new();
        for entry in entries {
            match routes.get(&entry.selector) {
                Some(existing) if existing.signature == entry.signature => {}
                Some(existing) => {
                    return Err(SelectorCollision {
                        selector: entry.selector,
                        first: existing.signature,
                        second: entry.signature,
                    });
                }
                None => {
                    routes.insert(entry.selector, entry);
                }
            }
        }
        Ok(Self { routes })
    }

    /// Builds the table for an implementation interface plus the proxy's
    /// own entry points, which every implementation must leave reachable.
    pub fn with_proxy_entry_points(interface: Vec<InterfaceEntry>) -> Result<Self, SelectorCollision> {
        let proxy = Operation::PROXY_ENTRY_POINTS.iter().copied().map(InterfaceEntry::of);
        Self::build(proxy.chain(interface))
    }

    pub fn resolve(&self, selector: Selector) -> Option<&InterfaceEntry> {
        self.routes.get(&selector)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routed signatures, in selector order.
    pub fn signatures(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.routes.values().map(|entry| entry.signature)
    }
}
