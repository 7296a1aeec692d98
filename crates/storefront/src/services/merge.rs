//! Seed/local record reconciliation shared by the user and item catalogs.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

use tracing::warn;

use marketstall_core::{ProductId, UserId};

use crate::models::{ProductRecord, UserRecord};

/// A record with a catalog-wide identity.
pub trait Keyed {
    type Key: Clone + Eq + Hash + std::fmt::Display;

    fn key(&self) -> &Self::Key;
}

impl Keyed for UserRecord {
    type Key = UserId;

    fn key(&self) -> &UserId {
        &self.id
    }
}

impl Keyed for ProductRecord {
    type Key = ProductId;

    fn key(&self) -> &ProductId {
        &self.id
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Slot {
    Seed,
    Shadowed,
    Local,
}

/// Merge seed and local records into one list with unique keys.
///
/// Order is seed records first, then local records in storage order. A local
/// record whose key matches a seed record replaces it in place. Any other
/// repeated key is dropped with a warning.
pub fn merge_by_id<T: Keyed>(seed: Vec<T>, local: Vec<T>, entity: &str) -> Vec<T> {
    let mut merged: Vec<T> = Vec::with_capacity(seed.len() + local.len());
    let mut slots: HashMap<T::Key, (usize, Slot)> = HashMap::new();

    for record in seed {
        match slots.entry(record.key().clone()) {
            Entry::Occupied(_) => {
                warn!(entity, id = %record.key(), "duplicate id in seed fixture, dropping");
            }
            Entry::Vacant(slot) => {
                slot.insert((merged.len(), Slot::Seed));
                merged.push(record);
            }
        }
    }

    for record in local {
        match slots.entry(record.key().clone()) {
            Entry::Occupied(mut slot) => {
                let (index, kind) = *slot.get();
                if kind == Slot::Seed
                    && let Some(existing) = merged.get_mut(index)
                {
                    *existing = record;
                    slot.insert((index, Slot::Shadowed));
                } else {
                    warn!(entity, id = %record.key(), "duplicate id in local store, dropping");
                }
            }
            Entry::Vacant(slot) => {
                slot.insert((merged.len(), Slot::Local));
                merged.push(record);
            }
        }
    }

    merged
}
