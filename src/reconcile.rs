//! Keyed diffing of a fresh snapshot against the entities rendered last cycle.
//!
//! Entities whose key survives are updated in place, so any state that lives
//! on the entity but is not derived from the record (an open popup, a
//! highlight) carries over. New keys are materialized; vanished keys are
//! handed back to the materializer for removal.

use crate::types::Keyed;
use std::collections::{HashMap, HashSet};

pub type ElementId = u64;

/// Hands out identities for elements the page owns itself (cards, rows).
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: ElementId,
}

impl IdAllocator {
    pub fn allocate(&mut self) -> ElementId {
        self.next += 1;
        self.next
    }
}

/// Creates, updates and tears down the visual entity for one record.
pub trait Materializer<R> {
    type Entity;

    fn create(&mut self, key: &str, record: &R) -> Self::Entity;

    fn update(&mut self, entity: &mut Self::Entity, record: &R);

    fn remove(&mut self, key: &str, entity: Self::Entity);
}

/// Rendered entities in snapshot order, addressable by key.
#[derive(Debug)]
pub struct KeyedEntities<E> {
    order: Vec<String>,
    by_key: HashMap<String, E>,
}

impl<E> Default for KeyedEntities<E> {
    fn default() -> Self {
        KeyedEntities {
            order: Vec::new(),
            by_key: HashMap::new(),
        }
    }
}

impl<E> KeyedEntities<E> {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&E> {
        self.by_key.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut E> {
        self.by_key.get_mut(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &E)> + '_ {
        self.order
            .iter()
            .filter_map(move |k| self.by_key.get(k).map(|e| (k.as_str(), e)))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut E> + '_ {
        self.by_key.values_mut()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

/// Repeated keys within one snapshot get an occurrence suffix (`key#1`,
/// `key#2`, ...) so each record still maps to exactly one entity. A suffix
/// already claimed by another record's own key is skipped.
fn occurrence_key(
    raw: String,
    seen: &mut HashMap<String, usize>,
    taken: &mut HashSet<String>,
) -> String {
    let count = seen.entry(raw.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        return raw;
    }
    loop {
        let key = format!("{}#{}", raw, *count - 1);
        if taken.insert(key.clone()) {
            return key;
        }
        *count += 1;
    }
}

pub fn reconcile<R, M>(
    previous: KeyedEntities<M::Entity>,
    snapshot: &[R],
    materializer: &mut M,
) -> (KeyedEntities<M::Entity>, ReconcileStats)
where
    R: Keyed,
    M: Materializer<R>,
{
    let KeyedEntities {
        order: previous_order,
        by_key: mut previous,
    } = previous;
    let mut stats = ReconcileStats::default();
    let mut seen = HashMap::new();
    let mut taken: HashSet<String> = snapshot.iter().map(Keyed::key).collect();
    let mut next = KeyedEntities {
        order: Vec::with_capacity(snapshot.len()),
        by_key: HashMap::with_capacity(snapshot.len()),
    };

    for record in snapshot {
        let key = occurrence_key(record.key(), &mut seen, &mut taken);
        let entity = match previous.remove(&key) {
            Some(mut entity) => {
                materializer.update(&mut entity, record);
                stats.updated += 1;
                entity
            }
            None => {
                stats.created += 1;
                materializer.create(&key, record)
            }
        };
        next.order.push(key.clone());
        next.by_key.insert(key, entity);
    }

    for key in previous_order {
        if let Some(entity) = previous.remove(&key) {
            materializer.remove(&key, entity);
            stats.removed += 1;
        }
    }

    (next, stats)
}
