use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::icite::grouper::ImpactGroup;
use crate::icite::models::Record;
use crate::icite::relations::Relation;

/// A seed together with whichever of its associated works were resolved
///
/// Built fresh on every call and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeWork {
    /// Identifier as the caller requested it
    pub seed_id: u32,
    /// `None` when the seed itself could not be resolved
    pub seed_record: Option<Record>,
    /// Associated identifiers computed from the seed under the active policy
    pub associated_ids: BTreeSet<u32>,
    /// Resolved subset of `associated_ids`
    pub related: BTreeMap<u32, Record>,
}

impl CompositeWork {
    pub(crate) fn unresolved(seed_id: u32) -> Self {
        Self {
            seed_id,
            seed_record: None,
            associated_ids: BTreeSet::new(),
            related: BTreeMap::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.seed_record.is_some()
    }

    /// Associated identifiers that neither the cache nor the service could supply
    pub fn missing_related(&self) -> impl Iterator<Item = u32> + '_ {
        self.associated_ids
            .iter()
            .copied()
            .filter(move |id| !self.related.contains_key(id))
    }

    /// Resolved records reachable from the seed through one relation
    pub fn related_by(&self, relation: Relation) -> impl Iterator<Item = &Record> + '_ {
        self.seed_record
            .iter()
            .flat_map(move |seed| seed.relation(relation).iter())
            .filter_map(move |id| self.related.get(id))
    }

    /// Number of resolved related records per impact group
    pub fn group_counts(&self) -> BTreeMap<ImpactGroup, usize> {
        let mut counts = BTreeMap::new();
        for record in self.related.values() {
            *counts.entry(record.group).or_insert(0) += 1;
        }
        counts
    }
}

/// Result of a composite resolution, in first-seen seed order
///
/// Works are kept in request order with a seed index beside them, so lookups
/// by seed do not scan.
#[derive(Debug, Clone, Default)]
pub struct CompositeResolution {
    works: Vec<CompositeWork>,
    index: HashMap<u32, usize>,
    pub unresolved_seeds: BTreeSet<u32>,
    pub unresolved_related: BTreeSet<u32>,
}

impl CompositeResolution {
    /// Later works with an already indexed seed are dropped
    pub fn new(
        works: Vec<CompositeWork>,
        unresolved_seeds: BTreeSet<u32>,
        unresolved_related: BTreeSet<u32>,
    ) -> Self {
        let mut resolution = Self {
            works: Vec::with_capacity(works.len()),
            index: HashMap::with_capacity(works.len()),
            unresolved_seeds,
            unresolved_related,
        };
        for work in works {
            if let Entry::Vacant(slot) = resolution.index.entry(work.seed_id) {
                slot.insert(resolution.works.len());
                resolution.works.push(work);
            }
        }
        resolution
    }

    pub fn get(&self, seed_id: u32) -> Option<&CompositeWork> {
        self.index.get(&seed_id).map(|&position| &self.works[position])
    }

    /// All works, resolved or not, in request order
    pub fn works(&self) -> &[CompositeWork] {
        &self.works
    }

    /// Works whose seed resolved, in request order
    pub fn resolved(&self) -> impl Iterator<Item = &CompositeWork> {
        self.works.iter().filter(|work| work.is_resolved())
    }

    pub fn len(&self) -> usize {
        self.works.len()
    }

    pub fn is_empty(&self) -> bool {
        self.works.is_empty()
    }
}
