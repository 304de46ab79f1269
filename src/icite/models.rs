use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::icite::grouper::{ImpactGroup, PercentileThresholds};
use crate::icite::relations::Relation;
use crate::icite::responses::WireRecord;

/// Citation metadata for one publication, as cached
///
/// A record is immutable once cached; a forced refresh replaces it wholesale.
/// Relation sets are always present (possibly empty) even when the service
/// sent `null` for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// PubMed ID
    pub id: u32,
    pub year: i32,
    pub title: String,
    /// Author names in publication order
    pub authors: Vec<String>,
    pub is_research_article: bool,
    pub is_clinical: bool,
    /// Citation data not yet final for recent publications
    pub provisional: bool,
    /// Relevance weights; zero means not flagged
    pub human: f64,
    pub animal: f64,
    pub molecular_cellular: f64,
    /// NIH percentile in [0, 100]; `None` until iCite determines it
    pub percentile: Option<f64>,
    /// Assigned at cache-write time and never recomputed on load
    pub group: ImpactGroup,
    pub cited_by: BTreeSet<u32>,
    pub cited_by_clin: BTreeSet<u32>,
    pub references: BTreeSet<u32>,
}

impl Record {
    /// Minimal record with empty relations and an indeterminate group
    pub fn new<S: Into<String>>(id: u32, year: i32, title: S) -> Self {
        Self {
            id,
            year,
            title: title.into(),
            authors: Vec::new(),
            is_research_article: false,
            is_clinical: false,
            provisional: false,
            human: 0.0,
            animal: 0.0,
            molecular_cellular: 0.0,
            percentile: None,
            group: ImpactGroup::Indeterminate,
            cited_by: BTreeSet::new(),
            cited_by_clin: BTreeSet::new(),
            references: BTreeSet::new(),
        }
    }

    pub fn relation(&self, relation: Relation) -> &BTreeSet<u32> {
        match relation {
            Relation::CitedBy => &self.cited_by,
            Relation::CitedByClin => &self.cited_by_clin,
            Relation::References => &self.references,
        }
    }

    /// Distinct citing works across the general and clinical lists
    pub fn num_citations_total(&self) -> usize {
        self.cited_by.union(&self.cited_by_clin).count()
    }

    pub fn assign_group(&mut self, thresholds: &PercentileThresholds) {
        self.group = thresholds.group_of(self.percentile);
    }

    /// Normalize a wire record; the group is assigned later, at cache-write time
    pub(crate) fn from_wire(wire: WireRecord) -> Self {
        Self {
            id: wire.id,
            year: wire.year.unwrap_or_default(),
            title: wire.title.unwrap_or_default(),
            authors: wire.authors,
            is_research_article: wire.is_research_article,
            is_clinical: wire.is_clinical,
            provisional: wire.provisional,
            human: wire.human,
            animal: wire.animal,
            molecular_cellular: wire.molecular_cellular,
            percentile: wire.percentile,
            group: ImpactGroup::Indeterminate,
            cited_by: wire.cited_by,
            cited_by_clin: wire.cited_by_clin,
            references: wire.references,
        }
    }
}
