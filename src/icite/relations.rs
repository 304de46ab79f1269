//! Relation tags and the policy choosing which related works to resolve

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{ICiteError, Result};
use crate::icite::models::Record;

/// One hop from a record to a set of related identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Works that cite the record
    CitedBy,
    /// Clinical works that cite the record
    CitedByClin,
    /// Works the record references
    References,
}

impl Relation {
    pub const ALL: [Relation; 3] = [
        Relation::CitedBy,
        Relation::CitedByClin,
        Relation::References,
    ];

    pub fn as_tag(self) -> &'static str {
        match self {
            Relation::CitedBy => "cited_by",
            Relation::CitedByClin => "cited_by_clin",
            Relation::References => "references",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for Relation {
    type Err = ICiteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "cited_by" => Ok(Relation::CitedBy),
            "cited_by_clin" => Ok(Relation::CitedByClin),
            "references" => Ok(Relation::References),
            other => Err(ICiteError::InvalidRelation {
                tag: other.to_string(),
            }),
        }
    }
}

/// Which relations of each seed are expanded into an associated set
///
/// An empty policy fetches seeds only.
///
/// # Example
///
/// ```
/// use icite_client::{AssociatedSetPolicy, Relation};
///
/// let policy = AssociatedSetPolicy::from_tags(["cited_by", "references"]).unwrap();
/// assert!(policy.contains(Relation::References));
/// assert!(!policy.contains(Relation::CitedByClin));
///
/// assert!(AssociatedSetPolicy::from_tags(["cites"]).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociatedSetPolicy {
    relations: BTreeSet<Relation>,
}

impl AssociatedSetPolicy {
    /// Build a policy from tag strings; unknown tags are a configuration error
    pub fn from_tags<I, S>(tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let relations = tags
            .into_iter()
            .map(|tag| tag.as_ref().parse::<Relation>())
            .collect::<Result<BTreeSet<_>>>()?;
        Ok(Self { relations })
    }

    pub fn from_relations<I: IntoIterator<Item = Relation>>(relations: I) -> Self {
        Self {
            relations: relations.into_iter().collect(),
        }
    }

    /// cited_by, cited_by_clin and references
    pub fn all() -> Self {
        Self::from_relations(Relation::ALL)
    }

    /// cited_by and cited_by_clin
    pub fn citations() -> Self {
        Self::from_relations([Relation::CitedBy, Relation::CitedByClin])
    }

    pub fn references() -> Self {
        Self::from_relations([Relation::References])
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn contains(&self, relation: Relation) -> bool {
        self.relations.contains(&relation)
    }

    pub fn relations(&self) -> impl Iterator<Item = Relation> + '_ {
        self.relations.iter().copied()
    }

    /// Union of the record's identifier sets for every relation in the policy
    pub fn related_ids(&self, record: &Record) -> BTreeSet<u32> {
        self.relations
            .iter()
            .flat_map(|relation| record.relation(*relation).iter().copied())
            .collect()
    }
}
