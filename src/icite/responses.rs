use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::warn;

use crate::icite::deserializers::{
    deserialize_authors, deserialize_flag, deserialize_id_set, deserialize_weight,
};

/// Envelope of `GET /pubs?pmids=...`
///
/// Entries stay raw until [`PubsResponse::into_wire_records`] so one bad
/// entry cannot sink the rest of the batch.
#[derive(Debug, Deserialize)]
pub(crate) struct PubsResponse {
    #[serde(default)]
    pub data: Vec<Value>,
}

impl PubsResponse {
    /// Decode every entry on its own; malformed entries are logged and skipped
    pub fn into_wire_records(self) -> Vec<WireRecord> {
        self.data
            .into_iter()
            .filter_map(|entry| {
                let pmid = entry.get("pmid").or_else(|| entry.get("id")).cloned();
                match serde_json::from_value::<WireRecord>(entry) {
                    Ok(wire) => Some(wire),
                    Err(err) => {
                        warn!(pmid = ?pmid, error = %err, "Skipping malformed record in batch response");
                        None
                    }
                }
            })
            .collect()
    }
}

/// One publication as iCite sends it
#[derive(Debug, Deserialize)]
pub(crate) struct WireRecord {
    #[serde(alias = "pmid")]
    pub id: u32,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_authors")]
    pub authors: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_research_article: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_clinical: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub provisional: bool,
    #[serde(default, deserialize_with = "deserialize_weight")]
    pub human: f64,
    #[serde(default, deserialize_with = "deserialize_weight")]
    pub animal: f64,
    #[serde(default, deserialize_with = "deserialize_weight")]
    pub molecular_cellular: f64,
    #[serde(default, alias = "nih_percentile")]
    pub percentile: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_id_set")]
    pub cited_by: BTreeSet<u32>,
    #[serde(default, deserialize_with = "deserialize_id_set")]
    pub cited_by_clin: BTreeSet<u32>,
    #[serde(default, deserialize_with = "deserialize_id_set")]
    pub references: BTreeSet<u32>,
}
