//! Lenient serde deserializers for iCite JSON fields
//!
//! iCite has shipped several encodings of the same field over time: flags as
//! `"Yes"`/`"No"` or booleans, authors as one comma-joined string or a list,
//! and `null` wherever a value is unknown.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;
use std::result;

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Number(i64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AuthorsRepr {
    List(Vec<String>),
    Joined(String),
}

/// `true`/`false`, `"Yes"`/`"No"`, `1`/`0` or `null` (false)
pub(crate) fn deserialize_flag<'de, D>(deserializer: D) -> result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let flag = Option::<FlagRepr>::deserialize(deserializer)?;
    Ok(match flag {
        None => false,
        Some(FlagRepr::Bool(b)) => b,
        Some(FlagRepr::Number(n)) => n != 0,
        Some(FlagRepr::Text(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "yes" | "true" | "y" | "1"
        ),
    })
}

/// Relevance weight; `null` means not flagged
pub(crate) fn deserialize_weight<'de, D>(deserializer: D) -> result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// Ordered author names from a list or a comma-joined string
pub(crate) fn deserialize_authors<'de, D>(deserializer: D) -> result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let authors = match Option::<AuthorsRepr>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(AuthorsRepr::List(list)) => list
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect(),
        Some(AuthorsRepr::Joined(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect(),
    };
    Ok(authors)
}

/// Identifier list; `null` becomes the empty set
pub(crate) fn deserialize_id_set<'de, D>(deserializer: D) -> result::Result<BTreeSet<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<u32>>::deserialize(deserializer)?
        .map(|ids| ids.into_iter().filter(|id| *id != 0).collect())
        .unwrap_or_default())
}
