//! Validated PubMed identifiers
//!
//! iCite keys every record by PMID. Identifiers arrive from callers as raw
//! integers or strings and from the service inside relation lists; only the
//! former are validated here, relation lists are trusted as the service sent them.

use crate::error::{ICiteError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated PubMed ID (PMID)
///
/// # Examples
///
/// ```
/// use icite_client::PubMedId;
///
/// let pmid = PubMedId::parse("  31978945 ").unwrap();
/// assert_eq!(pmid.as_u32(), 31978945);
/// assert_eq!(pmid.to_string(), "31978945");
///
/// assert!(PubMedId::parse("0").is_err());
/// assert!(PubMedId::try_from_u32(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PubMedId {
    value: u32,
}

impl PubMedId {
    /// Parse a PMID from a string, trimming surrounding whitespace
    ///
    /// # Errors
    ///
    /// Returns `ICiteError::InvalidPmid` for empty, non-numeric, zero or
    /// out-of-range input.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();

        let value = trimmed
            .parse::<u32>()
            .map_err(|_| ICiteError::InvalidPmid {
                pmid: s.to_string(),
            })?;

        Self::try_from_u32(value).map_err(|_| ICiteError::InvalidPmid {
            pmid: s.to_string(),
        })
    }

    /// Create a PubMedId from a u32 value, rejecting zero
    pub fn try_from_u32(value: u32) -> Result<Self> {
        if value == 0 {
            return Err(ICiteError::InvalidPmid {
                pmid: value.to_string(),
            });
        }
        Ok(Self { value })
    }

    pub fn as_u32(&self) -> u32 {
        self.value
    }
}

/// Validate a batch of raw identifiers, failing on the first invalid one
pub fn validate_pmids<I>(ids: I) -> Result<Vec<PubMedId>>
where
    I: IntoIterator<Item = u32>,
{
    ids.into_iter().map(PubMedId::try_from_u32).collect()
}

impl fmt::Display for PubMedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl FromStr for PubMedId {
    type Err = ICiteError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<u32> for PubMedId {
    type Error = ICiteError;

    fn try_from(value: u32) -> Result<Self> {
        Self::try_from_u32(value)
    }
}

impl From<PubMedId> for u32 {
    fn from(pmid: PubMedId) -> Self {
        pmid.value
    }
}
