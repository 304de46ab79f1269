//! Percentile → impact group classification
//!
//! Groups are assigned once, when a freshly fetched record is written to the
//! cache. Loading a cached record never regroups it, so changing thresholds
//! only affects records fetched afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ICiteError, Result};

/// Ordinal impact group of a record relative to its field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum ImpactGroup {
    VeryLow = 0,
    Low = 1,
    Average = 2,
    High = 3,
    VeryHigh = 4,
    /// No percentile available, or the percentile was not a usable number
    Indeterminate = 5,
}

impl ImpactGroup {
    pub const ALL: [ImpactGroup; 6] = [
        ImpactGroup::VeryLow,
        ImpactGroup::Low,
        ImpactGroup::Average,
        ImpactGroup::High,
        ImpactGroup::VeryHigh,
        ImpactGroup::Indeterminate,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_determined(self) -> bool {
        self != ImpactGroup::Indeterminate
    }
}

impl From<ImpactGroup> for u8 {
    fn from(group: ImpactGroup) -> Self {
        group.as_u8()
    }
}

impl TryFrom<u8> for ImpactGroup {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        ImpactGroup::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| format!("impact group must be 0-5, got {value}"))
    }
}

impl fmt::Display for ImpactGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Four strictly increasing cut points splitting [0, 100] into five groups
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileThresholds {
    cuts: [f64; 4],
}

impl PercentileThresholds {
    /// 68-95-99.7 rule cut points
    pub const DEFAULT_CUTS: [f64; 4] = [2.1, 15.7, 83.9, 97.5];

    pub fn new(cuts: [f64; 4]) -> Result<Self> {
        if cuts.iter().any(|c| !c.is_finite()) {
            return Err(ICiteError::InvalidThresholds {
                message: format!("cut points must be finite, got {cuts:?}"),
            });
        }
        if cuts.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ICiteError::InvalidThresholds {
                message: format!("cut points must be strictly increasing, got {cuts:?}"),
            });
        }
        Ok(Self { cuts })
    }

    pub fn cuts(&self) -> [f64; 4] {
        self.cuts
    }

    /// Classify a percentile
    ///
    /// `None`, NaN, infinities and values outside [0, 100] are `Indeterminate`.
    pub fn group_of(&self, percentile: Option<f64>) -> ImpactGroup {
        let Some(p) = percentile else {
            return ImpactGroup::Indeterminate;
        };
        if !p.is_finite() || !(0.0..=100.0).contains(&p) {
            return ImpactGroup::Indeterminate;
        }

        let [t1, t2, t3, t4] = self.cuts;
        if p < t1 {
            ImpactGroup::VeryLow
        } else if p < t2 {
            ImpactGroup::Low
        } else if p < t3 {
            ImpactGroup::Average
        } else if p < t4 {
            ImpactGroup::High
        } else {
            ImpactGroup::VeryHigh
        }
    }
}

impl Default for PercentileThresholds {
    fn default() -> Self {
        Self {
            cuts: Self::DEFAULT_CUTS,
        }
    }
}

/// Classify with the default thresholds
pub fn group_of(percentile: Option<f64>) -> ImpactGroup {
    PercentileThresholds::default().group_of(percentile)
}
