//! Selection engine value types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ads::AdRecord;

/// Priority tier. Declaration order is rank order: `P1` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    P1ActiveWinner,
    P2ProvenRecent,
    P3StrategicDirection,
    P4RecentModerate,
}

impl Priority {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::P1ActiveWinner => "ACTIVE_WINNER",
            Self::P2ProvenRecent => "PROVEN_RECENT",
            Self::P3StrategicDirection => "STRATEGIC_DIRECTION",
            Self::P4RecentModerate => "RECENT_MODERATE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ThinText,
    LegacyAutopilot,
    FailedTest,
    BelowThreshold,
    /// Removed as a literal duplicate of a higher-impression sibling.
    Duplicate,
}

/// Outcome of classifying one record. Exactly one of tier or skip reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum Classification {
    Selected(Priority),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedAd {
    pub ad: AdRecord,
    pub classification: Classification,
    pub days_since_launch: Option<i64>,
}

impl ClassifiedAd {
    #[must_use]
    pub fn priority(&self) -> Option<Priority> {
        match self.classification {
            Classification::Selected(p) => Some(p),
            Classification::Skipped(_) => None,
        }
    }

    #[must_use]
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self.classification {
            Classification::Selected(_) => None,
            Classification::Skipped(r) => Some(r),
        }
    }

    /// `"SKIP"` for skipped records, the tier label otherwise.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.priority().map_or("SKIP", Priority::label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionStats {
    pub total_scanned: usize,
    pub total_selected: usize,
    pub total_skipped: usize,
    pub duplicates_removed: usize,
    pub by_priority: BTreeMap<Priority, usize>,
    pub skip_reasons: BTreeMap<SkipReason, usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionResult {
    pub selected: Vec<ClassifiedAd>,
    pub skipped: Vec<ClassifiedAd>,
    pub stats: SelectionStats,
}
