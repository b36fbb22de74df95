use serde::{Deserialize, Serialize};

use crate::search::ResolvedBy;

pub const STATS_FILE: &str = "stats.json";

/// Launch counters, one per way an input can resolve to an alias url.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LaunchStats {
    pub total_launches: u64,
    pub direct_alias_launches: u64,
    pub fuzzy_search_launches: u64,
    pub ai_search_launches: u64,
    pub google_fallback_launches: u64,
}

impl LaunchStats {
    /// Counts one launch. Passthrough urls are not counted, in which case
    /// `false` is returned and nothing changes.
    pub fn record(&mut self, by: ResolvedBy) -> bool {
        let counter = match by {
            ResolvedBy::Direct => &mut self.direct_alias_launches,
            ResolvedBy::Fuzzy => &mut self.fuzzy_search_launches,
            ResolvedBy::Semantic => &mut self.ai_search_launches,
            ResolvedBy::WebFallback => &mut self.google_fallback_launches,
            ResolvedBy::Passthrough => return false,
        };
        *counter += 1;
        self.total_launches += 1;
        true
    }
}
