//! Run accounting
//!
//! Counters are accumulated by the orchestrator and handed back to the
//! caller at the end of a run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Per-run processing counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingCounts {
    /// Flowpaths whose duplicate lengths were resolved by the deduplicator
    pub flowpaths_deduped: u64,
    /// Flowpaths persisted with geometry
    pub flowpaths_imported: u64,
    /// Flowpaths deleted because fewer than two points survived truncation
    pub flowpaths_too_short: u64,
    /// Flowpaths deleted after a fatal per-flowpath error
    pub flowpaths_failed: u64,
    /// Raw groups skipped as upstream noise
    pub groups_skipped: u64,
    /// Units processed to completion
    pub units_processed: u64,
}

impl ProcessingCounts {
    /// Plain counter map, event name → count
    pub fn to_map(&self) -> BTreeMap<&'static str, u64> {
        BTreeMap::from([
            ("flowpaths_deduped", self.flowpaths_deduped),
            ("flowpaths_failed", self.flowpaths_failed),
            ("flowpaths_imported", self.flowpaths_imported),
            ("flowpaths_too_short", self.flowpaths_too_short),
            ("groups_skipped", self.groups_skipped),
            ("units_processed", self.units_processed),
        ])
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} imported, {} too short, {} failed, {} deduplicated",
            self.flowpaths_imported,
            self.flowpaths_too_short,
            self.flowpaths_failed,
            self.flowpaths_deduped
        )
    }
}

impl fmt::Display for ProcessingCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Processing accounting:")?;
        for (key, value) in self.to_map() {
            writeln!(f, "    {}: {}", key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_exposes_dedup_counter() {
        let counts = ProcessingCounts {
            flowpaths_deduped: 4,
            ..Default::default()
        };
        assert_eq!(counts.to_map().get("flowpaths_deduped"), Some(&4));
    }

    #[test]
    fn test_display_lists_every_counter() {
        let text = ProcessingCounts::default().to_string();
        assert!(text.starts_with("Processing accounting:"));
        assert!(text.contains("    flowpaths_deduped: 0"));
        assert!(text.contains("    units_processed: 0"));
    }
}
