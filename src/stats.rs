use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub total: u64,
    pub blocked: u64,
    pub safe: u64,
}

impl Counts {
    pub fn record(&mut self, blocked: bool) {
        self.total += 1;
        if blocked {
            self.blocked += 1;
        } else {
            self.safe += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourCounts {
    pub blocked: u64,
    pub safe: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCount {
    pub domain: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub timestamp: String,
    pub from: String,
    pub ip: String,
    pub status: String,
    pub score: f64,
}

/// Dashboard statistics computed from one pass over the log tail
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    #[serde(flatten)]
    pub totals: Counts,
    /// Always zero: statuses other than `blocked` are folded into `safe`.
    #[serde(default)]
    pub errors: u64,
    pub today: Counts,
    pub last_24h: Counts,
    /// Keyed by `HH:00`, ascending
    pub by_hour: BTreeMap<String, HourCounts>,
    pub top_blocked_domains: Vec<DomainCount>,
    /// Newest first
    pub last_entries: Vec<EntrySummary>,
    pub generated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn json_shape_has_flat_totals_and_errors() {
        let snapshot = StatsSnapshot {
            totals: Counts {
                total: 2,
                blocked: 1,
                safe: 1,
            },
            ..StatsSnapshot::default()
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["total"], json!(2));
        assert_eq!(value["blocked"], json!(1));
        assert_eq!(value["errors"], json!(0));
        assert_eq!(value["today"], json!({"total": 0, "blocked": 0, "safe": 0}));
        assert_eq!(value["by_hour"], json!({}));
    }

    #[test]
    fn reads_snapshots_written_without_errors() {
        let mut value = serde_json::to_value(StatsSnapshot::default()).unwrap();
        if let Value::Object(map) = &mut value {
            map.remove("errors");
        }

        let snapshot: StatsSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(snapshot, StatsSnapshot::default());
    }
}
