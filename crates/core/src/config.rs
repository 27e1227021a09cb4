use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub snapshot: SnapshotConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Maximum age in seconds of a price carried forward to a snapshot
    /// timestamp. Zero requires an exact timestamp match.
    pub alignment_tolerance_secs: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Width of the linear ramp to CDF 0 / CDF 1 beyond the outermost strikes.
    pub tail_extension: f64,
    /// Grid size for the discretized uniform benchmark.
    pub uniform_points: usize,
    /// Integration margin beyond the historical sample range.
    pub historical_margin: f64,
    /// Which snapshot of each event gets scored.
    pub snapshot_selection: SnapshotSelection,
    /// Score events on the blocking thread pool.
    pub parallel: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            tail_extension: 0.0,
            uniform_points: 50,
            historical_margin: 1.0,
            snapshot_selection: SnapshotSelection::Latest,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSelection {
    /// The last snapshot before settlement.
    #[default]
    Latest,
    /// The first snapshot with enough concurrent prices.
    Earliest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AnalysisConfig::default();
        assert_eq!(config.snapshot.alignment_tolerance_secs, 0);
        assert!(config.scoring.tail_extension.abs() < f64::EPSILON);
        assert_eq!(config.scoring.uniform_points, 50);
        assert!((config.scoring.historical_margin - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.scoring.snapshot_selection, SnapshotSelection::Latest);
        assert!(!config.scoring.parallel);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{"scoring": {"tail_extension": 0.05, "snapshot_selection": "earliest"}}"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();

        assert!((config.scoring.tail_extension - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.scoring.snapshot_selection, SnapshotSelection::Earliest);
        assert_eq!(config.scoring.uniform_points, 50);
        assert_eq!(config.snapshot, SnapshotConfig::default());
    }
}
