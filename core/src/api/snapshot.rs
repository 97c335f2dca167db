use serde::{Deserialize, Serialize};

/// One timestamped sample of pipeline output, as served by `GET /metrics`.
///
/// `metrics` is left open: its schema depends on which pipeline produced it
/// and is interpreted by [`crate::metrics::dispatch`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MetricsSnapshot {
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub pipeline: String,
    #[serde(default)]
    pub metrics: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collaborator_snapshot_parses() {
        let snapshot: MetricsSnapshot =
            serde_json::from_str(r#"{"timestamp":0,"pipeline":"","metrics":{}}"#).unwrap();
        assert!(snapshot.metrics.is_empty());
        assert_eq!(snapshot.pipeline, "");
    }

    #[test]
    fn nested_metrics_survive_parsing() {
        let snapshot: MetricsSnapshot = serde_json::from_str(
            r#"{"timestamp":1.5,"pipeline":"cell_count",
                "metrics":{"cell_count":4,"sizes":{"min_size":10.0}}}"#,
        )
        .unwrap();
        assert_eq!(snapshot.metrics["sizes"]["min_size"], 10.0);
    }
}
