use crate::metrics::views::{
    CellCountView, EstrogenReceptorView, FluorescenceView, PleomorphismView, TubuleView,
};
use serde_json::{Map, Value};

/// Pipeline identifiers with a registered visualization.
pub const REGISTERED_PIPELINES: [&str; 5] = [
    "cell_count",
    "fluorescence",
    "estrogen_receptor",
    "nottingham_tubule",
    "nuclear_pleomorphism",
];

/// What the metrics panel should show.
#[derive(Debug, Clone, PartialEq)]
pub enum Visualization {
    NoActivePipeline,
    WaitingForData,
    NoMetrics,
    Unsupported(String),
    CellCount(CellCountView),
    Fluorescence(FluorescenceView),
    EstrogenReceptor(EstrogenReceptorView),
    NottinghamTubule(TubuleView),
    NuclearPleomorphism(PleomorphismView),
}

impl Visualization {
    /// Placeholder text for the non-chart variants.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Visualization::NoActivePipeline => Some("No active pipeline"),
            Visualization::WaitingForData => Some("Waiting for data..."),
            Visualization::NoMetrics => Some("No metrics available"),
            Visualization::Unsupported(_) => Some("No visualization available for this pipeline"),
            _ => None,
        }
    }
}

/// Selects the visualization for `active` given the latest metrics.
///
/// Checked in order: no active pipeline, no snapshot yet, empty metrics,
/// then the identifier match.
pub fn dispatch(active: Option<&str>, metrics: Option<&Map<String, Value>>) -> Visualization {
    let Some(name) = active.filter(|name| !name.is_empty()) else {
        return Visualization::NoActivePipeline;
    };
    let Some(metrics) = metrics else {
        return Visualization::WaitingForData;
    };
    if metrics.is_empty() {
        return Visualization::NoMetrics;
    }
    match name {
        "cell_count" => Visualization::CellCount(CellCountView::from_metrics(metrics)),
        "fluorescence" => Visualization::Fluorescence(FluorescenceView::from_metrics(metrics)),
        "estrogen_receptor" => {
            Visualization::EstrogenReceptor(EstrogenReceptorView::from_metrics(metrics))
        }
        "nottingham_tubule" => Visualization::NottinghamTubule(TubuleView::from_metrics(metrics)),
        "nuclear_pleomorphism" => {
            Visualization::NuclearPleomorphism(PleomorphismView::from_metrics(metrics))
        }
        other => Visualization::Unsupported(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metrics(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn precedence_is_pipeline_then_data_then_content_then_match() {
        let empty = Map::new();
        let some = metrics(json!({"cell_count": 1}));

        assert_eq!(dispatch(None, None), Visualization::NoActivePipeline);
        assert_eq!(dispatch(None, Some(&some)), Visualization::NoActivePipeline);
        assert_eq!(dispatch(Some(""), Some(&some)), Visualization::NoActivePipeline);
        assert_eq!(dispatch(Some("unknown"), None), Visualization::WaitingForData);
        assert_eq!(dispatch(Some("unknown"), Some(&empty)), Visualization::NoMetrics);
        assert_eq!(
            dispatch(Some("unknown"), Some(&some)),
            Visualization::Unsupported("unknown".into())
        );
    }

    #[test]
    fn every_registered_pipeline_renders_with_unrelated_fields() {
        let unrelated = metrics(json!({"unrelated": {"deep": [1, 2]}}));
        for name in REGISTERED_PIPELINES {
            let visualization = dispatch(Some(name), Some(&unrelated));
            assert!(visualization.placeholder().is_none(), "{name}");
        }
    }

    #[test]
    fn identifier_match_is_exact() {
        let some = metrics(json!({"cell_count": 1}));
        assert!(matches!(
            dispatch(Some("Cell_Count"), Some(&some)),
            Visualization::Unsupported(_)
        ));
        assert!(matches!(
            dispatch(Some("cell_count"), Some(&some)),
            Visualization::CellCount(_)
        ));
    }
}
