use anyhow::Result;
use log::{info, warn};
use pathocore::client::RegistryClient;
use pathocore::config::ConsoleConfig;
use pathocore::metrics::{dispatch, MetricsPoller, Visualization};

/// Polls metrics without a window and prints one summary per new snapshot
/// until interrupted.
pub async fn run(client: RegistryClient, config: ConsoleConfig) -> Result<()> {
    let active = client.active_settings().await?;
    info!(
        "headless console attached to {} (pipeline {})",
        client.base_url(),
        active.name
    );

    let fetcher = client.clone();
    let poller = MetricsPoller::spawn(config.poll_interval(), move || {
        let fetcher = fetcher.clone();
        async move { fetcher.latest_metrics().await }
    });
    let mut updates = poller.subscribe();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    warn!("metrics poller stopped unexpectedly");
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                let visualization = dispatch(
                    Some(active.name.as_str()),
                    snapshot.as_ref().map(|snapshot| &snapshot.metrics),
                );
                for line in summary(&visualization) {
                    println!("{line}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    poller.stop();
    info!("{}", poller.stats());
    Ok(())
}

/// Plain-text rendering of a visualization, one line per reading.
pub fn summary(visualization: &Visualization) -> Vec<String> {
    if let Some(placeholder) = visualization.placeholder() {
        return vec![placeholder.to_string()];
    }
    match visualization {
        Visualization::CellCount(view) => {
            let mut lines = vec![format!("cells: {}", view.cell_count)];
            if let Some(series) = &view.size_series {
                let sizes: Vec<String> = series
                    .iter()
                    .map(|bar| format!("{} {}", bar.label, bar.value))
                    .collect();
                lines.push(format!("size: {}", sizes.join(", ")));
            }
            lines
        }
        Visualization::Fluorescence(view) => {
            let mut lines: Vec<String> = view
                .intensities()
                .into_iter()
                .map(|(label, reading)| format!("{}: {}", label.to_lowercase(), reading))
                .collect();
            lines.push(format!("coverage: {}%", view.area_percentage));
            lines
        }
        Visualization::EstrogenReceptor(view) => vec![
            format!(
                "cells: blue {} / brown {}",
                view.blue_cell_count, view.brown_cell_count
            ),
            format!(
                "scores: staining {} / intensity {} / total {}",
                view.staining_score, view.intensity_score, view.total_score
            ),
            format!("stain intensity: {}", view.stain_intensity_text()),
            format!("outcome: {}", view.outcome),
        ],
        Visualization::NottinghamTubule(view) => vec![
            format!("tubule area: {}", view.percentage_text()),
            format!("score: {}", view.score),
        ],
        Visualization::NuclearPleomorphism(view) => vec![
            format!("nuclei: {}", view.nuclei_count),
            format!("score: {}", view.score_text()),
            format!("grade: {}", view.grade),
        ],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn placeholders_print_as_single_line() {
        assert_eq!(
            summary(&dispatch(None, None)),
            vec!["No active pipeline".to_string()]
        );
        assert_eq!(
            summary(&dispatch(Some("cell_count"), None)),
            vec!["Waiting for data...".to_string()]
        );
    }

    #[test]
    fn tubule_summary_uses_percentage() {
        let metrics = json!({"tubule_fraction": 0.8, "nottingham_tubule_score": 1});
        let lines = summary(&dispatch(Some("nottingham_tubule"), metrics.as_object()));
        assert_eq!(lines, vec!["tubule area: 80.00%".to_string(), "score: 1".to_string()]);
    }

    #[test]
    fn cell_count_summary_lists_sizes() {
        let metrics = json!({
            "cell_count": 42,
            "sizes": {"min_size": 10, "avg_size": 21, "max_size": 55}
        });
        let lines = summary(&dispatch(Some("cell_count"), metrics.as_object()));
        assert_eq!(lines[0], "cells: 42");
        assert_eq!(lines[1], "size: Min 10, Avg 21, Max 55");
    }
}
