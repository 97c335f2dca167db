use crate::generator::frame::{encode_jpeg, render, Pattern};
use crate::generator::metrics::synthesize;
use crate::gui_bridge::model::{self, SharedModel};
use crate::workflow::config::SimConfig;
use log::{debug, warn};
use pathocore::api::MetricsSnapshot;
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

/// Latest encoded frame, shared with every open stream.
pub type FrameFeed = watch::Receiver<Option<Arc<Vec<u8>>>>;

fn unix_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}

/// Frame loop standing in for camera capture plus pipeline processing.
pub struct Runner {
    config: SimConfig,
    model: SharedModel,
    rng: StdRng,
    frame_index: u64,
}

impl Runner {
    pub fn new(config: SimConfig, model: SharedModel) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            model,
            frame_index: 0,
        }
    }

    /// Produces one frame: its metrics are recorded in the model and the
    /// encoded JPEG is returned.
    pub fn step(&mut self) -> anyhow::Result<Vec<u8>> {
        let active = model::read(&self.model).active().clone();
        let metrics = synthesize(&active, &mut self.rng);
        let image = render(
            Pattern::for_frame(self.frame_index),
            self.config.width,
            self.config.height,
            &mut self.rng,
        );
        let jpeg = encode_jpeg(&image)?;
        self.frame_index += 1;

        debug!(
            "frame {} for {} ({} metrics)",
            self.frame_index,
            active.name,
            metrics.len()
        );
        model::write(&self.model).record(MetricsSnapshot {
            timestamp: unix_seconds(),
            pipeline: active.name,
            metrics,
        });
        Ok(jpeg)
    }

    /// Runs the frame loop at the configured rate, publishing each frame.
    pub async fn run(mut self, frames: watch::Sender<Option<Arc<Vec<u8>>>>) {
        let mut ticker = interval(self.config.frame_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.step() {
                Ok(jpeg) => {
                    frames.send_replace(Some(Arc::new(jpeg)));
                }
                Err(err) => warn!("frame {} failed: {:#}", self.frame_index, err),
            }
        }
    }
}
