//! Metrics polling and per-pipeline visualization dispatch.

pub mod dispatch;
pub mod poller;
pub mod reading;
pub mod views;

pub use dispatch::{dispatch, Visualization, REGISTERED_PIPELINES};
pub use poller::{MetricsPoller, SequenceGate, Ticket};
pub use reading::{Emphasis, Reading, Share};
