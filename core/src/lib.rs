//! Core of the PathoAssist operator console.
//!
//! The modules cover the wire model shared with the pipeline registry, the
//! settings editor state machine, the metrics poller and visualization
//! dispatcher, and the HTTP client that talks to the registry collaborator.

pub mod api;
pub mod client;
pub mod config;
pub mod metrics;
pub mod prelude;
pub mod settings;
pub mod telemetry;

pub use prelude::{ClientError, EditError, Params};
