pub mod pipeline;
pub mod snapshot;

pub use pipeline::{ActiveSettings, PipelineDescriptor, PipelineList};
pub use snapshot::MetricsSnapshot;
