pub mod frame;
pub mod metrics;
