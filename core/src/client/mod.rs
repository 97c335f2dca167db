pub mod registry;
pub mod stream;

pub use registry::{FrameStream, RegistryClient};
pub use stream::MjpegReader;
