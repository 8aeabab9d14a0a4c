pub mod registry;
pub mod service;

pub use registry::PushEvent;
pub use service::{DescriptorError, ServiceDescriptor, ServiceStatus};
