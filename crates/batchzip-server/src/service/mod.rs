//! Application state, configuration and the archive pipeline.

mod assembler;
mod error;
mod service_config;
mod service_state;

pub use assembler::{ArchiveAssembler, AssemblyReport};
pub use error::{Result, ServiceError};
pub use service_config::{ArchiveConfig, ManifestBackend, ServiceConfig};
pub use service_state::ServiceState;
