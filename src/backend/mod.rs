// Gateway module for backend access - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod error;
mod http;
mod simulated;
mod traits;
mod types;

// Public re-exports - the ONLY way to access backend functionality
pub use error::BackendError;
pub use http::HttpGateway;
pub use simulated::{ResponseRule, SimulatedGateway};
pub use traits::BackendGateway;
#[cfg(test)]
pub use traits::MockBackendGateway;
pub use types::{HealthReport, ServiceTag, UploadFile, UploadRecord};
