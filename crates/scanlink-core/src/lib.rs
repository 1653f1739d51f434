pub mod constants;
pub mod error;
pub mod log;
pub mod types;

pub use error::{Error, Result};
pub use log::{NoopLog, ScanLog, TracingLog};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
