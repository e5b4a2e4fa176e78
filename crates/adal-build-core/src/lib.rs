pub mod clean;
pub mod config;
pub mod device;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod paths;
pub mod report;
pub mod target;
pub mod version;

pub use error::{BuildError, Result};
