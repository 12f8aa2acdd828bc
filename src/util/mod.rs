//! Shared utilities

pub mod config;
pub mod context;
pub mod diagnostic;
pub mod hash;

pub use config::{Config, OutputFormat};
pub use context::{GlobalContext, ManifestError};
pub use diagnostic::Diagnostic;
