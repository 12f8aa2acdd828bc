//! Test utilities for droidplan unit tests.
//!
//! This module is only available when compiling with `--cfg test`. It
//! provides manifest text fixtures and registries that resolve them.
//!
//! # Example
//!
//! ```rust,ignore
//! use droidplan::test_support::{flutter_registries, ManifestFixture};
//!
//! #[test]
//! fn test_example() {
//!     let raw = ManifestFixture::new().desugaring(true).render();
//!     let manifest = droidplan::parser::parse(&raw).unwrap();
//!     // ...
//! }
//! ```

pub mod fixtures;

pub use fixtures::*;

use crate::core::Manifest;
use crate::resolver;

/// Parse and resolve a manifest against [`flutter_registries`], panicking on error.
pub fn resolved(raw: &str) -> Manifest {
    let manifest = crate::parser::parse(raw).expect("fixture parses");
    resolver::resolve(&manifest, &flutter_registries().defaults).expect("fixture resolves")
}
