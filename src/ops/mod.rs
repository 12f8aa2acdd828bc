//! High-level operations.
//!
//! This module contains the entry points the `droidplan` commands run.

pub mod pipeline;

pub use pipeline::{
    check_manifest, dependency_graph, load_manifest, resolve_plan, PipelineError, PipelineOptions,
};
