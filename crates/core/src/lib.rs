//! mojo-tools - Extract build-plugin goal descriptors
//!
//! This crate provides functionality to:
//! - Scan compiled classes, Java sources and scripts for goal declarations
//! - Reconcile declarations inherited across class hierarchies
//! - Assemble and validate descriptor entries for each goal
//! - Read and write the `plugin.xml` descriptor document
pub mod aggregate;
pub mod builder;
pub mod codec;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod report;
pub mod scanner;
pub mod script;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;

// Re-export main API components
pub use aggregate::{Aggregator, Backend, ExtractionBackend, ExtractionRequest};
pub use builder::DescriptorBuilder;
pub use codec::DocumentFlavor;
pub use config::Config;
pub use reconcile::{ReconciledUnit, Reconciler};
pub use report::PluginOverview;
