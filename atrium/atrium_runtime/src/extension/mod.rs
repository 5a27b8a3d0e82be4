//! Extension management for one application
//!
//! This module provides components for validating, resolving, and
//! installing the cross-cutting capabilities an application declares in
//! its configuration.

pub mod registry;
pub mod resolver;

// Re-export key types for convenience
pub use registry::ExtensionRegistry;
pub use resolver::{DefaultResolver, ManifestResolver, PackageResolver};
