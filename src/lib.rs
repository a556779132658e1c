//! Manifest Engine Library
//!
//! Post-processing for Kubernetes manifests: ownership labels, container
//! env patching, document splitting, and read-only extraction of
//! namespaces, resources and images.
//!
//! The engine is synchronous and stateless; every call takes manifest bytes
//! and returns new bytes or extracted values. Tests are included in the
//! module files and under `tests/`.

pub mod cli;
pub mod config;
pub mod constants;
pub mod logging;
pub mod manifest;
pub mod observability;

pub use manifest::{
    add_labels, extract_documents, get_images_from_manifest, get_namespace,
    get_resources_from_manifest, update_container_env, ManifestError, ResourceRef,
};
