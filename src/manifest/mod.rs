//! # Manifest Engine
//!
//! Post-processing of Kubernetes manifests held as raw bytes.
//!
//! ## Features
//!
//! - **Document splitting**: multi-document streams decoded in order, empty documents dropped
//! - **Ownership labels**: labels merged into every resource, including items of `List` kinds
//! - **Env patching**: existing container env values overwritten, nothing appended
//! - **Extraction**: namespace, `(kind, name, namespace)` triples, and container images
//! - **Canonical output**: sorted keys, 2-space indent, `---` between documents
//!
//! ## Usage
//!
//! ```rust
//! use manifest_engine::manifest;
//!
//! let input = b"apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: settings\n";
//! let labels = manifest::application_labels(7, "shop", "alice", "git");
//!
//! let output = manifest::add_labels(input, &labels).unwrap();
//! let resources = manifest::get_resources_from_manifest(&output, &[]).unwrap();
//! assert_eq!(resources[0].kind, "configmap");
//! ```

pub mod document;
pub mod env;
pub mod error;
pub mod extract;
pub mod labels;

pub use document::{
    encode_document, extract_documents, join_documents, parse_documents, parse_documents_with,
};
pub use env::{update_container_env, EnvPatchSet};
pub use error::ManifestError;
pub use extract::{get_images_from_manifest, get_namespace, get_resources_from_manifest, ResourceRef};
pub use labels::{
    add_labels, application_labels, helm_application_labels, sanitize_label_value, LabelSet,
};

use crate::observability::metrics;
use serde_yaml::Value;
use std::time::Instant;
use tracing::{debug, info_span, warn};

/// Run one engine operation inside a span, recording duration and errors.
pub(crate) fn observe<T, F>(operation: &'static str, f: F) -> Result<T, ManifestError>
where
    F: FnOnce() -> Result<T, ManifestError>,
{
    let span = info_span!("manifest.operation", manifest.operation = operation);
    let _enter = span.enter();
    let start = Instant::now();

    let result = f();

    metrics::record_operation(operation, start.elapsed().as_secs_f64());
    if let Err(ref e) = result {
        warn!("Manifest {} failed: {}", operation, e);
        metrics::increment_operation_errors(operation);
    }

    result
}

/// Decode, mutate each document with `hook`, and re-encode.
///
/// Empty input is returned unchanged without decoding.
pub(crate) fn rewrite_manifest<F>(
    operation: &'static str,
    bytes: &[u8],
    mut hook: F,
) -> Result<Vec<u8>, ManifestError>
where
    F: FnMut(&mut Value),
{
    if bytes.is_empty() {
        debug!("Empty manifest, nothing to {}", operation);
        return Ok(Vec::new());
    }

    observe(operation, || {
        let documents = parse_documents_with(bytes, |document| {
            hook(document);
            Ok(())
        })?;
        join_documents(&documents)
    })
}
