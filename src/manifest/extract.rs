//! # Read-only Extraction
//!
//! Namespace lookup, resource listing and container image listing over a
//! manifest. Nothing here re-encodes; any decode failure fails the call.

use crate::constants::NAMESPACE_KIND;
use crate::manifest::document::{parse_documents, parse_documents_with};
use crate::manifest::error::ManifestError;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::debug;

/// One resource declared in a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Lower-cased `kind`, empty when absent
    pub kind: String,
    /// `metadata.name`, empty when absent
    pub name: String,
    /// `metadata.namespace`, empty when absent
    pub namespace: String,
}

/// Namespace of the first document in `manifest`.
///
/// For `kind: Namespace` this is the resource's own `metadata.name`,
/// otherwise `metadata.namespace`. Missing fields give an empty string; a
/// Namespace carrying only `metadata.namespace` also gives an empty string.
pub fn get_namespace(manifest: &[u8]) -> Result<String, ManifestError> {
    super::observe("get_namespace", || {
        let Some(first) = serde_yaml::Deserializer::from_slice(manifest).next() else {
            return Ok(String::new());
        };
        let document = Value::deserialize(first).map_err(ManifestError::Decode)?;

        let field = if document.get("kind").and_then(Value::as_str) == Some(NAMESPACE_KIND) {
            "name"
        } else {
            "namespace"
        };

        Ok(metadata_str(&document, field).to_string())
    })
}

/// `(kind, name, namespace)` of every document, in document order.
///
/// When `kinds` is non-empty, only documents whose kind matches one of them
/// (case-insensitively) are returned.
pub fn get_resources_from_manifest(
    manifest: &[u8],
    kinds: &[&str],
) -> Result<Vec<ResourceRef>, ManifestError> {
    super::observe("get_resources_from_manifest", || {
        let allowed: Vec<String> = kinds.iter().map(|k| k.to_lowercase()).collect();
        let mut resources = Vec::new();

        parse_documents_with(manifest, |document| {
            let kind = document
                .get("kind")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_lowercase();

            if !allowed.is_empty() && !allowed.contains(&kind) {
                debug!(kind = %kind, "Skipping resource not in kind filter");
                return Ok(());
            }

            resources.push(ResourceRef {
                kind,
                name: metadata_str(document, "name").to_string(),
                namespace: metadata_str(document, "namespace").to_string(),
            });
            Ok(())
        })?;

        Ok(resources)
    })
}

/// Every `image` under any `spec.containers[*]`, at any depth, in order of
/// appearance across all documents.
pub fn get_images_from_manifest(manifest: &[u8]) -> Result<Vec<String>, ManifestError> {
    super::observe("get_images_from_manifest", || {
        let mut images = Vec::new();
        for document in parse_documents(manifest)? {
            collect_images(&document, &mut images);
        }
        Ok(images)
    })
}

/// Pre-order walk matching `spec.containers[*].image`.
fn collect_images(value: &Value, images: &mut Vec<String>) {
    match value {
        Value::Mapping(mapping) => {
            if let Some(containers) = mapping
                .get("spec")
                .and_then(|spec| spec.get("containers"))
                .and_then(Value::as_sequence)
            {
                images.extend(
                    containers
                        .iter()
                        .filter_map(|container| container.get("image"))
                        .filter_map(Value::as_str)
                        .map(str::to_string),
                );
            }
            for (_, child) in mapping {
                collect_images(child, images);
            }
        }
        Value::Sequence(sequence) => {
            for item in sequence {
                collect_images(item, images);
            }
        }
        Value::Tagged(tagged) => collect_images(&tagged.value, images),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

fn metadata_str<'a>(document: &'a Value, field: &str) -> &'a str {
    document
        .get("metadata")
        .and_then(|metadata| metadata.get(field))
        .and_then(Value::as_str)
        .unwrap_or_default()
}
