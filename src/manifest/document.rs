//! # Document Splitter / Re-encoder
//!
//! Splits a multi-document YAML stream into generic trees and encodes trees
//! back into canonical YAML.
//!
//! Canonical output has recursively sorted mapping keys, a 2-space indent
//! for nested mappings, and `---\n` between consecutive documents (none
//! after the last). Block sequences are written at their parent key's
//! indentation (`ports:\n- port: 80`), the compact style kubectl also accepts.
//! Documents that decode to null (for example a whitespace-only segment
//! between two separators) are dropped.
//!
//! Strings that a YAML 1.1 reader (kubectl, `sigs.k8s.io/yaml`) would resolve
//! to a bool, number or null (`yes`, `on`, `y`, `1_000`, `0755`, ...) are always
//! emitted single-quoted, even where YAML 1.2 would leave them plain.

use crate::constants::DOCUMENT_SEPARATOR;
use crate::manifest::error::ManifestError;
use crate::observability::metrics;
use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;
use std::sync::LazyLock;
use tracing::{debug, trace};

/// Plain scalars a YAML 1.1 resolver reads as bool, int, float or null.
static YAML11_NON_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:",
        r"y|Y|yes|Yes|YES|n|N|no|No|NO|true|True|TRUE|false|False|FALSE|on|On|ON|off|Off|OFF",
        r"|~|null|Null|NULL",
        r"|[-+]?0b[01_]+",
        r"|[-+]?0x[0-9a-fA-F_]+",
        r"|[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])*",
        r"|[-+]?(?:[0-9][0-9_]*)?\.[0-9_]*(?:[eE][-+]?[0-9]+)?",
        r"|[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*",
        r"|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN)",
        r")$"
    ))
    .expect("Failed to compile YAML 1.1 scalar regex - this should never happen")
});

/// Decode every document in `bytes`, leaving each tree untouched.
pub fn parse_documents(bytes: &[u8]) -> Result<Vec<Value>, ManifestError> {
    parse_documents_with(bytes, |_| Ok(()))
}

/// Decode every document in `bytes`, invoking `hook` on each retained tree
/// in stream order before it is queued.
///
/// An error from the hook aborts the whole call.
pub fn parse_documents_with<F>(bytes: &[u8], mut hook: F) -> Result<Vec<Value>, ManifestError>
where
    F: FnMut(&mut Value) -> Result<(), ManifestError>,
{
    let mut documents = Vec::new();

    for (index, document) in serde_yaml::Deserializer::from_slice(bytes).enumerate() {
        let mut value = Value::deserialize(document).map_err(ManifestError::Decode)?;

        if value.is_null() {
            trace!(document.index = index, "Skipping empty document");
            continue;
        }

        hook(&mut value)?;
        documents.push(value);
    }

    debug!("Decoded {} documents from manifest", documents.len());
    metrics::increment_documents_processed(documents.len());
    Ok(documents)
}

/// Encode a single tree as canonical YAML.
pub fn encode_document(value: &Value) -> Result<String, ManifestError> {
    let mut sorted = value.clone();
    sort_keys(&mut sorted);
    let encoded = serde_yaml::to_string(&sorted).map_err(ManifestError::Encode)?;

    if !contains_yaml11_scalar(&sorted) {
        return Ok(encoded);
    }

    // serde_yaml has no way to force a quoting style, so ambiguous strings are
    // swapped for plain placeholders and quoted after encoding. The marker is
    // chosen so it never occurs in the document's own text.
    let mut nonce = 0u64;
    let marker = loop {
        let candidate = format!("__yaml11_{nonce}_");
        if !encoded.contains(candidate.as_str()) {
            break candidate;
        }
        nonce += 1;
    };
    let mut originals = Vec::new();
    replace_yaml11_scalars(&mut sorted, &marker, &mut originals);

    let mut encoded = serde_yaml::to_string(&sorted).map_err(ManifestError::Encode)?;
    for (index, original) in originals.iter().enumerate() {
        encoded = encoded.replace(&format!("{marker}{index}__"), &format!("'{original}'"));
    }
    Ok(encoded)
}

/// Encode each tree independently and join them with the document separator.
pub fn join_documents(documents: &[Value]) -> Result<Vec<u8>, ManifestError> {
    let encoded = documents
        .iter()
        .map(encode_document)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(encoded.join(DOCUMENT_SEPARATOR).into_bytes())
}

/// Split a manifest into one canonical byte block per document.
///
/// Block order matches document order in the input; callers map each block
/// back to a target namespace derived from that same block.
pub fn extract_documents(bytes: &[u8]) -> Result<Vec<Vec<u8>>, ManifestError> {
    super::observe("extract_documents", || {
        parse_documents(bytes)?
            .iter()
            .map(|document| encode_document(document).map(String::into_bytes))
            .collect()
    })
}

/// Recursively rebuild every mapping with its entries in key order.
fn sort_keys(value: &mut Value) {
    match value {
        Value::Mapping(mapping) => {
            let mut entries: Vec<(Value, Value)> = std::mem::take(mapping).into_iter().collect();
            entries.sort_by_key(|(key, _)| key_text(key));
            for (_, child) in &mut entries {
                sort_keys(child);
            }
            *mapping = entries.into_iter().collect();
        }
        Value::Sequence(sequence) => sequence.iter_mut().for_each(sort_keys),
        Value::Tagged(tagged) => sort_keys(&mut tagged.value),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

fn contains_yaml11_scalar(value: &Value) -> bool {
    match value {
        Value::String(s) => YAML11_NON_STRING.is_match(s),
        Value::Mapping(mapping) => mapping
            .iter()
            .any(|(key, child)| contains_yaml11_scalar(key) || contains_yaml11_scalar(child)),
        Value::Sequence(sequence) => sequence.iter().any(contains_yaml11_scalar),
        Value::Tagged(tagged) => contains_yaml11_scalar(&tagged.value),
        Value::Null | Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Swap every YAML 1.1 ambiguous string (keys included) for
/// `{marker}{index}__`, recording the original at `index`.
fn replace_yaml11_scalars(value: &mut Value, marker: &str, originals: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            if YAML11_NON_STRING.is_match(s) {
                let placeholder = format!("{marker}{}__", originals.len());
                originals.push(std::mem::replace(s, placeholder));
            }
        }
        Value::Mapping(mapping) => {
            let entries: Vec<(Value, Value)> = std::mem::take(mapping)
                .into_iter()
                .map(|(mut key, mut child)| {
                    replace_yaml11_scalars(&mut key, marker, originals);
                    replace_yaml11_scalars(&mut child, marker, originals);
                    (key, child)
                })
                .collect();
            *mapping = entries.into_iter().collect();
        }
        Value::Sequence(sequence) => {
            for item in sequence {
                replace_yaml11_scalars(item, marker, originals);
            }
        }
        Value::Tagged(tagged) => replace_yaml11_scalars(&mut tagged.value, marker, originals),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Text used to order mapping keys; non-string keys sort by their scalar form.
fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other).unwrap_or_default(),
    }
}
