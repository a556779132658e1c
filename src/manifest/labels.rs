//! # Resource Locator + Label Merger
//!
//! Finds resource maps (a `kind` that is not `List`) anywhere in a document
//! and merges a label set into their `metadata.labels`.
//!
//! Recursion stops at a matched resource: nested pod templates are not
//! relabelled. Maps without a resource `kind`, including `List` aggregates,
//! are searched through their mapping and sequence children.

use crate::constants::{
    APPLICATION_KIND_LABEL, APPLICATION_NAME_LABEL, APPLICATION_OWNER_LABEL, LIST_KIND,
    STACK_ID_LABEL, STACK_NAME_LABEL,
};
use crate::manifest::error::ManifestError;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::trace;

/// Label key to label value
pub type LabelSet = BTreeMap<String, String>;

static INVALID_LABEL_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9._-]+")
        .expect("Failed to compile label sanitization regex - this should never happen")
});

/// Merge `labels` into every resource of every document in `manifest`.
///
/// Existing labels not named in `labels` are kept; colliding keys are
/// overwritten. Empty input is returned as-is.
pub fn add_labels(manifest: &[u8], labels: &LabelSet) -> Result<Vec<u8>, ManifestError> {
    super::rewrite_manifest("add_labels", manifest, |document| {
        label_resources(document, labels);
    })
}

/// Normalize free text for use as a label value.
///
/// Runs of characters outside `[A-Za-z0-9._-]` become a single `.`, then
/// leading and trailing `.`, `-` and `_` are trimmed.
pub fn sanitize_label_value(value: &str) -> String {
    INVALID_LABEL_CHARS
        .replace_all(value, ".")
        .trim_matches(|c| c == '.' || c == '-' || c == '_')
        .to_string()
}

/// Labels for an application deployed from a stack.
pub fn application_labels(stack_id: i64, stack_name: &str, owner: &str, kind: &str) -> LabelSet {
    let name = sanitize_label_value(stack_name);
    LabelSet::from([
        (STACK_ID_LABEL.to_string(), stack_id.to_string()),
        (STACK_NAME_LABEL.to_string(), name.clone()),
        (APPLICATION_NAME_LABEL.to_string(), name),
        (APPLICATION_OWNER_LABEL.to_string(), sanitize_label_value(owner)),
        (APPLICATION_KIND_LABEL.to_string(), kind.to_string()),
    ])
}

/// Labels for an application deployed as a Helm release.
///
/// Helm releases are not stacks, so only name and owner are set.
pub fn helm_application_labels(name: &str, owner: &str) -> LabelSet {
    LabelSet::from([
        (APPLICATION_NAME_LABEL.to_string(), name.to_string()),
        (APPLICATION_OWNER_LABEL.to_string(), sanitize_label_value(owner)),
    ])
}

/// Walk `value` and merge `labels` into each resource found.
pub(crate) fn label_resources(value: &mut Value, labels: &LabelSet) {
    match value {
        Value::Mapping(mapping) => {
            if is_resource(mapping) {
                merge_labels(mapping, labels);
                return;
            }
            for (_, child) in mapping.iter_mut() {
                if child.is_mapping() || child.is_sequence() {
                    label_resources(child, labels);
                }
            }
        }
        Value::Sequence(sequence) => {
            for item in sequence {
                label_resources(item, labels);
            }
        }
        Value::Tagged(tagged) => label_resources(&mut tagged.value, labels),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

/// A resource is a map whose string `kind` is not the `List` marker.
fn is_resource(mapping: &Mapping) -> bool {
    mapping
        .get("kind")
        .and_then(Value::as_str)
        .is_some_and(|kind| !kind.eq_ignore_ascii_case(LIST_KIND))
}

fn merge_labels(resource: &mut Mapping, labels: &LabelSet) {
    let kind = resource
        .get("kind")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let Some(existing) =
        child_mapping(resource, "metadata").and_then(|metadata| child_mapping(metadata, "labels"))
    else {
        return;
    };

    for (key, value) in labels {
        existing.insert(Value::from(key.as_str()), Value::from(value.as_str()));
    }

    trace!(kind = %kind, "Merged {} labels into resource", labels.len());
}

/// Mutable access to `parent[key]` as a mapping, replacing any other shape
/// (absent, null, scalar) with an empty mapping first.
fn child_mapping<'a>(parent: &'a mut Mapping, key: &str) -> Option<&'a mut Mapping> {
    let slot = parent.entry(Value::from(key)).or_insert(Value::Null);
    if !slot.is_mapping() {
        *slot = Value::Mapping(Mapping::new());
    }
    slot.as_mapping_mut()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::document::parse_documents;

    fn labels_of(document: &Value) -> &Mapping {
        document["metadata"]["labels"]
            .as_mapping()
            .expect("labels should be a mapping")
    }

    fn sample_labels() -> LabelSet {
        application_labels(123, "best-name", "best-owner", "git")
    }

    #[test]
    fn test_sanitize_label_value() {
        assert_eq!(sanitize_label_value("best-name"), "best-name");
        assert_eq!(sanitize_label_value("my stack"), "my.stack");
        assert_eq!(sanitize_label_value("a  b!!c"), "a.b.c");
        assert_eq!(sanitize_label_value("  -_admin@example.com_- "), "admin.example.com");
        assert_eq!(sanitize_label_value("...x..."), "x");
        assert_eq!(sanitize_label_value("!!!"), "");
    }

    #[test]
    fn test_application_labels() {
        let labels = application_labels(123, "best name", "Best Owner!", "git");
        assert_eq!(labels.len(), 5);
        assert_eq!(labels[STACK_ID_LABEL], "123");
        assert_eq!(labels[STACK_NAME_LABEL], "best.name");
        assert_eq!(labels[APPLICATION_NAME_LABEL], "best.name");
        assert_eq!(labels[APPLICATION_OWNER_LABEL], "Best.Owner");
        assert_eq!(labels[APPLICATION_KIND_LABEL], "git");
    }

    #[test]
    fn test_application_labels_kind_is_not_sanitized() {
        let labels = application_labels(1, "n", "o", "web editor");
        assert_eq!(labels[APPLICATION_KIND_LABEL], "web editor");
    }

    #[test]
    fn test_helm_application_labels() {
        let labels = helm_application_labels("my-release", "jane doe");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[APPLICATION_NAME_LABEL], "my-release");
        assert_eq!(labels[APPLICATION_OWNER_LABEL], "jane.doe");
        assert!(!labels.contains_key(STACK_ID_LABEL));
        assert!(!labels.contains_key(APPLICATION_KIND_LABEL));
    }

    #[test]
    fn test_add_labels_empty_input() {
        let output = add_labels(b"", &sample_labels()).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_add_labels_deployment_without_labels() {
        let input = r"apiVersion: apps/v1
kind: Deployment
metadata:
  name: busybox
spec:
  replicas: 3
  selector:
    matchLabels:
      app: busybox
  template:
    metadata:
      labels:
        app: busybox
    spec:
      containers:
      - image: busybox
        name: busybox
";
        let expected = r"apiVersion: apps/v1
kind: Deployment
metadata:
  labels:
    io.portainer.kubernetes.application.kind: git
    io.portainer.kubernetes.application.name: best-name
    io.portainer.kubernetes.application.owner: best-owner
    io.portainer.kubernetes.application.stack: best-name
    io.portainer.kubernetes.application.stackid: '123'
  name: busybox
spec:
  replicas: 3
  selector:
    matchLabels:
      app: busybox
  template:
    metadata:
      labels:
        app: busybox
    spec:
      containers:
      - image: busybox
        name: busybox
";
        let output = add_labels(input.as_bytes(), &sample_labels()).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), expected);
    }

    #[test]
    fn test_add_labels_preserves_unrelated_labels_and_overwrites_collisions() {
        let input = format!(
            "kind: Service\nmetadata:\n  name: web\n  labels:\n    app: web\n    {APPLICATION_OWNER_LABEL}: someone-else\n"
        );
        let output = add_labels(input.as_bytes(), &sample_labels()).unwrap();
        let documents = parse_documents(&output).unwrap();
        let labels = labels_of(&documents[0]);

        assert_eq!(labels.get("app"), Some(&Value::from("web")));
        assert_eq!(
            labels.get(APPLICATION_OWNER_LABEL),
            Some(&Value::from("best-owner"))
        );
        assert_eq!(labels.len(), 6);
    }

    #[test]
    fn test_add_labels_null_labels_field() {
        let input = "kind: Pod\nmetadata:\n  name: p\n  labels:\n";
        let output = add_labels(input.as_bytes(), &sample_labels()).unwrap();
        let documents = parse_documents(&output).unwrap();
        assert_eq!(labels_of(&documents[0]).len(), 5);
    }

    #[test]
    fn test_add_labels_replaces_scalar_metadata() {
        let input = "kind: ConfigMap\nmetadata: just-a-string\ndata:\n  a: b\n";
        let output = add_labels(input.as_bytes(), &sample_labels()).unwrap();
        let documents = parse_documents(&output).unwrap();

        assert_eq!(labels_of(&documents[0]).len(), 5);
        assert_eq!(documents[0]["data"]["a"], Value::from("b"));
    }

    #[test]
    fn test_add_labels_with_trace_logging_enabled() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .finish();

        let output = tracing::subscriber::with_default(subscriber, || {
            add_labels(b"kind: Secret\nmetadata:\n  name: s\n", &sample_labels())
        })
        .unwrap();

        let documents = parse_documents(&output).unwrap();
        assert_eq!(documents[0]["kind"], Value::from("Secret"));
        assert_eq!(labels_of(&documents[0]).len(), 5);
    }

    #[test]
    fn test_add_labels_does_not_descend_into_resource() {
        let input = r"kind: Deployment
metadata:
  name: web
spec:
  template:
    kind: Pod
    metadata:
      labels:
        app: web
";
        let output = add_labels(input.as_bytes(), &sample_labels()).unwrap();
        let documents = parse_documents(&output).unwrap();
        let template_labels = documents[0]["spec"]["template"]["metadata"]["labels"]
            .as_mapping()
            .unwrap();
        assert_eq!(template_labels.len(), 1);
        assert_eq!(labels_of(&documents[0]).len(), 5);
    }

    #[test]
    fn test_add_labels_list_kind_labels_every_item() {
        let input = r"apiVersion: v1
kind: List
items:
- apiVersion: v1
  kind: Service
  metadata:
    name: one
- apiVersion: v1
  kind: ConfigMap
  metadata:
    name: two
    labels:
      keep: me
- apiVersion: apps/v1
  kind: Deployment
  metadata:
    name: three
";
        let output = add_labels(input.as_bytes(), &sample_labels()).unwrap();
        let documents = parse_documents(&output).unwrap();
        let list = &documents[0];

        assert!(list.get("metadata").is_none());
        let items = list["items"].as_sequence().unwrap();
        assert_eq!(items.len(), 3);
        for item in items {
            let labels = labels_of(item);
            assert_eq!(labels.get(STACK_ID_LABEL), Some(&Value::from("123")));
        }
        assert_eq!(labels_of(&items[1]).get("keep"), Some(&Value::from("me")));
    }

    #[test]
    fn test_add_labels_list_kind_is_case_insensitive() {
        let input = "kind: LIST\nitems:\n- kind: Secret\n  metadata:\n    name: s\n";
        let output = add_labels(input.as_bytes(), &sample_labels()).unwrap();
        let documents = parse_documents(&output).unwrap();
        assert!(documents[0].get("metadata").is_none());
        assert_eq!(labels_of(&documents[0]["items"][0]).len(), 5);
    }

    #[test]
    fn test_add_labels_document_without_kind_reaches_nested_resources() {
        let input = "wrapper:\n  inner:\n    kind: ConfigMap\n    metadata:\n      name: c\n";
        let output = add_labels(input.as_bytes(), &sample_labels()).unwrap();
        let documents = parse_documents(&output).unwrap();
        assert!(documents[0].get("metadata").is_none());
        assert_eq!(labels_of(&documents[0]["wrapper"]["inner"]).len(), 5);
    }

    #[test]
    fn test_add_labels_multiple_documents() {
        let input = "kind: Service\nmetadata:\n  name: a\n---\nkind: Secret\nmetadata:\n  name: b\n";
        let output = String::from_utf8(add_labels(input.as_bytes(), &sample_labels()).unwrap())
            .unwrap();
        assert_eq!(output.matches("---\n").count(), 1);
        let documents = parse_documents(output.as_bytes()).unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[1]["metadata"]["name"], Value::from("b"));
        assert_eq!(labels_of(&documents[1]).len(), 5);
    }

    #[test]
    fn test_add_labels_is_idempotent() {
        let input = "kind: Service\nmetadata:\n  name: a\n  labels:\n    x: y\n---\nkind: List\nitems:\n- kind: Pod\n  metadata:\n    name: p\n";
        let once = add_labels(input.as_bytes(), &sample_labels()).unwrap();
        let twice = add_labels(&once, &sample_labels()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_add_labels_malformed_input() {
        let err = add_labels(b"kind: [Service\n", &sample_labels()).unwrap_err();
        assert!(err.is_decode());
    }
}
