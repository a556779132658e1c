//! # Env-Var Patcher
//!
//! Overwrites the `value` of container environment variables that already
//! exist. Variables are never appended.

use crate::manifest::error::ManifestError;
use serde_yaml::Value;
use std::collections::BTreeMap;
use tracing::trace;

/// Environment variable name to replacement value
pub type EnvPatchSet = BTreeMap<String, String>;

/// Patch container env values in every document of `manifest`.
///
/// Any map with a `containers` sequence is visited, at any depth, so pod
/// templates nested in workloads are reached. Unexpected shapes (no `env`,
/// `containers` not a sequence, ...) are left alone. Empty input is returned
/// as-is.
pub fn update_container_env(
    manifest: &[u8],
    patches: &EnvPatchSet,
) -> Result<Vec<u8>, ManifestError> {
    super::rewrite_manifest("update_container_env", manifest, |document| {
        patch_containers(document, patches);
    })
}

pub(crate) fn patch_containers(value: &mut Value, patches: &EnvPatchSet) {
    let Value::Mapping(mapping) = value else {
        return;
    };

    if let Some(Value::Sequence(containers)) = mapping.get_mut("containers") {
        for container in containers.iter_mut() {
            patch_container_env(container, patches);
        }
    }

    for (_, child) in mapping.iter_mut() {
        if child.is_mapping() {
            patch_containers(child, patches);
        }
    }
}

fn patch_container_env(container: &mut Value, patches: &EnvPatchSet) {
    let Some(Value::Sequence(env)) = container.get_mut("env") else {
        return;
    };

    for entry in env.iter_mut() {
        let Value::Mapping(variable) = entry else {
            continue;
        };
        let Some(replacement) = variable
            .get("name")
            .and_then(Value::as_str)
            .and_then(|name| patches.get(name))
        else {
            continue;
        };

        trace!("Overwriting container env value");
        variable.insert(Value::from("value"), Value::from(replacement.as_str()));
    }
}
