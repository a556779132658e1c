//! # Constants
//!
//! Shared constants used throughout the engine.
//!
//! The label keys are part of the external contract: consumers that need to
//! tell platform-managed resources apart match on these exact strings.

/// Label carrying the numeric stack identifier (rendered as decimal)
pub const STACK_ID_LABEL: &str = "io.portainer.kubernetes.application.stackid";

/// Label carrying the sanitized stack name
pub const STACK_NAME_LABEL: &str = "io.portainer.kubernetes.application.stack";

/// Label carrying the sanitized application name
pub const APPLICATION_NAME_LABEL: &str = "io.portainer.kubernetes.application.name";

/// Label carrying the sanitized owner
pub const APPLICATION_OWNER_LABEL: &str = "io.portainer.kubernetes.application.owner";

/// Label carrying the deployment kind (git, content, url, ...)
pub const APPLICATION_KIND_LABEL: &str = "io.portainer.kubernetes.application.kind";

/// Separator written between consecutive documents when re-encoding
pub const DOCUMENT_SEPARATOR: &str = "---\n";

/// Aggregate marker kind; maps with this kind are containers, not resources
pub const LIST_KIND: &str = "list";

/// Kind whose own `metadata.name` is treated as the namespace
pub const NAMESPACE_KIND: &str = "Namespace";

/// Default global log level
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

/// Default log format (text, json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Default tracing filter target when neither `RUST_LOG` nor `LOG_LEVEL` applies
pub const DEFAULT_LOG_TARGET: &str = "manifest_engine";

/// Tracing target of events emitted by the `manifestctl` binary itself
pub const BINARY_LOG_TARGET: &str = "manifestctl";
