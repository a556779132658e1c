//! # manifestctl CLI
//!
//! Command-line access to the manifest engine for operators and scripts.
//!
//! Every command reads a manifest from `--file` (or stdin) and writes its
//! result to stdout.
//!
//! ## Usage
//!
//! ```bash
//! # Label a stack deployment
//! manifestctl labels --stack-id 12 --name shop --owner alice --kind git -f app.yaml
//!
//! # Label a Helm release rendered with `helm template`
//! helm template my-release ./chart | manifestctl helm-labels --name my-release --owner alice
//!
//! # Overwrite existing container env values
//! manifestctl env --set LOG_LEVEL=debug -f app.yaml
//!
//! # List resources as JSON, only Deployments and Services
//! manifestctl resources --kind deployment --kind service --output json -f app.yaml
//! ```

use crate::manifest::{self, EnvPatchSet, LabelSet, ResourceRef};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::PathBuf;

/// Kubernetes manifest post-processing CLI
#[derive(Debug, Parser)]
#[command(name = "manifestctl")]
#[command(
    about = "Label, patch and inspect Kubernetes manifests",
    long_about = None,
    version = concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("BUILD_GIT_HASH"),
        ", built ",
        env!("BUILD_DATETIME"),
        ")"
    ),
    after_help = "\
Examples:
  manifestctl labels --stack-id 12 --name shop --owner alice --kind git -f app.yaml
  manifestctl env --set LOG_LEVEL=debug < app.yaml
  manifestctl resources --kind deployment --output json -f app.yaml
"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Manifest file to read (defaults to stdin)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Print Prometheus metrics to stderr after the command
    #[arg(long, global = true)]
    pub emit_metrics: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply stack ownership labels to every resource
    Labels {
        /// Numeric stack identifier
        #[arg(long)]
        stack_id: i64,
        /// Stack name (sanitized)
        #[arg(long)]
        name: String,
        /// Owner (sanitized)
        #[arg(long)]
        owner: String,
        /// Deployment kind, e.g. git, content, url
        #[arg(long)]
        kind: String,
    },
    /// Apply Helm release ownership labels to every resource
    HelmLabels {
        /// Release name
        #[arg(long)]
        name: String,
        /// Owner (sanitized)
        #[arg(long)]
        owner: String,
    },
    /// Apply an arbitrary label set to every resource
    Label {
        /// Label as key=value (repeatable)
        #[arg(short, long = "label", value_parser = parse_key_value, required = true)]
        labels: Vec<(String, String)>,
    },
    /// Overwrite values of existing container environment variables
    Env {
        /// Variable as NAME=value (repeatable)
        #[arg(short, long = "set", value_parser = parse_key_value, required = true)]
        vars: Vec<(String, String)>,
    },
    /// Re-encode every document canonically
    Split,
    /// Print the namespace of the first document
    Namespace,
    /// List (kind, name, namespace) of every document
    Resources {
        /// Only include these kinds (case-insensitive, repeatable)
        #[arg(short, long = "kind")]
        kinds: Vec<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
    /// List container images
    Images,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated lines
    Text,
    /// JSON array
    Json,
}

/// Parse `key=value`; the value may itself contain `=`.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

/// Read the manifest from `--file` or stdin.
pub fn read_input(cli: &Cli) -> Result<Vec<u8>> {
    match &cli.file {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("Failed to read manifest file: {}", path.display())),
        None => {
            let mut buffer = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read manifest from stdin")?;
            Ok(buffer)
        }
    }
}

/// Execute `command` against `input`, returning what should go to stdout.
pub fn run(command: &Commands, input: &[u8]) -> Result<Vec<u8>> {
    match command {
        Commands::Labels {
            stack_id,
            name,
            owner,
            kind,
        } => {
            let labels = manifest::application_labels(*stack_id, name, owner, kind);
            manifest::add_labels(input, &labels).context("Failed to apply stack labels")
        }
        Commands::HelmLabels { name, owner } => {
            let labels = manifest::helm_application_labels(name, owner);
            manifest::add_labels(input, &labels).context("Failed to apply Helm labels")
        }
        Commands::Label { labels } => {
            let labels: LabelSet = labels.iter().cloned().collect();
            manifest::add_labels(input, &labels).context("Failed to apply labels")
        }
        Commands::Env { vars } => {
            let patches: EnvPatchSet = vars.iter().cloned().collect();
            manifest::update_container_env(input, &patches)
                .context("Failed to update container env")
        }
        Commands::Split => {
            let documents = manifest::parse_documents(input).context("Failed to split manifest")?;
            manifest::join_documents(&documents).context("Failed to encode manifest")
        }
        Commands::Namespace => {
            let namespace =
                manifest::get_namespace(input).context("Failed to read manifest namespace")?;
            Ok(format!("{namespace}\n").into_bytes())
        }
        Commands::Resources { kinds, output } => {
            let kinds: Vec<&str> = kinds.iter().map(String::as_str).collect();
            let resources = manifest::get_resources_from_manifest(input, &kinds)
                .context("Failed to list manifest resources")?;
            render_resources(&resources, *output)
        }
        Commands::Images => {
            let images =
                manifest::get_images_from_manifest(input).context("Failed to list images")?;
            Ok(images
                .iter()
                .map(|image| format!("{image}\n"))
                .collect::<String>()
                .into_bytes())
        }
    }
}

fn render_resources(resources: &[ResourceRef], output: OutputFormat) -> Result<Vec<u8>> {
    match output {
        OutputFormat::Json => {
            let mut json = serde_json::to_vec_pretty(resources)
                .context("Failed to serialize resources as JSON")?;
            json.push(b'\n');
            Ok(json)
        }
        OutputFormat::Text => Ok(resources
            .iter()
            .map(|r| format!("{}\t{}\t{}\n", r.kind, r.name, r.namespace))
            .collect::<String>()
            .into_bytes()),
    }
}
