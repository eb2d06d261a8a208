// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Error type shared by every resolution stage.
//!
//! Nothing below `main` terminates the process. Each stage returns an
//! [`AutonsError`] and the top-level handler turns it into a message on stderr
//! and an exit code.

use std::time::Duration;
use thiserror::Error;

/// Accepted spellings of a resource reference, shown with parse errors
pub const ACCEPTED_FORMATS: &str = "expected <resource-type>/<name> or <resource-type> <name>, \
     e.g. `autons get pods/web-0` or `autons get pods web-0`";

pub type Result<T, E = AutonsError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AutonsError {
    #[error("{0}\nusage: autons <verb> <resource-type>/<name> [flags...]\n       autons <verb> <resource-type> <name> [flags...]")]
    Usage(String),

    #[error("malformed resource reference '{token}': {ACCEPTED_FORMATS}")]
    MalformedToken { token: String },

    #[error("unknown resource type '{alias}': {ACCEPTED_FORMATS}")]
    UnknownResource { alias: String },

    #[error("{0:#}")]
    Config(anyhow::Error),

    #[error("failed to discover cluster resources: {0:#}")]
    Discovery(anyhow::Error),

    #[error("failed to list {resource}: {source:#}")]
    Listing {
        resource: String,
        source: anyhow::Error,
    },

    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout { operation: String, after: Duration },

    #[error("no {kind} named '{name}' found in any namespace")]
    NotFound { kind: String, name: String },

    #[error(
        "{kind} '{name}' exists in multiple namespaces ({}), please specify one with --namespace",
        .namespaces.join(", ")
    )]
    Ambiguous {
        kind: String,
        name: String,
        namespaces: Vec<String>,
    },

    #[error("failed to run {program}: {source}")]
    Exec {
        program: String,
        source: std::io::Error,
    },
}

impl AutonsError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            AutonsError::Usage(_)
            | AutonsError::MalformedToken { .. }
            | AutonsError::UnknownResource { .. } => 2,
            AutonsError::Exec { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                127
            }
            _ => 1,
        }
    }
}
