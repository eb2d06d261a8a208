// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Turns a verb and resource reference into a concrete lookup target.
//!
//! Supported reference spellings:
//! - `<type>/<name>`: `pods/web-0`, `deploy/api`, `deploy.apps/api`
//! - `<type> <name>`: `pods web-0`
//! - bare pod names for `logs` and `port-forward`

use tracing::debug;

use crate::error::{AutonsError, Result};
use crate::kubernetes::discovery::{ResourceCatalog, ResourceDescriptor};

const LOGS_VERB: &str = "logs";
const PORT_FORWARD_VERB: &str = "port-forward";

/// Resource that `logs` and `port-forward` address by default
const PODS: &str = "pods";

/// A resource kind plus the instance name to look for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReference {
    pub resource: ResourceDescriptor,
    pub name: String,
}

/// Resolve the target of a command
///
/// `instance` is the positional following `token`, if any.
pub fn resolve_target(
    verb: &str,
    token: &str,
    instance: Option<&str>,
    catalog: &ResourceCatalog,
) -> Result<TargetReference> {
    let target = match verb {
        LOGS_VERB => {
            let name = token
                .strip_prefix("pod/")
                .or_else(|| token.strip_prefix("pods/"))
                .unwrap_or(token);
            pod_target(name, token, catalog)?
        }
        PORT_FORWARD_VERB => match split_reference(token) {
            Some((alias, name)) if catalog.lookup(alias).is_some() => {
                typed_target(alias, name, catalog)?
            }
            _ => pod_target(token, token, catalog)?,
        },
        _ => match token.split_once('/') {
            Some(_) => {
                let (alias, name) = split_reference(token).ok_or_else(|| {
                    AutonsError::MalformedToken {
                        token: token.to_string(),
                    }
                })?;
                typed_target(alias, name, catalog)?
            }
            None => {
                let name = instance.ok_or_else(|| {
                    AutonsError::Usage(format!(
                        "missing name for resource type '{}', e.g. `autons {} {} <name>`",
                        token, verb, token
                    ))
                })?;
                typed_target(token, name, catalog)?
            }
        },
    };

    debug!(
        verb = %verb,
        resource = %target.resource.name,
        name = %target.name,
        "Resolved target"
    );
    Ok(target)
}

/// Split `<alias>/<name>` at the first slash; both halves must be non-empty
fn split_reference(token: &str) -> Option<(&str, &str)> {
    token
        .split_once('/')
        .filter(|(alias, name)| !alias.is_empty() && !name.is_empty())
}

fn typed_target(alias: &str, name: &str, catalog: &ResourceCatalog) -> Result<TargetReference> {
    let resource = catalog
        .lookup(alias)
        .ok_or_else(|| AutonsError::UnknownResource {
            alias: alias.to_string(),
        })?;
    Ok(TargetReference {
        resource,
        name: name.to_string(),
    })
}

fn pod_target(name: &str, token: &str, catalog: &ResourceCatalog) -> Result<TargetReference> {
    if name.is_empty() {
        return Err(AutonsError::MalformedToken {
            token: token.to_string(),
        });
    }
    typed_target(PODS, name, catalog)
}
