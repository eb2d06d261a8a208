// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! The kubectl argument vector as captured from the command line.
//!
//! Only the leading positionals and a handful of flags matter here; everything
//! else belongs to kubectl and is forwarded untouched.

use std::path::PathBuf;

use crate::error::{AutonsError, Result};
use crate::kubernetes::ClusterAccess;

/// Flags that pin the namespace (or all namespaces) explicitly
const NAMESPACE_FLAGS: &[&str] = &["-n", "--namespace", "-A", "--all-namespaces"];

/// Arguments after this marker belong to the command run inside a container
const END_OF_FLAGS: &str = "--";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    argv: Vec<String>,
}

impl Invocation {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    /// The full vector as it will be handed to kubectl
    #[cfg(test)]
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn into_argv(self) -> Vec<String> {
        self.argv
    }

    /// kubectl arguments, up to the end-of-flags marker
    fn kubectl_args(&self) -> impl Iterator<Item = &str> {
        self.argv
            .iter()
            .map(String::as_str)
            .take_while(|arg| *arg != END_OF_FLAGS)
    }

    pub fn verb(&self) -> Result<&str> {
        match self.argv.first() {
            Some(verb) if !verb.starts_with('-') => Ok(verb.as_str()),
            _ => Err(AutonsError::Usage("missing kubectl verb".to_string())),
        }
    }

    /// The word right after the verb
    pub fn resource_token(&self) -> Result<&str> {
        match self.argv.get(1) {
            Some(token) if !token.starts_with('-') => Ok(token.as_str()),
            Some(_) => Err(AutonsError::Usage(
                "the resource reference must directly follow the verb".to_string(),
            )),
            None => Err(AutonsError::Usage("missing resource reference".to_string())),
        }
    }

    /// The positional after the resource token, when it is not a flag
    pub fn instance_name(&self) -> Option<&str> {
        self.argv
            .get(2)
            .map(String::as_str)
            .filter(|arg| !arg.starts_with('-') && *arg != END_OF_FLAGS)
    }

    /// Whether the caller already chose a namespace (or all of them)
    pub fn has_namespace_flag(&self) -> bool {
        self.kubectl_args().any(|arg| {
            NAMESPACE_FLAGS.iter().any(|flag| {
                arg == *flag
                    || arg
                        .strip_prefix(flag)
                        .is_some_and(|rest| rest.starts_with('=') || is_attached_short(flag, rest))
            })
        })
    }

    /// Value of a long kubectl flag given as `--flag value` or `--flag=value`
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        let mut args = self.kubectl_args();
        while let Some(arg) = args.next() {
            if arg == flag {
                return args.next();
            }
            if let Some(value) = arg.strip_prefix(flag).and_then(|rest| rest.strip_prefix('=')) {
                return Some(value);
            }
        }
        None
    }

    /// Cluster selection matching what kubectl itself will use
    pub fn cluster_access(&self) -> ClusterAccess {
        ClusterAccess {
            context: self.flag_value("--context").map(String::from),
            kubeconfig: self.flag_value("--kubeconfig").map(PathBuf::from),
        }
    }

    /// Append `--namespace <namespace>`
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.argv.push("--namespace".to_string());
        self.argv.push(namespace.to_string());
        self
    }
}

/// `-nprod` style: a short flag with its value attached
fn is_attached_short(flag: &str, rest: &str) -> bool {
    flag == "-n" && !rest.is_empty()
}
