// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Ties the resolution stages together and hands the final argument vector
//! to kubectl.

use async_trait::async_trait;
use indicatif::ProgressBar;
use std::process::ExitStatus;
use tracing::{debug, info};

use crate::cli::Invocation;
use crate::error::{AutonsError, Result};
use crate::kubernetes::ObjectLister;
use crate::kubernetes::discovery::{self, ClusterDiscovery};
use crate::namespace::{self, Resolution};
use crate::target;

/// Runs the delegated command with inherited stdio
#[async_trait]
pub trait CommandExecutor: Sync {
    /// Run to completion and return its exit code
    async fn execute(&self, args: &[String]) -> Result<i32>;
}

/// Executes an external program, kubectl by default
pub struct ProcessExecutor {
    program: String,
}

impl ProcessExecutor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, args: &[String]) -> Result<i32> {
        debug!(program = %self.program, args = ?args, "Executing");
        let status = tokio::process::Command::new(&self.program)
            .args(args)
            .status()
            .await
            .map_err(|source| AutonsError::Exec {
                program: self.program.clone(),
                source,
            })?;
        Ok(exit_code(status))
    }
}

/// Exit code of a finished process; 128 + signal when it was killed
fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    status.code().unwrap_or(1)
}

/// Cluster-side collaborators needed for resolution
pub trait Cluster: ClusterDiscovery + ObjectLister {}

impl<T: ClusterDiscovery + ObjectLister> Cluster for T {}

pub struct Dispatcher<'a> {
    cluster: &'a dyn Cluster,
    executor: &'a dyn CommandExecutor,
    progress: ProgressBar,
}

impl<'a> Dispatcher<'a> {
    pub fn new(cluster: &'a dyn Cluster, executor: &'a dyn CommandExecutor) -> Self {
        Self {
            cluster,
            executor,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report resolution phases on this progress bar
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Resolve the namespace the invocation refers to
    pub async fn resolve(&self, invocation: &Invocation) -> Result<Resolution> {
        let verb = invocation.verb()?;
        let token = invocation.resource_token()?;

        self.progress.set_message("Discovering cluster resources...");
        let catalog = discovery::discover(self.cluster).await?;

        let target =
            target::resolve_target(verb, token, invocation.instance_name(), &catalog)?;

        self.progress
            .set_message(format!("Searching {} for '{}'...", target.resource.name, target.name));
        namespace::resolve_namespace(self.cluster, &target).await
    }

    /// Run the invocation, adding `--namespace` when the caller did not pin one
    ///
    /// Returns the delegated command's exit code.
    pub async fn dispatch(&self, invocation: Invocation) -> Result<i32> {
        let argv = if invocation.has_namespace_flag() {
            info!("Namespace given explicitly, passing arguments through");
            invocation.into_argv()
        } else {
            let resolution = self.resolve(&invocation).await;
            self.progress.finish_and_clear();
            let invocation = match resolution? {
                Resolution::Namespace(namespace) => invocation.with_namespace(&namespace),
                Resolution::ClusterScoped => invocation,
            };
            invocation.into_argv()
        };

        self.progress.finish_and_clear();
        let code = self.executor.execute(&argv).await?;
        if code != 0 {
            debug!(code, "Delegated command failed");
        }
        Ok(code)
    }
}
