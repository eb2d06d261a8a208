// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

mod cli;
pub mod config;
mod dispatch;
mod error;
mod kubernetes;
mod namespace;
pub mod progress;
mod target;

use clap::Parser;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::prelude::*;

use cli::{Args, Invocation};
use config::{Config, Settings};
use dispatch::{Dispatcher, ProcessExecutor};
use error::{AutonsError, Result};
use kubernetes::KubeClient;

/// Initialize logging to stderr
///
/// Quiet by default so the delegated command's output is all the user sees.
fn init_logging(verbose: bool) {
    let filter = if verbose { "autons=debug" } else { "autons=warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}

/// Exit status byte for a delegated exit code; out of range codes become 1
fn exit_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    // Install rustls crypto provider (ring); an already installed one is fine
    let _ = rustls::crypto::ring::default_provider().install_default();

    match run(args).await {
        Ok(code) => ExitCode::from(exit_byte(code)),
        Err(e) => {
            eprintln!("autons: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: Args) -> Result<i32> {
    let settings = Config::load()
        .and_then(|config| Settings::resolve(&args, config))
        .map_err(AutonsError::Config)?;
    debug!(kubectl = %settings.kubectl, timeout_secs = settings.request_timeout.as_secs(), "Settings");

    let invocation = Invocation::new(args.command);
    let client = KubeClient::new(invocation.cluster_access(), settings.request_timeout);
    let executor = ProcessExecutor::new(settings.kubectl);

    let spinner = progress::spinner_for(args.verbose, "Connecting to Kubernetes...");
    Dispatcher::new(&client, &executor)
        .with_progress(spinner)
        .dispatch(invocation)
        .await
}
