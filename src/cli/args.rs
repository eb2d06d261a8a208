// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "autons")]
#[command(
    author,
    version,
    about = "Run kubectl commands without knowing which namespace a resource lives in",
    after_help = "Options are only recognized before <VERB>; everything after it is passed to kubectl.\n\
                  Examples:\n  autons logs pod/web-7f9 -f\n  autons get deploy api -o yaml\n  autons port-forward svc/db 5432"
)]
pub struct Args {
    /// kubectl executable to delegate to
    #[arg(long, value_name = "PATH", env = "AUTONS_KUBECTL")]
    pub kubectl: Option<String>,

    /// Timeout in seconds for each Kubernetes API call
    #[arg(long, value_name = "SECS", env = "AUTONS_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// kubectl verb, resource reference and any further kubectl arguments
    #[arg(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}
