// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Spinner shown on stderr while the namespace is being resolved.
//!
//! Nothing is drawn when stderr is not a terminal, so piped output of the
//! delegated command stays clean.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";
const TICK_INTERVAL: Duration = Duration::from_millis(80);

/// Create a spinner with consistent styling
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(TICK_INTERVAL);
    pb
}

/// Spinner for this run: hidden when verbose logs already go to stderr
pub fn spinner_for(verbose: bool, msg: &str) -> ProgressBar {
    if verbose {
        ProgressBar::hidden()
    } else {
        create_spinner(msg)
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars(TICK_CHARS)
        .template("{spinner:.cyan} {msg} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
