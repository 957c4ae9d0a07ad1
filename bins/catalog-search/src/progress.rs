//! Progress indicators
//!
//! Spinners for corpus loads. indicatif hides them when stderr is not a
//! terminal.

use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;

/// Create a spinner for indeterminate progress
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Await `future` behind a spinner, clearing it afterwards
pub async fn with_spinner<F: Future>(show: bool, message: &str, future: F) -> F::Output {
    let pb = if show { spinner(message) } else { ProgressBar::hidden() };
    let output = future.await;
    pb.finish_and_clear();
    output
}
