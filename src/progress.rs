//! Spinner feedback for slow cluster stages.
//!
//! Spinners draw to stderr, so `up --json` keeps stdout machine-readable.
//! indicatif hides them when stderr is not a terminal.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// One named step shown as a spinner until it is finished.
pub struct Stage {
    bar: ProgressBar,
}

impl Stage {
    pub fn start(message: impl Into<String>) -> Self {
        Self::on(ProgressBar::new_spinner(), message)
    }

    fn on(bar: ProgressBar, message: impl Into<String>) -> Self {
        let style = ProgressStyle::default_spinner()
            .tick_strings(TICKS)
            .template("{spinner} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    /// Stop the spinner and mark the step passed or failed.
    pub fn finish(self, passed: bool) {
        let mark = if passed { "✓" } else { "✗" };
        self.bar.finish_with_message(format!("{mark} {}", self.bar.message()));
    }
}

/// Await `work` behind a spinner and mark the stage with its outcome.
pub async fn staged<T, E>(
    message: impl Into<String>,
    work: impl Future<Output = Result<T, E>>,
) -> Result<T, E> {
    let stage = Stage::start(message);
    let result = work.await;
    stage.finish(result.is_ok());
    result
}
