//! Progress reporting utilities

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Records between spinner message updates
const UPDATE_INTERVAL: u64 = 10_000;

/// Spinner shown on stderr while inputs are staged and compared
#[derive(Debug)]
pub struct ProgressReporter {
    spinner: Option<ProgressBar>,
}

impl ProgressReporter {
    pub fn new(show_progress: bool) -> Self {
        let spinner = show_progress.then(|| create_spinner("Staging inputs..."));
        Self { spinner }
    }

    pub fn set_phase(&self, message: &str) {
        if let Some(pb) = &self.spinner {
            pb.set_message(message.to_string());
        }
    }

    /// Report the number of records produced so far
    pub fn records(&self, count: u64) {
        if count % UPDATE_INTERVAL == 0 {
            if let Some(pb) = &self.spinner {
                pb.set_message(format!("Compared {count} records..."));
            }
        }
    }

    pub fn finish(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Create a spinner progress bar
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.green} {msg}")
            .expect("Invalid progress template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
