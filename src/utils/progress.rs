//! Plane progress reporting
//!
//! Writers report the percentage of planes written through a callback; the
//! command line tool renders it with an `indicatif` bar.

use indicatif::{ProgressBar, ProgressStyle};

/// Called with the percentage (0..=100) of planes written
pub type ProgressCallback = Box<dyn FnMut(u32) + Send>;

/// Percentage of `done` out of `total` planes
pub fn percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    (100 * done.min(total) / total) as u32
}

/// Terminal progress bar counting percent
pub struct ProgressTracker {
    bar: ProgressBar,
}

impl ProgressTracker {
    pub fn new(description: &str) -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        bar.set_message(description.to_string());

        ProgressTracker { bar }
    }

    /// Hidden bar, for quiet runs
    pub fn hidden() -> Self {
        ProgressTracker {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn set_percent(&self, value: u32) {
        self.bar.set_position(value.min(100) as u64);
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Completed");
    }

    /// Callback that moves this bar
    pub fn callback(&self) -> ProgressCallback {
        let bar = self.bar.clone();
        Box::new(move |value| bar.set_position(value.min(100) as u64))
    }
}
