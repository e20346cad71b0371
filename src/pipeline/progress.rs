//! Progress reporting for backup and restore
//!
//! One spinner per collection showing the running document count and rate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress tracker for one collection
pub struct ProgressTracker {
    /// Number of documents processed so far
    processed: AtomicU64,
    /// Start time of the operation
    start_time: Instant,
    /// Spinner (None when progress output is disabled)
    bar: Option<ProgressBar>,
}

impl ProgressTracker {
    /// Create a new progress tracker
    ///
    /// # Arguments
    /// * `label` - Prefix shown before the count, usually the collection name
    /// * `enable_bar` - Whether to draw a spinner
    pub fn new(label: &str, enable_bar: bool) -> Self {
        let bar = enable_bar.then(|| {
            let bar = ProgressBar::new_spinner();
            let style = ProgressStyle::default_spinner()
                .template("{spinner:.green} {prefix}: {pos} documents {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            bar.set_style(style);
            bar.set_prefix(label.to_string());
            bar
        });

        Self {
            processed: AtomicU64::new(0),
            start_time: Instant::now(),
            bar,
        }
    }

    /// Add `count` documents to the running total
    pub fn advance(&self, count: u64) {
        let total = self.processed.fetch_add(count, Ordering::Relaxed) + count;

        if let Some(ref bar) = self.bar {
            bar.set_position(total);

            let elapsed = self.start_time.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                let speed = total as f64 / elapsed;
                bar.set_message(format!("({:.0} docs/sec)", speed));
            }
        }
    }

    /// Documents processed so far
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Finish and clear the spinner
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_counts_without_bar() {
        let tracker = ProgressTracker::new("users", false);
        tracker.advance(1000);
        tracker.advance(1);
        assert_eq!(tracker.processed(), 1001);
        tracker.finish();
    }

    #[test]
    fn test_progress_with_hidden_bar() {
        let tracker = ProgressTracker::new("orders", true);
        tracker.advance(3);
        assert_eq!(tracker.processed(), 3);
        tracker.finish();
    }
}
