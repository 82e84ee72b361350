//! Injected progress reporting, so the core never talks to a terminal
//! directly.
//!
//! Grounded on `git-branchless-lib`'s `core::effects::Effects`, simplified
//! down to the two shapes `huge-lib` actually needs: a byte/file counter
//! (hashing) and an item counter (blob transfer).

use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

/// A sink for progress updates emitted by long-running operations
/// (`spec.md` §4.1, §5 design notes "Progress reporting").
pub trait ProgressReporter: Send + Sync {
    /// Update the running total of bytes processed and the file count.
    fn report_hashing(&self, bytes: u64, files: u64);

    /// Update the running total of items transferred out of some total.
    fn report_transfer(&self, done: u64, total: u64, label: &str);

    /// Called once the operation completes, so a terminal implementation
    /// can clear its progress bar.
    fn finish(&self);
}

/// A reporter that does nothing. Used by default and by all tests.
#[derive(Debug, Default)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report_hashing(&self, _bytes: u64, _files: u64) {}
    fn report_transfer(&self, _done: u64, _total: u64, _label: &str) {}
    fn finish(&self) {}
}

/// A reporter backed by an `indicatif` spinner, for interactive terminal use.
pub struct TerminalProgress {
    bar: ProgressBar,
    last_tick: AtomicU64,
}

impl TerminalProgress {
    /// Create a new terminal progress reporter writing to stderr.
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self {
            bar,
            last_tick: AtomicU64::new(0),
        }
    }

    fn should_tick(&self) -> bool {
        // Matches the original's ~0.5s throttle on hashing progress prints.
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let last = self.last_tick.swap(now, Ordering::Relaxed);
        now.saturating_sub(last) > 100
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for TerminalProgress {
    fn report_hashing(&self, bytes: u64, files: u64) {
        if self.should_tick() {
            self.bar
                .set_message(format!("Hashing files: {} MB, {} files", bytes / (1 << 20), files));
            self.bar.tick();
        }
    }

    fn report_transfer(&self, done: u64, total: u64, label: &str) {
        self.bar.set_message(format!("{label}: {done}/{total}"));
        self.bar.tick();
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
