//! Global atomic counters for Story Prompt observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. when the request loop shuts down).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters with no allocation or locking.
pub struct Metrics {
    matches_run: AtomicU64,
    merge_previews: AtomicU64,
    merges_applied: AtomicU64,
    prompts_built: AtomicU64,
    validation_failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            matches_run: AtomicU64::new(0),
            merge_previews: AtomicU64::new(0),
            merges_applied: AtomicU64::new(0),
            prompts_built: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
        }
    }

    pub fn inc_matches(&self) {
        self.matches_run.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "matches_run", "counter incremented");
    }

    pub fn inc_merge_previews(&self) {
        self.merge_previews.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "merge_previews", "counter incremented");
    }

    pub fn inc_merges_applied(&self) {
        self.merges_applied.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "merges_applied", "counter incremented");
    }

    /// Counts both augmented and extraction prompts.
    pub fn inc_prompts_built(&self) {
        self.prompts_built.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "prompts_built", "counter incremented");
    }

    pub fn inc_validation_failures(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "validation_failures", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            matches_run = self.matches_run(),
            merge_previews = self.merge_previews(),
            merges_applied = self.merges_applied(),
            prompts_built = self.prompts_built(),
            validation_failures = self.validation_failures(),
        );
    }

    pub fn matches_run(&self) -> u64 {
        self.matches_run.load(Ordering::Relaxed)
    }

    pub fn merge_previews(&self) -> u64 {
        self.merge_previews.load(Ordering::Relaxed)
    }

    pub fn merges_applied(&self) -> u64 {
        self.merges_applied.load(Ordering::Relaxed)
    }

    pub fn prompts_built(&self) -> u64 {
        self.prompts_built.load(Ordering::Relaxed)
    }

    pub fn validation_failures(&self) -> u64 {
        self.validation_failures.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.matches_run.store(0, Ordering::Relaxed);
        self.merge_previews.store(0, Ordering::Relaxed);
        self.merges_applied.store(0, Ordering::Relaxed);
        self.prompts_built.store(0, Ordering::Relaxed);
        self.validation_failures.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        assert_eq!(m.matches_run(), 0);
        m.inc_matches();
        m.inc_matches();
        assert_eq!(m.matches_run(), 2);

        m.inc_merge_previews();
        m.inc_merges_applied();
        assert_eq!(m.merge_previews(), 1);
        assert_eq!(m.merges_applied(), 1);

        m.inc_prompts_built();
        m.inc_prompts_built();
        m.inc_prompts_built();
        assert_eq!(m.prompts_built(), 3);

        m.inc_validation_failures();
        assert_eq!(m.validation_failures(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_matches();
        m.inc_merge_previews();
        m.inc_merges_applied();
        m.inc_prompts_built();
        m.inc_validation_failures();
        m.reset();
        assert_eq!(m.matches_run(), 0);
        assert_eq!(m.merge_previews(), 0);
        assert_eq!(m.merges_applied(), 0);
        assert_eq!(m.prompts_built(), 0);
        assert_eq!(m.validation_failures(), 0);
    }
}
