//! Engine configuration

use std::time::Duration;

/// Configuration for the execution engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Unit of the linear retry backoff. Attempt `n` sleeps `n * backoff_base`.
    pub backoff_base: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backoff_base: Duration::from_millis(500),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    /// Sleep before the attempt after `attempt` (1-based)
    pub fn backoff_for(&self, attempt: usize) -> Duration {
        self.backoff_base.saturating_mul(attempt.max(1) as u32)
    }
}
