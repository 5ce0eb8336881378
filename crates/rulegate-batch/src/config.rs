use serde::{Deserialize, Serialize};

/// Settings of a [`BatchValidator`](crate::BatchValidator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Items per chunk; items of a chunk are validated one after another
    pub chunk_size: usize,
    /// Maximum chunks validated concurrently
    pub max_parallel: usize,
    /// Skip every remaining item once one item failed
    pub fail_fast: bool,
    /// Invoke progress callbacks after each item
    pub enable_progress: bool,
    /// Keep errors of every failing item; when false only the first failing
    /// item's errors are kept and scheduling stops after it
    pub collect_all_errors: bool,
    /// Cap on the number of collected errors, 0 for no cap
    pub max_errors: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: 100,
            max_parallel: 4,
            fail_fast: false,
            enable_progress: false,
            collect_all_errors: true,
            max_errors: 0,
        }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn enable_progress(mut self, enable: bool) -> Self {
        self.enable_progress = enable;
        self
    }

    pub fn collect_all_errors(mut self, collect: bool) -> Self {
        self.collect_all_errors = collect;
        self
    }

    pub fn max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }

    /// Load from environment variables starting with `prefix` and an underscore.
    #[cfg(feature = "config")]
    pub fn from_env_prefixed(prefix: &str) -> Result<Self, rulegate_core::ConfigError> {
        rulegate_core::config::load_prefixed(prefix)
    }

    /// Error cap usable with [`MultiError::merge_up_to`](rulegate_core::MultiError::merge_up_to).
    pub(crate) fn error_cap(&self) -> usize {
        if self.max_errors == 0 {
            usize::MAX
        } else {
            self.max_errors
        }
    }

    /// Whether scheduling stops after the first failing item.
    pub(crate) fn stops_on_failure(&self) -> bool {
        self.fail_fast || !self.collect_all_errors
    }
}
