use rulegate_core::MultiError;
use serde::Serialize;

/// Counters handed to progress callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub processed: usize,
    pub failed: usize,
    pub total: usize,
}

impl BatchProgress {
    /// Fraction of items processed, 1.0 for an empty batch.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}

/// Outcome of a batch run.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    /// Collected errors, `None` when nothing was recorded
    pub errors: Option<MultiError>,
    pub total: usize,
    pub processed: usize,
    pub failed: usize,
    /// Items never validated because the run stopped early
    pub skipped: usize,
}

impl BatchReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_none()
    }

    /// Whether every item was validated.
    pub fn is_complete(&self) -> bool {
        self.skipped == 0
    }

    pub fn into_errors(self) -> Option<MultiError> {
        self.errors
    }
}
