//! Prometheus metrics for validation runs
//!
//! This module is only available when the `metrics` feature is enabled.
//!
//! # Metrics Collected
//!
//! - `validation_rules_total{stage, priority}` - Counter of executed rules
//! - `validation_errors_total{code}` - Counter of recorded errors
//! - `validation_system_errors_total` - Counter of rule faults
//! - `validation_duration_seconds` - Histogram of whole-run durations
//!
//! # Example
//!
//! ```rust,ignore
//! use rulegate_core::{EngineConfig, ValidationEngine, ValidationMetrics};
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(ValidationMetrics::new()?);
//! let engine = ValidationEngine::new(EngineConfig::new().enable_metrics(true))
//!     .with_metrics(Arc::clone(&metrics));
//!
//! engine.validate(&ctx).await;
//! println!("{}", metrics.encode()?);
//! ```

use crate::error::FieldError;
use crate::stage::{Priority, Stage};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Default histogram buckets for run duration (in seconds)
const DEFAULT_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

/// Counters and histograms recorded by a [`ValidationEngine`](crate::ValidationEngine).
#[derive(Clone)]
pub struct ValidationMetrics {
    registry: Registry,
    rules_total: IntCounterVec,
    errors_total: IntCounterVec,
    system_errors_total: IntCounter,
    duration: Histogram,
}

impl ValidationMetrics {
    /// Create metrics in a fresh registry.
    pub fn new() -> prometheus::Result<Self> {
        Self::with_registry(Registry::new())
    }

    /// Create metrics in an existing registry.
    pub fn with_registry(registry: Registry) -> prometheus::Result<Self> {
        let rules_total = IntCounterVec::new(
            Opts::new("validation_rules_total", "Total number of executed validation rules"),
            &["stage", "priority"],
        )?;
        let errors_total = IntCounterVec::new(
            Opts::new("validation_errors_total", "Total number of recorded validation errors"),
            &["code"],
        )?;
        let system_errors_total = IntCounter::new(
            "validation_system_errors_total",
            "Total number of rule infrastructure failures",
        )?;
        let duration = Histogram::with_opts(
            HistogramOpts::new(
                "validation_duration_seconds",
                "Validation run duration in seconds",
            )
            .buckets(DEFAULT_BUCKETS.to_vec()),
        )?;

        registry.register(Box::new(rules_total.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;
        registry.register(Box::new(system_errors_total.clone()))?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            registry,
            rules_total,
            errors_total,
            system_errors_total,
            duration,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn record_rule(&self, stage: Stage, priority: Priority) {
        self.rules_total
            .with_label_values(&[stage.as_str(), priority.as_str()])
            .inc();
    }

    pub(crate) fn record_errors(&self, errors: &[FieldError]) {
        for error in errors {
            self.errors_total
                .with_label_values(&[error.code.as_str()])
                .inc();
        }
    }

    pub(crate) fn record_fault(&self) {
        self.system_errors_total.inc();
    }

    pub(crate) fn record_duration(&self, elapsed: Duration) {
        self.duration.observe(elapsed.as_secs_f64());
    }

    /// Render all metrics in the Prometheus text format.
    pub fn encode(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
