//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Conversions (count and duration per route)
//! - Artifact lifecycle (registrations, reclamation, registry size)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Conversion Metrics
// =============================================================================

/// Conversions total by route and result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fileforge_conversions_total", "Total conversions"),
        &["route", "result"], // route: "PNG->JPEG", result: "success", "error", "unsupported"
    )
    .unwrap()
});

/// Conversion duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fileforge_conversion_duration_seconds",
            "Duration of a single file conversion",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["route"],
    )
    .unwrap()
});

// =============================================================================
// Lifecycle Metrics
// =============================================================================

/// Artifacts registered with the file registry, by kind.
pub static ARTIFACTS_REGISTERED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "fileforge_artifacts_registered_total",
            "Total artifacts registered for expiry",
        ),
        &["kind"], // "input", "output"
    )
    .unwrap()
});

/// Artifacts deleted by the reaper.
pub static ARTIFACTS_REAPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fileforge_artifacts_reaped_total",
        "Total expired artifacts reclaimed by the reaper",
    )
    .unwrap()
});

/// Deletions that failed during a sweep.
pub static REAPER_DELETE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fileforge_reaper_delete_failures_total",
        "Expired artifacts the reaper failed to delete",
    )
    .unwrap()
});

/// Reaper sweeps performed.
pub static REAPER_SWEEPS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("fileforge_reaper_sweeps_total", "Total reaper sweeps").unwrap()
});

/// Entries currently tracked by the file registry.
pub static REGISTRY_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "fileforge_registry_entries",
        "Number of artifacts currently tracked for expiry",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Conversions
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        // Lifecycle
        Box::new(ARTIFACTS_REGISTERED.clone()),
        Box::new(ARTIFACTS_REAPED.clone()),
        Box::new(REAPER_DELETE_FAILURES.clone()),
        Box::new(REAPER_SWEEPS.clone()),
        Box::new(REGISTRY_ENTRIES.clone()),
    ]
}
