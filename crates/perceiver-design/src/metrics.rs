//! Telemetry helpers for the design perceiver.
//!
//! Counters and latency aggregates per operation family, readable without an external
//! metrics backend.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

static CAPTURE_TOTAL: AtomicU64 = AtomicU64::new(0);
static CAPTURE_LAT_NS: AtomicU64 = AtomicU64::new(0);
static CAPTURE_LAT_SAMPLES: AtomicU64 = AtomicU64::new(0);

static LAYOUT_TOTAL: AtomicU64 = AtomicU64::new(0);
static LAYOUT_LAT_NS: AtomicU64 = AtomicU64::new(0);
static LAYOUT_LAT_SAMPLES: AtomicU64 = AtomicU64::new(0);

static VARIABLES_TOTAL: AtomicU64 = AtomicU64::new(0);
static VARIABLES_LAT_NS: AtomicU64 = AtomicU64::new(0);
static VARIABLES_LAT_SAMPLES: AtomicU64 = AtomicU64::new(0);
static SOURCES_SKIPPED: AtomicU64 = AtomicU64::new(0);

static STATES_TOTAL: AtomicU64 = AtomicU64::new(0);
static STATES_LAT_NS: AtomicU64 = AtomicU64::new(0);
static STATES_LAT_SAMPLES: AtomicU64 = AtomicU64::new(0);
static STATE_ERRORS: AtomicU64 = AtomicU64::new(0);
static STATE_DROP_REVERTS: AtomicU64 = AtomicU64::new(0);

static MOTION_TOTAL: AtomicU64 = AtomicU64::new(0);
static MOTION_LAT_NS: AtomicU64 = AtomicU64::new(0);
static MOTION_LAT_SAMPLES: AtomicU64 = AtomicU64::new(0);

static SAMPLE_TOTAL: AtomicU64 = AtomicU64::new(0);
static SAMPLE_FRAMES: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricCounter {
    pub total: u64,
    pub avg_ms: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricSnapshot {
    pub capture: MetricCounter,
    pub layout: MetricCounter,
    pub variables: MetricCounter,
    pub sources_skipped: u64,
    pub states: MetricCounter,
    pub state_errors: u64,
    pub state_drop_reverts: u64,
    pub motion: MetricCounter,
    pub samples: u64,
    pub sample_frames: u64,
}

pub fn record_capture(duration: Duration) {
    CAPTURE_TOTAL.fetch_add(1, Ordering::Relaxed);
    record_latency(&CAPTURE_LAT_NS, &CAPTURE_LAT_SAMPLES, duration);
}

pub fn record_layout(duration: Duration) {
    LAYOUT_TOTAL.fetch_add(1, Ordering::Relaxed);
    record_latency(&LAYOUT_LAT_NS, &LAYOUT_LAT_SAMPLES, duration);
}

pub fn record_variables(skipped_sources: usize, duration: Duration) {
    VARIABLES_TOTAL.fetch_add(1, Ordering::Relaxed);
    SOURCES_SKIPPED.fetch_add(skipped_sources as u64, Ordering::Relaxed);
    record_latency(&VARIABLES_LAT_NS, &VARIABLES_LAT_SAMPLES, duration);
}

pub fn record_states(errors: usize, duration: Duration) {
    STATES_TOTAL.fetch_add(1, Ordering::Relaxed);
    STATE_ERRORS.fetch_add(errors as u64, Ordering::Relaxed);
    record_latency(&STATES_LAT_NS, &STATES_LAT_SAMPLES, duration);
}

pub fn record_drop_revert() {
    STATE_DROP_REVERTS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_motion(duration: Duration) {
    MOTION_TOTAL.fetch_add(1, Ordering::Relaxed);
    record_latency(&MOTION_LAT_NS, &MOTION_LAT_SAMPLES, duration);
}

pub fn record_sample(frames: usize) {
    SAMPLE_TOTAL.fetch_add(1, Ordering::Relaxed);
    SAMPLE_FRAMES.fetch_add(frames as u64, Ordering::Relaxed);
}

pub fn snapshot() -> MetricSnapshot {
    MetricSnapshot {
        capture: make_counter(
            CAPTURE_TOTAL.load(Ordering::Relaxed),
            CAPTURE_LAT_NS.load(Ordering::Relaxed),
            CAPTURE_LAT_SAMPLES.load(Ordering::Relaxed),
        ),
        layout: make_counter(
            LAYOUT_TOTAL.load(Ordering::Relaxed),
            LAYOUT_LAT_NS.load(Ordering::Relaxed),
            LAYOUT_LAT_SAMPLES.load(Ordering::Relaxed),
        ),
        variables: make_counter(
            VARIABLES_TOTAL.load(Ordering::Relaxed),
            VARIABLES_LAT_NS.load(Ordering::Relaxed),
            VARIABLES_LAT_SAMPLES.load(Ordering::Relaxed),
        ),
        sources_skipped: SOURCES_SKIPPED.load(Ordering::Relaxed),
        states: make_counter(
            STATES_TOTAL.load(Ordering::Relaxed),
            STATES_LAT_NS.load(Ordering::Relaxed),
            STATES_LAT_SAMPLES.load(Ordering::Relaxed),
        ),
        state_errors: STATE_ERRORS.load(Ordering::Relaxed),
        state_drop_reverts: STATE_DROP_REVERTS.load(Ordering::Relaxed),
        motion: make_counter(
            MOTION_TOTAL.load(Ordering::Relaxed),
            MOTION_LAT_NS.load(Ordering::Relaxed),
            MOTION_LAT_SAMPLES.load(Ordering::Relaxed),
        ),
        samples: SAMPLE_TOTAL.load(Ordering::Relaxed),
        sample_frames: SAMPLE_FRAMES.load(Ordering::Relaxed),
    }
}

fn make_counter(total: u64, nanos: u64, samples: u64) -> MetricCounter {
    let avg_ms = if samples == 0 {
        0.0
    } else {
        (nanos as f64 / samples as f64) / 1_000_000.0
    };
    MetricCounter { total, avg_ms }
}

fn record_latency(total_ns: &AtomicU64, samples: &AtomicU64, duration: Duration) {
    let nanos = duration_to_nanos(duration);
    total_ns.fetch_add(nanos, Ordering::Relaxed);
    samples.fetch_add(1, Ordering::Relaxed);
}

fn duration_to_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let before = snapshot();
        record_capture(Duration::from_millis(2));
        record_states(1, Duration::from_millis(4));
        let after = snapshot();
        assert!(after.capture.total > before.capture.total);
        assert!(after.state_errors > before.state_errors);
    }
}
