use std::time::Duration;

use tracing::debug;

use crate::metrics;

pub fn emit_capture(address: &str, property_count: usize, pseudo_count: usize, duration: Duration) {
    metrics::record_capture(duration);
    debug!(
        target: "perceiver.events",
        address,
        property_count,
        pseudo_count,
        "design.capture.completed"
    );
}

pub fn emit_layout(operation: &str, item_count: usize, duration: Duration) {
    metrics::record_layout(duration);
    debug!(
        target: "perceiver.events",
        operation,
        item_count,
        "design.layout.completed"
    );
}

pub fn emit_variables(
    operation: &str,
    definition_count: usize,
    skipped_sources: usize,
    duration: Duration,
) {
    metrics::record_variables(skipped_sources, duration);
    debug!(
        target: "perceiver.events",
        operation,
        definition_count,
        skipped_sources,
        "design.variables.completed"
    );
}

pub fn emit_states(address: &str, state_count: usize, error_count: usize, duration: Duration) {
    metrics::record_states(error_count, duration);
    debug!(
        target: "perceiver.events",
        address,
        state_count,
        error_count,
        "design.states.diffed"
    );
}

pub fn emit_motion(
    keyframes: usize,
    transitions: usize,
    animations: usize,
    duration: Duration,
) {
    metrics::record_motion(duration);
    debug!(
        target: "perceiver.events",
        keyframes,
        transitions,
        animations,
        "design.motion.audited"
    );
}

pub fn emit_sample(address: &str, frames: usize, window_ms: f64) {
    metrics::record_sample(frames);
    debug!(
        target: "perceiver.events",
        address,
        frames,
        window_ms,
        "design.motion.sampled"
    );
}
