//! Stylescope library
//!
//! Bundles the design perceiver behind JSON envelopes plus the configuration and logging the
//! binary uses.

pub mod config;
pub mod facade;
pub mod info;
pub mod keyframes;
pub mod telemetry;

pub use config::{load_config, LoadedConfig, StylescopeConfig};
pub use facade::{keyframes_from_css, Capability, Stylescope};
pub use telemetry::init_logging;

pub use dom_adapter;
pub use perceiver_design;
pub use stylescope_core_types as core_types;
