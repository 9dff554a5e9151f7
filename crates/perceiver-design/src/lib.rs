//! Design perceiver: measures the visual design of a live document.
//!
//! Components:
//! - node addressing and style capture (`address`, `capture`)
//! - layout classification and page skeleton (`layout`)
//! - custom-property graph (`variables`)
//! - interaction-state simulation and diffing (`states`)
//! - keyframes, transitions and frame sampling (`motion`)

pub mod address;
pub mod api;
pub mod capture;
pub mod differ;
pub mod errors;
pub mod events;
pub mod layout;
pub mod metrics;
pub mod model;
pub mod motion;
pub mod perceiver;
pub mod policy;
pub mod ports;
pub mod states;
pub mod variables;

pub use address::AddressResolver;
pub use api::DesignPerceiver;
pub use errors::PerceiverError;
pub use metrics::MetricSnapshot;
pub use model::*;
pub use perceiver::DesignPerceiverImpl;
pub use policy::{Categorizer, ProbePolicy};
pub use ports::{DocumentPort, FrameScheduler, ManualScheduler, TokioScheduler};
pub use states::{StateGuard, StateSimulator};
