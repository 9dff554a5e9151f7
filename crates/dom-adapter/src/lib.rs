//! In-memory live document for stylescope.
//!
//! `MemoryDocument` plays the role a browser protocol adapter plays in production: it answers
//! traversal, resolved-style and geometry queries, enumerates style sources, and accepts the
//! transient mutations interaction-state simulation needs.

pub mod cascade;
pub mod css;
mod document;
mod error;
mod registry;
pub mod selector;
pub mod values;

pub use document::{el, DocumentBuilder, ElementSpec, InteractionSnapshot, MemoryDocument};
pub use error::DocumentError;
pub use registry::{InjectedRule, InjectedRules};
