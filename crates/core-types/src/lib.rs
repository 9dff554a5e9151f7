use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use uuid::Uuid;

mod rules;

pub use rules::{CssRule, Declaration, GroupKind, KeyframeBlock, SheetSource};

/// Port-level error shared by document adapters and the perceivers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("{0} is detached from the document")]
    DetachedNode(NodeId),
    #[error("style source unreadable: {0}")]
    UnreadableSource(String),
    #[error("invalid rule: {0}")]
    InvalidRule(String),
    #[error("{message}")]
    Message { message: String },
}

impl ProbeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// One extraction session. Addresses and marker tokens are only stable within a session.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// First hyphen-free chunk of the id, used to build short marker names.
    pub fn short(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Arena index of an element in a live document.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Handle of a rule inserted into the document at runtime.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RuleHandle(pub u64);

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

/// Synthetic sub-elements a host node can generate.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "lowercase"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum PseudoElement {
    Before,
    After,
    Placeholder,
    Selection,
}

impl PseudoElement {
    pub const ALL: [PseudoElement; 4] = [
        PseudoElement::Before,
        PseudoElement::After,
        PseudoElement::Placeholder,
        PseudoElement::Selection,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PseudoElement::Before => "before",
            PseudoElement::After => "after",
            PseudoElement::Placeholder => "placeholder",
            PseudoElement::Selection => "selection",
        }
    }

    pub fn selector(&self) -> &'static str {
        match self {
            PseudoElement::Before => "::before",
            PseudoElement::After => "::after",
            PseudoElement::Placeholder => "::placeholder",
            PseudoElement::Selection => "::selection",
        }
    }

    /// Before/after are the only contexts that carry generated content.
    pub fn generates_content(&self) -> bool {
        matches!(self, PseudoElement::Before | PseudoElement::After)
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim_start_matches(':').to_ascii_lowercase().as_str() {
            "before" => Some(PseudoElement::Before),
            "after" => Some(PseudoElement::After),
            "placeholder" => Some(PseudoElement::Placeholder),
            "selection" => Some(PseudoElement::Selection),
            _ => None,
        }
    }
}

/// Input events an interaction-state trigger may synthesize.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SyntheticEvent {
    PointerOver,
    PointerEnter,
    MouseOver,
    MouseEnter,
    MouseMove,
    PointerOut,
    PointerLeave,
    MouseOut,
    MouseLeave,
    PointerDown,
    MouseDown,
    PointerUp,
    MouseUp,
}

impl SyntheticEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SyntheticEvent::PointerOver => "pointerover",
            SyntheticEvent::PointerEnter => "pointerenter",
            SyntheticEvent::MouseOver => "mouseover",
            SyntheticEvent::MouseEnter => "mouseenter",
            SyntheticEvent::MouseMove => "mousemove",
            SyntheticEvent::PointerOut => "pointerout",
            SyntheticEvent::PointerLeave => "pointerleave",
            SyntheticEvent::MouseOut => "mouseout",
            SyntheticEvent::MouseLeave => "mouseleave",
            SyntheticEvent::PointerDown => "pointerdown",
            SyntheticEvent::MouseDown => "mousedown",
            SyntheticEvent::PointerUp => "pointerup",
            SyntheticEvent::MouseUp => "mouseup",
        }
    }
}

/// Resolved style of an element or pseudo-element. Missing properties read as "".
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComputedStyle {
    values: BTreeMap<String, String>,
}

impl ComputedStyle {
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    pub fn get(&self, property: &str) -> &str {
        self.values.get(property).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.values.insert(property.into(), value.into());
    }

    pub fn custom_properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .filter(|(name, _)| name.starts_with("--"))
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AnimationKind {
    CssAnimation,
    CssTransition,
    Script,
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ComputedKeyframe {
    pub offset: f64,
    pub values: BTreeMap<String, String>,
}

/// A running animation as reported by the document's animation timeline.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationInstance {
    pub target: Option<NodeId>,
    pub name: Option<String>,
    pub kind: AnimationKind,
    pub duration_ms: f64,
    pub delay_ms: f64,
    /// `None` means infinite.
    pub iterations: Option<f64>,
    pub easing: String,
    pub direction: String,
    pub fill: String,
    pub play_state: String,
    pub keyframes: Vec<ComputedKeyframe>,
}

impl AnimationInstance {
    pub fn css(name: impl Into<String>, target: NodeId, duration_ms: f64) -> Self {
        Self {
            target: Some(target),
            name: Some(name.into()),
            kind: AnimationKind::CssAnimation,
            duration_ms,
            delay_ms: 0.0,
            iterations: Some(1.0),
            easing: "ease".into(),
            direction: "normal".into(),
            fill: "none".into(),
            play_state: "running".into(),
            keyframes: Vec::new(),
        }
    }

    pub fn with_keyframe(mut self, offset: f64, values: &[(&str, &str)]) -> Self {
        self.keyframes.push(ComputedKeyframe {
            offset,
            values: values
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_short_is_prefix() {
        let session = SessionId("1a2b3c4d-0000-4000-8000-000000000000".into());
        assert_eq!(session.short(), "1a2b3c4d");
    }

    #[test]
    fn computed_style_reads_missing_as_empty() {
        let mut style = ComputedStyle::default();
        style.set("color", "rgb(0, 0, 0)");
        style.set("--brand", "#f00");
        assert_eq!(style.get("color"), "rgb(0, 0, 0)");
        assert_eq!(style.get("opacity"), "");
        let custom: Vec<_> = style.custom_properties().collect();
        assert_eq!(custom, vec![("--brand", "#f00")]);
    }

    #[test]
    fn pseudo_parse_accepts_legacy_colons() {
        assert_eq!(PseudoElement::parse(":before"), Some(PseudoElement::Before));
        assert_eq!(
            PseudoElement::parse("::selection"),
            Some(PseudoElement::Selection)
        );
        assert_eq!(PseudoElement::parse("::marker"), None);
    }
}
