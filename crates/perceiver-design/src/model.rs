use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use stylescope_core_types::{AnimationKind, Edges, NodeId, Rect};

/// CSS locator for a node, stable within one session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeAddress(pub String);

impl NodeAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeAddress {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A node given either directly or by a previously resolved address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeTarget {
    Node(NodeId),
    Address(NodeAddress),
}

impl From<NodeId> for NodeTarget {
    fn from(value: NodeId) -> Self {
        NodeTarget::Node(value)
    }
}

impl From<&str> for NodeTarget {
    fn from(value: &str) -> Self {
        NodeTarget::Address(value.into())
    }
}

impl From<NodeAddress> for NodeTarget {
    fn from(value: NodeAddress) -> Self {
        NodeTarget::Address(value)
    }
}

/// Sparse property -> resolved value map.
pub type StyleRecord = BTreeMap<String, String>;

/// property -> (base value, state value).
pub type PropertyDiff = BTreeMap<String, (String, String)>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PseudoRecord {
    pub styles: StyleRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleSnapshot {
    pub address: NodeAddress,
    pub styles: StyleRecord,
    /// Keyed by pseudo name (`before`, `after`, `placeholder`, `selection`).
    pub pseudo: BTreeMap<String, PseudoRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    #[serde(rename = "block")]
    Flow,
    Flex,
    Grid,
    Inline,
    None,
    Other,
}

impl LayoutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutKind::Flow => "block",
            LayoutKind::Flex => "flex",
            LayoutKind::Grid => "grid",
            LayoutKind::Inline => "inline",
            LayoutKind::None => "none",
            LayoutKind::Other => "other",
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, LayoutKind::Flex | LayoutKind::Grid)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    pub computed_width: String,
    pub computed_height: String,
    pub rect: Rect,
    pub padding: Edges,
    pub margin: Edges,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChildDescriptor {
    pub address: NodeAddress,
    pub overrides: StyleRecord,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDescriptor {
    pub address: NodeAddress,
    pub kind: LayoutKind,
    pub display: String,
    pub properties: StyleRecord,
    pub geometry: Geometry,
    pub child_count: usize,
    pub children: Vec<ChildDescriptor>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkRegion {
    pub role: String,
    pub address: NodeAddress,
    pub selector: String,
    pub rect: Rect,
    pub position: String,
    pub z_index: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockRegion {
    pub address: NodeAddress,
    pub tag: String,
    pub rect: Rect,
    pub display: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    pub landmarks: Vec<LandmarkRegion>,
    pub blocks: Vec<BlockRegion>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSummary {
    pub total_flex: usize,
    pub total_grid: usize,
    pub flex_directions: BTreeMap<String, usize>,
    pub gaps: BTreeMap<String, usize>,
    pub justify_content: BTreeMap<String, usize>,
    pub align_items: BTreeMap<String, usize>,
    pub grid_columns: BTreeMap<usize, usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerAudit {
    pub flex: Vec<ContainerDescriptor>,
    pub grid: Vec<ContainerDescriptor>,
    pub summary: ContainerSummary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableScope {
    Global,
    Local,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionOrigin {
    Stylesheet,
    Computed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDefinition {
    pub name: String,
    pub value: String,
    pub selector: String,
    pub scope: VariableScope,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    pub origin: DefinitionOrigin,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_value: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableSet {
    pub definitions: Vec<VariableDefinition>,
    pub sources_scanned: usize,
    pub skipped_sources: usize,
    pub by_category: BTreeMap<String, usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableUsage {
    pub selectors: Vec<String>,
    pub properties: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub defined: usize,
    pub used: usize,
    pub unused: Vec<String>,
    pub undefined: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub usage: BTreeMap<String, VariableUsage>,
    pub summary: UsageSummary,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorBucket {
    pub count: usize,
    pub samples: Vec<VendorSample>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorSample {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorReport {
    pub vendors: BTreeMap<String, VendorBucket>,
    pub first_party: usize,
    pub third_party: usize,
}

/// Interactive element variant, fixed at capture time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractiveKind {
    Button,
    Link,
    Input,
    Select,
    TextArea,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StateKind {
    Hover,
    Focus,
    FocusVisible,
    Active,
    Disabled,
}

impl StateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKind::Hover => "hover",
            StateKind::Focus => "focus",
            StateKind::FocusVisible => "focusVisible",
            StateKind::Active => "active",
            StateKind::Disabled => "disabled",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateOutcome {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub diff: PropertyDiff,
    /// Observed styles; only the disabled slot carries these.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<StyleRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StateOutcome {
    pub fn is_reportable(&self) -> bool {
        !self.diff.is_empty() || self.error.is_some() || self.styles.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateDiffReport {
    pub address: NodeAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<InteractiveKind>,
    pub base: StyleRecord,
    pub states: BTreeMap<StateKind, StateOutcome>,
}

impl StateDiffReport {
    pub fn state(&self, kind: StateKind) -> Option<&StateOutcome> {
        self.states.get(&kind)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveSummary {
    pub sampled: usize,
    pub with_hover: usize,
    pub with_focus: usize,
    pub with_focus_visible: usize,
    pub with_active: usize,
    pub with_disabled: usize,
    pub property_counts: BTreeMap<String, usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractiveAudit {
    pub buttons: Vec<StateDiffReport>,
    pub links: Vec<StateDiffReport>,
    pub inputs: Vec<StateDiffReport>,
    pub summary: InteractiveSummary,
    pub limit: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyframeValue {
    pub value: String,
    pub offset: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyframeEndpoints {
    pub from: KeyframeValue,
    pub to: KeyframeValue,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyframesDefinition {
    pub name: String,
    pub source: String,
    pub properties: BTreeMap<String, KeyframeEndpoints>,
    pub frame_count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionItem {
    pub property: String,
    pub duration_ms: f64,
    pub timing_function: String,
    pub delay_ms: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionSignature {
    pub shorthand: String,
    pub items: Vec<TransitionItem>,
    pub samples: Vec<NodeAddress>,
    pub occurrences: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveAnimationSample {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<NodeAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub kind: AnimationKind,
    pub duration_ms: f64,
    pub delay_ms: f64,
    pub iterations: Option<f64>,
    pub easing: String,
    pub direction: String,
    pub fill: String,
    pub play_state: String,
    pub properties: BTreeMap<String, KeyframeEndpoints>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionSummary {
    pub keyframes: usize,
    pub transitions: usize,
    pub animations: usize,
    pub durations: BTreeMap<String, usize>,
    pub timing_functions: BTreeMap<String, usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionAudit {
    pub keyframes: Vec<KeyframesDefinition>,
    pub transitions: Vec<TransitionSignature>,
    pub animations: Vec<LiveAnimationSample>,
    pub libraries: Vec<String>,
    pub warnings: Vec<String>,
    pub summary: MotionSummary,
    pub skipped_sources: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionFrame {
    pub t_ms: f64,
    pub values: StyleRecord,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionSample {
    pub address: NodeAddress,
    pub duration_ms: f64,
    pub properties: Vec<String>,
    pub frames: Vec<MotionFrame>,
}

/// A complete `@keyframes` block lifted out of raw stylesheet text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyframesBlock {
    pub name: String,
    pub file: String,
    pub css: String,
}

/// Offline extraction result; `total` counts unique names before the limit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyframesExtract {
    pub total: usize,
    pub keyframes: Vec<KeyframesBlock>,
}
