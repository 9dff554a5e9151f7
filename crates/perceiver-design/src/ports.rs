use std::time::Duration;

use async_trait::async_trait;
use dom_adapter::MemoryDocument;
use parking_lot::Mutex;
use stylescope_core_types::{
    AnimationInstance, ComputedStyle, NodeId, ProbeError, PseudoElement, Rect, RuleHandle,
    SheetSource, SyntheticEvent, Viewport,
};
use tokio::time::Instant;

/// Live document surface the perceiver reads from and, for state simulation, writes to.
///
/// Calls are synchronous: a rendering engine answers DOM queries on its own thread, and the
/// state guard relies on being able to revert from `Drop`.
pub trait DocumentPort: Send + Sync {
    fn document_element(&self) -> Option<NodeId>;
    fn body(&self) -> Option<NodeId>;
    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>, ProbeError>;
    fn matches(&self, node: NodeId, selector: &str) -> Result<bool, ProbeError>;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn children(&self, node: NodeId) -> Vec<NodeId>;
    /// Lowercase tag name; `None` once the node has left the document.
    fn tag_name(&self, node: NodeId) -> Option<String>;
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn class_list(&self, node: NodeId) -> Vec<String>;
    fn computed_style(
        &self,
        node: NodeId,
        pseudo: Option<PseudoElement>,
    ) -> Result<ComputedStyle, ProbeError>;
    fn bounding_rect(&self, node: NodeId) -> Result<Rect, ProbeError>;
    fn viewport(&self) -> Viewport;

    /// Style sources in document order. Sources that refuse enumeration come back as `Err`.
    fn style_sheets(&self) -> Vec<SheetSource>;
    fn animations(&self) -> Vec<AnimationInstance>;
    fn global_names(&self) -> Vec<String>;
    fn script_sources(&self) -> Vec<String>;

    fn active_element(&self) -> Option<NodeId>;
    fn hovered_element(&self) -> Option<NodeId>;
    /// Node currently held down by a pointer, if any.
    fn pressed_element(&self) -> Option<NodeId>;
    fn dispatch(&self, node: NodeId, event: SyntheticEvent) -> Result<(), ProbeError>;
    fn focus(&self, node: NodeId) -> Result<bool, ProbeError>;
    fn blur(&self);
    fn add_class(&self, node: NodeId, class: &str) -> Result<bool, ProbeError>;
    fn remove_class(&self, node: NodeId, class: &str) -> Result<bool, ProbeError>;
    fn insert_rule(&self, text: &str) -> Result<RuleHandle, ProbeError>;
    fn delete_rule(&self, handle: RuleHandle) -> Result<(), ProbeError>;

    fn contains(&self, node: NodeId) -> bool {
        self.tag_name(node).is_some()
    }
}

impl DocumentPort for MemoryDocument {
    fn document_element(&self) -> Option<NodeId> {
        MemoryDocument::document_element(self)
    }

    fn body(&self) -> Option<NodeId> {
        MemoryDocument::body(self)
    }

    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>, ProbeError> {
        Ok(MemoryDocument::query_all(self, selector)?)
    }

    fn matches(&self, node: NodeId, selector: &str) -> Result<bool, ProbeError> {
        Ok(MemoryDocument::matches(self, node, selector)?)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        MemoryDocument::parent(self, node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        MemoryDocument::children(self, node)
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        MemoryDocument::tag_name(self, node).map(|tag| tag.to_ascii_lowercase())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        MemoryDocument::attribute(self, node, name)
    }

    fn class_list(&self, node: NodeId) -> Vec<String> {
        MemoryDocument::class_list(self, node)
    }

    fn computed_style(
        &self,
        node: NodeId,
        pseudo: Option<PseudoElement>,
    ) -> Result<ComputedStyle, ProbeError> {
        Ok(MemoryDocument::computed_style(self, node, pseudo)?)
    }

    fn bounding_rect(&self, node: NodeId) -> Result<Rect, ProbeError> {
        Ok(MemoryDocument::bounding_rect(self, node)?)
    }

    fn viewport(&self) -> Viewport {
        MemoryDocument::viewport(self)
    }

    fn style_sheets(&self) -> Vec<SheetSource> {
        MemoryDocument::style_sheets(self)
    }

    fn animations(&self) -> Vec<AnimationInstance> {
        MemoryDocument::animations(self)
    }

    fn global_names(&self) -> Vec<String> {
        MemoryDocument::global_names(self)
    }

    fn script_sources(&self) -> Vec<String> {
        MemoryDocument::script_sources(self)
    }

    fn active_element(&self) -> Option<NodeId> {
        MemoryDocument::active_element(self)
    }

    fn hovered_element(&self) -> Option<NodeId> {
        MemoryDocument::interaction(self).hovered
    }

    fn pressed_element(&self) -> Option<NodeId> {
        MemoryDocument::interaction(self).active
    }

    fn dispatch(&self, node: NodeId, event: SyntheticEvent) -> Result<(), ProbeError> {
        Ok(MemoryDocument::dispatch(self, node, event)?)
    }

    fn focus(&self, node: NodeId) -> Result<bool, ProbeError> {
        Ok(MemoryDocument::focus(self, node)?)
    }

    fn blur(&self) {
        MemoryDocument::blur(self)
    }

    fn add_class(&self, node: NodeId, class: &str) -> Result<bool, ProbeError> {
        Ok(MemoryDocument::add_class(self, node, class)?)
    }

    fn remove_class(&self, node: NodeId, class: &str) -> Result<bool, ProbeError> {
        Ok(MemoryDocument::remove_class(self, node, class)?)
    }

    fn insert_rule(&self, text: &str) -> Result<RuleHandle, ProbeError> {
        Ok(MemoryDocument::insert_rule(self, text)?)
    }

    fn delete_rule(&self, handle: RuleHandle) -> Result<(), ProbeError> {
        Ok(MemoryDocument::delete_rule(self, handle)?)
    }
}

/// Source of suspension points: rendering frames and fixed delays.
#[async_trait]
pub trait FrameScheduler: Send + Sync {
    /// Waits for the next rendering frame and returns the clock reading after it.
    async fn next_frame(&self) -> f64;
    async fn delay(&self, duration: Duration);
    fn now_ms(&self) -> f64;
}

pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Wall-clock scheduler backed by `tokio::time`.
pub struct TokioScheduler {
    origin: Instant,
    frame: Duration,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::with_frame(FRAME_INTERVAL)
    }

    pub fn with_frame(frame: Duration) -> Self {
        Self {
            origin: Instant::now(),
            frame,
        }
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FrameScheduler for TokioScheduler {
    async fn next_frame(&self) -> f64 {
        tokio::time::sleep(self.frame).await;
        self.now_ms()
    }

    async fn delay(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Deterministic clock: frames and delays advance time without sleeping.
pub struct ManualScheduler {
    clock: Mutex<f64>,
    frame_ms: f64,
    frames: Mutex<u64>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::with_frame_ms(FRAME_INTERVAL.as_secs_f64() * 1000.0)
    }

    pub fn with_frame_ms(frame_ms: f64) -> Self {
        Self {
            clock: Mutex::new(0.0),
            frame_ms,
            frames: Mutex::new(0),
        }
    }

    pub fn advance(&self, ms: f64) {
        *self.clock.lock() += ms;
    }

    pub fn frames_elapsed(&self) -> u64 {
        *self.frames.lock()
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FrameScheduler for ManualScheduler {
    async fn next_frame(&self) -> f64 {
        *self.frames.lock() += 1;
        let mut clock = self.clock.lock();
        *clock += self.frame_ms;
        *clock
    }

    async fn delay(&self, duration: Duration) {
        self.advance(duration.as_secs_f64() * 1000.0);
    }

    fn now_ms(&self) -> f64 {
        *self.clock.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_scheduler_advances_per_frame() {
        let scheduler = ManualScheduler::with_frame_ms(10.0);
        assert_eq!(scheduler.next_frame().await, 10.0);
        scheduler.delay(Duration::from_millis(50)).await;
        assert_eq!(scheduler.now_ms(), 60.0);
        assert_eq!(scheduler.frames_elapsed(), 1);
    }

    #[test]
    fn memory_document_reports_lowercase_tags() {
        let doc = MemoryDocument::builder()
            .root(dom_adapter::el("HTML").child(dom_adapter::el("BODY")))
            .build();
        let port: &dyn DocumentPort = &doc;
        let root = port.document_element().expect("root");
        assert_eq!(port.tag_name(root).as_deref(), Some("html"));
        assert!(port.contains(root));
    }
}
