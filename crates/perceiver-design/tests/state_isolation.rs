//! State simulation never leaves the document mutated, whatever happens mid-flight.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dom_adapter::{el, MemoryDocument};
use perceiver_design::metrics;
use perceiver_design::{
    DesignPerceiver, DesignPerceiverImpl, DocumentPort, FrameScheduler, ManualScheduler,
    NodeTarget, ProbePolicy, StateKind,
};
use stylescope_core_types::{
    AnimationInstance, ComputedStyle, NodeId, ProbeError, PseudoElement, Rect, RuleHandle,
    SheetSource, SyntheticEvent, Viewport,
};

/// Delegates to a memory document but refuses one kind of synthetic event.
struct RefusingDocument {
    inner: MemoryDocument,
    refused: SyntheticEvent,
}

impl DocumentPort for RefusingDocument {
    fn document_element(&self) -> Option<NodeId> {
        DocumentPort::document_element(&self.inner)
    }
    fn body(&self) -> Option<NodeId> {
        DocumentPort::body(&self.inner)
    }
    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>, ProbeError> {
        DocumentPort::query_all(&self.inner, selector)
    }
    fn matches(&self, node: NodeId, selector: &str) -> Result<bool, ProbeError> {
        DocumentPort::matches(&self.inner, node, selector)
    }
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        DocumentPort::parent(&self.inner, node)
    }
    fn children(&self, node: NodeId) -> Vec<NodeId> {
        DocumentPort::children(&self.inner, node)
    }
    fn tag_name(&self, node: NodeId) -> Option<String> {
        DocumentPort::tag_name(&self.inner, node)
    }
    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        DocumentPort::attribute(&self.inner, node, name)
    }
    fn class_list(&self, node: NodeId) -> Vec<String> {
        DocumentPort::class_list(&self.inner, node)
    }
    fn computed_style(
        &self,
        node: NodeId,
        pseudo: Option<PseudoElement>,
    ) -> Result<ComputedStyle, ProbeError> {
        DocumentPort::computed_style(&self.inner, node, pseudo)
    }
    fn bounding_rect(&self, node: NodeId) -> Result<Rect, ProbeError> {
        DocumentPort::bounding_rect(&self.inner, node)
    }
    fn viewport(&self) -> Viewport {
        DocumentPort::viewport(&self.inner)
    }
    fn style_sheets(&self) -> Vec<SheetSource> {
        DocumentPort::style_sheets(&self.inner)
    }
    fn animations(&self) -> Vec<AnimationInstance> {
        DocumentPort::animations(&self.inner)
    }
    fn global_names(&self) -> Vec<String> {
        DocumentPort::global_names(&self.inner)
    }
    fn script_sources(&self) -> Vec<String> {
        DocumentPort::script_sources(&self.inner)
    }
    fn active_element(&self) -> Option<NodeId> {
        DocumentPort::active_element(&self.inner)
    }
    fn hovered_element(&self) -> Option<NodeId> {
        DocumentPort::hovered_element(&self.inner)
    }
    fn pressed_element(&self) -> Option<NodeId> {
        DocumentPort::pressed_element(&self.inner)
    }
    fn dispatch(&self, node: NodeId, event: SyntheticEvent) -> Result<(), ProbeError> {
        if event == self.refused {
            return Err(ProbeError::new(format!("{} refused", event.name())));
        }
        DocumentPort::dispatch(&self.inner, node, event)
    }
    fn focus(&self, node: NodeId) -> Result<bool, ProbeError> {
        DocumentPort::focus(&self.inner, node)
    }
    fn blur(&self) {
        DocumentPort::blur(&self.inner)
    }
    fn add_class(&self, node: NodeId, class: &str) -> Result<bool, ProbeError> {
        DocumentPort::add_class(&self.inner, node, class)
    }
    fn remove_class(&self, node: NodeId, class: &str) -> Result<bool, ProbeError> {
        DocumentPort::remove_class(&self.inner, node, class)
    }
    fn insert_rule(&self, text: &str) -> Result<RuleHandle, ProbeError> {
        DocumentPort::insert_rule(&self.inner, text)
    }
    fn delete_rule(&self, handle: RuleHandle) -> Result<(), ProbeError> {
        DocumentPort::delete_rule(&self.inner, handle)
    }
}

/// A scheduler whose frames never arrive.
struct StalledScheduler;

#[async_trait]
impl FrameScheduler for StalledScheduler {
    async fn next_frame(&self) -> f64 {
        std::future::pending::<f64>().await
    }

    async fn delay(&self, _duration: Duration) {
        std::future::pending::<()>().await
    }

    fn now_ms(&self) -> f64 {
        0.0
    }
}

fn button_page() -> MemoryDocument {
    MemoryDocument::builder()
        .stylesheet(
            "#go { color: black }
             #go:hover { color: red }
             #go:active { opacity: 0.5 }",
        )
        .root(el("html").child(el("body").child(el("button").id("go").class("btn"))))
        .build()
}

#[tokio::test]
async fn failing_state_is_confined_to_its_slot() {
    let doc = Arc::new(RefusingDocument {
        inner: button_page(),
        refused: SyntheticEvent::MouseDown,
    });
    let perceiver = DesignPerceiverImpl::new(
        Arc::clone(&doc),
        Arc::new(ManualScheduler::new()),
        ProbePolicy::default(),
    );

    let report = perceiver.diff_states(NodeTarget::from("#go")).await.unwrap();

    let active = report.state(StateKind::Active).unwrap();
    assert!(active.diff.is_empty());
    assert!(active.error.as_deref().unwrap().contains("mousedown"));

    let hover = report.state(StateKind::Hover).unwrap();
    assert!(hover.error.is_none());
    assert_eq!(hover.diff["color"].1, "rgb(255, 0, 0)");

    assert_eq!(doc.inner.interaction(), Default::default());
    assert_eq!(doc.inner.injected_rule_count(), 0);
}

#[test]
fn dropping_diff_mid_flight_reverts_hover() {
    let doc = Arc::new(button_page());
    let perceiver = DesignPerceiverImpl::new(
        Arc::clone(&doc),
        Arc::new(StalledScheduler),
        ProbePolicy::default(),
    );
    let node = doc.query("#go").unwrap().unwrap();
    let reverts_before = metrics::snapshot().state_drop_reverts;

    let mut task = tokio_test::task::spawn(perceiver.diff_states(NodeTarget::Node(node)));
    assert!(task.poll().is_pending());
    assert_eq!(doc.interaction().hovered, Some(node));
    assert_eq!(doc.injected_rule_count(), 1);
    assert!(doc.class_list(node).len() > 1);

    drop(task);

    assert_eq!(doc.interaction().hovered, None);
    assert_eq!(doc.injected_rule_count(), 0);
    assert_eq!(doc.class_list(node), vec!["btn".to_string()]);
    assert!(metrics::snapshot().state_drop_reverts > reverts_before);
}

#[test]
fn releasing_twice_is_a_no_op() {
    let doc = button_page();
    let node = doc.query("#go").unwrap().unwrap();
    let policy = ProbePolicy::default();
    let simulator = perceiver_design::StateSimulator::new(&Default::default(), &policy);

    let mut guard = simulator.trigger(&doc, node, StateKind::Active).unwrap();
    assert_eq!(doc.interaction().active, Some(node));
    guard.release().unwrap();
    guard.release().unwrap();
    drop(guard);
    assert_eq!(doc.interaction().active, None);
}
