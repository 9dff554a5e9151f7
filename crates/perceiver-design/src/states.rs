//! Interaction-state simulation and diffing.
//!
//! A trigger applies the minimal set of document mutations that make a node render in a state
//! and hands back a [`StateGuard`] holding exactly the inverse actions. Releasing the guard, or
//! dropping it, restores the document.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

use stylescope_core_types::{NodeId, ProbeError, RuleHandle, SessionId, SyntheticEvent};
use tracing::{debug, warn};

use crate::address::{AddressResolver, MARKER_PREFIX};
use crate::capture;
use crate::differ;
use crate::errors::PerceiverError;
use crate::metrics;
use crate::model::{
    InteractiveAudit, InteractiveKind, StateDiffReport, StateKind, StateOutcome, StyleRecord,
};
use crate::policy::ProbePolicy;
use crate::ports::{DocumentPort, FrameScheduler};

/// Properties whose base values describe a disabled control.
pub const DISABLED_PROPERTIES: [&str; 6] = [
    "opacity",
    "cursor",
    "color",
    "background-color",
    "border-color",
    "filter",
];

const HOVER_EVENTS: [(SyntheticEvent, Option<SyntheticEvent>); 5] = [
    (SyntheticEvent::PointerOver, Some(SyntheticEvent::PointerOut)),
    (SyntheticEvent::PointerEnter, Some(SyntheticEvent::PointerLeave)),
    (SyntheticEvent::MouseOver, Some(SyntheticEvent::MouseOut)),
    (SyntheticEvent::MouseEnter, Some(SyntheticEvent::MouseLeave)),
    (SyntheticEvent::MouseMove, None),
];

const ACTIVE_EVENTS: [(SyntheticEvent, SyntheticEvent); 2] = [
    (SyntheticEvent::PointerDown, SyntheticEvent::PointerUp),
    (SyntheticEvent::MouseDown, SyntheticEvent::MouseUp),
];

const BUTTON_SELECTOR: &str = r#"button, [role="button"], input[type="button"], input[type="submit"], input[type="reset"]"#;
const LINK_SELECTOR: &str = "a[href]";
const INPUT_SELECTOR: &str = "input, select, textarea";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UndoAction {
    RemoveClass { node: NodeId, class: String },
    DeleteRule(RuleHandle),
    Dispatch { node: NodeId, event: SyntheticEvent },
    RestoreFocus(Option<NodeId>),
    RestoreHover(Option<NodeId>),
    RestoreActive(Option<NodeId>),
}

/// Ownership token for a triggered state.
pub struct StateGuard<'a, D>
where
    D: DocumentPort + ?Sized,
{
    doc: &'a D,
    node: NodeId,
    kind: StateKind,
    undo: Vec<UndoAction>,
}

impl<'a, D> StateGuard<'a, D>
where
    D: DocumentPort + ?Sized,
{
    fn new(doc: &'a D, node: NodeId, kind: StateKind) -> Self {
        Self {
            doc,
            node,
            kind,
            undo: Vec::new(),
        }
    }

    pub fn kind(&self) -> StateKind {
        self.kind
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Inverse actions still outstanding, most recent last.
    pub fn pending(&self) -> &[UndoAction] {
        &self.undo
    }

    /// Reverts every applied mutation in reverse order. Calling it again is a no-op.
    ///
    /// All actions are attempted even if one fails; the first failure is returned.
    pub fn release(&mut self) -> Result<(), PerceiverError> {
        let mut first_error: Option<ProbeError> = None;
        while let Some(action) = self.undo.pop() {
            if let Err(err) = self.revert(&action) {
                warn!(node = %self.node, state = self.kind.as_str(), ?action, %err, "state revert failed");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    fn revert(&self, action: &UndoAction) -> Result<(), ProbeError> {
        match action {
            UndoAction::RemoveClass { node, class } => self.doc.remove_class(*node, class).map(|_| ()),
            UndoAction::DeleteRule(handle) => self.doc.delete_rule(*handle),
            UndoAction::Dispatch { node, event } => self.doc.dispatch(*node, *event),
            UndoAction::RestoreFocus(previous) => {
                match previous.filter(|&prev| self.doc.contains(prev)) {
                    Some(prev) => {
                        if !self.doc.focus(prev)? {
                            self.doc.blur();
                        }
                    }
                    None => self.doc.blur(),
                }
                Ok(())
            }
            UndoAction::RestoreHover(previous) => {
                match previous.filter(|&prev| self.doc.contains(prev)) {
                    Some(prev) => self.doc.dispatch(prev, SyntheticEvent::PointerOver)?,
                    None => {
                        if let Some(current) = self.doc.hovered_element() {
                            self.doc.dispatch(current, SyntheticEvent::PointerOut)?;
                        }
                    }
                }
                Ok(())
            }
            UndoAction::RestoreActive(previous) => {
                match previous.filter(|&prev| self.doc.contains(prev)) {
                    Some(prev) => self.doc.dispatch(prev, SyntheticEvent::PointerDown)?,
                    None => {
                        if let Some(current) = self.doc.pressed_element() {
                            self.doc.dispatch(current, SyntheticEvent::PointerUp)?;
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

impl<D> Drop for StateGuard<'_, D>
where
    D: DocumentPort + ?Sized,
{
    fn drop(&mut self) {
        if self.undo.is_empty() {
            return;
        }
        metrics::record_drop_revert();
        warn!(
            node = %self.node,
            state = self.kind.as_str(),
            pending = self.undo.len(),
            "state guard dropped without release; reverting"
        );
        let _ = self.release();
    }
}

pub struct StateSimulator {
    token: String,
    counter: AtomicU64,
    aliases: Vec<String>,
}

impl StateSimulator {
    pub fn new(session: &SessionId, policy: &ProbePolicy) -> Self {
        Self {
            token: session.short().to_ascii_lowercase(),
            counter: AtomicU64::new(0),
            aliases: policy.hover_aliases.clone(),
        }
    }

    /// Puts `node` into `kind`. Only hover, focus and active can be synthesized.
    pub fn trigger<'a, D>(
        &self,
        doc: &'a D,
        node: NodeId,
        kind: StateKind,
    ) -> Result<StateGuard<'a, D>, PerceiverError>
    where
        D: DocumentPort + ?Sized,
    {
        if !doc.contains(node) {
            return Err(PerceiverError::not_found(node.to_string()));
        }
        let mut guard = StateGuard::new(doc, node, kind);
        match kind {
            StateKind::Hover => {
                guard
                    .undo
                    .push(UndoAction::RestoreHover(doc.hovered_element()));
                let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
                let marker = format!("{MARKER_PREFIX}hover-{}-{n}", self.token);
                let handle = doc.insert_rule(&format!(".{marker} {{}}"))?;
                guard.undo.push(UndoAction::DeleteRule(handle));
                for class in std::iter::once(&marker).chain(self.aliases.iter()) {
                    if doc.add_class(node, class)? {
                        guard.undo.push(UndoAction::RemoveClass {
                            node,
                            class: class.clone(),
                        });
                    }
                }
                for (event, inverse) in HOVER_EVENTS {
                    doc.dispatch(node, event)?;
                    if let Some(inverse) = inverse {
                        guard.undo.push(UndoAction::Dispatch {
                            node,
                            event: inverse,
                        });
                    }
                }
            }
            StateKind::Focus => {
                guard
                    .undo
                    .push(UndoAction::RestoreFocus(doc.active_element()));
                doc.focus(node)?;
            }
            StateKind::Active => {
                guard
                    .undo
                    .push(UndoAction::RestoreActive(doc.pressed_element()));
                for (down, up) in ACTIVE_EVENTS {
                    doc.dispatch(node, down)?;
                    guard.undo.push(UndoAction::Dispatch { node, event: up });
                }
            }
            StateKind::FocusVisible | StateKind::Disabled => {
                return Err(PerceiverError::StateCapture {
                    state: kind.as_str().to_string(),
                    reason: "state is observed, not synthesized".into(),
                });
            }
        }
        Ok(guard)
    }

    /// Base capture followed by hover, focus and active, strictly one after another.
    pub async fn diff<D, S>(
        &self,
        doc: &D,
        scheduler: &S,
        resolver: &AddressResolver,
        policy: &ProbePolicy,
        node: NodeId,
    ) -> Result<StateDiffReport, PerceiverError>
    where
        D: DocumentPort + ?Sized,
        S: FrameScheduler + ?Sized,
    {
        let address = resolver.resolve(doc, node)?;
        let base = capture::raw_styles(doc, node)?;
        let mut states = BTreeMap::new();

        for kind in [StateKind::Hover, StateKind::Focus, StateKind::Active] {
            let (outcome, focus_visible) = self
                .capture_state(doc, scheduler, policy, node, kind, &base)
                .await;
            if let Some(visible) = focus_visible {
                if visible.is_reportable() {
                    states.insert(StateKind::FocusVisible, visible);
                }
            }
            if outcome.is_reportable() {
                states.insert(kind, outcome);
            }
            scheduler.delay(policy.timing.between_states()).await;
        }

        if is_disabled(doc, node) {
            states.insert(
                StateKind::Disabled,
                StateOutcome {
                    styles: Some(differ::pick(&base, &DISABLED_PROPERTIES)),
                    ..StateOutcome::default()
                },
            );
        }

        Ok(StateDiffReport {
            address,
            kind: classify_interactive(doc, node),
            base: capture::record_from_raw(&base),
            states,
        })
    }

    /// Returns the state's outcome and, for focus, the derived focus-visible outcome.
    async fn capture_state<D, S>(
        &self,
        doc: &D,
        scheduler: &S,
        policy: &ProbePolicy,
        node: NodeId,
        kind: StateKind,
        base: &StyleRecord,
    ) -> (StateOutcome, Option<StateOutcome>)
    where
        D: DocumentPort + ?Sized,
        S: FrameScheduler + ?Sized,
    {
        let mut guard = match self.trigger(doc, node, kind) {
            Ok(guard) => guard,
            Err(err) => return (failed(kind, err), None),
        };
        if kind == StateKind::Focus && doc.active_element() != Some(node) {
            debug!(%node, "node is not focusable; skipping focus states");
            return match guard.release() {
                Ok(()) => (StateOutcome::default(), None),
                Err(err) => (failed(kind, err), None),
            };
        }

        scheduler.next_frame().await;
        scheduler.delay(policy.timing.settle()).await;

        let captured = capture::raw_styles(doc, node);
        let visible = kind == StateKind::Focus
            && doc.matches(node, ":focus-visible").unwrap_or(false);
        let released = guard.release();

        let outcome = match (captured, released) {
            (Ok(state), Ok(())) => StateOutcome {
                diff: differ::diff_records(base, &state),
                ..StateOutcome::default()
            },
            (Err(err), _) | (Ok(_), Err(err)) => failed(kind, err),
        };
        let focus_visible = (visible && outcome.error.is_none()).then(|| outcome.clone());
        (outcome, focus_visible)
    }

    /// Diffs the first `limit` buttons, links and form fields in document order. Each element
    /// lands in exactly one bucket, chosen by its [`InteractiveKind`].
    pub async fn audit_interactive<D, S>(
        &self,
        doc: &D,
        scheduler: &S,
        resolver: &AddressResolver,
        policy: &ProbePolicy,
        limit: usize,
    ) -> Result<InteractiveAudit, PerceiverError>
    where
        D: DocumentPort + ?Sized,
        S: FrameScheduler + ?Sized,
    {
        if doc.document_element().is_none() {
            return Err(PerceiverError::RootMissing);
        }
        let mut audit = InteractiveAudit {
            limit,
            ..InteractiveAudit::default()
        };
        let candidates = doc.query_all(&format!(
            "{BUTTON_SELECTOR}, {LINK_SELECTOR}, {INPUT_SELECTOR}"
        ))?;
        for node in candidates {
            let Some(kind) = classify_interactive(doc, node) else {
                continue;
            };
            let bucket = match kind {
                InteractiveKind::Button => &mut audit.buttons,
                InteractiveKind::Link => &mut audit.links,
                InteractiveKind::Input | InteractiveKind::Select | InteractiveKind::TextArea => {
                    if doc.attribute(node, "type").as_deref() == Some("hidden") {
                        continue;
                    }
                    &mut audit.inputs
                }
            };
            if bucket.len() >= limit {
                continue;
            }
            match self.diff(doc, scheduler, resolver, policy, node).await {
                Ok(report) => bucket.push(report),
                Err(err) => debug!(%node, %err, "skipping interactive element"),
            }
        }

        let summary = &mut audit.summary;
        for report in audit
            .buttons
            .iter()
            .chain(audit.links.iter())
            .chain(audit.inputs.iter())
        {
            summary.sampled += 1;
            let changed = |kind: StateKind| {
                report
                    .state(kind)
                    .map(|outcome| !outcome.diff.is_empty())
                    .unwrap_or(false)
            };
            summary.with_hover += usize::from(changed(StateKind::Hover));
            summary.with_focus += usize::from(changed(StateKind::Focus));
            summary.with_focus_visible += usize::from(changed(StateKind::FocusVisible));
            summary.with_active += usize::from(changed(StateKind::Active));
            summary.with_disabled += usize::from(report.state(StateKind::Disabled).is_some());
            let touched: BTreeSet<&String> = report
                .states
                .values()
                .flat_map(|outcome| outcome.diff.keys())
                .collect();
            for property in touched {
                *summary.property_counts.entry(property.clone()).or_insert(0) += 1;
            }
        }
        Ok(audit)
    }
}

/// Tag, role and type decide the variant once; later code matches on it.
pub fn classify_interactive<D>(doc: &D, node: NodeId) -> Option<InteractiveKind>
where
    D: DocumentPort + ?Sized,
{
    let tag = doc.tag_name(node)?;
    let input_type = doc
        .attribute(node, "type")
        .map(|t| t.trim().to_ascii_lowercase());
    match tag.as_str() {
        "button" => Some(InteractiveKind::Button),
        "a" => Some(InteractiveKind::Link),
        "select" => Some(InteractiveKind::Select),
        "textarea" => Some(InteractiveKind::TextArea),
        "input" => match input_type.as_deref() {
            Some("button" | "submit" | "reset" | "image") => Some(InteractiveKind::Button),
            _ => Some(InteractiveKind::Input),
        },
        _ => match doc.attribute(node, "role").as_deref() {
            Some("button") => Some(InteractiveKind::Button),
            Some("link") => Some(InteractiveKind::Link),
            _ => None,
        },
    }
}

fn is_disabled<D>(doc: &D, node: NodeId) -> bool
where
    D: DocumentPort + ?Sized,
{
    doc.attribute(node, "disabled").is_some()
        || doc
            .attribute(node, "aria-disabled")
            .map(|value| value.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
}

fn failed(kind: StateKind, err: PerceiverError) -> StateOutcome {
    let reason = match err {
        PerceiverError::StateCapture { reason, .. } => reason,
        other => other.to_string(),
    };
    warn!(state = kind.as_str(), %reason, "state capture failed");
    StateOutcome {
        error: Some(reason),
        ..StateOutcome::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ManualScheduler;
    use dom_adapter::{el, MemoryDocument};

    fn fixture() -> MemoryDocument {
        MemoryDocument::builder()
            .stylesheet(
                r#"
                .btn { color: black; }
                .btn:hover { color: red; }
                .btn.is-hovered { text-transform: uppercase; }
                .btn:focus { outline: 2px solid blue; }
                .btn:active { opacity: 0.5; }
                "#,
            )
            .root(
                el("html").child(
                    el("body")
                        .child(el("button").class("btn").id("go"))
                        .child(el("div").class("plain")),
                ),
            )
            .build()
    }

    fn simulator() -> StateSimulator {
        StateSimulator::new(&SessionId("abc12345-0".into()), &ProbePolicy::default())
    }

    #[test]
    fn hover_trigger_and_release_restore_the_document() {
        let doc = fixture();
        let node = doc.query("#go").unwrap().unwrap();
        let before = capture::raw_styles(&doc, node).unwrap();
        let simulator = simulator();

        let mut guard = simulator.trigger(&doc, node, StateKind::Hover).unwrap();
        assert_eq!(doc.injected_rule_count(), 1);
        assert!(doc.class_list(node).iter().any(|c| c == "ss-hover-abc12345-1"));
        assert_eq!(capture::raw_styles(&doc, node).unwrap()["color"], "rgb(255, 0, 0)");

        guard.release().unwrap();
        guard.release().unwrap();
        assert!(guard.pending().is_empty());
        assert_eq!(doc.injected_rule_count(), 0);
        assert_eq!(doc.class_list(node), vec!["btn".to_string()]);
        assert_eq!(doc.interaction().hovered, None);
        assert_eq!(capture::raw_styles(&doc, node).unwrap(), before);
    }

    #[test]
    fn dropping_an_unreleased_guard_reverts() {
        let doc = fixture();
        let node = doc.query("#go").unwrap().unwrap();
        let simulator = simulator();
        {
            let _guard = simulator.trigger(&doc, node, StateKind::Active).unwrap();
            assert_eq!(doc.interaction().active, Some(node));
        }
        assert_eq!(doc.interaction().active, None);
    }

    #[test]
    fn focus_release_restores_previous_focus() {
        let doc = MemoryDocument::builder()
            .root(
                el("html").child(
                    el("body")
                        .child(el("input").id("a"))
                        .child(el("input").id("b")),
                ),
            )
            .build();
        let a = doc.query("#a").unwrap().unwrap();
        let b = doc.query("#b").unwrap().unwrap();
        doc.focus(a).unwrap();
        let simulator = simulator();
        let mut guard = simulator.trigger(&doc, b, StateKind::Focus).unwrap();
        assert_eq!(doc.active_element(), Some(b));
        guard.release().unwrap();
        assert_eq!(doc.active_element(), Some(a));
    }

    #[test]
    fn release_puts_back_hover_and_press_held_elsewhere() {
        let doc = fixture();
        let other = doc.query(".plain").unwrap().unwrap();
        let node = doc.query("#go").unwrap().unwrap();
        doc.dispatch(other, SyntheticEvent::PointerOver).unwrap();
        doc.dispatch(other, SyntheticEvent::PointerDown).unwrap();
        let before = doc.interaction();
        let simulator = simulator();

        let mut hover = simulator.trigger(&doc, node, StateKind::Hover).unwrap();
        assert_eq!(doc.interaction().hovered, Some(node));
        hover.release().unwrap();
        assert_eq!(doc.interaction(), before);

        let mut active = simulator.trigger(&doc, node, StateKind::Active).unwrap();
        assert_eq!(doc.interaction().active, Some(node));
        active.release().unwrap();
        assert_eq!(doc.interaction(), before);
        assert_eq!(before.hovered, Some(other));
        assert_eq!(before.active, Some(other));
    }

    #[test]
    fn alias_classes_already_present_are_kept() {
        let doc = MemoryDocument::builder()
            .root(el("html").child(el("body").child(el("a").attr("href", "#").class("hover"))))
            .build();
        let link = doc.query("a").unwrap().unwrap();
        let simulator = simulator();
        let mut guard = simulator.trigger(&doc, link, StateKind::Hover).unwrap();
        guard.release().unwrap();
        assert_eq!(doc.class_list(link), vec!["hover".to_string()]);
    }

    #[tokio::test]
    async fn diff_reports_each_state_separately() {
        let doc = fixture();
        let node = doc.query("#go").unwrap().unwrap();
        let policy = ProbePolicy::default();
        let resolver = AddressResolver::new(&policy);
        let scheduler = ManualScheduler::new();
        let report = simulator()
            .diff(&doc, &scheduler, &resolver, &policy, node)
            .await
            .unwrap();

        assert_eq!(report.address.as_str(), "#go");
        assert_eq!(report.kind, Some(InteractiveKind::Button));
        let hover = report.state(StateKind::Hover).unwrap();
        assert_eq!(
            hover.diff["color"],
            ("rgb(0, 0, 0)".to_string(), "rgb(255, 0, 0)".to_string())
        );
        assert_eq!(hover.diff["text-transform"].1, "uppercase");
        let focus = report.state(StateKind::Focus).unwrap();
        assert!(focus.diff.contains_key("outline"));
        assert!(report.state(StateKind::FocusVisible).is_some());
        assert_eq!(report.state(StateKind::Active).unwrap().diff["opacity"].1, "0.5");
        assert!(report.state(StateKind::Disabled).is_none());
        assert_eq!(doc.injected_rule_count(), 0);
        assert!(scheduler.now_ms() >= 3.0 * 50.0);
    }

    #[tokio::test]
    async fn link_styled_as_button_is_audited_once() {
        let doc = MemoryDocument::builder()
            .root(
                el("html").child(
                    el("body")
                        .child(el("a").attr("href", "/go").attr("role", "button"))
                        .child(el("button"))
                        .child(el("input").attr("type", "submit"))
                        .child(el("input").attr("type", "hidden")),
                ),
            )
            .build();
        let policy = ProbePolicy::default();
        let audit = simulator()
            .audit_interactive(
                &doc,
                &ManualScheduler::new(),
                &AddressResolver::new(&policy),
                &policy,
                10,
            )
            .await
            .unwrap();

        assert_eq!(audit.links.len(), 1);
        assert_eq!(audit.links[0].kind, Some(InteractiveKind::Link));
        assert_eq!(audit.buttons.len(), 2);
        assert!(audit
            .buttons
            .iter()
            .all(|report| report.kind == Some(InteractiveKind::Button)));
        assert!(audit.inputs.is_empty());
        assert_eq!(audit.summary.sampled, 3);
    }

    #[tokio::test]
    async fn plain_elements_have_no_state_keys() {
        let doc = fixture();
        let node = doc.query(".plain").unwrap().unwrap();
        let policy = ProbePolicy::default();
        let report = simulator()
            .diff(
                &doc,
                &ManualScheduler::new(),
                &AddressResolver::new(&policy),
                &policy,
                node,
            )
            .await
            .unwrap();
        assert!(report.states.is_empty());
        assert!(report.base.is_empty());
        assert_eq!(report.kind, None);
    }

    #[tokio::test]
    async fn disabled_controls_record_base_styles() {
        let doc = MemoryDocument::builder()
            .stylesheet("button[disabled] { opacity: 0.4; cursor: not-allowed; }")
            .root(el("html").child(el("body").child(el("button").attr("disabled", ""))))
            .build();
        let node = doc.query("button").unwrap().unwrap();
        let policy = ProbePolicy::default();
        let report = simulator()
            .diff(
                &doc,
                &ManualScheduler::new(),
                &AddressResolver::new(&policy),
                &policy,
                node,
            )
            .await
            .unwrap();
        let disabled = report.state(StateKind::Disabled).unwrap();
        let styles = disabled.styles.as_ref().unwrap();
        assert_eq!(styles["opacity"], "0.4");
        assert_eq!(styles["cursor"], "not-allowed");
    }
}
