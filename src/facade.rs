//! Capability-grouped entry points returning plain JSON envelopes.
//!
//! Every call yields `{ok, reason, capability, operation, data, session, capturedAt}`. Failures
//! carry `data: null` and a reason prefixed with the error's machine tag.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dom_adapter::MemoryDocument;
use perceiver_design::motion;
use perceiver_design::{
    DesignPerceiver, DesignPerceiverImpl, DocumentPort, FrameScheduler, MetricSnapshot,
    NodeTarget, PerceiverError, ProbePolicy, TokioScheduler,
};
use serde::Serialize;
use serde_json::{json, Value};
use stylescope_core_types::{NodeId, SessionId};
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Addressing,
    Style,
    Layout,
    Variables,
    States,
    Motion,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a, T: Serialize> {
    ok: bool,
    reason: Option<String>,
    capability: Capability,
    operation: &'a str,
    data: Option<T>,
    session: Option<&'a str>,
    captured_at: DateTime<Utc>,
}

fn render<T: Serialize>(
    capability: Capability,
    operation: &str,
    session: Option<&str>,
    result: Result<T, PerceiverError>,
) -> Value {
    let (data, reason) = match result {
        Ok(data) => (Some(data), None),
        Err(err) => {
            warn!(operation, kind = err.kind(), %err, "stylescope operation failed");
            (None, Some(format!("{}: {}", err.kind(), err)))
        }
    };
    let envelope = Envelope {
        ok: reason.is_none(),
        reason,
        capability,
        operation,
        data,
        session,
        captured_at: Utc::now(),
    };
    serde_json::to_value(&envelope).unwrap_or_else(|err| {
        json!({
            "ok": false,
            "reason": format!("internal: {err}"),
            "capability": capability,
            "operation": operation,
            "data": Value::Null,
            "session": session,
            "capturedAt": Utc::now(),
        })
    })
}

/// Offline `@keyframes` extraction; needs no live document.
///
/// `data` is `{total, keyframes}`, where `total` counts unique names before `limit` applies.
pub fn keyframes_from_css(sources: &[(String, String)], limit: usize) -> Value {
    render(
        Capability::Motion,
        "extract_keyframes_from_css",
        None,
        Ok(motion::extract_keyframes(sources, limit)),
    )
}

pub struct Stylescope<D, S>
where
    D: DocumentPort + ?Sized,
    S: FrameScheduler + ?Sized,
{
    perceiver: DesignPerceiverImpl<D, S>,
}

impl Stylescope<MemoryDocument, TokioScheduler> {
    /// Attaches to an in-memory document with a wall-clock scheduler.
    pub fn for_document(document: Arc<MemoryDocument>, policy: ProbePolicy) -> Self {
        Self::new(document, Arc::new(TokioScheduler::new()), policy)
    }
}

impl<D, S> Stylescope<D, S>
where
    D: DocumentPort + ?Sized,
    S: FrameScheduler + ?Sized,
{
    pub fn new(document: Arc<D>, scheduler: Arc<S>, policy: ProbePolicy) -> Self {
        Self {
            perceiver: DesignPerceiverImpl::new(document, scheduler, policy),
        }
    }

    pub fn with_session(
        document: Arc<D>,
        scheduler: Arc<S>,
        policy: ProbePolicy,
        session: SessionId,
    ) -> Self {
        Self {
            perceiver: DesignPerceiverImpl::with_session(document, scheduler, policy, session),
        }
    }

    pub fn perceiver(&self) -> &DesignPerceiverImpl<D, S> {
        &self.perceiver
    }

    pub fn metrics(&self) -> MetricSnapshot {
        self.perceiver.metrics()
    }

    fn wrap<T: Serialize>(
        &self,
        capability: Capability,
        operation: &str,
        result: Result<T, PerceiverError>,
    ) -> Value {
        render(
            capability,
            operation,
            Some(self.perceiver.session().0.as_str()),
            result,
        )
    }

    pub async fn resolve(&self, node: NodeId) -> Value {
        self.wrap(
            Capability::Addressing,
            "resolve",
            self.perceiver.resolve(node).await,
        )
    }

    pub async fn lookup(&self, address: &str) -> Value {
        self.wrap(
            Capability::Addressing,
            "lookup",
            self.perceiver.lookup(address).await,
        )
    }

    pub async fn capture(&self, target: impl Into<NodeTarget>) -> Value {
        self.wrap(
            Capability::Style,
            "capture",
            self.perceiver.capture(target.into()).await,
        )
    }

    pub async fn pseudo_all(&self, target: impl Into<NodeTarget>) -> Value {
        self.wrap(
            Capability::Style,
            "pseudo_all",
            self.perceiver.pseudo_all(target.into()).await,
        )
    }

    pub async fn classify(&self, target: impl Into<NodeTarget>) -> Value {
        self.wrap(
            Capability::Layout,
            "classify",
            self.perceiver.classify(target.into()).await,
        )
    }

    pub async fn inspect(&self, target: impl Into<NodeTarget>) -> Value {
        self.wrap(
            Capability::Layout,
            "inspect",
            self.perceiver.inspect(target.into()).await,
        )
    }

    pub async fn skeleton(&self) -> Value {
        self.wrap(
            Capability::Layout,
            "skeleton",
            self.perceiver.skeleton().await,
        )
    }

    pub async fn audit_containers(&self) -> Value {
        self.wrap(
            Capability::Layout,
            "audit_containers",
            self.perceiver.audit_containers().await,
        )
    }

    pub async fn extract_variables(&self) -> Value {
        self.wrap(
            Capability::Variables,
            "extract_variables",
            self.perceiver.extract_variables().await,
        )
    }

    pub async fn analyze_usage(&self) -> Value {
        self.wrap(
            Capability::Variables,
            "analyze_usage",
            self.perceiver.analyze_usage().await,
        )
    }

    pub async fn detect_vendor_vars(&self) -> Value {
        self.wrap(
            Capability::Variables,
            "detect_vendor_vars",
            self.perceiver.detect_vendor_vars().await,
        )
    }

    pub async fn diff_states(&self, target: impl Into<NodeTarget>) -> Value {
        self.wrap(
            Capability::States,
            "diff_states",
            self.perceiver.diff_states(target.into()).await,
        )
    }

    pub async fn audit_interactive(&self, limit: Option<usize>) -> Value {
        self.wrap(
            Capability::States,
            "audit_interactive",
            self.perceiver.audit_interactive(limit).await,
        )
    }

    pub async fn quick_audit(&self) -> Value {
        self.wrap(
            Capability::Motion,
            "quick_audit",
            self.perceiver.quick_audit().await,
        )
    }

    pub async fn sample(
        &self,
        target: impl Into<NodeTarget>,
        duration_ms: f64,
        properties: Vec<String>,
    ) -> Value {
        self.wrap(
            Capability::Motion,
            "sample",
            self.perceiver
                .sample(target.into(), duration_ms, properties)
                .await,
        )
    }

    pub fn extract_keyframes_from_css(&self, sources: &[(String, String)], limit: usize) -> Value {
        self.wrap(
            Capability::Motion,
            "extract_keyframes_from_css",
            Ok(motion::extract_keyframes(sources, limit)),
        )
    }
}
