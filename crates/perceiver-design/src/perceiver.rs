use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use stylescope_core_types::{NodeId, SessionId};
use tracing::{debug, instrument};

use crate::address::{self, AddressResolver};
use crate::api::DesignPerceiver;
use crate::capture;
use crate::errors::PerceiverError;
use crate::events;
use crate::layout;
use crate::metrics::{self, MetricSnapshot};
use crate::model::{
    ContainerAudit, ContainerDescriptor, InteractiveAudit, LayoutKind, MotionAudit, MotionSample,
    NodeAddress, NodeTarget, PseudoRecord, Skeleton, StateDiffReport, StyleSnapshot, UsageReport,
    VariableSet, VendorReport,
};
use crate::motion;
use crate::policy::{Categorizer, ProbePolicy};
use crate::ports::{DocumentPort, FrameScheduler};
use crate::states::StateSimulator;
use crate::variables;

pub struct DesignPerceiverImpl<D, S>
where
    D: DocumentPort + ?Sized,
    S: FrameScheduler + ?Sized,
{
    document: Arc<D>,
    scheduler: Arc<S>,
    policy: ProbePolicy,
    categorizer: Categorizer,
    resolver: AddressResolver,
    simulator: StateSimulator,
    session: SessionId,
}

impl<D, S> DesignPerceiverImpl<D, S>
where
    D: DocumentPort + ?Sized,
    S: FrameScheduler + ?Sized,
{
    pub fn new(document: Arc<D>, scheduler: Arc<S>, policy: ProbePolicy) -> Self {
        Self::with_session(document, scheduler, policy, SessionId::new())
    }

    pub fn with_session(
        document: Arc<D>,
        scheduler: Arc<S>,
        policy: ProbePolicy,
        session: SessionId,
    ) -> Self {
        debug!(session = %session.0, "design perceiver attached");
        Self {
            categorizer: Categorizer::new(&policy),
            resolver: AddressResolver::new(&policy),
            simulator: StateSimulator::new(&session, &policy),
            document,
            scheduler,
            policy,
            session,
        }
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn document(&self) -> &Arc<D> {
        &self.document
    }

    pub fn metrics(&self) -> MetricSnapshot {
        metrics::snapshot()
    }

    fn locate(&self, target: &NodeTarget) -> Result<NodeId, PerceiverError> {
        match target {
            NodeTarget::Node(node) if self.document.contains(*node) => Ok(*node),
            NodeTarget::Node(node) => Err(PerceiverError::not_found(node.to_string())),
            NodeTarget::Address(address) => address::lookup(self.document.as_ref(), address.as_str()),
        }
    }
}

#[async_trait]
impl<D, S> DesignPerceiver for DesignPerceiverImpl<D, S>
where
    D: DocumentPort + ?Sized,
    S: FrameScheduler + ?Sized,
{
    async fn resolve(&self, node: NodeId) -> Result<NodeAddress, PerceiverError> {
        self.resolver.resolve(self.document.as_ref(), node)
    }

    async fn lookup(&self, address: &str) -> Result<NodeId, PerceiverError> {
        address::lookup(self.document.as_ref(), address)
    }

    #[instrument(skip_all)]
    async fn capture(&self, target: NodeTarget) -> Result<StyleSnapshot, PerceiverError> {
        let started = Instant::now();
        let doc = self.document.as_ref();
        let node = self.locate(&target)?;
        let snapshot = StyleSnapshot {
            address: self.resolver.resolve(doc, node)?,
            styles: capture::styles(doc, node)?,
            pseudo: capture::pseudo_all(doc, node)?,
        };
        events::emit_capture(
            snapshot.address.as_str(),
            snapshot.styles.len(),
            snapshot.pseudo.len(),
            started.elapsed(),
        );
        Ok(snapshot)
    }

    async fn pseudo_all(
        &self,
        target: NodeTarget,
    ) -> Result<BTreeMap<String, PseudoRecord>, PerceiverError> {
        let node = self.locate(&target)?;
        capture::pseudo_all(self.document.as_ref(), node)
    }

    async fn classify(&self, target: NodeTarget) -> Result<LayoutKind, PerceiverError> {
        let node = self.locate(&target)?;
        layout::classify(self.document.as_ref(), node)
    }

    #[instrument(skip_all)]
    async fn inspect(&self, target: NodeTarget) -> Result<ContainerDescriptor, PerceiverError> {
        let started = Instant::now();
        let node = self.locate(&target)?;
        let descriptor = layout::inspect(self.document.as_ref(), &self.resolver, &self.policy, node)?;
        events::emit_layout("inspect", descriptor.children.len(), started.elapsed());
        Ok(descriptor)
    }

    #[instrument(skip_all)]
    async fn skeleton(&self) -> Result<Skeleton, PerceiverError> {
        let started = Instant::now();
        let skeleton = layout::skeleton(self.document.as_ref(), &self.resolver, &self.policy)?;
        events::emit_layout(
            "skeleton",
            skeleton.landmarks.len() + skeleton.blocks.len(),
            started.elapsed(),
        );
        Ok(skeleton)
    }

    #[instrument(skip_all)]
    async fn audit_containers(&self) -> Result<ContainerAudit, PerceiverError> {
        let started = Instant::now();
        let audit = layout::audit_containers(self.document.as_ref(), &self.resolver, &self.policy)?;
        events::emit_layout(
            "audit_containers",
            audit.flex.len() + audit.grid.len(),
            started.elapsed(),
        );
        Ok(audit)
    }

    #[instrument(skip_all)]
    async fn extract_variables(&self) -> Result<VariableSet, PerceiverError> {
        let started = Instant::now();
        let set = variables::extract_all(self.document.as_ref(), &self.categorizer)?;
        events::emit_variables(
            "extract_all",
            set.definitions.len(),
            set.skipped_sources,
            started.elapsed(),
        );
        Ok(set)
    }

    #[instrument(skip_all)]
    async fn analyze_usage(&self) -> Result<UsageReport, PerceiverError> {
        let started = Instant::now();
        let report = variables::analyze_usage(
            self.document.as_ref(),
            &self.resolver,
            &self.categorizer,
            &self.policy,
        )?;
        events::emit_variables("analyze_usage", report.summary.defined, 0, started.elapsed());
        Ok(report)
    }

    #[instrument(skip_all)]
    async fn detect_vendor_vars(&self) -> Result<VendorReport, PerceiverError> {
        let started = Instant::now();
        let report =
            variables::detect_vendor_vars(self.document.as_ref(), &self.categorizer, &self.policy)?;
        events::emit_variables(
            "detect_vendor_vars",
            report.first_party + report.third_party,
            0,
            started.elapsed(),
        );
        Ok(report)
    }

    #[instrument(skip_all, fields(session = %self.session.short()))]
    async fn diff_states(&self, target: NodeTarget) -> Result<StateDiffReport, PerceiverError> {
        let started = Instant::now();
        let node = self.locate(&target)?;
        let report = self
            .simulator
            .diff(
                self.document.as_ref(),
                self.scheduler.as_ref(),
                &self.resolver,
                &self.policy,
                node,
            )
            .await?;
        let errors = report.states.values().filter(|o| o.error.is_some()).count();
        events::emit_states(
            report.address.as_str(),
            report.states.len(),
            errors,
            started.elapsed(),
        );
        Ok(report)
    }

    #[instrument(skip_all, fields(session = %self.session.short()))]
    async fn audit_interactive(
        &self,
        limit: Option<usize>,
    ) -> Result<InteractiveAudit, PerceiverError> {
        let started = Instant::now();
        let limit = limit.unwrap_or(self.policy.caps.interactive_limit);
        let audit = self
            .simulator
            .audit_interactive(
                self.document.as_ref(),
                self.scheduler.as_ref(),
                &self.resolver,
                &self.policy,
                limit,
            )
            .await?;
        let errors = audit
            .buttons
            .iter()
            .chain(&audit.links)
            .chain(&audit.inputs)
            .flat_map(|report| report.states.values())
            .filter(|outcome| outcome.error.is_some())
            .count();
        events::emit_states("*", audit.summary.sampled, errors, started.elapsed());
        Ok(audit)
    }

    #[instrument(skip_all)]
    async fn quick_audit(&self) -> Result<MotionAudit, PerceiverError> {
        let started = Instant::now();
        let audit = motion::quick_audit(self.document.as_ref(), &self.resolver, &self.policy)?;
        events::emit_motion(
            audit.keyframes.len(),
            audit.transitions.len(),
            audit.animations.len(),
            started.elapsed(),
        );
        Ok(audit)
    }

    #[instrument(skip_all, fields(duration_ms = duration_ms))]
    async fn sample(
        &self,
        target: NodeTarget,
        duration_ms: f64,
        properties: Vec<String>,
    ) -> Result<MotionSample, PerceiverError> {
        let node = self.locate(&target)?;
        let sample = motion::sample(
            self.document.as_ref(),
            self.scheduler.as_ref(),
            &self.resolver,
            &self.policy,
            node,
            duration_ms,
            &properties,
        )
        .await?;
        events::emit_sample(sample.address.as_str(), sample.frames.len(), sample.duration_ms);
        Ok(sample)
    }

    fn policy(&self) -> &ProbePolicy {
        &self.policy
    }
}
