use std::collections::BTreeMap;

use async_trait::async_trait;
use stylescope_core_types::NodeId;

use crate::errors::PerceiverError;
use crate::model::{
    ContainerAudit, ContainerDescriptor, InteractiveAudit, KeyframesBlock, LayoutKind,
    MotionAudit, MotionSample, NodeAddress, NodeTarget, PseudoRecord, Skeleton, StateDiffReport,
    StyleSnapshot, UsageReport, VariableSet, VendorReport,
};
use crate::policy::ProbePolicy;

#[async_trait]
pub trait DesignPerceiver: Send + Sync {
    async fn resolve(&self, node: NodeId) -> Result<NodeAddress, PerceiverError>;

    async fn lookup(&self, address: &str) -> Result<NodeId, PerceiverError>;

    async fn capture(&self, target: NodeTarget) -> Result<StyleSnapshot, PerceiverError>;

    async fn pseudo_all(
        &self,
        target: NodeTarget,
    ) -> Result<BTreeMap<String, PseudoRecord>, PerceiverError>;

    async fn classify(&self, target: NodeTarget) -> Result<LayoutKind, PerceiverError>;

    async fn inspect(&self, target: NodeTarget) -> Result<ContainerDescriptor, PerceiverError>;

    async fn skeleton(&self) -> Result<Skeleton, PerceiverError>;

    async fn audit_containers(&self) -> Result<ContainerAudit, PerceiverError>;

    async fn extract_variables(&self) -> Result<VariableSet, PerceiverError>;

    async fn analyze_usage(&self) -> Result<UsageReport, PerceiverError>;

    async fn detect_vendor_vars(&self) -> Result<VendorReport, PerceiverError>;

    async fn diff_states(&self, target: NodeTarget) -> Result<StateDiffReport, PerceiverError>;

    /// `None` uses the configured interactive limit.
    async fn audit_interactive(
        &self,
        limit: Option<usize>,
    ) -> Result<InteractiveAudit, PerceiverError>;

    async fn quick_audit(&self) -> Result<MotionAudit, PerceiverError>;

    async fn sample(
        &self,
        target: NodeTarget,
        duration_ms: f64,
        properties: Vec<String>,
    ) -> Result<MotionSample, PerceiverError>;

    /// Works on raw stylesheet texts; no live document involved.
    fn extract_keyframes_from_css(
        &self,
        sources: &[(String, String)],
        limit: usize,
    ) -> Vec<KeyframesBlock> {
        crate::motion::extract_keyframes_from_css(sources, limit)
    }

    fn policy(&self) -> &ProbePolicy;
}
