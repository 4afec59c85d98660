//! The replayable workflow state machine driving one document through the
//! pipeline.
//!
//! States are linear with no branching —
//! `Start → ResolvingAccess → Analyzing → Mapping → Signing → Uploading →
//! Completed` — plus a single absorbing `Failed` state reachable from any
//! non-terminal state.
//!
//! ## Replay contract
//!
//! The orchestrator body performs no parsing, no arithmetic and no direct
//! I/O: it issues exactly one request per stage through the
//! [`Activities`] seam, persists the response as that stage's opaque
//! result, and advances. Re-running [`run`] on a persisted instance replays
//! stored stage results without re-invoking their activities, so execution
//! can resume from any point safely. Retry of a failing activity is the
//! hosting runtime's responsibility, never implemented here.
//!
//! ## Failure contract
//!
//! The first unrecovered activity error moves the instance to `Failed`,
//! preserves the error text for operator inspection, and performs NO
//! compensation: a container resolved or an artifact partially produced by
//! earlier stages is left as-is.

use crate::activity::{AccessGrant, Activities, MappedInvoice, SignedDocument};
use crate::error::FacturaeError;
use crate::fields::ExtractedFieldSet;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Pipeline position of a workflow instance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Stage {
    Start,
    ResolvingAccess,
    Analyzing,
    Mapping,
    Signing,
    Uploading,
    Completed,
}

impl Stage {
    /// The stage that follows this one in the linear pipeline.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Start => Some(Stage::ResolvingAccess),
            Stage::ResolvingAccess => Some(Stage::Analyzing),
            Stage::Analyzing => Some(Stage::Mapping),
            Stage::Mapping => Some(Stage::Signing),
            Stage::Signing => Some(Stage::Uploading),
            Stage::Uploading => Some(Stage::Completed),
            Stage::Completed => None,
        }
    }
}

/// Terminal state of a workflow instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Running,
    Completed,
    Failed,
}

/// A storage-created event notification, the second workflow entry point.
/// Normalizes to the same single-argument start as a direct trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCreatedEvent {
    pub url: String,
}

/// One run of the pipeline for a single input document.
///
/// Serializable in full so the hosting runtime can persist it between
/// suspension points; private fields keep all mutation inside [`run`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInstance {
    instance_id: String,
    input_reference: String,
    current_stage: Stage,
    #[serde(default)]
    stage_results: BTreeMap<Stage, serde_json::Value>,
    #[serde(default)]
    state: RunState,
    #[serde(default)]
    failure: Option<String>,
}

impl WorkflowInstance {
    /// Create an instance for a directly supplied document locator.
    pub fn start(document_locator: impl Into<String>) -> Self {
        WorkflowInstance {
            instance_id: uuid::Uuid::new_v4().to_string(),
            input_reference: document_locator.into(),
            current_stage: Stage::Start,
            stage_results: BTreeMap::new(),
            state: RunState::Running,
            failure: None,
        }
    }

    /// Create an instance from a storage-created event notification.
    pub fn from_storage_event(event: &StorageCreatedEvent) -> Self {
        WorkflowInstance::start(event.url.clone())
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn input_reference(&self) -> &str {
        &self.input_reference
    }

    pub fn current_stage(&self) -> Stage {
        self.current_stage
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// The triggering error of a failed instance.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// The persisted opaque result of a completed stage.
    pub fn stage_result(&self, stage: Stage) -> Option<&serde_json::Value> {
        self.stage_results.get(&stage)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, RunState::Completed | RunState::Failed)
    }

    /// Decode a persisted stage result, if that stage already completed.
    fn replayed<T: DeserializeOwned>(&self, stage: Stage) -> Result<Option<T>, FacturaeError> {
        match self.stage_results.get(&stage) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
                FacturaeError::Internal(format!("persisted result for {stage:?} is corrupt: {e}"))
            }),
        }
    }

    /// Persist a stage result and advance to the following stage.
    fn complete_stage<T: Serialize>(
        &mut self,
        stage: Stage,
        result: &T,
    ) -> Result<(), FacturaeError> {
        let value = serde_json::to_value(result).map_err(|e| {
            FacturaeError::Internal(format!("cannot persist result for {stage:?}: {e}"))
        })?;
        self.stage_results.insert(stage, value);
        self.current_stage = stage.next().unwrap_or(Stage::Completed);
        Ok(())
    }

    /// Absorb a stage failure. No compensation happens here: results of
    /// completed stages stay persisted and external side effects remain.
    fn fail(&mut self, error: FacturaeError) -> FacturaeError {
        warn!(instance = %self.instance_id, "workflow failed: {error}");
        self.state = RunState::Failed;
        self.failure = Some(error.to_string());
        error
    }

    fn complete(&mut self) {
        self.current_stage = Stage::Completed;
        self.state = RunState::Completed;
        info!(instance = %self.instance_id, "workflow completed");
    }
}

/// Drive an instance to completion, resuming from persisted stage results.
///
/// Stages execute strictly sequentially; the five activity calls are the
/// only suspension points. An already-completed stage is never re-invoked.
pub async fn run<A: Activities + ?Sized>(
    instance: &mut WorkflowInstance,
    activities: &A,
) -> Result<(), FacturaeError> {
    match instance.state {
        RunState::Completed => return Ok(()),
        RunState::Failed => {
            return Err(FacturaeError::Internal(format!(
                "instance {} already failed: {}",
                instance.instance_id,
                instance.failure.as_deref().unwrap_or("unknown error")
            )));
        }
        RunState::Running => {}
    }

    info!(
        instance = %instance.instance_id,
        input = %instance.input_reference,
        stage = ?instance.current_stage,
        "workflow running"
    );

    let grant = resolve_access_stage(instance, activities).await?;
    let fields = analyze_stage(instance, activities, &grant).await?;
    let mapped = map_stage(instance, activities, &fields).await?;
    let signed = sign_stage(instance, activities, &mapped).await?;
    upload_stage(instance, activities, &signed, &grant).await?;

    instance.complete();
    Ok(())
}

async fn resolve_access_stage<A: Activities + ?Sized>(
    instance: &mut WorkflowInstance,
    activities: &A,
) -> Result<AccessGrant, FacturaeError> {
    if let Some(grant) = instance.replayed(Stage::ResolvingAccess)? {
        return Ok(grant);
    }
    instance.current_stage = Stage::ResolvingAccess;
    info!(instance = %instance.instance_id, "resolving temporary access");
    let locator = instance.input_reference.clone();
    let grant = match activities.resolve_access(&locator).await {
        Ok(grant) => grant,
        Err(e) => return Err(instance.fail(e)),
    };
    if let Err(e) = instance.complete_stage(Stage::ResolvingAccess, &grant) {
        return Err(instance.fail(e));
    }
    Ok(grant)
}

async fn analyze_stage<A: Activities + ?Sized>(
    instance: &mut WorkflowInstance,
    activities: &A,
    grant: &AccessGrant,
) -> Result<ExtractedFieldSet, FacturaeError> {
    if let Some(fields) = instance.replayed(Stage::Analyzing)? {
        return Ok(fields);
    }
    instance.current_stage = Stage::Analyzing;
    info!(instance = %instance.instance_id, "analyzing document");
    let fields = match activities.analyze(grant).await {
        Ok(fields) => fields,
        Err(e) => return Err(instance.fail(e)),
    };
    if let Err(e) = instance.complete_stage(Stage::Analyzing, &fields) {
        return Err(instance.fail(e));
    }
    Ok(fields)
}

async fn map_stage<A: Activities + ?Sized>(
    instance: &mut WorkflowInstance,
    activities: &A,
    fields: &ExtractedFieldSet,
) -> Result<MappedInvoice, FacturaeError> {
    if let Some(mapped) = instance.replayed(Stage::Mapping)? {
        return Ok(mapped);
    }
    instance.current_stage = Stage::Mapping;
    info!(instance = %instance.instance_id, "mapping extracted fields to invoice document");
    let mapped = match activities.map(fields).await {
        Ok(mapped) => mapped,
        Err(e) => return Err(instance.fail(e)),
    };
    for warning in &mapped.warnings {
        warn!(instance = %instance.instance_id, "mapping diagnostic: {warning}");
    }
    if let Err(e) = instance.complete_stage(Stage::Mapping, &mapped) {
        return Err(instance.fail(e));
    }
    Ok(mapped)
}

async fn sign_stage<A: Activities + ?Sized>(
    instance: &mut WorkflowInstance,
    activities: &A,
    mapped: &MappedInvoice,
) -> Result<SignedDocument, FacturaeError> {
    if let Some(signed) = instance.replayed(Stage::Signing)? {
        return Ok(signed);
    }
    instance.current_stage = Stage::Signing;
    info!(instance = %instance.instance_id, "signing invoice document");
    let signed = match activities.sign(mapped.xml.as_bytes()).await {
        Ok(signed) => signed,
        Err(e) => return Err(instance.fail(e)),
    };
    if let Err(e) = instance.complete_stage(Stage::Signing, &signed) {
        return Err(instance.fail(e));
    }
    Ok(signed)
}

async fn upload_stage<A: Activities + ?Sized>(
    instance: &mut WorkflowInstance,
    activities: &A,
    signed: &SignedDocument,
    grant: &AccessGrant,
) -> Result<(), FacturaeError> {
    if instance.replayed::<bool>(Stage::Uploading)?.is_some() {
        return Ok(());
    }
    instance.current_stage = Stage::Uploading;
    info!(instance = %instance.instance_id, "uploading signed artifact");
    match activities
        .upload(signed, &grant.container_id, &grant.document_id)
        .await
    {
        Ok(()) => {}
        Err(e) => return Err(instance.fail(e)),
    }
    if let Err(e) = instance.complete_stage(Stage::Uploading, &true) {
        return Err(instance.fail(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_linear() {
        let mut stage = Stage::Start;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            stage = next;
            seen.push(stage);
        }
        assert_eq!(
            seen,
            [
                Stage::Start,
                Stage::ResolvingAccess,
                Stage::Analyzing,
                Stage::Mapping,
                Stage::Signing,
                Stage::Uploading,
                Stage::Completed,
            ]
        );
    }

    #[test]
    fn new_instance_is_running_at_start() {
        let instance = WorkflowInstance::start("https://storage.example/doc.pdf");
        assert_eq!(instance.current_stage(), Stage::Start);
        assert_eq!(instance.state(), RunState::Running);
        assert!(!instance.is_terminal());
        assert!(instance.failure().is_none());
        assert!(!instance.instance_id().is_empty());
    }

    #[test]
    fn both_entry_points_normalize_to_the_same_start() {
        let direct = WorkflowInstance::start("https://storage.example/inbox/doc.pdf");
        let event = WorkflowInstance::from_storage_event(&StorageCreatedEvent {
            url: "https://storage.example/inbox/doc.pdf".to_string(),
        });
        assert_eq!(direct.input_reference(), event.input_reference());
        // Distinct runs, even for the same document.
        assert_ne!(direct.instance_id(), event.instance_id());
    }

    #[test]
    fn instance_survives_a_serde_round_trip() {
        let mut instance = WorkflowInstance::start("https://storage.example/doc.pdf");
        instance
            .complete_stage(
                Stage::ResolvingAccess,
                &crate::activity::AccessGrant {
                    access_uri: "https://sas".into(),
                    container_id: "c".into(),
                    document_id: "d".into(),
                },
            )
            .unwrap();

        let json = serde_json::to_string(&instance).unwrap();
        let back: WorkflowInstance = serde_json::from_str(&json).unwrap();
        assert_eq!(back.current_stage(), Stage::Analyzing);
        assert!(back.stage_result(Stage::ResolvingAccess).is_some());
        assert_eq!(back.instance_id(), instance.instance_id());
    }

    #[test]
    fn corrupt_persisted_result_is_an_internal_error() {
        let mut instance = WorkflowInstance::start("u");
        instance
            .stage_results
            .insert(Stage::ResolvingAccess, serde_json::json!("not a grant"));
        let err = instance
            .replayed::<crate::activity::AccessGrant>(Stage::ResolvingAccess)
            .unwrap_err();
        assert!(matches!(err, FacturaeError::Internal(_)));
    }
}
