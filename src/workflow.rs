//! End-to-end synthesis workflow
//!
//! Composes single-request operations from [`SynthesisService`] into the
//! full sequence: predict, wait, pick a path, create and inspect the
//! synthesis, launch it, wait, and collect analysis reports.
//!
//! Waiting is done here, on the caller's side, with a [`PollPolicy`].
//! [`SynthesisWorkflow`] sends every request through the policy's budget,
//! polls or not. Errors from the service are returned as-is; nothing is
//! retried.

use crate::error::ClientError;
use crate::models::{
    Action, ExecutionStatus, RetrosynthesisPath, RetrosynthesisPrediction, SynthesisPlan,
};
use crate::polling::{PollOutcome, PollPolicy};
use crate::service::SynthesisService;
use crate::tree::collect_reactions;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Which candidate path to turn into a synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathSelection {
    /// Highest confidence
    #[default]
    Best,
    /// Position in the confidence-ordered list
    Index(usize),
}

/// Poll until `is_terminal` holds or the policy's attempts run out
async fn poll_until<T, F, Fut>(
    policy: &mut PollPolicy,
    mut poll: F,
    is_terminal: impl Fn(&T) -> bool,
) -> Result<PollOutcome<T>, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        policy.pace(attempt).await;
        let value = poll().await?;
        if is_terminal(&value) {
            return Ok(PollOutcome::Finished(value));
        }
        if attempt >= policy.max_attempts() {
            return Ok(PollOutcome::GaveUp {
                last: value,
                attempts: attempt,
            });
        }
    }
}

/// Poll a prediction until it succeeds or fails
pub async fn wait_for_prediction<S>(
    service: &S,
    prediction_id: &str,
    policy: &mut PollPolicy,
) -> Result<PollOutcome<RetrosynthesisPrediction>, ClientError>
where
    S: SynthesisService + ?Sized,
{
    poll_until(
        policy,
        move || async move {
            let prediction = service.get_prediction_result(prediction_id).await?;
            tracing::info!(
                prediction_id = %prediction_id,
                status = %prediction.status,
                "Prediction status"
            );
            Ok(prediction)
        },
        |prediction: &RetrosynthesisPrediction| prediction.status.is_terminal(),
    )
    .await
}

/// Poll an execution until it reaches a terminal status
pub async fn wait_for_execution<S>(
    service: &S,
    synthesis_execution_id: &str,
    policy: &mut PollPolicy,
) -> Result<PollOutcome<ExecutionStatus>, ClientError>
where
    S: SynthesisService + ?Sized,
{
    poll_until(
        policy,
        move || async move {
            let status = service.get_synthesis_status(synthesis_execution_id).await?;
            tracing::info!(
                synthesis_execution_id = %synthesis_execution_id,
                status = %status,
                "Execution status"
            );
            Ok(status)
        },
        ExecutionStatus::is_terminal,
    )
    .await
}

/// Download every currently available report into `dir`
///
/// Reports that disappear between listing and fetching are skipped with a
/// warning; list again later to pick them up.
///
/// # Returns
/// * `Ok(Vec<PathBuf>)` - Paths of the files written, in listing order
pub async fn save_reports<S>(
    service: &S,
    synthesis_execution_id: &str,
    dir: &Path,
) -> Result<Vec<PathBuf>, ClientError>
where
    S: SynthesisService + ?Sized,
{
    save_reports_paced(service, synthesis_execution_id, dir, None).await
}

async fn save_reports_paced<S>(
    service: &S,
    synthesis_execution_id: &str,
    dir: &Path,
    mut policy: Option<&mut PollPolicy>,
) -> Result<Vec<PathBuf>, ClientError>
where
    S: SynthesisService + ?Sized,
{
    if let Some(policy) = policy.as_deref_mut() {
        policy.acquire().await;
    }
    let reports = service
        .list_pending_analysis_actions(synthesis_execution_id)
        .await?;
    if reports.is_empty() {
        return Ok(Vec::new());
    }

    tokio::fs::create_dir_all(dir).await?;
    let mut written = Vec::with_capacity(reports.len());
    for report in &reports {
        if let Some(policy) = policy.as_deref_mut() {
            policy.acquire().await;
        }
        let bytes = match service.fetch_report(report).await {
            Ok(bytes) => bytes,
            Err(ClientError::NotFound(reason)) => {
                tracing::warn!(
                    synthesis_id = %report.synthesis_id,
                    node_id = %report.node_id,
                    action_index = report.action_index,
                    reason = %reason,
                    "Listed report no longer available, skipping"
                );
                continue;
            }
            Err(err) => return Err(err),
        };
        let target = dir.join(report.file_name());
        tokio::fs::write(&target, &bytes).await?;
        tracing::info!(path = %target.display(), bytes = bytes.len(), "Saved analysis report");
        written.push(target);
    }
    Ok(written)
}

/// Fetched synthesis plans, invalidated on node updates
///
/// A plan is fetched (and checked for consistency) the first time it is
/// requested and served from memory afterwards, until an update through
/// this cache changes one of its nodes.
pub struct PlanCache<'a, S: SynthesisService + ?Sized> {
    service: &'a S,
    plans: HashMap<String, SynthesisPlan>,
}

impl<'a, S: SynthesisService + ?Sized> PlanCache<'a, S> {
    /// Empty cache over `service`
    pub fn new(service: &'a S) -> Self {
        Self {
            service,
            plans: HashMap::new(),
        }
    }

    /// Plan of a synthesis, fetched if not cached
    pub async fn plan(&mut self, synthesis_id: &str) -> Result<&SynthesisPlan, ClientError> {
        if !self.plans.contains_key(synthesis_id) {
            let plan = self.service.get_synthesis_plan(synthesis_id).await?;
            plan.check_consistency()?;
            self.plans.insert(synthesis_id.to_string(), plan);
        }
        self.plans
            .get(synthesis_id)
            .ok_or_else(|| ClientError::service(format!("plan {} not cached", synthesis_id)))
    }

    /// Whether a plan is cached
    pub fn is_cached(&self, synthesis_id: &str) -> bool {
        self.plans.contains_key(synthesis_id)
    }

    /// Drop a cached plan
    pub fn invalidate(&mut self, synthesis_id: &str) {
        self.plans.remove(synthesis_id);
    }

    /// Replace a node's actions; on success the cached plan is dropped
    pub async fn update_node_actions(
        &mut self,
        synthesis_id: &str,
        node_id: &str,
        actions: &[Action],
    ) -> Result<Vec<Action>, ClientError> {
        let acknowledged = self
            .service
            .update_node_actions(synthesis_id, node_id, actions)
            .await?;
        self.invalidate(synthesis_id);
        Ok(acknowledged)
    }
}

/// The full predict-to-report sequence over a service
pub struct SynthesisWorkflow<'a, S: SynthesisService + ?Sized> {
    service: &'a S,
    policy: PollPolicy,
}

impl<'a, S: SynthesisService + ?Sized> SynthesisWorkflow<'a, S> {
    /// Workflow over `service`, polling with `policy`
    pub fn new(service: &'a S, policy: PollPolicy) -> Self {
        Self { service, policy }
    }

    /// Underlying service
    pub fn service(&self) -> &'a S {
        self.service
    }

    /// Wait until the budget has room for one request made directly on the
    /// service, and count it
    pub async fn acquire_request(&mut self) {
        self.policy.acquire().await;
    }

    /// Submit `product` and wait for the prediction to finish
    pub async fn plan_route(
        &mut self,
        product: &str,
        model_id: &str,
    ) -> Result<PollOutcome<RetrosynthesisPrediction>, ClientError> {
        self.policy.acquire().await;
        let prediction_id = self
            .service
            .predict_retrosynthesis(product, model_id)
            .await?;
        wait_for_prediction(self.service, &prediction_id, &mut self.policy).await
    }

    /// Pick a path from a successful prediction
    ///
    /// # Errors
    /// * `ClientError::InvalidInput` if the prediction did not succeed or the
    ///   index is out of range
    pub fn select_path(
        prediction: &RetrosynthesisPrediction,
        selection: PathSelection,
    ) -> Result<&RetrosynthesisPath, ClientError> {
        if !matches!(prediction.status, crate::models::PredictionStatus::Success) {
            return Err(ClientError::InvalidInput(format!(
                "prediction {} has status {}, no paths to select",
                prediction.prediction_id, prediction.status
            )));
        }
        let index = match selection {
            PathSelection::Best => 0,
            PathSelection::Index(index) => index,
        };
        prediction.retrosynthetic_paths.get(index).ok_or_else(|| {
            ClientError::InvalidInput(format!(
                "prediction {} has {} paths, index {} requested",
                prediction.prediction_id,
                prediction.retrosynthetic_paths.len(),
                index
            ))
        })
    }

    /// Create a synthesis from `path` and fetch its checked plan
    pub async fn prepare_synthesis(
        &mut self,
        path: &RetrosynthesisPath,
    ) -> Result<SynthesisPlan, ClientError> {
        if path.sequence_id.is_empty() {
            return Err(ClientError::InvalidInput(
                "selected path has no sequence id".to_string(),
            ));
        }
        for (step, reaction) in collect_reactions(path).enumerate() {
            tracing::debug!(step = step, reaction = %reaction, "Path reaction");
        }

        self.policy.acquire().await;
        let synthesis_id = self.service.create_synthesis(&path.sequence_id).await?;
        self.policy.acquire().await;
        let plan = self.service.get_synthesis_plan(&synthesis_id).await?;
        plan.check_consistency()?;
        tracing::info!(
            synthesis_id = %synthesis_id,
            nodes = plan.action_spans().len(),
            actions = plan.actions.len(),
            "Synthesis plan ready"
        );
        Ok(plan)
    }

    /// Start a synthesis and wait for execution to end
    ///
    /// # Returns
    /// * The execution id and the polling outcome
    pub async fn launch_and_wait(
        &mut self,
        synthesis_id: &str,
    ) -> Result<(String, PollOutcome<ExecutionStatus>), ClientError> {
        self.policy.acquire().await;
        let execution_id = self.service.start_synthesis(synthesis_id).await?;
        let outcome = wait_for_execution(self.service, &execution_id, &mut self.policy).await?;
        Ok((execution_id, outcome))
    }

    /// Save the reports available for an execution into `dir`
    pub async fn collect_reports(
        &mut self,
        synthesis_execution_id: &str,
        dir: &Path,
    ) -> Result<Vec<PathBuf>, ClientError> {
        save_reports_paced(
            self.service,
            synthesis_execution_id,
            dir,
            Some(&mut self.policy),
        )
        .await
    }
}
