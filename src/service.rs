//! Synthesis service seam
//!
//! The operations the workflow needs from the remote service, independent
//! of transport. [`crate::client::RxnClient`] implements it over HTTP; tests
//! implement it in memory.

use crate::error::ClientError;
use crate::models::{
    Action, AnalysisReportRef, ExecutionStatus, RetrosynthesisPrediction, SynthesisPlan,
};
use async_trait::async_trait;

/// Remote operations scoped to an active project
///
/// Every method is a single request: none of them waits, polls or retries.
#[async_trait]
pub trait SynthesisService: Send + Sync {
    /// Submit a target molecule and return the prediction id
    async fn predict_retrosynthesis(
        &self,
        product: &str,
        model_id: &str,
    ) -> Result<String, ClientError>;

    /// Poll a prediction once
    async fn get_prediction_result(
        &self,
        prediction_id: &str,
    ) -> Result<RetrosynthesisPrediction, ClientError>;

    /// Create a synthesis from a path's sequence id and return its id
    async fn create_synthesis(&self, sequence_id: &str) -> Result<String, ClientError>;

    /// Fetch tree, reactions and flat actions of a synthesis
    async fn get_synthesis_plan(&self, synthesis_id: &str) -> Result<SynthesisPlan, ClientError>;

    /// Fetch one node's local actions
    async fn get_node_actions(
        &self,
        synthesis_id: &str,
        node_id: &str,
    ) -> Result<Vec<Action>, ClientError>;

    /// Replace one node's actions and return the acknowledged list
    async fn update_node_actions(
        &self,
        synthesis_id: &str,
        node_id: &str,
        actions: &[Action],
    ) -> Result<Vec<Action>, ClientError>;

    /// Launch execution and return the execution id
    async fn start_synthesis(&self, synthesis_id: &str) -> Result<String, ClientError>;

    /// Poll an execution once
    async fn get_synthesis_status(
        &self,
        synthesis_execution_id: &str,
    ) -> Result<ExecutionStatus, ClientError>;

    /// Analysis actions whose report can be downloaded now
    async fn list_pending_analysis_actions(
        &self,
        synthesis_execution_id: &str,
    ) -> Result<Vec<AnalysisReportRef>, ClientError>;

    /// Download one report (PDF bytes)
    async fn fetch_report(&self, report: &AnalysisReportRef) -> Result<Vec<u8>, ClientError>;
}
