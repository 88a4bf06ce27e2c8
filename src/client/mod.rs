//! Synthesis service HTTP client
//!
//! `RxnClient` holds the API credential and the active project, and issues
//! one HTTP request per operation. Responses are unwrapped from their
//! `payload` envelope and non-2xx statuses are mapped to [`ClientError`].

pub mod types;

use crate::config::Config;
use crate::constants::{EXECUTIONS_PATH, PREDICTIONS_PATH, PROJECTS_PATH, SYNTHESES_PATH};
use crate::error::ClientError;
use crate::models::{
    Action, AnalysisReportRef, ExecutionStatus, MoleculeDescriptor, PredictionStatus, Project,
    RetrosynthesisParameters, RetrosynthesisPrediction, SynthesisPlan,
};
use crate::service::SynthesisService;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cmp::Ordering;
use std::time::{Duration, Instant};
use tracing::Instrument;
use types::{
    AnalysisListResponse, CreateProjectRequest, CreateProjectResponse, CreateSynthesisRequest,
    CreatedResponse, Envelope, ExecutionStatusResponse, NodeActionsBody, Page,
    PredictRetrosynthesisRequest, PredictionResultResponse, StartSynthesisResponse,
};
use uuid::Uuid;

/// Client for the retrosynthesis and synthesis-execution service
///
/// Cloning is cheap: clones share the connection pool. The active project
/// belongs to each clone separately.
#[derive(Clone)]
pub struct RxnClient {
    http: reqwest::Client,
    base_url: String,
    project_id: Option<String>,
    parameters: RetrosynthesisParameters,
}

impl std::fmt::Debug for RxnClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RxnClient")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .finish()
    }
}

impl RxnClient {
    /// Build a client from configuration
    ///
    /// # Errors
    /// * `ClientError::Authentication` if the API key is empty or not a valid
    ///   header value
    /// * `ClientError::InvalidInput` if the rest of the configuration is invalid
    /// * `ClientError::Service` if the HTTP client cannot be built
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(config.api.api_key.trim()).map_err(|e| {
            ClientError::Authentication(format!("API key is not a valid header value: {}", e))
        })?;
        key.set_sensitive(true);
        headers.insert(AUTHORIZATION, key);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            project_id: None,
            parameters: RetrosynthesisParameters::default(),
        })
    }

    /// Replace the parameters used by [`RxnClient::predict_retrosynthesis`]
    pub fn with_parameters(mut self, parameters: RetrosynthesisParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Active project id, `None` until a project is created or attached
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Attach to an existing project
    pub fn set_project(&mut self, project_id: impl Into<String>) {
        let project_id = project_id.into();
        tracing::info!(project_id = %project_id, "Attached to project");
        self.project_id = Some(project_id);
    }

    /// Create a project and make it the active context
    ///
    /// # Errors
    /// * Mapped HTTP errors; `ClientError::Service` on a malformed payload
    pub async fn create_project(&mut self, name: &str) -> Result<Project, ClientError> {
        if name.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "project name is empty".to_string(),
            ));
        }
        let body = CreateProjectRequest {
            name,
            invitations: Vec::new(),
        };
        let project: CreateProjectResponse = self.post_json(PROJECTS_PATH, &body).await?;
        tracing::info!(project_id = %project.id, name = %project.name, "Created project");
        self.project_id = Some(project.id.clone());
        Ok(project)
    }

    /// List the projects visible to this API key
    pub async fn list_projects(&self) -> Result<Vec<Project>, ClientError> {
        let page: Page<Project> = self.get_json(PROJECTS_PATH).await?;
        Ok(page.content)
    }

    /// Submit a target molecule with the client's retrosynthesis parameters
    ///
    /// # Errors
    /// * `ClientError::InvalidInput` if the descriptor is empty, no project is
    ///   active, or the service rejects the molecule
    /// * Other mapped HTTP errors
    pub async fn predict_retrosynthesis(
        &self,
        product: &str,
        model_id: &str,
    ) -> Result<String, ClientError> {
        self.predict_retrosynthesis_with(product, model_id, &self.parameters)
            .await
    }

    /// Submit a target molecule with explicit parameters
    pub async fn predict_retrosynthesis_with(
        &self,
        product: &str,
        model_id: &str,
        parameters: &RetrosynthesisParameters,
    ) -> Result<String, ClientError> {
        let product = MoleculeDescriptor::new(product)?;
        let project_id = self.active_project()?;
        let body = PredictRetrosynthesisRequest {
            product: product.as_str(),
            ai_model: model_id,
            project_id,
            parameters,
        };

        let created: CreatedResponse = self
            .post_json(PREDICTIONS_PATH, &body)
            .await
            .map_err(|err| match err {
                ClientError::Validation(failure) => ClientError::InvalidInput(format!(
                    "product {} rejected: {}",
                    product, failure
                )),
                other => other,
            })?;

        tracing::info!(
            prediction_id = %created.id,
            product = %product,
            model = %model_id,
            "Submitted retrosynthesis prediction"
        );
        Ok(created.id)
    }

    /// Poll a prediction once
    ///
    /// Paths are returned only on success, highest confidence first.
    pub async fn get_prediction_result(
        &self,
        prediction_id: &str,
    ) -> Result<RetrosynthesisPrediction, ClientError> {
        let path = format!("{}/{}", PREDICTIONS_PATH, segment(prediction_id)?);
        let response: PredictionResultResponse = self.get_json(&path).await?;

        let mut paths = if response.status == PredictionStatus::Success {
            response.sequences
        } else {
            Vec::new()
        };
        // Stable: ties keep server order
        paths.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });

        tracing::debug!(
            prediction_id = %prediction_id,
            status = %response.status,
            paths = paths.len(),
            "Polled prediction"
        );
        Ok(RetrosynthesisPrediction {
            prediction_id: prediction_id.to_string(),
            status: response.status,
            retrosynthetic_paths: paths,
        })
    }

    /// Create a synthesis from a path's sequence id
    pub async fn create_synthesis(&self, sequence_id: &str) -> Result<String, ClientError> {
        if sequence_id.is_empty() {
            return Err(ClientError::InvalidInput("sequence id is empty".to_string()));
        }
        let project_id = self.active_project()?;
        // Sent in the body, so any opaque id is accepted
        let body = CreateSynthesisRequest {
            sequence_id,
            project_id,
        };
        let created: CreatedResponse = self.post_json(SYNTHESES_PATH, &body).await?;
        tracing::info!(synthesis_id = %created.id, sequence_id = %sequence_id, "Created synthesis");
        Ok(created.id)
    }

    /// Fetch tree, reactions and flat actions of a synthesis
    pub async fn get_synthesis_plan(
        &self,
        synthesis_id: &str,
    ) -> Result<SynthesisPlan, ClientError> {
        let path = format!("{}/{}", SYNTHESES_PATH, segment(synthesis_id)?);
        let mut plan: SynthesisPlan = self.get_json(&path).await?;
        if plan.synthesis_id.is_empty() {
            plan.synthesis_id = synthesis_id.to_string();
        }
        Ok(plan)
    }

    /// Fetch one node's local actions
    pub async fn get_node_actions(
        &self,
        synthesis_id: &str,
        node_id: &str,
    ) -> Result<Vec<Action>, ClientError> {
        let path = node_path(synthesis_id, node_id)?;
        let body: NodeActionsBody = self.get_json(&path).await?;
        Ok(body.actions)
    }

    /// Replace one node's actions
    ///
    /// Any previously fetched plan for this synthesis is stale afterwards.
    ///
    /// # Errors
    /// * `ClientError::Validation` with the offending actions when the service
    ///   rejects the list
    pub async fn update_node_actions(
        &self,
        synthesis_id: &str,
        node_id: &str,
        actions: &[Action],
    ) -> Result<Vec<Action>, ClientError> {
        let path = node_path(synthesis_id, node_id)?;
        let body = NodeActionsBody {
            actions: actions.to_vec(),
        };
        let acknowledged: NodeActionsBody = self.put_json(&path, &body).await?;
        tracing::info!(
            synthesis_id = %synthesis_id,
            node_id = %node_id,
            actions = acknowledged.actions.len(),
            "Updated node actions"
        );
        Ok(acknowledged.actions)
    }

    /// Launch execution of a synthesis
    ///
    /// # Errors
    /// * `ClientError::Conflict` if the synthesis is running or not startable
    pub async fn start_synthesis(&self, synthesis_id: &str) -> Result<String, ClientError> {
        let path = format!("{}/{}/start", SYNTHESES_PATH, segment(synthesis_id)?);
        let started: StartSynthesisResponse =
            self.post_json(&path, &serde_json::json!({})).await?;
        tracing::info!(
            synthesis_id = %synthesis_id,
            synthesis_execution_id = %started.synthesis_execution_id,
            "Started synthesis"
        );
        Ok(started.synthesis_execution_id)
    }

    /// Poll an execution once
    pub async fn get_synthesis_status(
        &self,
        synthesis_execution_id: &str,
    ) -> Result<ExecutionStatus, ClientError> {
        let path = format!(
            "{}/{}/status",
            EXECUTIONS_PATH,
            segment(synthesis_execution_id)?
        );
        let response: ExecutionStatusResponse = self.get_json(&path).await?;
        Ok(response.status)
    }

    /// Analysis actions whose report is available now
    pub async fn list_pending_analysis_actions(
        &self,
        synthesis_execution_id: &str,
    ) -> Result<Vec<AnalysisReportRef>, ClientError> {
        let path = format!(
            "{}/{}/analysis",
            EXECUTIONS_PATH,
            segment(synthesis_execution_id)?
        );
        let page: AnalysisListResponse = self.get_json(&path).await?;
        Ok(page.content)
    }

    /// Download one analysis report
    ///
    /// # Errors
    /// * `ClientError::NotFound` if the report is not (or no longer) available
    pub async fn fetch_report(&self, report: &AnalysisReportRef) -> Result<Vec<u8>, ClientError> {
        let path = format!(
            "{}/analysis/{}/report",
            node_path(&report.synthesis_id, &report.node_id)?,
            report.action_index
        );
        let response = self.send(Method::GET, &path, None).await?;
        let bytes = response.bytes().await.map_err(|e| {
            ClientError::service(format!("Failed to read report body: {}", e))
        })?;
        tracing::debug!(bytes = bytes.len(), report = %report.file_name(), "Fetched report");
        Ok(bytes.to_vec())
    }

    fn active_project(&self) -> Result<&str, ClientError> {
        self.project_id.as_deref().ok_or_else(|| {
            ClientError::InvalidInput(
                "no active project; create or attach a project first".to_string(),
            )
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send(Method::GET, path, None).await?;
        read_payload(response).await
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send(Method::POST, path, Some(to_body(body)?)).await?;
        read_payload(response).await
    }

    async fn put_json<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send(Method::PUT, path, Some(to_body(body)?)).await?;
        read_payload(response).await
    }

    /// Send one request and map non-2xx statuses to errors
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let span = tracing::info_span!(
            "rxn_request",
            request_id = %Uuid::new_v4(),
            method = %method,
            path = %path,
        );

        async move {
            tracing::debug!(url = %url, has_body = body.is_some(), "Calling synthesis service");
            let start = Instant::now();

            let mut request = self.http.request(method, &url);
            if let Some(body) = &body {
                request = request.json(body);
            }
            let response = request.send().await.map_err(|e| {
                ClientError::service(format!("Failed to send HTTP request to {}: {}", url, e))
            })?;

            let status = response.status();
            if !status.is_success() {
                let status_code = status.as_u16();
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.trim().parse::<u64>().ok());
                let error_body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read error body".to_string());

                tracing::error!(
                    status_code = status_code,
                    error_body = %error_body,
                    "Synthesis service returned error status"
                );
                return Err(ClientError::from_status(status_code, &error_body, retry_after));
            }

            tracing::debug!(
                status_code = status.as_u16(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Request completed"
            );
            Ok(response)
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl SynthesisService for RxnClient {
    async fn predict_retrosynthesis(
        &self,
        product: &str,
        model_id: &str,
    ) -> Result<String, ClientError> {
        RxnClient::predict_retrosynthesis(self, product, model_id).await
    }

    async fn get_prediction_result(
        &self,
        prediction_id: &str,
    ) -> Result<RetrosynthesisPrediction, ClientError> {
        RxnClient::get_prediction_result(self, prediction_id).await
    }

    async fn create_synthesis(&self, sequence_id: &str) -> Result<String, ClientError> {
        RxnClient::create_synthesis(self, sequence_id).await
    }

    async fn get_synthesis_plan(&self, synthesis_id: &str) -> Result<SynthesisPlan, ClientError> {
        RxnClient::get_synthesis_plan(self, synthesis_id).await
    }

    async fn get_node_actions(
        &self,
        synthesis_id: &str,
        node_id: &str,
    ) -> Result<Vec<Action>, ClientError> {
        RxnClient::get_node_actions(self, synthesis_id, node_id).await
    }

    async fn update_node_actions(
        &self,
        synthesis_id: &str,
        node_id: &str,
        actions: &[Action],
    ) -> Result<Vec<Action>, ClientError> {
        RxnClient::update_node_actions(self, synthesis_id, node_id, actions).await
    }

    async fn start_synthesis(&self, synthesis_id: &str) -> Result<String, ClientError> {
        RxnClient::start_synthesis(self, synthesis_id).await
    }

    async fn get_synthesis_status(
        &self,
        synthesis_execution_id: &str,
    ) -> Result<ExecutionStatus, ClientError> {
        RxnClient::get_synthesis_status(self, synthesis_execution_id).await
    }

    async fn list_pending_analysis_actions(
        &self,
        synthesis_execution_id: &str,
    ) -> Result<Vec<AnalysisReportRef>, ClientError> {
        RxnClient::list_pending_analysis_actions(self, synthesis_execution_id).await
    }

    async fn fetch_report(&self, report: &AnalysisReportRef) -> Result<Vec<u8>, ClientError> {
        RxnClient::fetch_report(self, report).await
    }
}

/// Validate an identifier used as a URL path segment
fn segment(id: &str) -> Result<&str, ClientError> {
    if id.is_empty() || id.contains(['/', '?', '#']) {
        return Err(ClientError::InvalidInput(format!(
            "invalid identifier: {:?}",
            id
        )));
    }
    Ok(id)
}

fn node_path(synthesis_id: &str, node_id: &str) -> Result<String, ClientError> {
    Ok(format!(
        "{}/{}/nodes/{}",
        SYNTHESES_PATH,
        segment(synthesis_id)?,
        segment(node_id)?
    ))
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, ClientError> {
    serde_json::to_value(body)
        .map_err(|e| ClientError::service(format!("Failed to serialize request body: {}", e)))
}

async fn read_payload<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let response_body = response
        .text()
        .await
        .map_err(|e| ClientError::service(format!("Failed to read response body: {}", e)))?;

    let envelope: Envelope<T> = serde_json::from_str(&response_body).map_err(|e| {
        ClientError::service(format!(
            "Failed to parse JSON response: {} - Response body: {}",
            e, response_body
        ))
    })?;
    Ok(envelope.payload)
}
