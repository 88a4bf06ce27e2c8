//! Wire types for the synthesis service
//!
//! Structs that mirror the service's JSON request and response bodies.
//! Every JSON response is wrapped in a `payload` envelope.

use crate::models::{
    Action, AnalysisReportRef, ExecutionStatus, PredictionStatus, Project,
    RetrosynthesisParameters, RetrosynthesisPath,
};
use serde::{Deserialize, Serialize};

/// Response envelope
#[derive(Deserialize, Debug)]
pub struct Envelope<T> {
    /// Useful part of the response
    pub payload: T,
}

/// Paged list body
#[derive(Deserialize, Debug)]
pub struct Page<T> {
    /// Items on this page
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
}

/// Body returned when a resource is created
#[derive(Deserialize, Debug)]
pub struct CreatedResponse {
    /// Identifier of the new resource
    pub id: String,
}

/// Request body for project creation
#[derive(Serialize, Debug)]
pub struct CreateProjectRequest<'a> {
    /// Project name
    pub name: &'a str,
    /// Users to invite (always empty here)
    pub invitations: Vec<String>,
}

/// Response body for project creation
pub type CreateProjectResponse = Project;

/// Request body for a retrosynthesis prediction
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PredictRetrosynthesisRequest<'a> {
    /// Target molecule SMILES
    pub product: &'a str,
    /// Model identifier
    pub ai_model: &'a str,
    /// Active project
    pub project_id: &'a str,
    /// Search parameters
    pub parameters: &'a RetrosynthesisParameters,
}

/// Response body for a prediction poll
#[derive(Deserialize, Debug)]
pub struct PredictionResultResponse {
    /// Current status
    pub status: PredictionStatus,
    /// Candidate paths (present on success)
    #[serde(default)]
    pub sequences: Vec<RetrosynthesisPath>,
}

/// Request body for synthesis creation
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateSynthesisRequest<'a> {
    /// Sequence identifier of the chosen path
    pub sequence_id: &'a str,
    /// Active project
    pub project_id: &'a str,
}

/// Node action list, used both as request and response body
#[derive(Serialize, Deserialize, Debug)]
pub struct NodeActionsBody {
    /// Node-local actions, in order
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Response body for synthesis start
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StartSynthesisResponse {
    /// Execution handle
    pub synthesis_execution_id: String,
}

/// Response body for an execution status poll
#[derive(Deserialize, Debug)]
pub struct ExecutionStatusResponse {
    /// Current status
    pub status: ExecutionStatus,
}

/// Response body for the analysis listing
pub type AnalysisListResponse = Page<AnalysisReportRef>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_request_serialization() {
        let parameters = RetrosynthesisParameters::default();
        let request = PredictRetrosynthesisRequest {
            product: "CCO",
            ai_model: "2019-09-12",
            project_id: "proj-1",
            parameters: &parameters,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""product":"CCO""#));
        assert!(json.contains(r#""aiModel":"2019-09-12""#));
        assert!(json.contains(r#""projectId":"proj-1""#));
        assert!(json.contains(r#""nbeams":10"#));
    }

    #[test]
    fn test_prediction_response_without_sequences() {
        let json = r#"{"payload": {"status": "PENDING"}}"#;
        let envelope: Envelope<PredictionResultResponse> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.payload.status, PredictionStatus::Pending);
        assert!(envelope.payload.sequences.is_empty());
    }

    #[test]
    fn test_analysis_list_deserialization() {
        let json = r#"{"payload": {"content": [
            {"synthesisId": "s", "nodeId": "n", "actionIndex": 3}
        ]}}"#;
        let envelope: Envelope<AnalysisListResponse> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.payload.content.len(), 1);
        assert_eq!(envelope.payload.content[0].action_index, 3);
    }

    #[test]
    fn test_start_response_deserialization() {
        let json = r#"{"payload": {"synthesisExecutionId": "exec-9"}}"#;
        let envelope: Envelope<StartSynthesisResponse> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.payload.synthesis_execution_id, "exec-9");
    }
}
