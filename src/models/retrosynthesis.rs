//! Project and retrosynthesis prediction types
//!
//! Structs that mirror the service's JSON for projects, predictions and
//! retrosynthetic path trees.

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A project scoping predictions and syntheses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier assigned by the service
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
}

/// A non-empty SMILES string describing a target molecule
///
/// Only emptiness is checked locally; structural validity is decided by the
/// service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MoleculeDescriptor(String);

impl MoleculeDescriptor {
    /// Wrap a SMILES string, trimming surrounding whitespace
    ///
    /// # Errors
    /// * `ClientError::InvalidInput` if the descriptor is empty
    pub fn new(smiles: impl AsRef<str>) -> Result<Self, ClientError> {
        let trimmed = smiles.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ClientError::InvalidInput(
                "molecule descriptor is empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The SMILES text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MoleculeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for MoleculeDescriptor {
    type Error = ClientError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Prediction status
///
/// The set is open: statuses the client does not know are kept verbatim in
/// `Other` and treated as non-terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PredictionStatus {
    /// Queued, not yet picked up
    Pending,
    /// Model is running
    Processing,
    /// Finished with paths
    Success,
    /// Finished without a result
    Failure,
    /// Status not known to this client
    Other(String),
}

impl PredictionStatus {
    /// Whether polling can stop
    pub fn is_terminal(&self) -> bool {
        matches!(self, PredictionStatus::Success | PredictionStatus::Failure)
    }

    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            PredictionStatus::Pending => "PENDING",
            PredictionStatus::Processing => "PROCESSING",
            PredictionStatus::Success => "SUCCESS",
            PredictionStatus::Failure => "FAILURE",
            PredictionStatus::Other(s) => s,
        }
    }
}

impl From<String> for PredictionStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "PENDING" | "NEW" => PredictionStatus::Pending,
            "PROCESSING" | "RUNNING" => PredictionStatus::Processing,
            "SUCCESS" | "DONE" => PredictionStatus::Success,
            "FAILURE" | "FAILED" | "ERROR" => PredictionStatus::Failure,
            _ => PredictionStatus::Other(value),
        }
    }
}

impl From<PredictionStatus> for String {
    fn from(value: PredictionStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node of a predicted retrosynthetic tree
///
/// The root is the target; each child is a reactant of its parent. Leaves
/// are starting materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrosynthesisPath {
    /// Molecule at this node
    pub smiles: String,
    /// Model confidence for the step producing this node
    #[serde(default)]
    pub confidence: f64,
    /// Identifier used to create a synthesis from this path (set on roots)
    #[serde(default)]
    pub sequence_id: String,
    /// Reactants, in server order
    #[serde(default)]
    pub children: Vec<RetrosynthesisPath>,
    /// Whether the molecule is commercially available
    #[serde(default)]
    pub is_commercial: bool,
    /// Reaction class label, when the model provides one
    #[serde(default, rename = "rclass", skip_serializing_if = "Option::is_none")]
    pub reaction_class: Option<String>,
}

impl RetrosynthesisPath {
    /// Whether this node is a starting material
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(RetrosynthesisPath::node_count)
            .sum::<usize>()
    }

    /// Length of the longest root-to-leaf chain, counting reaction steps
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.depth())
            .max()
            .unwrap_or(0)
    }

    /// Starting materials, left to right
    pub fn leaves(&self) -> Vec<&str> {
        let mut leaves = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                leaves.push(node.smiles.as_str());
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        leaves
    }
}

/// Snapshot of a prediction as seen by one poll
#[derive(Debug, Clone, PartialEq)]
pub struct RetrosynthesisPrediction {
    /// Prediction identifier
    pub prediction_id: String,
    /// Current status
    pub status: PredictionStatus,
    /// Candidate paths, highest confidence first (empty unless `Success`)
    pub retrosynthetic_paths: Vec<RetrosynthesisPath>,
}

impl RetrosynthesisPrediction {
    /// Highest-confidence path, if any
    pub fn best_path(&self) -> Option<&RetrosynthesisPath> {
        self.retrosynthetic_paths.first()
    }
}

/// Tuning knobs for automatic retrosynthesis
///
/// Defaults match the service's own defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrosynthesisParameters {
    /// Max price per gram for a molecule to count as available (0 = any)
    pub availability_pricing_threshold: u32,
    /// Extra molecules to treat as available, dot-separated SMILES
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_smiles: Option<String>,
    /// Molecules that must not appear, dot-separated SMILES
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_smiles: Option<String>,
    /// Substructures that must not appear, dot-separated SMILES
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_substructures: Option<String>,
    /// Do not stop the search at the target even if it is available
    pub exclude_target_molecule: bool,
    /// Forward acceptance probability threshold
    pub fap: f64,
    /// Max reaction steps
    pub max_steps: u32,
    /// Beam width
    pub nbeams: u32,
    /// Steps between pruning passes
    pub pruning_steps: u32,
}

impl Default for RetrosynthesisParameters {
    fn default() -> Self {
        Self {
            availability_pricing_threshold: 0,
            available_smiles: None,
            exclude_smiles: None,
            exclude_substructures: None,
            exclude_target_molecule: true,
            fap: 0.6,
            max_steps: 3,
            nbeams: 10,
            pruning_steps: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(smiles: &str) -> RetrosynthesisPath {
        RetrosynthesisPath {
            smiles: smiles.to_string(),
            confidence: 1.0,
            sequence_id: String::new(),
            children: vec![],
            is_commercial: true,
            reaction_class: None,
        }
    }

    #[test]
    fn test_descriptor_trims_and_rejects_empty() {
        let descriptor = MoleculeDescriptor::new("  CCO \n").unwrap();
        assert_eq!(descriptor.as_str(), "CCO");
        assert!(matches!(
            MoleculeDescriptor::new("   "),
            Err(ClientError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_status_open_set() {
        assert_eq!(
            PredictionStatus::from("success".to_string()),
            PredictionStatus::Success
        );
        let unknown = PredictionStatus::from("WARMING_UP".to_string());
        assert_eq!(unknown, PredictionStatus::Other("WARMING_UP".to_string()));
        assert!(!unknown.is_terminal());
        assert_eq!(unknown.as_str(), "WARMING_UP");
        assert!(PredictionStatus::Failure.is_terminal());
    }

    #[test]
    fn test_path_deserialization() {
        let json = r#"{
            "smiles": "CC(=O)NC1=CC=C(Br)C=C1",
            "confidence": 0.92,
            "sequenceId": "seq-1",
            "rclass": "Acylation",
            "children": [
                {"smiles": "CC(=O)Cl", "isCommercial": true},
                {"smiles": "NC1=CC=C(Br)C=C1", "isCommercial": true}
            ]
        }"#;
        let path: RetrosynthesisPath = serde_json::from_str(json).unwrap();
        assert_eq!(path.sequence_id, "seq-1");
        assert_eq!(path.reaction_class.as_deref(), Some("Acylation"));
        assert_eq!(path.children.len(), 2);
        assert!(path.children[0].is_commercial);
        assert_eq!(path.node_count(), 3);
        assert_eq!(path.depth(), 1);
        assert_eq!(path.leaves(), vec!["CC(=O)Cl", "NC1=CC=C(Br)C=C1"]);
    }

    #[test]
    fn test_single_leaf_shape() {
        let path = leaf("C");
        assert!(path.is_leaf());
        assert_eq!(path.depth(), 0);
        assert_eq!(path.leaves(), vec!["C"]);
    }

    #[test]
    fn test_parameters_serialize_camel_case() {
        let params = RetrosynthesisParameters::default();
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["maxSteps"], 3);
        assert_eq!(json["excludeTargetMolecule"], true);
        assert!(json.get("availableSmiles").is_none());
    }
}
