//! Synthesis plan, execution and analysis report types

use crate::models::action::Action;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One node of a synthesis tree
///
/// Mirrors a node of the chosen retrosynthetic path and carries the node's
/// own action list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisNode {
    /// Node identifier (used by the node-actions endpoints)
    pub id: String,
    /// Molecule produced at this node
    #[serde(default)]
    pub smiles: String,
    /// Node-local actions, in execution order
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Precursor nodes
    #[serde(default)]
    pub children: Vec<SynthesisNode>,
}

impl SynthesisNode {
    /// Find a node by id anywhere in this subtree
    pub fn find(&self, node_id: &str) -> Option<&SynthesisNode> {
        if self.id == node_id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(node_id))
    }

    /// Nodes in dependency order: every child before its parent
    pub fn dependency_order(&self) -> Vec<&SynthesisNode> {
        let mut order = Vec::new();
        self.push_post_order(&mut order);
        order
    }

    fn push_post_order<'a>(&'a self, order: &mut Vec<&'a SynthesisNode>) {
        for child in &self.children {
            child.push_post_order(order);
        }
        order.push(self);
    }
}

/// Flat reaction entry of a synthesis, one per tree node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEntry {
    /// Node identifier
    pub id: String,
    /// Reaction SMILES
    pub smiles: String,
}

/// Three aligned views of one synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisPlan {
    /// Synthesis identifier
    #[serde(default)]
    pub synthesis_id: String,
    /// Hierarchical structure
    pub tree: SynthesisNode,
    /// One entry per tree node
    #[serde(default)]
    pub reactions: Vec<ReactionEntry>,
    /// Every node's actions, concatenated in dependency order
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Execution status
///
/// The set is open: unknown statuses are kept in `Other` and treated as
/// non-terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExecutionStatus {
    /// Accepted, waiting for hardware
    Pending,
    /// Executing
    Running,
    /// Completed successfully
    Done,
    /// Stopped with an error
    Failed,
    /// Stopped by an operator
    Aborted,
    /// Status not known to this client
    Other(String),
}

impl ExecutionStatus {
    /// Whether polling can stop
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Done | ExecutionStatus::Failed | ExecutionStatus::Aborted
        )
    }

    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            ExecutionStatus::Pending => "PENDING",
            ExecutionStatus::Running => "RUNNING",
            ExecutionStatus::Done => "DONE",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::Aborted => "ABORTED",
            ExecutionStatus::Other(s) => s,
        }
    }
}

impl From<String> for ExecutionStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "PENDING" | "NEW" | "QUEUED" => ExecutionStatus::Pending,
            "RUNNING" | "PROCESSING" => ExecutionStatus::Running,
            "DONE" | "SUCCESS" => ExecutionStatus::Done,
            "FAILED" | "FAILURE" | "ERROR" => ExecutionStatus::Failed,
            "ABORTED" | "CANCELLED" => ExecutionStatus::Aborted,
            _ => ExecutionStatus::Other(value),
        }
    }
}

impl From<ExecutionStatus> for String {
    fn from(value: ExecutionStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to one analysis action whose report can be downloaded
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReportRef {
    /// Synthesis the action belongs to
    pub synthesis_id: String,
    /// Node the action belongs to
    pub node_id: String,
    /// Index of the action within the node's list
    pub action_index: usize,
}

impl AnalysisReportRef {
    /// File name used when saving the report
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.pdf",
            sanitize(&self.synthesis_id),
            sanitize(&self.node_id),
            self.action_index
        )
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_deserialization() {
        let json = json!({
            "synthesisId": "syn-1",
            "tree": {
                "id": "root",
                "smiles": "CC(=O)NC1=CC=C(Br)C=C1",
                "actions": [{"name": "stir", "content": {}}],
                "children": [
                    {"id": "leaf-1", "smiles": "CC(=O)Cl", "actions": []}
                ]
            },
            "reactions": [
                {"id": "root", "smiles": "CC(=O)Cl.NC1=CC=C(Br)C=C1>>CC(=O)NC1=CC=C(Br)C=C1"},
                {"id": "leaf-1", "smiles": "CC(=O)Cl"}
            ],
            "actions": [{"name": "stir", "content": {}}]
        });
        let plan: SynthesisPlan = serde_json::from_value(json).unwrap();
        assert_eq!(plan.synthesis_id, "syn-1");
        assert_eq!(plan.tree.children.len(), 1);
        assert!(plan.tree.find("leaf-1").is_some());
        assert!(plan.tree.find("missing").is_none());
        let order: Vec<&str> = plan
            .tree
            .dependency_order()
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(order, vec!["leaf-1", "root"]);
    }

    #[test]
    fn test_execution_status_open_set() {
        let status: ExecutionStatus = serde_json::from_value(json!("done")).unwrap();
        assert_eq!(status, ExecutionStatus::Done);
        assert!(status.is_terminal());

        let status: ExecutionStatus = serde_json::from_value(json!("CALIBRATING")).unwrap();
        assert_eq!(status, ExecutionStatus::Other("CALIBRATING".to_string()));
        assert!(!status.is_terminal());
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("CALIBRATING"));
    }

    #[test]
    fn test_report_file_name() {
        let report = AnalysisReportRef {
            synthesis_id: "syn/1".to_string(),
            node_id: "node 2".to_string(),
            action_index: 4,
        };
        assert_eq!(report.file_name(), "syn_1_node_2_4.pdf");
    }
}
