//! Tree adapters
//!
//! Pure functions over fetched trees: flattening a retrosynthetic path into
//! reactions, and locating each node's actions inside a synthesis plan's
//! flat action list. No I/O happens here.

use crate::error::ClientError;
use crate::models::{RetrosynthesisPath, SynthesisPlan};
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;

/// A single reaction step: reactants combine into the product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    /// Reactant SMILES, in tree order
    pub reactants: Vec<String>,
    /// Product SMILES
    pub product: String,
}

impl fmt::Display for Reaction {
    /// Reaction SMILES, `A.B>>P`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>>{}", self.reactants.join("."), self.product)
    }
}

/// Lazy pre-order walk over the reactions of a path
///
/// Cloning snapshots the walk at its current position; call [`collect_reactions`] again to
/// start over from the root.
#[derive(Debug, Clone)]
pub struct Reactions<'a> {
    stack: Vec<&'a RetrosynthesisPath>,
}

impl<'a> Iterator for Reactions<'a> {
    type Item = Reaction;

    fn next(&mut self) -> Option<Reaction> {
        while let Some(node) = self.stack.pop() {
            // Children pushed in reverse so the leftmost is visited first
            self.stack.extend(node.children.iter().rev());
            if !node.children.is_empty() {
                return Some(Reaction {
                    reactants: node.children.iter().map(|c| c.smiles.clone()).collect(),
                    product: node.smiles.clone(),
                });
            }
        }
        None
    }
}

/// Reactions of a retrosynthetic path, depth-first pre-order
///
/// One reaction per node with at least one child; leaves emit nothing.
///
/// # Example
/// ```
/// use rxn_orchestrator::models::RetrosynthesisPath;
/// use rxn_orchestrator::tree::collect_reactions;
///
/// let path: RetrosynthesisPath = serde_json::from_str(
///     r#"{"smiles": "CCO", "children": [{"smiles": "C"}, {"smiles": "CO"}]}"#,
/// ).unwrap();
/// let reactions: Vec<String> = collect_reactions(&path).map(|r| r.to_string()).collect();
/// assert_eq!(reactions, vec!["C.CO>>CCO"]);
/// ```
pub fn collect_reactions(path: &RetrosynthesisPath) -> Reactions<'_> {
    Reactions { stack: vec![path] }
}

/// Where one node's actions sit inside the plan's flat action list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpan {
    /// Node identifier
    pub node_id: String,
    /// Index range into `SynthesisPlan::actions`
    pub range: Range<usize>,
}

impl SynthesisPlan {
    /// Node action spans, in dependency order
    ///
    /// Spans are computed from each node's local action count; they line up
    /// with `actions` only for a consistent plan (see
    /// [`SynthesisPlan::check_consistency`]).
    pub fn action_spans(&self) -> Vec<ActionSpan> {
        let mut offset = 0;
        self.tree
            .dependency_order()
            .into_iter()
            .map(|node| {
                let start = offset;
                offset += node.actions.len();
                ActionSpan {
                    node_id: node.id.clone(),
                    range: start..offset,
                }
            })
            .collect()
    }

    /// Span of a single node
    pub fn node_action_span(&self, node_id: &str) -> Option<Range<usize>> {
        self.action_spans()
            .into_iter()
            .find(|span| span.node_id == node_id)
            .map(|span| span.range)
    }

    /// Verify that tree, reactions and actions describe the same synthesis
    ///
    /// # Errors
    /// * `ClientError::Service` describing the first mismatch found
    pub fn check_consistency(&self) -> Result<(), ClientError> {
        let order = self.tree.dependency_order();
        let node_ids: HashSet<&str> = order.iter().map(|node| node.id.as_str()).collect();

        if let Some(orphan) = self
            .reactions
            .iter()
            .find(|reaction| !node_ids.contains(reaction.id.as_str()))
        {
            return Err(ClientError::service(format!(
                "synthesis {}: reaction {} has no tree node",
                self.synthesis_id, orphan.id
            )));
        }

        let local_total: usize = order.iter().map(|node| node.actions.len()).sum();
        if local_total != self.actions.len() {
            return Err(ClientError::service(format!(
                "synthesis {}: nodes hold {} actions but the plan lists {}",
                self.synthesis_id,
                local_total,
                self.actions.len()
            )));
        }

        for (node, span) in order.iter().zip(self.action_spans()) {
            if node.actions[..] != self.actions[span.range.clone()] {
                return Err(ClientError::service(format!(
                    "synthesis {}: actions of node {} differ from plan positions {:?}",
                    self.synthesis_id, node.id, span.range
                )));
            }
        }

        Ok(())
    }
}
