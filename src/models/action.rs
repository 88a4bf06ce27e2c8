//! Synthesis actions
//!
//! On the wire an action is `{name, content}` with `content` mapping a
//! parameter name to `{value, unit, quantity}`. Locally the known kinds are
//! variants with their key parameters lifted into fields; every other
//! parameter stays in the raw `content` map so edits round-trip losslessly.
//! Kinds this client does not know land in [`Action::Other`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw parameter map of an action
pub type ActionContent = BTreeMap<String, Parameter>;

/// Wire names of the known action kinds
pub mod kind {
    /// Add a material to the reactor
    pub const ADD: &str = "add";
    /// Stir for a duration, optionally at a temperature
    pub const STIR: &str = "stir";
    /// Wait for a duration
    pub const WAIT: &str = "wait";
    /// Dry the solution over a drying agent
    pub const DRY_SOLUTION: &str = "drysolution";
    /// Change the reactor temperature
    pub const SET_TEMPERATURE: &str = "settemperature";
    /// Run a spectrometric analysis, producing a report
    pub const SPECTROMETRIC_ANALYSIS: &str = "spectrometricanalysis";
}

const MATERIAL: &str = "material";
const DURATION: &str = "duration";
const TEMPERATURE: &str = "temperature";

/// A single action parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter value (number, string or structured)
    pub value: Value,
    /// Unit of `value`, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Quantity attached to the value (e.g. amount of a material)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Value>,
}

impl Parameter {
    /// Parameter with a value and no unit
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            unit: None,
            quantity: None,
        }
    }

    /// Set the unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Set the quantity
    pub fn with_quantity(mut self, quantity: impl Into<Value>) -> Self {
        self.quantity = Some(quantity.into());
        self
    }
}

/// One step of a synthesis procedure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAction", into = "RawAction")]
pub enum Action {
    /// Add a material
    Add {
        /// Material to add
        material: Option<Parameter>,
        /// Remaining parameters
        content: ActionContent,
    },
    /// Stir
    Stir {
        /// Stirring time
        duration: Option<Parameter>,
        /// Temperature while stirring
        temperature: Option<Parameter>,
        /// Remaining parameters
        content: ActionContent,
    },
    /// Wait
    Wait {
        /// Waiting time
        duration: Option<Parameter>,
        /// Remaining parameters
        content: ActionContent,
    },
    /// Dry the solution
    DrySolution {
        /// Drying time
        duration: Option<Parameter>,
        /// Remaining parameters
        content: ActionContent,
    },
    /// Set the reactor temperature
    SetTemperature {
        /// Target temperature
        temperature: Option<Parameter>,
        /// Remaining parameters
        content: ActionContent,
    },
    /// Spectrometric analysis
    SpectrometricAnalysis {
        /// Analysis parameters
        content: ActionContent,
    },
    /// Kind not known to this client, kept verbatim
    Other {
        /// Wire name
        name: String,
        /// Parameters
        content: ActionContent,
    },
}

/// Wire form of an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAction {
    /// Action kind identifier
    pub name: String,
    /// Parameter map
    #[serde(default)]
    pub content: ActionContent,
}

impl From<RawAction> for Action {
    fn from(raw: RawAction) -> Self {
        let RawAction { name, mut content } = raw;
        match name.as_str() {
            kind::ADD => Action::Add {
                material: content.remove(MATERIAL),
                content,
            },
            kind::STIR => Action::Stir {
                duration: content.remove(DURATION),
                temperature: content.remove(TEMPERATURE),
                content,
            },
            kind::WAIT => Action::Wait {
                duration: content.remove(DURATION),
                content,
            },
            kind::DRY_SOLUTION => Action::DrySolution {
                duration: content.remove(DURATION),
                content,
            },
            kind::SET_TEMPERATURE => Action::SetTemperature {
                temperature: content.remove(TEMPERATURE),
                content,
            },
            kind::SPECTROMETRIC_ANALYSIS => Action::SpectrometricAnalysis { content },
            _ => Action::Other { name, content },
        }
    }
}

impl From<Action> for RawAction {
    fn from(action: Action) -> Self {
        fn put(content: &mut ActionContent, key: &str, parameter: Option<Parameter>) {
            if let Some(parameter) = parameter {
                content.insert(key.to_string(), parameter);
            }
        }

        let name = action.name().to_string();
        let content = match action {
            Action::Add {
                material,
                mut content,
            } => {
                put(&mut content, MATERIAL, material);
                content
            }
            Action::Stir {
                duration,
                temperature,
                mut content,
            } => {
                put(&mut content, DURATION, duration);
                put(&mut content, TEMPERATURE, temperature);
                content
            }
            Action::Wait {
                duration,
                mut content,
            }
            | Action::DrySolution {
                duration,
                mut content,
            } => {
                put(&mut content, DURATION, duration);
                content
            }
            Action::SetTemperature {
                temperature,
                mut content,
            } => {
                put(&mut content, TEMPERATURE, temperature);
                content
            }
            Action::SpectrometricAnalysis { content } | Action::Other { content, .. } => content,
        };
        RawAction { name, content }
    }
}

impl Action {
    /// Add `material`
    pub fn add(material: Parameter) -> Self {
        Action::Add {
            material: Some(material),
            content: ActionContent::new(),
        }
    }

    /// Wait for `duration`
    pub fn wait(duration: Parameter) -> Self {
        Action::Wait {
            duration: Some(duration),
            content: ActionContent::new(),
        }
    }

    /// Dry the solution for `duration`
    pub fn dry_solution(duration: Parameter) -> Self {
        Action::DrySolution {
            duration: Some(duration),
            content: ActionContent::new(),
        }
    }

    /// Wire name of the action kind
    pub fn name(&self) -> &str {
        match self {
            Action::Add { .. } => kind::ADD,
            Action::Stir { .. } => kind::STIR,
            Action::Wait { .. } => kind::WAIT,
            Action::DrySolution { .. } => kind::DRY_SOLUTION,
            Action::SetTemperature { .. } => kind::SET_TEMPERATURE,
            Action::SpectrometricAnalysis { .. } => kind::SPECTROMETRIC_ANALYSIS,
            Action::Other { name, .. } => name.as_str(),
        }
    }

    /// Whether the action produces an analysis report
    pub fn is_analysis(&self) -> bool {
        matches!(self, Action::SpectrometricAnalysis { .. })
    }

    /// Look up a parameter by wire name
    pub fn parameter(&self, key: &str) -> Option<&Parameter> {
        let lifted = match (self, key) {
            (Action::Add { material, .. }, MATERIAL) => Some(material),
            (Action::Stir { duration, .. }, DURATION)
            | (Action::Wait { duration, .. }, DURATION)
            | (Action::DrySolution { duration, .. }, DURATION) => Some(duration),
            (Action::Stir { temperature, .. }, TEMPERATURE)
            | (Action::SetTemperature { temperature, .. }, TEMPERATURE) => Some(temperature),
            _ => None,
        };
        match lifted {
            Some(slot) => slot.as_ref(),
            None => self.content().get(key),
        }
    }

    /// Set a parameter by wire name, replacing any previous value
    pub fn set_parameter(&mut self, key: impl Into<String>, parameter: Parameter) {
        let mut raw = RawAction::from(self.clone());
        raw.content.insert(key.into(), parameter);
        *self = Action::from(raw);
    }

    /// Remove a parameter by wire name
    pub fn remove_parameter(&mut self, key: &str) -> Option<Parameter> {
        let mut raw = RawAction::from(self.clone());
        let removed = raw.content.remove(key);
        *self = Action::from(raw);
        removed
    }

    /// Parameters not lifted into variant fields
    pub fn content(&self) -> &ActionContent {
        match self {
            Action::Add { content, .. }
            | Action::Stir { content, .. }
            | Action::Wait { content, .. }
            | Action::DrySolution { content, .. }
            | Action::SetTemperature { content, .. }
            | Action::SpectrometricAnalysis { content }
            | Action::Other { content, .. } => content,
        }
    }

    /// Key parameters known to be required for this kind that are absent
    ///
    /// Advisory only: the service owns the full rule set and is the one that
    /// rejects a submission.
    pub fn missing_parameters(&self) -> Vec<&'static str> {
        let required: Vec<(&'static str, bool)> = match self {
            Action::Add { material, .. } => vec![(MATERIAL, material.is_some())],
            Action::Stir { duration, .. }
            | Action::Wait { duration, .. }
            | Action::DrySolution { duration, .. } => vec![(DURATION, duration.is_some())],
            Action::SetTemperature { temperature, .. } => {
                vec![(TEMPERATURE, temperature.is_some())]
            }
            Action::SpectrometricAnalysis { .. } | Action::Other { .. } => Vec::new(),
        };
        required
            .into_iter()
            .filter(|(_, present)| !present)
            .map(|(key, _)| key)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_kind_lifts_parameters() {
        let json = json!({
            "name": "drysolution",
            "content": {
                "duration": {"value": 30, "unit": "minute"},
                "material": {"value": "MgSO4", "quantity": {"value": 2, "unit": "g"}}
            }
        });
        let action: Action = serde_json::from_value(json).unwrap();
        match &action {
            Action::DrySolution { duration, content } => {
                assert_eq!(duration.as_ref().unwrap().value, json!(30));
                assert!(content.contains_key("material"));
                assert!(!content.contains_key("duration"));
            }
            other => panic!("Expected DrySolution, got: {:?}", other),
        }
        assert_eq!(action.parameter("duration").unwrap().unit.as_deref(), Some("minute"));
        assert_eq!(action.parameter("material").unwrap().value, json!("MgSO4"));
    }

    #[test]
    fn test_unknown_kind_is_preserved() {
        let json = json!({
            "name": "phaseseparation",
            "content": {"phase": {"value": "organic"}}
        });
        let action: Action = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(action.name(), "phaseseparation");
        assert!(matches!(action, Action::Other { .. }));
        assert_eq!(serde_json::to_value(&action).unwrap(), json);
    }

    #[test]
    fn test_missing_content_defaults_empty() {
        let action: Action = serde_json::from_value(json!({"name": "wait"})).unwrap();
        assert_eq!(action.missing_parameters(), vec!["duration"]);
    }

    #[test]
    fn test_set_parameter_routes_to_field() {
        let mut action: Action =
            serde_json::from_value(json!({"name": "drysolution", "content": {}})).unwrap();
        assert_eq!(action.missing_parameters(), vec!["duration"]);

        action.set_parameter("duration", Parameter::new(15).with_unit("minute"));
        assert!(action.missing_parameters().is_empty());
        match &action {
            Action::DrySolution { duration, content } => {
                assert!(duration.is_some());
                assert!(content.is_empty());
            }
            other => panic!("Expected DrySolution, got: {:?}", other),
        }

        let removed = action.remove_parameter("duration");
        assert!(removed.is_some());
        assert_eq!(action.missing_parameters(), vec!["duration"]);
    }

    #[test]
    fn test_serialize_writes_lifted_fields_back() {
        let action = Action::Stir {
            duration: Some(Parameter::new(2).with_unit("hour")),
            temperature: None,
            content: ActionContent::new(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["name"], "stir");
        assert_eq!(json["content"]["duration"]["unit"], "hour");
        assert!(json["content"].get("temperature").is_none());
    }

    #[test]
    fn test_analysis_kind() {
        let action: Action =
            serde_json::from_value(json!({"name": "spectrometricanalysis"})).unwrap();
        assert!(action.is_analysis());
        assert!(action.missing_parameters().is_empty());
        assert!(!Action::wait(Parameter::new(1)).is_analysis());
    }
}
