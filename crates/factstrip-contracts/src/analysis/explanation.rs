use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{required_text, SchemaError};
use crate::panels::PanelRole;

/// Four-step scientific walkthrough of a fact; step N narrates panel N.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub step1: String,
    pub step2: String,
    pub step3: String,
    pub step4: String,
}

impl Explanation {
    pub fn from_object(object: &Map<String, Value>) -> Result<Self, SchemaError> {
        Ok(Self {
            step1: required_text(object, "step1")?,
            step2: required_text(object, "step2")?,
            step3: required_text(object, "step3")?,
            step4: required_text(object, "step4")?,
        })
    }

    pub fn step(&self, role: PanelRole) -> &str {
        match role {
            PanelRole::Introduction => &self.step1,
            PanelRole::Investigation => &self.step2,
            PanelRole::Evidence => &self.step3,
            PanelRole::Conclusion => &self.step4,
        }
    }
}
