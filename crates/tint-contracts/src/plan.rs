use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// One surface recolor. Unknown surface names are tolerated here and skipped
/// when the plan is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    #[serde(rename = "surface", alias = "material", alias = "surfaceName")]
    pub surface_name: String,
    #[serde(rename = "color", alias = "colorHex")]
    pub color: Rgb,
}

impl Edit {
    pub fn new(surface_name: impl Into<String>, color: Rgb) -> Self {
        Self {
            surface_name: surface_name.into(),
            color,
        }
    }
}

/// Structured result of interpreting one instruction.
///
/// Wire shape: `{"edits": [{"surface": "...", "color": "#RRGGBB"}], "message": "...",
/// "confidence": 0.9}`. `changes`/`material` are accepted as aliases on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditPlan {
    #[serde(alias = "changes", default)]
    pub edits: Vec<Edit>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl EditPlan {
    pub fn new(edits: Vec<Edit>, message: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            edits,
            message: message.into(),
            confidence: confidence.map(clamp_confidence),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Parse a model-produced plan, enforcing the non-empty message invariant.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, String> {
        let mut plan: EditPlan =
            serde_json::from_value(value).map_err(|err| format!("plan shape mismatch: {err}"))?;
        plan.message = plan.message.trim().to_string();
        if plan.message.is_empty() {
            return Err("plan message is empty".to_string());
        }
        plan.confidence = plan.confidence.filter(|value| value.is_finite()).map(clamp_confidence);
        Ok(plan)
    }
}

fn clamp_confidence(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
