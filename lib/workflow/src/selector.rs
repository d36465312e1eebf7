//! Approver selection.
//!
//! Decides which approver rule governs a stage for a given submission. A
//! direct stage always yields its rule; a conditional stage reads the value
//! of its condition field from the submitted documents and picks the first
//! variant whose comparison holds.

use crate::template::{ApproverRule, Stage, StageRouting};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One labelled value in a document section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentField {
    pub title: String,
    #[serde(default)]
    pub value: JsonValue,
}

/// A titled group of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub contents: Vec<ContentField>,
}

/// A form submitted along with a new workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedDocument {
    pub title: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Finds the numeric value of the first field titled `name`.
///
/// Documents, sections and contents are scanned in order. Only the first
/// matching field is considered: if its value is neither a number nor a
/// numeric string the result is `None`, even when a later field would have
/// matched.
#[must_use]
pub fn extract_condition_value(documents: &[SubmittedDocument], name: &str) -> Option<f64> {
    let field = documents
        .iter()
        .flat_map(|d| d.sections.iter())
        .flat_map(|s| s.contents.iter())
        .find(|c| c.title == name)?;

    match &field.value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Returns the approver rule that governs `stage` for this submission.
///
/// `None` means no condition variant matched.
#[must_use]
pub fn select_approver(stage: &Stage, documents: &[SubmittedDocument]) -> Option<ApproverRule> {
    match &stage.routing {
        StageRouting::Direct(rule) => Some(*rule),
        StageRouting::Conditional {
            condition,
            variants,
        } => {
            let value = extract_condition_value(documents, condition)?;
            variants
                .iter()
                .find(|v| v.operator.holds(value, v.value))
                .map(|v| v.approver)
        }
    }
}
