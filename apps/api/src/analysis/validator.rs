//! Response Validator: extracts the generated report from a Gemini reply
//! and checks it carries every required key.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::analysis::schema::REQUIRED_FIELDS;
use crate::gemini_client::types::Candidate;

#[derive(Debug, Error)]
pub enum MalformedResponseError {
    #[error("reply has no candidates[0].content.parts[0].text")]
    MissingText,

    #[error("generated text is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("report is missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

impl MalformedResponseError {
    /// Fixed message returned to API callers.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MissingText | Self::InvalidJson(_) => "Failed to parse AI response.",
            Self::MissingFields(_) => "AI response was missing required fields.",
        }
    }
}

/// The validated report, serialized back exactly as the service produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnalysisReport(Map<String, Value>);

pub fn validate(raw: &Value) -> Result<AnalysisReport, MalformedResponseError> {
    // Only candidates[0] matters; later candidates may be blocked or partial.
    let candidate = raw
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| Candidate::deserialize(c).ok())
        .ok_or(MalformedResponseError::MissingText)?;
    let text = candidate.text().ok_or(MalformedResponseError::MissingText)?;

    let report = match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => map,
        _ => return Err(MalformedResponseError::MissingFields(REQUIRED_FIELDS.to_vec())),
    };

    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|key| !report.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(MalformedResponseError::MissingFields(missing));
    }

    Ok(AnalysisReport(report))
}
