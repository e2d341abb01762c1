use std::sync::LazyLock;

use serde_json::{json, Value};

/// Keys every analysis report must carry.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "match_percentage",
    "strengths",
    "improvement_suggestions",
    "matching_skills",
    "missing_skills",
];

/// Structured-output schema passed to Gemini as `generationConfig.responseSchema`.
pub static RESPONSE_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "OBJECT",
        "properties": {
            "match_percentage": {
                "type": "STRING",
                "description": "The overall match score as a percentage string, e.g., '75%'."
            },
            "strengths": {
                "type": "STRING",
                "description": "A detailed, short paragraph summarizing the key strengths of the resume relative to the JD."
            },
            "improvement_suggestions": {
                "type": "STRING",
                "description": "A detailed, short paragraph providing specific suggestions for improving the resume's match."
            },
            "matching_skills": {
                "type": "ARRAY",
                "items": {"type": "STRING"},
                "description": "A list of relevant technical and soft skills found in the resume that match the JD."
            },
            "missing_skills": {
                "type": "ARRAY",
                "items": {"type": "STRING"},
                "description": "A list of critical skills mentioned in the JD that are missing or weakly represented in the resume."
            }
        },
        "required": REQUIRED_FIELDS
    })
});
