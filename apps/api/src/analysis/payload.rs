//! Payload Builder: turns a résumé file and a job description into a Gemini request.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::analysis::prompts::{ATS_SYSTEM_INSTRUCTION, ATS_USER_PROMPT_TEMPLATE};
use crate::analysis::schema::RESPONSE_SCHEMA;
use crate::gemini_client::types::{
    Content, GenerateContentRequest, GenerationConfig, InlineData, Part, SystemInstruction,
};

pub const PDF_MIME_TYPE: &str = "application/pdf";
const JSON_MIME_TYPE: &str = "application/json";

/// Wraps raw file bytes as an inline base64 part.
pub fn inline_file_part(bytes: &[u8], mime_type: &str) -> Part {
    Part::InlineData(InlineData {
        mime_type: mime_type.to_string(),
        data: STANDARD.encode(bytes),
    })
}

/// Builds the full analysis request. Pure: identical inputs give identical payloads.
pub fn build_payload(
    job_description: &str,
    resume_bytes: &[u8],
    mime_type: &str,
) -> GenerateContentRequest {
    let user_prompt = ATS_USER_PROMPT_TEMPLATE.replace("{job_description}", job_description);

    GenerateContentRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts: vec![
                Part::Text(user_prompt),
                inline_file_part(resume_bytes, mime_type),
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: JSON_MIME_TYPE.to_string(),
            response_schema: RESPONSE_SCHEMA.clone(),
        },
        system_instruction: SystemInstruction {
            parts: vec![Part::Text(ATS_SYSTEM_INSTRUCTION.to_string())],
        },
    }
}
