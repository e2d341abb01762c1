//! Axum route handler for the analysis endpoint.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use tracing::{debug, info};

use crate::analysis::payload::{build_payload, PDF_MIME_TYPE};
use crate::analysis::validator::{validate, AnalysisReport};
use crate::errors::AppError;
use crate::state::AppState;

pub const MISSING_INPUT_MESSAGE: &str = "Missing job description or resume file.";
pub const UNSUPPORTED_FILE_MESSAGE: &str = "Only PDF files are supported.";

const JOB_DESCRIPTION_FIELD: &str = "job_description";
const RESUME_FIELD: &str = "resume_pdf";

/// A validated submission: non-empty job description and a PDF-typed file.
#[derive(Debug)]
pub struct AnalysisRequest {
    pub job_description: String,
    pub resume: Bytes,
}

#[derive(Debug)]
struct ResumeUpload {
    content_type: Option<String>,
    bytes: Bytes,
}

/// POST /analyze
///
/// Multipart form with `job_description` (text) and `resume_pdf` (file).
/// Returns the validated analysis report as-is.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisReport>, AppError> {
    let request = read_analysis_request(multipart).await?;
    info!(
        "Analyzing resume ({} bytes) against job description ({} chars)",
        request.resume.len(),
        request.job_description.chars().count()
    );

    let payload = build_payload(&request.job_description, &request.resume, PDF_MIME_TYPE);
    let raw = state.gemini.generate_content(&payload).await?;
    let report = validate(&raw)?;

    Ok(Json(report))
}

/// Reads the form and checks presence before media type.
async fn read_analysis_request(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<AnalysisRequest, AppError> {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            debug!("Not a multipart submission: {rejection}");
            return Err(AppError::Validation(MISSING_INPUT_MESSAGE.to_string()));
        }
    };

    let mut job_description: Option<String> = None;
    let mut resume: Option<ResumeUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed_form)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(JOB_DESCRIPTION_FIELD) if job_description.is_none() => {
                job_description = Some(field.text().await.map_err(malformed_form)?);
            }
            Some(RESUME_FIELD) if resume.is_none() => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(malformed_form)?;
                resume = Some(ResumeUpload {
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    let job_description = job_description.filter(|jd| !jd.is_empty());
    let resume = resume.filter(|r| !r.bytes.is_empty());

    let (Some(job_description), Some(resume)) = (job_description, resume) else {
        return Err(AppError::Validation(MISSING_INPUT_MESSAGE.to_string()));
    };

    if !is_pdf(resume.content_type.as_deref()) {
        return Err(AppError::Validation(UNSUPPORTED_FILE_MESSAGE.to_string()));
    }

    Ok(AnalysisRequest {
        job_description,
        resume: resume.bytes,
    })
}

/// A form the parser cannot read counts as missing input; only the body
/// limit keeps its own status.
fn malformed_form(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::Multipart(err);
    }
    debug!("Unreadable multipart form: {err}");
    AppError::Validation(MISSING_INPUT_MESSAGE.to_string())
}

/// Compares the MIME essence: parameters are ignored, case-insensitive.
fn is_pdf(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case(PDF_MIME_TYPE))
        .unwrap_or(false)
}
