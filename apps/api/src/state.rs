use crate::gemini_client::GeminiClient;

/// Shared application state injected into all route handlers via Axum extractors.
/// Requests share nothing mutable; the client is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub gemini: GeminiClient,
}
