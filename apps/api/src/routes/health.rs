use axum::Json;
use serde_json::{json, Value};

/// GET / and GET /health
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "online",
        "message": "ATS Analysis Backend is running successfully.",
        "endpoints": {
            "analyze": "/analyze [POST]"
        }
    }))
}
