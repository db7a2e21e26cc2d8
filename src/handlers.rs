use crate::config::SettingsSource;
use crate::errors::AppError;
use crate::forwarder::forward_lead;
use crate::lead_models::{LeadOutcome, LeadSubmission};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Request, State},
    http::{Method, StatusCode},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// HTTP client shared by every outbound Mailchimp call.
    pub http: reqwest::Client,
    /// Where each request reads its Mailchimp settings from.
    pub settings: SettingsSource,
}

/// Builds the application routes (without server-level layers).
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/leads", any(lead_webhook))
        // Path used by the existing site forms
        .route("/.netlify/functions/mailchimp", any(lead_webhook))
        .with_state(state)
}

/// Builds the full application served by the binary.
///
/// The body limit only caps buffering inside `lead_webhook`, which checks the
/// method first, so every rejection on the lead routes is answered as JSON.
pub fn app(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    router(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/v1/leads
///
/// Receives a lead-capture form submission and forwards it to Mailchimp.
/// Mounted for every method so that anything but `POST` gets a JSON 405.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - The raw request; the body is only read for `POST` and is
///   parsed leniently (unreadable input becomes an empty lead).
///
/// # Returns
///
/// * `Result<LeadOutcome, AppError>` - The forwarding outcome or an error.
pub async fn lead_webhook(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<LeadOutcome, AppError> {
    if request.method() != Method::POST {
        tracing::warn!("Rejected {} on lead endpoint", request.method());
        return Err(AppError::MethodNotAllowed);
    }

    let body = Bytes::from_request(request, &state)
        .await
        .map_err(|rejection| AppError::BodyRejected {
            status: rejection.status(),
            reason: rejection.body_text(),
        })?;

    tracing::info!("📨 Received lead submission ({} bytes)", body.len());

    let lead = LeadSubmission::from_body(&body);
    let settings = state.settings.load();
    let outcome = forward_lead(&state.http, &settings, &lead).await?;

    tracing::info!("Lead submission handled: {:?}", outcome);
    Ok(outcome)
}
