//! Inbound message handlers

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use bolso_core::RouterResponse;

use super::twiml::messaging_response;
use crate::{AppError, AppState};

/// Liveness response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// Gateway webhook form fields
#[derive(Debug, Deserialize)]
pub struct WebhookForm {
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "MessageSid", default)]
    pub message_sid: Option<String>,
}

/// Request body for the JSON chat endpoint
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub body: String,
}

/// GET /health and GET /webhook/whatsapp (gateway verification)
pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ok" })
}

async fn dispatch(state: &AppState, from: &str, body: &str) -> Result<RouterResponse, AppError> {
    if from.trim().is_empty() || body.trim().is_empty() {
        return Err(AppError::bad_request("Sender and message body are required"));
    }

    let response = state.router.handle(from, body, state.today()).await;
    info!(
        intent = %response.intent.kind,
        replies = response.replies.len(),
        "Message handled"
    );
    Ok(response)
}

/// POST /webhook/whatsapp
pub async fn whatsapp_webhook(
    State(state): State<Arc<AppState>>,
    Form(form): Form<WebhookForm>,
) -> Result<Response, AppError> {
    info!(
        sid = form.message_sid.as_deref().unwrap_or("-"),
        "Inbound webhook message"
    );
    let response = dispatch(&state, &form.from, &form.body).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/xml; charset=utf-8")],
        messaging_response(&response.replies),
    )
        .into_response())
}

/// POST /api/messages
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<RouterResponse>, AppError> {
    let response = dispatch(&state, &request.from, &request.body).await?;
    Ok(Json(response))
}
