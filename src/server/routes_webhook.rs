use crate::output::write_attachments;
use crate::server::AppContext;
use crate::trigger::{WebhookLifecycle, WebhookRequest, SIGNATURE_HEADER};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use cloudconvert_common::Error;

pub fn webhook_routes() -> Router<AppContext> {
    Router::new().route("/webhook", post(handle_webhook))
}

async fn handle_webhook(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut request = WebhookRequest::new(body);
    if let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) {
        request = request.with_signature(signature);
    }

    let response = ctx
        .trigger
        .webhook(&ctx.hook_context(), request)
        .await
        .map_err(|e| match e {
            Error::InvalidResponse(_) => (StatusCode::BAD_REQUEST, e.to_string()),
            other => {
                tracing::warn!("Failed to process webhook: {}", other);
                (StatusCode::BAD_GATEWAY, other.to_string())
            }
        })?;

    if response.is_dropped() {
        return Ok(Json(serde_json::json!({ "status": "ignored" })));
    }

    let mut saved = Vec::new();
    for item in &response.items {
        tracing::debug!("Webhook item: {}", item.json);
        let paths = write_attachments(&ctx.output_dir, item).map_err(|e| {
            tracing::error!("{:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
        saved.extend(paths.into_iter().map(|p| p.display().to_string()));
    }

    Ok(Json(serde_json::json!({
        "status": "received",
        "items": response.items.len(),
        "attachments": saved
    })))
}
