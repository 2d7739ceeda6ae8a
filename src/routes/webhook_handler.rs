use crate::app_state::AppState;
use crate::error::DispatchError;
use crate::mirror::dispatch::{handle_delivery, Delivery, Outcome};

use axum::body::to_bytes;
use axum::body::Body;
use axum::extract::Request;
use axum::http::HeaderMap;
use axum::{extract::State, http::StatusCode};
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

/// GitHub caps webhook payloads at 25 MB.
const MAX_PAYLOAD_BYTES: usize = 25 * 1024 * 1024;

const ACK: &str = "OK\n";

/// Accepts every delivery on any path and always answers `200 OK`.
/// The result of the mirror work only ever shows up in the logs.
///
/// The mirror work runs on its own task: a sender that hangs up early
/// does not cancel a clone or sync that is already underway.
pub async fn webhook_handler(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
) -> (StatusCode, &'static str) {
    let delivery_id = header(&headers, "X-GitHub-Delivery")
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let span = tracing::info_span!("delivery", delivery = %delivery_id);

    let (_parts, body) = req.into_parts();
    let body_bytes = match to_bytes(body, MAX_PAYLOAD_BYTES).instrument(span.clone()).await {
        Ok(bytes) => bytes,
        Err(e) => {
            span.in_scope(|| error!("failed to read request body: {}", e));
            return (StatusCode::OK, ACK);
        }
    };

    let signature = header(&headers, "X-Hub-Signature-256").map(str::to_owned);
    let event = header(&headers, "X-GitHub-Event").map(str::to_owned);

    let task = tokio::spawn(
        async move {
            let delivery = Delivery {
                signature: signature.as_deref(),
                event: event.as_deref(),
            };

            match handle_delivery(&state.config, delivery, &body_bytes).await {
                Ok(Outcome::Executed(action)) => info!(?action, "delivery handled"),
                Ok(Outcome::Ignored(reason)) => info!(?reason, "delivery ignored"),
                Err(DispatchError::InvalidSignature) => warn!("Invalid signature"),
                Err(e) => error!("delivery failed: {}", e),
            }
        }
        .instrument(span.clone()),
    );

    if let Err(e) = task.await {
        span.in_scope(|| error!("delivery task panicked: {}", e));
    }

    (StatusCode::OK, ACK)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
