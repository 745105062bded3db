use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use kudos_core::clock::{Clock, SystemClock};
use kudos_slack::events::{decode_callback, IncomingEvent, SlackCallback};
use kudos_slack::signature::{SignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};

pub const EVENTS_PATH: &str = "/slack/events";

#[derive(Clone)]
pub struct IngressState {
    verifier: SignatureVerifier,
    queue: mpsc::Sender<IncomingEvent>,
    clock: Arc<dyn Clock>,
}

impl IngressState {
    pub fn new(verifier: SignatureVerifier, queue: mpsc::Sender<IncomingEvent>) -> Self {
        Self { verifier, queue, clock: Arc::new(SystemClock) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

pub fn router(state: IngressState) -> Router {
    Router::new().route(EVENTS_PATH, post(slack_events)).with_state(state)
}

/// Verifies and decodes one Events API callback and hands it to the event loop.
/// Never waits on the loop: a full queue answers 503 so Slack retries later.
pub async fn slack_events(
    State(state): State<IngressState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let timestamp = header(&headers, TIMESTAMP_HEADER);
    let signature = header(&headers, SIGNATURE_HEADER);
    if let Err(error) =
        state.verifier.verify(timestamp, signature, &body, state.clock.now().timestamp())
    {
        warn!(
            event_name = "ingress.slack.signature_rejected",
            error = %error,
            "rejected unsigned or stale slack callback"
        );
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match decode_callback(&body) {
        SlackCallback::UrlVerification { challenge } => {
            info!(event_name = "ingress.slack.url_verification", "answered url verification");
            Json(json!({ "challenge": challenge })).into_response()
        }
        SlackCallback::Ignored { reason } => {
            debug!(event_name = "ingress.slack.ignored", reason = %reason, "ignored slack callback");
            StatusCode::OK.into_response()
        }
        SlackCallback::Event { event_id, event } => {
            let correlation_id = event_id.unwrap_or_else(|| "unknown".to_string());
            let kind = event.kind();
            match state.queue.try_send(event) {
                Ok(()) => {
                    debug!(
                        event_name = "ingress.slack.event_queued",
                        correlation_id = %correlation_id,
                        event_type = kind,
                        "queued slack event"
                    );
                    StatusCode::OK.into_response()
                }
                Err(TrySendError::Full(_)) => {
                    warn!(
                        event_name = "ingress.slack.queue_full",
                        correlation_id = %correlation_id,
                        event_type = kind,
                        "event queue is full; asking slack to retry"
                    );
                    StatusCode::SERVICE_UNAVAILABLE.into_response()
                }
                Err(TrySendError::Closed(_)) => {
                    warn!(
                        event_name = "ingress.slack.queue_closed",
                        correlation_id = %correlation_id,
                        event_type = kind,
                        "event loop has stopped"
                    );
                    StatusCode::SERVICE_UNAVAILABLE.into_response()
                }
            }
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
