use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use kudos_db::DbPool;
use kudos_slack::events::IncomingEvent;
use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    queue: mpsc::Sender<IncomingEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

impl HealthCheck {
    fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub ledger: HealthCheck,
    pub checked_at: String,
}

/// `queue` is the ingress side of the event queue; once the event loop drops its
/// receiver the service reports degraded.
pub fn router(db_pool: DbPool, queue: mpsc::Sender<IncomingEvent>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool, queue })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let service = service_check(&state.queue);
    let ledger = ledger_check(&state.db_pool).await;
    let ready = service.is_ready() && ledger.is_ready();

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service,
        ledger,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn service_check(queue: &mpsc::Sender<IncomingEvent>) -> HealthCheck {
    if queue.is_closed() {
        return HealthCheck { status: "degraded", detail: "kudos event loop has stopped".to_string() };
    }

    let queued = queue.max_capacity() - queue.capacity();
    HealthCheck {
        status: "ready",
        detail: format!("kudos event loop running, {queued}/{} events queued", queue.max_capacity()),
    }
}

async fn ledger_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM kudos_log WHERE id < 0")
        .fetch_one(pool)
        .await
    {
        Ok(_) => HealthCheck { status: "ready", detail: "kudos_log is readable".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("kudos_log query failed: {error}") }
        }
    }
}
