use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use snowfall::{SnowflakeGeneratorAsyncTokioExt, SnowflakeId};

use super::{
    config::Generator,
    error::{ApiError, Result},
};

/// Shared state for all request handlers: one generator for the whole
/// process, behind an [`Arc`].
#[derive(Clone)]
pub struct AppState {
    generator: Arc<Generator>,
}

impl AppState {
    pub fn new(generator: Generator) -> Self {
        Self {
            generator: Arc::new(generator),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/id", get(next_id))
        .route("/id/{id}/decode", get(decode_id))
        .route("/health", get(health))
        .with_state(state)
}

/// `GET /id`: the next ID as a bare JSON integer.
async fn next_id(State(state): State<AppState>) -> Result<Json<i64>> {
    match state.generator.try_next_id_tokio().await {
        Ok(id) => {
            tracing::debug!(id = id.to_i64(), "issued id");
            Ok(Json(id.to_i64()))
        }
        Err(e @ snowfall::Error::ClockRegression { .. }) => {
            tracing::warn!("rejecting id request: {e}");
            Err(e.into())
        }
        Err(e) => {
            tracing::error!("id generation failed: {e}");
            Err(e.into())
        }
    }
}

/// The fields packed into an ID, plus its wall-clock time.
#[derive(Debug, Serialize)]
pub struct DecodedId {
    id: SnowflakeId,
    timestamp: u64,
    unix_millis: u64,
    generated_at: Option<String>,
    datacenter_id: u64,
    worker_id: u64,
    sequence: u64,
}

/// `GET /id/{id}/decode`: splits an ID issued under this server's epoch back
/// into its fields.
async fn decode_id(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<DecodedId>> {
    let id: SnowflakeId = raw.parse().map_err(|e: snowfall::Error| {
        tracing::debug!("rejecting decode request: {e}");
        ApiError::InvalidRequest {
            reason: e.to_string(),
        }
    })?;

    let unix_millis = id.unix_millis(state.generator.epoch());
    let generated_at = i64::try_from(unix_millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true));

    Ok(Json(DecodedId {
        id,
        timestamp: id.timestamp(),
        unix_millis,
        generated_at,
        datacenter_id: id.datacenter_id(),
        worker_id: id.worker_id(),
        sequence: id.sequence(),
    }))
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use core::time::Duration;
    use std::sync::atomic::{AtomicU64, Ordering};

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use snowfall::{NodeId, TimeSource};
    use tower::ServiceExt;

    use super::*;

    const EPOCH_MS: u64 = 1_565_193_600_000;

    #[derive(Clone)]
    struct TestClock {
        millis: Arc<AtomicU64>,
    }

    impl TestClock {
        fn set(&self, offset: u64) {
            self.millis.store(EPOCH_MS + offset, Ordering::Relaxed);
        }
    }

    impl TimeSource for TestClock {
        fn current_millis(&self) -> u64 {
            self.millis.load(Ordering::Relaxed)
        }
    }

    fn app(worker_id: i64, datacenter_id: i64, offset: u64) -> (Router, TestClock) {
        let clock = TestClock {
            millis: Arc::new(AtomicU64::new(EPOCH_MS + offset)),
        };
        let generator = Generator::with_epoch(
            NodeId::new(worker_id, datacenter_id).unwrap(),
            Duration::from_millis(EPOCH_MS),
            Box::new(clock.clone()),
        );
        (router(AppState::new(generator)), clock)
    }

    async fn request(app: &Router, uri: &str) -> Response {
        app.clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn issues_id_as_bare_integer() {
        let (app, _clock) = app(5, 3, 1000);

        let response = request(&app, "/id").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        let expected = (1000_i64 << 22) | (3 << 17) | (5 << 12);
        assert_eq!(body, serde_json::json!(expected));
    }

    #[tokio::test]
    async fn consecutive_ids_increase() {
        let (app, clock) = app(1, 1, 10);

        let a = json(request(&app, "/id").await).await.as_i64().unwrap();
        let b = json(request(&app, "/id").await).await.as_i64().unwrap();
        clock.set(11);
        let c = json(request(&app, "/id").await).await.as_i64().unwrap();

        assert!(a < b && b < c);
        assert_eq!(b - a, 1);
    }

    #[tokio::test]
    async fn clock_regression_is_service_unavailable() {
        let (app, clock) = app(1, 1, 1000);
        assert_eq!(request(&app, "/id").await.status(), StatusCode::OK);

        clock.set(998);
        let response = request(&app, "/id").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");

        let body = json(response).await;
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("clock moved backwards"), "{message}");

        // Once the clock catches up the same generator serves again.
        clock.set(1000);
        assert_eq!(request(&app, "/id").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn clock_before_epoch_is_internal_error() {
        let (app, clock) = app(1, 1, 0);
        clock.millis.store(EPOCH_MS - 1, Ordering::Relaxed);

        let response = request(&app, "/id").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn decodes_issued_id() {
        let (app, _clock) = app(5, 3, 1000);
        let id = json(request(&app, "/id").await).await.as_i64().unwrap();

        let response = request(&app, &format!("/id/{id}/decode")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["id"], serde_json::json!(id));
        assert_eq!(body["timestamp"], 1000);
        assert_eq!(body["unix_millis"], EPOCH_MS + 1000);
        assert_eq!(body["generated_at"], "2019-08-07T16:00:01.000Z");
        assert_eq!(body["datacenter_id"], 3);
        assert_eq!(body["worker_id"], 5);
        assert_eq!(body["sequence"], 0);
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request() {
        let (app, _clock) = app(1, 1, 0);

        for raw in ["abc", "-5", "9223372036854775808"] {
            let response = request(&app, &format!("/id/{raw}/decode")).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{raw}");
            let body = json(response).await;
            assert!(body["error"].as_str().unwrap().starts_with("Invalid request"));
        }
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (app, _clock) = app(0, 0, 0);

        let response = request(&app, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }
}
