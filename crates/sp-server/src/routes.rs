//! Route table and request handlers.
//!
//! Every route is registered with `any` and checks the method itself, so a
//! wrong verb is answered with 400 like any other malformed request instead
//! of axum's 405.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::any;
use axum::{Json, Router};
use sp_core::{SegmentId, StationId, Timestep};
use sp_provider::{CancelToken, DownloadedSegment, Provider, ProviderStatus, VehicleCoverage};
use tracing::info;

use crate::{ApiError, ApiResult};

type AppState = State<Arc<Provider>>;

/// Build the provider's HTTP router.
pub fn router(provider: Arc<Provider>) -> Router {
    Router::new()
        .route("/tower/:station/:ts", any(tower_coverage))
        .route("/segments/:station", any(assigned_segments))
        .route("/downloaded", any(mark_downloaded))
        .route("/complete", any(complete))
        .route("/complete/:station", any(complete_station))
        .route("/status", any(status))
        .layer(middleware::from_fn(log_request))
        .with_state(provider)
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `GET /tower/{station}/{ts}` — may block until every station has asked for `ts`.
async fn tower_coverage(
    State(provider): AppState,
    method: Method,
    Path((station, ts)): Path<(String, String)>,
) -> ApiResult<Json<VehicleCoverage>> {
    expect_method(&method, &[Method::GET])?;
    let station = parse_station(&station)?;
    let ts = ts
        .parse::<u64>()
        .map(Timestep)
        .map_err(|_| ApiError::bad_request(format!("invalid timestep {ts:?}")))?;

    let token = CancelToken::new();
    let guard = CancelOnDrop::new(Arc::clone(&provider), token.clone());
    let coverage = tokio::task::spawn_blocking(move || provider.request_coverage(ts, &station, &token))
        .await
        .map_err(|e| ApiError::Worker(e.to_string()))??;
    guard.disarm();

    Ok(Json(coverage))
}

/// `GET /segments/{station}`
async fn assigned_segments(
    State(provider): AppState,
    method: Method,
    Path(station): Path<String>,
) -> ApiResult<Json<Vec<SegmentId>>> {
    expect_method(&method, &[Method::GET])?;
    let station = parse_station(&station)?;
    Ok(Json(provider.assigned_segments(&station).to_vec()))
}

/// `POST /downloaded` with a JSON array of `{vehicle_id, segment_id}`.
async fn mark_downloaded(State(provider): AppState, method: Method, body: Bytes) -> ApiResult<StatusCode> {
    expect_method(&method, &[Method::POST])?;
    let entries: Vec<DownloadedSegment> = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid downloaded body: {e}")))?;
    provider.mark_downloaded(entries);
    Ok(StatusCode::OK)
}

/// `GET /complete` — anonymous completion.
async fn complete(State(provider): AppState, method: Method) -> ApiResult<StatusCode> {
    expect_method(&method, &[Method::GET, Method::POST])?;
    provider.report_complete(None)?;
    Ok(StatusCode::OK)
}

/// `GET /complete/{station}` — completion counted once per station.
async fn complete_station(
    State(provider): AppState,
    method: Method,
    Path(station): Path<String>,
) -> ApiResult<StatusCode> {
    expect_method(&method, &[Method::GET, Method::POST])?;
    let station = parse_station(&station)?;
    provider.report_complete(Some(&station))?;
    Ok(StatusCode::OK)
}

/// `GET /status`
async fn status(State(provider): AppState, method: Method) -> ApiResult<Json<ProviderStatus>> {
    expect_method(&method, &[Method::GET])?;
    Ok(Json(provider.status()))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn expect_method(method: &Method, allowed: &[Method]) -> ApiResult<()> {
    if allowed.contains(method) {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!("method {method} not supported")))
    }
}

fn parse_station(raw: &str) -> ApiResult<StationId> {
    raw.parse::<StationId>()
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

/// Cancels a blocking coverage request if its handler future is dropped
/// (client disconnected) before the answer is ready.
struct CancelOnDrop {
    provider: Arc<Provider>,
    token:    Option<CancelToken>,
}

impl CancelOnDrop {
    fn new(provider: Arc<Provider>, token: CancelToken) -> Self {
        Self { provider, token: Some(token) }
    }

    fn disarm(mut self) {
        self.token = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            self.provider.cancel(&token);
        }
    }
}

/// One line per request: method, path, protocol, status.
async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let version = req.version();

    let response = next.run(req).await;

    info!(
        %method,
        %path,
        ?version,
        status = response.status().as_u16(),
        "request"
    );
    response
}
