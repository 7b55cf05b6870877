//! Request handlers.
//!
//! Every lifecycle endpoint runs the same pipeline: system-lock gate,
//! session lookup, availability check, implementation resolution, then the
//! requested operation. Failures at any step short-circuit and are mapped
//! to fixed client messages at the boundary.

use super::errors::ApiError;
use super::middleware::RequestId;
use super::models::{AvailabilityResponse, HealthResponse};
use crate::config::RgsConfig;
use crate::errors::{DispatchError, StoreError};
use crate::games::GameContext;
use crate::integrity::SystemLock;
use crate::prng::{DistributionSpec, PrngService};
use crate::registry::PluginRegistry;
use crate::store::{GameCatalog, SessionStore};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Shared application state, constructed once at startup and injected into
/// every handler. Nothing here is ambient or global.
pub struct AppState {
    pub config: Arc<RgsConfig>,
    pub lock: SystemLock,
    pub sessions: Arc<dyn SessionStore>,
    pub catalog: Arc<dyn GameCatalog>,
    pub registry: Arc<PluginRegistry>,
    pub prng: PrngService,
}

impl AppState {
    /// Collaborator bundle handed to a game implementation for one request.
    pub fn game_context(&self) -> GameContext {
        GameContext {
            config: Arc::clone(&self.config),
            sessions: Arc::clone(&self.sessions),
            prng: self.prng,
        }
    }

    /// Development mode forces every game available; otherwise the catalog
    /// decides.
    async fn is_available(
        &self,
        game: &str,
        variant: Option<&str>,
        site: Option<&str>,
    ) -> Result<bool, StoreError> {
        if self.config.dev {
            return Ok(true);
        }
        self.catalog.is_enabled(game, variant, site).await
    }
}

#[derive(Debug, Clone, Copy)]
enum LifecycleOp {
    Initialize,
    Play,
    Recall,
    Recovery,
}

fn parse_payload(body: &Bytes) -> Result<Value, DispatchError> {
    serde_json::from_slice(body).map_err(|e| DispatchError::BadPayload(e.to_string()))
}

fn parse_request<T: DeserializeOwned>(payload: Value) -> Result<T, DispatchError> {
    serde_json::from_value(payload).map_err(|e| DispatchError::BadPayload(e.to_string()))
}

/// The common per-endpoint pipeline: gate, resolve session, check
/// availability, resolve implementation, invoke.
async fn dispatch_lifecycle(
    state: &AppState,
    payload: Value,
    op: LifecycleOp,
) -> Result<Value, DispatchError> {
    if state.lock.is_locked() {
        return Err(DispatchError::Locked);
    }

    // A missing session field reads the same as an unknown id on purpose.
    let session_id = payload
        .get("session")
        .and_then(Value::as_str)
        .ok_or(DispatchError::InvalidSession)?;

    let session = state
        .sessions
        .find_by_id(session_id)
        .await?
        .ok_or(DispatchError::InvalidSession)?;

    let basegame = session.basegame().to_string();

    let available = state
        .is_available(&basegame, session.variant.as_deref(), session.site.as_deref())
        .await?;
    if !available {
        return Err(DispatchError::Unavailable {
            game: basegame,
            variant: session.variant.clone(),
            site: session.site.clone(),
        });
    }

    let game = state
        .registry
        .resolve(&basegame, state.config.dev, state.game_context())?;

    let result = match op {
        LifecycleOp::Initialize => game.initialize(parse_request(payload)?).await?,
        LifecycleOp::Play => game.play(parse_request(payload)?).await?,
        LifecycleOp::Recall => game.recall(parse_request(payload)?).await?,
        LifecycleOp::Recovery => game.recovery(parse_request(payload)?).await?,
    };

    Ok(result)
}

/// Health check handler - minimal response time
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
    })
}

/// Game availability probe.
/// GET /idle/{gameid}/{session}
pub async fn idle_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path((gameid, session_id)): Path<(String, String)>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let result: Result<_, DispatchError> = async {
        if state.lock.is_locked() {
            return Err(DispatchError::Locked);
        }

        let session = state
            .sessions
            .find_by_id(&session_id)
            .await?
            .ok_or(DispatchError::InvalidSession)?;

        let available = state
            .is_available(&gameid, session.variant.as_deref(), session.site.as_deref())
            .await?;
        Ok(AvailabilityResponse { available })
    }
    .await;

    result
        .map(Json)
        .map_err(|e| ApiError::from_dispatch(&request_id.0, e))
}

macro_rules! lifecycle_handler {
    ($name:ident, $op:expr, $doc:literal) => {
        #[doc = $doc]
        pub async fn $name(
            Extension(request_id): Extension<RequestId>,
            State(state): State<Arc<AppState>>,
            body: Bytes,
        ) -> Result<Json<Value>, ApiError> {
            // Lock gate runs before the body is even parsed: a locked system
            // answers the same no matter what the client sent.
            let result = if state.lock.is_locked() {
                Err(DispatchError::Locked)
            } else {
                match parse_payload(&body) {
                    Ok(payload) => dispatch_lifecycle(&state, payload, $op).await,
                    Err(e) => Err(e),
                }
            };
            result
                .map(Json)
                .map_err(|e| ApiError::from_dispatch(&request_id.0, e))
        }
    };
}

lifecycle_handler!(initialize_handler, LifecycleOp::Initialize, "POST /initialize");
lifecycle_handler!(play_handler, LifecycleOp::Play, "POST /play");
lifecycle_handler!(recall_handler, LifecycleOp::Recall, "POST /recall");
lifecycle_handler!(recovery_handler, LifecycleOp::Recovery, "POST /recovery");

#[derive(Debug, Deserialize)]
pub struct RngQuery {
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_count() -> usize {
    1
}

/// Uniform draws over `[min, max)`.
/// GET /rng/{min}/{max}?count={n}
pub async fn rng_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path((min, max)): Path<(String, String)>,
    Query(params): Query<RngQuery>,
) -> Result<Json<Vec<i64>>, ApiError> {
    let result: Result<_, DispatchError> = (|| {
        if state.lock.is_locked() {
            return Err(DispatchError::Locked);
        }
        let min: i64 = min
            .parse()
            .map_err(|_| DispatchError::BadPayload(format!("invalid minimum '{}'", min)))?;
        let max: i64 = max
            .parse()
            .map_err(|_| DispatchError::BadPayload(format!("invalid maximum '{}'", max)))?;

        Ok(state.prng.range(min, max, params.count)?)
    })();

    result
        .map(Json)
        .map_err(|e| ApiError::from_dispatch(&request_id.0, e))
}

/// Uniformly random permutation of a JSON-encoded list path segment.
/// GET /shuffle/{list}
pub async fn shuffle_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(list): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let result: Result<_, DispatchError> = (|| {
        if state.lock.is_locked() {
            return Err(DispatchError::Locked);
        }
        let items: Vec<Value> = serde_json::from_str(&list)
            .map_err(|e| DispatchError::BadPayload(format!("invalid list: {}", e)))?;
        Ok(state.prng.shuffle(items))
    })();

    result
        .map(Json)
        .map_err(|e| ApiError::from_dispatch(&request_id.0, e))
}

/// One draw from a weighted distribution.
/// POST /distribution, body `[[value, weight], ...]`
pub async fn distribution_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let result: Result<_, DispatchError> = (|| {
        if state.lock.is_locked() {
            return Err(DispatchError::Locked);
        }
        let spec: DistributionSpec = serde_json::from_slice(&body)
            .map_err(|e| DispatchError::BadPayload(format!("invalid distribution: {}", e)))?;
        Ok(state.prng.weighted_sample(&spec)?)
    })();

    result
        .map(Json)
        .map_err(|e| ApiError::from_dispatch(&request_id.0, e))
}
