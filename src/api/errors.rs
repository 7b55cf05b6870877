//! Boundary error adapter.
//!
//! The single place internal error kinds become client responses. Clients
//! only ever see one of the fixed messages below in an `{"error": ...}`
//! body; the detailed cause is logged here and goes no further.

use crate::errors::{DispatchError, GameError, ResolveError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

pub const MSG_LOCKED: &str = "Error: The system is locked";
pub const MSG_INVALID_SESSION: &str = "Error: Session is invalid";
pub const MSG_UNAVAILABLE: &str = "Error: Game/Variant/Site is not available";
pub const MSG_BAD_PARAMETERS: &str = "Error: Invalid request parameters";
pub const MSG_SERVICE_UNAVAILABLE: &str = "Service is unavailable at this time. Please try again.";

/// Fixed-message error body returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

/// Client-facing error: a status code and one of the fixed messages.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: &'static str,
}

impl ApiError {
    pub fn locked() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: MSG_LOCKED,
        }
    }

    pub fn bad_parameters() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: MSG_BAD_PARAMETERS,
        }
    }

    /// Map a dispatch failure to its client message, logging the real cause
    /// against the request id. Missing implementations and internal failures
    /// collapse into the same generic message so the client never learns
    /// which occurred.
    pub fn from_dispatch(request_id: &str, err: DispatchError) -> Self {
        match &err {
            DispatchError::Locked => {
                info!(request_id, "request rejected: system lock engaged");
                Self::locked()
            }
            DispatchError::InvalidSession => {
                warn!(request_id, "request rejected: unknown or missing session id");
                Self {
                    status: StatusCode::BAD_REQUEST,
                    message: MSG_INVALID_SESSION,
                }
            }
            DispatchError::Unavailable { game, variant, site } => {
                info!(request_id, game = %game, ?variant, ?site, "game not enabled");
                Self {
                    status: StatusCode::BAD_REQUEST,
                    message: MSG_UNAVAILABLE,
                }
            }
            DispatchError::BadPayload(_)
            | DispatchError::Prng(_)
            | DispatchError::Game(GameError::BadRequest(_)) => {
                warn!(request_id, cause = %err, "request rejected: invalid input");
                Self::bad_parameters()
            }
            DispatchError::Resolve(ResolveError::NotFound(basegame)) => {
                // Internal misconfiguration: a catalog-enabled game with no
                // registered implementation.
                error!(request_id, basegame = %basegame, "no implementation registered for basegame");
                Self::service_unavailable()
            }
            DispatchError::Resolve(_) | DispatchError::Game(_) | DispatchError::Store(_) => {
                error!(request_id, cause = %err, "request failed internally");
                Self::service_unavailable()
            }
        }
    }

    fn service_unavailable() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: MSG_SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}
