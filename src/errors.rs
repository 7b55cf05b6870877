//! Error types for the RGS core.
//!
//! Each subsystem has its own error enum; the router rolls them up into
//! `DispatchError`, and the API boundary maps every variant to one of the
//! fixed client-safe messages. Internal detail is logged, never returned.

use thiserror::Error;

/// PRNG input validation errors.
///
/// Validation variants are caller mistakes and map to 4xx at the boundary;
/// nothing here ever carries entropy-source internals.
#[derive(Debug, Error)]
pub enum PrngError {
    #[error("minimum must be >= 0, got {0}")]
    NegativeMinimum(i64),

    #[error("maximum ({max}) must be greater than minimum ({min})")]
    EmptyRange { min: i64, max: i64 },

    #[error("distribution total weight must be > 0")]
    ZeroTotalWeight,

    #[error("distribution must be a non-empty sequence of [value, weight] pairs")]
    MalformedDistribution,
}

/// Integrity verification and lock marker errors.
#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("failed to read protected file {path}: {source}")]
    ProtectedFileUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write lock marker {path}: {source}")]
    MarkerWriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Session / catalog store errors. Collaborator implementations wrap their
/// own failures in `Backend`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Plugin registry resolution errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no implementation registered for basegame '{0}'")]
    NotFound(String),

    #[error("implementation for basegame '{basegame}' failed to construct: {reason}")]
    ConstructionFailed { basegame: String, reason: String },
}

/// Errors raised inside a game implementation's lifecycle methods.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("malformed game request: {0}")]
    BadRequest(String),

    #[error("game state error: {0}")]
    State(String),

    #[error(transparent)]
    Prng(#[from] PrngError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Rollup used by the request router. The API boundary is the only place
/// that inspects this; see `api::errors`.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Fail-closed security gate: the integrity lock is engaged.
    #[error("system lock is engaged")]
    Locked,

    /// Unknown or missing session id. Deliberately identical for both so
    /// callers cannot probe which ids exist.
    #[error("session is invalid")]
    InvalidSession,

    #[error("game '{game}' variant {variant:?} site {site:?} is not enabled")]
    Unavailable {
        game: String,
        variant: Option<String>,
        site: Option<String>,
    },

    /// Malformed inbound payload (missing session field, bad JSON shape).
    #[error("malformed request payload: {0}")]
    BadPayload(String),

    #[error(transparent)]
    Prng(#[from] PrngError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
