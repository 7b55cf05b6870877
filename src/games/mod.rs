//! Game implementation contract and dispatch types.
//!
//! A `GameImplementation` is constructed fresh for every request from the
//! shared [`GameContext`]; it owns no global state and draws all randomness
//! from the PRNG service it was handed.

pub mod hilo;
pub mod types;

use crate::config::RgsConfig;
use crate::errors::GameError;
use crate::prng::PrngService;
use crate::store::SessionStore;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use types::{InitializeRequest, PlayRequest, RecallRequest, RecoveryRequest};

/// Shared collaborators handed to a game implementation at construction.
#[derive(Clone)]
pub struct GameContext {
    pub config: Arc<RgsConfig>,
    pub sessions: Arc<dyn SessionStore>,
    pub prng: PrngService,
}

/// One game's lifecycle surface. Each method takes a strongly-typed request
/// built from the inbound payload and returns the serialized result the
/// router passes back to the client.
#[async_trait]
pub trait GameImplementation: Send + Sync {
    async fn initialize(&self, req: InitializeRequest) -> Result<Value, GameError>;
    async fn play(&self, req: PlayRequest) -> Result<Value, GameError>;
    async fn recall(&self, req: RecallRequest) -> Result<Value, GameError>;
    async fn recovery(&self, req: RecoveryRequest) -> Result<Value, GameError>;
}
