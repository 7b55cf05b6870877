//! Session and game-catalog collaborators.
//!
//! The core only reads these: sessions are created by an external cashier
//! flow and games are enabled/disabled by back-office tooling. Both sit
//! behind traits so deployments can plug their own backends; the in-memory
//! implementations back development mode and the test suite.

use crate::errors::StoreError;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// A unique game run. Immutable from the core's perspective for the
/// lifetime of a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// Base catalog identifier for the game this session was opened for.
    pub game: String,
    /// Optional override identifier used for dispatch.
    #[serde(default)]
    pub basegame: Option<String>,
    /// RTP / rule variant selector.
    #[serde(default)]
    pub variant: Option<String>,
    /// Deployment / tenant selector.
    #[serde(default)]
    pub site: Option<String>,
}

impl Session {
    /// Identifier used for implementation dispatch: the `basegame` override
    /// when present, otherwise the session's `game`.
    pub fn basegame(&self) -> &str {
        self.basegame.as_deref().unwrap_or(&self.game)
    }
}

/// Read-only session lookup.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Session>, StoreError>;
}

/// Read-only lookup of whether a (game, variant, site) tuple is enabled.
#[async_trait]
pub trait GameCatalog: Send + Sync {
    async fn is_enabled(
        &self,
        game: &str,
        variant: Option<&str>,
        site: Option<&str>,
    ) -> Result<bool, StoreError>;
}

/// In-memory session store for development and tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.get(id).map(|entry| entry.value().clone()))
    }
}

type CatalogKey = (String, Option<String>, Option<String>);

/// In-memory game catalog for development and tests. Unknown tuples are
/// treated as disabled.
#[derive(Debug, Default)]
pub struct MemoryGameCatalog {
    entries: DashMap<CatalogKey, bool>,
}

impl MemoryGameCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_enabled(
        &self,
        game: &str,
        variant: Option<&str>,
        site: Option<&str>,
        enabled: bool,
    ) {
        self.entries.insert(
            (
                game.to_string(),
                variant.map(str::to_string),
                site.map(str::to_string),
            ),
            enabled,
        );
    }
}

#[async_trait]
impl GameCatalog for MemoryGameCatalog {
    async fn is_enabled(
        &self,
        game: &str,
        variant: Option<&str>,
        site: Option<&str>,
    ) -> Result<bool, StoreError> {
        let key = (
            game.to_string(),
            variant.map(str::to_string),
            site.map(str::to_string),
        );
        Ok(self.entries.get(&key).map(|e| *e).unwrap_or(false))
    }
}
