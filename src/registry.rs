//! Plugin registry: basegame identifier -> game implementation.
//!
//! The original deployment resolved games by importing `games/<id>/Model.py`
//! at request time; here every implementation registers a factory up front
//! and resolution is a lock-free map lookup. Factories can be re-registered
//! at runtime, which is how versioned implementations are hot-swapped.

use crate::errors::{GameError, ResolveError};
use crate::games::{GameContext, GameImplementation};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::warn;

/// Produces a fresh implementation per request. A handle never outlives the
/// request it was created for.
pub trait GameFactory: Send + Sync {
    fn create(&self, ctx: GameContext) -> Result<Box<dyn GameImplementation>, GameError>;
}

impl<F> GameFactory for F
where
    F: Fn(GameContext) -> Result<Box<dyn GameImplementation>, GameError> + Send + Sync,
{
    fn create(&self, ctx: GameContext) -> Result<Box<dyn GameImplementation>, GameError> {
        self(ctx)
    }
}

#[derive(Default)]
pub struct PluginRegistry {
    canonical: DashMap<String, Arc<dyn GameFactory>>,
    emulators: DashMap<String, Arc<dyn GameFactory>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the canonical implementation for a basegame.
    pub fn register(&self, basegame: &str, factory: impl GameFactory + 'static) {
        self.canonical.insert(basegame.to_string(), Arc::new(factory));
    }

    /// Register (or replace) the development-mode emulator for a basegame.
    pub fn register_emulator(&self, basegame: &str, factory: impl GameFactory + 'static) {
        self.emulators.insert(basegame.to_string(), Arc::new(factory));
    }

    /// Resolve a basegame to a fresh implementation.
    ///
    /// In development mode the emulator variant is preferred; if it is
    /// absent or fails to construct, resolution falls back to the canonical
    /// implementation. Outside development mode the emulator path is never
    /// attempted.
    pub fn resolve(
        &self,
        basegame: &str,
        dev_mode: bool,
        ctx: GameContext,
    ) -> Result<Box<dyn GameImplementation>, ResolveError> {
        if dev_mode {
            // Clone the factory handle out of the map so no shard lock is
            // held while constructing.
            let emulator = self.emulators.get(basegame).map(|e| Arc::clone(e.value()));
            if let Some(factory) = emulator {
                match factory.create(ctx.clone()) {
                    Ok(game) => return Ok(game),
                    Err(e) => {
                        warn!(basegame, error = %e, "emulator failed to construct, falling back to canonical");
                    }
                }
            }
        }

        let factory = self
            .canonical
            .get(basegame)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| ResolveError::NotFound(basegame.to_string()))?;

        factory
            .create(ctx)
            .map_err(|e| ResolveError::ConstructionFailed {
                basegame: basegame.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RgsConfig;
    use crate::games::types::{InitializeRequest, PlayRequest, RecallRequest, RecoveryRequest};
    use crate::prng::PrngService;
    use crate::store::MemorySessionStore;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct TaggedGame(&'static str);

    #[async_trait]
    impl GameImplementation for TaggedGame {
        async fn initialize(&self, _req: InitializeRequest) -> Result<Value, GameError> {
            Ok(json!({ "impl": self.0 }))
        }
        async fn play(&self, _req: PlayRequest) -> Result<Value, GameError> {
            Ok(json!({ "impl": self.0 }))
        }
        async fn recall(&self, _req: RecallRequest) -> Result<Value, GameError> {
            Ok(json!({ "impl": self.0 }))
        }
        async fn recovery(&self, _req: RecoveryRequest) -> Result<Value, GameError> {
            Ok(json!({ "impl": self.0 }))
        }
    }

    fn canonical_factory(_ctx: GameContext) -> Result<Box<dyn GameImplementation>, GameError> {
        Ok(Box::new(TaggedGame("canonical")))
    }

    fn emulator_factory(_ctx: GameContext) -> Result<Box<dyn GameImplementation>, GameError> {
        Ok(Box::new(TaggedGame("emulator")))
    }

    fn ctx() -> GameContext {
        GameContext {
            config: std::sync::Arc::new(RgsConfig::default()),
            sessions: std::sync::Arc::new(MemorySessionStore::new()),
            prng: PrngService::new(),
        }
    }

    async fn tag_of(game: Box<dyn GameImplementation>) -> String {
        let v = game
            .initialize(serde_json::from_value(json!({"session": "s"})).unwrap())
            .await
            .unwrap();
        v["impl"].as_str().unwrap().to_string()
    }

    #[test]
    fn unknown_basegame_is_not_found() {
        let registry = PluginRegistry::new();
        match registry.resolve("missing-game", false, ctx()) {
            Err(ResolveError::NotFound(name)) => assert_eq!(name, "missing-game"),
            Err(other) => panic!("expected NotFound, got {:?}", other),
            Ok(_) => panic!("expected NotFound, resolve succeeded"),
        }
    }

    #[tokio::test]
    async fn dev_mode_prefers_emulator() {
        let registry = PluginRegistry::new();
        registry.register("hilo", canonical_factory);
        registry.register_emulator("hilo", emulator_factory);

        let game = registry.resolve("hilo", true, ctx()).unwrap();
        assert_eq!(tag_of(game).await, "emulator");
    }

    #[tokio::test]
    async fn non_dev_mode_never_touches_emulator() {
        let registry = PluginRegistry::new();
        registry.register("hilo", canonical_factory);
        registry.register_emulator("hilo", emulator_factory);

        let game = registry.resolve("hilo", false, ctx()).unwrap();
        assert_eq!(tag_of(game).await, "canonical");
    }

    #[tokio::test]
    async fn broken_emulator_falls_back_to_canonical() {
        let registry = PluginRegistry::new();
        registry.register("hilo", canonical_factory);
        registry.register_emulator(
            "hilo",
            |_ctx: GameContext| -> Result<Box<dyn GameImplementation>, GameError> {
                Err(GameError::State("emulator assets missing".into()))
            },
        );

        let game = registry.resolve("hilo", true, ctx()).unwrap();
        assert_eq!(tag_of(game).await, "canonical");
    }

    #[tokio::test]
    async fn missing_emulator_falls_back_to_canonical() {
        let registry = PluginRegistry::new();
        registry.register("hilo", canonical_factory);

        let game = registry.resolve("hilo", true, ctx()).unwrap();
        assert_eq!(tag_of(game).await, "canonical");
    }

    #[tokio::test]
    async fn re_registration_hot_swaps_the_implementation() {
        let registry = PluginRegistry::new();
        registry.register(
            "hilo",
            |_ctx: GameContext| -> Result<Box<dyn GameImplementation>, GameError> {
                Ok(Box::new(TaggedGame("v1")))
            },
        );
        registry.register(
            "hilo",
            |_ctx: GameContext| -> Result<Box<dyn GameImplementation>, GameError> {
                Ok(Box::new(TaggedGame("v2")))
            },
        );

        let game = registry.resolve("hilo", false, ctx()).unwrap();
        assert_eq!(tag_of(game).await, "v2");
    }
}
