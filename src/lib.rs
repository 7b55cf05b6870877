//! RGS - Remote Game Server request layer.
//!
//! HTTP front for a remote gaming backend: session lifecycle endpoints
//! (initialize/play/recall/recovery) gated behind a fail-closed integrity
//! lock, a plugin registry resolving sessions to versioned game
//! implementations, and a cryptographically secure PRNG service.

pub mod api;
pub mod config;
pub mod errors;
pub mod games;
pub mod integrity;
pub mod prng;
pub mod registry;
pub mod store;

use errors::GameError;
use games::hilo::{HiloEmulator, HiloGame};
use games::{GameContext, GameImplementation};
use registry::PluginRegistry;

/// Registry with the built-in games. Deployments extend this with their own
/// implementations before starting the server.
pub fn default_registry() -> PluginRegistry {
    let registry = PluginRegistry::new();
    registry.register(
        "hilo",
        |ctx: GameContext| -> Result<Box<dyn GameImplementation>, GameError> {
            Ok(Box::new(HiloGame::new(ctx)))
        },
    );
    registry.register_emulator(
        "hilo",
        |ctx: GameContext| -> Result<Box<dyn GameImplementation>, GameError> {
            Ok(Box::new(HiloEmulator::new(ctx)))
        },
    );
    registry
}
