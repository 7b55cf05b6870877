//! Hi-Lo demo game.
//!
//! Ships as the reference implementation registered at startup: a single
//! draw-and-guess card game, small enough to read in one sitting but
//! exercising the full lifecycle surface, the session store, and every
//! PRNG operation. Real games are expected to live out of tree and register
//! themselves the same way.

use super::types::{InitializeRequest, PlayRequest, RecallRequest, RecoveryRequest};
use super::{GameContext, GameImplementation};
use crate::errors::GameError;
use crate::prng::DistributionSpec;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

const DECK_SIZE: i64 = 52;
const SUITS: [&str; 4] = ["clubs", "diamonds", "hearts", "spades"];

/// Win multipliers drawn from a weighted distribution on every winning round.
fn multiplier_table() -> DistributionSpec {
    DistributionSpec(vec![(json!(2), 90), (json!(3), 9), (json!(10), 1)])
}

#[derive(Debug, Clone, Copy, Serialize)]
struct Card {
    /// 2..=14, ace high.
    rank: u8,
    suit: &'static str,
}

fn card_from_index(index: i64) -> Card {
    Card {
        rank: (index % 13) as u8 + 2,
        suit: SUITS[(index / 13) as usize],
    }
}

/// Stakes large enough to overflow the payout are rejected, not wrapped.
fn win_payout(bet: u64, multiplier: u64) -> Result<u64, GameError> {
    bet.checked_mul(multiplier)
        .ok_or_else(|| GameError::BadRequest("bet exceeds the payable stake limit".into()))
}

pub struct HiloGame {
    ctx: GameContext,
}

impl HiloGame {
    pub fn new(ctx: GameContext) -> Self {
        Self { ctx }
    }

    async fn load_variant(&self, session_id: &str) -> Result<Option<String>, GameError> {
        let session = self
            .ctx
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| GameError::State(format!("session {} vanished mid-request", session_id)))?;
        Ok(session.variant)
    }
}

#[async_trait]
impl GameImplementation for HiloGame {
    async fn initialize(&self, req: InitializeRequest) -> Result<Value, GameError> {
        let variant = self.load_variant(&req.session).await?;
        let draw = self.ctx.prng.range(0, DECK_SIZE, 1)?;
        let card = card_from_index(draw[0]);

        Ok(json!({
            "session": req.session,
            "variant": variant,
            "card": card,
            "round": 0,
        }))
    }

    async fn play(&self, req: PlayRequest) -> Result<Value, GameError> {
        let guess_higher = match req.action.as_deref() {
            Some("higher") => true,
            Some("lower") => false,
            other => {
                return Err(GameError::BadRequest(format!(
                    "action must be 'higher' or 'lower', got {:?}",
                    other
                )))
            }
        };
        let bet = match req.bet {
            Some(bet) if bet > 0 => bet,
            _ => return Err(GameError::BadRequest("bet must be a positive stake".into())),
        };

        let draws = self.ctx.prng.range(0, DECK_SIZE, 2)?;
        let current = card_from_index(draws[0]);
        let next = card_from_index(draws[1]);

        // Ties lose: the standard hi-lo house edge.
        let won = if guess_higher {
            next.rank > current.rank
        } else {
            next.rank < current.rank
        };

        let payout = if won {
            let multiplier = self.ctx.prng.weighted_sample(&multiplier_table())?;
            win_payout(bet, multiplier.as_u64().unwrap_or(2))?
        } else {
            0
        };

        Ok(json!({
            "session": req.session,
            "current": current,
            "next": next,
            "outcome": if won { "win" } else { "lose" },
            "payout": payout,
        }))
    }

    async fn recall(&self, req: RecallRequest) -> Result<Value, GameError> {
        // The demo keeps no round history; a production game reads its own
        // persistence through the store it was constructed with.
        let rounds = req.rounds.unwrap_or(10).min(50);
        Ok(json!({
            "session": req.session,
            "requested": rounds,
            "rounds": [],
        }))
    }

    async fn recovery(&self, req: RecoveryRequest) -> Result<Value, GameError> {
        // Nothing to recover: every demo round settles within its request.
        Ok(json!({
            "session": req.session,
            "recovered": false,
            "state": Value::Null,
        }))
    }
}

/// Development-mode stand-in: deterministic outcomes so front-end work does
/// not depend on luck. Only ever resolved when the dev flag is set.
pub struct HiloEmulator {
    _ctx: GameContext,
}

impl HiloEmulator {
    pub fn new(ctx: GameContext) -> Self {
        Self { _ctx: ctx }
    }
}

#[async_trait]
impl GameImplementation for HiloEmulator {
    async fn initialize(&self, req: InitializeRequest) -> Result<Value, GameError> {
        Ok(json!({
            "session": req.session,
            "variant": null,
            "card": Card { rank: 8, suit: "hearts" },
            "round": 0,
            "emulated": true,
        }))
    }

    async fn play(&self, req: PlayRequest) -> Result<Value, GameError> {
        let bet = req.bet.unwrap_or(100);
        Ok(json!({
            "session": req.session,
            "current": Card { rank: 5, suit: "clubs" },
            "next": Card { rank: 12, suit: "spades" },
            "outcome": "win",
            "payout": win_payout(bet, 2)?,
            "emulated": true,
        }))
    }

    async fn recall(&self, req: RecallRequest) -> Result<Value, GameError> {
        Ok(json!({ "session": req.session, "requested": 0, "rounds": [], "emulated": true }))
    }

    async fn recovery(&self, req: RecoveryRequest) -> Result<Value, GameError> {
        Ok(json!({ "session": req.session, "recovered": false, "state": null, "emulated": true }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RgsConfig;
    use crate::prng::PrngService;
    use crate::store::{MemorySessionStore, Session};
    use std::sync::Arc;

    fn context_with_session() -> GameContext {
        let sessions = Arc::new(MemorySessionStore::new());
        sessions.insert(Session {
            id: "s1".into(),
            game: "hilo".into(),
            basegame: None,
            variant: Some("96".into()),
            site: None,
        });
        GameContext {
            config: Arc::new(RgsConfig::default()),
            sessions,
            prng: PrngService::new(),
        }
    }

    #[tokio::test]
    async fn initialize_deals_a_valid_card() {
        let game = HiloGame::new(context_with_session());
        let result = game
            .initialize(serde_json::from_value(json!({"session": "s1"})).unwrap())
            .await
            .unwrap();

        let rank = result["card"]["rank"].as_u64().unwrap();
        assert!((2..=14).contains(&rank));
        assert_eq!(result["variant"], json!("96"));
    }

    #[tokio::test]
    async fn play_requires_action_and_positive_bet() {
        let game = HiloGame::new(context_with_session());

        let missing_action = game
            .play(serde_json::from_value(json!({"session": "s1", "bet": 10})).unwrap())
            .await;
        assert!(matches!(missing_action, Err(GameError::BadRequest(_))));

        let zero_bet = game
            .play(
                serde_json::from_value(json!({"session": "s1", "action": "higher", "bet": 0}))
                    .unwrap(),
            )
            .await;
        assert!(matches!(zero_bet, Err(GameError::BadRequest(_))));
    }

    #[tokio::test]
    async fn play_outcome_matches_card_comparison() {
        let game = HiloGame::new(context_with_session());

        for _ in 0..50 {
            let result = game
                .play(
                    serde_json::from_value(
                        json!({"session": "s1", "action": "higher", "bet": 100}),
                    )
                    .unwrap(),
                )
                .await
                .unwrap();

            let current = result["current"]["rank"].as_u64().unwrap();
            let next = result["next"]["rank"].as_u64().unwrap();
            let won = result["outcome"] == json!("win");
            assert_eq!(won, next > current);
            if won {
                assert!(result["payout"].as_u64().unwrap() >= 200);
            } else {
                assert_eq!(result["payout"], json!(0));
            }
        }
    }

    #[tokio::test]
    async fn oversized_bet_is_rejected_instead_of_wrapping() {
        let emulator = HiloEmulator::new(context_with_session());
        let result = emulator
            .play(
                serde_json::from_value(
                    json!({"session": "s1", "action": "lower", "bet": u64::MAX}),
                )
                .unwrap(),
            )
            .await;
        assert!(matches!(result, Err(GameError::BadRequest(_))));

        // The canonical game caps at the largest payable stake as well: the
        // top multiplier is 10, so any winning round above u64::MAX / 10
        // would overflow.
        assert!(win_payout(u64::MAX, 2).is_err());
        assert_eq!(win_payout(u64::MAX / 10, 10).unwrap(), u64::MAX / 10 * 10);
    }

    #[tokio::test]
    async fn emulator_always_wins() {
        let emulator = HiloEmulator::new(context_with_session());
        let result = emulator
            .play(
                serde_json::from_value(json!({"session": "s1", "action": "lower", "bet": 50}))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(result["outcome"], json!("win"));
        assert_eq!(result["payout"], json!(100));
        assert_eq!(result["emulated"], json!(true));
    }
}
