//! Lifecycle request types shared by all game implementations.
//!
//! Each request is deserialized from the raw inbound payload; fields a
//! specific game cares about beyond the common ones travel in `extra`.

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct InitializeRequest {
    pub session: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayRequest {
    pub session: String,
    /// Stake in minor units.
    #[serde(default)]
    pub bet: Option<u64>,
    /// Game-specific action selector ("higher", "lower", ...).
    #[serde(default)]
    pub action: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecallRequest {
    pub session: String,
    /// How many past rounds to return; games clamp to their own maximum.
    #[serde(default)]
    pub rounds: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecoveryRequest {
    pub session: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn play_request_keeps_unknown_fields() {
        let req: PlayRequest = serde_json::from_value(json!({
            "session": "s1",
            "bet": 100,
            "action": "higher",
            "lines": 20
        }))
        .unwrap();

        assert_eq!(req.session, "s1");
        assert_eq!(req.bet, Some(100));
        assert_eq!(req.extra.get("lines"), Some(&json!(20)));
    }

    #[test]
    fn session_field_is_required() {
        assert!(serde_json::from_value::<InitializeRequest>(json!({"bet": 1})).is_err());
    }
}
