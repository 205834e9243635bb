use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lenient::null_as_default;

/// A tracked identity on the roster.
///
/// `puuid` is assigned by the match provider and never changes. `name`,
/// `tag` and `card` are display fields refreshed from the newest eligible
/// match. Fields the engine does not know about (avatars managed by the UI,
/// notes, ...) are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub puuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag: String,
    /// Card image reference (provider URL of the small player card).
    #[serde(default, deserialize_with = "null_as_default")]
    pub card: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Player {
    pub fn new(puuid: impl Into<String>) -> Self {
        Self {
            puuid: puuid.into(),
            ..Default::default()
        }
    }

    /// `name#tag`, the provider's display handle.
    pub fn handle(&self) -> String {
        format!("{}#{}", self.name, self.tag)
    }
}

/// The roster document: tracked players plus the watermark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub players: Vec<Player>,
    /// Identifier of the most recent eligible match already reconciled.
    #[serde(
        rename = "newestMatchID",
        default,
        deserialize_with = "null_as_default"
    )]
    pub newest_match_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserState {
    pub fn puuids(&self) -> BTreeSet<String> {
        self.players.iter().map(|p| p.puuid.clone()).collect()
    }

    pub fn watermark(&self) -> Option<&str> {
        self.newest_match_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_state_roundtrips_watermark_key() {
        let doc = json!({
            "players": [{ "puuid": "p1", "name": "Ace", "tag": "EU1", "card": "c", "avatar": "avatars/p1.png" }],
            "newestMatchID": "m-7"
        });
        let st: UserState = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(st.watermark(), Some("m-7"));
        assert_eq!(st.players[0].extra.get("avatar"), Some(&json!("avatars/p1.png")));
        assert_eq!(serde_json::to_value(&st).unwrap(), doc);
    }

    #[test]
    fn null_watermark_and_missing_players_default() {
        let st: UserState = serde_json::from_value(json!({ "newestMatchID": null })).unwrap();
        assert!(st.players.is_empty());
        assert_eq!(st.watermark(), None);
    }

    #[test]
    fn handle_joins_name_and_tag() {
        let mut p = Player::new("p1");
        p.name = "Ace".into();
        p.tag = "EU1".into();
        assert_eq!(p.handle(), "Ace#EU1");
    }
}
