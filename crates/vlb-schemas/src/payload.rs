//! Provider match payloads and the persisted match record.
//!
//! The upstream payload is kept verbatim as `serde_json::Value` (so a
//! persisted [`MatchRecord`] carries every field the provider sent, minus
//! `rounds`) alongside a typed, defaulted [`MatchView`] used by every
//! consumer inside the engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lenient::{lenient, lenient_vec, section};

// ---------------------------------------------------------------------------
// Typed view
// ---------------------------------------------------------------------------

/// `metadata` block of a match payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchMetadata {
    #[serde(default, deserialize_with = "lenient")]
    pub matchid: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub mode: String,
    #[serde(default, deserialize_with = "lenient")]
    pub mode_id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub map: String,
    /// Match start as UTC epoch seconds, when the provider sends it.
    #[serde(default, deserialize_with = "lenient")]
    pub game_start: Option<i64>,
    /// Human-readable start time as formatted by the provider.
    #[serde(default, deserialize_with = "lenient")]
    pub game_start_patched: String,
}

/// Per-player stat line for a single match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMatchStats {
    #[serde(default, deserialize_with = "lenient")]
    pub kills: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub deaths: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub assists: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub headshots: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub bodyshots: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub legshots: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCard {
    #[serde(default, deserialize_with = "lenient")]
    pub small: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAssets {
    #[serde(default, deserialize_with = "lenient")]
    pub card: PlayerCard,
}

/// One entry of `players.all_players`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPlayer {
    #[serde(default, deserialize_with = "lenient")]
    pub puuid: String,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub tag: String,
    /// `"Red"` or `"Blue"` as sent by the provider.
    #[serde(default, deserialize_with = "lenient")]
    pub team: String,
    #[serde(default, deserialize_with = "lenient")]
    pub stats: PlayerMatchStats,
    #[serde(default, deserialize_with = "lenient")]
    pub assets: PlayerAssets,
}

impl MatchPlayer {
    pub fn card_small(&self) -> &str {
        &self.assets.card.small
    }

    pub fn team_color(&self) -> Option<TeamColor> {
        TeamColor::parse(&self.team)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchPlayers {
    pub all_players: Vec<MatchPlayer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assistant {
    #[serde(default, deserialize_with = "lenient")]
    pub assistant_puuid: String,
}

/// One entry of the match `kills[]` event list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillEvent {
    #[serde(default, deserialize_with = "lenient")]
    pub killer_puuid: String,
    #[serde(default, deserialize_with = "lenient")]
    pub victim_puuid: String,
    #[serde(default, deserialize_with = "lenient")]
    pub assistants: Vec<Assistant>,
}

impl KillEvent {
    pub fn is_suicide(&self) -> bool {
        !self.killer_puuid.is_empty() && self.killer_puuid == self.victim_puuid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TeamColor {
    Red,
    Blue,
}

impl TeamColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamColor::Red => "Red",
            TeamColor::Blue => "Blue",
        }
    }

    /// Case-insensitive parse of a provider team label.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Some(TeamColor::Red),
            "blue" => Some(TeamColor::Blue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamOutcome {
    #[serde(default, deserialize_with = "lenient")]
    pub has_won: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub rounds_won: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub rounds_lost: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teams {
    #[serde(default, deserialize_with = "lenient")]
    pub red: Option<TeamOutcome>,
    #[serde(default, deserialize_with = "lenient")]
    pub blue: Option<TeamOutcome>,
}

impl Teams {
    /// The winning side, only when the result is decisive: exactly one of
    /// the two teams is flagged as winner.
    pub fn decisive_winner(&self) -> Option<TeamColor> {
        let red = self.red.as_ref().map(|t| t.has_won).unwrap_or(false);
        let blue = self.blue.as_ref().map(|t| t.has_won).unwrap_or(false);
        match (red, blue) {
            (true, false) => Some(TeamColor::Red),
            (false, true) => Some(TeamColor::Blue),
            _ => None,
        }
    }
}

/// Typed, fully defaulted view of a match payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchView {
    pub metadata: MatchMetadata,
    pub players: MatchPlayers,
    pub kills: Vec<KillEvent>,
    pub teams: Teams,
}

impl MatchView {
    /// Parse a provider payload. Never fails: a missing or wrong-typed field
    /// contributes its default without touching its siblings. Only list
    /// elements that are not objects at all are dropped.
    pub fn from_value(v: &Value) -> Self {
        Self {
            metadata: section(v, "metadata"),
            players: MatchPlayers {
                all_players: lenient_vec(v.get("players"), "all_players"),
            },
            kills: lenient_vec(Some(v), "kills"),
            teams: section(v, "teams"),
        }
    }

    pub fn match_id(&self) -> Option<&str> {
        self.metadata
            .matchid
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }

    pub fn participants(&self) -> &[MatchPlayer] {
        &self.players.all_players
    }

    pub fn participant(&self, puuid: &str) -> Option<&MatchPlayer> {
        self.players.all_players.iter().find(|p| p.puuid == puuid)
    }
}

// ---------------------------------------------------------------------------
// Raw payload + persisted record
// ---------------------------------------------------------------------------

/// A provider match as fetched: the verbatim payload plus its typed view.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMatch {
    raw: Value,
    view: MatchView,
}

impl RawMatch {
    pub fn from_value(raw: Value) -> Self {
        let view = MatchView::from_value(&raw);
        Self { raw, view }
    }

    pub fn view(&self) -> &MatchView {
        &self.view
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn match_id(&self) -> Option<&str> {
        self.view.match_id()
    }

    /// The persisted shape: the payload minus the heavyweight `rounds` field.
    pub fn to_record(&self) -> MatchRecord {
        let mut raw = self.raw.clone();
        if let Value::Object(map) = &mut raw {
            map.remove("rounds");
        }
        MatchRecord::from_value(raw)
    }
}

/// A batch of matches as returned by the remote source, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchBatch {
    pub matches: Vec<RawMatch>,
}

impl MatchBatch {
    /// Parse a `{ "data": [ MatchPayload ] }` response body. Returns `None`
    /// when `data` is absent or not an array.
    pub fn from_response(body: &Value) -> Option<Self> {
        let data = body.get("data")?.as_array()?;
        Some(Self {
            matches: data.iter().cloned().map(RawMatch::from_value).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// One persisted match document. Immutable once written.
///
/// Serializes as the bare payload; deserializing rebuilds the typed view.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    raw: Value,
    view: MatchView,
}

impl Serialize for MatchRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MatchRecord {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(MatchRecord::from_value)
    }
}

impl MatchRecord {
    pub fn from_value(raw: Value) -> Self {
        let view = MatchView::from_value(&raw);
        Self { raw, view }
    }

    pub fn view(&self) -> &MatchView {
        &self.view
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn match_id(&self) -> Option<&str> {
        self.view.match_id()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
