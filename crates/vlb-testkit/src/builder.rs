use serde_json::{json, Value};
use vlb_schemas::{PlayerMatchStats, RawMatch, TeamColor};

/// Fluent builder for provider match payloads.
///
/// Defaults: mode `custom`, map `Ascent`, no players, no kills, no winner.
/// The built payload carries an (empty) `rounds` array like the provider's.
#[derive(Debug, Clone)]
pub struct MatchBuilder {
    id: String,
    mode: String,
    map: String,
    game_start: Option<i64>,
    players: Vec<Value>,
    kills: Vec<Value>,
    winner: Option<TeamColor>,
    score: Option<(u32, u32)>,
}

impl MatchBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mode: "custom".to_string(),
            map: "Ascent".to_string(),
            game_start: None,
            players: Vec::new(),
            kills: Vec::new(),
            winner: None,
            score: None,
        }
    }

    pub fn mode(mut self, mode: &str) -> Self {
        self.mode = mode.to_string();
        self
    }

    pub fn started_at(mut self, epoch_secs: i64) -> Self {
        self.game_start = Some(epoch_secs);
        self
    }

    pub fn player(mut self, puuid: &str, team: TeamColor, stats: PlayerMatchStats) -> Self {
        self.players.push(json!({
            "puuid": puuid,
            "name": format!("{puuid}-name"),
            "tag": "EU",
            "team": team.as_str(),
            "stats": stats,
            "assets": { "card": { "small": format!("https://cards.example/{puuid}.png") } }
        }));
        self
    }

    /// Participants with zero stats, alternating Red / Blue.
    pub fn lobby<S: AsRef<str>>(mut self, puuids: &[S]) -> Self {
        for (i, p) in puuids.iter().enumerate() {
            let team = if i % 2 == 0 { TeamColor::Red } else { TeamColor::Blue };
            self = self.player(p.as_ref(), team, PlayerMatchStats::default());
        }
        self
    }

    /// Adds a kill event and the matching stat-line increments (killer
    /// `kills`, victim `deaths`, each assistant `assists`) for participants
    /// already added, so the payload stays self-consistent.
    pub fn kill(mut self, killer: &str, victim: &str, assistants: &[&str]) -> Self {
        self.bump(killer, "kills");
        self.bump(victim, "deaths");
        for a in assistants {
            self.bump(a, "assists");
        }
        let assistants: Vec<Value> = assistants
            .iter()
            .map(|a| json!({ "assistant_puuid": a }))
            .collect();
        self.kills.push(json!({
            "killer_puuid": killer,
            "victim_puuid": victim,
            "assistants": assistants
        }));
        self
    }

    fn bump(&mut self, puuid: &str, field: &str) {
        let Some(player) = self.players.iter_mut().find(|p| p["puuid"] == puuid) else {
            return;
        };
        let n = player["stats"][field].as_u64().unwrap_or(0);
        player["stats"][field] = json!(n + 1);
    }

    pub fn winner(mut self, team: TeamColor) -> Self {
        self.winner = Some(team);
        self
    }

    pub fn score(mut self, red: u32, blue: u32) -> Self {
        self.score = Some((red, blue));
        self
    }

    pub fn build(&self) -> Value {
        let (red_rounds, blue_rounds) = match self.score {
            Some((r, b)) => (json!(r), json!(b)),
            None => (Value::Null, Value::Null),
        };
        json!({
            "metadata": {
                "matchid": self.id,
                "mode": self.mode,
                "mode_id": self.mode.to_ascii_lowercase(),
                "map": self.map,
                "game_start": self.game_start,
                "game_start_patched": ""
            },
            "players": { "all_players": self.players },
            "kills": self.kills,
            "teams": {
                "red": { "has_won": self.winner == Some(TeamColor::Red), "rounds_won": red_rounds },
                "blue": { "has_won": self.winner == Some(TeamColor::Blue), "rounds_won": blue_rounds }
            },
            "rounds": []
        })
    }

    pub fn raw(&self) -> RawMatch {
        RawMatch::from_value(self.build())
    }
}
