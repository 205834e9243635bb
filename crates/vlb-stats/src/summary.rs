use serde::Serialize;
use vlb_schemas::{MatchView, TeamColor};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryPlayer {
    pub puuid: String,
    pub name: String,
    pub tag: String,
    pub kills: u64,
    pub deaths: u64,
    pub assists: u64,
}

/// One match as shown in a match list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub match_id: Option<String>,
    pub map: String,
    /// Start time as formatted by the provider.
    pub started_at: String,
    pub red: Vec<SummaryPlayer>,
    pub blue: Vec<SummaryPlayer>,
    pub winner: Option<TeamColor>,
    /// Rounds won by red and blue, when both are known.
    pub score: Option<(u32, u32)>,
}

impl MatchSummary {
    pub fn from_view(view: &MatchView) -> Self {
        let mut red = Vec::new();
        let mut blue = Vec::new();
        for p in view.participants() {
            let entry = SummaryPlayer {
                puuid: p.puuid.clone(),
                name: p.name.clone(),
                tag: p.tag.clone(),
                kills: p.stats.kills,
                deaths: p.stats.deaths,
                assists: p.stats.assists,
            };
            match p.team_color() {
                Some(TeamColor::Red) => red.push(entry),
                Some(TeamColor::Blue) => blue.push(entry),
                None => {}
            }
        }
        // Best fraggers first.
        for side in [&mut red, &mut blue] {
            side.sort_by(|a, b| b.kills.cmp(&a.kills).then_with(|| a.puuid.cmp(&b.puuid)));
        }

        let score = match (&view.teams.red, &view.teams.blue) {
            (Some(r), Some(b)) => r.rounds_won.zip(b.rounds_won),
            _ => None,
        };

        Self {
            match_id: view.match_id().map(str::to_string),
            map: view.metadata.map.clone(),
            started_at: view.metadata.game_start_patched.clone(),
            red,
            blue,
            winner: view.teams.decisive_winner(),
            score,
        }
    }
}
