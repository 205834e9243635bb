use vlb_schemas::{MatchPlayer, Player};

/// Roster after a refresh, plus the puuids whose display fields changed.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterRefresh {
    pub roster: Vec<Player>,
    pub changed: Vec<String>,
}

impl RosterRefresh {
    pub fn is_unchanged(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Refresh `name`, `tag` and `card` of every roster entry that appears in
/// `participants`, matched by puuid.
///
/// Entries absent from the match are returned untouched, in their original
/// order. A blank value in the match never overwrites a stored one.
pub fn sync_roster(roster: &[Player], participants: &[MatchPlayer]) -> RosterRefresh {
    let mut changed = Vec::new();
    let updated = roster
        .iter()
        .map(|player| {
            let Some(seen) = participants.iter().find(|p| p.puuid == player.puuid) else {
                return player.clone();
            };
            let mut next = player.clone();
            overwrite_if_present(&mut next.name, &seen.name);
            overwrite_if_present(&mut next.tag, &seen.tag);
            overwrite_if_present(&mut next.card, seen.card_small());
            if next != *player {
                changed.push(player.puuid.clone());
            }
            next
        })
        .collect();
    RosterRefresh {
        roster: updated,
        changed,
    }
}

fn overwrite_if_present(slot: &mut String, value: &str) {
    if !value.trim().is_empty() && slot != value {
        *slot = value.to_string();
    }
}
