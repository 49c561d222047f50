/// Wire types for the pool backend's REST API.
/// Field names mirror the backend's snake_case JSON; everything optional
/// defaults to null so partially-populated rows still parse.
use crate::{Game, GameId, Participant, Slot, SlotSide, TeamId, UserId, WinnerUpdate};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Default, Debug, Clone)]
#[serde(default)]
pub struct AdminGame {
    pub id: GameId,
    pub tournament_id: i64,
    pub round_no: u8,
    pub game_index: u32,

    pub team_a_id: Option<TeamId>,
    pub team_a_name: Option<String>,
    pub team_a_seed: Option<u8>,
    pub team_a_region: Option<String>,
    pub team_a_owner_user_id: Option<UserId>,
    pub team_a_owner_display_name: Option<String>,

    pub team_b_id: Option<TeamId>,
    pub team_b_name: Option<String>,
    pub team_b_seed: Option<u8>,
    pub team_b_region: Option<String>,
    pub team_b_owner_user_id: Option<UserId>,
    pub team_b_owner_display_name: Option<String>,

    pub winner_team_id: Option<TeamId>,
    pub version: i64,
    pub next_game_id: Option<GameId>,
    pub next_slot: Option<SlotSide>,
    pub region: Option<String>,
}

#[derive(Deserialize, Serialize, Default, Debug)]
#[serde(default)]
pub struct AdminGamesResponse {
    pub items: Vec<AdminGame>,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Deserialize, Default, Debug)]
pub struct WinnerResponse {
    pub game_id: GameId,
    pub winner_team_id: Option<TeamId>,
    pub version: i64,
}

#[derive(Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct AuditItem {
    pub id: i64,
    pub actor_user_id: UserId,
    pub tournament_id: i64,
    pub entity_type: String,
    pub entity_id: i64,
    pub action: String,
    pub before_json: Option<serde_json::Value>,
    pub after_json: Option<serde_json::Value>,
    pub created_at: String,
}

impl AuditItem {
    /// `created_at` rendered as local wall-clock time, or the raw string when
    /// the backend sent something that isn't RFC 3339.
    pub fn created_at_local(&self) -> String {
        chrono::DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&chrono::Local).format("%m/%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| self.created_at.clone())
    }
}

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
pub struct AuditResponse {
    pub items: Vec<AuditItem>,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LeaderboardRow {
    pub user_id: UserId,
    pub points: i64,
    pub teams_alive: u32,
    pub team_wins: u32,
    pub rank: u32,
    pub display_name: Option<String>,
}

impl LeaderboardRow {
    pub fn name(&self) -> String {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(ToString::to_string)
            .unwrap_or_else(|| format!("User {}", self.user_id))
    }
}

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
pub struct LeaderboardResponse {
    pub rows: Vec<LeaderboardRow>,
}

// ---------------------------------------------------------------------------
// Mapping: wire → domain
// ---------------------------------------------------------------------------

struct WireSide {
    id: Option<TeamId>,
    name: Option<String>,
    seed: Option<u8>,
    region: Option<String>,
    owner_user_id: Option<UserId>,
    owner_display_name: Option<String>,
}

/// A side with no id or a blank name is "not yet populated": it keeps only
/// the seed it was given.
fn map_side(side: WireSide) -> Slot {
    match (side.id, side.name) {
        (Some(id), Some(name)) if !name.trim().is_empty() => Slot::Occupied(Participant {
            id,
            name,
            seed: side.seed,
            region: side.region,
            owner_user_id: side.owner_user_id,
            owner_display_name: side.owner_display_name,
        }),
        _ => Slot::Empty { seed: side.seed },
    }
}

impl From<AdminGame> for Game {
    fn from(g: AdminGame) -> Self {
        let slot_a = map_side(WireSide {
            id: g.team_a_id,
            name: g.team_a_name,
            seed: g.team_a_seed,
            region: g.team_a_region,
            owner_user_id: g.team_a_owner_user_id,
            owner_display_name: g.team_a_owner_display_name,
        });
        let slot_b = map_side(WireSide {
            id: g.team_b_id,
            name: g.team_b_name,
            seed: g.team_b_seed,
            region: g.team_b_region,
            owner_user_id: g.team_b_owner_user_id,
            owner_display_name: g.team_b_owner_display_name,
        });

        Game {
            id: g.id,
            tournament_id: g.tournament_id,
            round_no: g.round_no,
            game_index: g.game_index,
            region: g.region.filter(|r| !r.trim().is_empty()),
            slot_a,
            slot_b,
            winner_team_id: g.winner_team_id,
            version: g.version,
            next_game_id: g.next_game_id,
            next_slot: g.next_slot,
        }
    }
}

impl From<WinnerResponse> for WinnerUpdate {
    fn from(r: WinnerResponse) -> Self {
        WinnerUpdate { game_id: r.game_id, winner_team_id: r.winner_team_id, version: r.version }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_game_parses_sparse_row() {
        let raw = r#"{"id": 5, "tournament_id": 1, "round_no": 2, "game_index": 3, "version": 0}"#;
        let game: Game = serde_json::from_str::<AdminGame>(raw).unwrap().into();
        assert_eq!(game.round_no, 2);
        assert_eq!(game.game_index, 3);
        assert_eq!(game.slot_a, Slot::Empty { seed: None });
        assert_eq!(game.slot_b, Slot::Empty { seed: None });
        assert_eq!(game.region, None);
    }

    #[test]
    fn test_admin_game_maps_full_row() {
        let raw = r#"{
            "id": 17, "tournament_id": 1, "round_no": 1, "game_index": 1,
            "team_a_id": 101, "team_a_name": "Auburn", "team_a_seed": 1, "team_a_region": "South",
            "team_a_owner_user_id": 4, "team_a_owner_display_name": "Pat",
            "team_b_id": 116, "team_b_name": "Alabama State", "team_b_seed": 16, "team_b_region": "South",
            "team_b_owner_user_id": null, "team_b_owner_display_name": null,
            "winner_team_id": 101, "version": 3, "next_game_id": 40, "next_slot": "A", "region": "South"
        }"#;
        let game: Game = serde_json::from_str::<AdminGame>(raw).unwrap().into();
        let a = game.slot_a.participant().expect("slot a populated");
        assert_eq!(a.name, "Auburn");
        assert_eq!(a.owner_display_name.as_deref(), Some("Pat"));
        assert_eq!(game.slot_b.seed(), Some(16));
        assert_eq!(game.next_slot, Some(SlotSide::A));
        assert_eq!(game.winner().map(|p| p.id), Some(101));
    }

    #[test]
    fn test_blank_name_is_a_placeholder_that_keeps_its_seed() {
        let wire = AdminGame {
            team_a_id: Some(9),
            team_a_name: Some("  ".into()),
            team_a_seed: Some(8),
            ..AdminGame::default()
        };
        let game: Game = wire.into();
        assert_eq!(game.slot_a, Slot::Empty { seed: Some(8) });
    }

    #[test]
    fn test_blank_region_is_treated_as_unset() {
        let wire = AdminGame { region: Some(String::new()), ..AdminGame::default() };
        let game: Game = wire.into();
        assert_eq!(game.region, None);
    }

    #[test]
    fn test_leaderboard_row_name_falls_back_to_user_id() {
        let row = LeaderboardRow { user_id: 12, ..LeaderboardRow::default() };
        assert_eq!(row.name(), "User 12");
    }

    #[test]
    fn test_audit_time_keeps_unparseable_input() {
        let item = AuditItem { created_at: "yesterday".into(), ..AuditItem::default() };
        assert_eq!(item.created_at_local(), "yesterday");
    }
}
