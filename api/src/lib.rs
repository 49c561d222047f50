pub mod client;
pub mod wire;

use serde::{Deserialize, Serialize};
use std::fmt;

pub type GameId = i64;
pub type TeamId = i64;
pub type UserId = i64;

// ---------------------------------------------------------------------------
// Domain types: a clean model independent of the backend's flat wire format
// ---------------------------------------------------------------------------

/// The four fixed regional sub-brackets, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegionName {
    South,
    West,
    East,
    Midwest,
}

impl RegionName {
    pub const ALL: [RegionName; 4] = [
        RegionName::South,
        RegionName::West,
        RegionName::East,
        RegionName::Midwest,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RegionName::South => "South",
            RegionName::West => "West",
            RegionName::East => "East",
            RegionName::Midwest => "Midwest",
        }
    }

    /// Exact match on the display label; the backend sends these verbatim.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.label() == s)
    }

    /// Position in `ALL` (0..4).
    pub fn index(&self) -> usize {
        match self {
            RegionName::South => 0,
            RegionName::West => 1,
            RegionName::East => 2,
            RegionName::Midwest => 3,
        }
    }
}

impl fmt::Display for RegionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One of the two input positions of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlotSide {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B")]
    B,
}

impl SlotSide {
    pub fn label(&self) -> &'static str {
        match self {
            SlotSide::A => "A",
            SlotSide::B => "B",
        }
    }
}

/// A team occupying a slot, with its pool owner (if dealt yet).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Participant {
    pub id: TeamId,
    pub name: String,
    pub seed: Option<u8>,
    pub region: Option<String>,
    pub owner_user_id: Option<UserId>,
    pub owner_display_name: Option<String>,
}

impl Participant {
    /// Owner label for detail views; "Unassigned" until the team is dealt.
    pub fn owner_label(&self) -> String {
        match (&self.owner_display_name, self.owner_user_id) {
            (Some(name), _) if !name.trim().is_empty() => name.clone(),
            (_, Some(id)) => format!("User {id}"),
            _ => "Unassigned".to_string(),
        }
    }
}

/// Either a known participant or a placeholder that may still know its seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Empty { seed: Option<u8> },
    Occupied(Participant),
}

impl Default for Slot {
    fn default() -> Self {
        Slot::Empty { seed: None }
    }
}

impl Slot {
    pub fn participant(&self) -> Option<&Participant> {
        match self {
            Slot::Occupied(p) => Some(p),
            Slot::Empty { .. } => None,
        }
    }

    pub fn seed(&self) -> Option<u8> {
        match self {
            Slot::Occupied(p) => p.seed,
            Slot::Empty { seed } => *seed,
        }
    }

    pub fn team_id(&self) -> Option<TeamId> {
        self.participant().map(|p| p.id)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty { .. })
    }
}

/// One scheduled or completed bracket matchup, as last fetched from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Game {
    pub id: GameId,
    pub tournament_id: i64,
    /// 1..=4 within a region (round of 64 through the Elite Eight).
    pub round_no: u8,
    /// 1-based position within its round.
    pub game_index: u32,
    pub region: Option<String>,
    pub slot_a: Slot,
    pub slot_b: Slot,
    pub winner_team_id: Option<TeamId>,
    /// Optimistic-concurrency counter owned by the backend.
    pub version: i64,
    pub next_game_id: Option<GameId>,
    pub next_slot: Option<SlotSide>,
}

impl Game {
    pub fn slot(&self, side: SlotSide) -> &Slot {
        match side {
            SlotSide::A => &self.slot_a,
            SlotSide::B => &self.slot_b,
        }
    }

    /// Side whose participant matches `winner_team_id`. A winner id that matches
    /// neither slot counts as undecided.
    pub fn winner_side(&self) -> Option<SlotSide> {
        let winner_id = self.winner_team_id?;
        [SlotSide::A, SlotSide::B]
            .into_iter()
            .find(|side| self.slot(*side).team_id() == Some(winner_id))
    }

    pub fn winner(&self) -> Option<&Participant> {
        self.winner_side().and_then(|side| self.slot(side).participant())
    }

    pub fn is_decided(&self) -> bool {
        self.winner_side().is_some()
    }

    /// A winner is recorded but names neither stored participant.
    pub fn has_inconsistent_winner(&self) -> bool {
        self.winner_team_id.is_some() && self.winner_side().is_none()
    }

    /// Declared region first; when unset, either participant's region.
    pub fn belongs_to(&self, region: RegionName) -> bool {
        let label = region.label();
        self.region.as_deref() == Some(label)
            || [&self.slot_a, &self.slot_b]
                .into_iter()
                .filter_map(|s| s.participant())
                .any(|p| p.region.as_deref() == Some(label))
    }
}

/// Result of a winner mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerUpdate {
    pub game_id: GameId,
    pub winner_team_id: Option<TeamId>,
    pub version: i64,
}
