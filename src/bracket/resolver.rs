use super::geometry::Stroke;
use super::regions::RegionGames;
use super::{GAMES_PER_ROUND, REGION_ROUNDS};
use pool_api::{Game, RegionName, Slot, SlotSide};
use std::collections::HashMap;

/// Round-of-64 seed pairs in traditional bracket order; game `i` (1-based)
/// of round 1 always pairs `SEED_PAIRS[i - 1]`.
pub const SEED_PAIRS: [(u8, u8); 8] = [
    (1, 16),
    (8, 9),
    (5, 12),
    (4, 13),
    (6, 11),
    (3, 14),
    (7, 10),
    (2, 15),
];

type SlotKey = (RegionName, u8, u32, SlotSide);

/// Resolves who occupies every slot of one region's bracket.
///
/// Stored participants always win. When a later-round row is missing or its
/// slot isn't populated yet, the slot is carried forward from the winner of
/// the feeder game one round earlier (`2i - 1` for side A, `2i` for side B).
/// Results are memoized for the lifetime of the resolver, which is meant to
/// live for a single draw.
pub struct SlotResolver<'a> {
    games: &'a RegionGames<'a>,
    cache: HashMap<SlotKey, Slot>,
}

impl<'a> SlotResolver<'a> {
    pub fn new(games: &'a RegionGames<'a>) -> Self {
        Self { games, cache: HashMap::new() }
    }

    /// Occupant of `side` of the game at (`round_no`, `game_index`).
    /// Out-of-range positions resolve to an empty slot.
    pub fn resolve_slot(&mut self, round_no: u8, game_index: u32, side: SlotSide) -> Slot {
        if !in_bracket(round_no, game_index) {
            return Slot::default();
        }

        let key = (self.games.region, round_no, game_index, side);
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }

        let slot = self.compute_slot(round_no, game_index, side);
        self.cache.insert(key, slot.clone());
        slot
    }

    /// Winner of the game at (`round_no`, `game_index`), matched against that
    /// game's resolved slots. Missing rows, undecided games and winner ids that
    /// match neither slot all give an empty slot.
    pub fn resolve_winner(&mut self, round_no: u8, game_index: u32) -> Slot {
        if !in_bracket(round_no, game_index) {
            return Slot::default();
        }
        let Some(winner_id) = self.games.game_at(round_no, game_index).and_then(|g| g.winner_team_id)
        else {
            return Slot::default();
        };

        for side in [SlotSide::A, SlotSide::B] {
            let slot = self.resolve_slot(round_no, game_index, side);
            if slot.team_id() == Some(winner_id) {
                return slot;
            }
        }
        Slot::default()
    }

    /// The region's Final Four participant: the Elite Eight winner.
    pub fn final_four(&mut self) -> Slot {
        self.resolve_winner(REGION_ROUNDS, 1)
    }

    /// Resolve every slot of the region: 16/8/4/2 round slots plus the Final
    /// Four slot.
    pub fn resolve_region(&mut self) -> ResolvedRegion<'a> {
        let rounds = std::array::from_fn(|i| {
            let round_no = i as u8 + 1;
            (1..=GAMES_PER_ROUND[i])
                .map(|game_index| ResolvedGame {
                    round_no,
                    game_index,
                    game: self.games.game_at(round_no, game_index),
                    slot_a: self.resolve_slot(round_no, game_index, SlotSide::A),
                    slot_b: self.resolve_slot(round_no, game_index, SlotSide::B),
                })
                .collect()
        });

        ResolvedRegion { region: self.games.region, rounds, final_four: self.final_four() }
    }

    fn compute_slot(&mut self, round_no: u8, game_index: u32, side: SlotSide) -> Slot {
        let stored = self.games.game_at(round_no, game_index).map(|g| g.slot(side));
        let stored_seed = stored.and_then(Slot::seed);

        if round_no == 1 {
            let seed_hint = round_one_seed(game_index, side);
            return match stored {
                Some(Slot::Occupied(p)) => {
                    let mut p = p.clone();
                    p.seed = p.seed.or(seed_hint);
                    Slot::Occupied(p)
                }
                _ => Slot::Empty { seed: stored_seed.or(seed_hint) },
            };
        }

        if let Some(Slot::Occupied(p)) = stored {
            return Slot::Occupied(p.clone());
        }

        let feeder_index = match side {
            SlotSide::A => 2 * game_index - 1,
            SlotSide::B => 2 * game_index,
        };
        match self.resolve_winner(round_no - 1, feeder_index) {
            occupied @ Slot::Occupied(_) => occupied,
            Slot::Empty { .. } => Slot::Empty { seed: stored_seed },
        }
    }
}

fn in_bracket(round_no: u8, game_index: u32) -> bool {
    (1..=REGION_ROUNDS).contains(&round_no)
        && (1..=GAMES_PER_ROUND[round_no as usize - 1]).contains(&game_index)
}

fn round_one_seed(game_index: u32, side: SlotSide) -> Option<u8> {
    let (a, b) = *SEED_PAIRS.get((game_index as usize).checked_sub(1)?)?;
    Some(match side {
        SlotSide::A => a,
        SlotSide::B => b,
    })
}

/// One logical game after resolution. `game` is the backing row, if any.
#[derive(Debug, Clone)]
pub struct ResolvedGame<'a> {
    pub round_no: u8,
    pub game_index: u32,
    pub game: Option<&'a Game>,
    pub slot_a: Slot,
    pub slot_b: Slot,
}

impl ResolvedGame<'_> {
    pub fn slot(&self, side: SlotSide) -> &Slot {
        match side {
            SlotSide::A => &self.slot_a,
            SlotSide::B => &self.slot_b,
        }
    }

    /// Side the recorded winner sits on, judged against the resolved slots.
    pub fn winner_side(&self) -> Option<SlotSide> {
        let winner_id = self.game?.winner_team_id?;
        [SlotSide::A, SlotSide::B]
            .into_iter()
            .find(|side| self.slot(*side).team_id() == Some(winner_id))
    }

    /// Line emphasis: a recorded winner id lights the game up even when it
    /// can't be placed on either resolved slot.
    pub fn stroke(&self) -> Stroke {
        match self.game {
            None => Stroke::Absent,
            Some(game) if game.winner_team_id.is_some() => Stroke::Decided,
            Some(_) => Stroke::Undecided,
        }
    }
}

/// A fully populated region bracket.
#[derive(Debug, Clone)]
pub struct ResolvedRegion<'a> {
    pub region: RegionName,
    /// Index: `round_no - 1`; 8, 4, 2 and 1 games.
    pub rounds: [Vec<ResolvedGame<'a>>; REGION_ROUNDS as usize],
    pub final_four: Slot,
}

impl<'a> ResolvedRegion<'a> {
    pub fn round(&self, round_no: u8) -> &[ResolvedGame<'a>] {
        match round_no {
            1..=REGION_ROUNDS => &self.rounds[round_no as usize - 1],
            _ => &[],
        }
    }

    /// Slots per bracket level: 16, 8, 4, 2, then the single Final Four slot.
    pub fn slot_count(level: usize) -> usize {
        match level {
            0..=4 => 16 >> level,
            _ => 0,
        }
    }

    /// Slot `row` of bracket `level` (0 = round of 64 slots, 4 = Final Four).
    pub fn slot_at(&self, level: usize, row: usize) -> Option<&Slot> {
        if level == REGION_ROUNDS as usize {
            return (row == 0).then_some(&self.final_four);
        }
        let game = self.rounds.get(level)?.get(row / 2)?;
        Some(if row % 2 == 0 { &game.slot_a } else { &game.slot_b })
    }

    /// Whether the slot at (`level`, `row`) won its game.
    pub fn slot_won(&self, level: usize, row: usize) -> bool {
        if level == REGION_ROUNDS as usize {
            return !self.final_four.is_empty();
        }
        let Some(game) = self.rounds.get(level).and_then(|r| r.get(row / 2)) else {
            return false;
        };
        let side = if row % 2 == 0 { SlotSide::A } else { SlotSide::B };
        game.winner_side() == Some(side)
    }
}
