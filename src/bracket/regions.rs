use super::REGION_ROUNDS;
use pool_api::{Game, RegionName};

/// The games of one region, sorted by `(round_no, game_index, id)` and
/// bucketed by round for lookups.
#[derive(Debug, Clone)]
pub struct RegionGames<'a> {
    pub region: RegionName,
    games: Vec<&'a Game>,
    /// Index: `round_no - 1`. Rows with a round outside 1..=4 are kept in
    /// `games` but never looked up.
    rounds: [Vec<&'a Game>; REGION_ROUNDS as usize],
}

impl<'a> RegionGames<'a> {
    pub fn new(region: RegionName, mut games: Vec<&'a Game>) -> Self {
        games.sort_by_key(|g| (g.round_no, g.game_index, g.id));
        let rounds = std::array::from_fn(|i| {
            let round_no = i as u8 + 1;
            games.iter().copied().filter(|g| g.round_no == round_no).collect()
        });
        Self { region, games, rounds }
    }

    pub fn games(&self) -> &[&'a Game] {
        &self.games
    }

    /// Games of one round, in `game_index` order.
    pub fn round(&self, round_no: u8) -> &[&'a Game] {
        match round_no {
            1..=REGION_ROUNDS => &self.rounds[round_no as usize - 1],
            _ => &[],
        }
    }

    pub fn game_at(&self, round_no: u8, index: u32) -> Option<&'a Game> {
        game_at(self.round(round_no), round_no, index)
    }
}

/// Split a tournament's games into the four regions.
///
/// A game belongs to a region when its declared region matches, or (when that
/// doesn't match) either participant's region does. Exclusivity isn't
/// enforced: a row tagged with two regions shows up in both.
pub fn partition_regions(games: &[Game]) -> [RegionGames<'_>; 4] {
    RegionName::ALL.map(|region| {
        RegionGames::new(region, games.iter().filter(|g| g.belongs_to(region)).collect())
    })
}

/// Find the game at 1-based `index` within `round_no`.
///
/// Prefers an exact `game_index` match; otherwise falls back to the
/// `index`-th row of the round (sorted by `game_index`), which keeps backends
/// that haven't created every row yet usable.
pub fn game_at<'a>(games: &[&'a Game], round_no: u8, index: u32) -> Option<&'a Game> {
    let mut round: Vec<&'a Game> = games.iter().copied().filter(|g| g.round_no == round_no).collect();
    round.sort_by_key(|g| g.game_index);
    lookup(&round, index)
}

fn lookup<'a>(round: &[&'a Game], index: u32) -> Option<&'a Game> {
    round
        .iter()
        .find(|g| g.game_index == index)
        .or_else(|| index.checked_sub(1).and_then(|i| round.get(i as usize)))
        .copied()
}
