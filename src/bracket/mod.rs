//! Bracket reconstruction: turns the backend's flat, possibly sparse game list
//! into a fully populated 16/8/4/2/1 slot tree per region, plus the geometry
//! used to draw it.

pub mod geometry;
pub mod regions;
pub mod resolver;

pub use geometry::{BracketLayout, RegionGeometry, Segment, Stroke, Viewport};
pub use regions::{RegionGames, partition_regions};
pub use resolver::{ResolvedGame, ResolvedRegion, SEED_PAIRS, SlotResolver};

/// Rounds inside a region: round of 64, round of 32, Sweet 16, Elite Eight.
pub const REGION_ROUNDS: u8 = 4;

/// Games per round within one region, indexed by `round_no - 1`.
pub const GAMES_PER_ROUND: [u32; 4] = [8, 4, 2, 1];

pub fn round_label(round_no: u8) -> &'static str {
    match round_no {
        1 => "Round of 64",
        2 => "Round of 32",
        3 => "Sweet 16",
        4 => "Elite 8",
        _ => "Final Four",
    }
}
