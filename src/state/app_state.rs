use crate::app::MenuItem;
use crate::bracket::geometry::LEVELS;
use crate::bracket::{ResolvedRegion, SlotResolver, partition_regions};
use chrono::Local;
use pool_api::wire::{AuditItem, LeaderboardRow};
use pool_api::{Game, GameId, Participant, RegionName, Slot};

fn now_hms() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

// ---------------------------------------------------------------------------
// Game snapshot shared by the bracket and winners views
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct GamesSnapshot {
    pub games: Vec<Game>,
    /// At least one fetch has succeeded.
    pub loaded: bool,
    pub error: Option<String>,
    pub updated_at: Option<String>,
}

impl GamesSnapshot {
    pub fn replace(&mut self, games: Vec<Game>) {
        self.games = games;
        self.loaded = true;
        self.error = None;
        self.updated_at = Some(now_hms());
    }

    /// Keep the previous games; only remember what went wrong.
    pub fn fail(&mut self, message: String) {
        self.error = Some(message);
    }
}

// ---------------------------------------------------------------------------
// Bracket view: collapsible region panels with a slot cursor
// ---------------------------------------------------------------------------

/// What the team popup shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamDetail {
    pub seed: Option<u8>,
    pub name: String,
    pub region: String,
    pub owner: String,
}

impl TeamDetail {
    pub fn new(p: &Participant, panel_region: RegionName) -> Self {
        Self {
            seed: p.seed,
            name: p.name.clone(),
            region: p.region.clone().unwrap_or_else(|| panel_region.label().to_string()),
            owner: p.owner_label(),
        }
    }
}

#[derive(Debug, Default)]
pub struct BracketState {
    /// Expanded panels, indexed like `RegionName::ALL`. All start collapsed.
    pub open: [bool; 4],
    /// Focused region panel.
    pub focus: usize,
    /// Cursor level: 0..=3 are round slots, 4 is the Final Four slot.
    pub level: usize,
    /// Cursor row within the level.
    pub row: usize,
    pub popup: Option<TeamDetail>,
}

impl BracketState {
    pub fn focused_region(&self) -> RegionName {
        RegionName::ALL[self.focus % RegionName::ALL.len()]
    }

    pub fn cycle_focus(&mut self) {
        self.focus = (self.focus + 1) % RegionName::ALL.len();
    }

    pub fn cycle_focus_back(&mut self) {
        self.focus = (self.focus + RegionName::ALL.len() - 1) % RegionName::ALL.len();
    }

    pub fn toggle_focused(&mut self) {
        self.open[self.focus] = !self.open[self.focus];
    }

    pub fn is_open(&self, region: RegionName) -> bool {
        self.open[region.index()]
    }

    /// Move toward the Final Four, following the slot's path forward.
    pub fn level_next(&mut self) {
        if self.level + 1 < LEVELS {
            self.level += 1;
            self.row /= 2;
        }
    }

    /// Move back toward the round of 64, onto the upper feeder slot.
    pub fn level_prev(&mut self) {
        if self.level > 0 {
            self.level -= 1;
            self.row = (self.row * 2).min(ResolvedRegion::slot_count(self.level) - 1);
        }
    }

    pub fn row_down(&mut self) {
        let max = ResolvedRegion::slot_count(self.level).saturating_sub(1);
        if self.row < max {
            self.row += 1;
        }
    }

    pub fn row_up(&mut self) {
        self.row = self.row.saturating_sub(1);
    }

    /// Resolve the focused region and return the slot under the cursor.
    pub fn selected_slot(&self, games: &[Game]) -> Option<Slot> {
        let regions = partition_regions(games);
        let resolved = SlotResolver::new(&regions[self.focus % regions.len()]).resolve_region();
        resolved.slot_at(self.level, self.row).cloned()
    }

    /// Open the popup for the slot under the cursor. Placeholders are inert;
    /// returns whether a popup opened.
    pub fn open_detail(&mut self, games: &[Game]) -> bool {
        if !self.open[self.focus] {
            return false;
        }
        match self.selected_slot(games) {
            Some(Slot::Occupied(p)) => {
                self.popup = Some(TeamDetail::new(&p, self.focused_region()));
                true
            }
            _ => false,
        }
    }

    pub fn close_popup(&mut self) {
        self.popup = None;
    }
}

// ---------------------------------------------------------------------------
// Winners console
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    pub round_no: u8,
    pub open: usize,
    pub total: usize,
}

/// Games in console order: by round, then index, then id.
pub fn console_order(games: &[Game]) -> Vec<&Game> {
    let mut ordered: Vec<&Game> = games.iter().collect();
    ordered.sort_by_key(|g| (g.round_no, g.game_index, g.id));
    ordered
}

/// "Open n / total" per round, ascending. A game is open until a winner id is recorded.
pub fn round_summaries(games: &[Game]) -> Vec<RoundSummary> {
    let mut out: Vec<RoundSummary> = Vec::new();
    for game in console_order(games) {
        if out.last().map(|s| s.round_no) != Some(game.round_no) {
            out.push(RoundSummary { round_no: game.round_no, open: 0, total: 0 });
        }
        if let Some(summary) = out.last_mut() {
            summary.total += 1;
            if game.winner_team_id.is_none() {
                summary.open += 1;
            }
        }
    }
    out
}

#[derive(Debug, Default)]
pub struct WinnersState {
    /// Index into `console_order`.
    pub selected: usize,
    pub audit: Vec<AuditItem>,
    pub audit_error: Option<String>,
    pub action_message: Option<String>,
    pub action_error: Option<String>,
    /// Game with a mutation in flight. Only one at a time.
    pub acting_game_id: Option<GameId>,
}

impl WinnersState {
    pub fn select_down(&mut self, game_count: usize) {
        if self.selected + 1 < game_count {
            self.selected += 1;
        }
    }

    pub fn select_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_game<'a>(&self, games: &'a [Game]) -> Option<&'a Game> {
        console_order(games).get(self.selected).copied()
    }

    /// Claim the mutation slot for `game_id`. False while another is in flight.
    pub fn begin_action(&mut self, game_id: GameId) -> bool {
        if self.acting_game_id.is_some() {
            return false;
        }
        self.acting_game_id = Some(game_id);
        self.action_message = None;
        self.action_error = None;
        true
    }

    pub fn finish_action(&mut self, message: String) {
        self.acting_game_id = None;
        self.action_message = Some(message);
    }

    pub fn fail_action(&mut self, message: String) {
        self.acting_game_id = None;
        self.action_error = Some(message);
    }
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct LeaderboardState {
    pub rows: Vec<LeaderboardRow>,
    pub loaded: bool,
    pub error: Option<String>,
    pub updated_at: Option<String>,
    pub scroll_offset: u16,
}

impl LeaderboardState {
    pub fn replace(&mut self, rows: Vec<LeaderboardRow>) {
        self.rows = rows;
        self.loaded = true;
        self.error = None;
        self.updated_at = Some(now_hms());
    }

    pub fn scroll_down(&mut self) {
        let max = self.rows.len().saturating_sub(1) as u16;
        self.scroll_offset = (self.scroll_offset + 1).min(max);
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Top-level state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub games: GamesSnapshot,
    pub bracket: BracketState,
    pub winners: WinnersState,
    pub leaderboard: LeaderboardState,
    pub show_logs: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::SEED_PAIRS;

    fn south_round_one() -> Vec<Game> {
        SEED_PAIRS
            .iter()
            .enumerate()
            .map(|(i, (a, b))| {
                let team = |seed: u8| {
                    Slot::Occupied(Participant {
                        id: 100 + i64::from(seed),
                        name: format!("Team {seed}"),
                        seed: Some(seed),
                        region: Some("South".into()),
                        owner_display_name: (seed == 1).then(|| "Avery".to_string()),
                        ..Participant::default()
                    })
                };
                Game {
                    id: i as i64 + 1,
                    round_no: 1,
                    game_index: i as u32 + 1,
                    region: Some("South".into()),
                    slot_a: team(*a),
                    slot_b: team(*b),
                    ..Game::default()
                }
            })
            .collect()
    }

    #[test]
    fn test_regions_start_collapsed_and_toggle_independently() {
        let mut bracket = BracketState::default();
        assert!(RegionName::ALL.iter().all(|r| !bracket.is_open(*r)));

        bracket.toggle_focused();
        bracket.cycle_focus();
        bracket.cycle_focus();
        bracket.toggle_focused();
        assert!(bracket.is_open(RegionName::South));
        assert!(bracket.is_open(RegionName::East));
        assert!(!bracket.is_open(RegionName::West));

        bracket.cycle_focus_back();
        bracket.cycle_focus_back();
        bracket.cycle_focus_back();
        assert_eq!(bracket.focused_region(), RegionName::Midwest);
    }

    #[test]
    fn test_cursor_follows_bracket_paths() {
        let mut bracket = BracketState { row: 13, ..BracketState::default() };
        bracket.level_next();
        assert_eq!((bracket.level, bracket.row), (1, 6));
        for _ in 0..5 {
            bracket.level_next();
        }
        assert_eq!((bracket.level, bracket.row), (4, 0));
        bracket.row_down();
        assert_eq!(bracket.row, 0);
        bracket.level_prev();
        assert_eq!((bracket.level, bracket.row), (3, 0));
        bracket.row_down();
        bracket.row_down();
        assert_eq!(bracket.row, 1);
    }

    #[test]
    fn test_popup_opens_only_on_occupied_slots() {
        let games = south_round_one();
        let mut bracket = BracketState::default();
        assert!(!bracket.open_detail(&games), "collapsed panel is inert");

        bracket.toggle_focused();
        assert!(bracket.open_detail(&games));
        let detail = bracket.popup.clone().unwrap();
        assert_eq!(detail.seed, Some(1));
        assert_eq!(detail.owner, "Avery");
        assert_eq!(detail.region, "South");

        bracket.close_popup();
        bracket.row = 1;
        assert!(bracket.open_detail(&games));
        assert_eq!(bracket.popup.as_ref().map(|d| d.owner.as_str()), Some("Unassigned"));

        bracket.close_popup();
        bracket.level = 1;
        bracket.row = 0;
        assert!(!bracket.open_detail(&games), "placeholder is inert");
        assert!(bracket.popup.is_none());
    }

    #[test]
    fn test_round_summaries_count_open_games() {
        let mut games = south_round_one();
        games[0].winner_team_id = Some(101);
        games.push(Game { id: 50, round_no: 2, game_index: 1, ..Game::default() });

        let summaries = round_summaries(&games);
        assert_eq!(
            summaries,
            vec![
                RoundSummary { round_no: 1, open: 7, total: 8 },
                RoundSummary { round_no: 2, open: 1, total: 1 },
            ]
        );
    }

    #[test]
    fn test_only_one_action_in_flight() {
        let mut winners = WinnersState::default();
        assert!(winners.begin_action(7));
        assert!(!winners.begin_action(8));
        winners.finish_action("done".into());
        assert_eq!(winners.acting_game_id, None);
        assert!(winners.begin_action(8));
        winners.fail_action("stale".into());
        assert_eq!(winners.action_error.as_deref(), Some("stale"));
    }

    #[test]
    fn test_failed_fetch_keeps_previous_games() {
        let mut snapshot = GamesSnapshot::default();
        snapshot.replace(south_round_one());
        snapshot.fail("Admin games fetch failed (500): boom".into());
        assert_eq!(snapshot.games.len(), 8);
        assert!(snapshot.loaded);
        assert!(snapshot.error.is_some());
    }
}
