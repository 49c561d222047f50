use crate::state::app_settings::{AppSettings, PoolTarget};
use crate::state::app_state::AppState;
use crate::state::messages::{NetworkRequest, Resource};
use log::{info, warn};
use pool_api::wire::{AuditItem, LeaderboardRow};
use pool_api::{Game, SlotSide, WinnerUpdate};

pub const MISSING_TARGET: &str = "Missing or invalid league/tournament";

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Bracket,
    Winners,
    Leaderboard,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        let app = Self { state: AppState::new(), settings };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    pub fn target(&self) -> Option<PoolTarget> {
        self.settings.target
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_games_loaded(&mut self, games: Vec<Game>) {
        self.state.games.replace(games);
        let count = self.state.games.games.len();
        if self.state.winners.selected >= count {
            self.state.winners.selected = count.saturating_sub(1);
        }
    }

    pub fn on_audit_loaded(&mut self, items: Vec<AuditItem>) {
        self.state.winners.audit = items;
        self.state.winners.audit_error = None;
    }

    pub fn on_leaderboard_loaded(&mut self, rows: Vec<LeaderboardRow>) {
        self.state.leaderboard.replace(rows);
    }

    pub fn on_winner_updated(&mut self, update: WinnerUpdate, undo: bool) {
        let winner = update
            .winner_team_id
            .map_or_else(|| "none".to_string(), |id| id.to_string());
        let verb = if undo { "Undo" } else { "Set" };
        let message = format!(
            "{verb} success • game {} • winner={winner} • version={}",
            update.game_id, update.version
        );
        info!("{message}");
        self.state.winners.finish_action(message);
    }

    /// Record a failure against the view that asked; prior data stays.
    pub fn on_error(&mut self, resource: Resource, message: String) {
        match resource {
            Resource::Games => self.state.games.fail(message),
            Resource::Audit => self.state.winners.audit_error = Some(message),
            Resource::Leaderboard => self.state.leaderboard.error = Some(message),
            Resource::Action => self.state.winners.fail_action(message),
        }
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Fetches backing the active view. Nothing is requested without a
    /// valid league and tournament.
    pub fn refresh_requests(&self) -> Vec<NetworkRequest> {
        let Some(target) = self.target() else {
            return Vec::new();
        };
        match self.state.active_tab {
            MenuItem::Bracket => vec![NetworkRequest::LoadGames { target }],
            MenuItem::Winners => vec![NetworkRequest::LoadAdmin { target }],
            MenuItem::Leaderboard => vec![NetworkRequest::LoadLeaderboard { target }],
            MenuItem::Help => Vec::new(),
        }
    }

    /// Mark the selected game's `side` as the winner, guarded by the game's
    /// last-known version.
    pub fn winners_set(&mut self, side: SlotSide) -> Option<NetworkRequest> {
        let target = self.target()?;
        let game = self.state.winners.selected_game(&self.state.games.games)?;
        let Some(winner_team_id) = game.slot(side).team_id() else {
            warn!("game {} slot {} has no team yet", game.id, side.label());
            return None;
        };
        let (game_id, expected_version) = (game.id, Some(game.version));
        if !self.state.winners.begin_action(game_id) {
            return None;
        }
        Some(NetworkRequest::SetWinner { target, game_id, winner_team_id, expected_version })
    }

    pub fn winners_undo(&mut self) -> Option<NetworkRequest> {
        let target = self.target()?;
        let game = self.state.winners.selected_game(&self.state.games.games)?;
        if game.winner_team_id.is_none() {
            return None;
        }
        let (game_id, expected_version) = (game.id, Some(game.version));
        if !self.state.winners.begin_action(game_id) {
            return None;
        }
        Some(NetworkRequest::UndoWinner { target, game_id, expected_version })
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    /// Returns whether the tab actually changed.
    pub fn update_tab(&mut self, next: MenuItem) -> bool {
        if self.state.active_tab == next {
            return false;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
        self.state.bracket.close_popup();
        true
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pool_api::{Participant, Slot};

    fn app(target: Option<PoolTarget>) -> App {
        App { settings: AppSettings { target, ..AppSettings::default() }, state: AppState::new() }
    }

    fn target() -> Option<PoolTarget> {
        Some(PoolTarget { league_id: 2, tournament_id: 9 })
    }

    fn game(id: i64, version: i64) -> Game {
        Game {
            id,
            round_no: 1,
            game_index: id as u32,
            version,
            slot_a: Slot::Occupied(Participant { id: 10, name: "Duke".into(), ..Participant::default() }),
            slot_b: Slot::Empty { seed: Some(16) },
            ..Game::default()
        }
    }

    #[test]
    fn test_no_requests_without_target() {
        let app = app(None);
        assert!(app.refresh_requests().is_empty());
    }

    #[test]
    fn test_requests_follow_active_tab() {
        let mut app = app(target());
        assert!(matches!(app.refresh_requests()[..], [NetworkRequest::LoadGames { .. }]));
        app.update_tab(MenuItem::Winners);
        assert!(matches!(app.refresh_requests()[..], [NetworkRequest::LoadAdmin { .. }]));
        app.update_tab(MenuItem::Help);
        assert!(app.refresh_requests().is_empty());
        app.exit_help();
        assert_eq!(app.state.active_tab, MenuItem::Winners);
    }

    #[test]
    fn test_set_winner_sends_expected_version() {
        let mut app = app(target());
        app.on_games_loaded(vec![game(4, 7)]);

        assert!(app.winners_set(SlotSide::B).is_none(), "empty slot can't win");
        let request = app.winners_set(SlotSide::A);
        assert!(matches!(
            request,
            Some(NetworkRequest::SetWinner { game_id: 4, winner_team_id: 10, expected_version: Some(7), .. })
        ));
        assert!(app.winners_set(SlotSide::A).is_none(), "one mutation at a time");
    }

    #[test]
    fn test_winner_update_reports_success() {
        let mut app = app(target());
        app.state.winners.begin_action(4);
        app.on_winner_updated(WinnerUpdate { game_id: 4, winner_team_id: Some(10), version: 8 }, false);
        assert_eq!(
            app.state.winners.action_message.as_deref(),
            Some("Set success • game 4 • winner=10 • version=8")
        );

        app.on_winner_updated(WinnerUpdate { game_id: 4, winner_team_id: None, version: 9 }, true);
        assert_eq!(
            app.state.winners.action_message.as_deref(),
            Some("Undo success • game 4 • winner=none • version=9")
        );
    }

    #[test]
    fn test_undo_requires_a_winner() {
        let mut app = app(target());
        app.on_games_loaded(vec![game(4, 7)]);
        assert!(app.winners_undo().is_none());
        app.state.games.games[0].winner_team_id = Some(10);
        assert!(matches!(app.winners_undo(), Some(NetworkRequest::UndoWinner { game_id: 4, .. })));
    }

    #[test]
    fn test_errors_are_scoped_by_resource() {
        let mut app = app(target());
        app.on_games_loaded(vec![game(1, 0)]);
        app.on_error(Resource::Leaderboard, "down".into());
        assert_eq!(app.state.leaderboard.error.as_deref(), Some("down"));
        assert!(app.state.games.error.is_none());
        app.on_error(Resource::Games, "also down".into());
        assert_eq!(app.state.games.games.len(), 1);
    }
}
