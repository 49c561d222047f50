use crate::state::app_settings::PoolTarget;
use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use pool_api::wire::{AuditItem, LeaderboardRow};
use pool_api::{Game, GameId, TeamId, WinnerUpdate};

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    /// Games only, for the bracket view.
    LoadGames { target: PoolTarget },
    /// Games and the audit log together, for the winners console.
    LoadAdmin { target: PoolTarget },
    LoadLeaderboard { target: PoolTarget },
    SetWinner {
        target: PoolTarget,
        game_id: GameId,
        winner_team_id: TeamId,
        expected_version: Option<i64>,
    },
    UndoWinner {
        target: PoolTarget,
        game_id: GameId,
        expected_version: Option<i64>,
    },
    /// Abort the loads in flight; sent when the user leaves a view.
    CancelPending,
}

impl NetworkRequest {
    /// Loads can be dropped when the user moves on. Winner mutations always
    /// run to completion so their outcome reaches the console.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            NetworkRequest::LoadGames { .. }
                | NetworkRequest::LoadAdmin { .. }
                | NetworkRequest::LoadLeaderboard { .. }
        )
    }
}

/// What a failed request was fetching, so each view keeps its own error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Games,
    Audit,
    Leaderboard,
    Action,
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    GamesLoaded { games: Vec<Game> },
    AuditLoaded { items: Vec<AuditItem> },
    LeaderboardLoaded { rows: Vec<LeaderboardRow> },
    WinnerUpdated { update: WinnerUpdate, undo: bool },
    Error { resource: Resource, message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
    RefreshTick,
}
