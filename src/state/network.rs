use crate::state::messages::{NetworkRequest, NetworkResponse, Resource};
use futures_util::future;
use log::{debug, error, warn};
use pool_api::client::{DEFAULT_AUDIT_LIMIT, DEFAULT_LEADERBOARD_TTL_SEC, GamesQuery, PoolApi};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinSet};

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Runs every request as its own task so fetches overlap. The spinner runs
/// while any task is alive; `CancelPending` aborts the fetches and leaves
/// winner mutations running.
pub struct NetworkWorker {
    client: Arc<PoolApi>,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    tasks: JoinSet<bool>,
    /// Abort handles of the fetches in `tasks`.
    fetches: Vec<AbortHandle>,
    batch_failed: bool,
    is_loading: Arc<AtomicBool>,
}

impl NetworkWorker {
    pub fn new(
        client: PoolApi,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            client: Arc::new(client),
            requests,
            responses,
            tasks: JoinSet::new(),
            fetches: Vec::new(),
            batch_failed: false,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                request = self.requests.recv() => {
                    let Some(request) = request else { break };
                    match request {
                        NetworkRequest::CancelPending => self.cancel_pending(),
                        request => self.spawn(request).await,
                    }
                }

                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    match joined {
                        Ok(ok) => self.batch_failed |= !ok,
                        Err(e) if e.is_cancelled() => debug!("network request cancelled"),
                        Err(e) => {
                            error!("network task failed: {e}");
                            self.batch_failed = true;
                        }
                    }
                    if self.tasks.is_empty() {
                        debug!("network requests complete");
                        self.fetches.clear();
                        self.stop_loading_animation(!self.batch_failed).await;
                    }
                }
            }
        }
        self.tasks.abort_all();
    }

    async fn spawn(&mut self, request: NetworkRequest) {
        if self.tasks.is_empty() {
            self.batch_failed = false;
            self.start_loading_animation().await;
        }

        let is_fetch = request.is_fetch();
        let client = self.client.clone();
        let responses = self.responses.clone();
        let handle = self.tasks.spawn(async move {
            let outcome = handle_request(&client, request).await;
            let ok = !outcome.iter().any(|r| matches!(r, NetworkResponse::Error { .. }));
            for response in outcome {
                if let Err(e) = responses.send(response).await {
                    error!("Failed to send network response: {e}");
                    break;
                }
            }
            ok
        });
        if is_fetch {
            self.fetches.push(handle);
        }
    }

    fn cancel_pending(&mut self) {
        let mut aborted = 0;
        for handle in self.fetches.drain(..) {
            if !handle.is_finished() {
                handle.abort();
                aborted += 1;
            }
        }
        if aborted > 0 {
            debug!("aborted {aborted} in-flight fetch(es)");
        }
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}

async fn handle_request(client: &PoolApi, request: NetworkRequest) -> Vec<NetworkResponse> {
    match request {
        NetworkRequest::LoadGames { target } => {
            debug!("loading games for tournament {}", target.tournament_id);
            let games = client
                .fetch_admin_games(GamesQuery::new(target.tournament_id, target.league_id))
                .await;
            vec![games_response(games)]
        }
        NetworkRequest::LoadAdmin { target } => {
            debug!("loading games and audit for tournament {}", target.tournament_id);
            let (games, audit) = future::join(
                client.fetch_admin_games(GamesQuery::new(target.tournament_id, target.league_id)),
                client.fetch_audit(target.tournament_id, target.league_id, DEFAULT_AUDIT_LIMIT, 0),
            )
            .await;
            let audit = match audit {
                Ok(items) => NetworkResponse::AuditLoaded { items },
                Err(e) => error_response(Resource::Audit, e),
            };
            vec![games_response(games), audit]
        }
        NetworkRequest::LoadLeaderboard { target } => {
            debug!("loading leaderboard for league {}", target.league_id);
            let rows = client
                .fetch_leaderboard(target.league_id, target.tournament_id, DEFAULT_LEADERBOARD_TTL_SEC)
                .await;
            vec![match rows {
                Ok(rows) => NetworkResponse::LeaderboardLoaded { rows },
                Err(e) => error_response(Resource::Leaderboard, e),
            }]
        }
        NetworkRequest::SetWinner { target, game_id, winner_team_id, expected_version } => {
            debug!("setting winner {winner_team_id} on game {game_id}");
            let result = client
                .set_winner(game_id, winner_team_id, target.league_id, expected_version)
                .await;
            vec![match result {
                Ok(update) => NetworkResponse::WinnerUpdated { update, undo: false },
                Err(e) => error_response(Resource::Action, e),
            }]
        }
        NetworkRequest::UndoWinner { target, game_id, expected_version } => {
            debug!("undoing winner on game {game_id}");
            let result = client.undo_winner(game_id, target.league_id, expected_version).await;
            vec![match result {
                Ok(update) => NetworkResponse::WinnerUpdated { update, undo: true },
                Err(e) => error_response(Resource::Action, e),
            }]
        }
        NetworkRequest::CancelPending => Vec::new(),
    }
}

fn games_response(result: pool_api::client::ApiResult<pool_api::client::GamesPage>) -> NetworkResponse {
    match result {
        Ok(page) => {
            let inconsistent = page
                .items
                .iter()
                .filter(|g| g.has_inconsistent_winner() && !g.slot_a.is_empty() && !g.slot_b.is_empty())
                .count();
            if inconsistent > 0 {
                warn!("{inconsistent} game(s) name a winner that is in neither slot");
            }
            NetworkResponse::GamesLoaded { games: page.items }
        }
        Err(e) => error_response(Resource::Games, e),
    }
}

fn error_response(resource: Resource, err: pool_api::client::ApiError) -> NetworkResponse {
    NetworkResponse::Error { resource, message: err.to_string() }
}
