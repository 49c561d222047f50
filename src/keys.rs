use crate::app::{App, MenuItem};
use crate::state::messages::NetworkRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pool_api::SlotSide;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let mut guard = app.lock().await;
    let mut outgoing: Vec<NetworkRequest> = Vec::new();

    // The team popup swallows everything but dismissal and quit.
    if guard.state.bracket.popup.is_some() {
        match (key_event.code, key_event.modifiers) {
            (Char('q'), _) | (Char('c'), KeyModifiers::CONTROL) => {
                crate::cleanup_terminal();
                std::process::exit(0);
            }
            (KeyCode::Esc | KeyCode::Enter, _) => guard.state.bracket.close_popup(),
            _ => {}
        }
        return;
    }

    match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching aborts whatever the old view was still fetching.
        (_, Char(c @ ('1' | '2' | '3' | '?')), _) => {
            let next = match c {
                '1' => MenuItem::Bracket,
                '2' => MenuItem::Winners,
                '3' => MenuItem::Leaderboard,
                _ => MenuItem::Help,
            };
            if guard.update_tab(next) {
                outgoing.push(NetworkRequest::CancelPending);
                outgoing.extend(guard.refresh_requests());
            }
        }
        (MenuItem::Help, KeyCode::Esc, _) => guard.exit_help(),

        // Manual refresh
        (_, Char('R'), _) | (_, KeyCode::F(5), _) => outgoing.extend(guard.refresh_requests()),

        // Bracket navigation
        (MenuItem::Bracket, KeyCode::Tab | Char('r'), _) => guard.state.bracket.cycle_focus(),
        (MenuItem::Bracket, KeyCode::BackTab, _) => guard.state.bracket.cycle_focus_back(),
        (MenuItem::Bracket, Char('o') | Char(' '), _) => guard.state.bracket.toggle_focused(),
        (MenuItem::Bracket, Char('l') | KeyCode::Right, _) => guard.state.bracket.level_next(),
        (MenuItem::Bracket, Char('h') | KeyCode::Left, _) => guard.state.bracket.level_prev(),
        (MenuItem::Bracket, Char('j') | KeyCode::Down, _) => guard.state.bracket.row_down(),
        (MenuItem::Bracket, Char('k') | KeyCode::Up, _) => guard.state.bracket.row_up(),
        (MenuItem::Bracket, KeyCode::Enter, _) => {
            let App { state, .. } = &mut *guard;
            state.bracket.open_detail(&state.games.games);
        }

        // Winners console
        (MenuItem::Winners, Char('j') | KeyCode::Down, _) => {
            let count = guard.state.games.games.len();
            guard.state.winners.select_down(count);
        }
        (MenuItem::Winners, Char('k') | KeyCode::Up, _) => guard.state.winners.select_up(),
        (MenuItem::Winners, Char('a'), _) => outgoing.extend(guard.winners_set(SlotSide::A)),
        (MenuItem::Winners, Char('b'), _) => outgoing.extend(guard.winners_set(SlotSide::B)),
        (MenuItem::Winners, Char('u'), _) => outgoing.extend(guard.winners_undo()),

        // Leaderboard
        (MenuItem::Leaderboard, Char('j') | KeyCode::Down, _) => guard.state.leaderboard.scroll_down(),
        (MenuItem::Leaderboard, Char('k') | KeyCode::Up, _) => guard.state.leaderboard.scroll_up(),

        // Global
        (_, Char('f'), _) => guard.toggle_full_screen(),
        (_, Char('"'), _) => guard.toggle_show_logs(),

        _ => {}
    }

    drop(guard);
    for request in outgoing {
        let _ = network_requests.send(request).await;
    }
}
