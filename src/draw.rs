use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Row, Table, Tabs};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MISSING_TARGET, MenuItem};
use crate::bracket::{
    RegionGeometry, ResolvedRegion, SlotResolver, Stroke, partition_regions, round_label,
};
use crate::components::bracket::{RegionBracketView, region_height};
use crate::components::theme::{Theme, ThemeColor, resolve};
use crate::state::app_state::{TeamDetail, console_order, round_summaries};
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::ui::layout::LayoutAreas;
use pool_api::{Game, RegionName, Slot, SlotSide};

static TABS: &[&str; 3] = &["Bracket", "Winners", "Leaderboard"];

const LOG_PANE_HEIGHT: u16 = 10;

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs, LOG_PANE_HEIGHT);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Bracket => draw_bracket(f, layout.main, app),
            MenuItem::Winners => draw_winners(f, layout.main, app),
            MenuItem::Leaderboard => draw_leaderboard(f, layout.main, app),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }

        if let Some(detail) = app.state.bracket.popup.as_ref() {
            draw_team_popup(f, f.area(), detail);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });
    if let Err(e) = result {
        log::error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Bracket => 0,
        MenuItem::Winners => 1,
        MenuItem::Leaderboard => 2,
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new(header_text(app) + "  Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

fn header_text(app: &App) -> String {
    let Some(target) = app.target() else {
        return MISSING_TARGET.to_string();
    };
    let updated = match app.state.active_tab {
        MenuItem::Leaderboard => app.state.leaderboard.updated_at.as_deref(),
        _ => app.state.games.updated_at.as_deref(),
    };
    let mut text = format!("League {} • Tournament {}", target.league_id, target.tournament_id);
    if let Some(at) = updated {
        text.push_str(&format!(" • Updated {at}"));
    }
    text
}

/// Render a message in place of a view that has nothing to show yet.
/// Returns true when the view should stop there.
fn draw_unavailable(f: &mut Frame, area: Rect, app: &App, loaded: bool, error: Option<&str>, what: &str) -> bool {
    let msg = if app.target().is_none() {
        MISSING_TARGET.to_string()
    } else if loaded {
        return false;
    } else if let Some(err) = error {
        format!("{what} load failed:\n{err}")
    } else {
        format!("Loading {what}...")
    };
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        area,
    );
    true
}

// ---------------------------------------------------------------------------
// Bracket tab
// ---------------------------------------------------------------------------

fn draw_bracket(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Live Bracket ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let snapshot = &app.state.games;
    if draw_unavailable(f, inner, app, snapshot.loaded, snapshot.error.as_deref(), "bracket") {
        return;
    }

    let [legend, status, content] =
        Layout::vertical([Constraint::Length(1), Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
    f.render_widget(
        Paragraph::new("Keys: Tab=region  o=open/close  h/l=round  j/k=slot  Enter=team  R=refresh  ?=help  q=quit")
            .style(Style::default().fg(Color::DarkGray)),
        legend,
    );
    if let Some(err) = snapshot.error.as_deref() {
        f.render_widget(
            Paragraph::new(format!("Refresh failed, showing last snapshot: {err}"))
                .style(Style::default().fg(Color::Red)),
            status,
        );
    }

    let geometry = RegionGeometry::default();
    let regions = partition_regions(&snapshot.games);
    let resolved: Vec<ResolvedRegion> = regions
        .iter()
        .map(|games| SlotResolver::new(games).resolve_region())
        .collect();

    let bracket = &app.state.bracket;
    let open_height = region_height(&geometry) + 2;
    let heights: Vec<u16> = RegionName::ALL
        .iter()
        .map(|r| if bracket.is_open(*r) { open_height } else { 3 })
        .collect();

    // Start far enough down that the focused panel's top is on screen.
    let mut first = 0;
    while first < bracket.focus
        && heights[first..=bracket.focus].iter().sum::<u16>() > content.height
    {
        first += 1;
    }

    let mut y = content.y;
    let bottom = content.y + content.height;
    for idx in first..RegionName::ALL.len() {
        if y >= bottom {
            break;
        }
        let height = heights[idx].min(bottom - y);
        let pane = Rect::new(content.x, y, content.width, height);
        let stored = regions[idx].games().len();
        draw_region_panel(f, pane, app, &resolved[idx], stored, &geometry, idx == bracket.focus);
        y += height;
    }
}

fn draw_region_panel(
    f: &mut Frame,
    area: Rect,
    app: &App,
    region: &ResolvedRegion,
    stored: usize,
    geometry: &RegionGeometry,
    focused: bool,
) {
    let bracket = &app.state.bracket;
    let open = bracket.is_open(region.region);
    let marker = if open { '▾' } else { '▸' };
    let block = default_border(if focused { Color::Yellow } else { Color::DarkGray })
        .title(format!(" {marker} {} ", region.region));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if !open {
        let decided = region.rounds.iter().flatten().filter(|g| g.stroke() == Stroke::Decided).count();
        let total: usize = region.rounds.iter().map(Vec::len).sum();
        let ff = match &region.final_four {
            Slot::Occupied(p) => p.name.clone(),
            Slot::Empty { .. } => "TBD".to_string(),
        };
        f.render_widget(
            Paragraph::new(format!("{decided}/{total} decided • {stored} rows • Final Four: {ff}"))
                .style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    }

    let cursor = focused.then_some((bracket.level, bracket.row));
    let scroll_offset = if focused {
        cursor_scroll(geometry, bracket.level, bracket.row, inner.height)
    } else {
        0
    };
    f.render_widget(
        RegionBracketView { region, geometry, cursor, scroll_offset, theme: Theme::Dark },
        inner,
    );
}

/// Scroll just enough to keep the cursor's label row visible.
fn cursor_scroll(geometry: &RegionGeometry, level: usize, row: usize, visible: u16) -> u16 {
    let Some(center) = geometry.center(level, row) else {
        return 0;
    };
    let needed = center.round() as u16 + 1;
    needed.saturating_sub(visible)
}

fn draw_team_popup(f: &mut Frame, area: Rect, detail: &TeamDetail) {
    let width = 44.min(area.width);
    let height = 8.min(area.height);
    let popup = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );
    f.render_widget(Clear, popup);

    let block = default_border(Color::Yellow).title(" Team ");
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let label = Style::default().fg(Color::DarkGray);
    let seed = detail.seed.map_or_else(|| "-".to_string(), |s| s.to_string());
    let lines = vec![
        Line::from(vec![Span::styled("Seed    ", label), Span::raw(seed)]),
        Line::from(vec![
            Span::styled("Team    ", label),
            Span::styled(detail.name.as_str(), resolve(ThemeColor::Accent, Theme::Dark)),
        ]),
        Line::from(vec![Span::styled("Region  ", label), Span::raw(detail.region.as_str())]),
        Line::from(vec![Span::styled("Owner   ", label), Span::raw(detail.owner.as_str())]),
        Line::from(""),
        Line::from(Span::styled("Esc to close", label)),
    ];
    f.render_widget(Paragraph::new(lines), inner);
}

// ---------------------------------------------------------------------------
// Winners tab
// ---------------------------------------------------------------------------

fn draw_winners(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Winners ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let snapshot = &app.state.games;
    if draw_unavailable(f, inner, app, snapshot.loaded, snapshot.error.as_deref(), "games") {
        return;
    }

    let [games_area, side_area] =
        Layout::horizontal([Constraint::Percentage(62), Constraint::Percentage(38)]).areas(inner);

    let winners = &app.state.winners;
    let summaries = round_summaries(&snapshot.games);
    let open_total: usize = summaries.iter().map(|s| s.open).sum();

    let mut lines: Vec<Line> = Vec::new();
    let mut selected_line = 0;
    lines.push(Line::from(Span::styled(
        format!("Open {open_total}"),
        resolve(ThemeColor::Accent, Theme::Dark),
    )));

    let ordered = console_order(&snapshot.games);
    for (idx, game) in ordered.iter().enumerate() {
        let starts_round = idx == 0 || ordered[idx - 1].round_no != game.round_no;
        if starts_round {
            let summary = summaries.iter().find(|s| s.round_no == game.round_no);
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!(
                    "{} • Open {} / {}",
                    round_label(game.round_no),
                    summary.map_or(0, |s| s.open),
                    summary.map_or(0, |s| s.total)
                ),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )));
        }

        let selected = idx == winners.selected;
        if selected {
            selected_line = lines.len();
        }
        lines.extend(game_lines(game, selected, winners.acting_game_id == Some(game.id)));
    }

    let visible = games_area.height as usize;
    let offset = (selected_line + 4).saturating_sub(visible);
    let window: Vec<Line> = lines.into_iter().skip(offset).take(visible).collect();
    f.render_widget(Paragraph::new(window), games_area);

    draw_winners_side(f, side_area, app);
}

fn game_lines(game: &Game, selected: bool, acting: bool) -> Vec<Line<'static>> {
    let marker = if selected { '>' } else { ' ' };
    let state = if game.winner_team_id.is_some() { "RESOLVED" } else { "OPEN" };
    let region = game.region.clone().unwrap_or_else(|| "-".to_string());
    let busy = if acting { " • saving..." } else { "" };
    let head_style = if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };

    let mut out = vec![Line::from(Span::styled(
        format!(
            "{marker} Game {} • #{} • {state} • v{} • {region}{busy}",
            game.id, game.game_index, game.version
        ),
        head_style,
    ))];
    for side in [SlotSide::A, SlotSide::B] {
        out.push(team_line(game, side));
    }
    out
}

fn team_line(game: &Game, side: SlotSide) -> Line<'static> {
    let slot = game.slot(side);
    let seed = slot.seed().map_or_else(|| "-".to_string(), |s| s.to_string());
    let mut text = match slot {
        Slot::Occupied(p) => format!("    {}: ({seed}) {}", side.label(), p.name),
        Slot::Empty { .. } => format!("    {}: ({seed}) TBD", side.label()),
    };
    if let Some(owner) = slot.participant().and_then(|p| p.owner_display_name.as_deref()) {
        text.push_str(&format!(" • {owner}"));
    }
    let won = game.winner_side() == Some(side);
    if won {
        text.push_str(" • WINNER");
    }
    let style = if won {
        resolve(ThemeColor::Winner, Theme::Dark)
    } else if slot.is_empty() {
        resolve(ThemeColor::Placeholder, Theme::Dark)
    } else {
        resolve(ThemeColor::Primary, Theme::Dark)
    };
    Line::from(Span::styled(text, style))
}

fn draw_winners_side(f: &mut Frame, area: Rect, app: &App) {
    let winners = &app.state.winners;
    let [status_area, audit_area] =
        Layout::vertical([Constraint::Length(6), Constraint::Fill(1)]).areas(area);

    let mut status = vec![Line::from(Span::styled(
        "a=A wins  b=B wins  u=undo  j/k=move  R=refresh",
        Style::default().fg(Color::DarkGray),
    ))];
    if let Some(game_id) = winners.acting_game_id {
        status.push(Line::from(format!("Saving game {game_id}...")));
    }
    if let Some(msg) = winners.action_message.as_deref() {
        status.push(Line::from(Span::styled(msg.to_string(), resolve(ThemeColor::Winner, Theme::Dark))));
    }
    if let Some(err) = winners.action_error.as_deref() {
        status.push(Line::from(Span::styled(err.to_string(), Style::default().fg(Color::Red))));
    }
    if let Some(err) = app.state.games.error.as_deref() {
        status.push(Line::from(Span::styled(err.to_string(), Style::default().fg(Color::Red))));
    }
    let block = default_border(Color::DarkGray).title(" Status ");
    let inner = block.inner(status_area);
    f.render_widget(block, status_area);
    f.render_widget(Paragraph::new(status), inner);

    let block = default_border(Color::DarkGray).title(" Recent changes ");
    let inner = block.inner(audit_area);
    f.render_widget(block, audit_area);

    let mut lines = Vec::new();
    if let Some(err) = winners.audit_error.as_deref() {
        lines.push(Line::from(Span::styled(err.to_string(), Style::default().fg(Color::Red))));
    }
    if winners.audit.is_empty() {
        lines.push(Line::from(Span::styled("No audit entries yet", Style::default().fg(Color::DarkGray))));
    }
    for item in &winners.audit {
        lines.push(Line::from(Span::styled(
            item.action.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            format!("  {} • game {} • actor {}", item.created_at_local(), item.entity_id, item.actor_user_id),
            Style::default().fg(Color::DarkGray),
        )));
    }
    f.render_widget(Paragraph::new(lines), inner);
}

// ---------------------------------------------------------------------------
// Leaderboard tab
// ---------------------------------------------------------------------------

fn draw_leaderboard(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Leaderboard ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let board = &app.state.leaderboard;
    if draw_unavailable(f, inner, app, board.loaded, board.error.as_deref(), "leaderboard") {
        return;
    }

    let [status, table_area] = Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
    let status_line = match board.error.as_deref() {
        Some(err) => Span::styled(format!("Refresh failed: {err}"), Style::default().fg(Color::Red)),
        None => Span::styled("j/k=scroll  R=refresh", Style::default().fg(Color::DarkGray)),
    };
    f.render_widget(Paragraph::new(Line::from(status_line)), status);

    if board.rows.is_empty() {
        f.render_widget(
            Paragraph::new("No standings yet")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            table_area,
        );
        return;
    }

    let rows: Vec<Row> = board
        .rows
        .iter()
        .skip(board.scroll_offset as usize)
        .map(|r| {
            Row::new(vec![
                r.rank.to_string(),
                r.name(),
                r.points.to_string(),
                r.team_wins.to_string(),
                r.teams_alive.to_string(),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Fill(1),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(7),
        ],
    )
    .header(
        Row::new(vec!["Rank", "Player", "Points", "Wins", "Alive"])
            .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)),
    );
    f.render_widget(table, table_area);
}

// ---------------------------------------------------------------------------
// Help, logs, spinner
// ---------------------------------------------------------------------------

fn draw_help(f: &mut Frame, area: Rect) {
    let block = default_border(Color::DarkGray).title(" Help ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = [
        "1 Bracket   2 Winners   3 Leaderboard   ? Help (Esc to leave)",
        "",
        "Bracket:  Tab/r next region   Shift-Tab previous   o/Space open or close",
        "          h/l round   j/k slot   Enter team details   Esc close popup",
        "Winners:  j/k game   a slot A wins   b slot B wins   u undo winner",
        "Any view: R or F5 refresh   f full screen   \" logs   q quit",
    ];
    f.render_widget(
        Paragraph::new(lines.join("\n")).style(Style::default().fg(Color::Gray)),
        inner,
    );
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logger = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .output_target(false)
        .output_timestamp(Some("%H:%M:%S".to_string()))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow));
    f.render_widget(logger, area);
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(2), 0, 1, 1)
    };
    f.render_widget(spinner, area);
}
