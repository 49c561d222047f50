use crate::bracket::geometry::LEVELS;
use crate::bracket::{RegionGeometry, ResolvedRegion, Segment, Stroke, Viewport};
use pool_api::Slot;
use std::collections::HashMap;
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::Style;
use tui::widgets::Widget;

use crate::components::theme::{Theme, ThemeColor, resolve, stroke_style};

/// Short column headers, one per bracket level.
const LEVEL_HEADERS: [&str; LEVELS] = ["Round of 64", "Round of 32", "Sweet 16", "Elite 8", "Final Four"];

const UP: u8 = 1;
const DOWN: u8 = 2;
const LEFT: u8 = 4;
const RIGHT: u8 = 8;

// ---------------------------------------------------------------------------
// RegionBracketView widget
// ---------------------------------------------------------------------------

/// Renders one region: slot labels at every level plus the connector lines
/// produced by the geometry engine. The drawing is authored at the layout's
/// fixed width and squeezed horizontally when the pane is narrower.
pub struct RegionBracketView<'a> {
    pub region: &'a ResolvedRegion<'a>,
    pub geometry: &'a RegionGeometry,
    /// `(level, row)` of the highlighted slot, when this region has focus.
    pub cursor: Option<(usize, usize)>,
    /// Vertical scroll offset in terminal rows.
    pub scroll_offset: u16,
    pub theme: Theme,
}

impl<'a> Widget for RegionBracketView<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 10 || area.height == 0 {
            return;
        }
        let layout = &self.geometry.layout;
        let viewport = Viewport::fit(layout, f64::from(area.width));
        let sx = |x: f64| (x * viewport.scale).round() as u16;

        // Pass 1: connectors, rasterized to box-drawing cells.
        for ((x, row), (mask, stroke)) in rasterize(&self.geometry.segments(self.region), viewport.scale) {
            let Some(sy) = screen_y(row, self.scroll_offset, area) else {
                continue;
            };
            if x < area.width {
                put_char(buf, area.x + x, sy, mask_char(mask), stroke_style(stroke, self.theme));
            }
        }

        // Pass 2: column headers and slot labels.
        let dim = resolve(ThemeColor::Dim, self.theme);
        for level in 0..LEVELS {
            let x = sx(layout.x_label[level]);
            let width = scaled_width(layout.label_w[level], viewport.scale);
            if let Some(sy) = screen_y(0, self.scroll_offset, area) {
                put_str(buf, area, x, sy, &fit(LEVEL_HEADERS[level], width), dim);
            }

            for (row, center) in self.geometry.centers[level].iter().enumerate() {
                let label_row = (center.round() as u16).saturating_sub(1);
                let Some(sy) = screen_y(label_row, self.scroll_offset, area) else {
                    continue;
                };
                let Some(slot) = self.region.slot_at(level, row) else {
                    continue;
                };
                let style = self.slot_style(slot, self.region.slot_won(level, row), self.cursor == Some((level, row)));
                put_str(buf, area, x, sy, &format_slot(slot, width), style);
            }
        }
    }
}

impl RegionBracketView<'_> {
    fn slot_style(&self, slot: &Slot, won: bool, selected: bool) -> Style {
        let base = if slot.is_empty() {
            resolve(ThemeColor::Placeholder, self.theme)
        } else if won {
            resolve(ThemeColor::Winner, self.theme)
        } else {
            resolve(ThemeColor::Primary, self.theme)
        };
        if selected { base.patch(resolve(ThemeColor::Cursor, self.theme)) } else { base }
    }
}

/// Terminal rows one region needs, headers included.
pub fn region_height(geometry: &RegionGeometry) -> u16 {
    geometry.layout.height.ceil() as u16
}

fn scaled_width(width: u16, scale: f64) -> usize {
    (f64::from(width) * scale).floor() as usize
}

/// Collapse line segments onto terminal cells. Each cell keeps the directions
/// lines leave it in and the strongest stroke that touches it.
fn rasterize(segments: &[Segment], scale: f64) -> HashMap<(u16, u16), (u8, Stroke)> {
    let mut cells: HashMap<(u16, u16), (u8, Stroke)> = HashMap::new();
    let mut mark = |x: u16, y: u16, dir: u8, stroke: Stroke| {
        let cell = cells.entry((x, y)).or_insert((0, stroke));
        cell.0 |= dir;
        if stroke_rank(stroke) > stroke_rank(cell.1) {
            cell.1 = stroke;
        }
    };

    for s in segments {
        let (x1, x2) = ((s.x1 * scale).round() as u16, (s.x2 * scale).round() as u16);
        let (y1, y2) = (s.y1.round() as u16, s.y2.round() as u16);
        if y1 == y2 {
            let (lo, hi) = (x1.min(x2), x1.max(x2));
            for x in lo..=hi {
                let mut dir = 0;
                if x > lo {
                    dir |= LEFT;
                }
                if x < hi {
                    dir |= RIGHT;
                }
                mark(x, y1, dir, s.stroke);
            }
        } else {
            let (lo, hi) = (y1.min(y2), y1.max(y2));
            for y in lo..=hi {
                let mut dir = 0;
                if y > lo {
                    dir |= UP;
                }
                if y < hi {
                    dir |= DOWN;
                }
                mark(x1, y, dir, s.stroke);
            }
        }
    }
    cells
}

fn stroke_rank(stroke: Stroke) -> u8 {
    match stroke {
        Stroke::Absent => 0,
        Stroke::Undecided => 1,
        Stroke::Decided => 2,
    }
}

fn mask_char(mask: u8) -> char {
    match mask {
        m if m == UP | DOWN | LEFT | RIGHT => '┼',
        m if m == UP | DOWN | RIGHT => '├',
        m if m == UP | DOWN | LEFT => '┤',
        m if m == LEFT | RIGHT | DOWN => '┬',
        m if m == LEFT | RIGHT | UP => '┴',
        m if m == DOWN | LEFT => '┐',
        m if m == UP | LEFT => '┘',
        m if m == DOWN | RIGHT => '┌',
        m if m == UP | RIGHT => '└',
        m if m & (UP | DOWN) != 0 && m & (LEFT | RIGHT) == 0 => '│',
        _ => '─',
    }
}

/// `" 1 Auburn"`, `"16 TBD"` or `"   TBD"`, padded or cut to `width`.
fn format_slot(slot: &Slot, width: usize) -> String {
    let seed = slot.seed().map_or_else(|| "  ".to_string(), |s| format!("{s:>2}"));
    let name = slot.participant().map_or("TBD", |p| p.name.as_str());
    fit(&format!("{seed} {name}"), width)
}

fn fit(text: &str, width: usize) -> String {
    let clipped: String = text.chars().take(width).collect();
    format!("{clipped:<width$}")
}

/// Convert a bracket-relative row to an absolute screen y, applying scroll + area bounds.
/// Returns `None` if the row is off-screen.
fn screen_y(bracket_row: u16, scroll: u16, area: Rect) -> Option<u16> {
    if bracket_row < scroll {
        return None;
    }
    let rel = bracket_row - scroll;
    if rel >= area.height {
        return None;
    }
    Some(area.y + rel)
}

fn put_str(buf: &mut Buffer, area: Rect, x: u16, y: u16, text: &str, style: Style) {
    if x >= area.width {
        return;
    }
    let avail = (area.width - x) as usize;
    let clipped: String = text.chars().take(avail).collect();
    buf.set_string(area.x + x, y, clipped, style);
}

fn put_char(buf: &mut Buffer, x: u16, y: u16, ch: char, style: Style) {
    if let Some(cell) = buf.cell_mut((x, y)) {
        cell.set_char(ch);
        cell.set_style(style);
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{BracketLayout, SEED_PAIRS, SlotResolver, partition_regions};
    use pool_api::{Game, Participant};

    fn south_round_one(winner_game_1: bool) -> Vec<Game> {
        SEED_PAIRS
            .iter()
            .enumerate()
            .map(|(i, (a, b))| {
                let team = |seed: u8| {
                    Slot::Occupied(Participant {
                        id: 100 + i64::from(seed),
                        name: format!("Team{seed}"),
                        seed: Some(seed),
                        region: Some("South".into()),
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
                    winner_team_id: (winner_game_1 && i == 0).then_some(101),
                    ..Game::default()
                }
            })
            .collect()
    }

    fn render(games: &[Game], width: u16, cursor: Option<(usize, usize)>) -> Buffer {
        let regions = partition_regions(games);
        let region = SlotResolver::new(&regions[0]).resolve_region();
        let geometry = RegionGeometry::default();
        let area = Rect::new(0, 0, width, region_height(&geometry));
        let mut buf = Buffer::empty(area);
        RegionBracketView { region: &region, geometry: &geometry, cursor, scroll_offset: 0, theme: Theme::Dark }
            .render(area, &mut buf);
        buf
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .filter_map(|x| buf.cell((x, y)).map(|c| c.symbol().to_string()))
            .collect()
    }

    fn symbol(buf: &Buffer, x: u16, y: u16) -> String {
        buf.cell((x, y)).map(|c| c.symbol().to_string()).unwrap_or_default()
    }

    #[test]
    fn test_round_one_labels_sit_above_their_lines() {
        let buf = render(&south_round_one(false), 88, None);
        assert!(row_text(&buf, 1).starts_with(" 1 Team1"));
        assert!(row_text(&buf, 3).starts_with("16 Team16"));
        assert!(row_text(&buf, 31).starts_with("15 Team15"));
    }

    #[test]
    fn test_connector_shape_for_first_game() {
        let buf = render(&south_round_one(false), 88, None);
        let join = BracketLayout::TERMINAL.x_join[0] as u16;
        assert_eq!(symbol(&buf, join - 1, 2), "─");
        assert_eq!(symbol(&buf, join, 2), "┐");
        assert_eq!(symbol(&buf, join, 3), "├");
        assert_eq!(symbol(&buf, join, 4), "┘");
        assert_eq!(symbol(&buf, join + 1, 3), "─");
    }

    #[test]
    fn test_placeholders_render_as_tbd() {
        let buf = render(&south_round_one(false), 88, None);
        let x = BracketLayout::TERMINAL.x_label[1] as usize;
        let text = row_text(&buf, 2);
        assert_eq!(text.chars().skip(x).take(6).collect::<String>(), "   TBD");
    }

    #[test]
    fn test_winner_propagates_into_next_column() {
        let buf = render(&south_round_one(true), 88, None);
        let x = BracketLayout::TERMINAL.x_label[1] as usize;
        let text = row_text(&buf, 2);
        assert!(text.chars().skip(x).collect::<String>().starts_with(" 1 Team1"));
    }

    #[test]
    fn test_narrow_pane_squeezes_horizontally() {
        let buf = render(&south_round_one(false), 44, None);
        let join = (BracketLayout::TERMINAL.x_join[0] * 0.5).round() as u16;
        assert_eq!(symbol(&buf, join, 2), "┐");
        assert!(row_text(&buf, 1).starts_with(" 1 Team1"));
    }

    #[test]
    fn test_mask_chars() {
        assert_eq!(mask_char(LEFT | RIGHT), '─');
        assert_eq!(mask_char(RIGHT), '─');
        assert_eq!(mask_char(UP | DOWN), '│');
        assert_eq!(mask_char(DOWN | LEFT), '┐');
        assert_eq!(mask_char(UP | DOWN | RIGHT), '├');
        assert_eq!(mask_char(UP | DOWN | LEFT | RIGHT), '┼');
    }

    #[test]
    fn test_format_slot_width() {
        let slot = Slot::Empty { seed: Some(9) };
        assert_eq!(format_slot(&slot, 8), " 9 TBD  ");
        assert_eq!(format_slot(&Slot::default(), 4), "   T");
    }
}
