use super::resolver::ResolvedRegion;
use super::REGION_ROUNDS;

/// Bracket levels: four rounds of slots plus the Final Four slot.
pub const LEVELS: usize = REGION_ROUNDS as usize + 1;

/// Fixed drawing coordinates for one region, in terminal cells. `y` grows
/// downward, matching buffer rows.
#[derive(Debug, Clone, PartialEq)]
pub struct BracketLayout {
    pub width: f64,
    pub height: f64,
    pub top_y: f64,
    pub team_step: f64,
    pub row_h: f64,

    /// Left edge of each level's slot labels.
    pub x_label: [f64; LEVELS],
    /// Label width in cells, seed included.
    pub label_w: [u16; LEVELS],

    /// Where a round's connector leaves its slots.
    pub x_source: [f64; REGION_ROUNDS as usize],
    pub x_join: [f64; REGION_ROUNDS as usize],
    /// Where the forward line ends, under the next level's label.
    pub x_target: [f64; REGION_ROUNDS as usize],
}

impl BracketLayout {
    pub const TERMINAL: BracketLayout = BracketLayout {
        width: 88.0,
        height: 34.0,
        top_y: 2.0,
        team_step: 2.0,
        row_h: 0.0,

        x_label: [0.0, 25.0, 41.0, 57.0, 73.0],
        label_w: [22, 13, 13, 13, 14],

        x_source: [22.0, 38.0, 54.0, 70.0],
        x_join: [24.0, 40.0, 56.0, 72.0],
        x_target: [38.0, 54.0, 70.0, 87.0],
    };

    /// Row centers of the 16 round-of-64 slots.
    pub fn round_one_centers(&self) -> Vec<f64> {
        (0..16)
            .map(|i| self.top_y + f64::from(i) * self.team_step + self.row_h / 2.0)
            .collect()
    }
}

impl Default for BracketLayout {
    fn default() -> Self {
        Self::TERMINAL
    }
}

/// Halve a list of centers: element `j` is the mean of `values[2j]` and
/// `values[2j + 1]`. A trailing odd value is dropped.
pub fn pair_midpoints(values: &[f64]) -> Vec<f64> {
    values.chunks_exact(2).map(|pair| (pair[0] + pair[1]) / 2.0).collect()
}

/// Line emphasis for a game's connectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    Decided,
    Undecided,
    /// No backing row exists for the game.
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub stroke: Stroke,
}

/// Vertical slot centers for every level of a region. Later levels are
/// derived by `pair_midpoints`, so connectors always meet their targets.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionGeometry {
    pub layout: BracketLayout,
    /// 16, 8, 4, 2 and 1 centers.
    pub centers: [Vec<f64>; LEVELS],
}

impl RegionGeometry {
    pub fn new(layout: BracketLayout) -> Self {
        let mut centers: [Vec<f64>; LEVELS] = Default::default();
        centers[0] = layout.round_one_centers();
        for level in 1..LEVELS {
            centers[level] = pair_midpoints(&centers[level - 1]);
        }
        Self { layout, centers }
    }

    pub fn center(&self, level: usize, row: usize) -> Option<f64> {
        self.centers.get(level)?.get(row).copied()
    }

    /// Connector lines for the games of `round_no`. Each game contributes two
    /// horizontals from its slots to the join, the vertical join itself, and
    /// the forward line to the next level's slot.
    pub fn connectors(&self, round_no: u8, stroke_of: impl Fn(usize) -> Stroke) -> Vec<Segment> {
        let level = round_no as usize;
        if level == 0 || level > REGION_ROUNDS as usize {
            return Vec::new();
        }
        let (sources, targets) = (&self.centers[level - 1], &self.centers[level]);
        let x_source = self.layout.x_source[level - 1];
        let x_join = self.layout.x_join[level - 1];
        let x_target = self.layout.x_target[level - 1];

        let mut out = Vec::with_capacity(targets.len() * 4);
        for (i, target_y) in targets.iter().enumerate() {
            let (y1, y2) = (sources[i * 2], sources[i * 2 + 1]);
            let stroke = stroke_of(i);
            out.extend([
                Segment { x1: x_source, y1, x2: x_join, y2: y1, stroke },
                Segment { x1: x_source, y1: y2, x2: x_join, y2, stroke },
                Segment { x1: x_join, y1, x2: x_join, y2, stroke },
                Segment { x1: x_join, y1: *target_y, x2: x_target, y2: *target_y, stroke },
            ]);
        }
        out
    }

    /// Every connector of a resolved region, coloured by its game's state.
    pub fn segments(&self, region: &ResolvedRegion<'_>) -> Vec<Segment> {
        (1..=REGION_ROUNDS)
            .flat_map(|round_no| {
                let games = region.round(round_no);
                self.connectors(round_no, |i| games.get(i).map_or(Stroke::Absent, |g| g.stroke()))
            })
            .collect()
    }
}

impl Default for RegionGeometry {
    fn default() -> Self {
        Self::new(BracketLayout::TERMINAL)
    }
}

/// Uniform scale for fitting the fixed-size region drawing into the space
/// available. Never scales up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn fit(layout: &BracketLayout, available_width: f64) -> Self {
        let scale = if available_width > 0.0 {
            (available_width / layout.width).min(1.0)
        } else {
            1.0
        };
        Self { scale, width: layout.width * scale, height: layout.height * scale }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_have_halving_center_counts() {
        let geometry = RegionGeometry::default();
        let counts: Vec<usize> = geometry.centers.iter().map(Vec::len).collect();
        assert_eq!(counts, vec![16, 8, 4, 2, 1]);
    }

    #[test]
    fn test_every_center_is_the_midpoint_of_its_feeders() {
        let geometry = RegionGeometry::default();
        for level in 1..LEVELS {
            for (j, y) in geometry.centers[level].iter().enumerate() {
                let below = &geometry.centers[level - 1];
                assert_eq!(*y, (below[2 * j] + below[2 * j + 1]) / 2.0);
            }
        }
    }

    #[test]
    fn test_terminal_centers_land_on_whole_rows() {
        let geometry = RegionGeometry::default();
        assert!(geometry.centers.iter().flatten().all(|y| y.fract() == 0.0));
        assert_eq!(geometry.center(4, 0), Some(17.0));
        assert_eq!(geometry.center(4, 1), None);
    }

    #[test]
    fn test_pair_midpoints_drops_trailing_value() {
        assert_eq!(pair_midpoints(&[0.0, 2.0, 10.0]), vec![1.0]);
        assert!(pair_midpoints(&[]).is_empty());
    }

    #[test]
    fn test_four_segments_per_game() {
        let geometry = RegionGeometry::default();
        for (round_no, games) in [(1u8, 8usize), (2, 4), (3, 2), (4, 1)] {
            assert_eq!(geometry.connectors(round_no, |_| Stroke::Absent).len(), games * 4);
        }
        assert!(geometry.connectors(0, |_| Stroke::Absent).is_empty());
        assert!(geometry.connectors(5, |_| Stroke::Absent).is_empty());
    }

    #[test]
    fn test_connector_meets_target_center() {
        let geometry = RegionGeometry::default();
        let segments = geometry.connectors(2, |i| if i == 1 { Stroke::Decided } else { Stroke::Undecided });
        let game = &segments[4..8];
        let (top, bottom) = (geometry.centers[1][2], geometry.centers[1][3]);

        assert_eq!((game[0].y1, game[1].y1), (top, bottom));
        assert_eq!((game[2].y1, game[2].y2), (top, bottom));
        assert_eq!(game[2].x1, game[2].x2);
        assert_eq!(game[3].y1, geometry.centers[2][1]);
        assert_eq!(game[3].x2, BracketLayout::TERMINAL.x_target[1]);
        assert!(game.iter().all(|s| s.stroke == Stroke::Decided));
        assert_eq!(segments[0].stroke, Stroke::Undecided);
    }

    #[test]
    fn test_viewport_scales_down_only() {
        let layout = BracketLayout::TERMINAL;
        let wide = Viewport::fit(&layout, 200.0);
        assert_eq!(wide.scale, 1.0);
        assert_eq!(wide.width, layout.width);

        let narrow = Viewport::fit(&layout, 44.0);
        assert_eq!(narrow.scale, 0.5);
        assert_eq!(narrow.height, layout.height / 2.0);

        assert_eq!(Viewport::fit(&layout, 0.0).scale, 1.0);
    }
}
