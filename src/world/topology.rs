use glam::DVec2;

/// Cardinal grid directions. Y grows downward, so north is `-y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

/// Unit grid offsets, in the same order as [`Direction::ALL`].
const OFFSETS: [(i32, i32); 4] = [
    (0, -1), // North
    (1, 0),  // East
    (0, 1),  // South
    (-1, 0), // West
];

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Directions option tiles grow into after a placement. Play never
    /// extends back north.
    pub const GROWTH: [Direction; 3] = [Direction::West, Direction::South, Direction::East];

    pub fn offset(self) -> (i32, i32) {
        OFFSETS[self as usize]
    }
}

/// World position one grid step from `origin` in `direction`.
pub fn neighbor_position(origin: DVec2, direction: Direction, pitch: f64) -> DVec2 {
    let (dx, dy) = direction.offset();
    origin + DVec2::new(dx as f64, dy as f64) * pitch
}

/// All four neighbor positions of `origin`.
pub fn neighbor_positions(origin: DVec2, pitch: f64) -> [DVec2; 4] {
    Direction::ALL.map(|d| neighbor_position(origin, d, pitch))
}
