//! Level layout data.
//!
//! A layout is the static description of one café floor: tile rows plus the
//! handful of points the customer flow needs (spawn, counter, exit, queue
//! points, seats). It loads from JSON:
//!
//! ```json
//! {
//!   "cell_size": 1.0,
//!   "origin": { "x": 0.0, "y": 0.0 },
//!   "rows": ["#####", "#...#", "##.##"],
//!   "spawn": { "x": 2.5, "y": 0.5 },
//!   "counter": { "x": 2.5, "y": 1.5 },
//!   "queue_points": [],
//!   "seats": [{ "x": 1.5, "y": 1.5 }]
//! }
//! ```
//!
//! Row 0 is the top of the floor plan (highest y). `.` is floor, `#` is an
//! obstacle standing on floor, and a space is outside the café.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::geometry::Vec2;
use crate::grid::{Cell, TileGrid};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelLayout {
    pub cell_size: f32,
    #[serde(default)]
    pub origin: Vec2,
    pub rows: Vec<String>,
    pub spawn: Vec2,
    pub counter: Vec2,
    /// Where leaving customers walk to. Falls back to `spawn` when absent.
    #[serde(default)]
    pub exit: Option<Vec2>,
    /// Back of the line first, counter-most point last.
    #[serde(default)]
    pub queue_points: Vec<Vec2>,
    #[serde(default)]
    pub seats: Vec<Vec2>,
}

/// Non-fatal layout problem. The simulation still runs, possibly degraded.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutWarning {
    NoQueuePoints,
    NoSeats,
    NoExit,
    NotWalkable { what: &'static str, point: Vec2 },
    SharedCell { what: &'static str, cell: Cell },
}

impl fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutWarning::NoQueuePoints => {
                write!(f, "no queue points; queue positions will be computed behind the counter")
            }
            LayoutWarning::NoSeats => write!(f, "no seats; customers can never be seated"),
            LayoutWarning::NoExit => write!(f, "no exit point; leaving customers walk back to spawn"),
            LayoutWarning::NotWalkable { what, point } => {
                write!(f, "{} at {} is not on a walkable cell", what, point)
            }
            LayoutWarning::SharedCell { what, cell } => {
                write!(f, "two {} share cell {}", what, cell)
            }
        }
    }
}

impl LevelLayout {
    /// Parse a layout and check that it can be turned into a grid.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let layout: Self = serde_json::from_str(json)?;
        layout.tiles()?;
        Ok(layout)
    }

    /// Floor and obstacle cells described by the ASCII rows.
    pub fn tiles(&self) -> Result<(Vec<Cell>, Vec<Cell>), ConfigError> {
        if self.cell_size <= 0.0 || !self.cell_size.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "cell_size",
                reason: format!("must be positive, got {}", self.cell_size),
            });
        }

        let top = self.rows.len() as i32 - 1;
        let mut floor = Vec::new();
        let mut obstacles = Vec::new();
        for (row, line) in self.rows.iter().enumerate() {
            let y = top - row as i32;
            for (column, ch) in line.chars().enumerate() {
                let cell = Cell::new(column as i32, y);
                match ch {
                    '.' => floor.push(cell),
                    '#' => {
                        floor.push(cell);
                        obstacles.push(cell);
                    }
                    ' ' => {}
                    _ => return Err(ConfigError::MalformedLayout { row, column, ch }),
                }
            }
        }
        Ok((floor, obstacles))
    }

    pub fn build_grid(&self) -> Result<TileGrid, ConfigError> {
        let (floor, obstacles) = self.tiles()?;
        Ok(TileGrid::build(&floor, &obstacles, self.origin, self.cell_size))
    }

    /// Exit point, or the spawn point when none is configured.
    pub fn exit_point(&self) -> Vec2 {
        self.exit.unwrap_or(self.spawn)
    }

    /// Check the layout points against `grid`. Every warning is also logged.
    pub fn validate(&self, grid: &TileGrid) -> Vec<LayoutWarning> {
        let mut warnings = Vec::new();

        if self.queue_points.is_empty() {
            warnings.push(LayoutWarning::NoQueuePoints);
        }
        if self.seats.is_empty() {
            warnings.push(LayoutWarning::NoSeats);
        }
        if self.exit.is_none() {
            warnings.push(LayoutWarning::NoExit);
        }

        let mut check = |what: &'static str, point: Vec2| {
            if !grid.is_walkable(grid.world_to_cell(point)) {
                warnings.push(LayoutWarning::NotWalkable { what, point });
            }
        };
        check("spawn", self.spawn);
        check("counter", self.counter);
        if let Some(exit) = self.exit {
            check("exit", exit);
        }
        for p in &self.queue_points {
            check("queue point", *p);
        }
        for p in &self.seats {
            check("seat", *p);
        }

        for (what, points) in [("queue points", &self.queue_points), ("seats", &self.seats)] {
            let mut seen = HashSet::new();
            for p in points {
                let cell = grid.world_to_cell(*p);
                if !seen.insert(cell) {
                    warnings.push(LayoutWarning::SharedCell { what, cell });
                }
            }
        }

        for w in &warnings {
            log::warn!("layout: {}", w);
        }
        warnings
    }

    /// A small café: door at the bottom, counter at the top, a straight
    /// five-point queue and six seats along the walls.
    pub fn demo() -> Self {
        let rows = [
            "############",
            "#..........#",
            "#..........#",
            "#.##....##.#",
            "#..........#",
            "#..........#",
            "#..........#",
            "#..........#",
            "#..........#",
            "#####..#####",
        ];
        let at = |x: i32, y: i32| Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        Self {
            cell_size: 1.0,
            origin: Vec2::ZERO,
            rows: rows.iter().map(|r| r.to_string()).collect(),
            spawn: at(5, 0),
            counter: at(5, 8),
            exit: Some(at(6, 0)),
            queue_points: (3..8).map(|y| at(5, y)).collect(),
            seats: vec![
                at(1, 8),
                at(2, 8),
                at(9, 8),
                at(10, 8),
                at(1, 2),
                at(10, 2),
            ],
        }
    }
}
