use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DirectionError, LevelError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Stopped,
}

impl Direction {
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit step for one cell. `Stopped` is the zero vector.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::Stopped => (0, 0),
        }
    }

    pub fn delta_on(self, axis: Axis) -> i32 {
        let (dx, dy) = self.delta();
        match axis {
            Axis::X => dx,
            Axis::Y => dy,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Stopped => Self::Stopped,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Stopped => "stopped",
        }
    }

    /// Parses one of the four movement names. `"stopped"` is a resting state,
    /// never something an actor can ask for.
    pub fn parse_intent(value: &str) -> Result<Self, DirectionError> {
        match value {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "stopped" => Err(DirectionError::NotAnIntent),
            other => Err(DirectionError::Unknown(other.to_string())),
        }
    }
}

impl FromStr for Direction {
    type Err = DirectionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse_intent(value)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Cell {
    Empty = 0,
    Wall = 1,
    Pellet = 2,
    PowerPellet = 3,
}

impl Cell {
    pub fn is_pellet(self) -> bool {
        matches!(self, Self::Pellet | Self::PowerPellet)
    }
}

impl TryFrom<u8> for Cell {
    type Error = LevelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Empty),
            1 => Ok(Self::Wall),
            2 => Ok(Self::Pellet),
            3 => Ok(Self::PowerPellet),
            other => Err(LevelError::InvalidCell { value: other }),
        }
    }
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> Self {
        cell as u8
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct LevelView {
    pub name: String,
    pub width: i32,
    pub height: i32,
    #[serde(rename = "squareSize")]
    pub square_size: u32,
    #[serde(rename = "pixelWidth")]
    pub pixel_width: u32,
    #[serde(rename = "pixelHeight")]
    pub pixel_height: u32,
    pub teleport: bool,
    pub grid: Vec<Vec<Cell>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PacView {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub intent: Option<Direction>,
    #[serde(rename = "offsetX")]
    pub offset_x: f32,
    #[serde(rename = "offsetY")]
    pub offset_y: f32,
    #[serde(rename = "powerModeTime")]
    pub power_mode_time: u32,
    pub powered: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: usize,
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    #[serde(rename = "offsetX")]
    pub offset_x: f32,
    #[serde(rename = "offsetY")]
    pub offset_y: f32,
    pub retreating: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    LevelStarted {
        #[serde(rename = "levelNumber")]
        level_number: u32,
        name: String,
    },
    PelletEaten {
        x: i32,
        y: i32,
    },
    PowerPelletEaten {
        x: i32,
        y: i32,
    },
    LevelCompleted {
        #[serde(rename = "levelNumber")]
        level_number: u32,
    },
    GhostCaptured {
        #[serde(rename = "ghostId")]
        ghost_id: usize,
    },
    LifeLost {
        #[serde(rename = "livesLeft")]
        lives_left: i32,
    },
    GameOver {
        #[serde(rename = "finalScore")]
        final_score: u32,
        #[serde(rename = "levelNumber")]
        level_number: u32,
    },
}

/// What a single tick resolved to, after movement, pellets and collisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TickOutcome {
    Continued,
    LevelAdvanced {
        #[serde(rename = "levelNumber")]
        level_number: u32,
    },
    GhostsCaptured {
        count: usize,
    },
    LifeLost {
        #[serde(rename = "livesLeft")]
        lives_left: i32,
    },
    GameOver {
        #[serde(rename = "finalScore")]
        final_score: u32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub score: u32,
    pub lives: i32,
    #[serde(rename = "levelNumber")]
    pub level_number: u32,
    pub level: LevelView,
    pub pac: PacView,
    pub ghosts: Vec<GhostView>,
    #[serde(rename = "remainingPellets")]
    pub remaining_pellets: usize,
    pub events: Vec<GameEvent>,
}
