use std::fmt;

/// A level definition that cannot be played. Detected when the catalog is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LevelError {
    EmptyLayout {
        level: String,
    },
    NonRectangular {
        level: String,
        row: usize,
        expected: usize,
        found: usize,
    },
    InvalidCell {
        value: u8,
    },
    SpawnOutOfBounds {
        level: String,
        actor: String,
        x: i32,
        y: i32,
    },
    SpawnInWall {
        level: String,
        actor: String,
        x: i32,
        y: i32,
    },
    NoGhosts {
        level: String,
    },
    ZeroSquareSize {
        level: String,
    },
    EmptyCatalog,
    Parse(String),
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLayout { level } => write!(f, "level {level:?} has an empty layout"),
            Self::NonRectangular {
                level,
                row,
                expected,
                found,
            } => write!(
                f,
                "level {level:?} is not rectangular: row {row} has {found} cells, expected {expected}"
            ),
            Self::InvalidCell { value } => write!(f, "invalid cell code {value}"),
            Self::SpawnOutOfBounds { level, actor, x, y } => {
                write!(f, "level {level:?}: {actor} spawn ({x},{y}) is outside the grid")
            }
            Self::SpawnInWall { level, actor, x, y } => {
                write!(f, "level {level:?}: {actor} spawn ({x},{y}) is inside a wall")
            }
            Self::NoGhosts { level } => write!(f, "level {level:?} has no ghost spawns"),
            Self::ZeroSquareSize { level } => write!(f, "level {level:?} has a zero square size"),
            Self::EmptyCatalog => f.write_str("level catalog is empty"),
            Self::Parse(message) => write!(f, "failed to parse level catalog: {message}"),
        }
    }
}

impl std::error::Error for LevelError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DirectionError {
    Unknown(String),
    NotAnIntent,
}

impl fmt::Display for DirectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(token) => write!(f, "unknown direction {token:?}"),
            Self::NotAnIntent => f.write_str("stopped is not a movement intent"),
        }
    }
}

impl std::error::Error for DirectionError {}
