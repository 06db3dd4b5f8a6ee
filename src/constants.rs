use std::time::Duration;

pub const TICK_RATE: u32 = 60;
/// 16_666us. Whole milliseconds would round the loop up to 62.5 ticks/s.
pub const TICK_PERIOD: Duration = Duration::from_micros(1_000_000 / TICK_RATE as u64);

pub const STARTING_LIVES: i32 = 3;
pub const FIRST_LEVEL: u32 = 1;

/// Ticks spent travelling one cell. Pac covers 6 cells/s and ghosts about 4.6 cells/s.
pub const PAC_FRAMES_PER_MOVEMENT: u32 = 10;
pub const GHOST_FRAMES_PER_MOVEMENT: u32 = 13;

pub const POWER_DURATION_SECS: u32 = 8;
pub const MAX_POWER_MODE_TIME: u32 = POWER_DURATION_SECS * TICK_RATE;

/// Chance that a wandering ghost keeps its heading when the way ahead is open.
pub const GHOST_KEEP_HEADING_CHANCE: f32 = 0.75;

pub const DEFAULT_SQUARE_SIZE: u32 = 40;
