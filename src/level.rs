use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SQUARE_SIZE;
use crate::error::LevelError;
use crate::types::{Axis, Cell, Direction, LevelView, Vec2};

/// Immutable description of one maze. Loaded once, shared by every `Level` built from it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub name: String,
    pub layout: Vec<Vec<Cell>>,
    #[serde(rename = "startingPac")]
    pub starting_pac: Vec2,
    #[serde(rename = "startingGhosts")]
    pub starting_ghosts: Vec<Vec2>,
    #[serde(default)]
    pub teleport: bool,
    #[serde(rename = "squareSize", default = "default_square_size")]
    pub square_size: u32,
}

fn default_square_size() -> u32 {
    DEFAULT_SQUARE_SIZE
}

impl LevelDefinition {
    pub fn width(&self) -> i32 {
        self.layout.first().map(|row| row.len()).unwrap_or(0) as i32
    }

    pub fn height(&self) -> i32 {
        self.layout.len() as i32
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        let expected = self.layout.first().map(|row| row.len()).unwrap_or(0);
        if expected == 0 {
            return Err(LevelError::EmptyLayout {
                level: self.name.clone(),
            });
        }
        for (row, cells) in self.layout.iter().enumerate() {
            if cells.len() != expected {
                return Err(LevelError::NonRectangular {
                    level: self.name.clone(),
                    row,
                    expected,
                    found: cells.len(),
                });
            }
        }
        if self.square_size == 0 {
            return Err(LevelError::ZeroSquareSize {
                level: self.name.clone(),
            });
        }
        if self.starting_ghosts.is_empty() {
            return Err(LevelError::NoGhosts {
                level: self.name.clone(),
            });
        }

        self.validate_spawn("pac", self.starting_pac)?;
        for (idx, spawn) in self.starting_ghosts.iter().enumerate() {
            self.validate_spawn(&format!("ghost {idx}"), *spawn)?;
        }
        Ok(())
    }

    fn validate_spawn(&self, actor: &str, spawn: Vec2) -> Result<(), LevelError> {
        let in_bounds =
            spawn.x >= 0 && spawn.y >= 0 && spawn.x < self.width() && spawn.y < self.height();
        if !in_bounds {
            return Err(LevelError::SpawnOutOfBounds {
                level: self.name.clone(),
                actor: actor.to_string(),
                x: spawn.x,
                y: spawn.y,
            });
        }
        if self.layout[spawn.y as usize][spawn.x as usize] == Cell::Wall {
            return Err(LevelError::SpawnInWall {
                level: self.name.clone(),
                actor: actor.to_string(),
                x: spawn.x,
                y: spawn.y,
            });
        }
        Ok(())
    }
}

/// True modulo: the result is in `[0, m)` for any `n`, so stepping below zero
/// lands on the far end of the axis.
pub fn modulo(n: i32, m: i32) -> i32 {
    n.rem_euclid(m)
}

/// One playthrough of a `LevelDefinition`: the working grid pellets are eaten from.
#[derive(Clone, Debug)]
pub struct Level {
    definition: Arc<LevelDefinition>,
    grid: Vec<Vec<Cell>>,
}

impl Level {
    pub fn new(definition: Arc<LevelDefinition>) -> Self {
        let mut level = Self {
            definition,
            grid: Vec::new(),
        };
        level.restart();
        level
    }

    /// Puts every pellet back by copying the layout into the working grid.
    pub fn restart(&mut self) {
        self.grid = self.definition.layout.clone();
    }

    pub fn definition(&self) -> &LevelDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn width(&self) -> i32 {
        self.definition.width()
    }

    pub fn height(&self) -> i32 {
        self.definition.height()
    }

    pub fn square_size(&self) -> u32 {
        self.definition.square_size
    }

    pub fn pixel_width(&self) -> u32 {
        self.width() as u32 * self.square_size()
    }

    pub fn pixel_height(&self) -> u32 {
        self.height() as u32 * self.square_size()
    }

    pub fn teleport(&self) -> bool {
        self.definition.teleport
    }

    pub fn starting_pac(&self) -> Vec2 {
        self.definition.starting_pac
    }

    pub fn starting_ghosts(&self) -> &[Vec2] {
        &self.definition.starting_ghosts
    }

    pub fn grid(&self) -> &[Vec<Cell>] {
        &self.grid
    }

    /// `None` when `(x, y)` lies outside the grid.
    pub fn cell(&self, x: i32, y: i32) -> Option<Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.grid
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
    }

    /// Only plain pellets count; leftover power pellets do not hold the level open.
    pub fn is_complete(&self) -> bool {
        !self
            .grid
            .iter()
            .flatten()
            .any(|cell| *cell == Cell::Pellet)
    }

    pub fn remaining_pellets(&self) -> usize {
        self.grid
            .iter()
            .flatten()
            .filter(|cell| **cell == Cell::Pellet)
            .count()
    }

    /// Clears a pellet or power pellet at `(x, y)` and returns what was there.
    /// Any other cell is left untouched.
    pub fn consume(&mut self, x: i32, y: i32) -> Option<Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        let slot = self.grid.get_mut(y as usize)?.get_mut(x as usize)?;
        if !slot.is_pellet() {
            return None;
        }
        let eaten = *slot;
        *slot = Cell::Empty;
        Some(eaten)
    }

    pub fn next_coordinate(&self, position: Vec2, axis: Axis, direction: Direction) -> i32 {
        let current = match axis {
            Axis::X => position.x,
            Axis::Y => position.y,
        };
        let next = current + direction.delta_on(axis);
        if !self.teleport() {
            return next;
        }
        if direction.is_vertical() {
            modulo(next, self.height())
        } else {
            modulo(next, self.width())
        }
    }

    pub fn next_cell(&self, position: Vec2, direction: Direction) -> Vec2 {
        Vec2 {
            x: self.next_coordinate(position, Axis::X, direction),
            y: self.next_coordinate(position, Axis::Y, direction),
        }
    }

    /// A step is blocked by a wall, or by the edge of a level without teleport.
    pub fn is_path_blocked(&self, position: Vec2, direction: Direction) -> bool {
        let next = self.next_cell(position, direction);
        matches!(self.cell(next.x, next.y), None | Some(Cell::Wall))
    }

    pub fn to_view(&self) -> LevelView {
        LevelView {
            name: self.definition.name.clone(),
            width: self.width(),
            height: self.height(),
            square_size: self.square_size(),
            pixel_width: self.pixel_width(),
            pixel_height: self.pixel_height(),
            teleport: self.teleport(),
            grid: self.grid.clone(),
        }
    }
}
