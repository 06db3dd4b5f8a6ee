use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SQUARE_SIZE;
use crate::error::LevelError;
use crate::level::LevelDefinition;
use crate::types::Cell::{self, Empty as E, Pellet as P, PowerPellet as B, Wall as W};
use crate::types::Vec2;

const TELEPORT_LAYOUT: &[&[Cell]] = &[
    &[W, W, W, W, W, P, W, W, W, W, W],
    &[W, B, P, P, P, P, P, P, P, B, W],
    &[W, P, W, W, P, W, P, W, W, P, W],
    &[P, P, P, P, P, E, P, P, P, P, P],
    &[W, P, W, W, P, W, P, W, W, P, W],
    &[W, B, P, P, P, P, P, P, P, B, W],
    &[W, W, W, W, W, P, W, W, W, W, W],
];

const CLASSIC_LAYOUT: &[&[Cell]] = &[
    &[P, P, P, P, P, P, P, W],
    &[P, W, P, W, P, P, P, W],
    &[P, P, W, P, P, P, P, W],
    &[P, P, P, P, P, P, P, W],
    &[P, P, P, P, P, P, P, W],
    &[W, P, P, P, P, P, P, W],
];

const CROSSROADS_LAYOUT: &[&[Cell]] = &[
    &[P, P, P, P, P, P, P, P, P],
    &[P, W, W, P, W, P, W, W, P],
    &[P, W, B, P, P, P, B, W, P],
    &[P, P, P, W, E, W, P, P, P],
    &[P, W, P, P, P, P, P, W, P],
    &[P, P, P, W, W, W, P, P, P],
];

#[derive(Clone, Debug, Serialize, Deserialize)]
struct CatalogFile {
    levels: Vec<LevelDefinition>,
}

/// The fixed, ordered list of levels. Level numbers cycle through it.
#[derive(Clone, Debug)]
pub struct LevelCatalog {
    levels: Vec<Arc<LevelDefinition>>,
}

impl LevelCatalog {
    pub fn new(levels: Vec<LevelDefinition>) -> Result<Self, LevelError> {
        if levels.is_empty() {
            return Err(LevelError::EmptyCatalog);
        }
        for level in &levels {
            level.validate()?;
        }
        Ok(Self {
            levels: levels.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn builtin() -> Self {
        Self::new(builtin_definitions()).expect("built-in levels should be valid")
    }

    pub fn from_json(raw: &str) -> Result<Self, LevelError> {
        let file: CatalogFile =
            serde_json::from_str(raw).map_err(|error| LevelError::Parse(error.to_string()))?;
        Self::new(file.levels)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "levels": self.levels.iter().map(|level| level.as_ref()).collect::<Vec<_>>(),
        })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Picks the definition for a 1-based level number, wrapping past the end of the list.
    pub fn select(&self, level_number: u32) -> Arc<LevelDefinition> {
        let index = level_number.saturating_sub(1) as usize % self.levels.len();
        self.levels[index].clone()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &LevelDefinition> {
        self.levels.iter().map(|level| level.as_ref())
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn to_layout(rows: &[&[Cell]]) -> Vec<Vec<Cell>> {
    rows.iter().map(|row| row.to_vec()).collect()
}

pub fn builtin_definitions() -> Vec<LevelDefinition> {
    vec![
        LevelDefinition {
            name: "teleport".to_string(),
            layout: to_layout(TELEPORT_LAYOUT),
            starting_pac: Vec2 { x: 5, y: 3 },
            starting_ghosts: vec![Vec2 { x: 4, y: 1 }, Vec2 { x: 6, y: 5 }],
            teleport: true,
            square_size: DEFAULT_SQUARE_SIZE,
        },
        LevelDefinition {
            name: "classic".to_string(),
            layout: to_layout(CLASSIC_LAYOUT),
            starting_pac: Vec2 { x: 2, y: 1 },
            starting_ghosts: vec![Vec2 { x: 0, y: 0 }, Vec2 { x: 5, y: 0 }],
            teleport: false,
            square_size: DEFAULT_SQUARE_SIZE,
        },
        LevelDefinition {
            name: "crossroads".to_string(),
            layout: to_layout(CROSSROADS_LAYOUT),
            starting_pac: Vec2 { x: 4, y: 3 },
            starting_ghosts: vec![Vec2 { x: 0, y: 0 }, Vec2 { x: 8, y: 0 }, Vec2 { x: 0, y: 5 }],
            teleport: false,
            square_size: DEFAULT_SQUARE_SIZE,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_levels_validate() {
        for level in builtin_definitions() {
            assert!(level.validate().is_ok(), "level {} is invalid", level.name);
        }
        assert_eq!(LevelCatalog::builtin().len(), 3);
    }

    #[test]
    fn selection_cycles_through_the_list() {
        let catalog = LevelCatalog::builtin();
        assert_eq!(catalog.select(1).name, "teleport");
        assert_eq!(catalog.select(2).name, "classic");
        assert_eq!(catalog.select(3).name, "crossroads");
        assert_eq!(catalog.select(4).name, "teleport");
        assert_eq!(catalog.select(3_000_000_002).name, "classic");
        assert_eq!(catalog.select(u32::MAX).name, "crossroads");
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert_eq!(LevelCatalog::new(Vec::new()).err(), Some(LevelError::EmptyCatalog));
    }

    #[test]
    fn catalog_loads_from_json() {
        let raw = r#"{
            "levels": [{
                "name": "tiny",
                "layout": [[2, 0, 2], [1, 3, 1]],
                "startingPac": {"x": 1, "y": 0},
                "startingGhosts": [{"x": 1, "y": 1}],
                "teleport": true
            }]
        }"#;
        let catalog = LevelCatalog::from_json(raw).expect("catalog should parse");
        let level = catalog.select(1);
        assert_eq!(level.name, "tiny");
        assert_eq!(level.square_size, DEFAULT_SQUARE_SIZE);
        assert_eq!(level.layout[1][1], Cell::PowerPellet);
        assert!(level.teleport);
    }

    #[test]
    fn catalog_json_with_bad_cells_or_shape_fails_fast() {
        let bad_cell = r#"{"levels": [{"name": "x", "layout": [[7]],
            "startingPac": {"x": 0, "y": 0}, "startingGhosts": [{"x": 0, "y": 0}]}]}"#;
        assert!(matches!(
            LevelCatalog::from_json(bad_cell),
            Err(LevelError::Parse(_))
        ));

        let ragged = r#"{"levels": [{"name": "x", "layout": [[0, 0], [0]],
            "startingPac": {"x": 0, "y": 0}, "startingGhosts": [{"x": 1, "y": 0}]}]}"#;
        assert!(matches!(
            LevelCatalog::from_json(ragged),
            Err(LevelError::NonRectangular { .. })
        ));
    }

    #[test]
    fn catalog_json_round_trips_builtin_levels() {
        let catalog = LevelCatalog::builtin();
        let raw = catalog.to_json().to_string();
        let reloaded = LevelCatalog::from_json(&raw).expect("exported catalog should reload");
        assert_eq!(reloaded.len(), catalog.len());
        assert_eq!(reloaded.select(1).layout, catalog.select(1).layout);
    }
}
