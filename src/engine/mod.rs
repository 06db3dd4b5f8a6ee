use std::sync::Arc;

use crate::actor::{Actor, Ghost, Pac};
use crate::catalog::LevelCatalog;
use crate::constants::{
    FIRST_LEVEL, GHOST_FRAMES_PER_MOVEMENT, MAX_POWER_MODE_TIME, PAC_FRAMES_PER_MOVEMENT,
    STARTING_LIVES,
};
use crate::error::DirectionError;
use crate::level::Level;
use crate::rng::Rng;
use crate::types::{Direction, GameEvent, Snapshot, TickOutcome};

mod collision_system;
mod pellet_system;

#[derive(Clone, Debug)]
pub struct GameOptions {
    /// `None` seeds ghost wandering from OS entropy.
    pub seed: Option<u32>,
    pub max_power_mode_time: u32,
    pub pac_frames_per_movement: u32,
    pub ghost_frames_per_movement: u32,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            seed: None,
            max_power_mode_time: MAX_POWER_MODE_TIME,
            pac_frames_per_movement: PAC_FRAMES_PER_MOVEMENT,
            ghost_frames_per_movement: GHOST_FRAMES_PER_MOVEMENT,
        }
    }
}

/// Everything one game session mutates. The level, Pac and ghosts always
/// belong to the same level generation and are replaced together.
#[derive(Clone, Debug)]
pub struct GameState {
    pub score: u32,
    pub lives: i32,
    pub level_number: u32,
    pub level: Level,
    pub pac: Pac,
    pub ghosts: Vec<Ghost>,
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    pub options: GameOptions,

    catalog: Arc<LevelCatalog>,
    state: GameState,
    rng: Rng,
    events: Vec<GameEvent>,
    tick_counter: u64,
}

impl GameEngine {
    pub fn new(catalog: Arc<LevelCatalog>, options: GameOptions) -> Self {
        let rng = options.seed.map(Rng::new).unwrap_or_else(Rng::from_entropy);
        let (level, pac, ghosts) = spawn_generation(&catalog, &options, FIRST_LEVEL);
        let mut engine = Self {
            options,
            catalog,
            state: GameState {
                score: 0,
                lives: STARTING_LIVES,
                level_number: FIRST_LEVEL,
                level,
                pac,
                ghosts,
            },
            rng,
            events: Vec::new(),
            tick_counter: 0,
        };
        engine.push_level_started();
        engine
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// The only way input reaches the game: latches Pac's intent.
    pub fn set_intent(&mut self, direction: Direction) -> Result<(), DirectionError> {
        self.state.pac.set_intent(direction)
    }

    /// One fixed-rate tick: Pac moves, then every ghost, then pellets are eaten,
    /// then collisions are resolved. The order is load-bearing.
    pub fn step(&mut self) -> TickOutcome {
        self.tick_counter += 1;

        self.state.pac.advance(&self.state.level);
        for ghost in &mut self.state.ghosts {
            ghost.advance_with(&self.state.level, &mut self.rng);
        }

        if let Some(outcome) = self.process_pellets() {
            return outcome;
        }
        self.resolve_collisions()
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            score: self.state.score,
            lives: self.state.lives,
            level_number: self.state.level_number,
            level: self.state.level.to_view(),
            pac: self.state.pac.to_view(),
            ghosts: self.state.ghosts.iter().map(|ghost| ghost.to_view()).collect(),
            remaining_pellets: self.state.level.remaining_pellets(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    /// Replaces level, Pac and ghosts with a fresh generation for the current level number.
    fn start_new_level(&mut self) {
        let (level, pac, ghosts) =
            spawn_generation(&self.catalog, &self.options, self.state.level_number);
        self.state.level = level;
        self.state.pac = pac;
        self.state.ghosts = ghosts;
        self.push_level_started();
    }

    fn push_level_started(&mut self) {
        self.events.push(GameEvent::LevelStarted {
            level_number: self.state.level_number,
            name: self.state.level.name().to_string(),
        });
    }
}

fn spawn_generation(
    catalog: &LevelCatalog,
    options: &GameOptions,
    level_number: u32,
) -> (Level, Pac, Vec<Ghost>) {
    let level = Level::new(catalog.select(level_number));
    let pac = Pac::new(
        level.starting_pac(),
        options.pac_frames_per_movement,
        options.max_power_mode_time,
    );
    let ghosts = level
        .starting_ghosts()
        .iter()
        .enumerate()
        .map(|(id, spawn)| Ghost::new(id, *spawn, options.ghost_frames_per_movement))
        .collect();
    (level, pac, ghosts)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::actor::Actor;
    use crate::catalog::LevelCatalog;
    use crate::engine::{GameEngine, GameOptions};
    use crate::error::DirectionError;
    use crate::level::tests::definition;
    use crate::level::LevelDefinition;
    use crate::types::{Cell, Direction, GameEvent, TickOutcome, Vec2};

    const MAX_POWER: u32 = 5;

    fn options() -> GameOptions {
        GameOptions {
            seed: Some(1),
            max_power_mode_time: MAX_POWER,
            pac_frames_per_movement: 1,
            ghost_frames_per_movement: 1,
        }
    }

    fn engine_with(levels: Vec<LevelDefinition>) -> GameEngine {
        let catalog = LevelCatalog::new(levels).expect("test levels are valid");
        GameEngine::new(Arc::new(catalog), options())
    }

    fn named(mut level: LevelDefinition, name: &str) -> LevelDefinition {
        level.name = name.to_string();
        level
    }

    /// Classic maze: Pac spawns at (2,1), ghosts at (0,0) and (5,0).
    fn classic() -> LevelDefinition {
        definition(
            &[
                "22222221", "21212221", "22122221", "22222221", "22222221", "12222221",
            ],
            (2, 1),
            &[(0, 0), (5, 0)],
        )
    }

    /// One-wide corridor: the ghost below Pac can only move up onto Pac.
    fn corridor() -> LevelDefinition {
        definition(&["0", "0", "1", "2"], (0, 0), &[(0, 1)])
    }

    #[test]
    fn ghost_stepping_onto_pac_costs_a_life() {
        let mut engine = engine_with(vec![corridor()]);
        let outcome = engine.step();

        assert_eq!(outcome, TickOutcome::LifeLost { lives_left: 2 });
        assert_eq!(engine.state().lives, 2);
        assert_eq!(engine.state().pac.position(), Vec2 { x: 0, y: 0 });
        assert_eq!(engine.state().ghosts[0].position(), Vec2 { x: 0, y: 1 });
        assert_eq!(engine.state().ghosts[0].direction(), Direction::Stopped);
    }

    #[test]
    fn life_loss_resets_actors_but_keeps_the_grid() {
        let mut engine = engine_with(vec![classic()]);
        engine.state.level.consume(3, 0);
        engine.state.level.consume(4, 0);
        let grid_before = engine.state.level.grid().to_vec();

        engine.state.pac.set_intent(Direction::Down).expect("intent");
        engine.state.pac.state_mut().x = 4;
        engine.state.pac.state_mut().y = 3;
        engine.state.ghosts[0].state_mut().x = 4;
        engine.state.ghosts[0].state_mut().y = 3;
        engine.state.ghosts[1].state_mut().x = 6;
        engine.state.ghosts[1].state_mut().y = 5;

        let outcome = engine.resolve_collisions();

        assert_eq!(outcome, TickOutcome::LifeLost { lives_left: 2 });
        assert_eq!(engine.state().lives, 2);
        assert_eq!(engine.state().pac.position(), Vec2 { x: 2, y: 1 });
        assert_eq!(engine.state().pac.intent(), None);
        assert_eq!(engine.state().ghosts[0].position(), Vec2 { x: 0, y: 0 });
        assert_eq!(engine.state().ghosts[1].position(), Vec2 { x: 5, y: 0 });
        assert_eq!(engine.state().level.grid(), grid_before.as_slice());
        assert_eq!(engine.state().level_number, 1);
    }

    #[test]
    fn powered_pac_sends_colliding_ghosts_into_retreat() {
        let mut engine = engine_with(vec![classic()]);
        engine.state.pac.power_mode_time = 3;
        engine.state.ghosts[0].state_mut().x = 2;
        engine.state.ghosts[0].state_mut().y = 1;

        let outcome = engine.resolve_collisions();

        assert_eq!(outcome, TickOutcome::GhostsCaptured { count: 1 });
        assert_eq!(engine.state().lives, 3);
        assert!(engine.state().ghosts[0].is_retreating());
        assert!(!engine.state().ghosts[1].is_retreating());
        assert_eq!(engine.state().pac.position(), Vec2 { x: 2, y: 1 });
        assert_eq!(engine.state().ghosts[0].position(), Vec2 { x: 2, y: 1 });

        let snapshot = engine.build_snapshot(true);
        assert!(snapshot
            .events
            .contains(&GameEvent::GhostCaptured { ghost_id: 0 }));
    }

    #[test]
    fn eating_the_last_pellet_advances_the_level_and_keeps_score() {
        let first = named(
            definition(&["02", "11", "00"], (0, 0), &[(0, 2)]),
            "first",
        );
        let second = named(
            definition(&["0220", "1111", "0000"], (0, 0), &[(3, 2)]),
            "second",
        );
        let mut engine = engine_with(vec![first, second]);
        engine.set_intent(Direction::Right).expect("intent");

        let outcome = engine.step();

        assert_eq!(outcome, TickOutcome::LevelAdvanced { level_number: 2 });
        assert_eq!(engine.state().level_number, 2);
        assert_eq!(engine.state().score, 1);
        assert_eq!(engine.state().level.name(), "second");
        assert_eq!(engine.state().level.remaining_pellets(), 2);
        assert_eq!(engine.state().pac.position(), Vec2 { x: 0, y: 0 });
        assert_eq!(engine.state().pac.intent(), None);
        assert_eq!(engine.state().ghosts.len(), 1);
        assert_eq!(engine.state().ghosts[0].position(), Vec2 { x: 3, y: 2 });

        engine.set_intent(Direction::Right).expect("intent");
        engine.step();
        assert_eq!(engine.state().score, 2);
    }

    #[test]
    fn level_numbers_cycle_through_the_catalog() {
        let only = named(definition(&["02", "11", "00"], (0, 0), &[(0, 2)]), "only");
        let mut engine = engine_with(vec![only]);
        engine.set_intent(Direction::Right).expect("intent");
        engine.step();
        assert_eq!(engine.state().level_number, 2);
        assert_eq!(engine.state().level.name(), "only");
        assert_eq!(engine.state().level.remaining_pellets(), 1);
    }

    #[test]
    fn level_advance_skips_collisions_that_tick() {
        // The ghost's only open move is onto the last pellet, where Pac arrives too.
        let first = definition(&["020", "101"], (0, 0), &[(1, 1)]);
        let second = definition(&["020", "111", "000"], (0, 0), &[(2, 2)]);
        let mut engine = engine_with(vec![first, second]);
        engine.set_intent(Direction::Right).expect("intent");

        let outcome = engine.step();
        assert_eq!(outcome, TickOutcome::LevelAdvanced { level_number: 2 });
        assert_eq!(engine.state().lives, 3);
    }

    #[test]
    fn running_out_of_lives_restarts_the_game() {
        let first = named(definition(&["02", "11", "00"], (0, 0), &[(0, 2)]), "first");
        let mut engine = engine_with(vec![first, named(classic(), "classic")]);
        engine.state.level_number = 2;
        engine.start_new_level();
        engine.state.score = 17;
        engine.state.lives = 1;
        engine.state.level.consume(0, 0);
        engine.state.ghosts[0].state_mut().x = 2;
        engine.state.ghosts[0].state_mut().y = 1;

        let outcome = engine.resolve_collisions();

        assert_eq!(outcome, TickOutcome::GameOver { final_score: 17 });
        assert_eq!(engine.state().score, 0);
        assert_eq!(engine.state().lives, 3);
        assert_eq!(engine.state().level_number, 1);
        assert_eq!(engine.state().level.name(), "first");
        assert_eq!(engine.state().level.remaining_pellets(), 1);
        assert_eq!(engine.state().pac.position(), Vec2 { x: 0, y: 0 });

        let snapshot = engine.build_snapshot(true);
        assert!(snapshot.events.contains(&GameEvent::GameOver {
            final_score: 17,
            level_number: 2,
        }));
    }

    #[test]
    fn revisiting_an_eaten_cell_scores_nothing() {
        let level = definition(&["0220", "1111", "0000"], (0, 0), &[(3, 2)]);
        let mut engine = engine_with(vec![level]);
        engine.set_intent(Direction::Right).expect("intent");
        engine.step();
        assert_eq!(engine.state().score, 1);
        assert_eq!(engine.state().level.cell(1, 0), Some(Cell::Empty));

        engine.set_intent(Direction::Left).expect("intent");
        engine.step();
        engine.set_intent(Direction::Right).expect("intent");
        engine.step();
        assert_eq!(engine.state().pac.position(), Vec2 { x: 1, y: 0 });
        assert_eq!(engine.state().score, 1);
    }

    #[test]
    fn power_pellet_sets_full_timer_then_decays_once_per_tick() {
        let level = definition(&["03300", "11111", "00000"], (0, 0), &[(4, 2)]);
        let mut engine = engine_with(vec![level]);
        engine.set_intent(Direction::Right).expect("intent");

        engine.step();
        assert_eq!(engine.state().pac.power_mode_time(), MAX_POWER);
        engine.step();
        assert_eq!(engine.state().pac.power_mode_time(), MAX_POWER);

        let mut previous = MAX_POWER;
        for _ in 0..(MAX_POWER + 3) {
            engine.step();
            let current = engine.state().pac.power_mode_time();
            assert!(current == previous.saturating_sub(1));
            previous = current;
        }
        assert_eq!(engine.state().pac.power_mode_time(), 0);
        assert_eq!(engine.state().score, 0);
    }

    #[test]
    fn power_timer_still_decays_on_a_pellet_tick() {
        let level = definition(&["0220", "1111", "0000"], (0, 0), &[(0, 2)]);
        let mut engine = engine_with(vec![level]);
        engine.state.pac.power_mode_time = 3;
        engine.set_intent(Direction::Right).expect("intent");

        assert_eq!(engine.step(), TickOutcome::Continued);
        assert_eq!(engine.state().pac.position(), Vec2 { x: 1, y: 0 });
        assert_eq!(engine.state().score, 1);
        assert_eq!(engine.state().pac.power_mode_time(), 2);
    }

    #[test]
    fn power_pellets_left_behind_do_not_block_level_completion() {
        let first = named(definition(&["023", "111", "000"], (0, 0), &[(0, 2)]), "first");
        let second = named(definition(&["02", "11", "00"], (0, 0), &[(1, 2)]), "second");
        let mut engine = engine_with(vec![first, second]);
        engine.set_intent(Direction::Right).expect("intent");
        let outcome = engine.step();
        assert_eq!(outcome, TickOutcome::LevelAdvanced { level_number: 2 });
        assert_eq!(engine.state().level.name(), "second");
    }

    #[test]
    fn teleport_level_wraps_pac_across_the_edge() {
        let mut level = definition(&["0022", "1111", "0000", "1111"], (0, 0), &[(3, 2)]);
        level.teleport = true;
        let mut engine = engine_with(vec![level]);
        engine.set_intent(Direction::Left).expect("intent");

        let outcome = engine.step();
        assert_eq!(outcome, TickOutcome::Continued);
        assert_eq!(engine.state().pac.position(), Vec2 { x: 3, y: 0 });
        assert_eq!(engine.state().score, 1);
    }

    #[test]
    fn stopped_intent_is_rejected_at_the_input_boundary() {
        let mut engine = engine_with(vec![classic()]);
        assert_eq!(
            engine.set_intent(Direction::Stopped),
            Err(DirectionError::NotAnIntent)
        );
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let catalog = Arc::new(LevelCatalog::builtin());
        let mut a = GameEngine::new(catalog.clone(), GameOptions { seed: Some(4242), ..options() });
        let mut b = GameEngine::new(catalog, GameOptions { seed: Some(4242), ..options() });

        for tick in 0..400u32 {
            let dir = Direction::CARDINALS[(tick / 7) as usize % 4];
            a.set_intent(dir).expect("intent");
            b.set_intent(dir).expect("intent");
            assert_eq!(a.step(), b.step());

            let sa = a.build_snapshot(false);
            let sb = b.build_snapshot(false);
            assert_eq!(sa.score, sb.score);
            assert_eq!(sa.lives, sb.lives);
            assert_eq!((sa.pac.x, sa.pac.y), (sb.pac.x, sb.pac.y));
            for (ga, gb) in sa.ghosts.iter().zip(sb.ghosts.iter()) {
                assert_eq!((ga.x, ga.y), (gb.x, gb.y));
            }
        }
    }

    #[test]
    fn invariants_hold_over_a_long_run() {
        let mut engine = GameEngine::new(
            Arc::new(LevelCatalog::builtin()),
            GameOptions {
                seed: Some(77),
                ..GameOptions::default()
            },
        );
        for tick in 0..5_000u32 {
            if tick % 45 == 0 {
                let dir = Direction::CARDINALS[(tick / 45) as usize % 4];
                engine.set_intent(dir).expect("intent");
            }
            engine.step();
            let state = engine.state();
            assert!(state.lives > 0 && state.lives <= 3);
            assert!(state.pac.power_mode_time() <= state.pac.max_power_mode_time());
            let level = &state.level;
            assert!(level.cell(state.pac.x(), state.pac.y()).is_some());
            assert_ne!(level.cell(state.pac.x(), state.pac.y()), Some(Cell::Wall));
            for ghost in &state.ghosts {
                assert_ne!(level.cell(ghost.x(), ghost.y()), Some(Cell::Wall));
                assert!(level.cell(ghost.x(), ghost.y()).is_some());
            }
        }
        assert_eq!(engine.tick_count(), 5_000);
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = engine_with(vec![classic()]);
        let first = engine.build_snapshot(true);
        let second = engine.build_snapshot(true);
        assert_eq!(
            first.events,
            vec![GameEvent::LevelStarted {
                level_number: 1,
                name: "test".to_string(),
            }]
        );
        assert!(second.events.is_empty());
        assert_eq!(first.level.pixel_width, 80);
        assert_eq!(first.remaining_pellets, 38);
    }
}
