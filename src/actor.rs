//! Grid actors. `Pac` and `Ghost` share position, heading, intent and
//! frame pacing through `ActorState` and the `Actor` trait.

use std::collections::{HashSet, VecDeque};

use crate::constants::GHOST_KEEP_HEADING_CHANCE;
use crate::error::DirectionError;
use crate::level::Level;
use crate::rng::Rng;
use crate::types::{Axis, Direction, GhostView, PacView, Vec2};

#[derive(Clone, Debug)]
pub struct ActorState {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) spawn: Vec2,
    pub(crate) direction: Direction,
    pub(crate) intent: Option<Direction>,
    pub(crate) frame_cycle: u32,
    pub(crate) frames_per_movement: u32,
}

impl ActorState {
    pub fn new(spawn: Vec2, frames_per_movement: u32) -> Self {
        Self {
            x: spawn.x,
            y: spawn.y,
            spawn,
            direction: Direction::Stopped,
            intent: None,
            frame_cycle: 0,
            frames_per_movement: frames_per_movement.max(1),
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2 {
            x: self.x,
            y: self.y,
        }
    }

    fn reset(&mut self) {
        self.x = self.spawn.x;
        self.y = self.spawn.y;
        self.direction = Direction::Stopped;
        self.intent = None;
        self.frame_cycle = 0;
    }
}

pub trait Actor {
    fn state(&self) -> &ActorState;
    fn state_mut(&mut self) -> &mut ActorState;

    fn x(&self) -> i32 {
        self.state().x
    }

    fn y(&self) -> i32 {
        self.state().y
    }

    fn position(&self) -> Vec2 {
        self.state().position()
    }

    fn spawn(&self) -> Vec2 {
        self.state().spawn
    }

    fn direction(&self) -> Direction {
        self.state().direction
    }

    fn intent(&self) -> Option<Direction> {
        self.state().intent
    }

    fn frame_cycle(&self) -> u32 {
        self.state().frame_cycle
    }

    fn frames_per_movement(&self) -> u32 {
        self.state().frames_per_movement
    }

    /// Latches a requested heading. It is retried every step until the way opens.
    fn set_intent(&mut self, direction: Direction) -> Result<(), DirectionError> {
        if direction == Direction::Stopped {
            return Err(DirectionError::NotAnIntent);
        }
        self.state_mut().intent = Some(direction);
        Ok(())
    }

    /// Advances the frame cycle and reports whether a movement step is due this tick.
    /// A stopped actor is always due so a buffered intent is retried immediately.
    fn tick_frame(&mut self) -> bool {
        let state = self.state_mut();
        if state.direction != Direction::Stopped
            && state.frame_cycle + 1 < state.frames_per_movement
        {
            state.frame_cycle += 1;
            return false;
        }
        state.frame_cycle = 0;
        true
    }

    /// Resolves the intent against the level. On success the actor commits to the
    /// intent and lands on the next cell; otherwise it stops where it is.
    fn step(&mut self, level: &Level) -> bool {
        let state = self.state_mut();
        let Some(intent) = state.intent else {
            state.direction = Direction::Stopped;
            return false;
        };
        let position = state.position();
        if level.is_path_blocked(position, intent) {
            state.direction = Direction::Stopped;
            return false;
        }
        let next = level.next_cell(position, intent);
        state.direction = intent;
        state.x = next.x;
        state.y = next.y;
        true
    }

    fn advance(&mut self, level: &Level) -> bool {
        if !self.tick_frame() {
            return false;
        }
        self.step(level)
    }

    /// Sub-cell rendering offset along `axis`, in cells. It points back at the
    /// cell just left and reaches zero on the last frame before the next step,
    /// so the drawn position never runs ahead of the logical cell.
    fn offset_for(&self, axis: Axis) -> f32 {
        let state = self.state();
        let travelled = (state.frame_cycle + 1) as f32 / state.frames_per_movement as f32;
        (-state.direction.delta_on(axis)) as f32 * (1.0 - travelled)
    }

    fn restart(&mut self);
}

#[derive(Clone, Debug)]
pub struct Pac {
    state: ActorState,
    pub(crate) power_mode_time: u32,
    max_power_mode_time: u32,
}

impl Pac {
    pub fn new(spawn: Vec2, frames_per_movement: u32, max_power_mode_time: u32) -> Self {
        Self {
            state: ActorState::new(spawn, frames_per_movement),
            power_mode_time: 0,
            max_power_mode_time,
        }
    }

    pub fn power_mode_time(&self) -> u32 {
        self.power_mode_time
    }

    pub fn max_power_mode_time(&self) -> u32 {
        self.max_power_mode_time
    }

    pub fn is_powered(&self) -> bool {
        self.power_mode_time > 0
    }

    /// Refills the timer. A second power pellet resets it, it does not stack.
    pub fn activate_power_mode(&mut self) {
        self.power_mode_time = self.max_power_mode_time;
    }

    pub fn decay_power_mode(&mut self) {
        self.power_mode_time = self.power_mode_time.saturating_sub(1);
    }

    pub fn to_view(&self) -> PacView {
        PacView {
            x: self.state.x,
            y: self.state.y,
            dir: self.state.direction,
            intent: self.state.intent,
            offset_x: self.offset_for(Axis::X),
            offset_y: self.offset_for(Axis::Y),
            power_mode_time: self.power_mode_time,
            powered: self.is_powered(),
        }
    }
}

impl Actor for Pac {
    fn state(&self) -> &ActorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ActorState {
        &mut self.state
    }

    fn restart(&mut self) {
        self.state.reset();
    }
}

#[derive(Clone, Debug)]
pub struct Ghost {
    id: usize,
    state: ActorState,
    pub(crate) retreating: bool,
}

impl Ghost {
    pub fn new(id: usize, spawn: Vec2, frames_per_movement: u32) -> Self {
        Self {
            id,
            state: ActorState::new(spawn, frames_per_movement),
            retreating: false,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_retreating(&self) -> bool {
        self.retreating
    }

    /// Sends the ghost home. It keeps moving and stays in play.
    pub fn retreat(&mut self) {
        self.retreating = true;
    }

    /// Per-tick movement: picks an intent when a step is due, then steps.
    /// A retreating ghost heads for its spawn and resumes wandering on arrival.
    pub fn advance_with(&mut self, level: &Level, rng: &mut Rng) -> bool {
        if !self.tick_frame() {
            return false;
        }
        let homeward = if self.retreating {
            self.retreat_direction(level)
        } else {
            None
        };
        if homeward.is_none() {
            // Home reached or walled off.
            self.retreating = false;
        }
        self.state.intent = match homeward {
            Some(direction) => Some(direction),
            None => self.wander_direction(level, rng),
        };
        let moved = self.step(level);
        if self.retreating && self.state.position() == self.state.spawn {
            self.retreating = false;
        }
        moved
    }

    /// First move of a shortest walkable route to spawn, wrapping through
    /// teleport edges. `None` when already home or when no route exists.
    fn retreat_direction(&self, level: &Level) -> Option<Direction> {
        let start = self.state.position();
        let home = self.state.spawn;
        if start == home {
            return None;
        }

        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(start);
        queue.push_back((start, None));

        while let Some((cell, first)) = queue.pop_front() {
            for direction in Direction::CARDINALS {
                if level.is_path_blocked(cell, direction) {
                    continue;
                }
                let next = level.next_cell(cell, direction);
                if !seen.insert(next) {
                    continue;
                }
                let first = first.or(Some(direction));
                if next == home {
                    return first;
                }
                queue.push_back((next, first));
            }
        }
        None
    }

    fn wander_direction(&self, level: &Level, rng: &mut Rng) -> Option<Direction> {
        let position = self.state.position();
        let open: Vec<Direction> = Direction::CARDINALS
            .into_iter()
            .filter(|&dir| !level.is_path_blocked(position, dir))
            .collect();
        let heading = self.state.direction;
        if heading != Direction::Stopped
            && open.contains(&heading)
            && rng.bool(GHOST_KEEP_HEADING_CHANCE)
        {
            return Some(heading);
        }
        let forward: Vec<Direction> = open
            .iter()
            .copied()
            .filter(|&dir| dir != heading.opposite())
            .collect();
        if forward.is_empty() {
            rng.pick(&open)
        } else {
            rng.pick(&forward)
        }
    }

    pub fn to_view(&self) -> GhostView {
        GhostView {
            id: self.id,
            x: self.state.x,
            y: self.state.y,
            dir: self.state.direction,
            offset_x: self.offset_for(Axis::X),
            offset_y: self.offset_for(Axis::Y),
            retreating: self.retreating,
        }
    }
}

impl Actor for Ghost {
    fn state(&self) -> &ActorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ActorState {
        &mut self.state
    }

    fn restart(&mut self) {
        self.state.reset();
        self.retreating = false;
    }
}
