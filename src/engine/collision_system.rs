use crate::actor::Actor;
use crate::constants::{FIRST_LEVEL, STARTING_LIVES};
use crate::types::{GameEvent, TickOutcome};

use super::GameEngine;

impl GameEngine {
    /// Indices of ghosts standing on Pac's cell.
    pub(super) fn detect_ghost_collisions(&self) -> Vec<usize> {
        let pac = self.state.pac.position();
        self.state
            .ghosts
            .iter()
            .enumerate()
            .filter(|(_, ghost)| ghost.position() == pac)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub(super) fn resolve_collisions(&mut self) -> TickOutcome {
        let colliding = self.detect_ghost_collisions();
        if colliding.is_empty() {
            return TickOutcome::Continued;
        }

        if self.state.pac.is_powered() {
            for &idx in &colliding {
                let ghost = &mut self.state.ghosts[idx];
                if !ghost.is_retreating() {
                    self.events.push(GameEvent::GhostCaptured {
                        ghost_id: ghost.id(),
                    });
                }
                ghost.retreat();
            }
            return TickOutcome::GhostsCaptured {
                count: colliding.len(),
            };
        }

        self.lose_life()
    }

    /// Costs a life. With lives left the actors go back to their spawns on the
    /// current grid; otherwise the whole game starts over from the first level.
    pub(super) fn lose_life(&mut self) -> TickOutcome {
        self.state.lives -= 1;

        if self.state.lives <= 0 {
            let final_score = self.state.score;
            self.events.push(GameEvent::GameOver {
                final_score,
                level_number: self.state.level_number,
            });
            self.state.score = 0;
            self.state.lives = STARTING_LIVES;
            self.state.level_number = FIRST_LEVEL;
            self.start_new_level();
            return TickOutcome::GameOver { final_score };
        }

        self.events.push(GameEvent::LifeLost {
            lives_left: self.state.lives,
        });
        self.restart_actors();
        TickOutcome::LifeLost {
            lives_left: self.state.lives,
        }
    }

    fn restart_actors(&mut self) {
        self.state.pac.restart();
        for ghost in &mut self.state.ghosts {
            ghost.restart();
        }
    }
}
