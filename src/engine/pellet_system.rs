use crate::actor::Actor;
use crate::types::{Cell, GameEvent, TickOutcome};

use super::GameEngine;

impl GameEngine {
    /// Eats whatever lies under Pac. Power mode decays first, so a power pellet
    /// picked up this tick leaves the timer at its full value.
    ///
    /// Returns `Some` when the last pellet was eaten and a new level replaced the
    /// old one; the rest of the tick is skipped in that case.
    pub(super) fn process_pellets(&mut self) -> Option<TickOutcome> {
        self.state.pac.decay_power_mode();

        let position = self.state.pac.position();
        match self.state.level.consume(position.x, position.y) {
            Some(Cell::Pellet) => {
                self.state.score = self.state.score.saturating_add(1);
                self.events.push(GameEvent::PelletEaten {
                    x: position.x,
                    y: position.y,
                });
                if self.state.level.is_complete() {
                    self.events.push(GameEvent::LevelCompleted {
                        level_number: self.state.level_number,
                    });
                    self.state.level_number = self.state.level_number.saturating_add(1);
                    self.start_new_level();
                    return Some(TickOutcome::LevelAdvanced {
                        level_number: self.state.level_number,
                    });
                }
            }
            Some(Cell::PowerPellet) => {
                self.state.pac.activate_power_mode();
                self.events.push(GameEvent::PowerPelletEaten {
                    x: position.x,
                    y: position.y,
                });
            }
            _ => {}
        }
        None
    }
}
