use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

/// A fixed-rate loop over shared state. Each tick runs to completion under the
/// lock before the next one is scheduled. Dropping the handle also stops the loop.
pub struct Ticker {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<u64>,
}

impl Ticker {
    pub fn spawn<S, F>(state: Arc<Mutex<S>>, period: Duration, mut on_tick: F) -> Self
    where
        S: Send + 'static,
        F: FnMut(&mut S) -> TickControl + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut ticks = 0u64;
            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = stop_rx.changed() => break,
                }
                if *stop_rx.borrow() {
                    break;
                }
                let mut guard = state.lock().await;
                ticks += 1;
                if on_tick(&mut guard) == TickControl::Stop {
                    break;
                }
            }
            ticks
        });
        Self { stop_tx, handle }
    }

    /// Stops rescheduling. A tick already running finishes normally.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the loop to exit and returns how many ticks ran.
    pub async fn join(self) -> u64 {
        let Self { stop_tx, handle } = self;
        let ticks = handle.await.unwrap_or(0);
        drop(stop_tx);
        ticks
    }
}
