use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use pac_maze::actor::Actor;
use pac_maze::catalog::LevelCatalog;
use pac_maze::constants::{STARTING_LIVES, TICK_RATE};
use pac_maze::engine::{GameEngine, GameOptions};
use pac_maze::error::DirectionError;
use pac_maze::logging::{emit_game_events, emit_log, LogLevel};
use pac_maze::rng::Rng;
use pac_maze::types::{Cell, Direction, GameEvent, Snapshot, TickOutcome};
use serde::Serialize;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(author, version, about = "Runs the maze engine headless and checks its invariants")]
struct Cli {
    /// Ticks to simulate. 3600 is one minute of play.
    #[arg(long, default_value_t = 3600)]
    ticks: u64,
    #[arg(long)]
    seed: Option<u32>,
    /// JSON level catalog; the built-in levels are used when absent.
    #[arg(long)]
    levels: Option<PathBuf>,
    /// Comma separated intents, e.g. "right,down,left". Without it Pac wanders on its own.
    #[arg(long)]
    script: Option<String>,
    /// Ticks each scripted or wandering intent is held before the next one.
    #[arg(long, default_value_t = 30)]
    hold: u64,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    /// Emit every game event as a log line, not just the notable ones.
    #[arg(long)]
    verbose: bool,
}

#[derive(Clone, Debug, Default, Serialize)]
struct EventCounts {
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "powerPelletsEaten")]
    power_pellets_eaten: u32,
    #[serde(rename = "levelsCompleted")]
    levels_completed: u32,
    #[serde(rename = "ghostsCaptured")]
    ghosts_captured: u32,
    #[serde(rename = "livesLost")]
    lives_lost: u32,
    #[serde(rename = "gameOvers")]
    game_overs: u32,
}

impl EventCounts {
    fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::PelletEaten { .. } => self.pellets_eaten += 1,
            GameEvent::PowerPelletEaten { .. } => self.power_pellets_eaten += 1,
            GameEvent::LevelCompleted { .. } => self.levels_completed += 1,
            GameEvent::GhostCaptured { .. } => self.ghosts_captured += 1,
            GameEvent::LifeLost { .. } => self.lives_lost += 1,
            GameEvent::GameOver { .. } => self.game_overs += 1,
            GameEvent::LevelStarted { .. } => {}
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    seed: u32,
    ticks: u64,
    #[serde(rename = "finalScore")]
    final_score: u32,
    #[serde(rename = "bestScore")]
    best_score: u32,
    lives: i32,
    #[serde(rename = "levelNumber")]
    level_number: u32,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, u64>,
    events: EventCounts,
    anomalies: Vec<String>,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
}

/// Where Pac's intents come from during a run.
enum Pilot {
    Script(Vec<Direction>),
    Wander(Rng),
}

impl Pilot {
    fn intent_for(&mut self, engine: &GameEngine, tick: u64, hold: u64) -> Option<Direction> {
        let hold = hold.max(1);
        if tick % hold != 0 {
            return None;
        }
        match self {
            Pilot::Script(intents) if intents.is_empty() => None,
            Pilot::Script(intents) => {
                let index = (tick / hold) as usize % intents.len();
                Some(intents[index])
            }
            Pilot::Wander(rng) => {
                let state = engine.state();
                let position = state.pac.position();
                let open: Vec<Direction> = Direction::CARDINALS
                    .into_iter()
                    .filter(|&direction| !state.level.is_path_blocked(position, direction))
                    .collect();
                rng.pick(&open)
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed, chrono::Utc::now().timestamp_millis()));

    let catalog = match cli.levels.as_ref() {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read level catalog {}", path.display()))?;
            LevelCatalog::from_json(&raw)
                .with_context(|| format!("invalid level catalog {}", path.display()))?
        }
        None => LevelCatalog::builtin(),
    };
    let pilot = match cli.script.as_deref() {
        Some(raw) => Pilot::Script(parse_script(raw).context("invalid --script")?),
        None => Pilot::Wander(Rng::new(seed ^ 0x9e37_79b9)),
    };

    emit_log(
        LogLevel::Info,
        "run_started",
        "simulate",
        None,
        json!({
            "runId": run_id,
            "seed": seed,
            "ticks": cli.ticks,
            "levels": catalog.len(),
            "scripted": matches!(pilot, Pilot::Script(_)),
        }),
    );

    let summary = run(Arc::new(catalog), seed, &cli, pilot, run_id);

    for anomaly in &summary.anomaly_records {
        emit_log(
            LogLevel::Warn,
            "anomaly_detected",
            "simulate",
            Some(anomaly.tick),
            json!({ "message": anomaly.message }),
        );
    }

    println!("{}", serde_json::to_string(&summary)?);

    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                LogLevel::Error,
                "summary_write_failed",
                "simulate",
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
    }

    emit_log(
        LogLevel::Info,
        "run_finished",
        "simulate",
        Some(summary.ticks),
        json!({
            "runId": summary.run_id,
            "finalScore": summary.final_score,
            "bestScore": summary.best_score,
            "levelNumber": summary.level_number,
            "anomalyCount": summary.anomaly_records.len(),
            "simulatedSeconds": summary.ticks / u64::from(TICK_RATE),
        }),
    );

    if !summary.anomalies.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn run(
    catalog: Arc<LevelCatalog>,
    seed: u32,
    cli: &Cli,
    mut pilot: Pilot,
    run_id: String,
) -> RunSummary {
    let options = GameOptions {
        seed: Some(seed),
        ..GameOptions::default()
    };
    let max_power = options.max_power_mode_time;
    let mut engine = GameEngine::new(catalog, options);

    let mut outcome_counts = BTreeMap::new();
    let mut events = EventCounts::default();
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut best_score = 0;

    for tick in 0..cli.ticks {
        if let Some(intent) = pilot.intent_for(&engine, tick, cli.hold) {
            if let Err(error) = engine.set_intent(intent) {
                push_anomaly(
                    &mut anomalies,
                    &mut anomaly_records,
                    &mut anomaly_seen,
                    tick,
                    format!("intent rejected: {error}"),
                );
            }
        }

        let outcome = engine.step();
        *outcome_counts.entry(outcome_key(outcome).to_string()).or_insert(0) += 1;

        let snapshot = engine.build_snapshot(true);
        best_score = best_score.max(snapshot.score);
        for event in &snapshot.events {
            events.record(event);
        }
        if cli.verbose {
            emit_game_events("simulate", snapshot.tick, &snapshot.events);
        } else {
            let notable: Vec<GameEvent> = snapshot
                .events
                .iter()
                .filter(|event| {
                    !matches!(
                        event,
                        GameEvent::PelletEaten { .. } | GameEvent::PowerPelletEaten { .. }
                    )
                })
                .cloned()
                .collect();
            emit_game_events("simulate", snapshot.tick, &notable);
        }

        for message in collect_snapshot_anomalies(&snapshot, max_power) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
    }

    let state = engine.state();
    RunSummary {
        run_id,
        seed,
        ticks: engine.tick_count(),
        final_score: state.score,
        best_score,
        lives: state.lives,
        level_number: state.level_number,
        outcome_counts,
        events,
        anomalies,
        anomaly_records,
    }
}

fn parse_script(raw: &str) -> Result<Vec<Direction>, DirectionError> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Direction::parse_intent)
        .collect()
}

fn outcome_key(outcome: TickOutcome) -> &'static str {
    match outcome {
        TickOutcome::Continued => "continued",
        TickOutcome::LevelAdvanced { .. } => "level_advanced",
        TickOutcome::GhostsCaptured { .. } => "ghosts_captured",
        TickOutcome::LifeLost { .. } => "life_lost",
        TickOutcome::GameOver { .. } => "game_over",
    }
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, max_power_mode_time: u32) -> Vec<String> {
    let mut anomalies = Vec::new();
    let level = &snapshot.level;

    if snapshot.lives < 1 || snapshot.lives > STARTING_LIVES {
        anomalies.push(format!("lives out of range: {}", snapshot.lives));
    }
    if snapshot.pac.power_mode_time > max_power_mode_time {
        anomalies.push(format!(
            "power timer above maximum: {}",
            snapshot.pac.power_mode_time
        ));
    }
    if level.grid.len() != level.height as usize
        || level.grid.iter().any(|row| row.len() != level.width as usize)
    {
        anomalies.push(format!(
            "grid is not {}x{}",
            level.width, level.height
        ));
    }
    let counted = level
        .grid
        .iter()
        .flatten()
        .filter(|cell| **cell == Cell::Pellet)
        .count();
    if counted != snapshot.remaining_pellets {
        anomalies.push(format!(
            "remaining pellets mismatch: grid {counted}, reported {}",
            snapshot.remaining_pellets
        ));
    }

    let actors = std::iter::once(("pac".to_string(), snapshot.pac.x, snapshot.pac.y)).chain(
        snapshot
            .ghosts
            .iter()
            .map(|ghost| (format!("ghost {}", ghost.id), ghost.x, ghost.y)),
    );
    for (name, x, y) in actors {
        let cell = usize::try_from(y)
            .ok()
            .and_then(|row| level.grid.get(row))
            .and_then(|row| usize::try_from(x).ok().and_then(|col| row.get(col)));
        match cell {
            None => anomalies.push(format!("{name} out of bounds at ({x}, {y})")),
            Some(Cell::Wall) => anomalies.push(format!("{name} inside a wall at ({x}, {y})")),
            Some(_) => {}
        }
    }
    anomalies
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)
}
