use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::types::GameEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Clone, Debug, Serialize)]
pub struct StructuredLogLine {
    pub timestamp: String,
    #[serde(rename = "timestampMs")]
    pub timestamp_ms: i64,
    pub level: LogLevel,
    pub event: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    pub details: Value,
}

pub fn log_line(
    level: LogLevel,
    event: &str,
    source: &str,
    tick: Option<u64>,
    details: Value,
) -> StructuredLogLine {
    let now = Utc::now();
    StructuredLogLine {
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        timestamp_ms: now.timestamp_millis(),
        level,
        event: event.to_string(),
        source: source.to_string(),
        tick,
        details,
    }
}

/// Writes one JSON log line to stderr.
pub fn emit_log(level: LogLevel, event: &str, source: &str, tick: Option<u64>, details: Value) {
    let line = log_line(level, event, source, tick, details);
    eprintln!(
        "{}",
        serde_json::to_string(&line).expect("structured log should serialize")
    );
}

pub fn event_name(event: &GameEvent) -> &'static str {
    match event {
        GameEvent::LevelStarted { .. } => "level_started",
        GameEvent::PelletEaten { .. } => "pellet_eaten",
        GameEvent::PowerPelletEaten { .. } => "power_pellet_eaten",
        GameEvent::LevelCompleted { .. } => "level_completed",
        GameEvent::GhostCaptured { .. } => "ghost_captured",
        GameEvent::LifeLost { .. } => "life_lost",
        GameEvent::GameOver { .. } => "game_over",
    }
}

/// Logs the events worth a line. Pellet pickups are too frequent and are skipped.
pub fn emit_game_events(source: &str, tick: u64, events: &[GameEvent]) {
    for event in events {
        if matches!(event, GameEvent::PelletEaten { .. }) {
            continue;
        }
        let details = serde_json::to_value(event).unwrap_or_else(|_| json!({}));
        emit_log(LogLevel::Info, event_name(event), source, Some(tick), details);
    }
}
