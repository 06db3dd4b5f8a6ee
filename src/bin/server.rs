use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use pac_maze::catalog::LevelCatalog;
use pac_maze::constants::{TICK_PERIOD, TICK_RATE};
use pac_maze::engine::{GameEngine, GameOptions};
use pac_maze::logging::{emit_game_events, emit_log, LogLevel};
use pac_maze::protocol::{parse_client_message, ParsedClientMessage};
use pac_maze::ticker::{TickControl, Ticker};
use serde_json::{json, Value};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

struct ServerState {
    clients: HashMap<String, mpsc::Sender<String>>,
    game: GameEngine,
}

impl ServerState {
    fn new(catalog: Arc<LevelCatalog>) -> Self {
        Self {
            clients: HashMap::new(),
            game: GameEngine::new(catalog, GameOptions::default()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let catalog = Arc::new(load_catalog()?);
    println!("[server] {} level(s) loaded", catalog.len());

    let state = Arc::new(Mutex::new(ServerState::new(catalog)));
    let ticker = Ticker::spawn(state.clone(), TICK_PERIOD, tick_game);
    println!("[server] game loop running at {TICK_RATE} ticks/s");

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/levels", get(levels_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        println!(
            "[server] static file root: {}",
            static_dir.to_string_lossy()
        );
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        eprintln!("[server] static file root not found. set STATIC_DIR to serve a client.");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    println!("[server] listening on :{port}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server runtime failed")?;

    ticker.stop();
    let ticks = ticker.join().await;
    println!("[server] game loop stopped after {ticks} ticks");
    Ok(())
}

fn load_catalog() -> anyhow::Result<LevelCatalog> {
    let Ok(raw_path) = std::env::var("LEVELS_PATH") else {
        return Ok(LevelCatalog::builtin());
    };
    let path = PathBuf::from(raw_path);
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read level catalog {}", path.display()))?;
    LevelCatalog::from_json(&raw)
        .with_context(|| format!("invalid level catalog {}", path.display()))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    println!("[server] shutdown requested");
}

fn tick_game(state: &mut ServerState) -> TickControl {
    state.game.step();
    let snapshot = state.game.build_snapshot(true);
    emit_game_events("server", snapshot.tick, &snapshot.events);

    broadcast(
        state,
        &json!({
            "type": "state",
            "snapshot": snapshot,
        }),
    );
    TickControl::Continue
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("public"), PathBuf::from("dist/client")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn levels_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(guard.game.catalog().to_json())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<String>(256);

    {
        let mut guard = state.lock().await;
        guard.clients.insert(client_id.clone(), tx.clone());
        let welcome = json!({
            "type": "welcome",
            "clientId": client_id,
            "snapshot": guard.game.build_snapshot(false),
        });
        send_to_client(&mut guard, &client_id, &welcome);
        emit_log(
            LogLevel::Info,
            "client_connected",
            "server",
            Some(guard.game.tick_count()),
            json!({ "clientId": client_id, "clients": guard.clients.len() }),
        );
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(&state, &client_id, raw.as_str()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = std::str::from_utf8(&raw) {
                    handle_client_message(&state, &client_id, text).await;
                } else {
                    send_error_to_client(&state, &client_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    {
        let mut guard = state.lock().await;
        guard.clients.remove(&client_id);
        emit_log(
            LogLevel::Info,
            "client_disconnected",
            "server",
            Some(guard.game.tick_count()),
            json!({ "clientId": client_id, "clients": guard.clients.len() }),
        );
    }
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: &SharedState, client_id: &str, raw: &str) {
    let Some(message) = parse_client_message(raw) else {
        send_error_to_client(state, client_id, "invalid message").await;
        return;
    };

    let mut guard = state.lock().await;
    match message {
        ParsedClientMessage::Input { dir } => {
            if let Err(error) = guard.game.set_intent(dir) {
                send_to_client(
                    &mut guard,
                    client_id,
                    &json!({ "type": "error", "message": error.to_string() }),
                );
            }
        }
        ParsedClientMessage::Ping { t } => {
            send_to_client(&mut guard, client_id, &json!({ "type": "pong", "t": t }));
        }
    }
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_to_client(
        &mut guard,
        client_id,
        &json!({ "type": "error", "message": message }),
    );
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value) {
    let Some(tx) = state.clients.get(client_id) else {
        return;
    };
    if let Err(TrySendError::Closed(_)) = tx.try_send(message.to_string()) {
        state.clients.remove(client_id);
    }
}

/// Sends to every client. A full queue drops the frame; a closed one drops the client.
fn broadcast(state: &mut ServerState, message: &Value) {
    let payload = message.to_string();
    let mut closed = Vec::new();
    for (client_id, tx) in &state.clients {
        if let Err(TrySendError::Closed(_)) = tx.try_send(payload.clone()) {
            closed.push(client_id.clone());
        }
    }
    for client_id in closed {
        state.clients.remove(&client_id);
    }
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}
