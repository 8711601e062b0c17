use crate::{ControlHandle, FrameBus, RunningServer, ServerConfig};
use anyhow::Context;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info};

const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Flare Vision</title></head>
<body style="font-family:sans-serif; background:#111; color:#eee">
  <h2>Flare Vision</h2>
  <div style="margin:8px 0; display:flex; gap:12px; align-items:center;">
    <button id="btn-play" style="padding:6px 12px;">Play</button>
    <button id="btn-pause" style="padding:6px 12px;">Pause</button>
    <span id="conn" style="font-family:monospace; font-size:12px; color:#777">idle</span>
  </div>
  <img id="feed" width="640" height="480" style="border:1px solid #444" alt="feed">
  <ul id="status" style="font-family:monospace"></ul>
  <script>
  (function(){
    const feed = document.getElementById('feed');
    const list = document.getElementById('status');
    const conn = (t)=>{ document.getElementById('conn').textContent = t; };
    document.getElementById('btn-play').onclick = ()=> fetch('/control/play', {method:'POST'});
    document.getElementById('btn-pause').onclick = ()=> fetch('/control/pause', {method:'POST'});
    setInterval(()=>{ feed.src = '/frame.jpg?t=' + Date.now(); }, 100);
    const show = (ev)=>{
      list.innerHTML = '';
      for (const line of ev.lines) {
        const li = document.createElement('li');
        li.textContent = line;
        li.style.color = line.endsWith('ACTIVE') ? '#f44' : '#8c8';
        list.appendChild(li);
      }
    };
    const ws = new WebSocket((location.protocol==='https:'?'wss://':'ws://') + location.host + '/ws/status');
    ws.onopen = ()=> conn('connected');
    ws.onclose = ()=> conn('disconnected');
    ws.onmessage = (msg)=> show(JSON.parse(msg.data));
  })();
  </script>
</body>
</html>
"#;

#[derive(Clone)]
struct AppState {
    bus: FrameBus,
    control: ControlHandle,
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Html(INDEX_HTML) }))
        .route("/frame.jpg", get(latest_frame))
        .route("/status", get(latest_status))
        .route("/ws/status", get(status_socket))
        .route("/healthz", get(|| async { "ok" }))
        .route("/control/play", post(play))
        .route("/control/pause", post(pause))
        .with_state(state)
}

async fn latest_frame(State(state): State<AppState>) -> Response {
    match state.bus.latest_frame() {
        Some(packet) => (
            [
                (header::CONTENT_TYPE, "image/jpeg"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            packet.data.to_vec(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "no frame yet").into_response(),
    }
}

async fn latest_status(State(state): State<AppState>) -> Response {
    match state.bus.latest_status() {
        Some(event) => Json(event).into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "no status yet").into_response(),
    }
}

async fn status_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| forward_status(socket, state.bus))
}

async fn forward_status(mut socket: WebSocket, bus: FrameBus) {
    let mut events = bus.events_tx.subscribe();
    if let Some(event) = bus.latest_status() {
        if let Ok(text) = serde_json::to_string(&event) {
            if socket.send(Message::Text(text)).await.is_err() {
                return;
            }
        }
    }
    loop {
        match events.recv().await {
            Ok(event) => {
                let Ok(text) = serde_json::to_string(&event) else {
                    continue;
                };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            Err(RecvError::Lagged(missed)) => debug!(missed, "status client lagging"),
            Err(RecvError::Closed) => break,
        }
    }
}

async fn play(State(state): State<AppState>) -> StatusCode {
    state.control.set_playing(true);
    info!("playback resumed");
    StatusCode::NO_CONTENT
}

async fn pause(State(state): State<AppState>) -> StatusCode {
    state.control.set_playing(false);
    info!("playback paused");
    StatusCode::NO_CONTENT
}

/// Binds `cfg.bind_addr` and serves the dashboard on a background task.
pub async fn start_server(
    bus: FrameBus,
    cfg: ServerConfig,
    control: ControlHandle,
) -> anyhow::Result<RunningServer> {
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    let local_addr = listener.local_addr()?;
    let app = router(AppState { bus, control });

    let task = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!(error = %err, "dashboard server stopped");
        }
    });
    info!("dashboard listening on http://{local_addr}");
    Ok(RunningServer { local_addr, task })
}
