//! HTTP + WebSocket agent event feed
//!
//! Endpoints:
//! - GET /health - Health check
//! - POST /events - Broadcast a progress event to live subscribers
//! - WS /ws - Live progress events
//! - WS /ws/demo - Simulated dialing cycle (for wiring up a desktop)

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::types::{Direction, Lead, ProgressEvent};

/// App state
pub struct AppState {
    pub events_tx: broadcast::Sender<ProgressEvent>,
    /// Scales the demo cycle's pauses (1.0 = real time)
    pub demo_pace: f64,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub subscribers: usize,
}

/// Broadcast response
#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub delivered: usize,
}

/// One pass of the simulated feed: event, then the pause after it
pub fn demo_cycle() -> Vec<(ProgressEvent, Duration)> {
    vec![
        (
            ProgressEvent::dialing(Direction::Inbound, 40),
            Duration::from_secs(3),
        ),
        (
            ProgressEvent::dialing(Direction::Outbound, 60).with_stage("Outbound – New Leads"),
            Duration::from_secs(3),
        ),
        (
            ProgressEvent::connected(Some(Direction::Outbound)).with_lead(Lead::new(
                "p9XK3Y7WZ",
                "8a08b0a4-ff2f-46f4-bb40-57bb06b9dfd1",
            )),
            Duration::from_secs(5),
        ),
        (ProgressEvent::idle(), Duration::from_secs(5)),
    ]
}

/// Create the API router
pub fn create_router() -> Router {
    create_router_with_pace(1.0)
}

pub fn create_router_with_pace(demo_pace: f64) -> Router {
    let (events_tx, _) = broadcast::channel(100);
    let state = Arc::new(AppState {
        events_tx,
        demo_pace,
    });

    Router::new()
        .route("/health", get(health))
        .route("/events", post(publish_event))
        .route("/ws", get(live_handler))
        .route("/ws/demo", get(demo_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        subscribers: state.events_tx.receiver_count(),
    })
}

/// Broadcast one event to every live subscriber
async fn publish_event(
    State(state): State<Arc<AppState>>,
    Json(evt): Json<ProgressEvent>,
) -> Json<PublishResponse> {
    let delivered = state.events_tx.send(evt).unwrap_or(0);
    debug!(delivered, "Published progress event");
    Json(PublishResponse { delivered })
}

async fn live_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let rx = state.events_tx.subscribe();
    ws.on_upgrade(move |socket| handle_live(socket, rx))
}

async fn handle_live(mut socket: WebSocket, mut rx: broadcast::Receiver<ProgressEvent>) {
    loop {
        let evt = match rx.recv().await {
            Ok(evt) => evt,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "Subscriber lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };
        let json = serde_json::to_string(&evt).unwrap_or_default();
        if socket.send(Message::Text(json)).await.is_err() {
            break;
        }
    }
}

async fn demo_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let pace = state.demo_pace;
    ws.on_upgrade(move |socket| handle_demo(socket, pace))
}

async fn handle_demo(mut socket: WebSocket, pace: f64) {
    loop {
        for (evt, pause) in demo_cycle() {
            let json = serde_json::to_string(&evt).unwrap_or_default();
            if socket.send(Message::Text(json)).await.is_err() {
                return;
            }
            tokio::time::sleep(pause.mul_f64(pace)).await;
        }
    }
}

/// Run the feed server
pub async fn run_server(addr: &str) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Agent feed running on {}", addr);
    info!("  GET  /health   - Health check");
    info!("  POST /events   - Broadcast a progress event");
    info!("  WS   /ws       - Live progress events");
    info!("  WS   /ws/demo  - Simulated dialing cycle");
    axum::serve(listener, router).await?;
    Ok(())
}
