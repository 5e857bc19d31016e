//! HTTP route definitions

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::app::AppState;
use crate::game::GameMode;
use crate::net::transport;
use crate::util::time::uptime_secs;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/peer", get(peer_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    mode: GameMode,
    session_active: bool,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        mode: state.mode(),
        session_active: state.session_active(),
    })
}

/// WebSocket upgrade for the guest. The first caller wins; later ones get 409.
async fn peer_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    if !state.try_claim_session() {
        warn!("Rejecting peer: a session is already active");
        return (StatusCode::CONFLICT, "Session already active").into_response();
    }

    ws.on_upgrade(move |socket| async move {
        info!("Peer connected");
        let link = transport::accept(socket);
        if state.link_tx.send(link).await.is_err() {
            warn!("No session runner waiting for the peer");
            state.release_session();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state() -> AppState {
        let config = Config::from_lookup(|_| None).unwrap();
        AppState::new(config).0
    }

    #[tokio::test]
    async fn health_reports_waiting_before_a_peer_joins() {
        let router = build_router(state());

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["mode"], "waiting");
        assert_eq!(json["session_active"], false);
    }

    #[test]
    fn session_slot_is_claimed_once() {
        let state = state();
        assert!(state.try_claim_session());
        assert!(!state.try_claim_session());
        assert_eq!(state.mode(), GameMode::Networked);

        state.release_session();
        assert!(state.try_claim_session());
    }
}
