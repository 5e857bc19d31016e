//! Application state shared across routes

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::Config;
use crate::game::GameMode;
use crate::net::channel::PeerLink;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Hands an accepted peer link to the session runner
    pub link_tx: mpsc::Sender<PeerLink>,
    session_active: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: Config) -> (Self, mpsc::Receiver<PeerLink>) {
        // Only one peer is ever accepted
        let (link_tx, link_rx) = mpsc::channel(1);

        let state = Self {
            config: Arc::new(config),
            link_tx,
            session_active: Arc::new(AtomicBool::new(false)),
        };
        (state, link_rx)
    }

    /// Claim the single session slot; false if a peer already holds it
    pub fn try_claim_session(&self) -> bool {
        !self.session_active.swap(true, Ordering::AcqRel)
    }

    pub fn release_session(&self) {
        self.session_active.store(false, Ordering::Release);
    }

    pub fn session_active(&self) -> bool {
        self.session_active.load(Ordering::Acquire)
    }

    pub fn mode(&self) -> GameMode {
        if self.session_active() {
            GameMode::Networked
        } else {
            GameMode::Waiting
        }
    }
}
