//! Game session: one explicit context per connection, and its tick loop
//!
//! A session is created when the peer link opens (or immediately in
//! single-device mode) and torn down when it ends. The simulation tick, the
//! sync timer and incoming peer frames are branches of one `select!` loop, so
//! a sync can land between any two ticks but never inside one.

use std::future::pending;
use std::time::Instant;

use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::authority::{AuthorityTable, Field, GameMode, Role};
use super::entity::Team;
use super::io::Hooks;
use super::physics::ArenaParams;
use super::snapshot::{Applied, SnapshotApplier, SnapshotBuilder, SnapshotStats, SyncGate};
use super::world::{World, WorldEvent};
use crate::config::Config;
use crate::net::channel::{LinkEvent, PeerLink};
use crate::net::protocol::{PeerMsg, ProtocolError};
use crate::util::time::{
    tick_duration, Timer, DEFAULT_SYNC_INTERVAL_MS, DEFAULT_SYNC_MIN_GAP_MS, DEFAULT_TICK_RATE,
};

/// Session errors. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to open peer channel: {0}")]
    ChannelOpen(String),

    #[error("Connection lost")]
    ConnectionLost,

    #[error("Peer channel error: {0}")]
    Channel(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Timer periods for the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub tick: Duration,
    pub sync_interval: Duration,
    pub sync_min_gap: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            tick: tick_duration(DEFAULT_TICK_RATE),
            sync_interval: Duration::from_millis(DEFAULT_SYNC_INTERVAL_MS),
            sync_min_gap: Duration::from_millis(DEFAULT_SYNC_MIN_GAP_MS),
        }
    }
}

impl SessionTiming {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tick: tick_duration(config.tick_rate),
            sync_interval: config.sync_interval,
            sync_min_gap: config.sync_min_gap,
        }
    }
}

/// How a finished game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalScore {
    pub winner: Team,
    pub red: u32,
    pub blue: u32,
}

pub struct GameSession {
    id: Uuid,
    authority: AuthorityTable,
    world: World,
    link: Option<PeerLink>,
    gate: SyncGate,
    applier: SnapshotApplier,
    stats: SnapshotStats,
    hooks: Hooks,
    timing: SessionTiming,
    tick: u64,
    started: Timer,
}

impl GameSession {
    /// Both players on this device; no sync protocol runs
    pub fn single_device(params: ArenaParams, timing: SessionTiming, hooks: Hooks) -> Self {
        Self::new(AuthorityTable::single_device(), None, params, timing, hooks)
    }

    /// One side of a peer connection, created once the link is open
    pub fn networked(
        role: Role,
        link: PeerLink,
        params: ArenaParams,
        timing: SessionTiming,
        hooks: Hooks,
    ) -> Self {
        Self::new(AuthorityTable::networked(role), Some(link), params, timing, hooks)
    }

    fn new(
        authority: AuthorityTable,
        link: Option<PeerLink>,
        params: ArenaParams,
        timing: SessionTiming,
        hooks: Hooks,
    ) -> Self {
        let id = Uuid::new_v4();
        info!(
            session_id = %id,
            mode = ?authority.mode(),
            role = ?authority.role(),
            "Session created"
        );

        Self {
            id,
            world: World::new(params, authority.local_players()),
            authority,
            link,
            gate: SyncGate::new(timing.sync_min_gap),
            applier: SnapshotApplier::new(),
            stats: SnapshotStats::default(),
            hooks,
            timing,
            tick: 0,
            started: Timer::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> GameMode {
        self.authority.mode()
    }

    pub fn role(&self) -> Option<Role> {
        self.authority.role()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn stats(&self) -> SnapshotStats {
        self.stats
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// One simulation tick: input, physics, collisions, render hand-off.
    ///
    /// Returns the final score once the score owner sees a winner.
    pub fn tick(&mut self) -> Option<FinalScore> {
        self.tick += 1;
        let before = self.world.scores();

        self.hooks.input.begin_tick();
        for team in Team::ALL {
            if !self.world.player(team).is_local {
                continue;
            }
            let input = self.hooks.input.poll(team);
            if self.world.apply_input(team, &input) {
                trace!(tick = self.tick, team = ?team, "Shot fired");
            }
        }

        for event in self.world.step() {
            match event {
                WorldEvent::Goal { scorer, red, blue } => {
                    debug!(tick = self.tick, scorer = ?scorer, red, blue, "Goal scored locally");
                }
            }
        }

        self.notify_scores(before);
        self.hooks.render.draw(&self.world.frame(self.tick));

        // Mirrored scores only decide the game once the owner confirms them
        if self.authority.owns(Field::Scores) {
            self.final_score()
        } else {
            None
        }
    }

    /// Send this peer's owned state if the gate allows it
    pub fn emit_sync(&mut self, now: Instant) -> Result<bool, SessionError> {
        let Some(link) = self.link.as_ref() else {
            return Ok(false);
        };
        let Some(seq) = self.gate.try_emit(now) else {
            return Ok(false);
        };
        let Some(msg) = SnapshotBuilder::build(&self.world, &self.authority, seq) else {
            return Ok(false);
        };

        let frame = msg.encode()?;
        let bytes = frame.len();
        link.send(frame).map_err(|_| SessionError::ConnectionLost)?;
        self.stats.record_sent(bytes);
        trace!(seq, bytes, kind = msg.kind(), "Sync emitted");
        Ok(true)
    }

    /// Decode and apply one incoming frame. Malformed frames are skipped whole.
    pub fn handle_frame(&mut self, frame: &str) -> Option<FinalScore> {
        let msg = match PeerMsg::decode(frame) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Dropping malformed peer frame");
                self.stats.rejected += 1;
                return None;
            }
        };

        let before = self.world.scores();
        let applied = self.applier.apply(&mut self.world, &self.authority, &msg);
        self.stats.record_applied(applied);

        match applied {
            Applied::Snapped { .. } => {
                self.notify_scores(before);
                if self.authority.mirrors(Field::Scores) {
                    self.final_score()
                } else {
                    None
                }
            }
            Applied::Stale => {
                debug!(seq = ?msg.seq(), "Dropping stale snapshot");
                None
            }
            Applied::Ignored => None,
        }
    }

    /// Wait for the next link event and handle it
    pub async fn receive(&mut self) -> Result<Option<FinalScore>, SessionError> {
        let event = next_event(self.link.as_mut()).await;
        self.on_link_event(event)
    }

    fn on_link_event(&mut self, event: Option<LinkEvent>) -> Result<Option<FinalScore>, SessionError> {
        match event {
            Some(LinkEvent::Frame(frame)) => Ok(self.handle_frame(&frame)),
            Some(LinkEvent::Error(e)) => Err(SessionError::Channel(e)),
            None => Err(SessionError::ConnectionLost),
        }
    }

    /// Drive the session until the game is decided or the link fails
    pub async fn run(mut self) -> Result<FinalScore, SessionError> {
        let mut tick_timer = interval(self.timing.tick);
        tick_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sync_timer = interval(self.timing.sync_interval);
        sync_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let runs_sync = self.authority.runs_sync();

        let result = loop {
            tokio::select! {
                _ = tick_timer.tick() => {
                    if let Some(done) = self.tick() {
                        break Ok(done);
                    }
                }
                _ = sync_timer.tick(), if runs_sync => {
                    if let Err(e) = self.emit_sync(Instant::now()) {
                        break Err(e);
                    }
                }
                event = next_event(self.link.as_mut()), if runs_sync => {
                    match self.on_link_event(event) {
                        Ok(Some(done)) => break Ok(done),
                        Ok(None) => {}
                        Err(e) => break Err(e),
                    }
                }
            }
        };

        if let Ok(done) = &result {
            // The owner pushes the deciding score before hanging up
            if self.authority.owns(Field::Scores) && runs_sync {
                self.gate.force_next();
                if let Err(e) = self.emit_sync(Instant::now()) {
                    debug!(error = %e, "Final sync not delivered");
                }
            }
            info!(session_id = %self.id, winner = ?done.winner, red = done.red, blue = done.blue, "Game over");
        }

        self.teardown();
        result
    }

    fn notify_scores(&mut self, before: (u32, u32)) {
        let (red, blue) = self.world.scores();
        if (red, blue) != before {
            self.hooks.scores.scores_changed(red, blue);
        }
    }

    fn final_score(&self) -> Option<FinalScore> {
        let winner = self.world.winner()?;
        let (red, blue) = self.world.scores();
        Some(FinalScore { winner, red, blue })
    }

    fn teardown(&self) {
        info!(
            session_id = %self.id,
            ticks = self.tick,
            elapsed_ms = self.started.elapsed_ms(),
            frames_sent = self.stats.sent,
            avg_frame_bytes = self.stats.avg_frame_bytes(),
            frames_applied = self.stats.applied,
            frames_stale = self.stats.stale,
            frames_rejected = self.stats.rejected,
            "Session torn down"
        );
    }
}

async fn next_event(link: Option<&mut PeerLink>) -> Option<LinkEvent> {
    match link {
        Some(link) => link.recv().await,
        None => pending().await,
    }
}
