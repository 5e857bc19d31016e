//! Peer protocol message definitions
//! These are the JSON wire types exchanged between host and guest

use serde::{Deserialize, Serialize};

use crate::game::{Ball, Player};

/// Messages exchanged over the peer link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeerMsg {
    /// Authoritative snapshot (host to guest)
    State {
        ball: BallState,
        /// The sender's own player, i.e. the receiver's opponent
        opponent: PlayerState,
        #[serde(rename = "redScore")]
        red_score: u32,
        #[serde(rename = "blueScore")]
        blue_score: u32,
        /// Monotonic emission counter, absent from baseline senders
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seq: Option<u64>,
    },

    /// The guest's own player (guest to host)
    Player {
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        angle: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seq: Option<u64>,
    },
}

impl PeerMsg {
    /// Build a player update from a state snapshot
    pub fn player(state: PlayerState, seq: Option<u64>) -> Self {
        let PlayerState { x, y, vx, vy, angle } = state;
        PeerMsg::Player {
            x,
            y,
            vx,
            vy,
            angle,
            seq,
        }
    }

    pub fn seq(&self) -> Option<u64> {
        match self {
            PeerMsg::State { seq, .. } | PeerMsg::Player { seq, .. } => *seq,
        }
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            PeerMsg::State { .. } => "state",
            PeerMsg::Player { .. } => "player",
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Parse a frame; any missing, mistyped or non-finite field rejects the whole message
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let msg: Self = serde_json::from_str(frame).map_err(ProtocolError::Decode)?;
        msg.validate()?;
        Ok(msg)
    }

    /// Out-of-range numbers parse as infinities; none may reach the world
    fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            PeerMsg::State { ball, opponent, .. } => {
                finite("ball", &[ball.x, ball.y, ball.vx, ball.vy])?;
                finite("opponent", &[opponent.x, opponent.y, opponent.vx, opponent.vy, opponent.angle])
            }
            PeerMsg::Player {
                x, y, vx, vy, angle, ..
            } => finite("player", &[*x, *y, *vx, *vy, *angle]),
        }
    }
}

fn finite(entity: &'static str, values: &[f32]) -> Result<(), ProtocolError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ProtocolError::NonFinite(entity))
    }
}

/// Ball position and velocity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallState {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

impl From<&Ball> for BallState {
    fn from(ball: &Ball) -> Self {
        Self {
            x: ball.x,
            y: ball.y,
            vx: ball.vx,
            vy: ball.vy,
        }
    }
}

impl BallState {
    /// Snap a ball to this state
    pub fn write_to(&self, ball: &mut Ball) {
        ball.x = self.x;
        ball.y = self.y;
        ball.vx = self.vx;
        ball.vy = self.vy;
    }
}

/// Player kinematics and facing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Facing in radians
    pub angle: f32,
}

impl From<&Player> for PlayerState {
    fn from(player: &Player) -> Self {
        Self {
            x: player.x,
            y: player.y,
            vx: player.vx,
            vy: player.vy,
            angle: player.angle,
        }
    }
}

impl PlayerState {
    /// Snap a player to this state
    pub fn write_to(&self, player: &mut Player) {
        player.x = self.x;
        player.y = self.y;
        player.vx = self.vx;
        player.vy = self.vy;
        player.angle = self.angle;
    }
}

/// Protocol errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Failed to encode peer message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Malformed peer message: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Non-finite {0} state in peer message")]
    NonFinite(&'static str),
}
