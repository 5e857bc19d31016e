//! Game simulation modules

pub mod authority;
pub mod collision;
pub mod combat;
pub mod entity;
pub mod io;
pub mod physics;
pub mod session;
pub mod snapshot;
pub mod world;

pub use authority::{AuthorityTable, Field, GameMode, Role};
pub use entity::{Ball, Player, Team};
pub use io::Hooks;
pub use physics::ArenaParams;
pub use session::{FinalScore, GameSession, SessionError, SessionTiming};
pub use world::{Frame, World};

/// Input for one local player for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputVector {
    pub move_x: f32,
    pub move_y: f32,
    pub shooting: bool,
}

impl InputVector {
    pub fn new(move_x: f32, move_y: f32, shooting: bool) -> Self {
        Self {
            move_x,
            move_y,
            shooting,
        }
    }

    /// Both axes limited to [-1, 1]
    pub fn clamped(self) -> Self {
        Self {
            move_x: self.move_x.clamp(-1.0, 1.0),
            move_y: self.move_y.clamp(-1.0, 1.0),
            shooting: self.shooting,
        }
    }
}
