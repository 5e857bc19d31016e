//! Arena entities: the two players and the ball

use serde::{Deserialize, Serialize};

use super::physics::ArenaParams;

/// Team color. RED is player 1, BLUE is player 2 on both peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Red, Team::Blue];

    /// Slot in the world's player array
    pub fn index(self) -> usize {
        match self {
            Team::Red => 0,
            Team::Blue => 1,
        }
    }

    pub fn opponent(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    /// Starting x as a fraction of the field width
    fn spawn_fraction(self) -> f32 {
        match self {
            Team::Red => 0.25,
            Team::Blue => 0.75,
        }
    }
}

/// Player state, one per team on every peer
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub team: Team,

    // Position and movement
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
    /// Facing in radians, always toward the ball
    pub angle: f32,

    pub score: u32,
    /// This process reads live input for this player
    pub is_local: bool,
    /// Ticks until the next shot is allowed
    pub cooldown: u32,
}

impl Player {
    /// Create a player at its team's starting spot
    pub fn spawn(team: Team, params: &ArenaParams, is_local: bool) -> Self {
        Self {
            team,
            x: params.width * team.spawn_fraction(),
            y: params.height / 2.0,
            vx: 0.0,
            vy: 0.0,
            radius: params.player_radius,
            angle: 0.0,
            score: 0,
            is_local,
            cooldown: 0,
        }
    }

    /// Move back to the starting spot, keeping score and control flags
    pub fn respawn(&mut self, params: &ArenaParams) {
        self.x = params.width * self.team.spawn_fraction();
        self.y = params.height / 2.0;
        self.vx = 0.0;
        self.vy = 0.0;
        self.cooldown = 0;
    }

    /// Current speed magnitude
    pub fn speed(&self) -> f32 {
        self.vx.hypot(self.vy)
    }
}

/// The single ball
#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
}

impl Ball {
    /// Create a resting ball at the center of the field
    pub fn new(params: &ArenaParams) -> Self {
        let mut ball = Self {
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            radius: params.ball_radius,
        };
        ball.reset(params);
        ball
    }

    /// Re-center and stop the ball
    pub fn reset(&mut self, params: &ArenaParams) {
        self.x = params.width / 2.0;
        self.y = params.height / 2.0;
        self.vx = 0.0;
        self.vy = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_is_symmetric() {
        let params = ArenaParams::default();
        let red = Player::spawn(Team::Red, &params, true);
        let blue = Player::spawn(Team::Blue, &params, false);

        assert_eq!(red.x, params.width * 0.25);
        assert_eq!(blue.x, params.width * 0.75);
        assert_eq!(red.y, params.height / 2.0);
        assert_eq!(blue.y, red.y);
        assert_eq!(red.score, 0);
        assert!(red.is_local && !blue.is_local);
    }

    #[test]
    fn ball_reset_centers_and_stops() {
        let params = ArenaParams::default();
        let mut ball = Ball::new(&params);
        ball.x = 42.0;
        ball.y = 17.0;
        ball.vx = 3.0;
        ball.vy = -8.0;

        ball.reset(&params);

        assert_eq!((ball.x, ball.y), (params.width / 2.0, params.height / 2.0));
        assert_eq!((ball.vx, ball.vy), (0.0, 0.0));
    }

    #[test]
    fn teams_are_opposed() {
        assert_eq!(Team::Red.opponent(), Team::Blue);
        assert_eq!(Team::Blue.opponent().index(), 0);
    }
}
