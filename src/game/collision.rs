//! Pairwise collision resolution and goal detection

use super::combat::Projectile;
use super::entity::{Ball, Player, Team};
use super::physics::ArenaParams;

/// Which goal mouths the ball reached this tick
///
/// The two checks are independent. A field narrow enough for the ball to
/// touch both mouths at once reports both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoalCheck {
    /// Ball in RED's goal (left), BLUE scores
    pub left: bool,
    /// Ball in BLUE's goal (right), RED scores
    pub right: bool,
}

impl GoalCheck {
    pub fn any(&self) -> bool {
        self.left || self.right
    }

    /// Teams credited with a goal
    pub fn scorers(&self) -> impl Iterator<Item = Team> {
        let left = self.left.then_some(Team::Blue);
        let right = self.right.then_some(Team::Red);
        left.into_iter().chain(right)
    }
}

/// Collision system for contact resolution
pub struct CollisionSystem;

impl CollisionSystem {
    /// Push the player out of the ball and kick the ball away from it.
    ///
    /// The ball's velocity is replaced by the player's pre-contact speed
    /// scaled by `kick_factor`, pointing from the player through the ball.
    pub fn resolve_player_ball(player: &mut Player, ball: &mut Ball, kick_factor: f32) -> bool {
        let dx = player.x - ball.x;
        let dy = player.y - ball.y;
        let dist = dx.hypot(dy);
        let combined_radius = player.radius + ball.radius;

        if dist >= combined_radius {
            return false;
        }

        // Unit vector from ball to player
        let (nx, ny) = if dist > f32::EPSILON {
            (dx / dist, dy / dist)
        } else {
            // Coincident centers: send the player back toward its own side
            match player.team {
                Team::Red => (-1.0, 0.0),
                Team::Blue => (1.0, 0.0),
            }
        };

        let player_speed = player.speed();

        player.x = ball.x + nx * combined_radius;
        player.y = ball.y + ny * combined_radius;

        ball.vx = -nx * player_speed * kick_factor;
        ball.vy = -ny * player_speed * kick_factor;
        true
    }

    /// Add each overlapping projectile's impulse to the ball and destroy it.
    /// Returns the number of hits.
    pub fn resolve_projectiles_ball(
        projectiles: &mut Vec<Projectile>,
        ball: &mut Ball,
        impulse_factor: f32,
    ) -> usize {
        let before = projectiles.len();
        projectiles.retain(|projectile| {
            if projectile.check_hit(ball.x, ball.y, ball.radius) {
                ball.vx += projectile.vx * impulse_factor;
                ball.vy += projectile.vy * impulse_factor;
                false
            } else {
                true
            }
        });
        before - projectiles.len()
    }

    /// Test the ball's leading edge against both goal mouths
    pub fn detect_goals(ball: &Ball, params: &ArenaParams) -> GoalCheck {
        let (top, bottom) = params.goal_y_range();
        let in_mouth = ball.y >= top && ball.y <= bottom;

        GoalCheck {
            left: in_mouth && ball.x - ball.radius < params.goal_width,
            right: in_mouth && ball.x + ball.radius > params.width - params.goal_width,
        }
    }
}
