//! Per-tick integration for players, the ball and projectiles

use super::combat::{Projectile, WeaponStats};
use super::entity::{Ball, Player};
use super::InputVector;

/// Field geometry and physics constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaParams {
    /// Field width
    pub width: f32,
    /// Field height
    pub height: f32,
    pub player_radius: f32,
    pub ball_radius: f32,
    /// Velocity multiplier applied to players each tick
    pub player_friction: f32,
    /// Velocity multiplier applied to the ball each tick
    pub ball_friction: f32,
    /// Wall bounce factor, negative to invert the axis
    pub restitution: f32,
    /// Player speed at full input deflection (per tick)
    pub player_top_speed: f32,
    /// Depth of each goal mouth
    pub goal_width: f32,
    /// Vertical opening of each goal, centered
    pub goal_height: f32,
    /// Share of the player's speed handed to the ball on contact
    pub kick_factor: f32,
    /// Share of a projectile's velocity added to the ball on hit
    pub impulse_factor: f32,
    pub weapon: WeaponStats,
    /// Score that ends the game (0 = never)
    pub win_score: u32,
}

impl Default for ArenaParams {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            player_radius: 20.0,
            ball_radius: 15.0,
            player_friction: 0.93,
            ball_friction: 0.98,
            restitution: -0.8,
            player_top_speed: 5.0,
            goal_width: 20.0,
            goal_height: 160.0,
            kick_factor: 0.5,
            impulse_factor: 0.2,
            weapon: WeaponStats::default(),
            win_score: 5,
        }
    }
}

impl ArenaParams {
    /// Distance the ball center keeps from every wall
    pub fn margin(&self) -> f32 {
        self.ball_radius
    }

    /// Vertical extent shared by both goal mouths
    pub fn goal_y_range(&self) -> (f32, f32) {
        let half = self.goal_height / 2.0;
        (self.height / 2.0 - half, self.height / 2.0 + half)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// Physics system for updating entity positions and velocities
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Set a local player's velocity from its input (replaces, never adds)
    pub fn apply_input(player: &mut Player, input: &InputVector, params: &ArenaParams) {
        let input = input.clamped();
        player.vx = input.move_x * params.player_top_speed;
        player.vy = input.move_y * params.player_top_speed;
    }

    /// Friction, integration and field clamp for one player; re-aims at the ball
    pub fn update_player(player: &mut Player, ball: &Ball, params: &ArenaParams) {
        player.vx *= params.player_friction;
        player.vy *= params.player_friction;

        player.x += player.vx;
        player.y += player.vy;

        Self::clamp_player(player, params);

        // Auto-aim, independent of movement input
        player.angle = (ball.y - player.y).atan2(ball.x - player.x);

        debug_assert!(
            player.x.is_finite() && player.y.is_finite() && player.angle.is_finite(),
            "player state became non-finite: {player:?}"
        );
    }

    /// Keep a player's whole body inside the field
    pub fn clamp_player(player: &mut Player, params: &ArenaParams) {
        player.x = player.x.clamp(player.radius, params.width - player.radius);
        player.y = player.y.clamp(player.radius, params.height - player.radius);
    }

    /// Friction, integration and inelastic wall bounce for the ball
    pub fn update_ball(ball: &mut Ball, params: &ArenaParams) {
        ball.vx *= params.ball_friction;
        ball.vy *= params.ball_friction;

        ball.x += ball.vx;
        ball.y += ball.vy;

        let margin = params.margin();
        let (min_x, max_x) = (margin, params.width - margin);
        let (min_y, max_y) = (margin, params.height - margin);

        if ball.x < min_x || ball.x > max_x {
            ball.x = ball.x.clamp(min_x, max_x);
            ball.vx *= params.restitution;
        }
        if ball.y < min_y || ball.y > max_y {
            ball.y = ball.y.clamp(min_y, max_y);
            ball.vy *= params.restitution;
        }

        debug_assert!(
            ball.x.is_finite() && ball.y.is_finite() && ball.vx.is_finite() && ball.vy.is_finite(),
            "ball state became non-finite: {ball:?}"
        );
    }

    /// Move every projectile and drop the ones that left the field
    pub fn update_projectiles(projectiles: &mut Vec<Projectile>, params: &ArenaParams) {
        projectiles.retain_mut(|projectile| {
            projectile.update();
            projectile.is_inside(params.width, params.height)
        });
    }
}
