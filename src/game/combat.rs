//! Projectiles and the firing rule
//!
//! Projectiles are purely local: each peer only spawns shots for the player it
//! controls and never sends them over the link.

use super::entity::{Player, Team};

/// Weapon stats shared by both players
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponStats {
    /// Projectile speed (per tick)
    pub projectile_speed: f32,
    /// Ticks between shots
    pub cooldown_ticks: u32,
    /// Projectiles one team may have in flight
    pub max_in_flight: usize,
    /// Projectile hitbox radius
    pub projectile_radius: f32,
}

impl Default for WeaponStats {
    fn default() -> Self {
        Self {
            projectile_speed: 8.0,
            cooldown_ticks: 20,
            max_in_flight: 6,
            projectile_radius: 5.0,
        }
    }
}

/// Active projectile in the arena
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub team: Team,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
}

impl Projectile {
    pub fn new(team: Team, x: f32, y: f32, vx: f32, vy: f32, radius: f32) -> Self {
        Self {
            team,
            x,
            y,
            vx,
            vy,
            radius,
        }
    }

    /// Spawn at the shooter's rim, travelling along its aim
    pub fn fired_by(shooter: &Player, stats: &WeaponStats) -> Self {
        let (sin, cos) = shooter.angle.sin_cos();
        Self::new(
            shooter.team,
            shooter.x + cos * shooter.radius,
            shooter.y + sin * shooter.radius,
            cos * stats.projectile_speed,
            sin * stats.projectile_speed,
            stats.projectile_radius,
        )
    }

    /// Constant-velocity step, no friction
    pub fn update(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
    }

    /// Whether the center is still on the field
    pub fn is_inside(&self, width: f32, height: f32) -> bool {
        (0.0..=width).contains(&self.x) && (0.0..=height).contains(&self.y)
    }

    /// Check overlap with a circle
    pub fn check_hit(&self, x: f32, y: f32, radius: f32) -> bool {
        let dx = self.x - x;
        let dy = self.y - y;
        let combined_radius = self.radius + radius;
        dx * dx + dy * dy < combined_radius * combined_radius
    }
}

/// Combat system for cooldowns and firing
pub struct CombatSystem;

impl CombatSystem {
    /// Count the cooldown down by one tick
    pub fn update_cooldown(cooldown: u32) -> u32 {
        cooldown.saturating_sub(1)
    }

    /// Fire for `shooter` if its cooldown and the in-flight cap allow it
    pub fn try_fire(
        shooter: &mut Player,
        projectiles: &mut Vec<Projectile>,
        stats: &WeaponStats,
    ) -> bool {
        if shooter.cooldown > 0 {
            return false;
        }
        let in_flight = projectiles.iter().filter(|p| p.team == shooter.team).count();
        if in_flight >= stats.max_in_flight {
            return false;
        }

        projectiles.push(Projectile::fired_by(shooter, stats));
        shooter.cooldown = stats.cooldown_ticks;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::physics::ArenaParams;

    #[test]
    fn fires_along_aim_from_the_rim() {
        let params = ArenaParams::default();
        let mut shooter = Player::spawn(Team::Red, &params, true);
        shooter.angle = 0.0;
        let mut projectiles = Vec::new();

        assert!(CombatSystem::try_fire(&mut shooter, &mut projectiles, &params.weapon));

        let shot = &projectiles[0];
        assert_eq!(shot.team, Team::Red);
        assert_eq!(shot.x, shooter.x + shooter.radius);
        assert_eq!(shot.vx, params.weapon.projectile_speed);
        assert_eq!(shot.vy, 0.0);
        assert_eq!(shooter.cooldown, params.weapon.cooldown_ticks);
    }

    #[test]
    fn cooldown_blocks_the_next_shot() {
        let params = ArenaParams::default();
        let mut shooter = Player::spawn(Team::Blue, &params, true);
        let mut projectiles = Vec::new();

        assert!(CombatSystem::try_fire(&mut shooter, &mut projectiles, &params.weapon));
        assert!(!CombatSystem::try_fire(&mut shooter, &mut projectiles, &params.weapon));
        assert_eq!(projectiles.len(), 1);

        for _ in 0..params.weapon.cooldown_ticks {
            shooter.cooldown = CombatSystem::update_cooldown(shooter.cooldown);
        }
        assert!(CombatSystem::try_fire(&mut shooter, &mut projectiles, &params.weapon));
    }

    #[test]
    fn in_flight_cap_is_per_team() {
        let params = ArenaParams::default();
        let mut shooter = Player::spawn(Team::Red, &params, true);
        let mut projectiles: Vec<Projectile> = (0..params.weapon.max_in_flight)
            .map(|_| Projectile::new(Team::Red, 1.0, 1.0, 0.0, 0.0, 5.0))
            .collect();

        assert!(!CombatSystem::try_fire(&mut shooter, &mut projectiles, &params.weapon));

        projectiles[0].team = Team::Blue;
        assert!(CombatSystem::try_fire(&mut shooter, &mut projectiles, &params.weapon));
    }

    #[test]
    fn cooldown_saturates_at_zero() {
        assert_eq!(CombatSystem::update_cooldown(0), 0);
        assert_eq!(CombatSystem::update_cooldown(3), 2);
    }
}
