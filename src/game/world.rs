//! The simulated world on one peer: both players, the ball and local projectiles

use tracing::{debug, info};

use super::collision::{CollisionSystem, GoalCheck};
use super::combat::{CombatSystem, Projectile};
use super::entity::{Ball, Player, Team};
use super::physics::{ArenaParams, PhysicsSystem};
use super::InputVector;

/// Read-only view handed to the render sink each tick
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub tick: u64,
    pub players: &'a [Player; 2],
    pub ball: &'a Ball,
    pub projectiles: &'a [Projectile],
}

/// Something that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldEvent {
    Goal { scorer: Team, red: u32, blue: u32 },
}

pub struct World {
    params: ArenaParams,
    players: [Player; 2],
    ball: Ball,
    projectiles: Vec<Projectile>,
}

impl World {
    /// Symmetric starting placement; `local` flags which teams read live input
    pub fn new(params: ArenaParams, local: [bool; 2]) -> Self {
        Self {
            players: [
                Player::spawn(Team::Red, &params, local[Team::Red.index()]),
                Player::spawn(Team::Blue, &params, local[Team::Blue.index()]),
            ],
            ball: Ball::new(&params),
            projectiles: Vec::new(),
            params,
        }
    }

    pub fn params(&self) -> &ArenaParams {
        &self.params
    }

    pub fn player(&self, team: Team) -> &Player {
        &self.players[team.index()]
    }

    pub fn player_mut(&mut self, team: Team) -> &mut Player {
        &mut self.players[team.index()]
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn ball_mut(&mut self) -> &mut Ball {
        &mut self.ball
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// (red, blue)
    pub fn scores(&self) -> (u32, u32) {
        (self.player(Team::Red).score, self.player(Team::Blue).score)
    }

    /// Overwrite both scores; returns whether either changed
    pub fn set_scores(&mut self, red: u32, blue: u32) -> bool {
        let changed = self.scores() != (red, blue);
        self.player_mut(Team::Red).score = red;
        self.player_mut(Team::Blue).score = blue;
        changed
    }

    /// First team at or past the winning score
    pub fn winner(&self) -> Option<Team> {
        let target = self.params.win_score;
        if target == 0 {
            return None;
        }
        Team::ALL
            .into_iter()
            .find(|&team| self.player(team).score >= target)
    }

    /// Apply one input vector to a locally controlled player.
    ///
    /// Non-local players are left alone. Returns whether a shot was fired.
    pub fn apply_input(&mut self, team: Team, input: &InputVector) -> bool {
        let params = self.params;
        let player = &mut self.players[team.index()];
        if !player.is_local {
            return false;
        }

        PhysicsSystem::apply_input(player, input, &params);
        input.shooting && CombatSystem::try_fire(player, &mut self.projectiles, &params.weapon)
    }

    /// Ball physics followed by goal detection. Scores and resets on a goal.
    pub fn update_ball(&mut self) -> GoalCheck {
        PhysicsSystem::update_ball(&mut self.ball, &self.params);

        let check = CollisionSystem::detect_goals(&self.ball, &self.params);
        for scorer in check.scorers() {
            self.player_mut(scorer).score += 1;
        }
        if check.any() {
            let (red, blue) = self.scores();
            info!(left = check.left, right = check.right, red, blue, "Goal");
            self.ball.reset(&self.params);
        }
        check
    }

    /// Physics, projectile integration and the collision pass for one tick
    pub fn step(&mut self) -> Vec<WorldEvent> {
        let mut events = Vec::new();

        for player in self.players.iter_mut() {
            player.cooldown = CombatSystem::update_cooldown(player.cooldown);
            PhysicsSystem::update_player(player, &self.ball, &self.params);
        }

        let goals = self.update_ball();
        let (red, blue) = self.scores();
        events.extend(goals.scorers().map(|scorer| WorldEvent::Goal { scorer, red, blue }));

        PhysicsSystem::update_projectiles(&mut self.projectiles, &self.params);

        for player in self.players.iter_mut() {
            if CollisionSystem::resolve_player_ball(player, &mut self.ball, self.params.kick_factor) {
                // Separation can push a player pinned against a wall off the field
                PhysicsSystem::clamp_player(player, &self.params);
            }
        }
        let hits = CollisionSystem::resolve_projectiles_ball(
            &mut self.projectiles,
            &mut self.ball,
            self.params.impulse_factor,
        );
        if hits > 0 {
            debug!(hits, "Projectiles struck the ball");
        }

        events
    }

    pub fn frame(&self, tick: u64) -> Frame<'_> {
        Frame {
            tick,
            players: &self.players,
            ball: &self.ball,
            projectiles: &self.projectiles,
        }
    }

    /// Full-game reset: scores to zero, everything back to the start
    pub fn reset_match(&mut self) {
        let params = self.params;
        for player in self.players.iter_mut() {
            player.respawn(&params);
            player.score = 0;
        }
        self.projectiles.clear();
        self.ball.reset(&params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn world() -> World {
        World::new(ArenaParams::default(), [true, true])
    }

    #[test]
    fn left_goal_credits_blue_and_resets_the_ball() {
        let mut world = world();
        let params = *world.params();
        let (top, bottom) = params.goal_y_range();
        let ball = world.ball_mut();
        ball.x = params.goal_width - 1.0;
        ball.y = (top + bottom) / 2.0 + 10.0;
        ball.vx = 3.0;
        ball.vy = -2.0;

        let check = world.update_ball();

        assert!(check.left);
        assert_eq!(world.scores(), (0, 1));
        assert_eq!((world.ball().x, world.ball().y), params.center());
        assert_eq!((world.ball().vx, world.ball().vy), (0.0, 0.0));
    }

    #[test]
    fn right_goal_credits_red() {
        let mut world = world();
        let params = *world.params();
        world.ball_mut().x = params.width - params.goal_width + 1.0;

        world.update_ball();

        assert_eq!(world.scores(), (1, 0));
    }

    #[test]
    fn both_goals_fire_in_a_degenerate_field() {
        let params = ArenaParams {
            width: 40.0,
            ..ArenaParams::default()
        };
        let mut world = World::new(params, [true, true]);

        world.update_ball();

        // The kickoff spot already touches both mouths
        assert_eq!(world.scores(), (1, 1));
    }

    #[test]
    fn input_is_ignored_for_remote_players() {
        let mut world = World::new(ArenaParams::default(), [true, false]);

        world.apply_input(Team::Blue, &InputVector::new(1.0, 0.0, true));

        assert_eq!(world.player(Team::Blue).vx, 0.0);
        assert!(world.projectiles().is_empty());
    }

    #[test]
    fn shooting_spawns_a_local_projectile() {
        let mut world = world();
        assert!(world.apply_input(Team::Red, &InputVector::new(0.0, 0.0, true)));
        assert_eq!(world.projectiles().len(), 1);
        assert_eq!(world.projectiles()[0].team, Team::Red);
    }

    #[test]
    fn step_moves_players_and_aims_them() {
        let mut world = world();
        let start_x = world.player(Team::Red).x;
        world.apply_input(Team::Red, &InputVector::new(1.0, 0.0, false));

        world.step();

        let red = world.player(Team::Red);
        assert!(red.x > start_x);
        // RED sits left of the ball on the center line
        assert!(red.angle.abs() < 1e-6);
        assert!((world.player(Team::Blue).angle.abs() - std::f32::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn player_pinned_between_ball_and_wall_stays_on_the_field() {
        let mut world = world();
        let red = world.player_mut(Team::Red);
        red.x = red.radius;
        red.y = 100.0;
        let ball = world.ball_mut();
        ball.x = 30.0;
        ball.y = 100.0;

        world.step();

        let red = world.player(Team::Red);
        assert!(red.x >= red.radius, "red.x = {}", red.x);
        assert!(red.y >= red.radius);
    }

    #[test]
    fn winner_needs_the_target_score() {
        let mut world = world();
        assert_eq!(world.winner(), None);
        world.set_scores(4, 5);
        assert_eq!(world.winner(), Some(Team::Blue));
    }

    #[test]
    fn set_scores_reports_changes_only() {
        let mut world = world();
        assert!(world.set_scores(1, 0));
        assert!(!world.set_scores(1, 0));
    }

    #[test]
    fn reset_match_restores_the_kickoff() {
        let mut world = world();
        world.set_scores(3, 2);
        world.apply_input(Team::Red, &InputVector::new(1.0, 1.0, true));
        world.step();

        world.reset_match();

        assert_eq!(world.scores(), (0, 0));
        assert!(world.projectiles().is_empty());
        assert_eq!(world.player(Team::Red).x, world.params().width * 0.25);
        assert_eq!(world.ball().vx, 0.0);
    }

    proptest! {
        #[test]
        fn full_ticks_keep_players_inside_the_field(
            red in (0.0f32..800.0, 0.0f32..600.0),
            blue in (0.0f32..800.0, 0.0f32..600.0),
            ball in (15.0f32..785.0, 15.0f32..585.0, -40.0f32..40.0, -40.0f32..40.0),
            moves in proptest::collection::vec((-1.0f32..1.0, -1.0f32..1.0), 1..20),
        ) {
            let mut world = world();
            world.player_mut(Team::Red).x = red.0;
            world.player_mut(Team::Red).y = red.1;
            world.player_mut(Team::Blue).x = blue.0;
            world.player_mut(Team::Blue).y = blue.1;
            let b = world.ball_mut();
            b.x = ball.0;
            b.y = ball.1;
            b.vx = ball.2;
            b.vy = ball.3;

            for (mx, my) in moves {
                world.apply_input(Team::Red, &InputVector::new(mx, my, false));
                world.apply_input(Team::Blue, &InputVector::new(-mx, my, false));
                world.step();

                let params = *world.params();
                for team in Team::ALL {
                    let p = world.player(team);
                    prop_assert!(p.x >= p.radius && p.x <= params.width - p.radius);
                    prop_assert!(p.y >= p.radius && p.y <= params.height - p.radius);
                }
            }
        }
    }
}
