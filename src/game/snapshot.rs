//! Snapshot emission gating, building and application

use std::time::{Duration, Instant};

use tracing::warn;

use super::authority::{AuthorityTable, Field, Role};
use super::entity::Team;
use super::world::World;
use crate::net::protocol::{BallState, PeerMsg, PlayerState};

/// Decides when the sync timer may actually emit
///
/// The timer can fire more often than the cadence; the gate enforces a
/// minimum gap between two emissions.
#[derive(Debug, Clone)]
pub struct SyncGate {
    min_gap: Duration,
    last_emit: Option<Instant>,
    next_seq: u64,
    forced: bool,
}

impl SyncGate {
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            last_emit: None,
            next_seq: 1,
            forced: false,
        }
    }

    /// Sequence number for an emission at `now`, or `None` if too soon
    pub fn try_emit(&mut self, now: Instant) -> Option<u64> {
        let due = self.forced
            || self
                .last_emit
                .map_or(true, |last| now.saturating_duration_since(last) >= self.min_gap);
        if !due {
            return None;
        }

        self.forced = false;
        self.last_emit = Some(now);
        let seq = self.next_seq;
        self.next_seq += 1;
        Some(seq)
    }

    /// Let the next emission through regardless of the gap (used for final state)
    pub fn force_next(&mut self) {
        self.forced = true;
    }
}

/// Builds the message this peer owes the other one
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Host: full state with its own player as `opponent`. Guest: its own player.
    pub fn build(world: &World, authority: &AuthorityTable, seq: u64) -> Option<PeerMsg> {
        let role = authority.role()?;
        let own = world.player(role.local_team());

        match role {
            Role::Host => {
                debug_assert!(authority.owns(Field::Ball) && authority.owns(Field::Scores));
                let (red_score, blue_score) = world.scores();
                Some(PeerMsg::State {
                    ball: BallState::from(world.ball()),
                    opponent: PlayerState::from(own),
                    red_score,
                    blue_score,
                    seq: Some(seq),
                })
            }
            Role::Guest => Some(PeerMsg::player(PlayerState::from(own), Some(seq))),
        }
    }
}

/// Result of applying one incoming message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Mirrors overwritten
    Snapped { scores_changed: bool },
    /// Sequence number not newer than the last applied one
    Stale,
    /// This peer does not mirror what the message carries
    Ignored,
}

/// Overwrites mirrored fields from incoming messages, last message wins
#[derive(Debug, Clone, Default)]
pub struct SnapshotApplier {
    last_seq: Option<u64>,
}

impl SnapshotApplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, world: &mut World, authority: &AuthorityTable, msg: &PeerMsg) -> Applied {
        let Some(remote_team) = authority.role().map(mirrored_team) else {
            return Applied::Ignored;
        };

        let mirrors = match msg {
            PeerMsg::State { .. } => {
                authority.mirrors(Field::Ball)
                    && authority.mirrors(Field::Scores)
                    && authority.mirrors(Field::Player(remote_team))
            }
            PeerMsg::Player { .. } => authority.mirrors(Field::Player(remote_team)),
        };
        if !mirrors {
            warn!(kind = msg.kind(), "Ignoring message for fields this peer owns");
            return Applied::Ignored;
        }

        if let Some(seq) = msg.seq() {
            if self.last_seq.is_some_and(|last| seq <= last) {
                return Applied::Stale;
            }
            self.last_seq = Some(seq);
        }

        match msg {
            PeerMsg::State {
                ball,
                opponent,
                red_score,
                blue_score,
                ..
            } => {
                ball.write_to(world.ball_mut());
                opponent.write_to(world.player_mut(remote_team));
                let scores_changed = world.set_scores(*red_score, *blue_score);
                Applied::Snapped { scores_changed }
            }
            PeerMsg::Player {
                x,
                y,
                vx,
                vy,
                angle,
                ..
            } => {
                let state = PlayerState {
                    x: *x,
                    y: *y,
                    vx: *vx,
                    vy: *vy,
                    angle: *angle,
                };
                state.write_to(world.player_mut(remote_team));
                Applied::Snapped {
                    scores_changed: false,
                }
            }
        }
    }
}

/// Sync traffic counters for the teardown log
#[derive(Debug, Default, Clone, Copy)]
pub struct SnapshotStats {
    pub sent: u64,
    pub sent_bytes: u64,
    pub applied: u64,
    pub stale: u64,
    pub rejected: u64,
}

impl SnapshotStats {
    pub fn record_sent(&mut self, bytes: usize) {
        self.sent += 1;
        self.sent_bytes += bytes as u64;
    }

    pub fn record_applied(&mut self, applied: Applied) {
        match applied {
            Applied::Snapped { .. } => self.applied += 1,
            Applied::Stale => self.stale += 1,
            Applied::Ignored => self.rejected += 1,
        }
    }

    /// Average emitted frame size
    pub fn avg_frame_bytes(&self) -> u64 {
        self.sent_bytes.checked_div(self.sent).unwrap_or(0)
    }
}

/// The team a peer's incoming `opponent` lands on
pub fn mirrored_team(role: Role) -> Team {
    role.peer().local_team()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::physics::ArenaParams;

    fn worlds() -> (World, AuthorityTable, World, AuthorityTable) {
        let host_auth = AuthorityTable::networked(Role::Host);
        let guest_auth = AuthorityTable::networked(Role::Guest);
        let params = ArenaParams::default();
        (
            World::new(params, host_auth.local_players()),
            host_auth,
            World::new(params, guest_auth.local_players()),
            guest_auth,
        )
    }

    #[test]
    fn gate_enforces_minimum_gap() {
        let start = Instant::now();
        let mut gate = SyncGate::new(Duration::from_millis(80));

        assert_eq!(gate.try_emit(start), Some(1));
        assert_eq!(gate.try_emit(start + Duration::from_millis(30)), None);
        assert_eq!(gate.try_emit(start + Duration::from_millis(80)), Some(2));

        gate.force_next();
        assert_eq!(gate.try_emit(start + Duration::from_millis(81)), Some(3));
        assert_eq!(gate.try_emit(start + Duration::from_millis(82)), None);
    }

    #[test]
    fn host_sends_its_own_player_as_opponent() {
        let (mut host, host_auth, _, _) = worlds();
        host.player_mut(Team::Red).x = 123.0;
        host.set_scores(2, 3);

        let msg = SnapshotBuilder::build(&host, &host_auth, 9).unwrap();

        match msg {
            PeerMsg::State {
                opponent,
                red_score,
                blue_score,
                seq,
                ..
            } => {
                assert_eq!(opponent.x, 123.0);
                assert_eq!((red_score, blue_score), (2, 3));
                assert_eq!(seq, Some(9));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn guest_sends_only_its_player() {
        let (_, _, guest, guest_auth) = worlds();
        let msg = SnapshotBuilder::build(&guest, &guest_auth, 1).unwrap();
        assert_eq!(msg.kind(), "player");
    }

    #[test]
    fn single_device_builds_nothing() {
        let world = World::new(ArenaParams::default(), [true, true]);
        assert!(SnapshotBuilder::build(&world, &AuthorityTable::single_device(), 1).is_none());
    }

    #[test]
    fn applying_the_same_state_twice_is_idempotent() {
        let (mut host, host_auth, mut guest, guest_auth) = worlds();
        host.ball_mut().vx = 4.0;
        host.player_mut(Team::Red).y = 77.0;
        host.set_scores(1, 0);
        // Baseline senders omit the sequence number
        let mut msg = SnapshotBuilder::build(&host, &host_auth, 1).unwrap();
        if let PeerMsg::State { seq, .. } = &mut msg {
            *seq = None;
        }
        let mut applier = SnapshotApplier::new();

        let first = applier.apply(&mut guest, &guest_auth, &msg);
        let after_first = (
            guest.ball().clone(),
            guest.player(Team::Red).clone(),
            guest.scores(),
        );
        let second = applier.apply(&mut guest, &guest_auth, &msg);

        assert_eq!(first, Applied::Snapped { scores_changed: true });
        assert_eq!(second, Applied::Snapped { scores_changed: false });
        assert_eq!(guest.ball(), &after_first.0);
        assert_eq!(guest.player(Team::Red), &after_first.1);
        assert_eq!(guest.scores(), (1, 0));
        assert_eq!(guest.ball().vx, 4.0);
        assert_eq!(guest.player(Team::Red).y, 77.0);
    }

    #[test]
    fn stale_sequence_numbers_are_dropped() {
        let (mut host, host_auth, mut guest, guest_auth) = worlds();
        let mut applier = SnapshotApplier::new();
        let newer = SnapshotBuilder::build(&host, &host_auth, 5).unwrap();
        host.ball_mut().x = 10.0;
        let older = SnapshotBuilder::build(&host, &host_auth, 4).unwrap();

        assert!(matches!(applier.apply(&mut guest, &guest_auth, &newer), Applied::Snapped { .. }));
        assert_eq!(applier.apply(&mut guest, &guest_auth, &older), Applied::Stale);
        assert_eq!(guest.ball().x, host.params().width / 2.0);
    }

    #[test]
    fn host_never_applies_state() {
        let (mut host, host_auth, _, _) = worlds();
        let mut foreign = World::new(ArenaParams::default(), [true, false]);
        foreign.ball_mut().x = 1.0;
        let msg = SnapshotBuilder::build(&foreign, &host_auth, 1).unwrap();

        let mut applier = SnapshotApplier::new();
        assert_eq!(applier.apply(&mut host, &host_auth, &msg), Applied::Ignored);
        assert_eq!(host.ball().x, host.params().width / 2.0);
    }

    #[test]
    fn host_mirrors_the_guest_player() {
        let (mut host, host_auth, mut guest, guest_auth) = worlds();
        guest.player_mut(Team::Blue).x = 640.0;
        guest.player_mut(Team::Blue).angle = 1.0;
        let msg = SnapshotBuilder::build(&guest, &guest_auth, 1).unwrap();

        let mut applier = SnapshotApplier::new();
        applier.apply(&mut host, &host_auth, &msg);

        assert_eq!(host.player(Team::Blue).x, 640.0);
        assert_eq!(host.player(Team::Blue).angle, 1.0);
        assert_eq!(mirrored_team(Role::Host), Team::Blue);
    }
}
