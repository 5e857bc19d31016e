//! Session roles and per-field write authority
//!
//! Both roles run the same simulation. What differs is which fields a peer
//! owns (and sends) and which it mirrors (and overwrites from the wire).

use serde::Serialize;

use super::entity::Team;

/// Peer role, fixed for the lifetime of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Accepted the connection; owns the ball and both scores
    Host,
    /// Initiated the connection; mirrors the host
    Guest,
}

impl Role {
    /// The accepting side of a connection hosts
    pub fn for_connection(accepted: bool) -> Self {
        if accepted {
            Role::Host
        } else {
            Role::Guest
        }
    }

    /// Team whose player this role drives in a networked session
    pub fn local_team(self) -> Team {
        match self {
            Role::Host => Team::Red,
            Role::Guest => Team::Blue,
        }
    }

    pub fn peer(self) -> Role {
        match self {
            Role::Host => Role::Guest,
            Role::Guest => Role::Host,
        }
    }
}

/// Whether a peer link exists at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// No session yet
    Waiting,
    /// Both players on this device, nothing to sync
    SingleDevice,
    /// Two peers over a link
    Networked,
}

/// A group of state with a single writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Ball,
    Scores,
    Player(Team),
}

/// Answers "who writes this field" for one peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorityTable {
    mode: GameMode,
    role: Option<Role>,
}

impl AuthorityTable {
    pub fn single_device() -> Self {
        Self {
            mode: GameMode::SingleDevice,
            role: None,
        }
    }

    pub fn networked(role: Role) -> Self {
        Self {
            mode: GameMode::Networked,
            role: Some(role),
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Owning role for a field; `None` when there is no peer
    pub fn writer(&self, field: Field) -> Option<Role> {
        if self.mode != GameMode::Networked {
            return None;
        }
        Some(match field {
            Field::Ball | Field::Scores => Role::Host,
            Field::Player(team) => {
                if team == Role::Host.local_team() {
                    Role::Host
                } else {
                    Role::Guest
                }
            }
        })
    }

    /// This peer is the source of truth for `field`
    pub fn owns(&self, field: Field) -> bool {
        match (self.writer(field), self.role) {
            (None, _) => self.mode == GameMode::SingleDevice,
            (Some(writer), Some(role)) => writer == role,
            (Some(_), None) => false,
        }
    }

    /// This peer overwrites `field` from incoming messages
    pub fn mirrors(&self, field: Field) -> bool {
        match (self.writer(field), self.role) {
            (Some(writer), Some(role)) => writer != role,
            _ => false,
        }
    }

    /// Players driven by live input on this peer, indexed by `Team::index`
    pub fn local_players(&self) -> [bool; 2] {
        match self.mode {
            GameMode::SingleDevice => [true, true],
            GameMode::Networked => Team::ALL.map(|team| self.owns(Field::Player(team))),
            GameMode::Waiting => [false, false],
        }
    }

    /// A sync protocol instance runs only between two peers
    pub fn runs_sync(&self) -> bool {
        self.mode == GameMode::Networked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepting_peer_hosts_red() {
        assert_eq!(Role::for_connection(true), Role::Host);
        assert_eq!(Role::for_connection(false), Role::Guest);
        assert_eq!(Role::Host.local_team(), Team::Red);
        assert_eq!(Role::Guest.local_team(), Team::Blue);
    }

    #[test]
    fn host_owns_ball_scores_and_red() {
        let host = AuthorityTable::networked(Role::Host);
        assert!(host.owns(Field::Ball));
        assert!(host.owns(Field::Scores));
        assert!(host.owns(Field::Player(Team::Red)));
        assert!(host.mirrors(Field::Player(Team::Blue)));
        assert!(!host.mirrors(Field::Ball));
        assert_eq!(host.local_players(), [true, false]);
    }

    #[test]
    fn guest_mirrors_everything_but_blue() {
        let guest = AuthorityTable::networked(Role::Guest);
        assert!(guest.mirrors(Field::Ball));
        assert!(guest.mirrors(Field::Scores));
        assert!(guest.mirrors(Field::Player(Team::Red)));
        assert!(guest.owns(Field::Player(Team::Blue)));
        assert_eq!(guest.local_players(), [false, true]);
    }

    #[test]
    fn single_device_owns_everything_without_sync() {
        let local = AuthorityTable::single_device();
        assert!(!local.runs_sync());
        assert_eq!(local.writer(Field::Ball), None);
        assert!(local.owns(Field::Scores));
        assert!(!local.mirrors(Field::Ball));
        assert_eq!(local.local_players(), [true, true]);
    }
}
