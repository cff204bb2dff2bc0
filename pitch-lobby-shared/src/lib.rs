//! The `Lobby` membership model shared by `pitch-lobby-server` and
//! `pitch-lobby-client` (spec §3 "Lobby membership", §4.9, §4.10) --
//! mirroring the teacher's `dungeon-vr-connection-shared` role of holding
//! the types both sides of an actor pair need, without any actor logic of
//! its own.

use std::collections::HashMap;

use pitch_wire::Addr;

/// Which of the two team slots a participant occupies; matches `Player`'s
/// team bit in `pitch-sim` (RED=0, BLUE=1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i8)]
pub enum Team {
    Red = 0,
    Blue = 1,
}

/// What's driving a participant's in-match actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i8)]
pub enum IntelligenceKind {
    Server = 0,
    Remote = 1,
    LocalAi = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Member {
    pub index: i8,
    pub intelligence_kind: IntelligenceKind,
    pub team: Team,
}

/// Mapping from participant `Addr` to membership info. A member's index is
/// the member count at the moment they're added, so indices are reused once
/// membership drops below a previously-issued value.
#[derive(Debug, Default)]
pub struct Lobby {
    members: HashMap<Addr, Member>,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserved key for the host participant, who has no real socket
    /// address of their own.
    pub fn host_addr() -> Addr {
        Addr::UNSPECIFIED
    }

    pub fn get(&self, addr: &Addr) -> Option<&Member> {
        self.members.get(addr)
    }

    pub fn contains(&self, addr: &Addr) -> bool {
        self.members.contains_key(addr)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Addr, &Member)> {
        self.members.iter()
    }

    fn team_counts(&self) -> (usize, usize) {
        let mut red = 0;
        let mut blue = 0;
        for member in self.members.values() {
            match member.team {
                Team::Red => red += 1,
                Team::Blue => blue += 1,
            }
        }
        (red, blue)
    }

    /// `action_join`: adds `addr` on whichever team currently has fewer
    /// members, breaking ties toward red. No-op (returns the existing
    /// entry) if `addr` is already a member.
    pub fn add(&mut self, addr: Addr, intelligence_kind: IntelligenceKind) -> Member {
        if let Some(existing) = self.members.get(&addr) {
            return *existing;
        }
        let (red, blue) = self.team_counts();
        let team = if red <= blue { Team::Red } else { Team::Blue };
        let member = Member { index: self.members.len() as i8, intelligence_kind, team };
        self.members.insert(addr, member);
        member
    }

    /// `action_kick`: removes `addr`, returning its prior membership entry.
    pub fn remove(&mut self, addr: &Addr) -> Option<Member> {
        self.members.remove(addr)
    }
}

/// Recorded by `LobbyClient` on `lobby_start`, identifying this
/// participant's seat in the match about to begin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameMaker {
    pub index: i8,
    pub team1: i8,
    pub team2: i8,
}

/// Shared `DEFAULT -> STARTED | QUIT` state machine; terminal states fire
/// exactly one outbound broadcast (spec §4.9).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LobbyState {
    #[default]
    Default,
    Started,
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_balances_teams() {
        let mut lobby = Lobby::new();
        let a = lobby.add(Addr { ip: 1, port: 1 }, IntelligenceKind::Remote);
        let b = lobby.add(Addr { ip: 2, port: 2 }, IntelligenceKind::Remote);
        assert_eq!(a.team, Team::Red);
        assert_eq!(b.team, Team::Blue);
        assert_eq!(a.index, 0);
        assert_eq!(b.index, 1);
    }

    #[test]
    fn indices_are_reused_after_removal() {
        let mut lobby = Lobby::new();
        let addr1 = Addr { ip: 1, port: 1 };
        lobby.add(addr1, IntelligenceKind::Remote);
        lobby.remove(&addr1);
        let c = lobby.add(Addr { ip: 3, port: 3 }, IntelligenceKind::Remote);
        assert_eq!(c.index, 0);
    }

    #[test]
    fn readding_an_existing_member_is_a_no_op() {
        let mut lobby = Lobby::new();
        let addr = Addr { ip: 1, port: 1 };
        let first = lobby.add(addr, IntelligenceKind::Remote);
        let second = lobby.add(addr, IntelligenceKind::LocalAi);
        assert_eq!(first, second);
    }
}
