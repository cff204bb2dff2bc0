use std::convert::Infallible;

use pitch_wire_codec::StreamCodec;

use crate::addr::Addr;
use crate::error::WireReadError;

/// Discriminator shared by every lobby datagram. `QueryResponse` isn't
/// named as a field in the distilled struct table but every datagram
/// still needs a leading discriminator byte (spec §6), so
/// `LobbyQueryResponse` carries it explicitly like its siblings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LobbyAction {
    Connect,
    Disconnect,
    Nothing,
    Unhost,
    Query,
    QueryResponse,
    Start,
}

impl StreamCodec for LobbyAction {
    type ReadError = WireReadError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, WireReadError> {
        let value = u8::read_from(r)?;
        match value {
            x if x == Self::Connect as u8 => Ok(Self::Connect),
            x if x == Self::Disconnect as u8 => Ok(Self::Disconnect),
            x if x == Self::Nothing as u8 => Ok(Self::Nothing),
            x if x == Self::Unhost as u8 => Ok(Self::Unhost),
            x if x == Self::Query as u8 => Ok(Self::Query),
            x if x == Self::QueryResponse as u8 => Ok(Self::QueryResponse),
            x if x == Self::Start as u8 => Ok(Self::Start),
            value => Err(WireReadError::InvalidDiscriminator { what: "LobbyAction", value }),
        }
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        (*self as u8).write_to(w)
    }
}

/// `CONNECT`/`DISCONNECT`/`NOTHING`/`UNHOST` -- the lobby heartbeat and
/// join/leave payload. `action` is not constrained to this subset by the
/// type system; handlers ignore actions they don't expect (spec §4.9:
/// "other lobby actions ignored").
#[derive(Clone, Copy, Debug)]
pub struct LobbyHello {
    pub action: LobbyAction,
}

impl StreamCodec for LobbyHello {
    type ReadError = WireReadError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, WireReadError> {
        Ok(Self { action: LobbyAction::read_from(r)? })
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        self.action.write_to(w)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LobbyQuery {
    pub target: Addr,
}

impl StreamCodec for LobbyQuery {
    type ReadError = WireReadError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, WireReadError> {
        let _action = LobbyAction::read_from(r)?;
        let target = Addr::read_from(r)?;
        Ok(Self { target })
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        LobbyAction::Query.write_to(w)?;
        self.target.write_to(w)?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LobbyMemberInfo {
    pub index: i8,
    pub intelligence_kind: i8,
    pub team: i8,
}

impl StreamCodec for LobbyMemberInfo {
    type ReadError = WireReadError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, WireReadError> {
        let index = i8::read_from(r)?;
        let intelligence_kind = i8::read_from(r)?;
        let team = i8::read_from(r)?;
        Ok(Self { index, intelligence_kind, team })
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        self.index.write_to(w)?;
        self.intelligence_kind.write_to(w)?;
        self.team.write_to(w)?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LobbyQueryResponse {
    pub target: Addr,
    pub active: bool,
    pub info: LobbyMemberInfo,
}

impl StreamCodec for LobbyQueryResponse {
    type ReadError = WireReadError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, WireReadError> {
        let _action = LobbyAction::read_from(r)?;
        let target = Addr::read_from(r)?;
        let active = i8::read_from(r)? != 0;
        let info = LobbyMemberInfo::read_from(r)?;
        Ok(Self { target, active, info })
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        LobbyAction::QueryResponse.write_to(w)?;
        self.target.write_to(w)?;
        (self.active as i8).write_to(w)?;
        self.info.write_to(w)?;
        Ok(())
    }
}

/// Sent by the lobby server to every non-host member exactly once on
/// `action_start` (spec §8 scenario 3).
#[derive(Clone, Copy, Debug)]
pub struct LobbyStart {
    pub index: i8,
    pub team1: i8,
    pub team2: i8,
}

impl StreamCodec for LobbyStart {
    type ReadError = WireReadError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, WireReadError> {
        let _action = LobbyAction::read_from(r)?;
        let index = i8::read_from(r)?;
        let team1 = i8::read_from(r)?;
        let team2 = i8::read_from(r)?;
        Ok(Self { index, team1, team2 })
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        LobbyAction::Start.write_to(w)?;
        self.index.write_to(w)?;
        self.team1.write_to(w)?;
        self.team2.write_to(w)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_round_trip() {
        let hello = LobbyHello { action: LobbyAction::Connect };
        let mut w = Vec::new();
        hello.write_to(&mut w).unwrap();
        let mut r = &w[..];
        let decoded = LobbyHello::read_from(&mut r).unwrap();
        assert_eq!(decoded.action, LobbyAction::Connect);
    }

    #[test]
    fn query_response_round_trip() {
        let response = LobbyQueryResponse {
            target: Addr { ip: 1, port: 2 },
            active: true,
            info: LobbyMemberInfo { index: 1, intelligence_kind: 0, team: 1 },
        };
        let mut w = Vec::new();
        response.write_to(&mut w).unwrap();
        assert_eq!(w[0], LobbyAction::QueryResponse as u8);
        let mut r = &w[..];
        let decoded = LobbyQueryResponse::read_from(&mut r).unwrap();
        assert_eq!(decoded.target, response.target);
        assert!(decoded.active);
        assert_eq!(decoded.info, response.info);
    }

    #[test]
    fn start_round_trip() {
        let start = LobbyStart { index: 2, team1: 3, team2: 2 };
        let mut w = Vec::new();
        start.write_to(&mut w).unwrap();
        let mut r = &w[..];
        let decoded = LobbyStart::read_from(&mut r).unwrap();
        assert_eq!(decoded.index, 2);
        assert_eq!(decoded.team1, 3);
        assert_eq!(decoded.team2, 2);
    }
}
