use std::convert::Infallible;

use pitch_wire_codec::{FixedAsciiString, StreamCodec};

use crate::addr::Addr;
use crate::error::WireReadError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MSAction {
    Hello,
    HostGame,
    UnhostGame,
}

impl StreamCodec for MSAction {
    type ReadError = WireReadError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, WireReadError> {
        let value = u8::read_from(r)?;
        match value {
            x if x == Self::Hello as u8 => Ok(Self::Hello),
            x if x == Self::HostGame as u8 => Ok(Self::HostGame),
            x if x == Self::UnhostGame as u8 => Ok(Self::UnhostGame),
            value => Err(WireReadError::InvalidDiscriminator { what: "MSAction", value }),
        }
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        (*self as u8).write_to(w)
    }
}

/// Sent by a lobby server to subscribe, or to advertise/retract a hosted
/// game (`HostGame`/`UnhostGame` with this server's own name).
#[derive(Clone, Debug)]
pub struct MetaserverHello {
    pub action: MSAction,
    pub name: FixedAsciiString<30>,
}

impl StreamCodec for MetaserverHello {
    type ReadError = WireReadError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, WireReadError> {
        let action = MSAction::read_from(r)?;
        let name = FixedAsciiString::read_from(r)?;
        Ok(Self { action, name })
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        self.action.write_to(w)?;
        self.name.write_to(w)?;
        Ok(())
    }
}

/// Broadcast by the metaserver to every subscriber on a `HostGame`/
/// `UnhostGame` event.
#[derive(Clone, Debug)]
pub struct MetaserverResponse {
    pub action: MSAction,
    pub host: Addr,
    pub name: FixedAsciiString<30>,
}

impl StreamCodec for MetaserverResponse {
    type ReadError = WireReadError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, WireReadError> {
        let action = MSAction::read_from(r)?;
        let host = Addr::read_from(r)?;
        let name = FixedAsciiString::read_from(r)?;
        Ok(Self { action, host, name })
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        self.action.write_to(w)?;
        self.host.write_to(w)?;
        self.name.write_to(w)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_round_trip() {
        let hello = MetaserverHello {
            action: MSAction::Hello,
            name: FixedAsciiString::new("").unwrap(),
        };
        let mut w = Vec::new();
        hello.write_to(&mut w).unwrap();
        let mut r = &w[..];
        let decoded = MetaserverHello::read_from(&mut r).unwrap();
        assert_eq!(decoded.action, MSAction::Hello);
        assert!(r.is_empty());
    }

    #[test]
    fn response_round_trip() {
        let response = MetaserverResponse {
            action: MSAction::HostGame,
            host: Addr { ip: 0x0a000001, port: 1234 },
            name: FixedAsciiString::new("arena").unwrap(),
        };
        let mut w = Vec::new();
        response.write_to(&mut w).unwrap();
        let mut r = &w[..];
        let decoded = MetaserverResponse::read_from(&mut r).unwrap();
        assert_eq!(decoded.host, response.host);
        assert_eq!(decoded.name.as_str(), "arena");
    }

    #[test]
    fn unknown_discriminator_is_rejected() {
        let mut r: &[u8] = &[0xff];
        assert!(matches!(
            MSAction::read_from(&mut r),
            Err(WireReadError::InvalidDiscriminator { .. })
        ));
    }
}
