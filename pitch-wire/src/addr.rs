use std::convert::Infallible;
use std::net::SocketAddrV4;

use pitch_wire_codec::{ReadError, StreamCodec};

/// `(ip, port)` pair used as a lobby/metaserver key. Value equality, no
/// hostname resolution -- addresses arrive already resolved from the
/// socket layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Addr {
    pub ip: u32,
    pub port: u16,
}

impl Addr {
    pub const UNSPECIFIED: Addr = Addr { ip: 0, port: 0 };

    pub fn is_unspecified(&self) -> bool {
        *self == Self::UNSPECIFIED
    }
}

impl From<SocketAddrV4> for Addr {
    fn from(addr: SocketAddrV4) -> Self {
        Self {
            ip: u32::from(*addr.ip()),
            port: addr.port(),
        }
    }
}

impl From<Addr> for SocketAddrV4 {
    fn from(addr: Addr) -> Self {
        SocketAddrV4::new(addr.ip.into(), addr.port)
    }
}

impl StreamCodec for Addr {
    type ReadError = ReadError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, ReadError> {
        let ip = u32::read_from(r)?;
        let port = u16::read_from(r)?;
        Ok(Self { ip, port })
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        self.ip.write_to(w)?;
        self.port.write_to(w)?;
        Ok(())
    }
}
