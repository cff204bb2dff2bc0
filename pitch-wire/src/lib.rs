//! Fixed-size wire structures for the metaserver/lobby/soccer UDP
//! protocols: one enum byte discriminates the payload at each receive
//! site, multi-byte integers are network order, and every datagram fits
//! in [`MAX_DATAGRAM_SIZE`] bytes.

mod addr;
mod error;
mod frame;
mod game_action;
mod lobby;
mod metaserver;

pub use addr::Addr;
pub use error::WireReadError;
pub use frame::{write_framed, Frame, FrameError};
pub use game_action::{GameAction, GameActionKind};
pub use lobby::{
    LobbyAction, LobbyHello, LobbyMemberInfo, LobbyQuery, LobbyQueryResponse, LobbyStart,
};
pub use metaserver::{MSAction, MetaserverHello, MetaserverResponse};

pub use pitch_wire_codec::{ReadError, StreamCodec};

/// Largest payload `UDP Socket::send` will transmit, matching the game's
/// fixed-size framing (spec §4.6/§6).
pub const MAX_DATAGRAM_SIZE: usize = 256;
