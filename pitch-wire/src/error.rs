use pitch_wire_codec::{ReadError, ReadStringError};
use thiserror::Error;

/// Spec §6: receivers must validate a packet's discriminator byte lies in
/// the declared enum range before treating the datagram as a given
/// struct; anything else (unknown discriminator, truncated payload, bad
/// ASCII) is dropped rather than propagated.
#[derive(Debug, Error)]
pub enum WireReadError {
    #[error("{0}")]
    Codec(#[from] ReadError),

    #[error("{0}")]
    String(#[from] ReadStringError),

    #[error("invalid {what} discriminator: 0x{value:02x}")]
    InvalidDiscriminator { what: &'static str, value: u8 },
}
