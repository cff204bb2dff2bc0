use std::convert::Infallible;

use nalgebra::Vector3;
use pitch_wire_codec::StreamCodec;

use crate::error::WireReadError;

/// One byte per player action; matches `Soccer::{z,x,c,v,f,s,m}_action`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum GameActionKind {
    Z,
    X,
    C,
    V,
    F,
    S,
    M,
}

impl StreamCodec for GameActionKind {
    type ReadError = WireReadError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, WireReadError> {
        let value = u8::read_from(r)?;
        match value {
            x if x == Self::Z as u8 => Ok(Self::Z),
            x if x == Self::X as u8 => Ok(Self::X),
            x if x == Self::C as u8 => Ok(Self::C),
            x if x == Self::V as u8 => Ok(Self::V),
            x if x == Self::F as u8 => Ok(Self::F),
            x if x == Self::S as u8 => Ok(Self::S),
            x if x == Self::M as u8 => Ok(Self::M),
            value => Err(WireReadError::InvalidDiscriminator { what: "GameActionKind", value }),
        }
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        (*self as u8).write_to(w)
    }
}

/// A single player input, sent client-to-server as `{kind, id: self, ..}`
/// and unused fields left at their defaults (spec §4.6). `dir` carries the
/// `x_action`/`f_action` heading, `dest` the `c_action`/`m_action` target.
#[derive(Clone, Copy, Debug)]
pub struct GameAction {
    pub kind: GameActionKind,
    pub id: i32,
    pub dir: f32,
    pub dest: Vector3<f32>,
}

impl StreamCodec for GameAction {
    type ReadError = WireReadError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, WireReadError> {
        let kind = GameActionKind::read_from(r)?;
        let id = i32::read_from(r)?;
        let dir = f32::read_from(r)?;
        let dest = Vector3::read_from(r)?;
        Ok(Self { kind, id, dir, dest })
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        self.kind.write_to(w)?;
        self.id.write_to(w)?;
        self.dir.write_to(w)?;
        self.dest.write_to(w)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let action = GameAction {
            kind: GameActionKind::C,
            id: 3,
            dir: 0.0,
            dest: Vector3::new(1.0, 2.0, 3.0),
        };
        let mut w = Vec::new();
        action.write_to(&mut w).unwrap();
        let mut r = &w[..];
        let decoded = GameAction::read_from(&mut r).unwrap();
        assert_eq!(decoded.kind, GameActionKind::C);
        assert_eq!(decoded.id, 3);
        assert_eq!(decoded.dest, action.dest);
        assert!(r.is_empty());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let mut r: &[u8] = &[0xff];
        assert!(matches!(
            GameActionKind::read_from(&mut r),
            Err(WireReadError::InvalidDiscriminator { .. })
        ));
    }
}
