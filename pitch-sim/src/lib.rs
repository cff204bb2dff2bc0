//! Deterministic, tick-driven soccer simulation: kinematics (`unit`), ball
//! and player state machines, the authoritative `Soccer` possession
//! contest and action handlers, and the `Intelligence` capability trait
//! that the networking crates implement to drive it remotely.

pub mod ball;
pub mod intelligence;
pub mod player;
pub mod soccer;
pub mod unit;

pub use ball::Ball;
pub use intelligence::{Intelligence, LocalIntelligence};
pub use player::{Player, PlayerConstants};
pub use soccer::{GameState, MatchConfig, PitchDimensions, Snapshot, Soccer};
pub use unit::Unit;
