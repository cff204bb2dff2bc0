//! The capability trait shared by local UI input, a scripted AI, and the
//! networked server/remote adapters (`pitch-soccer-net`). The authoritative
//! path never branches on which kind of `Intelligence` it's talking to.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nalgebra::Vector3;

use crate::soccer::Soccer;

/// One player's action surface. Implementors never need to validate the
/// target player id or current lockouts themselves -- `Soccer`'s action
/// handlers silently no-op on an inactive or locked-out id (spec §7).
pub trait Intelligence: Send {
    fn z_action(&self);
    fn x_action(&self, dir: f32);
    fn c_action(&self, dest: Vector3<f32>);
    fn v_action(&self);
    fn f_action(&self, dir: f32);
    fn s_action(&self);
    fn m_action(&self, dest: Vector3<f32>);

    /// Signals this participant is leaving the match.
    fn leave(&self);
    /// Per-tick adapter housekeeping (flushing outbound packets, checking
    /// connection deadlines). Never advances `Soccer` itself -- that's
    /// the server main loop's job via `Soccer::idle`.
    fn idle(&self, t: f32);
    fn has_quit(&self) -> bool;
}

/// Direct, same-process dispatch into a `Soccer` instance: used on the
/// authoritative server for its own players, and for any purely local
/// (non-networked) AI.
pub struct LocalIntelligence {
    soccer: Arc<Soccer>,
    player_id: i32,
    quit: AtomicBool,
}

impl LocalIntelligence {
    pub fn new(soccer: Arc<Soccer>, player_id: i32) -> Self {
        Self {
            soccer,
            player_id,
            quit: AtomicBool::new(false),
        }
    }

    pub fn player_id(&self) -> i32 {
        self.player_id
    }
}

impl Intelligence for LocalIntelligence {
    fn z_action(&self) {
        self.soccer.z_action(self.player_id);
    }

    fn x_action(&self, dir: f32) {
        self.soccer.x_action(self.player_id, dir);
    }

    fn c_action(&self, dest: Vector3<f32>) {
        self.soccer.c_action(self.player_id, dest);
    }

    fn v_action(&self) {
        self.soccer.v_action(self.player_id);
    }

    fn f_action(&self, dir: f32) {
        self.soccer.f_action(self.player_id, dir);
    }

    fn s_action(&self) {
        self.soccer.s_action(self.player_id);
    }

    fn m_action(&self, dest: Vector3<f32>) {
        self.soccer.m_action(self.player_id, dest);
    }

    fn leave(&self) {
        self.quit.store(true, Ordering::SeqCst);
    }

    fn idle(&self, _t: f32) {}

    fn has_quit(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }
}
