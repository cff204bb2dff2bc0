//! Per-player state: team, movement/jump/slide/pass cooldowns, and the
//! tackle scoring function (`get_control_potential`) that drives `Soccer`'s
//! possession contest.

use nalgebra::Vector3;
use pitch_timer::{Timer, TimerKey};

use crate::ball::{Ball, CANT_INTERACT_SHOT};
use crate::unit::Unit;

pub const RED: u8 = 0;
pub const BLUE: u8 = 1;

pub const CANT_HOLD_BALL_SHOT: f32 = 0.3;
pub const CANT_HOLD_BALL_DISPOSSESS: f32 = 0.5;
pub const SLOWDOWN_SHOT: f32 = 0.4;
pub const SLOWDOWN_SLID: f32 = 0.6;

const PASS_COOLDOWN: f32 = 0.3;
const SLIDE_COOLDOWN: f32 = 1.0;
const JUMP_RELOAD: f32 = 0.8;

/// Which cooldown duration to apply to a player's "can't hold the ball" or
/// slowdown timer.
#[derive(Clone, Copy, Debug)]
pub enum DispossessKind {
    Shot,
    Dispossess,
}

#[derive(Clone, Copy, Debug)]
pub enum SlowdownKind {
    Shot,
    Slid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Key {
    CurrentTime,
    LastPass,
    LastSlide,
    LastJump,
    CantHoldBall,
    Slowdown,
}

impl TimerKey for Key {
    const CURRENT_TIME: Self = Key::CurrentTime;
}

#[derive(Clone, Debug)]
pub struct PlayerConstants {
    pub running_speed: f32,
    pub slide_speed: f32,
    pub slide_duration: f32,
    pub jump_reload: f32,
    pub control_range: f32,
    /// Deceleration applied to a jump's vertical speed; also derives a
    /// jump's total airtime (`2 * vertical_speed / gravity`), matching the
    /// ball's own vertical integration.
    pub gravity: f32,
}

impl Default for PlayerConstants {
    fn default() -> Self {
        Self {
            running_speed: 5.0,
            slide_speed: 9.0,
            slide_duration: 0.4,
            jump_reload: JUMP_RELOAD,
            control_range: 1.2,
            gravity: 0.0069,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Jump {
    elapsed: f32,
    duration: f32,
}

#[derive(Clone, Debug)]
pub struct Player {
    id: i32,
    pub team: u8,
    pub unit: Unit,
    /// Distance in front of the player, along `unit.facing`, that the ball
    /// sits at while they hold possession.
    pub possession_offset: f32,
    pub constants: PlayerConstants,
    jump: Option<Jump>,
    slide_vec: Option<(Vector3<f32>, f32)>,
    timer: Timer<Key>,
}

impl Player {
    pub fn new(id: i32, team: u8, pos: Vector3<f32>, constants: PlayerConstants) -> Self {
        let running_speed = constants.running_speed;
        Self {
            id,
            team,
            unit: Unit::new(pos, running_speed, 6.0),
            possession_offset: 0.4,
            constants,
            jump: None,
            slide_vec: None,
            timer: Timer::new(),
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn is_owner(&self, ball: &Ball) -> bool {
        ball.owner() == self.id
    }

    pub fn is_jumping(&self) -> bool {
        self.jump.is_some()
    }

    pub fn is_going_up(&self) -> bool {
        matches!(self.jump, Some(j) if j.elapsed < j.duration / 2.0)
    }

    pub fn is_sliding(&self) -> bool {
        self.slide_vec.is_some()
    }

    /// Sliding with enough speed left that a tackle still dispossesses the
    /// ball owner with a slowdown, rather than brushing past harmlessly.
    pub fn is_sliding_fast(&self) -> bool {
        match self.slide_vec {
            Some((vec, _)) => vec.norm() > self.constants.slide_speed * 0.5,
            None => false,
        }
    }

    pub fn can_pass(&self) -> bool {
        self.timer.timed_out(Key::LastPass)
    }

    pub fn can_slide(&self) -> bool {
        self.timer.timed_out(Key::LastSlide) && !self.is_sliding() && !self.is_jumping()
    }

    pub fn can_jump(&self) -> bool {
        self.timer.timed_out(Key::LastJump) && !self.is_jumping()
    }

    pub fn can_hold_ball(&self) -> bool {
        self.timer.timed_out(Key::CantHoldBall)
    }

    pub fn possession_point(&self) -> Vector3<f32> {
        let dir = Vector3::new(self.unit.facing.cos(), self.unit.facing.sin(), 0.0);
        self.unit.pos + dir * self.possession_offset
    }

    /// Distance-like tackle score in `[0, control_range]`, or `NaN` if this
    /// player cannot contest the ball right now (locked out, or out of
    /// range).
    pub fn get_control_potential(&self, ball: &Ball) -> f32 {
        if !self.can_hold_ball() {
            return f32::NAN;
        }
        if self.is_sliding() {
            return f32::NAN;
        }
        let offset = self.possession_point() - ball.unit.pos;
        let dist = (offset.x * offset.x + offset.y * offset.y + offset.z * offset.z).sqrt();
        if dist > self.constants.control_range {
            return f32::NAN;
        }
        dist
    }

    pub fn timestamp_got_ball(&mut self) {
        self.timer.set_event(Key::CantHoldBall);
    }

    pub fn timestamp_dispossess(&mut self, kind: DispossessKind) {
        let duration = match kind {
            DispossessKind::Shot => CANT_HOLD_BALL_SHOT,
            DispossessKind::Dispossess => CANT_HOLD_BALL_DISPOSSESS,
        };
        self.timer.set_event(Key::CantHoldBall);
        self.timer.set_timeout(Key::CantHoldBall, duration);
    }

    pub fn timestamp_slide(&mut self) {
        self.timer.set_event(Key::LastSlide);
        self.timer.set_timeout(Key::LastSlide, SLIDE_COOLDOWN);
    }

    pub fn timestamp_passed(&mut self) {
        self.timer.set_event(Key::LastPass);
        self.timer.set_timeout(Key::LastPass, PASS_COOLDOWN);
    }

    pub fn timestamp_slowdown(&mut self, kind: SlowdownKind) {
        let duration = match kind {
            SlowdownKind::Shot => SLOWDOWN_SHOT,
            SlowdownKind::Slid => SLOWDOWN_SLID,
        };
        self.timer.set_event(Key::Slowdown);
        self.timer.set_timeout(Key::Slowdown, duration);
    }

    /// Starts a jump with the given initial vertical speed; its airtime
    /// (`is_going_up` until the midpoint, `is_jumping` until the end) is
    /// derived from `vertical_speed` and `constants.gravity`.
    pub fn start_jump(&mut self, vertical_speed: f32) {
        let duration = 2.0 * vertical_speed / self.constants.gravity;
        self.jump = Some(Jump { elapsed: 0.0, duration });
        self.timer.set_event(Key::LastJump);
        self.timer.set_timeout(Key::LastJump, self.constants.jump_reload);
    }

    pub fn start_slide(&mut self, direction: f32, speed: f32) {
        let dir = Vector3::new(direction.cos(), direction.sin(), 0.0);
        self.slide_vec = Some((dir * speed, self.constants.slide_duration));
        self.timestamp_slide();
    }

    pub fn kick_the_ball(
        &self,
        ball: &mut Ball,
        horizontal_speed: f32,
        vertical_speed: f32,
        direction: f32,
    ) {
        ball.unit.facing_dest = direction;
        ball.unit.moving_speed = horizontal_speed;
        ball.vertical_speed = vertical_speed;
        ball.is_in_air = vertical_speed > 0.0;
        ball.disable_interaction(CANT_INTERACT_SHOT);
    }

    pub fn idle(&mut self, t: f32) {
        self.timer.set_time(t);
        let dt = self.timer.elapsed(Key::CurrentTime).max(0.0);

        if let Some((vec, remaining)) = self.slide_vec {
            self.unit.pos += vec * dt;
            let remaining = remaining - dt;
            if remaining <= 0.0 {
                self.slide_vec = None;
            } else {
                self.slide_vec = Some((vec, remaining));
            }
        }

        if let Some(j) = self.jump {
            let elapsed = j.elapsed + dt;
            if elapsed >= j.duration {
                self.jump = None;
            } else {
                self.jump = Some(Jump { elapsed, ..j });
            }
        }

        self.unit.idle(t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_at(id: i32, x: f32, y: f32) -> Player {
        Player::new(id, RED, Vector3::new(x, y, 0.0), PlayerConstants::default())
    }

    #[test]
    fn control_potential_nan_out_of_range() {
        let p = player_at(0, 0.0, 0.0);
        let ball = Ball::new(Vector3::new(100.0, 0.0, 0.1), 0.1);
        assert!(p.get_control_potential(&ball).is_nan());
    }

    #[test]
    fn control_potential_in_range_is_a_distance() {
        let p = player_at(0, 0.0, 0.0);
        let ball = Ball::new(Vector3::new(0.3, 0.0, 0.1), 0.1);
        let potential = p.get_control_potential(&ball);
        assert!(!potential.is_nan());
        assert!(potential >= 0.0 && potential <= p.constants.control_range);
    }

    #[test]
    fn dispossessed_player_cannot_tackle_during_lockout() {
        let mut p = player_at(0, 0.0, 0.0);
        p.timestamp_dispossess(DispossessKind::Shot);
        let ball = Ball::new(Vector3::new(0.3, 0.0, 0.1), 0.1);
        assert!(p.get_control_potential(&ball).is_nan());
    }

    #[test]
    fn sliding_player_cannot_win_generic_possession() {
        let mut p = player_at(0, 0.0, 0.0);
        p.start_slide(0.0, p.constants.slide_speed);
        let ball = Ball::new(Vector3::new(0.3, 0.0, 0.1), 0.1);
        assert!(p.get_control_potential(&ball).is_nan());
    }

    #[test]
    fn kick_the_ball_sets_ball_motion() {
        let p = player_at(0, 0.0, 0.0);
        let mut ball = Ball::new(Vector3::new(0.0, 0.0, 0.1), 0.1);
        p.kick_the_ball(&mut ball, 10.0, 5.0, 1.0);
        assert_eq!(ball.unit.facing_dest, 1.0);
        assert_eq!(ball.unit.moving_speed, 10.0);
        assert_eq!(ball.vertical_speed, 5.0);
        assert!(ball.is_in_air);
        assert!(!ball.can_interact());
    }

    #[test]
    fn jump_phase_ends_after_its_derived_duration() {
        let mut p = player_at(0, 0.0, 0.0);
        let vertical_speed = 0.15;
        p.start_jump(vertical_speed);
        assert!(p.is_jumping());
        assert!(p.is_going_up());
        let duration = 2.0 * vertical_speed / p.constants.gravity;
        p.idle(duration + 0.01);
        assert!(!p.is_jumping());
    }
}
