//! Ball state: ownership, the loose-ball cooldown, and vertical/in-air
//! motion layered on top of `Unit`'s horizontal integration.

use nalgebra::Vector3;
use pitch_timer::{Timer, TimerKey};

use crate::unit::Unit;

pub const NO_OWNER: i32 = -1;

pub const GROUND_FRICTION: f32 = 40.0;
pub const GROUND_HIT_SLOWDOWN: f32 = 0.7;
pub const GRAVITY: f32 = 0.0069;
const VERTICAL_SCALE: f32 = 30.0;
const RESTITUTION: f32 = 0.6;
const MIN_SPEED: f32 = 0.5;

const LOOSE_BALL_COOLDOWN: f32 = 0.16;
pub const CANT_INTERACT_SHOT: f32 = 0.7;
pub const CANT_INTERACT_SLIDE: f32 = 0.45;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Key {
    CurrentTime,
    LooseBall,
    AbleToInteract,
}

impl TimerKey for Key {
    const CURRENT_TIME: Self = Key::CurrentTime;
}

#[derive(Clone, Debug)]
pub struct Ball {
    pub unit: Unit,
    pub vertical_speed: f32,
    pub is_in_air: bool,
    pub default_height: f32,
    current_owner: i32,
    last_touched: i32,
    /// Visual-only spin accumulator for the renderer; never read back by the
    /// simulation.
    pub render_spin: f32,
    timer: Timer<Key>,
}

impl Ball {
    pub fn new(pos: Vector3<f32>, default_height: f32) -> Self {
        let mut pos = pos;
        pos.z = pos.z.max(default_height);
        Self {
            unit: Unit::new(pos, 0.0, 4.0 * std::f32::consts::PI),
            vertical_speed: 0.0,
            is_in_air: false,
            default_height,
            current_owner: NO_OWNER,
            last_touched: NO_OWNER,
            render_spin: 0.0,
            timer: Timer::new(),
        }
    }

    pub fn owner(&self) -> i32 {
        self.current_owner
    }

    pub fn last_touched(&self) -> i32 {
        self.last_touched
    }

    pub fn height(&self) -> f32 {
        self.unit.pos.z
    }

    pub fn is_loose(&self) -> bool {
        !self.timer.timed_out(Key::LooseBall)
    }

    pub fn can_interact(&self) -> bool {
        self.timer.timed_out(Key::AbleToInteract)
    }

    /// Records `new_owner` as the ball's owner. Idempotent if `new_owner`
    /// already owns the ball. Otherwise arms the loose-ball cooldown,
    /// records `last_touched`, and kills horizontal speed.
    pub fn timestamp_set_owner(&mut self, new_owner: i32) {
        if new_owner == self.current_owner {
            return;
        }
        self.current_owner = new_owner;
        if new_owner != NO_OWNER {
            self.last_touched = new_owner;
        }
        self.timer.set_event(Key::LooseBall);
        self.timer.set_timeout(Key::LooseBall, LOOSE_BALL_COOLDOWN);
        self.unit.moving_speed = 0.0;
    }

    /// Arms a post-shot/slide interaction lockout for `duration` seconds.
    pub fn disable_interaction(&mut self, duration: f32) {
        self.timer.set_event(Key::AbleToInteract);
        self.timer.set_timeout(Key::AbleToInteract, duration);
    }

    pub fn idle(&mut self, t: f32) {
        self.timer.set_time(t);
        let dt = self.timer.elapsed(Key::CurrentTime).max(0.0);

        if self.current_owner == NO_OWNER {
            if self.unit.moving_speed < MIN_SPEED {
                self.unit.moving_speed = 0.0;
            } else {
                let dir = self.unit.facing_dest;
                self.unit.pos.x += dir.cos() * self.unit.moving_speed * dt;
                self.unit.pos.y += dir.sin() * self.unit.moving_speed * dt;
                self.unit.moving_speed = (self.unit.moving_speed - GROUND_FRICTION * dt).max(0.0);
            }
        }

        if self.is_in_air {
            self.unit.pos.z += VERTICAL_SCALE * self.vertical_speed * dt;
            self.vertical_speed -= GRAVITY * dt;

            if self.vertical_speed < 0.0 && self.unit.pos.z <= self.default_height {
                self.unit.pos.z = self.default_height;
                self.unit.moving_speed *= GROUND_HIT_SLOWDOWN;
                self.vertical_speed = -self.vertical_speed * RESTITUTION;
                if self.vertical_speed.abs() < MIN_SPEED {
                    self.vertical_speed = 0.0;
                    self.is_in_air = false;
                }
            }
        } else if self.unit.pos.z < self.default_height {
            self.unit.pos.z = self.default_height;
        }

        self.unit.idle(t);
        self.render_spin += self.unit.moving_speed * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ball_lands_and_settles() {
        let mut ball = Ball::new(Vector3::new(0.0, 0.0, 5.0), 0.1);
        ball.is_in_air = true;
        ball.vertical_speed = 0.0;
        ball.unit.moving_speed = 20.0;
        ball.unit.facing_dest = 0.0;

        let mut last_speed = f32::INFINITY;
        let mut landed_once = false;
        for i in 1..=4000 {
            ball.idle(i as f32 * 0.01);
            if ball.unit.pos.z <= ball.default_height + 1e-3 {
                landed_once = true;
            }
            if landed_once {
                assert!(ball.unit.moving_speed <= last_speed + 1e-6);
                last_speed = ball.unit.moving_speed;
            }
        }
        assert!(!ball.is_in_air);
        assert!((ball.unit.pos.z - ball.default_height).abs() < 1e-3);
    }

    #[test]
    fn ownership_change_arms_loose_cooldown() {
        let mut ball = Ball::new(Vector3::new(0.0, 0.0, 0.1), 0.1);
        ball.timestamp_set_owner(3);
        assert!(ball.is_loose());
        assert!(ball.owner() == 3);
        assert!(ball.last_touched() == 3);
    }

    #[test]
    fn same_owner_is_idempotent() {
        let mut ball = Ball::new(Vector3::new(0.0, 0.0, 0.1), 0.1);
        ball.timestamp_set_owner(3);
        ball.idle(1.0); // let the loose cooldown elapse
        assert!(!ball.is_loose());
        ball.timestamp_set_owner(3);
        assert!(!ball.is_loose());
    }
}
