//! Kinematic primitive shared by the ball and every player: position,
//! facing, and per-tick integration toward a destination/facing target.

use nalgebra::Vector3;
use pitch_timer::{Timer, TimerKey};

const EPSILON: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Key {
    CurrentTime,
    MoveLock,
}

impl TimerKey for Key {
    const CURRENT_TIME: Self = Key::CurrentTime;
}

/// Normalizes an angle in radians to `(-pi, pi]`.
pub fn normalize_angle(mut a: f32) -> f32 {
    use std::f32::consts::PI;
    while a > PI {
        a -= 2.0 * PI;
    }
    while a <= -PI {
        a += 2.0 * PI;
    }
    a
}

/// Signed shortest angular distance from `from` to `to`, in `(-pi, pi]`.
fn angle_diff(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

#[derive(Clone, Debug)]
pub struct Unit {
    pub pos: Vector3<f32>,
    pub dest: Vector3<f32>,
    pub moving_speed: f32,
    pub facing: f32,
    pub facing_dest: f32,
    pub facing_speed: f32,
    /// Position to adopt as `dest` on the next `idle`, refreshed by the
    /// owner each tick (e.g. `Ball` chasing its current owner). `None` when
    /// not chasing anything.
    chase_target: Option<Vector3<f32>>,
    timer: Timer<Key>,
}

impl Unit {
    pub fn new(pos: Vector3<f32>, moving_speed: f32, facing_speed: f32) -> Self {
        Self {
            pos,
            dest: pos,
            moving_speed,
            facing: 0.0,
            facing_dest: 0.0,
            facing_speed,
            chase_target: None,
            timer: Timer::new(),
        }
    }

    /// Requests movement to `loc`. Ignored if the internal move lock (armed
    /// by a previous `move_to` call with `lock > 0`) hasn't timed out yet;
    /// otherwise re-arms the lock for `lock` seconds.
    pub fn move_to(&mut self, loc: Vector3<f32>, lock: f32) {
        if !self.timer.timed_out(Key::MoveLock) {
            return;
        }
        self.dest = loc;
        self.timer.set_event(Key::MoveLock);
        self.timer.set_timeout(Key::MoveLock, lock);
        if self.is_moving() {
            let dx = self.dest.x - self.pos.x;
            let dy = self.dest.y - self.pos.y;
            self.facing_dest = dy.atan2(dx);
        }
    }

    pub fn is_moving(&self) -> bool {
        horizontal_distance(self.dest, self.pos) > EPSILON
    }

    /// Stops horizontal motion and points `facing_dest` at `angle`.
    pub fn face(&mut self, angle: f32) {
        self.stop();
        self.facing_dest = normalize_angle(angle);
    }

    /// Stops horizontal motion and points `facing_dest` at `loc`.
    pub fn face_point(&mut self, loc: Vector3<f32>) {
        let dx = loc.x - self.pos.x;
        let dy = loc.y - self.pos.y;
        self.face(dy.atan2(dx));
    }

    pub fn stop(&mut self) {
        self.dest = self.pos;
        self.chase_target = None;
    }

    /// Chases `target`'s position every tick until `stop()` or a new
    /// `move_to`/`chase` call replaces it.
    pub fn chase(&mut self, target: Vector3<f32>) {
        self.chase_target = Some(target);
    }

    pub fn idle(&mut self, t: f32) {
        self.timer.set_time(t);
        let dt = self.timer.elapsed(Key::CurrentTime).max(0.0);

        if let Some(target) = self.chase_target {
            self.dest = target;
        }

        let diff = angle_diff(self.facing, self.facing_dest);
        let max_step = self.facing_speed * dt;
        if diff.abs() <= max_step {
            self.facing = self.facing_dest;
        } else {
            self.facing = normalize_angle(self.facing + max_step * diff.signum());
        }

        let remaining = horizontal_distance(self.dest, self.pos);
        if remaining > EPSILON {
            let step = (self.moving_speed * dt).min(remaining);
            let dx = self.dest.x - self.pos.x;
            let dy = self.dest.y - self.pos.y;
            let dir_len = (dx * dx + dy * dy).sqrt();
            if dir_len > EPSILON {
                self.pos.x += dx / dir_len * step;
                self.pos.y += dy / dir_len * step;
            }
        }
    }
}

fn horizontal_distance(a: Vector3<f32>, b: Vector3<f32>) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_at(x: f32, y: f32) -> Unit {
        Unit::new(Vector3::new(x, y, 0.0), 5.0, std::f32::consts::PI)
    }

    #[test]
    fn move_monotonicity() {
        let mut u = unit_at(0.0, 0.0);
        u.move_to(Vector3::new(10.0, 0.0, 0.0), 0.0);
        let mut last = horizontal_distance(u.dest, u.pos);
        for i in 1..=20 {
            u.idle(i as f32 * 0.1);
            let dist = horizontal_distance(u.dest, u.pos);
            assert!(dist <= last + 1e-6);
            last = dist;
        }
        assert!(last < EPSILON);
    }

    #[test]
    fn facing_converges_within_bound() {
        let mut u = unit_at(0.0, 0.0);
        u.face(std::f32::consts::FRAC_PI_2);
        let max_time = std::f32::consts::PI / u.facing_speed;
        u.idle(max_time + 0.01);
        assert!((u.facing - std::f32::consts::FRAC_PI_2).abs() < 1e-3);
    }

    #[test]
    fn facing_stays_in_range() {
        let mut u = unit_at(0.0, 0.0);
        u.face(3.0);
        for i in 1..=10 {
            u.idle(i as f32 * 0.05);
            assert!(u.facing > -std::f32::consts::PI && u.facing <= std::f32::consts::PI);
        }
    }

    #[test]
    fn move_lock_blocks_reentrant_moves() {
        let mut u = unit_at(0.0, 0.0);
        u.move_to(Vector3::new(10.0, 0.0, 0.0), 1.0);
        u.idle(0.1);
        u.move_to(Vector3::new(0.0, 10.0, 0.0), 0.0);
        // Locked for 1s from t=0, so at t=0.1 this move is ignored.
        assert_eq!(u.dest, Vector3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn chase_adopts_target_position_each_tick() {
        let mut u = unit_at(0.0, 0.0);
        u.chase(Vector3::new(3.0, 4.0, 0.0));
        u.idle(0.0);
        assert_eq!(u.dest, Vector3::new(3.0, 4.0, 0.0));
    }
}
