//! Authoritative per-tick simulation: the possession contest, the seven
//! player action handlers, and match-state transitions (kickoff, goals,
//! halftime, full time).

use std::sync::Mutex;

use nalgebra::Vector3;
use pitch_timer::{Timer, TimerKey};

use crate::ball::{self, Ball};
use crate::player::{self, DispossessKind, Player, PlayerConstants, SlowdownKind};

/// Implementation-defined scalar that puts the action-handler velocities
/// (lifted directly from source constants like `300`, `522`, `15`) on the
/// same scale as `PlayerConstants::running_speed`/`slide_speed`.
pub const GAUGE: f32 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    InProgress,
    RedStart,
    BlueStart,
    RedThrowin,
    BlueThrowin,
    Halftime,
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Key {
    CurrentTime,
    MatchClock,
    GoalPause,
}

impl TimerKey for Key {
    const CURRENT_TIME: Self = Key::CurrentTime;
}

const GOAL_PAUSE: f32 = 2.0;

/// Pitch extents used only by goal detection; the simulation doesn't
/// otherwise bound player/ball movement.
#[derive(Clone, Copy, Debug)]
pub struct PitchDimensions {
    pub length: f32,
    pub width: f32,
    pub goal_width: f32,
}

impl Default for PitchDimensions {
    fn default() -> Self {
        Self {
            length: 40.0,
            width: 20.0,
            goal_width: 6.0,
        }
    }
}

/// Construction parameters for a match.
#[derive(Clone, Copy, Debug)]
pub struct MatchConfig {
    pub pitch: PitchDimensions,
    /// Length, in simulation seconds, of one half. `FINISHED` fires at
    /// `2 * half_length`.
    pub half_length: f32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            pitch: PitchDimensions::default(),
            half_length: 240.0,
        }
    }
}

/// Authoritative soccer match: players, ball, and game-state machine,
/// guarded by a single mutex (spec §5: "a single recursive mutex guards
/// all reads/writes of players + ball + state").
pub struct Soccer {
    inner: Mutex<Inner>,
}

struct Inner {
    players: Vec<Player>,
    ball: Ball,
    state: GameState,
    team1_size: usize,
    config: MatchConfig,
    timer: Timer<Key>,
    second_half: bool,
}

/// Read-only view handed to renderers; copied under the mutex, never
/// aliasing `Soccer`'s internal state.
#[derive(Clone, Debug)]
pub struct PlayerSnapshot {
    pub id: i32,
    pub team: u8,
    pub pos: Vector3<f32>,
    pub facing: f32,
    pub jumping: bool,
    pub sliding: bool,
}

#[derive(Clone, Debug)]
pub struct Snapshot {
    pub ball_pos: Vector3<f32>,
    pub ball_facing: f32,
    pub ball_in_air: bool,
    pub ball_height: f32,
    pub players: Vec<PlayerSnapshot>,
    pub game_state: GameState,
}

impl Soccer {
    /// Builds a match with `team1_size` reds and `team2_size` blues, all
    /// placed at `pos` with default constants. Players are assigned ids
    /// `0..team1_size` (red) then `team1_size..team1_size+team2_size`
    /// (blue), matching spec §3's ordering invariant.
    pub fn new(team1_size: usize, team2_size: usize, config: MatchConfig) -> Self {
        assert!(team1_size + team2_size > 0, "a match needs at least one player");
        let mut players = Vec::with_capacity(team1_size + team2_size);
        for i in 0..team1_size {
            players.push(Player::new(
                i as i32,
                player::RED,
                Vector3::new(0.0, 0.0, 0.0),
                PlayerConstants::default(),
            ));
        }
        for i in 0..team2_size {
            players.push(Player::new(
                (team1_size + i) as i32,
                player::BLUE,
                Vector3::new(0.0, 0.0, 0.0),
                PlayerConstants::default(),
            ));
        }
        let mut timer = Timer::new();
        timer.set_timeout(Key::GoalPause, GOAL_PAUSE);
        Self {
            inner: Mutex::new(Inner {
                players,
                ball: Ball::new(Vector3::new(0.0, 0.0, 0.1), 0.1),
                state: GameState::RedStart,
                team1_size,
                config,
                timer,
                second_half: false,
            }),
        }
    }

    pub fn state(&self) -> GameState {
        self.inner.lock().unwrap().state
    }

    pub fn snapshot(&self) -> Snapshot {
        let inner = self.inner.lock().unwrap();
        Snapshot {
            ball_pos: inner.ball.unit.pos,
            ball_facing: inner.ball.unit.facing,
            ball_in_air: inner.ball.is_in_air,
            ball_height: inner.ball.height(),
            players: inner
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    id: p.id(),
                    team: p.team,
                    pos: p.unit.pos,
                    facing: p.unit.facing,
                    jumping: p.is_jumping(),
                    sliding: p.is_sliding(),
                })
                .collect(),
            game_state: inner.state,
        }
    }

    /// Advances the match by one tick: the possession contest, then ball
    /// integration, then player integration (spec §5's strict ordering),
    /// followed by goal detection and the match-clock state machine.
    /// A no-op once `FINISHED`.
    pub fn idle(&self, t: f32) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state == GameState::Finished {
            return;
        }
        inner.idle_control();
        inner.ball.idle(t);
        for i in 0..inner.players.len() {
            inner.players[i].idle(t);
        }
        inner.check_goals();
        inner.advance_match_clock(t);
    }

    pub fn z_action(&self, id: i32) {
        self.inner.lock().unwrap().z_action(id);
    }

    pub fn x_action(&self, id: i32, dir: f32) {
        self.inner.lock().unwrap().x_action(id, dir);
    }

    pub fn c_action(&self, id: i32, dest: Vector3<f32>) {
        self.inner.lock().unwrap().c_action(id, dest);
    }

    pub fn v_action(&self, id: i32) {
        self.inner.lock().unwrap().v_action(id);
    }

    pub fn f_action(&self, id: i32, dir: f32) {
        self.inner.lock().unwrap().f_action(id, dir);
    }

    pub fn s_action(&self, id: i32) {
        self.inner.lock().unwrap().s_action(id);
    }

    pub fn m_action(&self, id: i32, dest: Vector3<f32>) {
        self.inner.lock().unwrap().m_action(id, dest);
    }
}

fn horizontal_distance(a: Vector3<f32>, b: Vector3<f32>) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

impl Inner {
    fn player_index(&self, id: i32) -> Option<usize> {
        self.players.iter().position(|p| p.id() == id)
    }

    fn player_by_id(&self, id: i32) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }

    fn player_mut(&mut self, id: i32) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id() == id)
    }

    fn is_live(&self) -> bool {
        matches!(self.state, GameState::InProgress)
    }

    fn idle_control(&mut self) {
        let owner = self.ball.owner();
        if owner != ball::NO_OWNER && !self.ball.is_loose() {
            if let Some(p) = self.player_by_id(owner) {
                let point = p.possession_point();
                let height = p.unit.pos.z + self.ball.default_height;
                self.ball.unit.pos.x = point.x;
                self.ball.unit.pos.y = point.y;
                self.ball.unit.pos.z = height;
            }
        }

        let new_owner = self.find_best_possession();
        self.set_control_player(new_owner);
    }

    fn find_best_possession(&self) -> i32 {
        let current_owner = self.ball.owner();
        let owner_team = self.player_by_id(current_owner).map(|p| p.team);

        let mut best = f32::NAN;
        let mut new_owner = current_owner;
        let mut owner_has_potential = false;

        for p in &self.players {
            let potential = p.get_control_potential(&self.ball);
            if p.id() == current_owner {
                owner_has_potential = !potential.is_nan();
                continue;
            }
            if let Some(team) = owner_team {
                if p.team == team {
                    continue;
                }
            }
            if potential.is_nan() {
                continue;
            }
            if best.is_nan() || potential < best {
                best = potential;
                new_owner = p.id();
            }
        }

        if current_owner != ball::NO_OWNER && !owner_has_potential && best.is_nan() {
            return ball::NO_OWNER;
        }
        new_owner
    }

    fn set_control_player(&mut self, new_owner: i32) {
        let old_owner = self.ball.owner();
        if old_owner == new_owner {
            return;
        }
        let old_active = old_owner != ball::NO_OWNER;
        let new_active = new_owner != ball::NO_OWNER;
        let new_sliding_fast = new_active
            && self
                .player_by_id(new_owner)
                .map(|p| p.is_sliding_fast())
                .unwrap_or(false);

        if old_active {
            if !new_active {
                if let Some(p) = self.player_mut(old_owner) {
                    p.timestamp_dispossess(DispossessKind::Shot);
                }
            } else {
                if let Some(p) = self.player_mut(old_owner) {
                    p.timestamp_dispossess(DispossessKind::Dispossess);
                }
                if new_sliding_fast {
                    if let Some(p) = self.player_mut(old_owner) {
                        p.timestamp_slowdown(SlowdownKind::Slid);
                    }
                }
            }
        }

        self.ball.timestamp_set_owner(new_owner);
        log::trace!("ball possession changed: {old_owner} -> {new_owner}");

        if new_active {
            if let Some(p) = self.player_mut(new_owner) {
                p.timestamp_got_ball();
            }
            if new_sliding_fast {
                let (facing, speed) = {
                    let p = self.player_by_id(new_owner).unwrap();
                    (p.unit.facing, p.unit.moving_speed)
                };
                self.ball.unit.facing_dest = facing;
                self.ball.unit.moving_speed = speed;
                self.ball.disable_interaction(ball::CANT_INTERACT_SHOT);
                if let Some(p) = self.player_mut(new_owner) {
                    p.timestamp_dispossess(DispossessKind::Shot);
                }
            } else if self.player_by_id(new_owner).unwrap().is_going_up() {
                self.execute_automatic_pass(new_owner);
            }
        }
    }

    /// Picked up mid-jump: passes to the nearest teammate (or a fixed
    /// fallback point) with a lob tuned so it arrives roughly when the
    /// passer lands.
    fn execute_automatic_pass(&mut self, passer_id: i32) {
        let team = match self.player_by_id(passer_id) {
            Some(p) => p.team,
            None => return,
        };
        let dest = self
            .nearest_teammate_possession_point(passer_id, team)
            .unwrap_or_else(|| self.single_player_pass_point(team));

        let ball_pos = self.ball.unit.pos;
        let dist = horizontal_distance(ball_pos, dest);
        let h = self.ball.height();
        let g = ball::GRAVITY;
        let time = 0.1 * (2.0 * h / g).sqrt();
        let mut speed = self.ball.unit.moving_speed.max(350.0 * GAUGE);
        let vertical_speed;
        if time > 1e-6 && dist < speed * time {
            vertical_speed = 0.0;
            speed = dist / time;
        } else {
            vertical_speed = (10.0 * GAUGE).min(10.0 * GAUGE * g * 0.5 * dist / speed.max(1e-6));
        }

        let direction = (dest.y - ball_pos.y).atan2(dest.x - ball_pos.x);
        self.ball.unit.facing_dest = direction;
        self.ball.unit.moving_speed = speed;
        self.ball.vertical_speed = vertical_speed;
        self.ball.is_in_air = vertical_speed > 0.0;
        self.ball.disable_interaction(ball::CANT_INTERACT_SHOT);
    }

    fn nearest_teammate_possession_point(&self, id: i32, team: u8) -> Option<Vector3<f32>> {
        let from = self.player_by_id(id)?.unit.pos;
        self.players
            .iter()
            .filter(|p| p.team == team && p.id() != id)
            .min_by(|a, b| {
                let da = horizontal_distance(a.unit.pos, from);
                let db = horizontal_distance(b.unit.pos, from);
                da.partial_cmp(&db).unwrap()
            })
            .map(|p| p.possession_point())
    }

    /// Fixed pass target used when a team has no other players on the
    /// pitch: the pitch's center circle.
    fn single_player_pass_point(&self, _team: u8) -> Vector3<f32> {
        Vector3::new(0.0, 0.0, self.ball.default_height)
    }

    fn z_action(&mut self, id: i32) {
        if !self.is_live() {
            return;
        }
        let Some(idx) = self.player_index(id) else { return };
        if !self.players[idx].can_pass() {
            return;
        }
        let is_owner = self.players[idx].is_owner(&self.ball);
        let is_jumping = self.players[idx].is_jumping();
        let team = self.players[idx].team;
        let facing = self.players[idx].unit.facing;
        let running_speed = self.players[idx].constants.running_speed;
        self.players[idx].timestamp_passed();

        if !is_owner {
            return;
        }
        let speed = 1.8 * running_speed;
        if !is_jumping {
            let dest = self
                .nearest_teammate_possession_point(id, team)
                .unwrap_or_else(|| self.single_player_pass_point(team));
            let ball_pos = self.ball.unit.pos;
            let direction = (dest.y - ball_pos.y).atan2(dest.x - ball_pos.x);
            self.players[idx].kick_the_ball(&mut self.ball, speed, 0.0, direction);
        } else {
            self.players[idx].kick_the_ball(&mut self.ball, speed, 0.0, facing);
        }
    }

    fn x_action(&mut self, id: i32, dir: f32) {
        if !self.is_live() {
            return;
        }
        let Some(idx) = self.player_index(id) else { return };
        let is_owner = self.players[idx].is_owner(&self.ball);
        let is_sliding = self.players[idx].is_sliding();
        if is_owner && !is_sliding {
            self.players[idx].kick_the_ball(&mut self.ball, 300.0 * GAUGE, 20.0 * GAUGE, dir);
        } else if self.players[idx].can_slide() {
            let speed = self.players[idx].constants.slide_speed;
            self.players[idx].start_slide(dir, speed);
        }
    }

    fn c_action(&mut self, id: i32, dest: Vector3<f32>) {
        if !self.is_live() {
            return;
        }
        let Some(idx) = self.player_index(id) else { return };
        let is_owner = self.players[idx].is_owner(&self.ball);
        let is_jumping = self.players[idx].is_jumping();
        if is_owner && !is_jumping {
            let ball_pos = self.ball.unit.pos;
            let dist = horizontal_distance(ball_pos, dest);
            let vspeed = 30.0 * GAUGE;
            let g = ball::GRAVITY;
            let horizontal = (522.0 * GAUGE).min(5.0 * g * dist / vspeed);
            let direction = (dest.y - ball_pos.y).atan2(dest.x - ball_pos.x);
            self.players[idx].kick_the_ball(&mut self.ball, horizontal, vspeed, direction);
            self.players[idx].timestamp_slowdown(SlowdownKind::Shot);
        } else {
            self.players[idx].unit.face_point(dest);
        }
    }

    fn v_action(&mut self, id: i32) {
        if !self.is_live() {
            return;
        }
        let Some(idx) = self.player_index(id) else { return };
        if !self.players[idx].can_jump() {
            return;
        }
        let is_owner = self.players[idx].is_owner(&self.ball);
        let vertical_speed = if is_owner { 15.0 * GAUGE } else { 20.0 * GAUGE };
        self.players[idx].start_jump(vertical_speed);
    }

    fn f_action(&mut self, id: i32, dir: f32) {
        if !self.is_live() {
            return;
        }
        if let Some(p) = self.player_mut(id) {
            p.unit.face(dir);
        }
    }

    fn s_action(&mut self, id: i32) {
        if !self.is_live() {
            return;
        }
        if let Some(p) = self.player_mut(id) {
            p.unit.stop();
        }
    }

    fn m_action(&mut self, id: i32, dest: Vector3<f32>) {
        if !self.is_live() {
            return;
        }
        if let Some(p) = self.player_mut(id) {
            p.unit.move_to(dest, 0.0);
        }
    }

    /// Goal-line crossing within the goal width transitions state to the
    /// conceding team's restart and arms `GOAL_PAUSE`.
    fn check_goals(&mut self) {
        if !self.is_live() {
            return;
        }
        let half_length = self.config.pitch.length / 2.0;
        let half_goal = self.config.pitch.goal_width / 2.0;
        let pos = self.ball.unit.pos;
        if pos.y.abs() > half_goal {
            return;
        }

        let scoring_team = if pos.x > half_length {
            Some(player::RED)
        } else if pos.x < -half_length {
            Some(player::BLUE)
        } else {
            None
        };

        if let Some(team) = scoring_team {
            self.state = if team == player::RED {
                GameState::BlueStart
            } else {
                GameState::RedStart
            };
            self.timer.set_event(Key::GoalPause);
            self.timer.set_timeout(Key::GoalPause, GOAL_PAUSE);
            log::debug!("goal scored by team {team}, state -> {:?}", self.state);
        }
    }

    /// Drives `GoalPause` expiry and the match clock's
    /// `InProgress -> Halftime -> InProgress -> Finished` progression.
    fn advance_match_clock(&mut self, t: f32) {
        self.timer.set_time(t);

        if matches!(
            self.state,
            GameState::RedStart | GameState::BlueStart | GameState::RedThrowin | GameState::BlueThrowin
        ) && self.timer.timed_out(Key::GoalPause)
        {
            self.state = GameState::InProgress;
        }

        if self.state == GameState::Halftime {
            if self.timer.timed_out(Key::GoalPause) {
                self.state = GameState::InProgress;
                log::debug!("second half underway");
            }
            return;
        }
        if self.state == GameState::Finished {
            return;
        }

        let elapsed = self.timer.elapsed(Key::MatchClock);
        if elapsed.is_infinite() {
            self.timer.set_event(Key::MatchClock);
            return;
        }

        let half_length = self.config.half_length;
        if !self.second_half && elapsed >= half_length {
            self.second_half = true;
            self.state = GameState::Halftime;
            self.timer.set_event(Key::GoalPause);
            self.timer.set_timeout(Key::GoalPause, GOAL_PAUSE);
            log::debug!("halftime");
        } else if self.second_half && elapsed >= 2.0 * half_length {
            self.state = GameState::Finished;
            log::debug!("match finished");
        }
    }
}
