//! Named time events, timeouts, and sliding-window event counters.
//!
//! A [`Timer`] tracks a monotonically advancing `current_time` alongside a
//! map from caller-defined keys to the time they last fired. Consumers
//! (`Unit`, `Ball`, `Player`, the lobby actors, ...) each define their own
//! small `Copy + Eq + Hash` key enum and implement [`TimerKey`] on it to pick
//! a `CURRENT_TIME` sentinel used for the tick-delta tie-break.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// A key type usable with [`Timer`]. `CURRENT_TIME` is the sentinel key whose
/// `elapsed` reading is the delta since the previous [`Timer::set_time`] call
/// rather than a delta against a recorded event.
pub trait TimerKey: Copy + Eq + Hash {
    const CURRENT_TIME: Self;
}

#[derive(Debug, Clone)]
pub struct Timer<K: TimerKey> {
    current_time: f32,
    prev_time: f32,
    events: HashMap<K, f32>,
    timeouts: HashMap<K, f32>,
    counters: HashMap<K, VecDeque<f32>>,
}

impl<K: TimerKey> Default for Timer<K> {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            prev_time: 0.0,
            events: HashMap::new(),
            timeouts: HashMap::new(),
            counters: HashMap::new(),
        }
    }
}

impl<K: TimerKey> Timer<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock. `prev_time` is set to whatever `current_time` was
    /// before this call, so `elapsed(CURRENT_TIME)` reports the tick delta.
    pub fn set_time(&mut self, t: f32) {
        self.prev_time = self.current_time;
        self.current_time = t;
    }

    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    /// Records `key` as having fired right now.
    pub fn set_event(&mut self, key: K) {
        self.events.insert(key, self.current_time);
    }

    /// Arms a timeout duration for `key`. If `key` has never fired, it is
    /// implicitly fired now so `timed_out` doesn't immediately report true
    /// for a key the caller just configured.
    pub fn set_timeout(&mut self, key: K, duration: f32) {
        self.timeouts.insert(key, duration);
        if let Entry::Vacant(entry) = self.events.entry(key) {
            entry.insert(self.current_time);
        }
    }

    pub fn timeout(&self, key: K) -> Option<f32> {
        self.timeouts.get(&key).copied()
    }

    /// Time since `key` last fired, or since the previous tick for
    /// `K::CURRENT_TIME`. A key that has never fired reports `f32::INFINITY`
    /// so that `timed_out` is true for it regardless of configured timeout.
    pub fn elapsed(&self, key: K) -> f32 {
        if key == K::CURRENT_TIME {
            return self.current_time - self.prev_time;
        }
        match self.events.get(&key) {
            Some(&last) => self.current_time - last,
            None => f32::INFINITY,
        }
    }

    /// True if `elapsed(key) > timeout[key]`, or if `key` was never fired.
    /// A key with no configured timeout never times out (other than via the
    /// never-fired case).
    pub fn timed_out(&self, key: K) -> bool {
        if !self.events.contains_key(&key) {
            return true;
        }
        match self.timeouts.get(&key) {
            Some(&duration) => self.elapsed(key) > duration,
            None => false,
        }
    }

    /// If `key` is timed out, fires it and runs `f`, returning `true`.
    /// Otherwise leaves state untouched and returns `false`.
    pub fn periodic(&mut self, key: K, f: impl FnOnce()) -> bool {
        if self.timed_out(key) {
            self.set_event(key);
            f();
            true
        } else {
            false
        }
    }

    /// Appends `current_time` to `key`'s sliding-window event counter.
    pub fn set_event_counter(&mut self, key: K) {
        self.counters
            .entry(key)
            .or_default()
            .push_back(self.current_time);
    }

    /// Evicts entries older than `timeouts[key]` and returns the remaining
    /// count. A key with no configured timeout keeps every recorded event.
    pub fn get_count(&mut self, key: K) -> usize {
        let window = self.timeouts.get(&key).copied();
        let current_time = self.current_time;
        let Some(events) = self.counters.get_mut(&key) else {
            return 0;
        };
        if let Some(window) = window {
            while let Some(&oldest) = events.front() {
                if current_time - oldest > window {
                    events.pop_front();
                } else {
                    break;
                }
            }
        }
        events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Key {
        CurrentTime,
        Alpha,
        Beta,
    }

    impl TimerKey for Key {
        const CURRENT_TIME: Self = Key::CurrentTime;
    }

    #[test]
    fn never_fired_key_is_timed_out() {
        let timer: Timer<Key> = Timer::new();
        assert!(timer.timed_out(Key::Alpha));
    }

    #[test]
    fn set_timeout_implicitly_fires_absent_key() {
        let mut timer: Timer<Key> = Timer::new();
        timer.set_timeout(Key::Alpha, 1.0);
        assert!(!timer.timed_out(Key::Alpha));
    }

    #[test]
    fn timed_out_after_duration_elapses() {
        let mut timer: Timer<Key> = Timer::new();
        timer.set_timeout(Key::Alpha, 1.0);
        timer.set_time(0.5);
        assert!(!timer.timed_out(Key::Alpha));
        timer.set_time(1.5);
        assert!(timer.timed_out(Key::Alpha));
    }

    #[test]
    fn current_time_elapsed_is_tick_delta() {
        let mut timer: Timer<Key> = Timer::new();
        timer.set_time(1.0);
        timer.set_time(1.25);
        assert_eq!(timer.elapsed(Key::CurrentTime), 0.25);
    }

    #[test]
    fn periodic_fires_once_per_period() {
        let mut timer: Timer<Key> = Timer::new();
        timer.set_timeout(Key::Beta, 1.0);
        timer.set_time(0.0);

        let mut fired = 0;
        timer.set_time(0.5);
        if timer.periodic(Key::Beta, || ()) {
            fired += 1;
        }
        assert_eq!(fired, 0);

        timer.set_time(1.1);
        if timer.periodic(Key::Beta, || ()) {
            fired += 1;
        }
        assert_eq!(fired, 1);

        timer.set_time(1.2);
        if timer.periodic(Key::Beta, || ()) {
            fired += 1;
        }
        assert_eq!(fired, 1, "shouldn't refire until the next period elapses");
    }

    #[test]
    fn get_count_evicts_events_outside_the_window() {
        let mut timer: Timer<Key> = Timer::new();
        timer.set_timeout(Key::Alpha, 3.0);

        timer.set_time(0.0);
        timer.set_event_counter(Key::Alpha);
        timer.set_time(1.0);
        timer.set_event_counter(Key::Alpha);
        timer.set_time(2.0);
        timer.set_event_counter(Key::Alpha);
        assert_eq!(timer.get_count(Key::Alpha), 3);

        timer.set_time(3.5);
        // Only the event at t=0.0 should be evicted (3.5 - 0.0 > 3.0).
        assert_eq!(timer.get_count(Key::Alpha), 2);
    }

    #[test]
    fn get_count_with_no_timeout_keeps_all_events() {
        let mut timer: Timer<Key> = Timer::new();
        timer.set_event_counter(Key::Alpha);
        timer.set_time(1000.0);
        timer.set_event_counter(Key::Alpha);
        assert_eq!(timer.get_count(Key::Alpha), 2);
    }
}
