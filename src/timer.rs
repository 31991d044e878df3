//! Pomodoro countdown engine.
//!
//! [`Timer`] only defines what one elapsed second does; [`Ticker`] is the
//! recurring trigger that tells the event loop how many seconds are due.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const DEFAULT_FOCUS_MINUTES: u32 = 25;
pub const DEFAULT_SHORT_BREAK_MINUTES: u32 = 5;
pub const DEFAULT_LONG_BREAK_MINUTES: u32 = 15;
/// Longest countdown any mode may run: one day.
pub const MAX_MINUTES: u32 = 24 * 60;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    Focus,
    ShortBreak,
    LongBreak,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Focus, Mode::ShortBreak, Mode::LongBreak];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Focus => "Focus",
            Self::ShortBreak => "Short",
            Self::LongBreak => "Long",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Focus => "🎯 FOCUS TIME",
            Self::ShortBreak => "☕ SHORT BREAK",
            Self::LongBreak => "🌴 LONG BREAK",
        }
    }
}

/// Configured length of each mode, in whole minutes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeDurations {
    pub focus: u32,
    pub short_break: u32,
    pub long_break: u32,
}

impl Default for ModeDurations {
    fn default() -> Self {
        Self {
            focus: DEFAULT_FOCUS_MINUTES,
            short_break: DEFAULT_SHORT_BREAK_MINUTES,
            long_break: DEFAULT_LONG_BREAK_MINUTES,
        }
    }
}

impl ModeDurations {
    pub fn minutes(&self, mode: Mode) -> u32 {
        let m = match mode {
            Mode::Focus => self.focus,
            Mode::ShortBreak => self.short_break,
            Mode::LongBreak => self.long_break,
        };
        m.clamp(1, MAX_MINUTES)
    }

    pub fn seconds(&self, mode: Mode) -> u32 {
        self.minutes(mode).saturating_mul(60)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// A focus countdown reached zero. Carries the focus duration in minutes.
    SessionComplete { minutes: u32 },
}

#[derive(Debug, Clone)]
pub struct Timer {
    mode: Mode,
    durations: ModeDurations,
    seconds_remaining: u32,
    running: bool,
    fired: bool,
}

impl Timer {
    pub fn new(durations: ModeDurations) -> Self {
        Self {
            mode: Mode::Focus,
            durations,
            seconds_remaining: durations.seconds(Mode::Focus),
            running: false,
            fired: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn durations(&self) -> ModeDurations {
        self.durations
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_fired_completion(&self) -> bool {
        self.fired
    }

    pub fn total_seconds(&self) -> u32 {
        self.durations.seconds(self.mode)
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    /// Applies one elapsed second.
    ///
    /// When the countdown reaches zero the timer stops itself. A focus
    /// countdown yields [`TimerEvent::SessionComplete`] at most once per
    /// cycle; the guard is only cleared by [`reset`](Self::reset) or
    /// [`switch_mode`](Self::switch_mode).
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        if self.seconds_remaining > 0 {
            self.seconds_remaining -= 1;
        }
        if self.seconds_remaining > 0 {
            return None;
        }

        self.running = false;
        if self.mode == Mode::Focus && !self.fired {
            self.fired = true;
            return Some(TimerEvent::SessionComplete {
                minutes: self.durations.minutes(Mode::Focus),
            });
        }
        None
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.seconds_remaining = self.total_seconds();
        self.fired = false;
    }

    /// Abandons the current cycle without credit and loads `mode`.
    pub fn switch_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.reset();
    }

    pub fn progress_ratio(&self) -> f64 {
        let total = self.total_seconds() as f64;
        (1.0 - self.seconds_remaining as f64 / total).clamp(0.0, 1.0)
    }

    pub fn formatted(&self) -> String {
        let secs = self.seconds_remaining;
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

/// Recurring one-second trigger driving [`Timer::tick`].
///
/// The ticker is armed while the timer runs and torn down on pause, reset,
/// mode switch and view teardown, so no seconds accrue while it is idle.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    last: Option<Instant>,
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    pub fn is_armed(&self) -> bool {
        self.last.is_some()
    }

    pub fn arm(&mut self, now: Instant) {
        if self.last.is_none() {
            self.last = Some(now);
        }
    }

    pub fn disarm(&mut self) {
        self.last = None;
    }

    /// Number of whole periods elapsed since the last call. Partial periods
    /// carry over to the next call.
    pub fn due(&mut self, now: Instant) -> u32 {
        let Some(last) = self.last else {
            return 0;
        };
        let elapsed = now.saturating_duration_since(last);
        let periods = (elapsed.as_millis() / self.period.as_millis().max(1)) as u32;
        if periods > 0 {
            self.last = Some(last + self.period * periods);
        }
        periods
    }

    pub fn until_next(&self, now: Instant) -> Option<Duration> {
        self.last
            .map(|last| (last + self.period).saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_timer() -> Timer {
        Timer::new(ModeDurations {
            focus: 1,
            short_break: 1,
            long_break: 2,
        })
    }

    fn run_down(timer: &mut Timer) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        for _ in 0..timer.total_seconds() + 5 {
            if let Some(e) = timer.tick() {
                events.push(e);
            }
        }
        events
    }

    #[test]
    fn new_timer_starts_idle_in_focus() {
        let timer = Timer::new(ModeDurations::default());
        assert_eq!(timer.mode(), Mode::Focus);
        assert_eq!(timer.seconds_remaining(), 25 * 60);
        assert!(!timer.is_running());
        assert_eq!(timer.formatted(), "25:00");
    }

    #[test]
    fn tick_does_nothing_while_paused() {
        let mut timer = short_timer();
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.seconds_remaining(), 60);
    }

    #[test]
    fn start_twice_is_same_as_once() {
        let mut timer = short_timer();
        timer.start();
        timer.start();
        timer.tick();
        assert_eq!(timer.seconds_remaining(), 59);
        assert!(timer.is_running());
    }

    #[test]
    fn focus_completion_fires_once_and_stops() {
        let mut timer = short_timer();
        timer.start();
        let events = run_down(&mut timer);
        assert_eq!(events, vec![TimerEvent::SessionComplete { minutes: 1 }]);
        assert!(!timer.is_running());
        assert_eq!(timer.seconds_remaining(), 0);
        assert!(timer.has_fired_completion());
    }

    #[test]
    fn second_zero_crossing_without_reset_does_not_fire() {
        let mut timer = short_timer();
        timer.start();
        let mut fired = run_down(&mut timer).len();

        timer.start();
        fired += run_down(&mut timer).len();
        timer.start();
        fired += run_down(&mut timer).len();

        assert_eq!(fired, 1);
    }

    #[test]
    fn reset_rearms_completion() {
        let mut timer = short_timer();
        timer.start();
        assert_eq!(run_down(&mut timer).len(), 1);

        timer.reset();
        assert!(!timer.has_fired_completion());
        assert_eq!(timer.seconds_remaining(), 60);
        timer.start();
        assert_eq!(run_down(&mut timer).len(), 1);
    }

    #[test]
    fn breaks_never_complete_a_session() {
        let mut timer = short_timer();
        for mode in [Mode::ShortBreak, Mode::LongBreak] {
            timer.switch_mode(mode);
            timer.start();
            assert!(run_down(&mut timer).is_empty());
            assert!(!timer.is_running());
            assert_eq!(timer.seconds_remaining(), 0);
        }
    }

    #[test]
    fn switch_mode_discards_running_cycle() {
        let mut timer = short_timer();
        timer.start();
        for _ in 0..30 {
            timer.tick();
        }
        timer.switch_mode(Mode::LongBreak);
        assert!(!timer.is_running());
        assert_eq!(timer.seconds_remaining(), 120);
        assert_eq!(timer.progress_ratio(), 0.0);

        timer.switch_mode(Mode::Focus);
        assert_eq!(timer.seconds_remaining(), 60);
    }

    #[test]
    fn progress_ratio_tracks_elapsed_share() {
        let mut timer = short_timer();
        timer.start();
        for _ in 0..15 {
            timer.tick();
        }
        assert!((timer.progress_ratio() - 0.25).abs() < 1e-9);
        run_down(&mut timer);
        assert_eq!(timer.progress_ratio(), 1.0);
    }

    #[test]
    fn zero_minute_durations_are_raised_to_one() {
        let timer = Timer::new(ModeDurations {
            focus: 0,
            short_break: 5,
            long_break: 15,
        });
        assert_eq!(timer.total_seconds(), 60);
    }

    #[test]
    fn huge_durations_are_capped_at_a_day() {
        let timer = Timer::new(ModeDurations {
            focus: 80_000_000,
            short_break: u32::MAX,
            long_break: 15,
        });
        assert_eq!(timer.total_seconds(), MAX_MINUTES * 60);
        assert_eq!(timer.durations().minutes(Mode::ShortBreak), MAX_MINUTES);
        assert_eq!(timer.formatted(), "1440:00");
    }

    #[test]
    fn ticker_counts_whole_periods_and_carries_remainder() {
        let start = Instant::now();
        let mut ticker = Ticker::default();
        assert_eq!(ticker.due(start + Duration::from_secs(5)), 0);

        ticker.arm(start);
        assert_eq!(ticker.due(start + Duration::from_millis(999)), 0);
        assert_eq!(ticker.due(start + Duration::from_millis(2500)), 2);
        assert_eq!(ticker.due(start + Duration::from_millis(3000)), 1);
        assert_eq!(
            ticker.until_next(start + Duration::from_millis(3200)),
            Some(Duration::from_millis(800))
        );
    }

    #[test]
    fn disarmed_ticker_forgets_elapsed_time() {
        let start = Instant::now();
        let mut ticker = Ticker::default();
        ticker.arm(start);
        ticker.disarm();
        assert!(!ticker.is_armed());
        ticker.arm(start + Duration::from_secs(10));
        assert_eq!(ticker.due(start + Duration::from_millis(10_500)), 0);
    }
}
