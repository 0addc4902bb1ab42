//! Rest timer sub-state-machine.
//!
//! `Idle -> Running(remaining, total) -> Idle`, leaving `Running` either by
//! natural expiry (the 1 Hz tick takes `remaining` to zero) or by an
//! explicit skip. The timer owns its tick schedule: `start` arms it,
//! `poll` delivers ticks that have come due, `cancel` disarms it.

use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_secs(1);

/// Notification emitted when a countdown leaves `Running`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// Remaining time reached zero
    Expired,
    /// User skipped the rest with `remaining` seconds left
    Skipped { remaining: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TimerState {
    Idle,
    Running { remaining: u32, total: u32 },
}

/// Read-only view of a running countdown
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestSnapshot {
    pub remaining: u32,
    pub total: u32,
}

impl RestSnapshot {
    /// Fraction of the rest still left, in `0.0..=1.0`
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.remaining) / f64::from(self.total)
        }
    }
}

#[derive(Clone, Debug)]
pub struct RestTimer {
    state: TimerState,
    next_tick: Option<Instant>,
}

impl RestTimer {
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            next_tick: None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    pub fn snapshot(&self) -> Option<RestSnapshot> {
        match self.state {
            TimerState::Idle => None,
            TimerState::Running { remaining, total } => Some(RestSnapshot { remaining, total }),
        }
    }

    /// Begin a countdown of `seconds`, replacing any countdown in progress
    ///
    /// The previous tick schedule is discarded; the first tick of the new
    /// countdown lands one full second after `now`. A zero-length rest
    /// expires on the spot.
    pub fn start(&mut self, seconds: u32, now: Instant) -> Option<TimerEvent> {
        if self.is_running() {
            tracing::debug!("Restarting rest timer with {}s", seconds);
        }

        if seconds == 0 {
            self.cancel();
            return Some(TimerEvent::Expired);
        }

        self.state = TimerState::Running {
            remaining: seconds,
            total: seconds,
        };
        self.next_tick = Some(now + TICK);
        tracing::debug!("Rest timer started: {}s", seconds);
        None
    }

    /// Add `seconds` to both remaining and total; no-op while idle
    pub fn extend(&mut self, seconds: u32) -> bool {
        match &mut self.state {
            TimerState::Running { remaining, total } => {
                *remaining = remaining.saturating_add(seconds);
                *total = total.saturating_add(seconds);
                tracing::debug!("Rest extended by {}s ({}s left)", seconds, remaining);
                true
            }
            TimerState::Idle => {
                tracing::debug!("Ignoring rest extension while idle");
                false
            }
        }
    }

    /// End the countdown early; no-op while idle
    pub fn skip(&mut self) -> Option<TimerEvent> {
        match self.state {
            TimerState::Running { remaining, .. } => {
                self.cancel();
                tracing::debug!("Rest skipped with {}s left", remaining);
                Some(TimerEvent::Skipped { remaining })
            }
            TimerState::Idle => {
                tracing::debug!("Ignoring rest skip while idle");
                None
            }
        }
    }

    /// One scheduled decrement
    pub fn tick(&mut self) -> Option<TimerEvent> {
        let TimerState::Running { remaining, total } = self.state else {
            return None;
        };

        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            self.cancel();
            tracing::debug!("Rest timer expired");
            return Some(TimerEvent::Expired);
        }

        self.state = TimerState::Running { remaining, total };
        None
    }

    /// Deliver every tick scheduled at or before `now`
    pub fn poll(&mut self, now: Instant) -> Option<TimerEvent> {
        while let Some(due) = self.next_tick {
            if now < due {
                break;
            }
            self.next_tick = Some(due + TICK);
            if let Some(event) = self.tick() {
                return Some(event);
            }
        }
        None
    }

    /// Drop the countdown and its schedule without firing any event
    pub fn cancel(&mut self) {
        self.state = TimerState::Idle;
        self.next_tick = None;
    }
}

impl Default for RestTimer {
    fn default() -> Self {
        Self::new()
    }
}
