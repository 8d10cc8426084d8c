//! Day-based level progression.
//!
//! A run is a fixed sequence of days, each with a customer quota and a
//! timer. Serving the quota ends the day and starts the next one; finishing
//! the last day wins the run. Running out of time or losing a customer ends
//! the run as a loss. Every state change is recorded as a [`ProgressEvent`]
//! for the engine to drain and forward.
//!
//! ```
//! use frogcafe_logic::config::DayConfig;
//! use frogcafe_logic::progress::{DayProgress, ProgressEvent};
//!
//! let mut progress = DayProgress::new(&DayConfig { customers_per_day: vec![1], day_length: 30.0 });
//! progress.start_run();
//! progress.register_served();
//! assert!(progress.is_game_over());
//! assert!(progress.drain_events().contains(&ProgressEvent::DayEnded(1)));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::DayConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    RanOutOfTime,
    LostCustomer,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::RanOutOfTime => write!(f, "ran out of time"),
            FailureReason::LostCustomer => write!(f, "lost a customer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Won,
    Lost(FailureReason),
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Won => write!(f, "You Win!"),
            RunOutcome::Lost(reason) => write!(f, "You Lost ({})", reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressEvent {
    DayStarted(u32),
    DayEnded(u32),
    ServedChanged { day: u32, served: u32, needed: u32 },
    /// Every active customer should be cleared.
    ResetAll,
    GameOver(RunOutcome),
}

#[derive(Debug, Clone)]
pub struct DayProgress {
    quotas: Vec<u32>,
    day_length: f32,
    /// 1-based; 0 before the run starts.
    current_day: u32,
    served_today: u32,
    time_remaining: f32,
    outcome: Option<RunOutcome>,
    events: Vec<ProgressEvent>,
}

impl DayProgress {
    pub fn new(config: &DayConfig) -> Self {
        Self {
            quotas: config.customers_per_day.clone(),
            day_length: config.day_length,
            current_day: 0,
            served_today: 0,
            time_remaining: 0.0,
            outcome: None,
            events: Vec::new(),
        }
    }

    /// Reset to pre-start and begin day 1.
    pub fn start_run(&mut self) {
        self.current_day = 0;
        self.served_today = 0;
        self.outcome = None;
        self.events.push(ProgressEvent::ResetAll);
        self.start_next_day();
    }

    /// A customer was served successfully. Ignored outside a running day.
    pub fn register_served(&mut self) {
        if !self.is_running() {
            return;
        }
        self.served_today += 1;
        let needed = self.needed_today();
        self.events.push(ProgressEvent::ServedChanged {
            day: self.current_day,
            served: self.served_today,
            needed,
        });
        if self.served_today >= needed {
            self.end_current_day();
        }
    }

    /// End the run as a loss. Only the first call has any effect; returns
    /// whether this call ended the run.
    pub fn end_run_failure(&mut self, reason: FailureReason) -> bool {
        if !self.is_running() {
            return false;
        }
        let outcome = RunOutcome::Lost(reason);
        log::info!("Game over on day {}: {}", self.current_day, outcome);
        self.outcome = Some(outcome);
        self.events.push(ProgressEvent::GameOver(outcome));
        self.events.push(ProgressEvent::ResetAll);
        true
    }

    /// End the current day regardless of the quota.
    pub fn force_end_day(&mut self) {
        if self.is_running() {
            self.end_current_day();
        }
    }

    /// Advance the day timer.
    pub fn tick(&mut self, dt: f32) {
        if !self.is_running() {
            return;
        }
        self.time_remaining -= dt;
        if self.time_remaining <= 0.0 {
            self.time_remaining = 0.0;
            self.end_run_failure(FailureReason::RanOutOfTime);
        }
    }

    fn end_current_day(&mut self) {
        log::info!(
            "Day {} ended: served {}/{}",
            self.current_day,
            self.served_today,
            self.needed_today()
        );
        self.events.push(ProgressEvent::DayEnded(self.current_day));
        self.events.push(ProgressEvent::ResetAll);
        self.start_next_day();
    }

    fn start_next_day(&mut self) {
        self.current_day += 1;
        if self.current_day as usize > self.quotas.len() {
            log::info!("All {} days completed", self.quotas.len());
            self.outcome = Some(RunOutcome::Won);
            self.events.push(ProgressEvent::GameOver(RunOutcome::Won));
            self.events.push(ProgressEvent::ResetAll);
            return;
        }
        self.served_today = 0;
        self.time_remaining = self.day_length;
        log::info!(
            "Day {} started: {} customers required",
            self.current_day,
            self.needed_today()
        );
        self.events.push(ProgressEvent::DayStarted(self.current_day));
        self.events.push(ProgressEvent::ServedChanged {
            day: self.current_day,
            served: 0,
            needed: self.needed_today(),
        });
    }

    /// Customers required on a 1-based day; 0 for days outside the run.
    pub fn customers_required(&self, day: u32) -> u32 {
        if day == 0 {
            return 0;
        }
        self.quotas.get(day as usize - 1).copied().unwrap_or(0)
    }

    pub fn current_day(&self) -> u32 {
        self.current_day
    }

    pub fn served_today(&self) -> u32 {
        self.served_today
    }

    pub fn needed_today(&self) -> u32 {
        self.customers_required(self.current_day)
    }

    pub fn time_remaining(&self) -> f32 {
        self.time_remaining
    }

    pub fn days(&self) -> u32 {
        self.quotas.len() as u32
    }

    /// A day is in progress.
    pub fn is_running(&self) -> bool {
        self.current_day > 0 && self.outcome.is_none()
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<RunOutcome> {
        self.outcome
    }

    pub fn drain_events(&mut self) -> Vec<ProgressEvent> {
        std::mem::take(&mut self.events)
    }
}
