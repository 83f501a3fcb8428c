//! Fixed-step simulation timer
//!
//! The simulation advances on its own fixed period, independent of the
//! frame rate. [`FixedStepLoop`] keeps the deadline schedule: each call to
//! [`FixedStepLoop::due_steps`] reports how many steps have come due and
//! moves the next deadline forward by whole periods. A [`StopToken`] ends
//! the loop from anywhere that holds a clone of it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::config::DEFAULT_FIXED_DELTA;

/// Cloneable cancellation flag for a [`FixedStepLoop`]
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    /// Create an untriggered token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the loop to stop
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether a stop was requested
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Lifecycle of the simulation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Not started yet
    Idle,
    /// Steps come due on schedule
    Running,
    /// Stopped for good
    Stopped,
}

/// Deadline schedule for fixed simulation steps
#[derive(Debug)]
pub struct FixedStepLoop {
    period: Duration,
    max_catch_up: u32,
    next_deadline: Option<Instant>,
    state: LoopState,
    token: StopToken,
    steps_taken: u64,
}

impl FixedStepLoop {
    /// Loop stepping every `fixed_delta` seconds, running at most
    /// `max_catch_up` steps per poll. A non-positive or non-finite delta
    /// falls back to the default 1/30 s.
    pub fn new(fixed_delta: f32, max_catch_up: u32) -> Self {
        let period = Duration::try_from_secs_f32(fixed_delta)
            .ok()
            .filter(|period| !period.is_zero())
            .unwrap_or_else(|| Duration::from_secs_f32(DEFAULT_FIXED_DELTA));
        Self {
            period,
            max_catch_up: max_catch_up.max(1),
            next_deadline: None,
            state: LoopState::Idle,
            token: StopToken::new(),
            steps_taken: 0,
        }
    }

    /// Start the schedule with the first step due at `now`. Returns `false`
    /// if the loop is already running or was stopped.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.state != LoopState::Idle || self.token.is_stopped() {
            return false;
        }
        self.state = LoopState::Running;
        self.next_deadline = Some(now);
        true
    }

    /// Stop the loop. It never reports due steps again.
    pub fn stop(&mut self) {
        self.token.stop();
        self.halt();
    }

    fn halt(&mut self) {
        if self.state != LoopState::Stopped {
            log::info!("Simulation loop stopped after {} steps", self.steps_taken);
        }
        self.state = LoopState::Stopped;
        self.next_deadline = None;
    }

    /// Token that stops this loop when triggered
    pub fn token(&self) -> StopToken {
        self.token.clone()
    }

    /// Current lifecycle state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Whether steps are being scheduled
    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running && !self.token.is_stopped()
    }

    /// Seconds per step
    pub fn period(&self) -> Duration {
        self.period
    }

    /// When the next step comes due
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_deadline
    }

    /// Steps reported since start
    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Count the steps due at `now` and reschedule. The stop flag is checked
    /// before every reschedule. When more than `max_catch_up` steps are due
    /// the surplus is dropped and the schedule restarts from `now`.
    pub fn due_steps(&mut self, now: Instant) -> u32 {
        if self.state != LoopState::Running {
            return 0;
        }
        let Some(mut deadline) = self.next_deadline else {
            return 0;
        };

        let mut due = 0;
        while deadline <= now {
            if self.token.is_stopped() {
                self.halt();
                return due;
            }
            if due == self.max_catch_up {
                let behind = now.saturating_duration_since(deadline);
                log::warn!(
                    "Simulation fell behind by {:.1} ms; clamped to {} steps",
                    behind.as_secs_f64() * 1000.0,
                    self.max_catch_up
                );
                deadline = now + self.period;
                break;
            }
            due += 1;
            deadline += self.period;
        }

        if self.token.is_stopped() {
            self.halt();
        } else {
            self.next_deadline = Some(deadline);
        }
        self.steps_taken += u64::from(due);
        due
    }
}
