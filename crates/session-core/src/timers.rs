//! Timer building blocks.
//!
//! The tokio tasks that actually wait live in the session actor; this
//! module owns the parts with rules in them:
//!
//! - [`UsageClock`] — the usage-duration arithmetic (countdown vs count-up,
//!   urgency thresholds, expiry), tickable without a runtime;
//! - [`TimerSlot`] — handle + epoch bookkeeping that makes every timer
//!   restart-safe and cancellation-safe. A slot's epoch is stamped into the
//!   messages its task sends; any message carrying an old epoch is ignored,
//!   so a timer can never fire into a session that restarted or tore it down.

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::events::Urgency;

pub const USAGE_TICK: Duration = Duration::from_secs(1);
pub const URGENCY_WARNING_SECS: u64 = 60;
pub const URGENCY_CRITICAL_SECS: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageTick {
    /// Remaining seconds (limited) or elapsed seconds (unlimited).
    pub seconds: u64,
    pub urgency: Urgency,
    /// Limited sessions only: the budget just ran out, force a stop.
    pub expired: bool,
}

/// Usage-duration accounting, advanced once per second by the owner.
#[derive(Debug, Clone, Copy)]
pub enum UsageClock {
    Countdown { remaining: u64 },
    CountUp { elapsed: u64 },
}

impl UsageClock {
    pub fn limited(budget_secs: u64) -> Self {
        Self::Countdown {
            remaining: budget_secs,
        }
    }

    pub fn unlimited() -> Self {
        Self::CountUp { elapsed: 0 }
    }

    pub fn tick(&mut self) -> UsageTick {
        match self {
            Self::Countdown { remaining } => {
                *remaining = remaining.saturating_sub(1);
                UsageTick {
                    seconds: *remaining,
                    urgency: countdown_urgency(*remaining),
                    expired: *remaining == 0,
                }
            }
            Self::CountUp { elapsed } => {
                *elapsed += 1;
                UsageTick {
                    seconds: *elapsed,
                    urgency: Urgency::Normal,
                    expired: false,
                }
            }
        }
    }
}

fn countdown_urgency(remaining: u64) -> Urgency {
    if remaining < URGENCY_CRITICAL_SECS {
        Urgency::Critical
    } else if remaining < URGENCY_WARNING_SECS {
        Urgency::Warning
    } else {
        Urgency::Normal
    }
}

/// One restartable timer. Arming aborts the previous task and bumps the
/// epoch, so at most one instance is ever live and stale fires are
/// rejectable by epoch comparison alone.
#[derive(Debug, Default)]
pub struct TimerSlot {
    epoch: u64,
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any running instance and return the epoch the replacement
    /// task must stamp into its messages.
    pub fn arm(&mut self) -> u64 {
        self.cancel();
        self.epoch
    }

    pub fn attach(&mut self, handle: JoinHandle<()>) {
        self.handle = Some(handle);
    }

    /// Idempotent. Bumps the epoch so messages already in flight from the
    /// cancelled instance are rejected on arrival.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.epoch += 1;
    }

    pub fn accepts(&self, epoch: u64) -> bool {
        epoch == self.epoch
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
