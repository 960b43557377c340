//! Reconnection timing for the push channel.
//!
//! The controller owns at most one pending timer. Arming is idempotent, every
//! timer is tied to the identity it was armed for, and cancelling makes any
//! ticket already in flight worthless.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::session::IdentityKey;

/// Delay before the first reconnect attempt under the default policy.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Back-off policy: how long to wait before a given reconnect attempt.
pub trait BackoffPolicy: Send + Sync {
    /// Delay before attempt `attempt` (0-based), or `None` to stop retrying.
    fn delay_for_attempt(&self, attempt: u32) -> Option<Duration>;
}

/// Configuration for auto-reconnect behavior
#[derive(Debug, Clone, PartialEq)]
pub enum ReconnectConfig {
    /// Same delay before every attempt, retrying forever.
    Fixed { delay: Duration },
    /// Exponential back-off capped at `max`.
    Exponential {
        initial: Duration,
        max: Duration,
        multiplier: f32,
        /// Maximum number of attempts (0 = infinite)
        max_attempts: u32,
    },
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        ReconnectConfig::Fixed {
            delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

impl BackoffPolicy for ReconnectConfig {
    fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        match self {
            ReconnectConfig::Fixed { delay } => Some(*delay),
            ReconnectConfig::Exponential {
                initial,
                max,
                multiplier,
                max_attempts,
            } => {
                if *max_attempts > 0 && attempt >= *max_attempts {
                    return None;
                }
                let exponent = attempt.min(i32::MAX as u32) as i32;
                let millis = initial.as_millis() as f64 * f64::from(*multiplier).powi(exponent);
                let capped = millis.min(max.as_millis() as f64);
                Some(Duration::from_millis(capped as u64))
            }
        }
    }
}

/// Delivered by a timer when it fires; must be redeemed through
/// [`ReconnectController::fire`] before reconnecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectTicket {
    pub identity: IdentityKey,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    Scheduled(Duration),
    AlreadyPending,
    /// The policy gave up.
    Exhausted,
}

struct PendingReconnect {
    identity: IdentityKey,
    generation: u64,
    timer: JoinHandle<()>,
}

pub struct ReconnectController {
    policy: Arc<dyn BackoffPolicy>,
    pending: Option<PendingReconnect>,
    generation: u64,
    attempt: u32,
}

impl ReconnectController {
    pub fn new(policy: Arc<dyn BackoffPolicy>) -> Self {
        Self {
            policy,
            pending: None,
            generation: 0,
            attempt: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of reconnect attempts made since the last successful connection.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// The policy's first delay; also used to pace other bootstrap retries.
    pub fn base_delay(&self) -> Duration {
        self.policy
            .delay_for_attempt(0)
            .unwrap_or(DEFAULT_RECONNECT_DELAY)
    }

    /// Schedule a reconnect for `identity`. `on_fire` runs on the timer task
    /// when the delay elapses and should hand the ticket back to the owner.
    ///
    /// A timer already pending for the same identity is left alone; one
    /// pending for a different identity is replaced.
    pub fn arm<F>(&mut self, identity: &IdentityKey, on_fire: F) -> ArmOutcome
    where
        F: FnOnce(ReconnectTicket) + Send + 'static,
    {
        if let Some(pending) = &self.pending {
            if &pending.identity == identity {
                return ArmOutcome::AlreadyPending;
            }
        }
        if self.pending.is_some() {
            self.cancel();
        }

        let Some(delay) = self.policy.delay_for_attempt(self.attempt) else {
            return ArmOutcome::Exhausted;
        };

        self.generation += 1;
        let ticket = ReconnectTicket {
            identity: identity.clone(),
            generation: self.generation,
        };
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire(ticket);
        });

        self.pending = Some(PendingReconnect {
            identity: identity.clone(),
            generation: self.generation,
            timer,
        });
        ArmOutcome::Scheduled(delay)
    }

    /// Redeem a fired ticket. Returns `true` only if the ticket belongs to the
    /// pending timer and `current` is still the identity it was armed for.
    pub fn fire(&mut self, ticket: &ReconnectTicket, current: Option<&IdentityKey>) -> bool {
        let Some(pending) = &self.pending else {
            return false;
        };
        if pending.generation != ticket.generation {
            return false;
        }
        let identity_matches = current == Some(&pending.identity);
        self.pending = None;
        if identity_matches {
            self.attempt = self.attempt.saturating_add(1);
        }
        identity_matches
    }

    /// Drop any pending timer. Tickets issued before this call are rejected by `fire`.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.timer.abort();
        }
        self.generation += 1;
    }

    /// Called once a connection is established.
    pub fn reset_attempts(&mut self) {
        self.attempt = 0;
    }
}

impl Drop for ReconnectController {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.timer.abort();
        }
    }
}
