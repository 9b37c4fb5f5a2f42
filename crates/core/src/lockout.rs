//! Account lockout state machine.
//!
//! Per-user transitions:
//! `active -> (N consecutive failures) -> suspended(locked_until = now + duration)
//! -> (locked_until elapsed OR successful login) -> active`.
//!
//! Admin suspension shares the suspended status but carries no
//! `locked_until`, so it is never auto-healed here.

use chrono::{DateTime, Duration, Utc};

/// Lockout thresholds, loaded from configuration.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    /// Consecutive failed attempts before the account is locked.
    pub max_failed_attempts: i32,
    /// How long a lockout lasts.
    pub lockout_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lockout_duration: Duration::minutes(30),
        }
    }
}

/// Result of a lockout check performed before credential comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockCheck {
    /// The account is not locked out.
    NotLocked,
    /// A previous lockout has elapsed; counters must be healed before
    /// credentials are evaluated.
    LockExpired,
    /// The account is locked until the given instant.
    Locked {
        /// When the lockout elapses.
        until: DateTime<Utc>,
    },
}

/// Result of registering a failed login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureOutcome {
    /// The new consecutive-failure count.
    pub attempts: i32,
    /// Set when this failure tripped the threshold.
    pub locked_until: Option<DateTime<Utc>>,
}

impl FailureOutcome {
    /// Returns true when this failure locked the account.
    #[must_use]
    pub const fn locked(&self) -> bool {
        self.locked_until.is_some()
    }
}

/// Evaluates the lockout state of an account.
///
/// `is_suspended` reflects the stored account status. Only a suspension
/// paired with a `locked_until` timestamp counts as a lockout; an
/// admin-suspended account (no timestamp) reports `NotLocked` and is
/// rejected later by the status check instead.
#[must_use]
pub fn check_lock(
    is_suspended: bool,
    locked_until: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> LockCheck {
    match locked_until {
        Some(until) if is_suspended => {
            if now >= until {
                LockCheck::LockExpired
            } else {
                LockCheck::Locked { until }
            }
        }
        _ => LockCheck::NotLocked,
    }
}

/// Registers one more consecutive failure against the policy.
#[must_use]
pub fn register_failure(
    current_attempts: i32,
    policy: &LockoutPolicy,
    now: DateTime<Utc>,
) -> FailureOutcome {
    let attempts = current_attempts.saturating_add(1);
    let locked_until = (attempts >= policy.max_failed_attempts)
        .then(|| now + policy.lockout_duration);

    FailureOutcome {
        attempts,
        locked_until,
    }
}
