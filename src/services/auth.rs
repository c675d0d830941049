//! Brute-force login guard.
//!
//! Each client identity moves through `Clean → Accumulating(n) → Locked(until)`.
//! While a lockout is live every attempt is rejected, even with the right
//! password, and no attempt is consumed. Expiry does not reset the failure
//! count; only a successful login does, so the first failure after a lockout
//! expires locks the identity again.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Longest lockout honoured; larger configured values are clamped so
/// `Instant` arithmetic cannot overflow.
pub const MAX_LOCKOUT: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Failure record for one client identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginAttempt {
    pub failure_count: u32,
    pub lockout_until: Option<Instant>,
}

/// Observable position of an identity in the lockout state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Clean,
    Accumulating(u32),
    Locked { until: Instant },
}

/// Result of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Granted,
    Rejected { remaining_attempts: u32 },
    LockedOut { remaining_secs: u64 },
}

#[derive(Debug)]
pub struct AuthGuard {
    password: Option<String>,
    max_attempts: u32,
    lockout: Duration,
    attempts: Mutex<HashMap<String, LoginAttempt>>,
}

impl AuthGuard {
    /// `password: None` disables the guard; every check then succeeds.
    ///
    /// `lockout` is clamped to [`MAX_LOCKOUT`].
    pub fn new(password: Option<String>, max_attempts: u32, lockout: Duration) -> Self {
        if lockout > MAX_LOCKOUT {
            tracing::warn!(
                "Lockout of {:?} exceeds the maximum, using {:?}",
                lockout,
                MAX_LOCKOUT
            );
        }
        Self {
            password: password.filter(|p| !p.is_empty()),
            max_attempts: max_attempts.max(1),
            lockout: lockout.min(MAX_LOCKOUT),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None, 1, Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        self.password.is_some()
    }

    /// Whether a session with the given flag may use protected operations.
    pub fn is_authorized(&self, session_authenticated: bool) -> bool {
        !self.is_enabled() || session_authenticated
    }

    pub fn attempt(&self, identity: &str, password: &str) -> AuthOutcome {
        self.attempt_at(identity, password, Instant::now())
    }

    /// Run one login attempt as if the clock read `now`.
    pub fn attempt_at(&self, identity: &str, password: &str, now: Instant) -> AuthOutcome {
        let Some(expected) = self.password.as_deref() else {
            return AuthOutcome::Granted;
        };

        let mut attempts = self.lock();

        if let Some(until) = attempts.get(identity).and_then(|a| a.lockout_until) {
            if now < until {
                let remaining_secs = ceil_secs(until - now);
                tracing::warn!(
                    "Rejected login from {} during lockout ({}s left)",
                    identity,
                    remaining_secs
                );
                return AuthOutcome::LockedOut { remaining_secs };
            }
        }

        if password == expected {
            if attempts.remove(identity).is_some() {
                tracing::info!("Login from {} succeeded, failure record cleared", identity);
            } else {
                tracing::info!("Login from {} succeeded", identity);
            }
            return AuthOutcome::Granted;
        }

        let record = attempts.entry(identity.to_string()).or_insert(LoginAttempt {
            failure_count: 0,
            lockout_until: None,
        });
        record.failure_count = record.failure_count.saturating_add(1);

        if record.failure_count >= self.max_attempts {
            // Cannot overflow: `lockout` is at most MAX_LOCKOUT
            record.lockout_until = Some(now + self.lockout);
            tracing::warn!(
                "Locking out {} after {} failed attempts for {:?}",
                identity,
                record.failure_count,
                self.lockout
            );
            return AuthOutcome::LockedOut {
                remaining_secs: self.lockout.as_secs(),
            };
        }

        let remaining_attempts = self.max_attempts - record.failure_count;
        tracing::warn!(
            "Failed login from {} ({} attempts left)",
            identity,
            remaining_attempts
        );
        AuthOutcome::Rejected { remaining_attempts }
    }

    pub fn state(&self, identity: &str) -> AttemptState {
        self.state_at(identity, Instant::now())
    }

    pub fn state_at(&self, identity: &str, now: Instant) -> AttemptState {
        match self.lock().get(identity) {
            None => AttemptState::Clean,
            Some(LoginAttempt {
                lockout_until: Some(until),
                ..
            }) if now < *until => AttemptState::Locked { until: *until },
            Some(record) => AttemptState::Accumulating(record.failure_count),
        }
    }

    /// Raw failure record, if any.
    pub fn record(&self, identity: &str) -> Option<LoginAttempt> {
        self.lock().get(identity).copied()
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, LoginAttempt>> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 { secs + 1 } else { secs }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> AuthGuard {
        AuthGuard::new(Some("secret".into()), 3, Duration::from_secs(60))
    }

    #[test]
    fn test_disabled_guard_grants_everything() {
        let guard = AuthGuard::disabled();
        assert!(!guard.is_enabled());
        assert!(guard.is_authorized(false));
        assert_eq!(guard.attempt("1.2.3.4", "anything"), AuthOutcome::Granted);
        assert_eq!(guard.state("1.2.3.4"), AttemptState::Clean);
    }

    #[test]
    fn test_empty_password_disables_guard() {
        let guard = AuthGuard::new(Some(String::new()), 5, Duration::from_secs(1));
        assert!(!guard.is_enabled());
    }

    #[test]
    fn test_failures_accumulate_then_lock() {
        let guard = guard();
        let now = Instant::now();

        assert_eq!(
            guard.attempt_at("ip", "x", now),
            AuthOutcome::Rejected { remaining_attempts: 2 }
        );
        assert_eq!(guard.state_at("ip", now), AttemptState::Accumulating(1));
        assert_eq!(
            guard.attempt_at("ip", "x", now),
            AuthOutcome::Rejected { remaining_attempts: 1 }
        );
        assert_eq!(
            guard.attempt_at("ip", "x", now),
            AuthOutcome::LockedOut { remaining_secs: 60 }
        );
        assert!(matches!(guard.state_at("ip", now), AttemptState::Locked { .. }));
    }

    #[test]
    fn test_locked_attempt_does_not_consume() {
        let guard = guard();
        let now = Instant::now();
        for _ in 0..3 {
            guard.attempt_at("ip", "x", now);
        }

        let later = now + Duration::from_millis(10_500);
        assert_eq!(
            guard.attempt_at("ip", "secret", later),
            AuthOutcome::LockedOut { remaining_secs: 50 }
        );
        assert_eq!(guard.record("ip").unwrap().failure_count, 3);
    }

    #[test]
    fn test_expiry_keeps_failure_count() {
        let guard = guard();
        let now = Instant::now();
        for _ in 0..3 {
            guard.attempt_at("ip", "x", now);
        }

        let expired = now + Duration::from_secs(61);
        assert_eq!(guard.state_at("ip", expired), AttemptState::Accumulating(3));
        // One more failure relocks immediately
        assert_eq!(
            guard.attempt_at("ip", "x", expired),
            AuthOutcome::LockedOut { remaining_secs: 60 }
        );
    }

    #[test]
    fn test_success_clears_record() {
        let guard = guard();
        guard.attempt("ip", "x");
        assert_eq!(guard.attempt("ip", "secret"), AuthOutcome::Granted);
        assert_eq!(guard.record("ip"), None);
    }

    #[test]
    fn test_identities_are_independent() {
        let guard = guard();
        let now = Instant::now();
        for _ in 0..3 {
            guard.attempt_at("a", "x", now);
        }
        assert_eq!(guard.attempt_at("b", "secret", now), AuthOutcome::Granted);
    }

    #[test]
    fn test_huge_lockout_is_clamped() {
        let guard = AuthGuard::new(Some("pw".into()), 1, Duration::from_secs(u64::MAX));
        let now = Instant::now();

        assert_eq!(
            guard.attempt_at("ip", "wrong", now),
            AuthOutcome::LockedOut {
                remaining_secs: MAX_LOCKOUT.as_secs()
            }
        );
        assert_eq!(
            guard.attempt_at("ip", "pw", now + Duration::from_secs(3600)),
            AuthOutcome::LockedOut {
                remaining_secs: MAX_LOCKOUT.as_secs() - 3600
            }
        );
    }

    #[test]
    fn test_ceil_secs() {
        assert_eq!(ceil_secs(Duration::from_millis(1)), 1);
        assert_eq!(ceil_secs(Duration::from_secs(2)), 2);
    }
}
