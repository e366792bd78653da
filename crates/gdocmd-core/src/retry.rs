//! Bounded exponential backoff for remote calls

use gdocs_client::{RemoteError, Result};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Retry parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(64),
        }
    }
}

impl RetryPolicy {
    /// A policy that retries without sleeping
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Wait after failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exp)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget runs out.
    ///
    /// Returns the value together with the number of attempts made. Every
    /// attempt first waits on `gate`; a rate-limit pushes the gate forward so
    /// other callers sharing it pause as well.
    pub fn run<T, F>(&self, what: &str, gate: &BackoffGate, mut op: F) -> Result<(T, u32)>
    where
        F: FnMut() -> Result<T>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            gate.wait();
            match op() {
                Ok(value) => return Ok((value, attempt)),
                Err(err) if err.is_retryable() => {
                    if attempt >= max_attempts {
                        return Err(RemoteError::RetriesExhausted {
                            attempts: attempt,
                            last: Box::new(err),
                        });
                    }
                    let delay = self.delay_for(attempt);
                    log::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:.1}s",
                        what,
                        attempt,
                        max_attempts,
                        err,
                        delay.as_secs_f64()
                    );
                    if err.is_rate_limited() {
                        gate.push_back(delay);
                    } else if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Shared "do not call before" instant.
///
/// One gate is shared by every worker talking to the same service.
#[derive(Debug, Default)]
pub struct BackoffGate {
    resume_at: Mutex<Option<Instant>>,
}

impl BackoffGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the resume instant has passed
    pub fn wait(&self) {
        let resume_at = *self.resume_at.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(at) = resume_at {
            let now = Instant::now();
            if at > now {
                std::thread::sleep(at - now);
            }
        }
    }

    /// Move the resume instant to at least `delay` from now
    pub fn push_back(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        let target = Instant::now() + delay;
        let mut resume_at = self.resume_at.lock().unwrap_or_else(|e| e.into_inner());
        if resume_at.is_none_or(|at| at < target) {
            *resume_at = Some(target);
        }
    }

    /// Time left until callers may proceed
    pub fn remaining(&self) -> Duration {
        let resume_at = *self.resume_at.lock().unwrap_or_else(|e| e.into_inner());
        resume_at
            .map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(5), Duration::from_secs(16));
        assert_eq!(policy.delay_for(8), Duration::from_secs(64));
        assert_eq!(policy.delay_for(40), Duration::from_secs(64));
    }

    #[test]
    fn test_zero_base_never_sleeps() {
        let policy = RetryPolicy::immediate(5);
        assert_eq!(policy.delay_for(3), Duration::ZERO);
    }

    #[test]
    fn test_retries_until_success() {
        let policy = RetryPolicy::immediate(5);
        let gate = BackoffGate::new();
        let calls = Cell::new(0);
        let (value, attempts) = policy
            .run("upload", &gate, || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Err(RemoteError::RateLimited("quota".to_string()))
                } else {
                    Ok("done")
                }
            })
            .unwrap();
        assert_eq!(value, "done");
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_non_retryable_fails_immediately() {
        let policy = RetryPolicy::immediate(5);
        let gate = BackoffGate::new();
        let calls = Cell::new(0);
        let err = policy
            .run("read", &gate, || -> Result<()> {
                calls.set(calls.get() + 1);
                Err(RemoteError::NotFound("x".to_string()))
            })
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_exhausted_retries() {
        let policy = RetryPolicy::immediate(3);
        let gate = BackoffGate::new();
        let err = policy
            .run("read", &gate, || -> Result<()> { Err(RemoteError::Transient("503".to_string())) })
            .unwrap_err();
        match err {
            RemoteError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, RemoteError::Transient(_)));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_gate_push_back_only_extends() {
        let gate = BackoffGate::new();
        assert_eq!(gate.remaining(), Duration::ZERO);
        gate.push_back(Duration::from_secs(30));
        let first = gate.remaining();
        assert!(first > Duration::from_secs(25));
        gate.push_back(Duration::from_secs(1));
        assert!(gate.remaining() > Duration::from_secs(25));
        gate.push_back(Duration::ZERO);
        assert!(gate.remaining() <= first);
    }
}
