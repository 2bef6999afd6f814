// Retry driver binding (spec section 4.5): adapts the `retry` crate's
// generic harness to the manager's admission loop.
//
// Grounded on the original source's `option.go` (`RetryOptions
// []retry.Option`, configured by the caller) and `fcache.go`'s `retry.Do`
// call around the admission loop body; the Rust `retry` crate is the
// closest analogue to `github.com/avast/retry-go`.

use crate::error::Error;
use retry::delay::{Exponential, Fixed, NoDelay};
use retry::OperationResult;
use std::time::Duration;

/// Shape of the pause between successive admission attempts.
#[derive(Debug, Clone, Copy)]
pub enum RetryDelay {
    /// No pause between attempts.
    None,
    /// A constant pause.
    Fixed(Duration),
    /// A doubling pause, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

/// Configures how [`crate::manager::CacheManager::set`] retries the
/// admission loop under capacity pressure.
///
/// An empty/default configuration means a single attempt: the admission
/// loop runs exactly once, and a `Retry` sentinel is reported immediately
/// as [`Error::RetryExhausted`] rather than retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryOptions {
    attempts: usize,
    delay: RetryDelay,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self::once()
    }
}

impl RetryOptions {
    /// A single attempt, no retrying.
    pub fn once() -> Self {
        Self { attempts: 1, delay: RetryDelay::None }
    }

    /// Up to `attempts` tries with a constant `delay` between them.
    pub fn fixed(attempts: usize, delay: Duration) -> Self {
        Self { attempts: attempts.max(1), delay: RetryDelay::Fixed(delay) }
    }

    /// Up to `attempts` tries with a doubling delay starting at `base`,
    /// capped at `max`.
    pub fn exponential(attempts: usize, base: Duration, max: Duration) -> Self {
        Self { attempts: attempts.max(1), delay: RetryDelay::Exponential { base, max } }
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Runs `attempt` under this configuration's delay/attempt-count
    /// policy. `attempt` must return `OperationResult::Retry` only for the
    /// admission loop's internal `Retry` sentinel; any other failure should
    /// be `OperationResult::Err`, which is never retried.
    ///
    /// Reports only the last attempt's error on exhaustion ("last-error-only
    /// reporting" from spec section 4.5) rather than an aggregate.
    pub(crate) fn run<T>(
        &self,
        mut attempt: impl FnMut() -> OperationResult<T, Error>,
    ) -> Result<T, Error> {
        let attempts = self.attempts;
        let outcome = match self.delay {
            RetryDelay::None => retry::retry(NoDelay.take(attempts), &mut attempt),
            RetryDelay::Fixed(d) => {
                retry::retry(Fixed::from_millis(d.as_millis() as u64).take(attempts), &mut attempt)
            }
            RetryDelay::Exponential { base, max } => {
                let max_ms = max.as_millis() as u64;
                let iter = Exponential::from_millis(base.as_millis().max(1) as u64)
                    .map(move |d| d.min(Duration::from_millis(max_ms)))
                    .take(attempts);
                retry::retry(iter, &mut attempt)
            }
        };
        outcome.map_err(|e| match e {
            retry::Error::Operation { error, .. } => error,
            retry::Error::Internal(msg) => Error::Backend(msg),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn once_never_retries() {
        let calls = Cell::new(0);
        let opts = RetryOptions::once();
        let result = opts.run(|| {
            calls.set(calls.get() + 1);
            OperationResult::<(), Error>::Retry(Error::RetryExhausted)
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn fixed_retries_up_to_the_configured_attempts() {
        let calls = Cell::new(0);
        let opts = RetryOptions::fixed(3, Duration::from_millis(1));
        let result = opts.run(|| {
            calls.set(calls.get() + 1);
            OperationResult::<(), Error>::Retry(Error::RetryExhausted)
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn succeeds_without_exhausting_attempts() {
        let calls = Cell::new(0);
        let opts = RetryOptions::fixed(5, Duration::from_millis(1));
        let result = opts.run(|| {
            calls.set(calls.get() + 1);
            if calls.get() < 2 {
                OperationResult::Retry(Error::RetryExhausted)
            } else {
                OperationResult::Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn terminal_error_is_not_retried() {
        let calls = Cell::new(0);
        let opts = RetryOptions::fixed(5, Duration::from_millis(1));
        let result: Result<(), Error> = opts.run(|| {
            calls.set(calls.get() + 1);
            OperationResult::Err(Error::NoEvictableEntry)
        });
        assert!(matches!(result, Err(Error::NoEvictableEntry)));
        assert_eq!(calls.get(), 1);
    }
}
