//! Exponential backoff with jitter for rate-limited upstream calls
//!
//! Retryability is decided by the error variant, never by matching message
//! text here. The HTTP layer classifies responses into
//! [`Error::RateLimited`] (retryable) or a fatal variant before they reach
//! this loop.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::error::{Error, Result};

/// Base delay before jitter for retry attempt `attempt` (0-indexed): `2^i` seconds
pub fn base_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt)
}

/// Full delay: base plus a uniform random value in `[0, 1)` seconds, so
/// synchronized callers do not retry in lockstep
fn backoff_delay(attempt: u32) -> Duration {
    let jitter = Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..1.0));
    base_delay(attempt) + jitter
}

/// Run `operation` with up to `max_retries` total attempts.
///
/// Rate-limited failures sleep and retry; once the budget is spent the call
/// fails with [`Error::RateLimitExceeded`]. Any other error is surfaced
/// immediately without another attempt.
pub async fn with_backoff<T, F, Fut>(what: &str, max_retries: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = max_retries.max(1);

    for attempt in 0..attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() => {
                if attempt + 1 == attempts {
                    tracing::warn!(what, attempts, "rate limit retry budget exhausted");
                    return Err(Error::RateLimitExceeded { attempts });
                }
                let delay = backoff_delay(attempt);
                tracing::warn!(
                    what,
                    attempt = attempt + 1,
                    attempts,
                    delay_secs = delay.as_secs_f64(),
                    "rate limited, backing off"
                );
                sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }

    unreachable!("loop returns on the final attempt")
}
