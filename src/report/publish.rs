//! Rate-limited publish channel.
//!
//! Wraps a [`PublishPort`] in a token bucket so the controller can never
//! publish faster than the remote service allows.  Throttled attempts are
//! reported back as [`PublishError::RateLimited`] and dropped, not queued.

use core::fmt;
use core::time::Duration;

use burster::Limiter;
use log::{debug, warn};

use crate::adapters::time::platform_now;
use crate::app::ports::PublishPort;
use crate::error::PublishError;

/// Largest payload accepted by the remote publish service.
pub const MAX_PAYLOAD_LEN: usize = 622;

/// Counters kept for the diagnostic log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishStats {
    pub sent: u32,
    pub throttled: u32,
    pub failed: u32,
}

impl fmt::Display for PublishStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sent={} throttled={} failed={}",
            self.sent, self.throttled, self.failed
        )
    }
}

pub struct RateLimitedPublisher<P: PublishPort> {
    inner: P,
    limiter: burster::TokenBucket<fn() -> Duration>,
    stats: PublishStats,
}

impl<P: PublishPort> RateLimitedPublisher<P> {
    /// `per_second` tokens refill each second; up to `burst` may be spent
    /// back to back.
    pub fn new(inner: P, per_second: u32, burst: u32) -> Self {
        Self::with_time_provider(inner, per_second, burst, platform_now)
    }

    pub fn with_time_provider(
        inner: P,
        per_second: u32,
        burst: u32,
        now: fn() -> Duration,
    ) -> Self {
        Self {
            inner,
            limiter: burster::TokenBucket::new_with_time_provider(
                u64::from(per_second),
                u64::from(burst),
                now,
            ),
            stats: PublishStats::default(),
        }
    }

    pub fn stats(&self) -> PublishStats {
        self.stats
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut P {
        &mut self.inner
    }
}

impl<P: PublishPort> PublishPort for RateLimitedPublisher<P> {
    fn publish(&mut self, channel: &str, payload: &str) -> Result<(), PublishError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            self.stats.failed += 1;
            return Err(PublishError::PayloadTooLarge);
        }
        if self.limiter.try_consume(1).is_err() {
            self.stats.throttled += 1;
            debug!("publish: '{}' throttled", channel);
            return Err(PublishError::RateLimited);
        }
        match self.inner.publish(channel, payload) {
            Ok(()) => {
                self.stats.sent += 1;
                Ok(())
            }
            Err(e) => {
                self.stats.failed += 1;
                warn!("publish: '{}' failed: {}", channel, e);
                Err(e)
            }
        }
    }
}
