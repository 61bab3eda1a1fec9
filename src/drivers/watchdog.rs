//! Task watchdog for the sample loop.
//!
//! On target the calling task is subscribed to the ESP-IDF TWDT, which
//! panics (and reboots) if `feed()` is not called within the timeout.
//! The host build keeps only the bookkeeping so the loop's feed cadence
//! can still be checked in tests.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::{info, warn};

use crate::error::Error;

pub struct LoopWatchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    timeout_ms: u32,
    last_fed_ms: u64,
    feeds: u32,
}

impl LoopWatchdog {
    /// Arm the watchdog for a loop that ticks every `tick_ms`.
    ///
    /// The timeout must leave room for at least one full tick.
    pub fn arm(timeout_ms: u32, tick_ms: u32, now_ms: u64) -> Result<Self, Error> {
        if timeout_ms <= tick_ms {
            return Err(Error::Config("watchdog timeout shorter than one loop tick"));
        }

        #[cfg(target_os = "espidf")]
        let subscribed = unsafe {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK {
                warn!("watchdog: reconfigure returned {} (already running?)", ret);
            }
            let ret = esp_task_wdt_add(core::ptr::null_mut());
            if ret != ESP_OK {
                warn!("watchdog: subscribe failed ({}), loop is unguarded", ret);
            }
            ret == ESP_OK
        };

        #[cfg(not(target_os = "espidf"))]
        warn!("watchdog(sim): bookkeeping only");

        info!("watchdog: armed, {}ms timeout, {}ms tick", timeout_ms, tick_ms);
        Ok(Self {
            #[cfg(target_os = "espidf")]
            subscribed,
            timeout_ms,
            last_fed_ms: now_ms,
            feeds: 0,
        })
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn feeds(&self) -> u32 {
        self.feeds
    }

    /// Reset the countdown.  Call once per loop iteration.
    pub fn feed(&mut self, now_ms: u64) {
        self.last_fed_ms = now_ms;
        self.feeds = self.feeds.wrapping_add(1);

        #[cfg(target_os = "espidf")]
        if self.subscribed {
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }

    /// True once the loop has gone longer than the timeout without a feed.
    /// On target the TWDT fires before this can be observed.
    pub fn is_overdue(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_fed_ms) > u64::from(self.timeout_ms)
    }
}

#[cfg(target_os = "espidf")]
impl Drop for LoopWatchdog {
    fn drop(&mut self) {
        if self.subscribed {
            unsafe {
                esp_task_wdt_delete(core::ptr::null_mut());
            }
        }
    }
}
