//! Publish adapter that writes reports to the serial log.
//!
//! Stand-in for the cloud telemetry client; it is always "connected".

use log::info;

use crate::app::ports::PublishPort;
use crate::error::PublishError;

#[derive(Debug, Default)]
pub struct LogPublisher {
    published: u32,
}

impl LogPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> u32 {
        self.published
    }
}

impl PublishPort for LogPublisher {
    fn publish(&mut self, channel: &str, payload: &str) -> Result<(), PublishError> {
        self.published += 1;
        info!("PUB | {} | {}", channel, payload);
        Ok(())
    }
}
