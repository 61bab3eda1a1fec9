//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements   | Connects to          |
//! |-----------------|--------------|----------------------|
//! | `log_sink`      | EventSink    | Serial log output    |
//! | `log_publisher` | PublishPort  | Serial log output    |
//! | `time`          | Clock        | ESP32 system timer   |
//!
//! The single-wire [`BusTransceiver`](crate::app::ports::BusTransceiver)
//! lives in [`drivers::onewire`](crate::drivers::onewire).

pub mod log_publisher;
pub mod log_sink;
pub mod time;
