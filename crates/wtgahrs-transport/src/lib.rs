//! Receive-only serial transport for WTGAHRS2 IMU/GPS sensors.
//!
//! This is the lowest layer of wtgahrs. It opens the sensor's serial port and
//! hands out a plain [`std::io::Read`] stream; everything else builds on top of
//! [`SerialTransport`] or on any other `Read` source (capture files, pipes).

pub mod error;
pub mod serial;

pub use error::{Result, TransportError};
pub use serial::{
    available_ports, PortInfo, SerialConfig, SerialTransport, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT,
};
