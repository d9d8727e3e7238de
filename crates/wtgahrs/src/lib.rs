//! Telemetry decoder for WTGAHRS2 IMU/GPS sensors.
//!
//! wtgahrs turns the sensor's serial byte stream into typed records: time,
//! acceleration, angular velocity, angles, magnetic field, pressure/altitude,
//! position and height/yaw/velocity.
//!
//! # Crate Structure
//!
//! - [`transport`]: Receive-only serial transport
//! - [`frame`]: Frame scanning, decode rules and the record reader

/// Re-export transport types.
pub mod transport {
    pub use wtgahrs_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use wtgahrs_frame::*;
}
