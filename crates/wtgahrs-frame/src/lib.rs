//! Frame scanning and telemetry decoding for the WTGAHRS2 serial protocol.
//!
//! This is the core of wtgahrs. The sensor streams fixed-span frames:
//! - A `0x55` header byte for stream synchronization
//! - A 1-byte channel type (time, acceleration, angles, GPS, ...)
//! - A little-endian payload decoded by the channel's [`DecodeRule`]
//!
//! [`decode`] turns any byte buffer into [`Records`] plus the unconsumed
//! remainder. [`RecordReader`] threads that remainder across reads.

pub mod channel;
pub mod codec;
pub mod error;
pub mod reader;
pub mod record;
pub mod rule;

pub use codec::{
    decode, encode_frame, Decoded, Frame, FrameScanner, DEFAULT_FRAME_LEN, HEADER, PREFIX_LEN,
};
#[cfg(feature = "async")]
pub use codec::TelemetryCodec;
pub use error::{FrameError, Result};
pub use reader::{ReaderConfig, ReaderStats, RecordReader, DEFAULT_READ_CHUNK_SIZE};
pub use record::{DecodedValue, HeightYawVelocity, RawValue, Records, SensorTime};
pub use rule::{DecodeRule, FieldKind, RuleSet, Scale, STANDARD_RULES};
