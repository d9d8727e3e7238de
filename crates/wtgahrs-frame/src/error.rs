/// Errors that can occur while building decode rules or reading records.
///
/// Decoding a buffer never fails; these cover rule registration and the I/O
/// around it.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A rule's field layout needs more bytes than its frame payload holds.
    #[error(
        "layout for channel 0x{channel_type:02X} needs {layout} bytes but the frame payload holds {payload}"
    )]
    LayoutExceedsFrame {
        channel_type: u8,
        layout: usize,
        payload: usize,
    },

    /// A frame span too short for the header and channel type bytes.
    #[error("frame length {len} for channel 0x{channel_type:02X} is shorter than the 2-byte prefix")]
    FrameTooShort { channel_type: u8, len: usize },

    /// Two rules registered for the same channel type.
    #[error("duplicate decode rule for channel 0x{0:02X}")]
    DuplicateRule(u8),

    /// A per-field scale whose factor count differs from the layout's field count.
    #[error("scale for channel 0x{channel_type:02X} has {factors} factors for {fields} fields")]
    ScaleMismatch {
        channel_type: u8,
        factors: usize,
        fields: usize,
    },

    /// A scale factor that is zero, infinite or NaN.
    #[error("scale factor {factor} for channel 0x{channel_type:02X} must be finite and non-zero")]
    InvalidScale { channel_type: u8, factor: f64 },

    /// Wrong number of values supplied to encode a rule's payload.
    #[error("channel 0x{channel_type:02X} has {expected} fields, got {got} values")]
    FieldCount {
        channel_type: u8,
        expected: usize,
        got: usize,
    },

    /// A payload larger than the frame span can carry.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading from the transport.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The serial transport could not be opened.
    #[error(transparent)]
    Transport(#[from] wtgahrs_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
