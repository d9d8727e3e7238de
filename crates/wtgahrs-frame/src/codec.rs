use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};
use crate::record::Records;
use crate::rule::{DecodeRule, RuleSet};

/// Header byte that starts every frame.
pub const HEADER: u8 = 0x55;

/// Header byte plus channel type byte.
pub const PREFIX_LEN: usize = 2;

/// Frame span of every standard channel: prefix (2) + payload (12) = 14 bytes.
pub const DEFAULT_FRAME_LEN: usize = 14;

/// One complete frame cut from a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Discriminator byte following the header.
    pub channel_type: u8,
    /// Payload bytes (span minus header and type byte).
    pub payload: &'a [u8],
}

impl Frame<'_> {
    /// The total wire size of this frame (prefix + payload).
    pub fn wire_size(&self) -> usize {
        PREFIX_LEN + self.payload.len()
    }
}

/// Cuts complete frames out of a buffer, left to right.
///
/// Non-header bytes are skipped one at a time. Scanning stops at the first
/// frame whose span runs past the end of the buffer; that frame and
/// everything after it is the remainder.
#[derive(Debug, Clone)]
pub struct FrameScanner<'a, 'r> {
    buf: &'a [u8],
    rules: &'r RuleSet,
    cursor: usize,
    skipped: usize,
}

impl<'a, 'r> FrameScanner<'a, 'r> {
    pub fn new(buf: &'a [u8], rules: &'r RuleSet) -> Self {
        Self {
            buf,
            rules,
            cursor: 0,
            skipped: 0,
        }
    }

    /// Bytes not yet consumed by the scan.
    pub fn remainder(&self) -> &'a [u8] {
        &self.buf[self.cursor..]
    }

    /// Bytes consumed so far (frames and skipped bytes).
    pub fn consumed(&self) -> usize {
        self.cursor
    }

    /// Non-header bytes skipped while resynchronizing.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<'a> Iterator for FrameScanner<'a, '_> {
    type Item = Frame<'a>;

    fn next(&mut self) -> Option<Frame<'a>> {
        while self.buf.len() - self.cursor >= PREFIX_LEN {
            if self.buf[self.cursor] != HEADER {
                self.cursor += 1;
                self.skipped += 1;
                continue;
            }

            let channel_type = self.buf[self.cursor + 1];
            let end = self.cursor + self.rules.frame_len(channel_type);
            if end > self.buf.len() {
                return None; // Need more data
            }

            let payload = &self.buf[self.cursor + PREFIX_LEN..end];
            self.cursor = end;
            return Some(Frame {
                channel_type,
                payload,
            });
        }
        None
    }
}

/// Result of one decode pass over a buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<'a> {
    /// Records of every recognized frame, last frame per channel winning.
    pub records: Records,
    /// Unconsumed tail of the input; prepend it to the next chunk.
    pub remainder: &'a [u8],
    /// Bytes consumed from the front of the input.
    pub consumed: usize,
    /// Frames decoded into `records`, overwritten ones included.
    pub frames: usize,
    /// Complete frames dropped because no rule decodes their channel type.
    pub discarded: usize,
    /// Non-header bytes skipped while resynchronizing.
    pub skipped: usize,
}

impl<'a> Decoded<'a> {
    /// The `(records, remainder)` pair.
    pub fn into_parts(self) -> (Records, &'a [u8]) {
        (self.records, self.remainder)
    }
}

impl RuleSet {
    /// Scan `buf` for frames using this set's spans.
    pub fn scan<'a>(&self, buf: &'a [u8]) -> FrameScanner<'a, '_> {
        FrameScanner::new(buf, self)
    }

    /// Decode every complete frame in `buf`.
    ///
    /// Never fails: unknown channel types are dropped, garbage bytes are
    /// skipped, and an incomplete trailing frame is left in the remainder.
    pub fn decode<'a>(&self, buf: &'a [u8]) -> Decoded<'a> {
        let mut scanner = self.scan(buf);
        let mut records = Records::new();
        let mut frames = 0;
        let mut discarded = 0;

        for frame in scanner.by_ref() {
            let decoded = self
                .get(frame.channel_type)
                .and_then(|rule| Some((rule.name, rule.decode_payload(frame.payload)?)));

            match decoded {
                Some((name, value)) => {
                    records.insert(name, value);
                    frames += 1;
                }
                None => discarded += 1,
            }
        }

        Decoded {
            records,
            remainder: scanner.remainder(),
            consumed: scanner.consumed(),
            frames,
            discarded,
            skipped: scanner.skipped(),
        }
    }

    /// Encode a frame for `channel_type`, zero-padding `payload` to the span.
    pub fn encode_frame(&self, channel_type: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
        let max = self.frame_len(channel_type) - PREFIX_LEN;
        if payload.len() > max {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max,
            });
        }
        dst.reserve(PREFIX_LEN + max);
        dst.put_u8(HEADER);
        dst.put_u8(channel_type);
        dst.put_slice(payload);
        dst.put_bytes(0, max - payload.len());
        Ok(())
    }
}

impl DecodeRule {
    /// Encode a complete frame carrying `values` for this rule.
    pub fn encode_frame(&self, values: &[f64], dst: &mut BytesMut) -> Result<()> {
        let mut payload = BytesMut::with_capacity(self.payload_len());
        self.encode_payload(values, &mut payload)?;
        dst.reserve(self.frame_len);
        dst.put_u8(HEADER);
        dst.put_u8(self.channel_type);
        dst.put_slice(&payload);
        Ok(())
    }
}

/// Decode every complete frame in `buf` with the standard rules.
///
/// Wire format of one frame:
/// ```text
/// ┌────────┬──────────────┬──────────────────────────────┐
/// │ Header │ Channel type │ Payload (12B, little-endian) │
/// │ 0x55   │ 0x50..0x58   │ leading fields per channel   │
/// └────────┴──────────────┴──────────────────────────────┘
/// ```
pub fn decode(buf: &[u8]) -> Decoded<'_> {
    RuleSet::standard().decode(buf)
}

/// Encode a frame with the standard spans, zero-padding `payload`.
pub fn encode_frame(channel_type: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    RuleSet::standard().encode_frame(channel_type, payload, dst)
}

/// `tokio_util` codec yielding one [`Records`] per decode pass.
///
/// The remainder stays in the framed read buffer between passes.
#[cfg(feature = "async")]
#[derive(Debug, Clone, Default)]
pub struct TelemetryCodec {
    rules: RuleSet,
}

#[cfg(feature = "async")]
impl TelemetryCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

#[cfg(feature = "async")]
impl tokio_util::codec::Decoder for TelemetryCodec {
    type Item = Records;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Records>> {
        use bytes::Buf;

        let Decoded {
            records, consumed, ..
        } = self.rules.decode(&src[..]);
        src.advance(consumed);

        if records.is_empty() {
            Ok(None)
        } else {
            Ok(Some(records))
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Records>> {
        match self.decode(src)? {
            Some(records) => Ok(Some(records)),
            None => {
                if !src.is_empty() {
                    tracing::debug!(bytes = src.len(), "dropping incomplete frame at end of stream");
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}
