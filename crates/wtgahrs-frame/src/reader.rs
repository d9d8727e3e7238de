use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};
use tracing::{debug, trace};
use wtgahrs_transport::{SerialConfig, SerialTransport};

use crate::codec::Decoded;
use crate::error::{FrameError, Result};
use crate::record::Records;
use crate::rule::RuleSet;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Default bytes requested per read. About 18 frames.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 256;

/// Configuration for the record reader.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Maximum bytes requested from the transport per read.
    pub read_chunk_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

/// Running totals over the life of a reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub bytes_read: u64,
    pub frames: u64,
    pub discarded: u64,
    pub skipped: u64,
}

/// Reads telemetry records from any `Read` stream.
///
/// Owns the raw buffer: whatever a decode pass leaves over is kept and
/// prepended to the next read, so frames split across reads are not lost.
pub struct RecordReader<T> {
    inner: T,
    buf: BytesMut,
    rules: RuleSet,
    config: ReaderConfig,
    stats: ReaderStats,
}

impl<T: Read> RecordReader<T> {
    /// Create a reader with the standard rules and default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ReaderConfig::default())
    }

    /// Create a reader with the standard rules and explicit configuration.
    pub fn with_config(inner: T, config: ReaderConfig) -> Self {
        Self::with_rules(inner, RuleSet::standard().clone(), config)
    }

    /// Create a reader with a custom rule set.
    pub fn with_rules(inner: T, rules: RuleSet, config: ReaderConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            rules,
            config,
            stats: ReaderStats::default(),
        }
    }

    /// Read once from the transport and decode what has arrived.
    ///
    /// Returns `Ok(None)` when the transport had no bytes for us (a zero-byte
    /// read or a read timeout); whether that means end-of-stream is up to the
    /// caller. Otherwise returns the records of this pass, which may be empty
    /// if only part of a frame arrived.
    pub fn poll(&mut self) -> Result<Option<Records>> {
        let start = self.buf.len();
        self.buf.resize(start + self.config.read_chunk_size.max(1), 0);

        let read = loop {
            match self.inner.read(&mut self.buf[start..]) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    self.buf.truncate(start);
                    trace!("no data available");
                    return Ok(None);
                }
                Err(err) => {
                    self.buf.truncate(start);
                    return Err(FrameError::Io(err));
                }
            }
        };
        self.buf.truncate(start + read);

        if read == 0 {
            return Ok(None);
        }

        let Decoded {
            records,
            consumed,
            frames,
            discarded,
            skipped,
            ..
        } = self.rules.decode(&self.buf[..]);
        self.buf.advance(consumed);

        self.stats.bytes_read += read as u64;
        self.stats.frames += frames as u64;
        self.stats.discarded += discarded as u64;
        self.stats.skipped += skipped as u64;

        if skipped > 0 {
            debug!(skipped, "resynchronized past non-header bytes");
        }
        if discarded > 0 {
            debug!(discarded, "dropped frames with unknown channel type");
        }
        trace!(
            read,
            frames,
            channels = records.len(),
            buffered = self.buf.len(),
            "decoded chunk"
        );

        Ok(Some(records))
    }

    /// Bytes carried over from the last decode pass.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Totals since this reader was created.
    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Rules used to decode frames.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

impl RecordReader<SerialTransport> {
    /// Open a serial port and read records from it.
    pub fn open(serial: &SerialConfig, config: ReaderConfig) -> Result<Self> {
        let transport = SerialTransport::open(serial)?;
        Ok(Self::with_config(transport, config))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BufMut;

    use super::*;
    use crate::channel;
    use crate::codec::{encode_frame, DEFAULT_FRAME_LEN};

    fn angles_frame(x: i16) -> Vec<u8> {
        let mut payload = BytesMut::new();
        payload.put_i16_le(x);
        payload.put_i16_le(0);
        payload.put_i16_le(0);
        let mut frame = BytesMut::new();
        encode_frame(channel::ANGLES, &payload, &mut frame).unwrap();
        frame.to_vec()
    }

    #[test]
    fn reads_single_pass() {
        let mut wire = angles_frame(16384);
        wire.extend(angles_frame(-16384));

        let mut reader = RecordReader::new(Cursor::new(wire));
        let records = reader.poll().unwrap().unwrap();

        assert_eq!(records.angles(), Some([-90.0, 0.0, 0.0]));
        assert!(reader.buffered().is_empty());
        assert_eq!(reader.stats().frames, 2);
    }

    #[test]
    fn end_of_stream_is_none() {
        let mut reader = RecordReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(reader.poll().unwrap().is_none());
    }

    #[test]
    fn partial_frame_carried_to_next_read() {
        let frame = angles_frame(8192);
        let config = ReaderConfig { read_chunk_size: 5 };
        let mut reader = RecordReader::with_config(Cursor::new(frame), config);

        let mut seen = Records::new();
        while let Some(records) = reader.poll().unwrap() {
            seen.extend(records);
            assert!(reader.buffered().len() < DEFAULT_FRAME_LEN);
        }

        assert_eq!(seen.angles(), Some([45.0, 0.0, 0.0]));
        assert_eq!(reader.stats().bytes_read, DEFAULT_FRAME_LEN as u64);
    }

    #[test]
    fn byte_by_byte_stream() {
        let mut wire = vec![0x00, 0xFF];
        wire.extend(angles_frame(1));
        wire.extend(angles_frame(2));

        let mut reader = RecordReader::new(ByteByByteReader {
            bytes: wire,
            pos: 0,
        });

        let mut updates = Vec::new();
        while let Some(records) = reader.poll().unwrap() {
            if let Some(angles) = records.angles() {
                updates.push(angles[0]);
            }
        }

        assert_eq!(updates.len(), 2);
        assert!(updates[0] < updates[1]);
        assert_eq!(reader.stats().skipped, 2);
    }

    #[test]
    fn unknown_frames_counted() {
        let mut wire = BytesMut::new();
        encode_frame(0x5A, &[], &mut wire).unwrap();
        wire.put_slice(&angles_frame(0));

        let mut reader = RecordReader::new(Cursor::new(wire.to_vec()));
        let records = reader.poll().unwrap().unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(reader.stats().discarded, 1);
    }

    #[test]
    fn timeout_means_no_data() {
        let reader = TimeoutThenData {
            timed_out: false,
            bytes: angles_frame(100),
            pos: 0,
        };
        let mut framed = RecordReader::new(reader);

        assert!(framed.poll().unwrap().is_none());
        let records = framed.poll().unwrap().unwrap();
        assert!(records.angles().is_some());
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            bytes: angles_frame(100),
            pos: 0,
        };
        let mut framed = RecordReader::new(reader);

        let records = framed.poll().unwrap().unwrap();
        assert!(records.angles().is_some());
    }

    #[test]
    fn other_io_errors_propagate() {
        let mut framed = RecordReader::new(BrokenReader);
        let err = framed.poll().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
        assert!(framed.buffered().is_empty());
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = RecordReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        assert_eq!(reader.config().read_chunk_size, DEFAULT_READ_CHUNK_SIZE);
        assert_eq!(reader.rules().len(), 8);
        let _inner = reader.into_inner();
    }

    #[test]
    fn open_missing_serial_port_fails() {
        let serial = SerialConfig::new("/dev/wtgahrs-no-such-port");
        let err = RecordReader::open(&serial, ReaderConfig::default())
            .err()
            .expect("opening a missing port should fail");
        assert!(matches!(err, FrameError::Transport(_)));
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct TimeoutThenData {
        timed_out: bool,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for TimeoutThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.timed_out {
                self.timed_out = true;
                return Err(std::io::Error::from(ErrorKind::TimedOut));
            }
            let n = (self.bytes.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            let n = (self.bytes.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }
    }
}
