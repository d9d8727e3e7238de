use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;
use wtgahrs_frame::{RecordReader, ReaderStats, DEFAULT_READ_CHUNK_SIZE};

use crate::exit::{frame_error, CliError, CliResult, INTERNAL, USAGE};
use crate::output::{print_records, OutputFormat};

pub mod listen;
pub mod ports;
pub mod replay;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode records from a serial port until interrupted.
    Listen(ListenArgs),
    /// Decode records from a capture file.
    Replay(ReplayArgs),
    /// List serial ports on this host.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Replay(args) => replay::run(args, format),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Serial port to read (e.g. /dev/ttyUSB0, COM6).
    #[arg(env = "WTGAHRS_PORT")]
    pub port: String,
    /// Line speed in baud.
    #[arg(long, short = 'b', env = "WTGAHRS_BAUD", default_value_t = wtgahrs_transport::DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Read timeout (e.g. 1s, 500ms). A timeout just means no data yet.
    #[arg(long, default_value = "1s")]
    pub timeout: String,
    #[command(flatten)]
    pub read: ReadArgs,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Capture file holding raw sensor bytes.
    pub file: PathBuf,
    #[command(flatten)]
    pub read: ReadArgs,
}

/// Options shared by every command that decodes a stream.
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Bytes requested per read.
    #[arg(long, default_value_t = DEFAULT_READ_CHUNK_SIZE, value_parser = clap::value_parser!(usize))]
    pub chunk_size: usize,
    /// Exit after printing N non-empty record sets.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Why a decode loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source had no more bytes and `stop_on_idle` was set.
    EndOfStream,
    /// `--count` record sets were printed.
    CountReached,
    /// Ctrl-C.
    Interrupted,
}

/// Poll `reader` and print every non-empty record set.
///
/// An idle poll ends the loop when `stop_on_idle` is set (files) and is
/// retried otherwise (serial ports, where it only means no data yet).
pub fn pump<T: std::io::Read>(
    reader: &mut RecordReader<T>,
    source: &str,
    count: Option<usize>,
    stop_on_idle: bool,
    running: &AtomicBool,
    format: OutputFormat,
) -> CliResult<StopReason> {
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let records = match reader.poll() {
            Ok(Some(records)) => records,
            Ok(None) if stop_on_idle => return Ok(StopReason::EndOfStream),
            Ok(None) => continue,
            Err(err) => return Err(frame_error("read failed", err)),
        };

        if records.is_empty() {
            continue;
        }

        print_records(&records, source, format);
        printed = printed.saturating_add(1);

        if count.is_some_and(|count| printed >= count) {
            return Ok(StopReason::CountReached);
        }
    }

    Ok(StopReason::Interrupted)
}

pub fn log_stats(source: &str, stats: ReaderStats, reason: StopReason) {
    info!(
        source,
        ?reason,
        bytes = stats.bytes_read,
        frames = stats.frames,
        discarded = stats.discarded,
        skipped = stats.skipped,
        "decode finished"
    );
}

pub fn validate_chunk_size(chunk_size: usize) -> CliResult<usize> {
    if chunk_size == 0 {
        return Err(CliError::new(USAGE, "chunk size must be greater than zero"));
    }
    Ok(chunk_size)
}

pub fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;
    use wtgahrs_frame::{encode_frame, ReaderConfig};

    use super::*;

    fn capture(frames: usize) -> Vec<u8> {
        let mut wire = BytesMut::new();
        for i in 0..frames {
            encode_frame(0x53, &[i as u8, 0, 0, 0, 0, 0], &mut wire).unwrap();
        }
        wire.to_vec()
    }

    #[test]
    fn pump_stops_at_end_of_file() {
        let config = ReaderConfig { read_chunk_size: 3 };
        let mut reader = RecordReader::with_config(Cursor::new(capture(4)), config);
        let running = AtomicBool::new(true);

        let reason = pump(&mut reader, "test", None, true, &running, OutputFormat::Pretty).unwrap();
        assert_eq!(reason, StopReason::EndOfStream);
        assert_eq!(reader.stats().frames, 4);
    }

    #[test]
    fn pump_honors_count() {
        let config = ReaderConfig { read_chunk_size: 14 };
        let mut reader = RecordReader::with_config(Cursor::new(capture(4)), config);
        let running = AtomicBool::new(true);

        let reason =
            pump(&mut reader, "test", Some(2), true, &running, OutputFormat::Pretty).unwrap();
        assert_eq!(reason, StopReason::CountReached);
        assert_eq!(reader.stats().frames, 2);
    }

    #[test]
    fn pump_exits_when_interrupted() {
        let mut reader = RecordReader::new(Cursor::new(capture(1)));
        let running = AtomicBool::new(false);

        let reason = pump(&mut reader, "test", None, false, &running, OutputFormat::Json).unwrap();
        assert_eq!(reason, StopReason::Interrupted);
    }

    #[test]
    fn zero_chunk_size_rejected() {
        assert_eq!(validate_chunk_size(0).unwrap_err().code, USAGE);
        assert_eq!(validate_chunk_size(64).unwrap(), 64);
    }
}
