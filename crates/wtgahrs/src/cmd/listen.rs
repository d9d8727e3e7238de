use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use wtgahrs_frame::{ReaderConfig, RecordReader};
use wtgahrs_transport::SerialConfig;

use crate::cmd::{install_ctrlc_handler, log_stats, pump, validate_chunk_size, ListenArgs};
use crate::exit::{frame_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::OutputFormat;

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let serial = SerialConfig {
        port: args.port.clone(),
        baud_rate: args.baud,
        timeout: parse_timeout(&args.timeout)?,
    };
    let config = ReaderConfig {
        read_chunk_size: validate_chunk_size(args.read.chunk_size)?,
    };

    let mut reader =
        RecordReader::open(&serial, config).map_err(|err| frame_error("open failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let reason = pump(
        &mut reader,
        &args.port,
        args.read.count,
        false,
        &running,
        format,
    )?;
    log_stats(&args.port, reader.stats(), reason);

    Ok(SUCCESS)
}

fn parse_timeout(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid timeout value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "timeout must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_units() {
        assert_eq!(parse_timeout("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_timeout("3").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_timeout("250ms").unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn bad_timeouts_are_usage_errors() {
        for input in ["", "0", "0ms", "fast", "1.5s"] {
            assert_eq!(parse_timeout(input).unwrap_err().code, USAGE, "{input:?}");
        }
    }
}
