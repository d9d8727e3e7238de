use std::fs::File;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::debug;
use wtgahrs_frame::{ReaderConfig, RecordReader};

use crate::cmd::{install_ctrlc_handler, log_stats, pump, validate_chunk_size, ReplayArgs};
use crate::exit::{io_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let config = ReaderConfig {
        read_chunk_size: validate_chunk_size(args.read.chunk_size)?,
    };
    let source = args.file.display().to_string();
    let file = File::open(&args.file).map_err(|err| io_error(&format!("open {source}"), err))?;

    let mut reader = RecordReader::with_config(file, config);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let reason = pump(&mut reader, &source, args.read.count, true, &running, format)?;
    log_stats(&source, reader.stats(), reason);

    // Bytes left here are a frame cut off by the end of the capture.
    if !reader.buffered().is_empty() {
        debug!(leftover = reader.buffered().len(), "capture ends mid-frame");
    }

    Ok(SUCCESS)
}
