use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use fileout_api::{BufferChunk, Chunk, EventRecord, OutputPlugin};
use fileout_output_file::FileOutput;

use crate::cmd::slice::TimeSlicer;
use crate::config::{FileoutConfig, FlushArgs};
use crate::error::CliError;

pub fn run(args: FlushArgs) -> Result<(), CliError> {
    tracing::info!(config = %args.config, "loading configuration");
    let config = FileoutConfig::load(&args.config)?;

    let output = FileOutput::configure(config.output)?;
    let slicer = TimeSlicer::new(output.zone(), config.time_slice_format);
    let plugin: Box<dyn OutputPlugin> = Box::new(output);

    let reader: Box<dyn BufRead> = if args.input == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(&args.input)
            .map_err(|source| CliError::Input { path: args.input.clone(), source })?;
        Box::new(BufReader::new(file))
    };

    let batches = collect_batches(reader, &slicer, plugin.as_ref())
        .map_err(|source| CliError::Input { path: args.input.clone(), source })?;

    flush_batches(plugin.as_ref(), batches.values())
}

/// Group formatted events by batch key, keeping arrival order inside a batch.
///
/// Lines that are not valid events, cannot be sliced, or fail to format are
/// logged and skipped.
pub fn collect_batches(
    reader: impl BufRead,
    slicer: &TimeSlicer,
    plugin: &dyn OutputPlugin,
) -> io::Result<BTreeMap<String, BufferChunk>> {
    let mut batches: BTreeMap<String, BufferChunk> = BTreeMap::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let event: EventRecord = match serde_json::from_str(&line) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(line = lineno, error = %e, "skipping malformed event");
                continue;
            }
        };

        let Some(key) = slicer.key(event.time) else {
            tracing::warn!(line = lineno, time = event.time, "skipping event with unrepresentable time");
            continue;
        };

        let formatted = match plugin.format(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(line = lineno, tag = %event.tag, error = %e, "skipping event");
                continue;
            }
        };

        batches
            .entry(key)
            .or_insert_with_key(|key| BufferChunk::new(key.clone()))
            .append(&formatted);
    }

    Ok(batches)
}

/// Write every batch. A failed batch does not stop the others.
pub fn flush_batches<'a>(
    plugin: &dyn OutputPlugin,
    batches: impl ExactSizeIterator<Item = &'a BufferChunk>,
) -> Result<(), CliError> {
    let total = batches.len();
    let mut failed = 0;

    for chunk in batches {
        match plugin.write(chunk) {
            Ok(()) => tracing::info!(
                key = %chunk.key(),
                records = chunk.len(),
                bytes = chunk.size(),
                "flushed batch"
            ),
            Err(e) => {
                failed += 1;
                tracing::error!(key = %chunk.key(), error = %e, "failed to flush batch");
            }
        }
    }

    if failed > 0 {
        return Err(CliError::Incomplete { failed, total });
    }
    Ok(())
}
