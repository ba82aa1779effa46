//! File output: materializes flushed, time-sliced batches as uniquely named
//! files, optionally gzip-compressed.
//!
//! Each record becomes one line:
//!
//! ```text
//! 2024-01-02T03:04:05Z	app.access	{"path":"/","status":200}
//! ```
//!
//! Files are named `{prefix}{key}_{seq}{suffix}[.gz]`, where `seq` is the
//! lowest sequence number whose path does not exist yet. A batch never
//! appends to or overwrites another batch's file.

mod compress;
mod config;
mod error;
mod format;
mod path;
mod writer;
mod zone;

use std::sync::{Mutex, PoisonError};

use fileout_api::{BufferChunk, Chunk, EventRecord, OutputPlugin, PluginError};

pub use compress::Compression;
pub use config::{FileOutputConfig, FormatErrorPolicy};
pub use error::FileOutputError;
pub use format::{RecordFormatter, TimestampCache};
pub use path::{OutputPathTemplate, PathResolver, ResolvedPath};
pub use writer::{BatchWriter, WrittenFile};
pub use zone::{Zone, is_valid_strftime};

// ════════════════════════════════════════════════════════════════
//  FileOutput
// ════════════════════════════════════════════════════════════════

/// A configured file output.
///
/// Safe to share between threads: writes for different batch keys are
/// independent. The caller must not write the same chunk concurrently.
#[derive(Debug)]
pub struct FileOutput {
    writer: BatchWriter,
    formatter: Mutex<RecordFormatter>,
    zone: Zone,
    on_format_error: FormatErrorPolicy,
}

impl FileOutput {
    /// Validate the configuration. Fails before any batch is processed.
    pub fn configure(cfg: FileOutputConfig) -> Result<Self, FileOutputError> {
        let path = cfg
            .path
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(FileOutputError::MissingRequiredParameter("path"))?;
        let template = OutputPathTemplate::parse(path)?;
        let compression = Compression::from_config(cfg.compress.as_deref(), cfg.compress_level)?;
        let zone = Zone::from_config(cfg.localtime, cfg.utc, cfg.timezone.as_deref())?;
        if cfg.max_path_attempts == 0 {
            return Err(FileOutputError::InvalidParameter {
                param: "max_path_attempts",
                detail: "must be at least 1".to_string(),
            });
        }

        tracing::info!(
            path,
            compression = ?compression,
            zone = ?zone,
            buffer_path = %template.buffer_path(),
            "configured file output"
        );

        let resolver = PathResolver::new(template, compression, cfg.max_path_attempts);
        Ok(Self {
            writer: BatchWriter::new(resolver),
            formatter: Mutex::new(RecordFormatter::new(zone)),
            zone,
            on_format_error: cfg.on_format_error,
        })
    }

    pub fn template(&self) -> &OutputPathTemplate {
        self.writer.resolver().template()
    }

    pub fn compression(&self) -> Compression {
        self.writer.resolver().compression()
    }

    /// Zone used for timestamps; upstream time slicing should use the same.
    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn format_record(&self, event: &EventRecord) -> Result<String, FileOutputError> {
        let mut formatter = self.formatter.lock().unwrap_or_else(PoisonError::into_inner);
        formatter.format(&event.tag, event.time, &event.record)
    }

    /// Write a pre-formatted chunk to a new file.
    pub fn write_chunk(&self, chunk: &dyn Chunk) -> Result<WrittenFile, FileOutputError> {
        self.writer.write(chunk)
    }

    /// Format `records` in order and write them as one batch under `key`.
    ///
    /// Everything is formatted before the file is created, so with
    /// [`FormatErrorPolicy::Abort`] a bad record leaves nothing on disk.
    pub fn write_records(&self, key: &str, records: &[EventRecord]) -> Result<WrittenFile, FileOutputError> {
        let mut chunk = BufferChunk::new(key);
        {
            let mut formatter = self.formatter.lock().unwrap_or_else(PoisonError::into_inner);
            for event in records {
                match formatter.format(&event.tag, event.time, &event.record) {
                    Ok(line) => chunk.append(line.as_bytes()),
                    Err(e) => match self.on_format_error {
                        FormatErrorPolicy::Abort => return Err(e),
                        FormatErrorPolicy::Skip => {
                            tracing::warn!(key = %key, tag = %event.tag, error = %e, "skipping record");
                        }
                    },
                }
            }
        }
        self.writer.write(&chunk)
    }
}

impl OutputPlugin for FileOutput {
    fn format(&self, event: &EventRecord) -> Result<Vec<u8>, PluginError> {
        Ok(self.format_record(event)?.into_bytes())
    }

    fn write(&self, chunk: &dyn Chunk) -> Result<(), PluginError> {
        self.write_chunk(chunk)
            .map(|_| ())
            .map_err(|e| PluginError::from(e).with_context(format!("batch '{}'", chunk.key())))
    }
}

#[cfg(test)]
mod tests {
    use fileout_api::ErrorKind;
    use serde_json::json;

    use super::*;

    // 2024-01-02T03:04:05Z
    const T: i64 = 1_704_164_645;

    #[test]
    fn missing_path_fails_fast() {
        let cfg: FileOutputConfig = serde_json::from_str("{}").unwrap();
        let err = FileOutput::configure(cfg).unwrap_err();
        assert!(matches!(err, FileOutputError::MissingRequiredParameter("path")));
        assert!(err.is_config());
    }

    #[test]
    fn empty_path_counts_as_missing() {
        let err = FileOutput::configure(FileOutputConfig::with_path("")).unwrap_err();
        assert!(matches!(err, FileOutputError::MissingRequiredParameter("path")));
    }

    #[test]
    fn zero_attempts_rejected() {
        let err = FileOutput::configure(FileOutputConfig::with_path("/data/out").max_path_attempts(0)).unwrap_err();
        assert!(matches!(err, FileOutputError::InvalidParameter { param: "max_path_attempts", .. }));
    }

    #[test]
    fn configure_exposes_derived_settings() {
        let out = FileOutput::configure(FileOutputConfig::with_path("/data/out*.log").compress("gzip").utc()).unwrap();
        assert!(out.template().has_wildcard());
        assert_eq!(out.compression().extension(), ".gz");
        assert_eq!(out.zone(), Zone::Utc);
    }

    #[test]
    fn plugin_format_produces_line_bytes() {
        let out = FileOutput::configure(FileOutputConfig::with_path("/data/out").utc()).unwrap();
        let plugin: &dyn OutputPlugin = &out;
        let bytes = plugin.format(&EventRecord::new("t", T, json!({"k": "v"}))).unwrap();
        assert_eq!(bytes, b"2024-01-02T03:04:05Z\tt\t{\"k\":\"v\"}\n");
    }

    #[test]
    fn plugin_write_errors_carry_batch_context() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blocker"), b"").unwrap();
        let base = dir.path().join("blocker/out");
        let out = FileOutput::configure(FileOutputConfig::with_path(base.to_str().unwrap())).unwrap();

        let mut chunk = BufferChunk::new("20240102");
        chunk.append(b"x\n");
        let err = OutputPlugin::write(&out, &chunk).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
        assert!(err.message.starts_with("batch '20240102': "), "{}", err.message);
    }

    #[test]
    fn shared_between_threads() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("out");
        let out = FileOutput::configure(FileOutputConfig::with_path(base.to_str().unwrap()).utc()).unwrap();

        std::thread::scope(|s| {
            for i in 0..4 {
                let out = &out;
                s.spawn(move || {
                    let key = format!("k{i}");
                    let records = vec![EventRecord::new("t", T + i, json!({"i": i}))];
                    out.write_records(&key, &records).unwrap();
                });
            }
        });

        for i in 0..4 {
            let content = std::fs::read_to_string(dir.path().join(format!("out.k{i}_0.log"))).unwrap();
            assert!(content.ends_with(&format!("{{\"i\":{i}}}\n")), "{content}");
        }
    }
}
