use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use fileout_output_file::FileOutputConfig;

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "fileout", about = "Write time-sliced event batches to files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read JSONL events, slice them by time and flush every slice to a file
    Flush(FlushArgs),
}

#[derive(Args, Clone, Debug)]
pub struct FlushArgs {
    /// Path to TOML config file
    #[arg(long, default_value = "fileout.toml", env = "FILEOUT_CONFIG")]
    pub config: String,

    /// JSONL input with one `{"tag", "time", "record"}` object per line; `-` reads stdin
    #[arg(long, default_value = "-")]
    pub input: String,
}

// ---- TOML Config ----

/// ```toml
/// time_slice_format = "%Y%m%d"
///
/// [output]
/// path = "/var/log/app/access"
/// compress = "gz"
/// ```
#[derive(Debug, Deserialize)]
pub struct FileoutConfig {
    /// strftime pattern turning an event time into its batch key.
    #[serde(default = "default_time_slice_format")]
    pub time_slice_format: String,
    pub output: FileOutputConfig,
}

fn default_time_slice_format() -> String {
    "%Y%m%d".to_string()
}

impl FileoutConfig {
    pub fn load(path: &str) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        Self::parse(&content)
            .map_err(|e| match e {
                CliError::Config { context, detail } => CliError::Config { context, detail: format!("'{path}': {detail}") },
                other => other,
            })
    }

    pub fn parse(toml_str: &str) -> Result<Self, CliError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| CliError::Config { context: "parse", detail: e.to_string() })?;
        if !fileout_output_file::is_valid_strftime(&config.time_slice_format) {
            return Err(CliError::Config {
                context: "time_slice_format",
                detail: format!("invalid strftime pattern '{}'", config.time_slice_format),
            });
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let cfg = FileoutConfig::parse(
            r#"
            [output]
            path = "/data/out"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.time_slice_format, "%Y%m%d");
        assert_eq!(cfg.output.path.as_deref(), Some("/data/out"));
        assert_eq!(cfg.output.compress, None);
    }

    #[test]
    fn parses_full_config() {
        let cfg = FileoutConfig::parse(
            r#"
            time_slice_format = "%Y%m%d%H"

            [output]
            path = "/data/out*.log"
            compress = "gzip"
            timezone = "+09:00"
            on_format_error = "skip"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.time_slice_format, "%Y%m%d%H");
        assert_eq!(cfg.output.compress.as_deref(), Some("gzip"));
        assert_eq!(cfg.output.timezone.as_deref(), Some("+09:00"));
    }

    #[test]
    fn rejects_bad_slice_format() {
        let err = FileoutConfig::parse(
            r#"
            time_slice_format = "%Y%!"
            [output]
            path = "/data/out"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Config { context: "time_slice_format", .. }));
    }

    #[test]
    fn output_section_is_required() {
        let err = FileoutConfig::parse(r#"time_slice_format = "%Y""#).unwrap_err();
        assert!(matches!(err, CliError::Config { context: "parse", .. }));
    }
}
