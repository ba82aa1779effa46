use std::path::PathBuf;

use fileout_api::PluginError;

#[derive(Debug, thiserror::Error)]
pub enum FileOutputError {
    #[error("'{0}' parameter is required on file output")]
    MissingRequiredParameter(&'static str),

    #[error("invalid '{param}' parameter: {detail}")]
    InvalidParameter { param: &'static str, detail: String },

    #[error("unsupported compression algorithm '{0}'")]
    UnsupportedCompressionAlgorithm(String),

    #[error("no free path for batch '{key}' after {attempts} attempts (last tried {last})")]
    PathResolutionExhausted {
        key: String,
        attempts: u32,
        last: PathBuf,
    },

    #[error("format record (tag '{tag}'): {detail}")]
    Format { tag: String, detail: String },

    #[error("{op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FileOutputError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FileOutputError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Configuration errors are fatal: the output must not start.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            FileOutputError::MissingRequiredParameter(_)
                | FileOutputError::InvalidParameter { .. }
                | FileOutputError::UnsupportedCompressionAlgorithm(_)
        )
    }
}

impl From<FileOutputError> for PluginError {
    fn from(e: FileOutputError) -> Self {
        if e.is_config() {
            return PluginError::config(e.to_string());
        }
        match &e {
            FileOutputError::Format { .. } => PluginError::format(e.to_string()),
            _ => PluginError::io(e.to_string()),
        }
    }
}
