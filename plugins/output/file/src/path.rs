use std::io;
use std::path::{Path, PathBuf};

use crate::compress::Compression;
use crate::error::FileOutputError;

/// Marker in the configured path replaced by `{key}_{seq}`.
const WILDCARD: char = '*';

/// Output file naming, derived once from the configured path.
///
/// Candidate names are `{prefix}{key}_{seq}{suffix}{ext}`:
///
/// - `/data/out*.log` → prefix `/data/out`, suffix `.log`
/// - `/data/out` → prefix `/data/out.`, suffix `.log`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPathTemplate {
    path: String,
    prefix: String,
    suffix: String,
    has_wildcard: bool,
}

impl OutputPathTemplate {
    /// Split the configured path around its first wildcard.
    pub fn parse(path: &str) -> Result<Self, FileOutputError> {
        if path.is_empty() {
            return Err(FileOutputError::MissingRequiredParameter("path"));
        }

        let template = match path.split_once(WILDCARD) {
            Some((prefix, suffix)) => Self {
                path: path.to_string(),
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
                has_wildcard: true,
            },
            None => Self {
                path: path.to_string(),
                prefix: format!("{path}."),
                suffix: ".log".to_string(),
                has_wildcard: false,
            },
        };
        Ok(template)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn has_wildcard(&self) -> bool {
        self.has_wildcard
    }

    /// Default location for the upstream buffer's own chunk files.
    pub fn buffer_path(&self) -> String {
        if self.has_wildcard {
            self.path.clone()
        } else {
            format!("{}.*", self.path)
        }
    }

    /// Candidate path for `key` at sequence `seq`.
    pub fn candidate(&self, key: &str, seq: u32, compression: Compression) -> PathBuf {
        PathBuf::from(format!(
            "{}{key}_{seq}{}{}",
            self.prefix,
            self.suffix,
            compression.extension()
        ))
    }
}

/// A free output location for one batch write. Never reused across batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub path: PathBuf,
    pub seq: u32,
    pub compression: Compression,
}

// ════════════════════════════════════════════════════════════════
//  PathResolver
// ════════════════════════════════════════════════════════════════

/// Picks a path that does not exist yet by probing increasing sequence
/// numbers, then creates its parent directories.
#[derive(Debug, Clone)]
pub struct PathResolver {
    template: OutputPathTemplate,
    compression: Compression,
    max_attempts: u32,
}

impl PathResolver {
    pub fn new(template: OutputPathTemplate, compression: Compression, max_attempts: u32) -> Self {
        Self {
            template,
            compression,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn template(&self) -> &OutputPathTemplate {
        &self.template
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn resolve(&self, key: &str) -> Result<ResolvedPath, FileOutputError> {
        self.resolve_from(key, 0, self.max_attempts)
    }

    /// Probe at most `budget` candidates starting at `first_seq`. Used to skip
    /// past a path that another writer claimed between the probe and the open.
    ///
    /// On success the probes used are `seq - first_seq + 1`.
    pub(crate) fn resolve_from(
        &self,
        key: &str,
        first_seq: u32,
        budget: u32,
    ) -> Result<ResolvedPath, FileOutputError> {
        let mut last = None;

        for seq in first_seq..first_seq.saturating_add(budget) {
            let candidate = self.template.candidate(key, seq, self.compression);
            if entry_exists(&candidate)? {
                last = Some(candidate);
                continue;
            }

            if let Some(parent) = candidate.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| FileOutputError::io("mkdir", parent, e))?;
            }

            tracing::debug!(key = %key, seq, path = %candidate.display(), "resolved output path");
            return Ok(ResolvedPath {
                path: candidate,
                seq,
                compression: self.compression,
            });
        }

        Err(self.exhausted(
            key,
            last.unwrap_or_else(|| self.template.candidate(key, first_seq, self.compression)),
        ))
    }

    /// The whole attempt budget is spent; `last` is the final path tried.
    pub(crate) fn exhausted(&self, key: &str, last: PathBuf) -> FileOutputError {
        FileOutputError::PathResolutionExhausted {
            key: key.to_string(),
            attempts: self.max_attempts,
            last,
        }
    }
}

/// Any entry counts, including dangling symlinks.
fn entry_exists(path: &Path) -> Result<bool, FileOutputError> {
    match std::fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(FileOutputError::io("stat", path, e)),
    }
}
