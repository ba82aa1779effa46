use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fileout_api::Chunk;

use crate::error::FileOutputError;
use crate::path::{PathResolver, ResolvedPath};

/// Outcome of one batch write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub seq: u32,
    /// Uncompressed bytes handed to the sink.
    pub bytes: u64,
}

// ════════════════════════════════════════════════════════════════
//  BatchWriter
// ════════════════════════════════════════════════════════════════

/// Writes each chunk to its own freshly resolved file.
///
/// No handle outlives a call to [`BatchWriter::write`]: every batch resolves
/// a new path, creates the file, streams the chunk, then finishes and syncs
/// (or discards) it.
#[derive(Debug, Clone)]
pub struct BatchWriter {
    resolver: PathResolver,
}

impl BatchWriter {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn write(&self, chunk: &dyn Chunk) -> Result<WrittenFile, FileOutputError> {
        let key = chunk.key();
        let _span = tracing::debug_span!("write_batch", key = %key).entered();

        let (resolved, file) = self.create(key)?;
        let mut sink = resolved.compression.sink(file);

        let outcome = match chunk.write_to(&mut sink) {
            Ok(()) => sink.finish(),
            Err(e) => {
                drop(sink);
                Err(e)
            }
        };

        if let Err(e) = outcome {
            discard(&resolved.path);
            return Err(FileOutputError::io("write", resolved.path, e));
        }

        tracing::debug!(
            path = %resolved.path.display(),
            bytes = chunk.size(),
            "wrote batch"
        );
        Ok(WrittenFile {
            path: resolved.path,
            seq: resolved.seq,
            bytes: chunk.size() as u64,
        })
    }

    /// Resolve and create the output file.
    fn create(&self, key: &str) -> Result<(ResolvedPath, File), FileOutputError> {
        self.create_with(key, |path| OpenOptions::new().append(true).create_new(true).open(path))
    }

    /// Resolve a path and open it with `open`, which must fail with
    /// `AlreadyExists` when the path is taken.
    ///
    /// If another writer took the probed path in the meantime, probing
    /// resumes after it. Probes and lost opens share one attempt budget.
    fn create_with(
        &self,
        key: &str,
        mut open: impl FnMut(&Path) -> io::Result<File>,
    ) -> Result<(ResolvedPath, File), FileOutputError> {
        let mut first_seq = 0;
        let mut remaining = self.resolver.max_attempts();
        loop {
            let resolved = self.resolver.resolve_from(key, first_seq, remaining)?;
            remaining = remaining.saturating_sub(resolved.seq - first_seq + 1);

            match open(&resolved.path) {
                Ok(file) => return Ok((resolved, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::debug!(path = %resolved.path.display(), "path taken before open, probing further");
                    if remaining == 0 || resolved.seq == u32::MAX {
                        return Err(self.resolver.exhausted(key, resolved.path));
                    }
                    first_seq = resolved.seq + 1;
                }
                Err(e) => return Err(FileOutputError::io("open", resolved.path, e)),
            }
        }
    }
}

/// Remove a file this writer created but could not complete.
fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove incomplete output file");
    }
}
