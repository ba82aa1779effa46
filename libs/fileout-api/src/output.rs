use crate::chunk::Chunk;
use crate::error::PluginError;
use crate::record::EventRecord;

/// Output plugin trait.
///
/// The pipeline formats every incoming event through [`OutputPlugin::format`],
/// buffers the bytes into chunks keyed by time slice, and hands each flushed
/// chunk to [`OutputPlugin::write`]. Retries, buffering, and scheduling belong
/// to the caller; an output never retries internally.
pub trait OutputPlugin: Send + Sync {
    /// Render one event into its on-disk representation.
    fn format(&self, event: &EventRecord) -> Result<Vec<u8>, PluginError>;

    /// Durably write one flushed chunk.
    fn write(&self, chunk: &dyn Chunk) -> Result<(), PluginError>;
}
