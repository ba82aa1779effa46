pub mod chunk;
pub mod error;
pub mod output;
pub mod record;

pub use chunk::{BufferChunk, Chunk};
pub use error::{ErrorKind, PluginError};
pub use output::OutputPlugin;
pub use record::EventRecord;
