use std::io;

/// A flushed batch of already formatted output, grouped under one key.
///
/// The key is usually a time-slice label such as `20240102`. Chunks are owned
/// by the buffering layer; outputs only read them for the duration of a write
/// and must not keep references afterwards.
pub trait Chunk {
    /// Batch key the chunk was grouped under.
    fn key(&self) -> &str;

    /// Size of the formatted content in bytes.
    fn size(&self) -> usize;

    /// Stream the formatted content, in order, into `out`.
    fn write_to(&self, out: &mut dyn io::Write) -> io::Result<()>;
}

/// In-memory chunk that accumulates formatted records.
#[derive(Debug, Clone, Default)]
pub struct BufferChunk {
    key: String,
    data: Vec<u8>,
    records: usize,
}

impl BufferChunk {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            data: Vec::new(),
            records: 0,
        }
    }

    /// Append one formatted record.
    pub fn append(&mut self, formatted: &[u8]) {
        self.data.extend_from_slice(formatted);
        self.records += 1;
    }

    /// Number of records appended so far.
    pub fn len(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Chunk for BufferChunk {
    fn key(&self) -> &str {
        &self.key
    }

    fn size(&self) -> usize {
        self.data.len()
    }

    fn write_to(&self, out: &mut dyn io::Write) -> io::Result<()> {
        out.write_all(&self.data)
    }
}
