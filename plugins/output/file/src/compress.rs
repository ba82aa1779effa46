use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::error::FileOutputError;

/// How batch bytes are stored on disk. Fixed at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip(flate2::Compression),
}

impl Compression {
    /// Resolve the `compress` config value. `gz` and `gzip` are aliases.
    pub fn from_config(name: Option<&str>, level: u32) -> Result<Self, FileOutputError> {
        let Some(name) = name else {
            return Ok(Compression::None);
        };
        match name {
            "gz" | "gzip" => {
                if level > 9 {
                    return Err(FileOutputError::InvalidParameter {
                        param: "compress_level",
                        detail: format!("{level} is outside 0-9"),
                    });
                }
                Ok(Compression::Gzip(flate2::Compression::new(level)))
            }
            other => Err(FileOutputError::UnsupportedCompressionAlgorithm(other.to_string())),
        }
    }

    /// Suffix appended after the template suffix.
    pub fn extension(&self) -> &'static str {
        match self {
            Compression::None => "",
            Compression::Gzip(_) => ".gz",
        }
    }

    /// Wrap a freshly opened file in the matching sink.
    pub(crate) fn sink(&self, file: File) -> Sink {
        let out = BufWriter::new(file);
        match self {
            Compression::None => Sink::Plain(out),
            Compression::Gzip(level) => Sink::Gzip(flate2::write::GzEncoder::new(out, *level)),
        }
    }
}

/// Scoped write handle over one output file.
///
/// Dropping a sink without calling [`Sink::finish`] still closes the file
/// descriptor, but nothing is synced.
pub(crate) enum Sink {
    Plain(BufWriter<File>),
    Gzip(flate2::write::GzEncoder<BufWriter<File>>),
}

impl Sink {
    /// Flush compressor state, then buffers, then sync the file to disk.
    pub(crate) fn finish(self) -> io::Result<()> {
        let out = match self {
            Sink::Plain(out) => out,
            Sink::Gzip(encoder) => encoder.finish()?,
        };
        let file = out.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(out) => out.write(buf),
            Sink::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            Sink::Plain(out) => out.write_all(buf),
            Sink::Gzip(encoder) => encoder.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(out) => out.flush(),
            Sink::Gzip(encoder) => encoder.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn absent_means_plain() {
        assert_eq!(Compression::from_config(None, 6).unwrap(), Compression::None);
        assert_eq!(Compression::None.extension(), "");
    }

    #[test]
    fn gz_and_gzip_are_aliases() {
        for name in ["gz", "gzip"] {
            let c = Compression::from_config(Some(name), 6).unwrap();
            assert_eq!(c, Compression::Gzip(flate2::Compression::new(6)));
            assert_eq!(c.extension(), ".gz");
        }
    }

    #[test]
    fn unknown_algorithm_is_named() {
        let err = Compression::from_config(Some("bz2"), 6).unwrap_err();
        assert!(matches!(&err, FileOutputError::UnsupportedCompressionAlgorithm(name) if name == "bz2"));
    }

    #[test]
    fn level_out_of_range() {
        let err = Compression::from_config(Some("gzip"), 12).unwrap_err();
        assert!(matches!(err, FileOutputError::InvalidParameter { param: "compress_level", .. }));
    }

    #[test]
    fn gzip_sink_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.gz");

        let mut sink = Compression::from_config(Some("gz"), 6)
            .unwrap()
            .sink(File::create(&path).unwrap());
        sink.write_all(b"hello\nworld\n").unwrap();
        sink.finish().unwrap();

        let mut decoded = String::new();
        flate2::read::GzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "hello\nworld\n");
    }
}
