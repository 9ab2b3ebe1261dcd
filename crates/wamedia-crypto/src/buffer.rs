//! Spill-to-disk byte buffer
//!
//! Media bodies are held in memory up to a threshold, then moved to an
//! anonymous temporary file. The file has no path and is removed by the OS
//! when the handle drops, on success and error paths alike.
//!
//! The threshold only bounds the buffering phase. Sealing and opening still
//! read the whole body into memory when they finalize.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use wamedia_core::BufferConfig;

#[derive(Debug)]
enum Backing {
    Memory(Cursor<Vec<u8>>),
    File(File),
}

/// A `Read + Write + Seek` buffer that spills to a temp file past a threshold.
#[derive(Debug)]
pub struct SpillBuffer {
    backing: Backing,
    config: BufferConfig,
}

impl SpillBuffer {
    pub fn new(config: BufferConfig) -> Self {
        Self {
            backing: Backing::Memory(Cursor::new(Vec::new())),
            config,
        }
    }

    /// Whether the contents currently live in a temporary file.
    pub fn is_spilled(&self) -> bool {
        matches!(self.backing, Backing::File(_))
    }

    /// Total number of bytes held, independent of the cursor.
    pub fn len(&mut self) -> io::Result<u64> {
        match &mut self.backing {
            Backing::Memory(cursor) => Ok(cursor.get_ref().len() as u64),
            Backing::File(file) => Ok(file.metadata()?.len()),
        }
    }

    pub fn is_empty(&mut self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Read the whole buffer from the start, leaving the cursor at the end.
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        self.seek(SeekFrom::Start(0))?;
        let mut out = Vec::new();
        self.read_to_end(&mut out)?;
        Ok(out)
    }

    fn spill(&mut self) -> io::Result<()> {
        let Backing::Memory(cursor) = &mut self.backing else {
            return Ok(());
        };
        let mut file = match &self.config.temp_dir {
            Some(dir) => tempfile::tempfile_in(dir)?,
            None => tempfile::tempfile()?,
        };
        let position = cursor.position();
        file.write_all(cursor.get_ref())?;
        file.seek(SeekFrom::Start(position))?;
        tracing::debug!(
            threshold = self.config.spill_threshold_bytes,
            size = cursor.get_ref().len(),
            "spilling media buffer to temporary file"
        );
        self.backing = Backing::File(file);
        Ok(())
    }
}

impl Default for SpillBuffer {
    fn default() -> Self {
        Self::new(BufferConfig::default())
    }
}

impl Write for SpillBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Backing::Memory(cursor) = &self.backing {
            let end = cursor.position() as usize + buf.len();
            if !buf.is_empty() && end.max(cursor.get_ref().len()) > self.config.spill_threshold_bytes
            {
                self.spill()?;
            }
        }
        match &mut self.backing {
            Backing::Memory(cursor) => cursor.write(buf),
            Backing::File(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.backing {
            Backing::Memory(_) => Ok(()),
            Backing::File(file) => file.flush(),
        }
    }
}

impl Read for SpillBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.backing {
            Backing::Memory(cursor) => cursor.read(buf),
            Backing::File(file) => file.read(buf),
        }
    }
}

impl Seek for SpillBuffer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.backing {
            Backing::Memory(cursor) => cursor.seek(pos),
            Backing::File(file) => file.seek(pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(threshold: usize) -> SpillBuffer {
        SpillBuffer::new(BufferConfig {
            spill_threshold_bytes: threshold,
            temp_dir: None,
        })
    }

    #[test]
    fn test_stays_in_memory_under_threshold() {
        let mut buf = small(16);
        buf.write_all(b"0123456789abcdef").unwrap();
        assert!(!buf.is_spilled());
        assert_eq!(buf.len().unwrap(), 16);
    }

    #[test]
    fn test_spills_past_threshold_and_keeps_bytes() {
        let mut buf = small(16);
        buf.write_all(b"0123456789").unwrap();
        buf.write_all(b"abcdefghij").unwrap();
        assert!(buf.is_spilled());
        assert_eq!(buf.len().unwrap(), 20);
        assert_eq!(buf.read_all().unwrap(), b"0123456789abcdefghij");
    }

    #[test]
    fn test_zero_threshold_spills_on_first_write() {
        let mut buf = small(0);
        buf.write_all(b"").unwrap();
        assert!(!buf.is_spilled());
        buf.write_all(b"x").unwrap();
        assert!(buf.is_spilled());
    }

    #[test]
    fn test_spill_into_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = SpillBuffer::new(BufferConfig {
            spill_threshold_bytes: 4,
            temp_dir: Some(dir.path().to_path_buf()),
        });
        buf.write_all(b"more than four").unwrap();
        assert!(buf.is_spilled());
        assert_eq!(buf.read_all().unwrap(), b"more than four");
    }

    #[test]
    fn test_seek_and_partial_read_after_spill() {
        let mut buf = small(8);
        buf.write_all(b"hello spilled world").unwrap();
        buf.seek(SeekFrom::Start(6)).unwrap();
        let mut out = [0u8; 7];
        buf.read_exact(&mut out).unwrap();
        assert_eq!(&out, b"spilled");
    }
}
