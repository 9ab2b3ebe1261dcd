//! Helpers over the caller's byte-stream (`Read`/`Seek`)

use std::io::{self, Read, Seek, SeekFrom};

/// Total length of a seekable stream; the cursor is restored.
pub(crate) fn stream_len<S: Seek>(stream: &mut S) -> io::Result<u64> {
    let position = stream.stream_position()?;
    let end = stream.seek(SeekFrom::End(0))?;
    if position != end {
        stream.seek(SeekFrom::Start(position))?;
    }
    Ok(end)
}

/// Read up to `len` bytes; shorter only at end of stream.
pub(crate) fn read_up_to<R: Read>(stream: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(len.min(64 * 1024));
    stream.take(len as u64).read_to_end(&mut out)?;
    Ok(out)
}

pub(crate) fn is_eof<S: Seek>(stream: &mut S) -> io::Result<bool> {
    let position = stream.stream_position()?;
    Ok(position >= stream_len(stream)?)
}

/// Everything from the start of the stream, leaving the cursor at the end.
pub(crate) fn contents<S: Read + Seek>(stream: &mut S) -> io::Result<Vec<u8>> {
    stream.seek(SeekFrom::Start(0))?;
    let mut out = Vec::new();
    stream.read_to_end(&mut out)?;
    Ok(out)
}
