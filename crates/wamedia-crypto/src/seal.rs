//! Encrypt side: buffer plaintext, then seal once into the output stream
//!
//! ```text
//! Writable --finalize()--> Finalized     (one-way)
//!     \                 \-> Failed       (sticky error)
//!      write_plaintext()
//! ```
//!
//! Any read-style accessor finalizes first, so reading a pipeline that was
//! never written produces a valid envelope of an empty payload.

use std::io::{self, Read, Seek, SeekFrom, Write};

use wamedia_core::{BufferConfig, MediaCategory, MediaError, MediaResult};

use crate::buffer::SpillBuffer;
use crate::envelope::seal_envelope;
use crate::keys::{derive_keys, DerivedKeys, MediaKey};
use crate::sidecar::generate_sidecar;
use crate::stream;

/// Observable lifecycle of a [`SealPipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SealState {
    Writable,
    Finalized,
    Failed,
}

/// What finalize leaves behind.
#[derive(Debug)]
struct Sealed {
    /// Bytes of `W` that belong to the envelope; anything past this was already there.
    envelope_len: u64,
    sidecar: Option<Vec<u8>>,
}

/// Encrypting pipeline writing `ciphertext || mac` into `W` on finalize.
pub struct SealPipeline<W> {
    output: W,
    category: MediaCategory,
    keys: DerivedKeys,
    plaintext: SpillBuffer,
    /// `None` while writable; afterwards the sealed envelope or the failure.
    sealed: Option<MediaResult<Sealed>>,
}

impl<W: Read + Write + Seek> SealPipeline<W> {
    pub fn new(output: W, media_key: &MediaKey, category: MediaCategory) -> MediaResult<Self> {
        Self::with_config(output, media_key, category, BufferConfig::default())
    }

    pub fn with_config(
        output: W,
        media_key: &MediaKey,
        category: MediaCategory,
        config: BufferConfig,
    ) -> MediaResult<Self> {
        let keys = derive_keys(media_key, category)?;
        Ok(Self {
            output,
            category,
            keys,
            plaintext: SpillBuffer::new(config),
            sealed: None,
        })
    }

    pub fn category(&self) -> MediaCategory {
        self.category
    }

    pub fn state(&self) -> SealState {
        match &self.sealed {
            None => SealState::Writable,
            Some(Ok(_)) => SealState::Finalized,
            Some(Err(_)) => SealState::Failed,
        }
    }

    /// Append plaintext. Fails with `AlreadyFinalized` once sealed.
    pub fn write_plaintext(&mut self, bytes: &[u8]) -> MediaResult<usize> {
        match &self.sealed {
            None => {}
            Some(Ok(_)) => return Err(MediaError::AlreadyFinalized),
            Some(Err(err)) => return Err(err.replay()),
        }
        if let Err(e) = self.plaintext.write_all(bytes) {
            let err = MediaError::Io(e);
            self.sealed = Some(Err(err.replay()));
            return Err(err);
        }
        Ok(bytes.len())
    }

    /// Encrypt the buffered plaintext and write the envelope. Idempotent.
    pub fn finalize(&mut self) -> MediaResult<()> {
        self.sealed().map(|_| ())
    }

    fn sealed(&mut self) -> MediaResult<&Sealed> {
        let outcome = self.sealed.get_or_insert_with(|| {
            // Taking the buffer drops any spill file as soon as sealing ends.
            let plaintext = std::mem::take(&mut self.plaintext);
            seal_into(plaintext, &self.keys, self.category, &mut self.output)
        });
        match outcome {
            Ok(sealed) => Ok(sealed),
            Err(err) => Err(err.replay()),
        }
    }

    /// Envelope bytes left between the cursor and the envelope end.
    fn remaining(&mut self) -> MediaResult<u64> {
        let end = self.sealed()?.envelope_len;
        Ok(end.saturating_sub(self.output.stream_position()?))
    }

    /// The streaming sidecar for Video/Audio; `None` for categories without one.
    pub fn sidecar(&mut self) -> MediaResult<Option<&[u8]>> {
        if !self.category.is_streamable() {
            return Ok(None);
        }
        Ok(self.sealed()?.sidecar.as_deref())
    }

    /// Size of the sealed envelope; stale bytes past it in the output are ignored.
    pub fn size(&mut self) -> MediaResult<u64> {
        Ok(self.sealed()?.envelope_len)
    }

    pub fn position(&mut self) -> MediaResult<u64> {
        self.finalize()?;
        Ok(self.output.stream_position()?)
    }

    /// Read at most `len` bytes, never past the end of the envelope.
    pub fn read_up_to(&mut self, len: usize) -> MediaResult<Vec<u8>> {
        let remaining = usize::try_from(self.remaining()?).unwrap_or(usize::MAX);
        Ok(stream::read_up_to(&mut self.output, len.min(remaining))?)
    }

    pub fn seek_to(&mut self, offset: u64) -> MediaResult<()> {
        self.finalize()?;
        self.output.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    pub fn is_eof(&mut self) -> MediaResult<bool> {
        Ok(self.remaining()? == 0)
    }

    /// The whole envelope, read from the start of the output stream.
    pub fn contents(&mut self) -> MediaResult<Vec<u8>> {
        self.finalize()?;
        self.output.seek(SeekFrom::Start(0))?;
        self.read_up_to(usize::MAX)
    }

    pub fn is_readable(&self) -> bool {
        true
    }

    pub fn is_writable(&self) -> bool {
        self.sealed.is_none()
    }

    pub fn is_seekable(&self) -> bool {
        true
    }

    /// Finalize and release the plaintext buffer.
    pub fn close(&mut self) -> MediaResult<()> {
        self.finalize()
    }

    /// Finalize and hand back the output stream, rewound to the envelope start.
    pub fn into_inner(self) -> MediaResult<W> {
        self.into_parts().map(|(output, _)| output)
    }

    /// Finalize and hand back the output stream together with the sidecar.
    pub fn into_parts(mut self) -> MediaResult<(W, Option<Vec<u8>>)> {
        self.finalize()?;
        let sidecar = match self.sealed {
            Some(Ok(sealed)) => sealed.sidecar,
            _ => None,
        };
        Ok((self.output, sidecar))
    }
}

fn seal_into<W: Write + Seek>(
    mut plaintext: SpillBuffer,
    keys: &DerivedKeys,
    category: MediaCategory,
    output: &mut W,
) -> MediaResult<Sealed> {
    let plaintext = plaintext.read_all()?;
    let envelope = seal_envelope(keys, &plaintext)?;

    output.seek(SeekFrom::Start(0))?;
    output.write_all(&envelope.ciphertext)?;
    output.write_all(&envelope.mac)?;
    output.flush()?;
    output.seek(SeekFrom::Start(0))?;

    let sidecar = category
        .is_streamable()
        .then(|| generate_sidecar(&envelope.signed_blob(keys), keys.mac_key()));

    tracing::debug!(
        %category,
        plaintext_len = plaintext.len(),
        envelope_len = envelope.len(),
        sidecar_len = sidecar.as_ref().map(Vec::len),
        "sealed media envelope"
    );

    Ok(Sealed {
        envelope_len: envelope.len() as u64,
        sidecar,
    })
}

impl<W: Read + Write + Seek> Write for SealPipeline<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_plaintext(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W> std::fmt::Debug for SealPipeline<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealPipeline")
            .field("category", &self.category)
            .field("keys", &self.keys)
            .field("sealed", &self.sealed.as_ref().map(|r| r.is_ok()))
            .finish_non_exhaustive()
    }
}
