//! Decrypt side: verify the whole envelope on first access, then serve plaintext
//!
//! ```text
//! Unverified --first access--> Verified   (one-way)
//!                          \-> Failed     (sticky: every later access errors)
//! ```
//!
//! The MAC is checked before decryption is attempted; unauthenticated
//! ciphertext never reaches AES.

use std::io::{self, Read, Seek, SeekFrom};

use wamedia_core::{BufferConfig, MediaCategory, MediaError, MediaResult};

use crate::buffer::SpillBuffer;
use crate::envelope::open_envelope;
use crate::keys::{derive_keys, DerivedKeys, MediaKey};
use crate::stream;

/// Observable lifecycle of an [`OpenPipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenState {
    Unverified,
    Verified,
    Failed,
}

/// Read-only decrypting view over an envelope held in `R`.
pub struct OpenPipeline<R> {
    source: R,
    category: MediaCategory,
    keys: DerivedKeys,
    config: BufferConfig,
    /// `None` until first access; afterwards the plaintext or the sticky failure.
    verified: Option<MediaResult<SpillBuffer>>,
}

impl<R: Read + Seek> OpenPipeline<R> {
    pub fn new(source: R, media_key: &MediaKey, category: MediaCategory) -> MediaResult<Self> {
        Self::with_config(source, media_key, category, BufferConfig::default())
    }

    pub fn with_config(
        source: R,
        media_key: &MediaKey,
        category: MediaCategory,
        config: BufferConfig,
    ) -> MediaResult<Self> {
        let keys = derive_keys(media_key, category)?;
        Ok(Self {
            source,
            category,
            keys,
            config,
            verified: None,
        })
    }

    pub fn category(&self) -> MediaCategory {
        self.category
    }

    pub fn state(&self) -> OpenState {
        match &self.verified {
            None => OpenState::Unverified,
            Some(Ok(_)) => OpenState::Verified,
            Some(Err(_)) => OpenState::Failed,
        }
    }

    /// Verify and decrypt the source envelope. Idempotent; failures are not retried.
    pub fn finalize(&mut self) -> MediaResult<()> {
        self.plaintext().map(|_| ())
    }

    fn plaintext(&mut self) -> MediaResult<&mut SpillBuffer> {
        let outcome = self.verified.get_or_insert_with(|| {
            verify_and_decrypt(&mut self.source, &self.keys, self.category, &self.config)
        });
        match outcome {
            Ok(buffer) => Ok(buffer),
            Err(err) => Err(err.replay()),
        }
    }

    /// Plaintext length.
    pub fn size(&mut self) -> MediaResult<u64> {
        Ok(self.plaintext()?.len()?)
    }

    pub fn position(&mut self) -> MediaResult<u64> {
        Ok(self.plaintext()?.stream_position()?)
    }

    pub fn read_up_to(&mut self, len: usize) -> MediaResult<Vec<u8>> {
        Ok(stream::read_up_to(self.plaintext()?, len)?)
    }

    pub fn seek_to(&mut self, offset: u64) -> MediaResult<()> {
        self.plaintext()?.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    pub fn is_eof(&mut self) -> MediaResult<bool> {
        Ok(stream::is_eof(self.plaintext()?)?)
    }

    /// The whole plaintext, read from the start.
    pub fn contents(&mut self) -> MediaResult<Vec<u8>> {
        Ok(self.plaintext()?.read_all()?)
    }

    /// Always fails: the open pipeline is read-only.
    pub fn write(&mut self, _bytes: &[u8]) -> MediaResult<usize> {
        Err(MediaError::NotWritable)
    }

    pub fn is_readable(&self) -> bool {
        true
    }

    pub fn is_writable(&self) -> bool {
        false
    }

    pub fn is_seekable(&self) -> bool {
        true
    }

    /// Hand back the source stream, discarding any decrypted plaintext.
    pub fn into_inner(self) -> R {
        self.source
    }
}

fn verify_and_decrypt<R: Read + Seek>(
    source: &mut R,
    keys: &DerivedKeys,
    category: MediaCategory,
    config: &BufferConfig,
) -> MediaResult<SpillBuffer> {
    let envelope = stream::contents(source)?;

    let plaintext = open_envelope(keys, &envelope).inspect_err(|err| match err {
        MediaError::MalformedPayload { len, .. } => {
            tracing::warn!(%category, len, "rejecting truncated media envelope")
        }
        MediaError::AuthenticationFailure => tracing::warn!(
            %category,
            envelope_len = envelope.len(),
            "media envelope failed MAC validation"
        ),
        _ => {}
    })?;

    let mut buffer = SpillBuffer::new(config.clone());
    io::Write::write_all(&mut buffer, &plaintext)?;
    buffer.seek(SeekFrom::Start(0))?;

    tracing::debug!(
        %category,
        envelope_len = envelope.len(),
        plaintext_len = plaintext.len(),
        "opened media envelope"
    );

    Ok(buffer)
}

impl<R: Read + Seek> Read for OpenPipeline<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.plaintext()?.read(buf)
    }
}

impl<R: Read + Seek> Seek for OpenPipeline<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.plaintext()?.seek(pos)
    }
}

impl<R> std::fmt::Debug for OpenPipeline<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenPipeline")
            .field("category", &self.category)
            .field("keys", &self.keys)
            .field("verified", &self.verified.as_ref().map(|r| r.is_ok()))
            .finish_non_exhaustive()
    }
}
