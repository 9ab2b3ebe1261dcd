use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("unsupported media category: {0}")]
    UnsupportedCategory(String),

    #[error("invalid media key length: {actual} bytes (expected {expected})")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid encrypted payload: too short ({len} bytes, minimum {min})")]
    MalformedPayload { len: usize, min: usize },

    #[error("MAC validation failed: the data is corrupt, tampered with, or the key is wrong")]
    AuthenticationFailure,

    #[error("cipher failure: {0}")]
    CipherFailure(String),

    #[error("key derivation failed: {0}")]
    KeyDerivationFailure(String),

    #[error("cannot write to a finalized seal pipeline")]
    AlreadyFinalized,

    #[error("cannot write to an open (decrypting) pipeline")]
    NotWritable,

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// True for writes attempted in a state that does not accept them.
    pub fn is_illegal_state(&self) -> bool {
        matches!(self, MediaError::AlreadyFinalized | MediaError::NotWritable)
    }

    /// Rebuild an equivalent error for a pipeline that keeps reporting a past failure.
    ///
    /// `std::io::Error` is not `Clone`, so I/O failures are replayed with the
    /// same kind and message.
    pub fn replay(&self) -> MediaError {
        match self {
            MediaError::UnsupportedCategory(s) => MediaError::UnsupportedCategory(s.clone()),
            MediaError::InvalidKeyLength { expected, actual } => MediaError::InvalidKeyLength {
                expected: *expected,
                actual: *actual,
            },
            MediaError::MalformedPayload { len, min } => MediaError::MalformedPayload {
                len: *len,
                min: *min,
            },
            MediaError::AuthenticationFailure => MediaError::AuthenticationFailure,
            MediaError::CipherFailure(s) => MediaError::CipherFailure(s.clone()),
            MediaError::KeyDerivationFailure(s) => MediaError::KeyDerivationFailure(s.clone()),
            MediaError::AlreadyFinalized => MediaError::AlreadyFinalized,
            MediaError::NotWritable => MediaError::NotWritable,
            MediaError::Config(s) => MediaError::Config(s.clone()),
            MediaError::Io(e) => MediaError::Io(std::io::Error::new(e.kind(), e.to_string())),
        }
    }
}

impl From<MediaError> for std::io::Error {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Io(e) => e,
            MediaError::MalformedPayload { .. }
            | MediaError::AuthenticationFailure
            | MediaError::CipherFailure(_) => {
                std::io::Error::new(std::io::ErrorKind::InvalidData, err)
            }
            other => std::io::Error::other(other),
        }
    }
}
