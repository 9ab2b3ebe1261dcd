use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{MediaError, MediaResult};

/// Default in-memory threshold before buffered media spills to disk: 2 MiB.
pub const DEFAULT_SPILL_THRESHOLD: usize = 2 * 1024 * 1024;

/// Buffering policy for pipeline plaintext/ciphertext accumulation.
///
/// Embeddable in a host's TOML config, e.g. under a `[media.buffer]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Bytes held in memory before spilling to a temporary file (default: 2 MiB)
    pub spill_threshold_bytes: usize,
    /// Directory for spill files (default: the OS temp dir)
    pub temp_dir: Option<PathBuf>,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            spill_threshold_bytes: DEFAULT_SPILL_THRESHOLD,
            temp_dir: None,
        }
    }
}

impl BufferConfig {
    pub fn from_toml_str(s: &str) -> MediaResult<Self> {
        toml::from_str(s).map_err(|e| MediaError::Config(format!("invalid buffer config: {e}")))
    }
}
