pub mod config;
pub mod error;
pub mod types;

pub use config::BufferConfig;
pub use error::{MediaError, MediaResult};
pub use types::MediaCategory;
