use std::path::PathBuf;
use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("key load error ({}): {reason}", path.display())]
    KeyLoad { path: PathBuf, reason: String },

    #[error("key persist error ({}): {reason}", path.display())]
    KeyPersist { path: PathBuf, reason: String },

    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("decryption failed on frame {frame}")]
    Decryption { frame: usize },

    #[error("encryption failed on chunk {chunk}: {reason}")]
    Encryption { chunk: usize, reason: String },

    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("invalid artifact id: {0}")]
    InvalidId(String),

    #[error("artifact id already in use: {0}")]
    IdCollision(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VaultError {
    /// Stable short name for the error kind (used for metrics labels and logs).
    pub fn kind(&self) -> &'static str {
        match self {
            VaultError::KeyLoad { .. } => "key_load",
            VaultError::KeyPersist { .. } => "key_persist",
            VaultError::Framing(_) => "framing",
            VaultError::Decryption { .. } => "decryption",
            VaultError::Encryption { .. } => "encryption",
            VaultError::NotFound(_) => "not_found",
            VaultError::InvalidId(_) => "invalid_id",
            VaultError::IdCollision(_) => "id_collision",
            VaultError::Config(_) => "config",
            VaultError::Io(_) => "io",
            VaultError::Other(_) => "other",
        }
    }
}

/// Structural problems in a ciphertext blob, reported before any block is decrypted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramingError {
    #[error("blob ends inside a length prefix at offset {offset} ({remaining} of 4 bytes present)")]
    TruncatedLength { offset: usize, remaining: usize },

    #[error("frame at offset {offset} declares {declared} bytes but only {remaining} remain")]
    TruncatedBlock {
        offset: usize,
        declared: usize,
        remaining: usize,
    },
}
