use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{VaultError, VaultResult};

/// Top-level configuration (loaded from camvault.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub keys: KeyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP API listen address (default: 127.0.0.1:5000)
    pub listen: String,
    /// Prometheus metrics endpoint (default: 127.0.0.1:9100)
    pub metrics_addr: Option<String>,
    /// Largest accepted upload request body in bytes
    pub max_upload_bytes: usize,
    /// Log level (default: info)
    pub log_level: String,
    /// Log format: "json" or "text"
    pub log_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding encrypted artifacts and their metadata sidecars
    pub dir: PathBuf,
}

/// RSA key file locations. Unset paths resolve inside `storage.dir`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// PKCS#8 PEM private key
    pub private_key: Option<PathBuf>,
    /// SubjectPublicKeyInfo PEM public key
    pub public_key: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:5000".into(),
            metrics_addr: Some("127.0.0.1:9100".into()),
            max_upload_bytes: 16 * 1024 * 1024,
            log_level: "info".into(),
            log_format: "text".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("secure_images"),
        }
    }
}

impl VaultConfig {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> VaultResult<Self> {
        toml::from_str(content).map_err(|e| VaultError::Config(e.to_string()))
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> VaultResult<Self> {
        if !path.exists() {
            tracing::warn!(
                "config file not found: {}  (using defaults)",
                path.display()
            );
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| VaultError::Config(format!("reading {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| VaultError::Config(format!("parsing {}: {e}", path.display())))
    }

    pub fn private_key_path(&self) -> PathBuf {
        self.keys
            .private_key
            .clone()
            .unwrap_or_else(|| self.storage.dir.join("private_key.pem"))
    }

    pub fn public_key_path(&self) -> PathBuf {
        self.keys
            .public_key
            .clone()
            .unwrap_or_else(|| self.storage.dir.join("public_key.pem"))
    }
}
