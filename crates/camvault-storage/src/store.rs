//! Filesystem artifact store
//!
//! Layout (all files directly under the store root):
//! ```text
//! image_<stamp>-<nonce>.enc           ciphertext blob, written once
//! metadata_<stamp>-<nonce>.json       {"original_timestamp", "server_timestamp", "filename"}
//! ```
//!
//! Each file is written to a hidden temporary, synced, then hard-linked to its
//! final name. The link fails instead of replacing an existing file, so an id
//! collision can never overwrite a stored artifact. The blob goes first; if the
//! sidecar cannot be written the blob is removed again before the error returns.

use rand::Rng;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use camvault_core::types::{ArtifactMeta, UploadMeta};
use camvault_core::{VaultError, VaultResult};

use crate::id::ArtifactId;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open (creating if needed) the store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> VaultResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn blob_path(&self, id: &ArtifactId) -> PathBuf {
        self.root.join(id.blob_filename())
    }

    pub fn metadata_path(&self, id: &ArtifactId) -> PathBuf {
        self.root.join(id.metadata_filename())
    }

    /// Persist `blob` under a freshly generated id and return the id.
    pub fn store(&self, blob: &[u8], upload: &UploadMeta) -> VaultResult<ArtifactId> {
        let now = SystemTime::now();
        let id = ArtifactId::generate(now)?;
        let server_timestamp = now
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        let meta = ArtifactMeta {
            original_timestamp: upload.original_timestamp.clone(),
            server_timestamp,
            filename: id.to_string(),
        };
        self.store_as(&id, blob, &meta)?;
        Ok(id)
    }

    /// Persist `blob` and `meta` under a caller-chosen id.
    ///
    /// Fails with `IdCollision` if either file for `id` already exists.
    pub fn store_as(&self, id: &ArtifactId, blob: &[u8], meta: &ArtifactMeta) -> VaultResult<()> {
        let meta_json = serde_json::to_vec(meta)
            .map_err(|e| VaultError::Other(anyhow::anyhow!("encoding metadata: {e}")))?;

        let blob_path = self.blob_path(id);
        write_exclusive(&blob_path, blob).map_err(|e| collision_or(e, id))?;

        if let Err(e) = write_exclusive(&self.metadata_path(id), &meta_json) {
            if let Err(cleanup) = fs::remove_file(&blob_path) {
                warn!(id = %id, "removing blob after failed metadata write: {cleanup}");
            }
            return Err(collision_or(e, id));
        }

        info!(id = %id, bytes = blob.len(), "artifact stored");
        Ok(())
    }

    /// Read the ciphertext blob for `id`.
    ///
    /// A blob without its metadata sidecar is logged and still returned.
    pub fn retrieve(&self, id: &str) -> VaultResult<Vec<u8>> {
        let id = ArtifactId::parse(id)?;
        let blob = match fs::read(self.blob_path(&id)) {
            Ok(blob) => blob,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(VaultError::NotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        if !self.metadata_path(&id).exists() {
            warn!(id = %id, "artifact has no metadata record (orphaned blob)");
        }
        debug!(id = %id, bytes = blob.len(), "artifact retrieved");
        Ok(blob)
    }

    /// Metadata for `id`; `None` when the blob exists but its sidecar does not.
    pub fn metadata(&self, id: &str) -> VaultResult<Option<ArtifactMeta>> {
        let id = ArtifactId::parse(id)?;
        match fs::read(self.metadata_path(&id)) {
            Ok(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                VaultError::Other(anyhow::anyhow!("parsing metadata for {id}: {e}"))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if self.blob_path(&id).exists() {
                    warn!(id = %id, "artifact has no metadata record (orphaned blob)");
                    Ok(None)
                } else {
                    Err(VaultError::NotFound(id.to_string()))
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All stored artifact ids, oldest first.
    pub fn list(&self) -> VaultResult<Vec<ArtifactId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if let Ok(id) = ArtifactId::parse(name) {
                    ids.push(id);
                }
            }
        }
        ids.sort_by(|a, b| {
            a.received_micros()
                .cmp(&b.received_micros())
                .then_with(|| a.as_str().cmp(b.as_str()))
        });
        Ok(ids)
    }
}

/// Write `data` to `dest` without ever replacing an existing file.
fn write_exclusive(dest: &Path, data: &[u8]) -> std::io::Result<()> {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let nonce: u64 = rand::thread_rng().gen();
    let tmp = dest.with_file_name(format!(".{name}.{nonce:016x}.tmp"));

    let result = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp)
        .and_then(|mut file| {
            file.write_all(data)?;
            file.sync_all()
        })
        .and_then(|()| fs::hard_link(&tmp, dest));

    let _ = fs::remove_file(&tmp);
    result
}

fn collision_or(e: std::io::Error, id: &ArtifactId) -> VaultError {
    if e.kind() == ErrorKind::AlreadyExists {
        VaultError::IdCollision(id.to_string())
    } else {
        VaultError::Io(e)
    }
}
