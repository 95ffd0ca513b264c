//! The keypair and the artifact store behind one handle
//!
//! Every call is synchronous and CPU- or disk-bound; async callers run them on
//! the blocking pool. The keypair is loaded once at startup and shared through
//! an `Arc`, so concurrent seals and opens never contend on anything.

use std::sync::Arc;

use camvault_core::types::UploadMeta;
use camvault_core::VaultResult;
use camvault_crypto::Keypair;
use camvault_storage::{ArtifactId, ArtifactStore};

pub struct Vault {
    keys: Arc<Keypair>,
    store: ArtifactStore,
}

impl Vault {
    pub fn new(keys: Arc<Keypair>, store: ArtifactStore) -> Self {
        Self { keys, store }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Encrypt `plaintext` with the public key and persist it; returns the new id.
    pub fn seal(&self, plaintext: &[u8], upload: &UploadMeta) -> VaultResult<ArtifactId> {
        let blob = camvault_crypto::encrypt(plaintext, self.keys.public_key())?;
        self.store.store(&blob, upload)
    }

    /// Load the blob for `id` and decrypt it with the private key.
    pub fn open(&self, id: &str) -> VaultResult<Vec<u8>> {
        let blob = self.store.retrieve(id)?;
        camvault_crypto::decrypt(&blob, self.keys.private_key())
    }

    pub fn list(&self) -> VaultResult<Vec<ArtifactId>> {
        self.store.list()
    }

    pub fn public_key_pem(&self) -> &[u8] {
        self.keys.public_key_pem()
    }
}
