//! Chunked RSA-OAEP encryption/decryption
//!
//! RSA can only encrypt a message a little smaller than its modulus. Payloads
//! are split into chunks of [`max_chunk_size`] bytes, each chunk is encrypted
//! on its own with OAEP (SHA-256 digest, MGF1-SHA-256, empty label), and the
//! resulting blocks are framed in order (see [`crate::frame`]).
//!
//! Chunks are independent, so both directions fan out across the rayon pool.
//! OAEP is randomized: encrypting the same payload twice gives different blobs.

use rayon::prelude::*;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use camvault_core::{VaultError, VaultResult};

use crate::frame::{push_frame, split_frames};
use crate::LENGTH_PREFIX_LEN;

/// Largest plaintext a single OAEP-SHA256 encryption accepts under `key`.
///
/// `k - 2*hLen - 2` where `k` is the modulus length in bytes (190 for RSA-2048).
pub fn max_chunk_size(key: &RsaPublicKey) -> usize {
    key.size()
        .saturating_sub(2 * <Sha256 as Digest>::output_size() + 2)
}

fn oaep() -> Oaep {
    Oaep::new::<Sha256>()
}

/// Encrypt `plaintext` into a framed blob. An empty plaintext yields an empty blob.
pub fn encrypt(plaintext: &[u8], key: &RsaPublicKey) -> VaultResult<Vec<u8>> {
    if plaintext.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_size = max_chunk_size(key);
    if chunk_size == 0 {
        return Err(VaultError::Encryption {
            chunk: 0,
            reason: format!("{}-byte modulus is too small for OAEP-SHA256", key.size()),
        });
    }

    let blocks = plaintext
        .par_chunks(chunk_size)
        .enumerate()
        .map(|(index, chunk)| {
            key.encrypt(&mut rand::thread_rng(), oaep(), chunk)
                .map_err(|e| VaultError::Encryption {
                    chunk: index,
                    reason: e.to_string(),
                })
        })
        .collect::<VaultResult<Vec<Vec<u8>>>>()?;

    let mut blob = Vec::with_capacity(blocks.len() * (LENGTH_PREFIX_LEN + key.size()));
    for block in &blocks {
        push_frame(&mut blob, block)?;
    }

    tracing::debug!(
        bytes = plaintext.len(),
        chunks = blocks.len(),
        chunk_size,
        blob_bytes = blob.len(),
        "payload encrypted"
    );
    Ok(blob)
}

/// Decrypt a framed blob produced by [`encrypt`].
///
/// The whole blob is parsed before any block is decrypted, so structural damage
/// is always reported as [`VaultError::Framing`]. A block that parses but fails
/// OAEP unpadding (wrong key, flipped bits, short block) is [`VaultError::Decryption`].
pub fn decrypt(blob: &[u8], key: &RsaPrivateKey) -> VaultResult<Vec<u8>> {
    let frames = split_frames(blob)?;

    let chunks = frames
        .par_iter()
        .enumerate()
        .map(|(index, block)| {
            key.decrypt_blinded(&mut rand::thread_rng(), oaep(), block)
                .map_err(|_| VaultError::Decryption { frame: index })
        })
        .collect::<VaultResult<Vec<Vec<u8>>>>()?;

    let plaintext = chunks.concat();
    tracing::debug!(
        frames = frames.len(),
        bytes = plaintext.len(),
        "payload decrypted"
    );
    Ok(plaintext)
}
