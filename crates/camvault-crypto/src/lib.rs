//! camvault-crypto: RSA-OAEP encryption for arbitrary-length payloads
//!
//! Pipeline: plaintext → split into OAEP-sized chunks → RSA-OAEP(SHA-256) per chunk → frame
//!
//! Blob format (binary):
//! ```text
//! [4 bytes: block length, big-endian][block]  repeated once per chunk, in order
//! ```
//!
//! Keys live in two PEM files (PKCS#8 private, SPKI public) and are created
//! once on first start by [`KeyProvider::load_or_create`].

pub mod chunk;
pub mod frame;
pub mod keys;

pub use chunk::{decrypt, encrypt, max_chunk_size};
pub use frame::{push_frame, split_frames, Frames};
pub use keys::{load_or_create_keypair, KeyOrigin, KeyProvider, Keypair};

/// RSA modulus size for generated keys
pub const RSA_KEY_BITS: usize = 2048;

/// Standard RSA public exponent (F4)
pub const RSA_PUBLIC_EXPONENT: u32 = 65537;

/// Size of a frame's big-endian length prefix
pub const LENGTH_PREFIX_LEN: usize = 4;

#[cfg(test)]
pub(crate) fn test_keypair() -> &'static Keypair {
    static KEYPAIR: std::sync::OnceLock<Keypair> = std::sync::OnceLock::new();
    KEYPAIR.get_or_init(|| Keypair::generate().unwrap())
}
