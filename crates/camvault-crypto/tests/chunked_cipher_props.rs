//! Property tests for the chunked RSA-OAEP cipher.
//!
//! Case counts are kept low: every case performs real 2048-bit RSA operations.

use std::sync::OnceLock;

use camvault_core::VaultError;
use camvault_crypto::{decrypt, encrypt, max_chunk_size, split_frames, Keypair};
use proptest::prelude::*;

fn keypair() -> &'static Keypair {
    static KEYPAIR: OnceLock<Keypair> = OnceLock::new();
    KEYPAIR.get_or_init(|| Keypair::generate().expect("generate test keypair"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn roundtrip_any_payload(data in prop::collection::vec(any::<u8>(), 0..1200)) {
        let kp = keypair();
        let blob = encrypt(&data, kp.public_key()).unwrap();
        prop_assert_eq!(decrypt(&blob, kp.private_key()).unwrap(), data);
    }

    #[test]
    fn frame_count_is_ceil_of_chunks(len in 0usize..1200) {
        let kp = keypair();
        let chunk = max_chunk_size(kp.public_key());
        let blob = encrypt(&vec![0xA5; len], kp.public_key()).unwrap();
        let frames = split_frames(&blob).unwrap();
        prop_assert_eq!(frames.len(), len.div_ceil(chunk));
    }

    #[test]
    fn truncation_never_decodes(len in 1usize..600, cut in 1usize..=3) {
        let kp = keypair();
        let blob = encrypt(&vec![7u8; len], kp.public_key()).unwrap();
        let err = decrypt(&blob[..blob.len() - cut], kp.private_key()).unwrap_err();
        prop_assert!(matches!(err, VaultError::Framing(_)), "got {}", err);
    }

    #[test]
    fn single_bit_flip_is_detected(len in 1usize..400, pos in any::<prop::sample::Index>(), bit in 0u8..8) {
        let kp = keypair();
        let mut blob = encrypt(&vec![1u8; len], kp.public_key()).unwrap();

        // Only flip inside a block body, never a length prefix
        let frames = split_frames(&blob).unwrap().len();
        let frame = pos.index(frames);
        let offset = frame * (4 + 256) + 4 + pos.index(256);
        blob[offset] ^= 1 << bit;

        let err = decrypt(&blob, kp.private_key()).unwrap_err();
        prop_assert!(matches!(err, VaultError::Decryption { .. }), "got {}", err);
    }
}
