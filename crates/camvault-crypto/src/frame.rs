//! Length-prefixed framing for ciphertext blobs
//!
//! Frame format (binary):
//! ```text
//! [4 bytes: block length L, big-endian u32][L bytes: block]
//! ```
//!
//! A blob is zero or more frames back to back with nothing in between and
//! nothing after the last one.

use camvault_core::{FramingError, VaultError, VaultResult};

use crate::LENGTH_PREFIX_LEN;

/// Append one `(length, block)` frame to `out`.
pub fn push_frame(out: &mut Vec<u8>, block: &[u8]) -> VaultResult<()> {
    let len = u32::try_from(block.len()).map_err(|_| {
        VaultError::Other(anyhow::anyhow!(
            "block of {} bytes does not fit a 32-bit length prefix",
            block.len()
        ))
    })?;
    out.reserve(LENGTH_PREFIX_LEN + block.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(block);
    Ok(())
}

/// Iterator over the blocks of a blob.
///
/// Yields an error at most once; iteration stops after the first malformed frame.
pub struct Frames<'a> {
    blob: &'a [u8],
    offset: usize,
}

impl<'a> Frames<'a> {
    pub fn new(blob: &'a [u8]) -> Self {
        Self { blob, offset: 0 }
    }
}

impl<'a> Iterator for Frames<'a> {
    type Item = Result<&'a [u8], FramingError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.blob[self.offset..];
        if rest.is_empty() {
            return None;
        }

        let offset = self.offset;
        // Fuse: any error below consumes the remainder
        self.offset = self.blob.len();

        if rest.len() < LENGTH_PREFIX_LEN {
            return Some(Err(FramingError::TruncatedLength {
                offset,
                remaining: rest.len(),
            }));
        }

        let (prefix, body) = rest.split_at(LENGTH_PREFIX_LEN);
        let mut len_bytes = [0u8; LENGTH_PREFIX_LEN];
        len_bytes.copy_from_slice(prefix);
        let declared = u32::from_be_bytes(len_bytes) as usize;

        if body.len() < declared {
            return Some(Err(FramingError::TruncatedBlock {
                offset,
                declared,
                remaining: body.len(),
            }));
        }

        self.offset = offset + LENGTH_PREFIX_LEN + declared;
        Some(Ok(&body[..declared]))
    }
}

/// Parse a whole blob into its blocks, failing on the first malformed frame.
pub fn split_frames(blob: &[u8]) -> Result<Vec<&[u8]>, FramingError> {
    Frames::new(blob).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob_of(blocks: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for block in blocks {
            push_frame(&mut out, block).unwrap();
        }
        out
    }

    #[test]
    fn test_push_frame_layout() {
        let blob = blob_of(&[b"abc"]);
        assert_eq!(blob, vec![0, 0, 0, 3, b'a', b'b', b'c']);
    }

    #[test]
    fn test_split_preserves_order() {
        let blob = blob_of(&[b"first", b"", b"third block"]);
        let frames = split_frames(&blob).unwrap();
        assert_eq!(frames, vec![&b"first"[..], &b""[..], &b"third block"[..]]);
    }

    #[test]
    fn test_empty_blob_has_no_frames() {
        assert!(split_frames(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_length_prefix() {
        let mut blob = blob_of(&[b"0123456789"]);
        blob.extend_from_slice(&[0, 0]);

        let err = split_frames(&blob).unwrap_err();
        assert_eq!(
            err,
            FramingError::TruncatedLength {
                offset: 14,
                remaining: 2
            }
        );
    }

    #[test]
    fn test_truncated_block() {
        let mut blob = blob_of(&[b"0123456789"]);
        blob.pop();

        let err = split_frames(&blob).unwrap_err();
        assert_eq!(
            err,
            FramingError::TruncatedBlock {
                offset: 0,
                declared: 10,
                remaining: 9
            }
        );
    }

    #[test]
    fn test_oversized_declared_length() {
        let blob = [0xFF, 0xFF, 0xFF, 0xFF, 1, 2, 3];
        assert!(matches!(
            split_frames(&blob),
            Err(FramingError::TruncatedBlock { declared: 0xFFFF_FFFF, .. })
        ));
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let blob = [0, 0, 0, 9, 1];
        let mut frames = Frames::new(&blob);
        assert!(frames.next().unwrap().is_err());
        assert!(frames.next().is_none());
    }
}
