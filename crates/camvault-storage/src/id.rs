//! Artifact identifiers
//!
//! ```text
//! image_<stamp>-<nonce>.enc      stamp = microseconds since the Unix epoch (decimal)
//!                                nonce = 8 lowercase hex digits from the thread RNG
//! image_<stamp>.enc              legacy form (second resolution, no nonce), read-only
//! ```
//!
//! The id doubles as the blob filename; the sidecar is `metadata_<stamp>[-<nonce>].json`.

use rand::Rng;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use camvault_core::{VaultError, VaultResult};

const PREFIX: &str = "image_";
const SUFFIX: &str = ".enc";
const NONCE_LEN: usize = 8;
/// u64 microseconds never exceed 20 decimal digits
const MAX_STAMP_DIGITS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactId {
    name: String,
    stamp: u64,
}

impl ArtifactId {
    /// Fresh id for an artifact received at `now`.
    pub fn generate(now: SystemTime) -> VaultResult<Self> {
        let micros = now
            .duration_since(UNIX_EPOCH)
            .map_err(|e| VaultError::Other(anyhow::anyhow!("system clock before epoch: {e}")))?
            .as_micros() as u64;
        let nonce: u32 = rand::thread_rng().gen();
        Ok(Self {
            name: format!("{PREFIX}{micros}-{nonce:08x}{SUFFIX}"),
            stamp: micros,
        })
    }

    /// Validate a client-supplied id. Anything but the documented shapes is `InvalidId`.
    pub fn parse(s: &str) -> VaultResult<Self> {
        let invalid = || VaultError::InvalidId(s.to_string());

        let core = s
            .strip_prefix(PREFIX)
            .and_then(|rest| rest.strip_suffix(SUFFIX))
            .ok_or_else(invalid)?;

        let (stamp, nonce) = match core.split_once('-') {
            Some((stamp, nonce)) => (stamp, Some(nonce)),
            None => (core, None),
        };

        if stamp.is_empty()
            || stamp.len() > MAX_STAMP_DIGITS
            || !stamp.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        if let Some(nonce) = nonce {
            let lower_hex = |b: u8| b.is_ascii_digit() || (b'a'..=b'f').contains(&b);
            if nonce.len() != NONCE_LEN || !nonce.bytes().all(lower_hex) {
                return Err(invalid());
            }
        }

        let stamp = stamp.parse::<u64>().map_err(|_| invalid())?;
        Ok(Self {
            name: s.to_string(),
            stamp,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Timestamp component: microseconds for current ids, seconds for legacy ones.
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    /// Receive time in microseconds, for ordering current and legacy ids together.
    pub fn received_micros(&self) -> u64 {
        if self.is_legacy() {
            self.stamp.saturating_mul(1_000_000)
        } else {
            self.stamp
        }
    }

    pub fn is_legacy(&self) -> bool {
        !self.name.contains('-')
    }

    /// Blob filename (the id itself).
    pub fn blob_filename(&self) -> &str {
        &self.name
    }

    pub fn metadata_filename(&self) -> String {
        let core = &self.name[PREFIX.len()..self.name.len() - SUFFIX.len()];
        format!("metadata_{core}.json")
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for ArtifactId {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_generate_shape() {
        let now = UNIX_EPOCH + Duration::from_micros(1_714_564_800_123_456);
        let id = ArtifactId::generate(now).unwrap();

        assert!(id.as_str().starts_with("image_1714564800123456-"));
        assert!(id.as_str().ends_with(".enc"));
        assert_eq!(id.stamp(), 1_714_564_800_123_456);
        assert!(!id.is_legacy());
        assert_eq!(ArtifactId::parse(id.as_str()).unwrap(), id);
    }

    #[test]
    fn test_same_instant_ids_differ() {
        let now = SystemTime::now();
        let a = ArtifactId::generate(now).unwrap();
        let b = ArtifactId::generate(now).unwrap();
        // 1 in 2^32 chance of a false failure
        assert_ne!(a, b);
    }

    #[test]
    fn test_metadata_filename() {
        let id = ArtifactId::parse("image_1714564800123456-0a1b2c3d.enc").unwrap();
        assert_eq!(id.metadata_filename(), "metadata_1714564800123456-0a1b2c3d.json");
    }

    #[test]
    fn test_legacy_id() {
        let id = ArtifactId::parse("image_1714564800.enc").unwrap();
        assert!(id.is_legacy());
        assert_eq!(id.stamp(), 1_714_564_800);
        assert_eq!(id.metadata_filename(), "metadata_1714564800.json");
    }

    #[test]
    fn test_rejects_malformed_ids() {
        for bad in [
            "",
            "image_.enc",
            "image_123.jpg",
            "photo_123.enc",
            "image_123-0A1B2C3D.enc",
            "image_123-0a1b2c.enc",
            "image_123-0a1b2c3d4.enc",
            "image_12a3.enc",
            "image_../../etc/passwd.enc",
            "image_123/456.enc",
            "image_123456789012345678901.enc",
            "image_-0a1b2c3d.enc",
        ] {
            let err = ArtifactId::parse(bad).unwrap_err();
            assert!(
                matches!(err, VaultError::InvalidId(ref s) if s == bad),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_stamp_overflow_rejected() {
        // 20 digits, but larger than u64::MAX
        assert!(ArtifactId::parse("image_99999999999999999999.enc").is_err());
    }
}
