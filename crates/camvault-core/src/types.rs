use serde::{Deserialize, Serialize};

/// Sidecar metadata stored next to each encrypted artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    /// Capture time as reported by the client, passed through verbatim
    #[serde(default)]
    pub original_timestamp: String,
    /// Server receive time, seconds since the Unix epoch
    pub server_timestamp: u64,
    /// Blob filename (equal to the artifact id)
    pub filename: String,
}

/// Client-supplied part of the metadata; the store fills in the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMeta {
    #[serde(default)]
    pub original_timestamp: String,
}
