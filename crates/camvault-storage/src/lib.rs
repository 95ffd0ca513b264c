//! camvault-storage: one directory, one blob file and one metadata sidecar per artifact

pub mod health;
pub mod id;
pub mod store;

pub use health::{check_health, is_healthy};
pub use id::ArtifactId;
pub use store::ArtifactStore;
