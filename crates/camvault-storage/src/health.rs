//! Store health check

use std::fs::{self, OpenOptions};
use std::io::Write;

use camvault_core::VaultResult;

use crate::store::ArtifactStore;

/// Verify the store directory is writable by creating and removing a probe file
pub fn check_health(store: &ArtifactStore) -> VaultResult<()> {
    let probe = store
        .root()
        .join(format!(".healthcheck-{}", std::process::id()));
    let result = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&probe)
        .and_then(|mut f| f.write_all(b"ok"));
    let _ = fs::remove_file(&probe);
    Ok(result?)
}

/// Returns true if the store is writable, false otherwise (non-panicking)
pub fn is_healthy(store: &ArtifactStore) -> bool {
    check_health(store).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        assert!(is_healthy(&store));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0, "probe removed");
    }

    #[test]
    fn test_missing_root_is_unhealthy() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("vault")).unwrap();
        fs::remove_dir(store.root()).unwrap();
        assert!(check_health(&store).is_err());
    }
}
