//! Dependency change cache.
//!
//! A digest of `package.json` and the lockfile is stored after every successful
//! install. When the fresh digest equals the stored one, a plain install has
//! nothing to do. The digest is advisory: a stale match costs a skipped install,
//! never correctness, so MD5 is plenty.

use md5::{Digest, Md5};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use crate::error::CacheError;
use crate::lockfile::dependency_lockfile;

pub const DEFAULT_HASH_FILE: &str = "node_modules/.anypm/deps-hash";

#[derive(Debug, Clone)]
pub struct DepsCache {
    project_dir: PathBuf,
    hash_file: PathBuf,
}

impl DepsCache {
    /// `hash_file` is resolved against `project_dir` unless absolute.
    pub fn new(project_dir: &Path, hash_file: &Path) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            hash_file: project_dir.join(hash_file),
        }
    }

    pub fn hash_file(&self) -> &Path {
        &self.hash_file
    }

    /// The stored digest, or `None` when never written or unreadable.
    pub fn read_stored_hash(&self) -> Option<String> {
        match fs::read_to_string(&self.hash_file) {
            Ok(text) => {
                let hash = text.trim();
                (!hash.is_empty()).then(|| hash.to_string())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(
                    path = %self.hash_file.display(),
                    %e,
                    "ignoring unreadable dependency hash"
                );
                None
            }
        }
    }

    /// Persist `hash`, replacing any previous value.
    pub fn write_stored_hash(&self, hash: &str) -> Result<(), CacheError> {
        let write = || -> io::Result<()> {
            if let Some(parent) = self.hash_file.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&self.hash_file, format!("{hash}\n"))
        };
        write().map_err(|source| CacheError {
            path: self.hash_file.clone(),
            source,
        })
    }

    /// Digest of the manifest followed by the dependency lockfile, hex encoded.
    pub fn compute_hash(&self) -> io::Result<String> {
        let mut hasher = Md5::new();
        let manifest = self.project_dir.join("package.json");
        let lockfile = dependency_lockfile(&self.project_dir).map(|found| found.path);

        for path in std::iter::once(manifest).chain(lockfile) {
            let name = path.file_name().unwrap_or_default().to_string_lossy().into_owned();
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            hasher.update(name.as_bytes());
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(&bytes);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Whether the stored digest matches `fresh`.
    pub fn is_current(&self, fresh: &str) -> bool {
        self.read_stored_hash().as_deref() == Some(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn project() -> (tempfile::TempDir, DepsCache) {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies":{"react":"^18.2.0"}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("package-lock.json"), "{}").unwrap();
        let cache = DepsCache::new(dir.path(), Path::new(DEFAULT_HASH_FILE));
        (dir, cache)
    }

    #[test]
    fn test_missing_hash_reads_as_none() {
        let (_dir, cache) = project();
        assert_eq!(cache.read_stored_hash(), None);
    }

    #[test]
    fn test_round_trip() {
        let (_dir, cache) = project();
        let hash = cache.compute_hash().unwrap();
        cache.write_stored_hash(&hash).unwrap();

        assert_eq!(cache.read_stored_hash().as_deref(), Some(hash.as_str()));
        assert_eq!(cache.compute_hash().unwrap(), hash);
        assert!(cache.is_current(&hash));
    }

    #[test]
    fn test_write_overwrites() {
        let (_dir, cache) = project();
        cache.write_stored_hash("first").unwrap();
        cache.write_stored_hash("second").unwrap();
        assert_eq!(cache.read_stored_hash().as_deref(), Some("second"));
    }

    #[test]
    fn test_trailing_newline_tolerated() {
        let (_dir, cache) = project();
        fs::create_dir_all(cache.hash_file().parent().unwrap()).unwrap();
        fs::write(cache.hash_file(), "abc123\r\n").unwrap();
        assert_eq!(cache.read_stored_hash().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_manifest_change_changes_hash() {
        let (dir, cache) = project();
        let before = cache.compute_hash().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies":{"react":"^19.0.0"}}"#,
        )
        .unwrap();
        assert_ne!(cache.compute_hash().unwrap(), before);
    }

    #[test]
    fn test_lockfile_change_changes_hash() {
        let (dir, cache) = project();
        let before = cache.compute_hash().unwrap();
        fs::write(dir.path().join("package-lock.json"), r#"{"lockfileVersion":3}"#).unwrap();
        assert_ne!(cache.compute_hash().unwrap(), before);
    }

    #[test]
    fn test_hash_is_hex_md5() {
        let (_dir, cache) = project();
        let hash = cache.compute_hash().unwrap();
        assert_eq!(hash.len(), 32);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_unreadable_hash_reads_as_none() {
        let (_dir, cache) = project();
        fs::create_dir_all(cache.hash_file()).unwrap();
        assert_eq!(cache.read_stored_hash(), None);
        assert!(!cache.is_current(&cache.compute_hash().unwrap()));
    }

    #[test]
    fn test_write_failure_is_reported() {
        let (dir, _) = project();
        fs::write(dir.path().join("blocker"), "").unwrap();
        let cache = DepsCache::new(dir.path(), Path::new("blocker/deps-hash"));
        let err = cache.write_stored_hash("abc").unwrap_err();
        assert_eq!(err.path, dir.path().join("blocker/deps-hash"));
    }
}
