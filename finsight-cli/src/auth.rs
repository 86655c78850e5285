use anyhow::Result;
use finsight_core::{Credential, CredentialStore, StoreError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::state::session_path;

/// On-disk shape of `session.json`: a single fixed `token` key.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

/// Credential store backed by `~/.finsight/session.json`.
///
/// Every `get` re-reads the file, so a login or logout from another
/// process is seen on the next read. Nothing is locked; last write wins.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::new(session_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<Option<Credential>, StoreError> {
        let s = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_err(e)),
        };
        if s.trim().is_empty() {
            return Ok(None);
        }
        let file: SessionFile = serde_json::from_str(&s).map_err(|e| StoreError::Corrupt {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(file.token.and_then(Credential::new))
    }

    /// Written to a sibling temp file (owner-only on unix) and renamed over
    /// `session.json`, so readers see either the old token or the new one.
    fn set(&self, credential: &Credential) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| self.io_err(e))?;

        let file = SessionFile {
            token: Some(credential.as_str().to_string()),
        };
        let s = serde_json::to_string_pretty(&file).map_err(|e| StoreError::Corrupt {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| self.io_err(e))?;
        restrict_permissions(tmp.path()).map_err(|e| self.io_err(e))?;
        tmp.write_all(s.as_bytes()).map_err(|e| self.io_err(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_err(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_err(e.error))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

pub fn prompt(label: &str) -> Result<String> {
    eprint!("{}: ", label);
    io::stderr().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

/// Plain stdin read; input is echoed.
pub fn prompt_secret(label: &str) -> Result<String> {
    eprint!("{}: ", label);
    io::stderr().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsight_core::{Guarded, SessionContext, SessionGuard, View};
    use std::sync::Arc;

    fn store_in(dir: &tempfile::TempDir) -> FileCredentialStore {
        FileCredentialStore::new(dir.path().join("session.json"))
    }

    #[test]
    fn test_missing_file_is_unauthenticated() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).get().unwrap().is_none());
    }

    #[test]
    fn test_round_trip_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        store_in(&dir).set(&Credential::new("abc").unwrap()).unwrap();

        // a fresh store over the same file plays the part of a page reload
        let reloaded = store_in(&dir);
        assert_eq!(reloaded.get().unwrap().unwrap().as_str(), "abc");

        let raw = fs::read_to_string(reloaded.path()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["token"], "abc");
    }

    #[test]
    fn test_clear_removes_file_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set(&Credential::new("abc").unwrap()).unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
        store.clear().unwrap();
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.get(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_set_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{\"tok").unwrap();
        store.set(&Credential::new("fresh").unwrap()).unwrap();
        assert_eq!(store.get().unwrap().unwrap().as_str(), "fresh");

        // no temp files left beside session.json
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{}").unwrap();
        fs::set_permissions(store.path(), fs::Permissions::from_mode(0o644)).unwrap();

        store.set(&Credential::new("abc").unwrap()).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_logout_recovers_from_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{\"tok").unwrap();
        let session = SessionContext::new(Arc::new(store.clone()));

        assert!(session.logout().unwrap());
        assert!(!store.path().exists());
        assert!(!session.logout().unwrap());
    }

    #[test]
    fn test_corrupt_file_redirects_to_login() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{\"tok").unwrap();
        let session = SessionContext::new(Arc::new(store));

        let g = SessionGuard::new(View::Dashboard).mount(&session).unwrap();
        assert_eq!(g, Guarded::Redirect(View::Login));
    }

    #[test]
    fn test_other_writer_is_seen_on_next_read() {
        let dir = tempfile::tempdir().unwrap();
        let ours = store_in(&dir);
        let theirs = store_in(&dir);
        ours.set(&Credential::new("mine").unwrap()).unwrap();
        theirs.set(&Credential::new("theirs").unwrap()).unwrap();
        assert_eq!(ours.get().unwrap().unwrap().as_str(), "theirs");
    }

    #[test]
    fn test_logout_then_guard_redirects() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionContext::new(Arc::new(store_in(&dir)));
        session.set(&Credential::new("abc").unwrap()).unwrap();

        assert!(session.logout().unwrap());
        assert!(!session.logout().unwrap());
        let g = SessionGuard::new(View::Dashboard).mount(&session).unwrap();
        assert_eq!(g.redirect(), Some(View::Login));
    }
}
