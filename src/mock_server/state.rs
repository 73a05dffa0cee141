//! Mock server state management.
//!
//! Provides the in-memory volumes served by the mock Drycc controller.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{FilerDirEntry, Timestamp, API_VERSION};

/// A file stored on a mock volume.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub content: Vec<u8>,
    pub modified: Timestamp,
}

/// One multipart upload as the mock controller received it.
#[derive(Debug, Clone, Default)]
pub struct UploadRecord {
    /// Form field names in arrival order.
    pub fields: Vec<String>,
    /// Where the file was stored.
    pub stored_at: String,
}

/// Shared state for the mock server.
///
/// This struct holds all the mock data that the server will serve.
/// It's wrapped in `Arc<RwLock<_>>` for concurrent access.
#[derive(Debug)]
pub struct MockState {
    /// Files indexed by (app, volume), then by path inside the volume.
    pub volumes: HashMap<(String, String), BTreeMap<String, StoredFile>>,

    /// Sent as `DRYCC_API_VERSION` on every response.
    pub api_version: String,

    /// Sent as `DRYCC_PLATFORM_VERSION` on every response.
    pub platform_version: String,

    /// Optional authentication token. If set, filer requests must include this token.
    pub required_token: Option<String>,

    /// Uploads received, oldest first.
    pub uploads: Vec<UploadRecord>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            volumes: HashMap::new(),
            api_version: API_VERSION.to_string(),
            platform_version: "v-mock".to_string(),
            required_token: None,
            uploads: Vec::new(),
        }
    }
}

/// Strip surrounding slashes from a volume path.
pub fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Add an empty volume.
    pub fn with_volume(mut self, app: &str, volume: &str) -> Self {
        self.volumes
            .entry((app.to_string(), volume.to_string()))
            .or_default();
        self
    }

    /// Add a file to a volume, creating the volume if needed.
    pub fn with_file(mut self, app: &str, volume: &str, path: &str, content: &[u8]) -> Self {
        self.put_file(app, volume, path, content.to_vec());
        self
    }

    /// Report a different API version.
    pub fn with_api_version(mut self, version: &str) -> Self {
        self.api_version = version.to_string();
        self
    }

    /// Set the required authentication token.
    pub fn with_required_token(mut self, token: &str) -> Self {
        self.required_token = Some(token.to_string());
        self
    }

    /// Check an `Authorization` header value against the required token.
    pub fn accepts(&self, authorization: Option<&str>) -> bool {
        match &self.required_token {
            Some(token) => authorization == Some(format!("token {token}").as_str()),
            None => true,
        }
    }

    /// Returns true if the volume exists.
    pub fn has_volume(&self, app: &str, volume: &str) -> bool {
        self.volumes
            .contains_key(&(app.to_string(), volume.to_string()))
    }

    /// Get a file.
    pub fn get_file(&self, app: &str, volume: &str, path: &str) -> Option<&StoredFile> {
        self.volumes
            .get(&(app.to_string(), volume.to_string()))?
            .get(&normalize(path))
    }

    /// Store a file, replacing any previous content.
    pub fn put_file(&mut self, app: &str, volume: &str, path: &str, content: Vec<u8>) {
        let file = StoredFile {
            content,
            modified: Timestamp::from(Utc::now()),
        };
        self.volumes
            .entry((app.to_string(), volume.to_string()))
            .or_default()
            .insert(normalize(path), file);
    }

    /// Delete a file. Returns false if it did not exist.
    pub fn delete_file(&mut self, app: &str, volume: &str, path: &str) -> bool {
        self.volumes
            .get_mut(&(app.to_string(), volume.to_string()))
            .and_then(|files| files.remove(&normalize(path)))
            .is_some()
    }

    /// List a directory: subdirectories first, then files, each sorted by name.
    pub fn list_dir(&self, app: &str, volume: &str, dir: &str) -> Vec<FilerDirEntry> {
        let Some(files) = self.volumes.get(&(app.to_string(), volume.to_string())) else {
            return Vec::new();
        };

        let dir = normalize(dir);
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };

        let mut dirs = BTreeSet::new();
        let mut entries = Vec::new();
        for (path, file) in files {
            let Some(rest) = path.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((sub, _)) => {
                    dirs.insert(sub.to_string());
                }
                None => entries.push(FilerDirEntry {
                    name: Some(rest.to_string()),
                    path: Some(path.clone()),
                    size: Some(file.content.len().to_string()),
                    entry_type: Some("file".to_string()),
                    timestamp: Some(file.modified.to_string()),
                }),
            }
        }

        dirs.into_iter()
            .map(|name| FilerDirEntry {
                path: Some(format!("{prefix}{name}")),
                name: Some(name),
                size: None,
                entry_type: Some("dir".to_string()),
                timestamp: None,
            })
            .chain(entries)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> MockState {
        MockState::new()
            .with_file("app", "vol", "tmp/a.txt", b"a")
            .with_file("app", "vol", "/tmp/logs/b.log", b"bb")
            .with_file("app", "vol", "root.txt", b"root")
    }

    #[test]
    fn test_state_add_and_get_file() {
        let state = sample_state();

        let file = state.get_file("app", "vol", "/tmp/a.txt");
        assert!(file.is_some());
        assert_eq!(file.unwrap().content, b"a");
        assert!(state.get_file("app", "other", "tmp/a.txt").is_none());
    }

    #[test]
    fn test_state_list_dir() {
        let state = sample_state();

        let root = state.list_dir("app", "vol", "/");
        let names: Vec<_> = root.iter().filter_map(|e| e.name.as_deref()).collect();
        assert_eq!(names, vec!["tmp", "root.txt"]);
        assert!(root[0].is_dir());

        let tmp = state.list_dir("app", "vol", "tmp/");
        let names: Vec<_> = tmp.iter().filter_map(|e| e.name.as_deref()).collect();
        assert_eq!(names, vec!["logs", "a.txt"]);
        assert_eq!(tmp[1].size.as_deref(), Some("1"));
        assert!(tmp[1].modified().unwrap().is_some());
    }

    #[test]
    fn test_state_delete_file() {
        let mut state = sample_state();
        assert!(state.delete_file("app", "vol", "tmp/a.txt"));
        assert!(!state.delete_file("app", "vol", "tmp/a.txt"));
        assert!(state.get_file("app", "vol", "tmp/a.txt").is_none());
    }

    #[test]
    fn test_state_accepts_token() {
        let state = MockState::new().with_required_token("abc");
        assert!(state.accepts(Some("token abc")));
        assert!(!state.accepts(Some("token nope")));
        assert!(!state.accepts(None));
        assert!(MockState::new().accepts(None));
    }
}
