use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{GroupStore, SourceStore, StoreError};
use crate::models::{GroupRecord, Source};

/// On-disk snapshot layout, YAML or JSON
#[derive(Debug, Default, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
}

impl StoreSnapshot {
    /// Parse a snapshot; JSON documents are read through the YAML parser as well.
    pub fn parse(content: &str) -> Result<Self, StoreError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| StoreError::Format(e.to_string()))
    }
}

/// Sources keyed by id and groups keyed by token, held in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    sources: RwLock<HashMap<u64, Source>>,
    groups: RwLock<HashMap<String, GroupRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot. Groups without a token get a fresh one.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let sources = snapshot
            .sources
            .into_iter()
            .map(|source| (source.id, source))
            .collect();
        let groups = snapshot
            .groups
            .into_iter()
            .map(|mut group| {
                if group.token.trim().is_empty() {
                    group.token = generate_token();
                    debug!("Assigned token {} to group '{}'", group.token, group.name);
                }
                (group.token.clone(), group)
            })
            .collect();
        Self {
            sources: RwLock::new(sources),
            groups: RwLock::new(groups),
        }
    }

    pub fn from_snapshot_str(content: &str) -> Result<Self, StoreError> {
        StoreSnapshot::parse(content).map(Self::from_snapshot)
    }

    /// Load a snapshot file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let snapshot = StoreSnapshot::parse(&content)?;
        info!(
            "Loaded {} sources and {} groups from {}",
            snapshot.sources.len(),
            snapshot.groups.len(),
            path.display()
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Insert or replace a source.
    pub async fn insert_source(&self, source: Source) {
        self.sources.write().await.insert(source.id, source);
    }

    pub async fn remove_source(&self, id: u64) -> Option<Source> {
        self.sources.write().await.remove(&id)
    }

    /// Insert or replace a group, generating a token when it has none.
    ///
    /// Returns the token the group is reachable under.
    pub async fn insert_group(&self, mut group: GroupRecord) -> String {
        if group.token.trim().is_empty() {
            group.token = generate_token();
        }
        let token = group.token.clone();
        self.groups.write().await.insert(token.clone(), group);
        token
    }

    pub async fn remove_group(&self, token: &str) -> Option<GroupRecord> {
        self.groups.write().await.remove(token)
    }
}

impl SourceStore for MemoryStore {
    async fn get_source(&self, id: u64) -> Result<Option<Source>, StoreError> {
        Ok(self.sources.read().await.get(&id).cloned())
    }
}

impl GroupStore for MemoryStore {
    async fn get_group_by_token(&self, token: &str) -> Result<Option<GroupRecord>, StoreError> {
        Ok(self.groups.read().await.get(token).cloned())
    }
}

fn generate_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    const SNAPSHOT: &str = r#"
sources:
  - id: 1
    name: Airport
    content: "trojan://pw@a.example.com:443#A"
  - id: "2"
    name: Home
    url: "hy2://pw@b.example.com:443#B"
groups:
  - id: 1
    name: Main
    token: main-token
    status: 1
    config: '[{"subId": 1}]'
  - name: Fresh
    config: []
"#;

    #[test]
    fn test_snapshot_loading() {
        let store = MemoryStore::from_snapshot_str(SNAPSHOT).unwrap();
        block_on(async {
            let source = store.get_source(2).await.unwrap().unwrap();
            assert_eq!(source.name, "Home");
            assert!(source.content.starts_with("hy2://"));
            assert!(store.get_source(3).await.unwrap().is_none());

            let group = store.get_group_by_token("main-token").await.unwrap().unwrap();
            assert_eq!(group.name, "Main");
            assert!(group.enabled);
        });
        assert_eq!(store.groups.try_read().unwrap().len(), 2);
    }

    #[test]
    fn test_insert_group_generates_token() {
        let store = MemoryStore::new();
        block_on(async {
            let record = GroupRecord {
                id: 7,
                name: "New".to_string(),
                token: String::new(),
                enabled: true,
                config: serde_json::Value::Null,
                clash_config: serde_json::Value::Null,
            };
            let token = store.insert_group(record).await;
            assert_eq!(token.len(), 32);
            let found = store.get_group_by_token(&token).await.unwrap().unwrap();
            assert_eq!(found.id, 7);
            assert!(store.remove_group(&token).await.is_some());
            assert!(store.get_group_by_token(&token).await.unwrap().is_none());
        });
    }

    #[test]
    fn test_bad_snapshot() {
        assert!(matches!(
            MemoryStore::from_snapshot_str("sources: {"),
            Err(StoreError::Format(_))
        ));
        assert!(MemoryStore::from_snapshot_str("").is_ok());
    }
}
