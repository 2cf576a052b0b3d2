#![forbid(unsafe_code)]
#![allow(dead_code)]

use hist_core::history::{PublishTag, ResourceState};
use hist_core::ids::{PrincipalId, ResourceId, StructureId};
use hist_core::paths::parent_folder;
use hist_storage::{LiveResource, LiveTree, SqliteHistoryStore, StoreError, VersionCounters};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("hist_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn open_store(test_name: &str) -> (SqliteHistoryStore, MemoryLiveTree, PathBuf) {
    init_tracing();
    let dir = temp_dir(test_name);
    let live = MemoryLiveTree::default();
    let store = SqliteHistoryStore::open(&dir, live.clone()).expect("open store");
    (store, live, dir)
}

#[derive(Default)]
struct LiveState {
    resources: BTreeMap<StructureId, LiveResource>,
    counters: BTreeMap<StructureId, VersionCounters>,
}

/// In-memory live tree shared between a test and the store under test.
#[derive(Clone, Default)]
pub struct MemoryLiveTree {
    state: Arc<Mutex<LiveState>>,
}

impl MemoryLiveTree {
    pub fn insert(&self, resource: &LiveResource) {
        let mut state = self.state.lock().expect("live tree lock");
        state.resources.insert(resource.structure_id, resource.clone());
    }

    pub fn remove(&self, structure_id: StructureId) {
        let mut state = self.state.lock().expect("live tree lock");
        state.resources.remove(&structure_id);
    }

    pub fn set_counters(&self, structure_id: StructureId, structure_version: i32, resource_version: i32) {
        let mut state = self.state.lock().expect("live tree lock");
        state.counters.insert(
            structure_id,
            VersionCounters {
                structure_version,
                resource_version,
            },
        );
    }
}

impl LiveTree for MemoryLiveTree {
    fn exists_in_live_tree(&self, structure_id: StructureId) -> Result<bool, StoreError> {
        let state = self.state.lock().expect("live tree lock");
        Ok(state.resources.contains_key(&structure_id))
    }

    fn read_parent_folder(
        &self,
        structure_id: StructureId,
    ) -> Result<Option<LiveResource>, StoreError> {
        let state = self.state.lock().expect("live tree lock");
        let Some(parent_path) = state
            .resources
            .get(&structure_id)
            .and_then(|resource| parent_folder(&resource.path))
        else {
            return Ok(None);
        };
        Ok(state
            .resources
            .values()
            .find(|resource| resource.path == parent_path)
            .cloned())
    }

    fn read_resource(&self, path: &str) -> Result<Option<LiveResource>, StoreError> {
        let state = self.state.lock().expect("live tree lock");
        Ok(state
            .resources
            .values()
            .find(|resource| resource.path == path)
            .cloned())
    }

    fn read_version_counters(
        &self,
        _resource_id: ResourceId,
        structure_id: StructureId,
    ) -> Result<VersionCounters, StoreError> {
        let state = self.state.lock().expect("live tree lock");
        Ok(state.counters.get(&structure_id).copied().unwrap_or_default())
    }
}

pub fn live_file(structure_id: StructureId, resource_id: ResourceId, path: &str) -> LiveResource {
    let user = PrincipalId::nil();
    LiveResource {
        structure_id,
        resource_id,
        path: path.to_string(),
        type_id: 1,
        flags: 0,
        state: ResourceState::Changed,
        date_created: 1_000,
        user_created: user,
        date_last_modified: 1_000,
        user_last_modified: user,
        date_released: 0,
        date_expired: i64::MAX,
        date_content: 1_000,
        size: 0,
        sibling_count: 1,
        content: Some(Vec::new()),
    }
}

pub fn live_folder(structure_id: StructureId, resource_id: ResourceId, path: &str) -> LiveResource {
    LiveResource {
        type_id: 0,
        content: None,
        ..live_file(structure_id, resource_id, path)
    }
}

/// Publishes `resource` with the given version counters, the way the publish pipeline would.
pub fn publish(
    store: &mut SqliteHistoryStore,
    live: &MemoryLiveTree,
    resource: &LiveResource,
    structure_version: i32,
    resource_version: i32,
    publish_tag: PublishTag,
) {
    live.insert(resource);
    live.set_counters(resource.structure_id, structure_version, resource_version);
    store
        .write_resource(resource, &[], publish_tag)
        .expect("write resource");
}

/// Publishes a new content state: `size` and `content` are derived from `marker`.
pub fn with_content(mut resource: LiveResource, marker: &str) -> LiveResource {
    resource.content = Some(marker.as_bytes().to_vec());
    resource.size = i64::try_from(marker.len()).expect("content size");
    resource
}

pub fn project_request(
    publish_tag: PublishTag,
    publish_date: i64,
    paths: &[&str],
) -> hist_storage::WriteProjectRequest {
    let owner = PrincipalId::nil();
    hist_storage::WriteProjectRequest {
        publish_tag,
        publish_date,
        published_by: owner,
        project: hist_storage::ProjectInfo {
            project_id: hist_core::ids::ProjectId::nil(),
            name: "Offline".to_string(),
            description: "default project".to_string(),
            owner_id: owner,
            user_group_id: owner,
            manager_group_id: owner,
            date_created: 0,
        },
        paths: paths.iter().map(|path| path.to_string()).collect(),
    }
}
