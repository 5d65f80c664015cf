//! In-process replication store
//!
//! Every simulated process of a local cluster shares one store. Waiting
//! mappers and syncers park on a condition variable that is signalled on every
//! registration and commit.

use super::{ObjectId, ObjectStore, StoreError, Version, VersionPolicy, VERSION_FIRST};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};

struct Entry {
    /// Retained versions, oldest first
    versions: VecDeque<(Version, String)>,
}

impl Entry {
    fn head(&self) -> Version {
        self.versions.back().map_or(0, |(version, _)| *version)
    }

    fn oldest(&self) -> Option<&(Version, String)> {
        self.versions.front()
    }

    fn get(&self, version: Version) -> Option<&String> {
        self.versions
            .iter()
            .find(|(v, _)| *v == version)
            .map(|(_, payload)| payload)
    }
}

/// Shared-memory implementation of [`ObjectStore`]
pub struct LocalObjectStore {
    objects: Mutex<HashMap<ObjectId, Entry>>,
    changed: Condvar,
    history_depth: usize,
}

impl LocalObjectStore {
    /// Create a store retaining `history_depth` versions per object
    pub fn new(history_depth: usize) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            changed: Condvar::new(),
            history_depth: history_depth.max(1),
        }
    }

    /// Newest committed version of an object
    pub fn head_version(&self, id: ObjectId) -> Option<Version> {
        self.objects.lock().get(&id).map(Entry::head)
    }

    /// Number of registered objects
    pub fn object_count(&self) -> usize {
        self.objects.lock().len()
    }
}

impl Default for LocalObjectStore {
    fn default() -> Self {
        Self::new(16)
    }
}

impl ObjectStore for LocalObjectStore {
    fn register(&self, payload: String) -> ObjectId {
        let id = ObjectId::generate();
        let mut versions = VecDeque::with_capacity(self.history_depth);
        versions.push_back((VERSION_FIRST, payload));

        self.objects.lock().insert(id, Entry { versions });
        self.changed.notify_all();

        log::debug!("Registered object {}", id);
        id
    }

    fn deregister(&self, id: ObjectId) {
        if self.objects.lock().remove(&id).is_some() {
            log::debug!("Deregistered object {}", id);
        }
        self.changed.notify_all();
    }

    fn commit(&self, id: ObjectId, payload: String) -> Result<Version, StoreError> {
        let version = {
            let mut objects = self.objects.lock();
            let entry = objects.get_mut(&id).ok_or(StoreError::NotRegistered(id))?;

            let version = entry.head() + 1;
            entry.versions.push_back((version, payload));
            while entry.versions.len() > self.history_depth {
                entry.versions.pop_front();
            }
            version
        };
        self.changed.notify_all();

        log::trace!("Committed object {} version {}", id, version);
        Ok(version)
    }

    fn map_sync(&self, id: ObjectId, policy: VersionPolicy) -> Result<(Version, String), StoreError> {
        let mut objects = self.objects.lock();
        loop {
            if let Some(entry) = objects.get(&id) {
                let found = match policy {
                    VersionPolicy::Oldest => entry.oldest(),
                    VersionPolicy::Head => entry.versions.back(),
                };
                if let Some((version, payload)) = found {
                    return Ok((*version, payload.clone()));
                }
            }
            self.changed.wait(&mut objects);
        }
    }

    fn sync(&self, id: ObjectId, version: Version) -> Result<String, StoreError> {
        let mut objects = self.objects.lock();
        loop {
            let entry = objects.get(&id).ok_or(StoreError::NotRegistered(id))?;
            if entry.head() >= version {
                return entry
                    .get(version)
                    .cloned()
                    .ok_or(StoreError::VersionDropped { id, version });
            }
            self.changed.wait(&mut objects);
        }
    }

    fn is_registered(&self, id: ObjectId) -> bool {
        self.objects.lock().contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_commit_increments_version() {
        let store = LocalObjectStore::new(4);
        let id = store.register("a".to_string());

        assert_eq!(store.head_version(id), Some(VERSION_FIRST));
        assert_eq!(store.commit(id, "b".to_string()).unwrap(), 2);
        assert_eq!(store.commit(id, "c".to_string()).unwrap(), 3);
        assert_eq!(store.sync(id, 2).unwrap(), "b");
    }

    #[test]
    fn test_map_oldest_after_history_trim() {
        let store = LocalObjectStore::new(2);
        let id = store.register("v1".to_string());
        store.commit(id, "v2".to_string()).unwrap();
        store.commit(id, "v3".to_string()).unwrap();

        let (version, payload) = store.map_sync(id, VersionPolicy::Oldest).unwrap();
        assert_eq!(version, 2);
        assert_eq!(payload, "v2");
        assert!(matches!(store.sync(id, 1), Err(StoreError::VersionDropped { version: 1, .. })));
    }

    #[test]
    fn test_commit_unknown_object_fails() {
        let store = LocalObjectStore::default();
        let result = store.commit(ObjectId(42), "x".to_string());
        assert!(matches!(result, Err(StoreError::NotRegistered(_))));
    }

    #[test]
    fn test_sync_blocks_until_commit() {
        let store = Arc::new(LocalObjectStore::default());
        let id = store.register("first".to_string());

        let reader = {
            let store = Arc::clone(&store);
            thread::spawn(move || store.sync(id, 3))
        };

        store.commit(id, "second".to_string()).unwrap();
        store.commit(id, "third".to_string()).unwrap();

        assert_eq!(reader.join().unwrap().unwrap(), "third");
    }

    #[test]
    fn test_deregister_removes_object() {
        let store = LocalObjectStore::default();
        let id = store.register("x".to_string());
        assert!(store.is_registered(id));

        store.deregister(id);
        assert!(!store.is_registered(id));
        assert_eq!(store.object_count(), 0);
    }
}
