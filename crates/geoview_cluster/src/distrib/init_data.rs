//! Static initialization state
//!
//! Distributed once at startup. Rendering processes read it a single time and
//! do not keep a live mapping.

use super::{decode, encode, ObjectId, ObjectStore, StoreError, VersionPolicy};
use serde::{Deserialize, Serialize};

/// Startup state shared with every process
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InitData {
    model_file_name: String,
    frame_data_id: ObjectId,

    #[serde(skip)]
    id: Option<ObjectId>,
}

impl InitData {
    /// Create init data for a model file
    pub fn new(model_file_name: impl Into<String>) -> Self {
        Self {
            model_file_name: model_file_name.into(),
            ..Self::default()
        }
    }

    /// Model every process loads its scene from
    pub fn model_file_name(&self) -> &str {
        &self.model_file_name
    }

    /// Id of the shared frame state
    pub fn frame_data_id(&self) -> ObjectId {
        self.frame_data_id
    }

    /// Point at the shared frame state; `ObjectId::ZERO` clears the reference
    pub fn set_frame_data_id(&mut self, id: ObjectId) {
        self.frame_data_id = id;
    }

    /// Distribution id, if registered
    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    /// Publish this state
    pub fn register(&mut self, store: &dyn ObjectStore) -> Result<ObjectId, StoreError> {
        if let Some(id) = self.id {
            return Ok(id);
        }
        let id = store.register(encode(self)?);
        self.id = Some(id);
        Ok(id)
    }

    /// Withdraw this state from the store
    pub fn deregister(&mut self, store: &dyn ObjectStore) {
        if let Some(id) = self.id.take() {
            store.deregister(id);
        }
    }
}

/// Per-process holder of the init data and its attach state
#[derive(Debug, Default)]
pub struct InitDataSlot {
    data: InitData,
    mapped_id: Option<ObjectId>,
}

impl InitDataSlot {
    /// Slot holding locally created init data (coordinating process)
    pub fn with_data(data: InitData) -> Self {
        Self { data, mapped_id: None }
    }

    /// The init data
    pub fn data(&self) -> &InitData {
        &self.data
    }

    /// Mutable access to the init data
    pub fn data_mut(&mut self) -> &mut InitData {
        &mut self.data
    }

    /// Id this process is attached under, either as owner or as mapper
    pub fn attached_id(&self) -> Option<ObjectId> {
        self.data.id.or(self.mapped_id)
    }

    /// Whether the init data is available in this process
    pub fn is_attached(&self) -> bool {
        self.attached_id().is_some()
    }

    /// Attach to the distributed init data.
    ///
    /// Idempotent for the same id. The payload is read once with a blocking
    /// attach and not kept live.
    ///
    /// # Panics
    /// Attaching under a different id than before is a programming error.
    pub fn map(&mut self, store: &dyn ObjectStore, id: ObjectId) -> Result<(), StoreError> {
        if let Some(attached) = self.attached_id() {
            assert_eq!(attached, id, "init data already attached under a different id");
            return Ok(());
        }

        let (version, payload) = store.map_sync(id, VersionPolicy::Oldest)?;
        self.data = decode(&payload)?;
        self.mapped_id = Some(id);

        log::info!(
            "Mapped init data {} (version {}): model '{}'",
            id,
            version,
            self.data.model_file_name
        );
        Ok(())
    }

    /// Forget a previous mapping
    pub fn reset(&mut self) {
        self.mapped_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distrib::LocalObjectStore;

    fn published(store: &LocalObjectStore) -> ObjectId {
        let mut data = InitData::new("earth.earth");
        data.set_frame_data_id(ObjectId(99));
        data.register(store).unwrap()
    }

    #[test]
    fn test_map_reads_payload_once() {
        let store = LocalObjectStore::default();
        let id = published(&store);

        let mut slot = InitDataSlot::default();
        slot.map(&store, id).unwrap();

        assert_eq!(slot.data().model_file_name(), "earth.earth");
        assert_eq!(slot.data().frame_data_id(), ObjectId(99));
        assert_eq!(slot.attached_id(), Some(id));
    }

    #[test]
    fn test_map_twice_is_idempotent() {
        let store = LocalObjectStore::default();
        let id = published(&store);

        let mut slot = InitDataSlot::default();
        slot.map(&store, id).unwrap();
        store.deregister(id);

        // A second attach would block forever on the deregistered object
        slot.map(&store, id).unwrap();
        assert!(slot.is_attached());
    }

    #[test]
    fn test_owner_is_attached() {
        let store = LocalObjectStore::default();
        let mut slot = InitDataSlot::with_data(InitData::new("earth.earth"));
        let id = slot.data_mut().register(&store).unwrap();

        slot.map(&store, id).unwrap();
        assert_eq!(slot.attached_id(), Some(id));
    }

    #[test]
    #[should_panic(expected = "different id")]
    fn test_map_with_other_id_is_fatal() {
        let store = LocalObjectStore::default();
        let id = published(&store);

        let mut slot = InitDataSlot::default();
        slot.map(&store, id).unwrap();
        let _ = slot.map(&store, ObjectId(1));
    }
}
