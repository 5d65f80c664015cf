//! Shared frame state
//!
//! The coordinating process owns the master copy and commits it once per
//! frame; rendering processes hold a [`FrameDataReplica`] synced to the version
//! announced with each frame.

use super::{decode, encode, ObjectId, ObjectStore, StoreError, Version, VersionPolicy};
use crate::foundation::math::Mat4d;
use crate::view::ViewId;
use serde::{Deserialize, Serialize};

/// Per-frame state replicated to every process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameData {
    simulation_time: f64,
    calendar_time: i64,
    current_view_id: ViewId,
    view_matrix: Mat4d,
    statistics: bool,

    #[serde(skip)]
    id: Option<ObjectId>,
}

impl Default for FrameData {
    fn default() -> Self {
        Self {
            simulation_time: 0.0,
            calendar_time: 0,
            current_view_id: ViewId::NONE,
            view_matrix: Mat4d::identity(),
            statistics: false,
            id: None,
        }
    }
}

impl FrameData {
    /// Create an unregistered frame state
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the application started
    pub fn simulation_time(&self) -> f64 {
        self.simulation_time
    }

    /// Set the simulation time in seconds
    pub fn set_simulation_time(&mut self, seconds: f64) {
        self.simulation_time = seconds;
    }

    /// Wall-clock time in unix seconds
    pub fn calendar_time(&self) -> i64 {
        self.calendar_time
    }

    /// Set the wall-clock time
    pub fn set_calendar_time(&mut self, unix_seconds: i64) {
        self.calendar_time = unix_seconds;
    }

    /// View that receives input
    pub fn current_view_id(&self) -> ViewId {
        self.current_view_id
    }

    /// Change the view that receives input
    pub fn set_current_view_id(&mut self, view_id: ViewId) {
        self.current_view_id = view_id;
    }

    /// View matrix of the current view
    pub fn view_matrix(&self) -> &Mat4d {
        &self.view_matrix
    }

    /// Set the view matrix of the current view
    pub fn set_view_matrix(&mut self, matrix: Mat4d) {
        self.view_matrix = matrix;
    }

    /// Whether the statistics overlay is shown
    pub fn statistics(&self) -> bool {
        self.statistics
    }

    /// Flip the statistics overlay flag
    pub fn toggle_statistics(&mut self) {
        self.statistics = !self.statistics;
        log::info!("Statistics overlay {}", if self.statistics { "on" } else { "off" });
    }

    /// Distribution id, if registered
    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    /// Whether this instance is registered with a store
    pub fn is_attached(&self) -> bool {
        self.id.is_some()
    }

    /// Publish this state; the current values become version 1
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

    /// Publish the current values as a new version
    pub fn commit(&self, store: &dyn ObjectStore) -> Result<Version, StoreError> {
        let id = self.id.ok_or(StoreError::NotRegistered(ObjectId::ZERO))?;
        store.commit(id, encode(self)?)
    }
}

/// Read-only copy of the shared frame state in a rendering process
#[derive(Debug)]
pub struct FrameDataReplica {
    id: ObjectId,
    version: Version,
    data: FrameData,
}

impl FrameDataReplica {
    /// Attach to the frame state, starting from the oldest retained version
    pub fn map(store: &dyn ObjectStore, id: ObjectId) -> Result<Self, StoreError> {
        let (version, payload) = store.map_sync(id, VersionPolicy::Oldest)?;
        let data = decode(&payload)?;
        log::debug!("Mapped frame data {} at version {}", id, version);
        Ok(Self { id, version, data })
    }

    /// Bring the replica to `version`, blocking until it is committed.
    ///
    /// Older or equal versions are a no-op.
    pub fn sync(&mut self, store: &dyn ObjectStore, version: Version) -> Result<&FrameData, StoreError> {
        if version > self.version {
            let payload = store.sync(self.id, version)?;
            self.data = decode(&payload)?;
            self.version = version;
        }
        Ok(&self.data)
    }

    /// Version currently applied
    pub fn version(&self) -> Version {
        self.version
    }

    /// Current state
    pub fn data(&self) -> &FrameData {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distrib::LocalObjectStore;

    #[test]
    fn test_commit_requires_registration() {
        let store = LocalObjectStore::default();
        let frame_data = FrameData::new();
        assert!(frame_data.commit(&store).is_err());
    }

    #[test]
    fn test_replica_sees_committed_values() {
        let store = LocalObjectStore::default();
        let mut frame_data = FrameData::new();
        let id = frame_data.register(&store).unwrap();

        let mut replica = FrameDataReplica::map(&store, id).unwrap();
        assert_eq!(replica.version(), 1);

        frame_data.set_simulation_time(2.5);
        frame_data.set_current_view_id(ViewId(7));
        frame_data.toggle_statistics();
        let version = frame_data.commit(&store).unwrap();

        let observed = replica.sync(&store, version).unwrap();
        assert!((observed.simulation_time() - 2.5).abs() < f64::EPSILON);
        assert_eq!(observed.current_view_id(), ViewId(7));
        assert!(observed.statistics());
        assert!(!observed.is_attached());
    }

    #[test]
    fn test_register_is_idempotent() {
        let store = LocalObjectStore::default();
        let mut frame_data = FrameData::new();
        let first = frame_data.register(&store).unwrap();
        let second = frame_data.register(&store).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.object_count(), 1);

        frame_data.deregister(&store);
        assert!(!frame_data.is_attached());
        assert_eq!(store.object_count(), 0);
    }
}
