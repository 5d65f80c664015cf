//! # Distributed Objects
//!
//! Client side of the replication protocol that carries state from the
//! coordinating process to every rendering process.
//!
//! ## Contract
//!
//! - Registering an object publishes its first version (1) under a fresh id.
//! - Every `commit` publishes the next version; readers see whole versions only.
//! - Mapping attaches to the oldest version still retained and blocks until the
//!   object exists.
//! - `sync(version)` blocks until that version has been committed.
//!
//! Payloads are RON text so any serde type can be distributed.

pub mod frame_data;
pub mod init_data;
pub mod local_store;

pub use frame_data::{FrameData, FrameDataReplica};
pub use init_data::{InitData, InitDataSlot};
pub use local_store::LocalObjectStore;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier of a distributed object
///
/// Serialized as 32 hex digits since not every text format carries 128-bit
/// integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectId(pub u128);

impl ObjectId {
    /// The "no object" identifier
    pub const ZERO: Self = Self(0);

    /// Generate a random, non-zero identifier
    pub fn generate() -> Self {
        loop {
            let id = rand::random::<u128>();
            if id != 0 {
                return Self(id);
            }
        }
    }

    /// Whether this identifier refers to an object
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        u128::from_str_radix(&text, 16)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

/// Version of a distributed object; the first committed version is 1
pub type Version = u64;

/// First version of every registered object
pub const VERSION_FIRST: Version = 1;

/// Which version a new mapping starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionPolicy {
    /// The oldest version the store still retains
    Oldest,
    /// The newest committed version
    Head,
}

/// Replication protocol errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// The object was never registered or has been deregistered
    #[error("Object {0} is not registered")]
    NotRegistered(ObjectId),

    /// The requested version is older than the retained history
    #[error("Version {version} of object {id} is no longer retained")]
    VersionDropped {
        /// Object identifier
        id: ObjectId,
        /// Requested version
        version: Version,
    },

    /// Payload could not be encoded
    #[error("Encode error: {0}")]
    Encode(String),

    /// Payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

/// The replication protocol consumed by this crate.
///
/// Implementations must be shareable between the threads that stand in for
/// cluster processes.
pub trait ObjectStore: Send + Sync {
    /// Publish a new object and return its id; the payload becomes version 1
    fn register(&self, payload: String) -> ObjectId;

    /// Withdraw an object; unknown ids are ignored
    fn deregister(&self, id: ObjectId);

    /// Publish the next version of an object
    fn commit(&self, id: ObjectId, payload: String) -> Result<Version, StoreError>;

    /// Attach to an object, blocking until it is registered
    fn map_sync(&self, id: ObjectId, policy: VersionPolicy) -> Result<(Version, String), StoreError>;

    /// Fetch `version` of an object, blocking until it has been committed
    fn sync(&self, id: ObjectId, version: Version) -> Result<String, StoreError>;

    /// Whether an object is currently registered
    fn is_registered(&self, id: ObjectId) -> bool;
}

/// Serialize a distributable value
pub fn encode<T: Serialize>(value: &T) -> Result<String, StoreError> {
    ron::to_string(value).map_err(|e| StoreError::Encode(e.to_string()))
}

/// Deserialize a distributable value
pub fn decode<T: for<'de> Deserialize<'de>>(payload: &str) -> Result<T, StoreError> {
    ron::from_str(payload).map_err(|e| StoreError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_valid() {
        let a = ObjectId::generate();
        let b = ObjectId::generate();
        assert!(a.is_valid());
        assert_ne!(a, b);
        assert!(!ObjectId::ZERO.is_valid());
    }

    #[test]
    fn test_object_id_text_form() {
        let id = ObjectId(0xabc);
        let text = encode(&id).unwrap();
        assert_eq!(text, "\"00000000000000000000000000000abc\"");
        assert_eq!(decode::<ObjectId>(&text).unwrap(), id);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result: Result<InitData, _> = decode("not ron at all {");
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }
}
