//! Error types for device directory operations

use thiserror::Error;

/// Errors returned by a [`DeviceDirectory`](super::DeviceDirectory)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// Referenced entity does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    /// The device was modified since it was read
    #[error("Device {device_id} was modified concurrently (expected version {expected}, found {found})")]
    Conflict {
        device_id: u64,
        expected: u64,
        found: u64,
    },

    /// The network already holds as many devices as it allows
    #[error("Network {network_id} is at capacity ({capacity})")]
    CapacityExceeded { network_id: u64, capacity: u32 },

    /// Another device already uses this MAC address
    #[error("Device with MAC {0} already exists")]
    DuplicateMac(String),

    /// Another network group already uses this name
    #[error("Network group {0} already exists")]
    DuplicateGroup(String),

    /// Entity is still referenced and cannot be removed
    #[error("{0} is still in use")]
    InUse(String),

    /// Field value rejected by the directory
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
