//! Device directory abstraction
//!
//! The directory stores devices, networks and network groups. Authorization
//! and accounting consult it once per datagram through the
//! [`DeviceDirectory`] trait, so a persistent store can be substituted for
//! the in-process [`MemoryDirectory`].
//!
//! # Concurrency
//!
//! Devices carry a `version` that the directory bumps on every write. An
//! update presenting a stale version fails with
//! [`DirectoryError::Conflict`]; callers reject the request rather than
//! retrying. Assigning a device to a full network fails with
//! [`DirectoryError::CapacityExceeded`] in the same atomic write.
//!
//! # Usage
//!
//! ```rust
//! use nac_server::directory::{Device, DeviceDirectory, MemoryDirectory};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = MemoryDirectory::new();
//! let device = directory.create_device(Device::new("AA:BB:CC:DD:EE:FF")).await?;
//! assert_eq!(device.version, 1);
//!
//! let found = directory.find_device_by_mac("AA:BB:CC:DD:EE:FF").await?;
//! assert_eq!(found.map(|d| d.id), Some(device.id));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod memory;
pub mod model;

pub use error::DirectoryError;
pub use memory::MemoryDirectory;
pub use model::{Device, DeviceId, Network, NetworkGroup, NetworkGroupId, NetworkId, UserId};

use async_trait::async_trait;

/// Store consumed by the authorization, accounting and disconnect services.
///
/// Implementations must be thread-safe; every method may suspend.
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    /// Look up a device by MAC address
    async fn find_device_by_mac(&self, mac: &str) -> Result<Option<Device>, DirectoryError>;

    async fn get_device(&self, id: DeviceId) -> Result<Option<Device>, DirectoryError>;

    async fn list_devices(&self) -> Result<Vec<Device>, DirectoryError>;

    /// Insert a device, assigning its id and initial version.
    ///
    /// Fails with [`DirectoryError::DuplicateMac`] if the MAC is taken and
    /// with [`DirectoryError::CapacityExceeded`] if its network is full.
    async fn create_device(&self, device: Device) -> Result<Device, DirectoryError>;

    /// Replace a stored device.
    ///
    /// `device.version` must equal the stored version. Moving the device to
    /// a different network checks that network's capacity.
    async fn update_device(&self, device: Device) -> Result<Device, DirectoryError>;

    /// Remove a device and its assignment. Returns whether it existed.
    async fn delete_device(&self, id: DeviceId) -> Result<bool, DirectoryError>;

    async fn find_devices_by_user(&self, user_id: UserId) -> Result<Vec<Device>, DirectoryError>;

    /// Remove every device owned by a user, returning how many were removed
    async fn delete_devices_by_user(&self, user_id: UserId) -> Result<usize, DirectoryError>;

    async fn create_network_group(&self, group: NetworkGroup) -> Result<NetworkGroup, DirectoryError>;

    async fn get_network_group(
        &self,
        id: NetworkGroupId,
    ) -> Result<Option<NetworkGroup>, DirectoryError>;

    async fn list_network_groups(&self) -> Result<Vec<NetworkGroup>, DirectoryError>;

    async fn update_network_group(&self, group: NetworkGroup) -> Result<NetworkGroup, DirectoryError>;

    /// Remove a group. Fails with [`DirectoryError::InUse`] while networks
    /// still belong to it.
    async fn delete_network_group(&self, id: NetworkGroupId) -> Result<bool, DirectoryError>;

    async fn create_network(&self, network: Network) -> Result<Network, DirectoryError>;

    async fn get_network(&self, id: NetworkId) -> Result<Option<Network>, DirectoryError>;

    async fn list_networks(&self) -> Result<Vec<Network>, DirectoryError>;

    async fn update_network(&self, network: Network) -> Result<Network, DirectoryError>;

    /// Remove a network, detaching every device assigned to it
    async fn delete_network(&self, id: NetworkId) -> Result<bool, DirectoryError>;

    /// First network (by id) in a registration group with a free slot
    async fn find_registration_network_with_capacity(
        &self,
    ) -> Result<Option<Network>, DirectoryError>;

    /// Number of devices currently assigned to a network
    async fn count_assignments(&self, network_id: NetworkId) -> Result<usize, DirectoryError>;
}
