//! In-memory device directory

use super::model::{Device, DeviceId, Network, NetworkGroup, NetworkGroupId, NetworkId, UserId};
use super::{DeviceDirectory, DirectoryError};
use crate::config::{Config, ConfigError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-process directory.
///
/// All tables live behind one `tokio::sync::RwLock`, so every write
/// (including its capacity and version checks) is atomic. Data is lost on
/// restart; seed it with [`MemoryDirectory::from_config`].
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    tables: Arc<RwLock<Tables>>,
}

#[derive(Debug, Default)]
struct Tables {
    devices: BTreeMap<DeviceId, Device>,
    networks: BTreeMap<NetworkId, Network>,
    groups: BTreeMap<NetworkGroupId, NetworkGroup>,
    next_device_id: DeviceId,
    next_network_id: NetworkId,
    next_group_id: NetworkGroupId,
}

fn next_id(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

impl Tables {
    fn assigned_count(&self, network_id: NetworkId, excluding: Option<DeviceId>) -> usize {
        self.devices
            .values()
            .filter(|d| d.network_id == Some(network_id) && Some(d.id) != excluding)
            .count()
    }

    /// Fails unless `device_id` can take a slot on `network_id`
    fn check_assignment(
        &self,
        network_id: NetworkId,
        device_id: Option<DeviceId>,
    ) -> Result<(), DirectoryError> {
        let network = self.networks.get(&network_id).ok_or(DirectoryError::NotFound {
            entity: "Network",
            id: network_id,
        })?;
        if self.assigned_count(network_id, device_id) >= network.capacity as usize {
            return Err(DirectoryError::CapacityExceeded {
                network_id,
                capacity: network.capacity,
            });
        }
        Ok(())
    }

    fn mac_taken(&self, mac: &str, excluding: Option<DeviceId>) -> bool {
        self.devices
            .values()
            .any(|d| d.mac == mac && Some(d.id) != excluding)
    }

    fn group_name_taken(&self, name: &str, excluding: Option<NetworkGroupId>) -> bool {
        self.groups
            .values()
            .any(|g| g.name == name && Some(g.id) != excluding)
    }

    fn validate_network(&self, network: &Network) -> Result<(), DirectoryError> {
        if !(1..=4094).contains(&network.vlan) {
            return Err(DirectoryError::InvalidInput(format!(
                "VLAN {} outside 1-4094",
                network.vlan
            )));
        }
        if network.capacity == 0 {
            return Err(DirectoryError::InvalidInput(
                "Network capacity must be positive".to_string(),
            ));
        }
        if !self.groups.contains_key(&network.group_id) {
            return Err(DirectoryError::NotFound {
                entity: "NetworkGroup",
                id: network.group_id,
            });
        }
        Ok(())
    }

    fn insert_group(&mut self, mut group: NetworkGroup) -> Result<NetworkGroup, DirectoryError> {
        if self.group_name_taken(&group.name, None) {
            return Err(DirectoryError::DuplicateGroup(group.name));
        }
        group.id = next_id(&mut self.next_group_id);
        self.groups.insert(group.id, group.clone());
        Ok(group)
    }

    fn insert_network(&mut self, mut network: Network) -> Result<Network, DirectoryError> {
        self.validate_network(&network)?;
        network.id = next_id(&mut self.next_network_id);
        self.networks.insert(network.id, network.clone());
        Ok(network)
    }

    fn seed_from(config: &Config) -> Result<Self, ConfigError> {
        let mut tables = Tables::default();

        if config.network_groups.is_empty() {
            let mut registration = NetworkGroup::new("Registration Networks");
            registration.registration = true;
            registration.is_pool = true;
            let mut guest = NetworkGroup::new("Student / Guest Network Pool");
            guest.guest = true;
            guest.is_pool = true;
            for group in [registration, guest] {
                tables.insert_group(group).map_err(seed_error)?;
            }
        }

        for entry in &config.network_groups {
            let group = NetworkGroup {
                id: 0,
                name: entry.name.clone(),
                description: entry.description.clone(),
                registration: entry.registration,
                guest: entry.guest,
                is_pool: entry.is_pool,
            };
            tables.insert_group(group).map_err(seed_error)?;
        }

        for entry in &config.networks {
            let group_id = tables
                .groups
                .values()
                .find(|g| g.name == entry.group)
                .map(|g| g.id)
                .ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "Network {} references unknown group {}",
                        entry.name, entry.group
                    ))
                })?;
            let network = Network {
                id: 0,
                name: entry.name.clone(),
                description: entry.description.clone(),
                network_address: entry.parse_network()?,
                gateway_address: entry.parse_gateway()?,
                vlan: entry.vlan,
                capacity: entry.capacity,
                group_id,
            };
            tables.insert_network(network).map_err(seed_error)?;
        }

        Ok(tables)
    }
}

fn seed_error(err: DirectoryError) -> ConfigError {
    ConfigError::Invalid(err.to_string())
}

impl MemoryDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory holding the configured groups and networks.
    ///
    /// Without configured groups, a registration pool group and a guest
    /// pool group are created so networks can be added later.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let tables = Tables::seed_from(config)?;
        Ok(Self {
            tables: Arc::new(RwLock::new(tables)),
        })
    }
}

#[async_trait]
impl DeviceDirectory for MemoryDirectory {
    async fn find_device_by_mac(&self, mac: &str) -> Result<Option<Device>, DirectoryError> {
        let tables = self.tables.read().await;
        Ok(tables.devices.values().find(|d| d.mac == mac).cloned())
    }

    async fn get_device(&self, id: DeviceId) -> Result<Option<Device>, DirectoryError> {
        let tables = self.tables.read().await;
        Ok(tables.devices.get(&id).cloned())
    }

    async fn list_devices(&self) -> Result<Vec<Device>, DirectoryError> {
        let tables = self.tables.read().await;
        Ok(tables.devices.values().cloned().collect())
    }

    async fn create_device(&self, mut device: Device) -> Result<Device, DirectoryError> {
        let mut tables = self.tables.write().await;

        if tables.mac_taken(&device.mac, None) {
            return Err(DirectoryError::DuplicateMac(device.mac));
        }
        if let Some(network_id) = device.network_id {
            tables.check_assignment(network_id, None)?;
        }

        device.id = next_id(&mut tables.next_device_id);
        device.version = 1;
        tables.devices.insert(device.id, device.clone());
        Ok(device)
    }

    async fn update_device(&self, mut device: Device) -> Result<Device, DirectoryError> {
        let mut tables = self.tables.write().await;

        let stored = tables.devices.get(&device.id).ok_or(DirectoryError::NotFound {
            entity: "Device",
            id: device.id,
        })?;
        if stored.version != device.version {
            return Err(DirectoryError::Conflict {
                device_id: device.id,
                expected: device.version,
                found: stored.version,
            });
        }
        let moved = device.network_id != stored.network_id;

        if tables.mac_taken(&device.mac, Some(device.id)) {
            return Err(DirectoryError::DuplicateMac(device.mac));
        }
        if let (true, Some(network_id)) = (moved, device.network_id) {
            tables.check_assignment(network_id, Some(device.id))?;
        }

        device.version += 1;
        tables.devices.insert(device.id, device.clone());
        Ok(device)
    }

    async fn delete_device(&self, id: DeviceId) -> Result<bool, DirectoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.devices.remove(&id).is_some())
    }

    async fn find_devices_by_user(&self, user_id: UserId) -> Result<Vec<Device>, DirectoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .devices
            .values()
            .filter(|d| d.user_id == Some(user_id))
            .cloned()
            .collect())
    }

    async fn delete_devices_by_user(&self, user_id: UserId) -> Result<usize, DirectoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.devices.len();
        tables.devices.retain(|_, d| d.user_id != Some(user_id));
        Ok(before - tables.devices.len())
    }

    async fn create_network_group(&self, group: NetworkGroup) -> Result<NetworkGroup, DirectoryError> {
        let mut tables = self.tables.write().await;
        tables.insert_group(group)
    }

    async fn get_network_group(
        &self,
        id: NetworkGroupId,
    ) -> Result<Option<NetworkGroup>, DirectoryError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.get(&id).cloned())
    }

    async fn list_network_groups(&self) -> Result<Vec<NetworkGroup>, DirectoryError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.values().cloned().collect())
    }

    async fn update_network_group(&self, group: NetworkGroup) -> Result<NetworkGroup, DirectoryError> {
        let mut tables = self.tables.write().await;
        if !tables.groups.contains_key(&group.id) {
            return Err(DirectoryError::NotFound {
                entity: "NetworkGroup",
                id: group.id,
            });
        }
        if tables.group_name_taken(&group.name, Some(group.id)) {
            return Err(DirectoryError::DuplicateGroup(group.name));
        }
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn delete_network_group(&self, id: NetworkGroupId) -> Result<bool, DirectoryError> {
        let mut tables = self.tables.write().await;
        if let Some(network) = tables.networks.values().find(|n| n.group_id == id) {
            return Err(DirectoryError::InUse(format!(
                "Network group {} (network {})",
                id, network.name
            )));
        }
        Ok(tables.groups.remove(&id).is_some())
    }

    async fn create_network(&self, network: Network) -> Result<Network, DirectoryError> {
        let mut tables = self.tables.write().await;
        tables.insert_network(network)
    }

    async fn get_network(&self, id: NetworkId) -> Result<Option<Network>, DirectoryError> {
        let tables = self.tables.read().await;
        Ok(tables.networks.get(&id).cloned())
    }

    async fn list_networks(&self) -> Result<Vec<Network>, DirectoryError> {
        let tables = self.tables.read().await;
        Ok(tables.networks.values().cloned().collect())
    }

    async fn update_network(&self, network: Network) -> Result<Network, DirectoryError> {
        let mut tables = self.tables.write().await;
        if !tables.networks.contains_key(&network.id) {
            return Err(DirectoryError::NotFound {
                entity: "Network",
                id: network.id,
            });
        }
        tables.validate_network(&network)?;
        let assigned = tables.assigned_count(network.id, None);
        if (network.capacity as usize) < assigned {
            return Err(DirectoryError::InvalidInput(format!(
                "Capacity {} is below the {} devices already assigned",
                network.capacity, assigned
            )));
        }
        tables.networks.insert(network.id, network.clone());
        Ok(network)
    }

    async fn delete_network(&self, id: NetworkId) -> Result<bool, DirectoryError> {
        let mut tables = self.tables.write().await;
        if tables.networks.remove(&id).is_none() {
            return Ok(false);
        }
        for device in tables.devices.values_mut() {
            if device.network_id == Some(id) {
                device.network_id = None;
                device.version += 1;
            }
        }
        Ok(true)
    }

    async fn find_registration_network_with_capacity(
        &self,
    ) -> Result<Option<Network>, DirectoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .networks
            .values()
            .filter(|n| tables.groups.get(&n.group_id).is_some_and(|g| g.registration))
            .find(|n| tables.assigned_count(n.id, None) < n.capacity as usize)
            .cloned())
    }

    async fn count_assignments(&self, network_id: NetworkId) -> Result<usize, DirectoryError> {
        let tables = self.tables.read().await;
        Ok(tables.assigned_count(network_id, None))
    }
}
