//! Directory entities

use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

pub type DeviceId = u64;
pub type NetworkId = u64;
pub type NetworkGroupId = u64;
pub type UserId = u64;

/// A device identified by its MAC address.
///
/// `network_id` is the device's current assignment; a device holds at most
/// one. `version` is bumped by the directory on every successful write and
/// must match on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub user_id: Option<UserId>,
    pub nickname: Option<String>,
    pub mac: String,
    pub authorized: bool,
    pub authorized_until: Option<DateTime<Utc>>,
    pub detected_ip: Option<Ipv4Addr>,
    pub nas_ip: Option<Ipv4Addr>,
    pub nas_identifier: Option<String>,
    pub calling_station_id: Option<String>,
    pub accounting_session_id: Option<String>,
    pub network_id: Option<NetworkId>,
    pub version: u64,
}

impl Device {
    /// Unsaved, unauthorized device with no assignment
    pub fn new(mac: impl Into<String>) -> Self {
        Device {
            id: 0,
            user_id: None,
            nickname: None,
            mac: mac.into(),
            authorized: false,
            authorized_until: None,
            detected_ip: None,
            nas_ip: None,
            nas_identifier: None,
            calling_station_id: None,
            accounting_session_id: None,
            network_id: None,
            version: 0,
        }
    }

    /// Authorized and not yet expired at `now`.
    ///
    /// An authorized device without an expiry never expires.
    pub fn is_authorized_at(&self, now: DateTime<Utc>) -> bool {
        self.authorized && self.authorized_until.map_or(true, |until| until > now)
    }
}

/// A VLAN-backed network with a bounded number of device assignments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: NetworkId,
    pub name: String,
    pub description: Option<String>,
    pub network_address: IpNetwork,
    pub gateway_address: IpAddr,
    pub vlan: u16,
    pub capacity: u32,
    pub group_id: NetworkGroupId,
}

/// Tags a pool of networks with their role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkGroup {
    pub id: NetworkGroupId,
    pub name: String,
    pub description: Option<String>,
    /// Networks for unauthorized or expired devices
    pub registration: bool,
    pub guest: bool,
    pub is_pool: bool,
}

impl NetworkGroup {
    pub fn new(name: impl Into<String>) -> Self {
        NetworkGroup {
            id: 0,
            name: name.into(),
            description: None,
            registration: false,
            guest: false,
            is_pool: false,
        }
    }
}
