//! Disconnect-Request sender (RFC 5176)
//!
//! Forces a NAS to drop a device's session so its next Access-Request is
//! decided again. Requests are fire-and-forget: a successful result means the
//! datagram was handed to the OS, not that the NAS acted on it.

use crate::directory::{Device, DeviceDirectory, DeviceId, DirectoryError, UserId};
use crate::notify::NotificationBus;
use radius_proto::attributes::{AcctSessionId, CallingStationId, NasIdentifier, NasIpAddress};
use radius_proto::{Code, Packet, PacketError};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

/// Default NAS port for Disconnect-Requests
pub const DEFAULT_DISCONNECT_PORT: u16 = 3799;

#[derive(Error, Debug)]
pub enum DisconnectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),
}

/// Session identifiers a NAS needs to find the session to drop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisconnectTarget {
    pub nas_ip: Option<String>,
    pub nas_identifier: Option<String>,
    pub calling_station_id: Option<String>,
    pub accounting_session_id: Option<String>,
}

impl From<&Device> for DisconnectTarget {
    fn from(device: &Device) -> Self {
        DisconnectTarget {
            nas_ip: device.nas_ip.map(|ip| ip.to_string()),
            nas_identifier: device.nas_identifier.clone(),
            calling_station_id: device.calling_station_id.clone(),
            accounting_session_id: device.accounting_session_id.clone(),
        }
    }
}

/// Sends Disconnect-Requests signed with the accounting secret
pub struct Disconnector {
    secret: Vec<u8>,
    nas_port: u16,
    next_identifier: AtomicU8,
    directory: Arc<dyn DeviceDirectory>,
    notifications: NotificationBus,
}

impl Disconnector {
    pub fn new(
        secret: impl Into<Vec<u8>>,
        directory: Arc<dyn DeviceDirectory>,
        notifications: NotificationBus,
    ) -> Self {
        Self {
            secret: secret.into(),
            nas_port: DEFAULT_DISCONNECT_PORT,
            next_identifier: AtomicU8::new(0),
            directory,
            notifications,
        }
    }

    pub fn with_nas_port(mut self, port: u16) -> Self {
        self.nas_port = port;
        self
    }

    /// Build the signed Disconnect-Request for `target`.
    ///
    /// Returns `None` when an identifier is missing or the NAS address is
    /// not an IPv4 address. Consumes a packet identifier only when a request
    /// is built.
    pub fn build_request(
        &self,
        target: &DisconnectTarget,
    ) -> Result<Option<(Packet, Ipv4Addr)>, PacketError> {
        let (Some(nas_ip), Some(nas_identifier), Some(calling_station_id), Some(session_id)) = (
            target.nas_ip.as_deref(),
            target.nas_identifier.as_deref(),
            target.calling_station_id.as_deref(),
            target.accounting_session_id.as_deref(),
        ) else {
            return Ok(None);
        };
        let Ok(nas_ip) = nas_ip.parse::<Ipv4Addr>() else {
            return Ok(None);
        };

        let identifier = self.next_identifier.fetch_add(1, Ordering::Relaxed);
        let mut request = Packet::new(Code::DisconnectRequest, identifier, Packet::ZERO_AUTHENTICATOR);
        request
            .add_attribute(CallingStationId::new(calling_station_id))?
            .add_attribute(NasIpAddress::new(nas_ip))?
            .add_attribute(NasIdentifier::new(nas_identifier))?
            .add_attribute(AcctSessionId::new(session_id))?
            .add_message_authenticator(&self.secret)?
            .sign_request(&self.secret)?;
        Ok(Some((request, nas_ip)))
    }

    /// Send a Disconnect-Request for `target`.
    ///
    /// `Ok(false)` when the target lacks an identifier or a usable NAS
    /// address; `Ok(true)` once the datagram is sent. No reply is awaited.
    pub async fn disconnect(&self, target: &DisconnectTarget) -> Result<bool, DisconnectError> {
        let Some((request, nas_ip)) = self.build_request(target)? else {
            debug!(session = ?target, "Disconnect skipped, session identifiers incomplete");
            return Ok(false);
        };

        let destination = SocketAddr::from((nas_ip, self.nas_port));
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.send_to(&request.encode()?, destination).await?;

        info!(
            nas_addr = %destination,
            request_id = request.identifier,
            calling_station_id = target.calling_station_id.as_deref().unwrap_or_default(),
            "Disconnect-Request sent"
        );
        Ok(true)
    }

    pub async fn disconnect_device(&self, device: &Device) -> Result<bool, DisconnectError> {
        self.disconnect(&DisconnectTarget::from(device)).await
    }

    /// Delete a device and disconnect its session.
    ///
    /// Returns whether the device existed.
    pub async fn remove_device(&self, id: DeviceId) -> Result<bool, DisconnectError> {
        let Some(device) = self.directory.get_device(id).await? else {
            return Ok(false);
        };
        if !self.directory.delete_device(id).await? {
            return Ok(false);
        }
        self.notifications.device_details_changed();
        self.notifications.network_usage_changed();

        if let Err(e) = self.disconnect_device(&device).await {
            warn!(mac = %device.mac, error = %e, "Disconnect failed");
        }
        Ok(true)
    }

    /// Delete every device of a user and disconnect each of their sessions.
    ///
    /// The devices are snapshotted before deletion; a failed disconnect is
    /// logged and does not stop the rest. Returns the number of requests
    /// sent.
    pub async fn disconnect_all_user_devices(&self, user_id: UserId) -> Result<usize, DisconnectError> {
        let devices = self.directory.find_devices_by_user(user_id).await?;
        self.directory.delete_devices_by_user(user_id).await?;
        self.notifications.device_details_changed();
        self.notifications.network_usage_changed();

        let mut sent = 0;
        for device in &devices {
            match self.disconnect_device(device).await {
                Ok(true) => sent += 1,
                Ok(false) => {}
                Err(e) => warn!(user_id, mac = %device.mac, error = %e, "Disconnect failed"),
            }
        }

        info!(user_id, removed = devices.len(), sent, "Removed user devices");
        Ok(sent)
    }
}
