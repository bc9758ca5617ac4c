//! RADIUS authorization
//!
//! Every Access-Request names a device by MAC address in its User-Name.
//! Authorized devices get the VLAN of the network they are assigned to;
//! everything else is parked on a registration network with a free slot,
//! or rejected when there is none.

use crate::directory::{Device, DeviceDirectory, DirectoryError, Network};
use crate::error::ServerError;
use crate::notify::NotificationBus;
use crate::udp::DatagramHandler;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use radius_proto::attributes::{
    TaggedTunnelMediumType, TaggedTunnelType, TunnelPrivateGroupId, UserName,
};
use radius_proto::{Code, Packet, PacketError, TunnelMediumType, TunnelType};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, error, info, warn};

/// Outcome of one Access-Request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept { vlan: u16 },
    Reject(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No usable User-Name attribute
    MissingUserName,
    /// No registration network has a free slot
    NoRegistrationCapacity,
    /// The device changed while the request was being decided
    Conflict,
    /// The directory failed
    DirectoryFailure,
}

/// Decides Access-Requests against the device directory
#[derive(Clone)]
pub struct AuthorizationEngine {
    directory: Arc<dyn DeviceDirectory>,
    notifications: NotificationBus,
}

impl AuthorizationEngine {
    pub fn new(directory: Arc<dyn DeviceDirectory>, notifications: NotificationBus) -> Self {
        Self {
            directory,
            notifications,
        }
    }

    pub async fn authorize(&self, request: &Packet) -> Decision {
        self.authorize_at(request, Utc::now()).await
    }

    /// Decide `request` as of `now`.
    ///
    /// A decision that created a device or moved its assignment publishes
    /// device-details and network-usage notifications.
    pub async fn authorize_at(&self, request: &Packet, now: DateTime<Utc>) -> Decision {
        let mac = match request.get_attribute::<UserName>() {
            Ok(Some(user_name)) => user_name.value().to_string(),
            Ok(None) => return Decision::Reject(RejectReason::MissingUserName),
            Err(e) => {
                warn!(request_id = request.identifier, error = %e, "Malformed User-Name");
                return Decision::Reject(RejectReason::MissingUserName);
            }
        };

        match self.decide(&mac, now).await {
            Ok((decision, changed)) => {
                if changed {
                    self.notifications.device_details_changed();
                    self.notifications.network_usage_changed();
                }
                decision
            }
            Err(DirectoryError::Conflict { .. }) | Err(DirectoryError::DuplicateMac(_)) => {
                warn!(mac = %mac, "Device changed concurrently, rejecting");
                Decision::Reject(RejectReason::Conflict)
            }
            Err(DirectoryError::CapacityExceeded { network_id, .. }) => {
                warn!(mac = %mac, network_id, "Registration network filled up, rejecting");
                Decision::Reject(RejectReason::NoRegistrationCapacity)
            }
            Err(e) => {
                error!(mac = %mac, error = %e, "Directory failure during authorization");
                Decision::Reject(RejectReason::DirectoryFailure)
            }
        }
    }

    /// Returns the decision and whether the directory was changed
    async fn decide(
        &self,
        mac: &str,
        now: DateTime<Utc>,
    ) -> Result<(Decision, bool), DirectoryError> {
        let device = self.directory.find_device_by_mac(mac).await?;

        if let Some(device) = &device {
            if device.is_authorized_at(now) {
                if let Some(network) = self.assigned_network(device).await? {
                    debug!(mac = %mac, vlan = network.vlan, "Authorized device");
                    return Ok((Decision::Accept { vlan: network.vlan }, false));
                }
            }
        }

        self.register(device, mac).await
    }

    async fn assigned_network(&self, device: &Device) -> Result<Option<Network>, DirectoryError> {
        match device.network_id {
            Some(id) => self.directory.get_network(id).await,
            None => Ok(None),
        }
    }

    /// Park `device` (or a new device for `mac`) on a registration network.
    ///
    /// The slot a device already holds counts against its network, so a
    /// repeat request on a full network is rejected unless another
    /// registration network has room.
    async fn register(
        &self,
        device: Option<Device>,
        mac: &str,
    ) -> Result<(Decision, bool), DirectoryError> {
        let Some(network) = self.directory.find_registration_network_with_capacity().await?
        else {
            warn!(mac = %mac, "No registration network with free capacity");
            return Ok((Decision::Reject(RejectReason::NoRegistrationCapacity), false));
        };

        let assigned = self.directory.count_assignments(network.id).await?;
        if assigned >= network.capacity as usize {
            warn!(mac = %mac, network_id = network.id, assigned, "Registration network is full");
            return Ok((Decision::Reject(RejectReason::NoRegistrationCapacity), false));
        }

        match device {
            None => {
                let mut device = Device::new(mac);
                device.network_id = Some(network.id);
                self.directory.create_device(device).await?;
                info!(mac = %mac, vlan = network.vlan, "Registered new device");
            }
            Some(mut device) => {
                device.network_id = Some(network.id);
                self.directory.update_device(device).await?;
                info!(mac = %mac, vlan = network.vlan, "Moved device to registration");
            }
        }

        Ok((Decision::Accept { vlan: network.vlan }, true))
    }
}

/// Build the signed Access-Accept or Access-Reject for `request`.
///
/// Accepts carry the VLAN as Tunnel-Type, Tunnel-Medium-Type and
/// Tunnel-Private-Group-Id, all with tag 0. Every response gets a
/// Message-Authenticator followed by the Response Authenticator.
pub fn build_response(
    request: &Packet,
    decision: Decision,
    secret: &[u8],
) -> Result<Packet, PacketError> {
    let mut response = match decision {
        Decision::Accept { vlan } => {
            let mut response = Packet::response_to(request, Code::AccessAccept);
            response
                .add_attribute(TaggedTunnelType::new(0, TunnelType::Vlan)?)?
                .add_attribute(TaggedTunnelMediumType::new(0, TunnelMediumType::Ieee802)?)?
                .add_attribute(TunnelPrivateGroupId::new(Some(0), vlan.to_string())?)?;
            response
        }
        Decision::Reject(_) => Packet::response_to(request, Code::AccessReject),
    };

    response
        .add_message_authenticator(secret)?
        .add_response_authenticator(secret, &request.authenticator)?;
    Ok(response)
}

/// Datagram handler for the authorization port
pub struct AuthorizationHandler {
    engine: AuthorizationEngine,
    secret: Vec<u8>,
}

impl AuthorizationHandler {
    pub fn new(engine: AuthorizationEngine, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            engine,
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl DatagramHandler for AuthorizationHandler {
    async fn handle(
        &self,
        socket: &UdpSocket,
        data: &[u8],
        peer: SocketAddr,
    ) -> Result<(), ServerError> {
        let request = Packet::decode(data)?;
        if request.code != Code::AccessRequest {
            debug!(packet_type = ?request.code, client_addr = %peer, "Ignoring packet on authorization port");
            return Ok(());
        }

        let decision = self.engine.authorize(&request).await;
        let response = build_response(&request, decision, &self.secret)?;
        socket.send_to(&response.encode()?, peer).await?;

        info!(
            client_ip = %peer.ip(),
            request_id = request.identifier,
            decision = ?decision,
            "Access-Request answered"
        );
        Ok(())
    }
}
