//! RADIUS accounting
//!
//! Accounting-Requests are acknowledged first and then used to refresh the
//! session details stored on the device: the address the NAS saw it use and
//! the identifiers needed later to disconnect it.

use crate::directory::{DeviceDirectory, DirectoryError};
use crate::error::ServerError;
use crate::notify::NotificationBus;
use crate::udp::DatagramHandler;
use async_trait::async_trait;
use radius_proto::attributes::{
    AcctSessionId, AcctStatus, CallingStationId, FramedIpAddress, NasIdentifier, NasIpAddress,
    UserName,
};
use radius_proto::{AcctStatusType, Code, Packet, PacketError, TypedAttribute};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// Result of applying one Accounting-Request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountingOutcome {
    /// Session details were stored
    Updated,
    MissingUserName,
    MissingStatus,
    UnknownDevice,
    /// Status that does not update session details
    Ignored(AcctStatusType),
}

/// Typed attribute, with malformed values treated as absent
fn optional<T: TypedAttribute>(request: &Packet) -> Option<T> {
    match request.get_attribute::<T>() {
        Ok(value) => value,
        Err(e) => {
            warn!(
                request_id = request.identifier,
                attribute = ?T::TYPE,
                error = %e,
                "Ignoring malformed attribute"
            );
            None
        }
    }
}

/// Applies accounting data to the device directory
#[derive(Clone)]
pub struct SessionTracker {
    directory: Arc<dyn DeviceDirectory>,
    notifications: NotificationBus,
}

impl SessionTracker {
    pub fn new(directory: Arc<dyn DeviceDirectory>, notifications: NotificationBus) -> Self {
        Self {
            directory,
            notifications,
        }
    }

    /// Update the device named by `request`.
    ///
    /// On Start and Interim-Update the detected IP, NAS IP, NAS identifier,
    /// Calling-Station-Id and Acct-Session-Id are overwritten; an absent
    /// attribute clears the stored value. Other status types change nothing.
    pub async fn apply(&self, request: &Packet) -> Result<AccountingOutcome, DirectoryError> {
        let Some(mac) = optional::<UserName>(request) else {
            return Ok(AccountingOutcome::MissingUserName);
        };
        let Some(status) = optional::<AcctStatus>(request) else {
            return Ok(AccountingOutcome::MissingStatus);
        };
        let Some(mut device) = self.directory.find_device_by_mac(mac.value()).await? else {
            return Ok(AccountingOutcome::UnknownDevice);
        };

        let status = status.value();
        if !status.updates_session() {
            return Ok(AccountingOutcome::Ignored(status));
        }

        device.detected_ip = optional::<FramedIpAddress>(request).map(|a| a.value());
        device.nas_ip = optional::<NasIpAddress>(request).map(|a| a.value());
        device.nas_identifier =
            optional::<NasIdentifier>(request).map(|a| a.value().to_string());
        device.calling_station_id =
            optional::<CallingStationId>(request).map(|a| a.value().to_string());
        device.accounting_session_id =
            optional::<AcctSessionId>(request).map(|a| a.value().to_string());

        self.directory.update_device(device).await?;
        self.notifications.device_details_changed();
        Ok(AccountingOutcome::Updated)
    }
}

/// Build the signed Accounting-Response for `request`
pub fn build_response(request: &Packet, secret: &[u8]) -> Result<Packet, PacketError> {
    let mut response = Packet::response_to(request, Code::AccountingResponse);
    response
        .add_message_authenticator(secret)?
        .add_response_authenticator(secret, &request.authenticator)?;
    Ok(response)
}

/// Datagram handler for the accounting port
pub struct AccountingHandler {
    tracker: SessionTracker,
    secret: Vec<u8>,
}

impl AccountingHandler {
    pub fn new(tracker: SessionTracker, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            tracker,
            secret: secret.into(),
        }
    }

    async fn acknowledge(
        &self,
        socket: &UdpSocket,
        request: &Packet,
        peer: SocketAddr,
    ) -> Result<(), ServerError> {
        let response = build_response(request, &self.secret)?;
        socket.send_to(&response.encode()?, peer).await?;
        Ok(())
    }
}

#[async_trait]
impl DatagramHandler for AccountingHandler {
    async fn handle(
        &self,
        socket: &UdpSocket,
        data: &[u8],
        peer: SocketAddr,
    ) -> Result<(), ServerError> {
        let request = Packet::decode(data)?;
        if request.code != Code::AccountingRequest {
            debug!(packet_type = ?request.code, client_addr = %peer, "Ignoring packet on accounting port");
            return Ok(());
        }

        // A lost acknowledgement does not discard the session update
        if let Err(e) = self.acknowledge(socket, &request, peer).await {
            warn!(
                client_ip = %peer.ip(),
                request_id = request.identifier,
                error = %e,
                "Failed to send Accounting-Response"
            );
        }

        match self.tracker.apply(&request).await {
            Ok(outcome) => debug!(
                client_ip = %peer.ip(),
                request_id = request.identifier,
                outcome = ?outcome,
                "Accounting-Request processed"
            ),
            Err(e) => warn!(
                client_ip = %peer.ip(),
                request_id = request.identifier,
                error = %e,
                "Accounting update failed"
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{Device, MemoryDirectory};
    use crate::notify::Notification;
    use radius_proto::{verify_response_authenticator, RawAttribute};
    use std::net::Ipv4Addr;

    fn tracker() -> (SessionTracker, Arc<MemoryDirectory>, NotificationBus) {
        let directory = Arc::new(MemoryDirectory::new());
        let notifications = NotificationBus::default();
        let tracker = SessionTracker::new(directory.clone(), notifications.clone());
        (tracker, directory, notifications)
    }

    fn accounting_request(mac: &str, status: AcctStatusType) -> Packet {
        let mut request = Packet::new(Code::AccountingRequest, 3, [0; 16]);
        request
            .add_attribute(UserName::new(mac))
            .unwrap()
            .add_attribute(AcctStatus::new(status))
            .unwrap();
        request
    }

    #[tokio::test]
    async fn test_start_updates_session_details() {
        let (tracker, directory, notifications) = tracker();
        let mut events = notifications.subscribe();
        let device = directory.create_device(Device::new("AA")).await.unwrap();

        let mut request = accounting_request("AA", AcctStatusType::Start);
        request
            .add_attribute(FramedIpAddress::new(Ipv4Addr::new(10, 0, 0, 5)))
            .unwrap()
            .add_attribute(NasIpAddress::new(Ipv4Addr::new(192, 168, 0, 2)))
            .unwrap()
            .add_attribute(NasIdentifier::new("switch-1"))
            .unwrap()
            .add_attribute(CallingStationId::new("AA-AA-AA-AA-AA-AA"))
            .unwrap()
            .add_attribute(AcctSessionId::new("5F00001A"))
            .unwrap();

        assert_eq!(tracker.apply(&request).await.unwrap(), AccountingOutcome::Updated);

        let stored = directory.get_device(device.id).await.unwrap().unwrap();
        assert_eq!(stored.detected_ip, Some(Ipv4Addr::new(10, 0, 0, 5)));
        assert_eq!(stored.nas_ip, Some(Ipv4Addr::new(192, 168, 0, 2)));
        assert_eq!(stored.nas_identifier.as_deref(), Some("switch-1"));
        assert_eq!(stored.calling_station_id.as_deref(), Some("AA-AA-AA-AA-AA-AA"));
        assert_eq!(stored.accounting_session_id.as_deref(), Some("5F00001A"));
        assert_eq!(events.try_recv().unwrap(), Notification::DeviceDetailsChanged);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_interim_clears_absent_fields() {
        let (tracker, directory, _) = tracker();
        let mut device = Device::new("AA");
        device.nas_identifier = Some("switch-1".to_string());
        device.detected_ip = Some(Ipv4Addr::new(10, 0, 0, 5));
        let device = directory.create_device(device).await.unwrap();

        let mut request = accounting_request("AA", AcctStatusType::InterimUpdate);
        request
            .add_attribute(FramedIpAddress::new(Ipv4Addr::new(10, 0, 0, 9)))
            .unwrap();
        tracker.apply(&request).await.unwrap();

        let stored = directory.get_device(device.id).await.unwrap().unwrap();
        assert_eq!(stored.detected_ip, Some(Ipv4Addr::new(10, 0, 0, 9)));
        assert_eq!(stored.nas_identifier, None);
    }

    #[tokio::test]
    async fn test_malformed_attribute_treated_as_absent() {
        let (tracker, directory, _) = tracker();
        let mut device = Device::new("AA");
        device.detected_ip = Some(Ipv4Addr::new(10, 0, 0, 5));
        let device = directory.create_device(device).await.unwrap();

        let mut request = accounting_request("AA", AcctStatusType::Start);
        request
            .add_attribute(RawAttribute::new(8, vec![10, 0, 0]).unwrap())
            .unwrap();
        assert_eq!(tracker.apply(&request).await.unwrap(), AccountingOutcome::Updated);

        let stored = directory.get_device(device.id).await.unwrap().unwrap();
        assert_eq!(stored.detected_ip, None);
    }

    #[tokio::test]
    async fn test_stop_changes_nothing() {
        let (tracker, directory, notifications) = tracker();
        let mut events = notifications.subscribe();
        let mut device = Device::new("AA");
        device.detected_ip = Some(Ipv4Addr::new(10, 0, 0, 5));
        let device = directory.create_device(device).await.unwrap();

        let request = accounting_request("AA", AcctStatusType::Stop);
        assert_eq!(
            tracker.apply(&request).await.unwrap(),
            AccountingOutcome::Ignored(AcctStatusType::Stop)
        );
        assert_eq!(directory.get_device(device.id).await.unwrap().unwrap(), device);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_missing_fields_and_unknown_device() {
        let (tracker, _, _) = tracker();

        let request = Packet::new(Code::AccountingRequest, 1, [0; 16]);
        assert_eq!(
            tracker.apply(&request).await.unwrap(),
            AccountingOutcome::MissingUserName
        );

        let mut request = Packet::new(Code::AccountingRequest, 1, [0; 16]);
        request.add_attribute(UserName::new("AA")).unwrap();
        assert_eq!(
            tracker.apply(&request).await.unwrap(),
            AccountingOutcome::MissingStatus
        );

        let request = accounting_request("AA", AcctStatusType::Start);
        assert_eq!(
            tracker.apply(&request).await.unwrap(),
            AccountingOutcome::UnknownDevice
        );
    }

    #[tokio::test]
    async fn test_update_applied_when_reply_cannot_be_sent() {
        let (tracker, directory, _) = tracker();
        let device = directory.create_device(Device::new("AA")).await.unwrap();
        let handler = AccountingHandler::new(tracker, "acct");

        let mut request = accounting_request("AA", AcctStatusType::Start);
        request
            .add_attribute(FramedIpAddress::new(Ipv4Addr::new(10, 0, 0, 7)))
            .unwrap();

        // An IPv4 socket cannot reach an IPv6 peer
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let peer: SocketAddr = "[::1]:1813".parse().unwrap();
        handler
            .handle(&socket, &request.encode().unwrap(), peer)
            .await
            .unwrap();

        let stored = directory.get_device(device.id).await.unwrap().unwrap();
        assert_eq!(stored.detected_ip, Some(Ipv4Addr::new(10, 0, 0, 7)));
    }

    #[test]
    fn test_response_is_signed() {
        let request = accounting_request("AA", AcctStatusType::Start);
        let response = build_response(&request, b"acct").unwrap();
        assert_eq!(response.code, Code::AccountingResponse);
        assert_eq!(response.identifier, 3);
        assert_eq!(response.attributes().len(), 1);
        assert!(verify_response_authenticator(&response, &request.authenticator, b"acct").unwrap());
    }
}
