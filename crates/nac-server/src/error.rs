use crate::directory::DirectoryError;
use dns_proto::DnsError;
use radius_proto::PacketError;
use thiserror::Error;

/// Failure while handling one datagram
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),
    #[error("DNS error: {0}")]
    Dns(#[from] DnsError),
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),
}
