//! RADIUS Protocol Implementation
//!
//! Packet codec and authenticators for RADIUS as used by a network access
//! controller: RFC 2865 (authentication), RFC 2866 (accounting), RFC 2868
//! (tunnel attributes), RFC 2869 (Message-Authenticator) and RFC 5176
//! (Disconnect-Request).
//!
//! # Features
//!
//! - Packet encoding and decoding
//! - Typed attributes resolved through a static [`AttributeRegistry`]
//! - Request/Response Authenticator and Message-Authenticator calculation
//!
//! # Example
//!
//! ```rust
//! use radius_proto::{Code, Packet, TunnelType};
//! use radius_proto::attributes::{TaggedTunnelType, TunnelPrivateGroupId, UserName};
//!
//! let mut request = Packet::new(Code::AccessRequest, 1, [7u8; 16]);
//! request.add_attribute(UserName::new("AA:BB:CC:DD:EE:FF")).unwrap();
//! let request = Packet::decode(&request.encode().unwrap()).unwrap();
//!
//! let mut accept = Packet::response_to(&request, Code::AccessAccept);
//! accept
//!     .add_attribute(TaggedTunnelType::new(0, TunnelType::Vlan).unwrap())
//!     .unwrap()
//!     .add_attribute(TunnelPrivateGroupId::new(Some(0), "20").unwrap())
//!     .unwrap();
//! accept.add_message_authenticator(b"secret").unwrap();
//! accept
//!     .add_response_authenticator(b"secret", &request.authenticator)
//!     .unwrap();
//!
//! let bytes = accept.encode().unwrap();
//! assert_eq!(bytes[1], 1);
//! ```

pub mod accounting;
pub mod attributes;
pub mod auth;
pub mod message_auth;
pub mod packet;
pub mod tunnel;

pub use accounting::AcctStatusType;
pub use attributes::{Attribute, AttributeRegistry, AttributeType, RawAttribute, TypedAttribute};
pub use auth::{
    calculate_response_authenticator, generate_request_authenticator,
    verify_request_authenticator, verify_response_authenticator,
};
pub use message_auth::{
    calculate_message_authenticator, verify_appended_message_authenticator,
    verify_message_authenticator,
};
pub use packet::{Code, Packet, PacketError};
pub use tunnel::{TunnelMediumType, TunnelType};
