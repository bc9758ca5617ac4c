//! RADIUS attributes in raw wire form and typed views over them.
//!
//! A [`RawAttribute`] is the `type | length | value` triple read off the wire.
//! The [`AttributeRegistry`] turns raw attributes of registered types into the
//! matching [`Attribute`] variant; anything else stays [`Attribute::Raw`].

mod attribute;
mod registry;
mod typed;
mod types;

pub use attribute::{Attribute, RawAttribute};
pub use registry::{AttributeConstructor, AttributeRegistry};
pub use typed::{
    AcctSessionId, AcctStatus, CalledStationId, CallingStationId, FramedIpAddress,
    MessageAuthenticator, NasIdentifier, NasIpAddress, TaggedTunnelMediumType, TaggedTunnelType,
    TunnelPrivateGroupId, TypedAttribute, UserName, MAX_TAG,
};
pub use types::AttributeType;
