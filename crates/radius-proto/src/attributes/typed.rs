use std::net::Ipv4Addr;

use super::attribute::{Attribute, RawAttribute};
use super::types::AttributeType;
use crate::accounting::AcctStatusType;
use crate::packet::PacketError;
use crate::tunnel::{TunnelMediumType, TunnelType};

/// Highest tag value allowed on tunnel attributes (RFC 2868 Section 3)
pub const MAX_TAG: u8 = 0x1F;

/// An attribute with a decoded value bound to a single wire type.
///
/// `decode_value` and `encode_value` operate on the value octets only; the
/// type and length bytes are handled by [`RawAttribute`].
pub trait TypedAttribute: Sized + Into<Attribute> {
    const TYPE: AttributeType;

    fn decode_value(value: &[u8]) -> Result<Self, PacketError>;

    fn encode_value(&self) -> Vec<u8>;

    fn to_raw(&self) -> Result<RawAttribute, PacketError> {
        RawAttribute::new(Self::TYPE.as_u8(), self.encode_value())
    }

    fn from_raw(raw: &RawAttribute) -> Result<Self, PacketError> {
        if raw.attr_type != Self::TYPE.as_u8() {
            return Err(PacketError::InvalidAttributeValue {
                attr_type: raw.attr_type,
                reason: format!("expected attribute type {}", Self::TYPE.as_u8()),
            });
        }
        Self::decode_value(&raw.value)
    }

    /// Decode from whatever form the packet holds, raw or typed
    fn from_attribute(attribute: &Attribute) -> Result<Self, PacketError> {
        Self::from_raw(&attribute.to_raw()?)
    }
}

fn invalid(attr_type: AttributeType, reason: impl Into<String>) -> PacketError {
    PacketError::InvalidAttributeValue {
        attr_type: attr_type.as_u8(),
        reason: reason.into(),
    }
}

fn check_tag(attr_type: AttributeType, tag: u8) -> Result<u8, PacketError> {
    if tag > MAX_TAG {
        return Err(invalid(attr_type, format!("tag {} out of range", tag)));
    }
    Ok(tag)
}

macro_rules! text_attribute {
    ($(#[$meta:meta])* $name:ident, $variant:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            value: String,
        }

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                $name {
                    value: value.into(),
                }
            }

            pub fn value(&self) -> &str {
                &self.value
            }
        }

        impl TypedAttribute for $name {
            const TYPE: AttributeType = AttributeType::$variant;

            fn decode_value(value: &[u8]) -> Result<Self, PacketError> {
                let text = std::str::from_utf8(value)
                    .map_err(|e| invalid(Self::TYPE, format!("not UTF-8: {}", e)))?;
                Ok($name::new(text))
            }

            fn encode_value(&self) -> Vec<u8> {
                self.value.as_bytes().to_vec()
            }
        }

        impl From<$name> for Attribute {
            fn from(attr: $name) -> Self {
                Attribute::$variant(attr)
            }
        }
    };
}

macro_rules! ipv4_attribute {
    ($(#[$meta:meta])* $name:ident, $variant:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            value: Ipv4Addr,
        }

        impl $name {
            pub fn new(value: Ipv4Addr) -> Self {
                $name { value }
            }

            pub fn value(&self) -> Ipv4Addr {
                self.value
            }
        }

        impl TypedAttribute for $name {
            const TYPE: AttributeType = AttributeType::$variant;

            fn decode_value(value: &[u8]) -> Result<Self, PacketError> {
                let octets: [u8; 4] = value.try_into().map_err(|_| {
                    invalid(Self::TYPE, format!("expected 4 bytes, got {}", value.len()))
                })?;
                Ok($name::new(Ipv4Addr::from(octets)))
            }

            fn encode_value(&self) -> Vec<u8> {
                self.value.octets().to_vec()
            }
        }

        impl From<$name> for Attribute {
            fn from(attr: $name) -> Self {
                Attribute::$variant(attr)
            }
        }
    };
}

text_attribute!(
    /// User-Name (1); the NAS sends the client MAC address here
    UserName,
    UserName
);
text_attribute!(
    /// Called-Station-Id (30)
    CalledStationId,
    CalledStationId
);
text_attribute!(
    /// Calling-Station-Id (31)
    CallingStationId,
    CallingStationId
);
text_attribute!(
    /// NAS-Identifier (32)
    NasIdentifier,
    NasIdentifier
);
text_attribute!(
    /// Acct-Session-Id (44)
    AcctSessionId,
    AcctSessionId
);

ipv4_attribute!(
    /// NAS-IP-Address (4)
    NasIpAddress,
    NasIpAddress
);
ipv4_attribute!(
    /// Framed-IP-Address (8)
    FramedIpAddress,
    FramedIpAddress
);

/// Acct-Status-Type (40), a 4 byte big-endian enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcctStatus {
    value: AcctStatusType,
}

impl AcctStatus {
    pub fn new(value: AcctStatusType) -> Self {
        AcctStatus { value }
    }

    pub fn value(&self) -> AcctStatusType {
        self.value
    }
}

impl TypedAttribute for AcctStatus {
    const TYPE: AttributeType = AttributeType::AcctStatusType;

    fn decode_value(value: &[u8]) -> Result<Self, PacketError> {
        let bytes: [u8; 4] = value
            .try_into()
            .map_err(|_| invalid(Self::TYPE, format!("expected 4 bytes, got {}", value.len())))?;
        let raw = u32::from_be_bytes(bytes);
        let status = AcctStatusType::from_u32(raw)
            .ok_or_else(|| invalid(Self::TYPE, format!("unknown status {}", raw)))?;
        Ok(AcctStatus::new(status))
    }

    fn encode_value(&self) -> Vec<u8> {
        self.value.as_u32().to_be_bytes().to_vec()
    }
}

impl From<AcctStatus> for Attribute {
    fn from(attr: AcctStatus) -> Self {
        Attribute::AcctStatusType(attr)
    }
}

/// Split a tagged 4 byte tunnel value into its tag and 24-bit integer
fn decode_tagged_u24(attr_type: AttributeType, value: &[u8]) -> Result<(u8, u32), PacketError> {
    if value.len() != 4 {
        return Err(invalid(
            attr_type,
            format!("expected 4 bytes, got {}", value.len()),
        ));
    }
    let tag = check_tag(attr_type, value[0])?;
    Ok((tag, u32::from_be_bytes([0, value[1], value[2], value[3]])))
}

fn encode_tagged_u24(tag: u8, value: u32) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    vec![tag, bytes[1], bytes[2], bytes[3]]
}

/// Tunnel-Type (64) with its tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedTunnelType {
    tag: u8,
    value: TunnelType,
}

impl TaggedTunnelType {
    pub fn new(tag: u8, value: TunnelType) -> Result<Self, PacketError> {
        Ok(TaggedTunnelType {
            tag: check_tag(Self::TYPE, tag)?,
            value,
        })
    }

    pub fn tag(&self) -> u8 {
        self.tag
    }

    pub fn value(&self) -> TunnelType {
        self.value
    }
}

impl TypedAttribute for TaggedTunnelType {
    const TYPE: AttributeType = AttributeType::TunnelType;

    fn decode_value(value: &[u8]) -> Result<Self, PacketError> {
        let (tag, raw) = decode_tagged_u24(Self::TYPE, value)?;
        let tunnel = TunnelType::from_u32(raw)
            .ok_or_else(|| invalid(Self::TYPE, format!("unknown tunnel type {}", raw)))?;
        Ok(TaggedTunnelType { tag, value: tunnel })
    }

    fn encode_value(&self) -> Vec<u8> {
        encode_tagged_u24(self.tag, self.value.as_u32())
    }
}

impl From<TaggedTunnelType> for Attribute {
    fn from(attr: TaggedTunnelType) -> Self {
        Attribute::TunnelType(attr)
    }
}

/// Tunnel-Medium-Type (65) with its tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedTunnelMediumType {
    tag: u8,
    value: TunnelMediumType,
}

impl TaggedTunnelMediumType {
    pub fn new(tag: u8, value: TunnelMediumType) -> Result<Self, PacketError> {
        Ok(TaggedTunnelMediumType {
            tag: check_tag(Self::TYPE, tag)?,
            value,
        })
    }

    pub fn tag(&self) -> u8 {
        self.tag
    }

    pub fn value(&self) -> TunnelMediumType {
        self.value
    }
}

impl TypedAttribute for TaggedTunnelMediumType {
    const TYPE: AttributeType = AttributeType::TunnelMediumType;

    fn decode_value(value: &[u8]) -> Result<Self, PacketError> {
        let (tag, raw) = decode_tagged_u24(Self::TYPE, value)?;
        let medium = TunnelMediumType::from_u32(raw)
            .ok_or_else(|| invalid(Self::TYPE, format!("unknown medium type {}", raw)))?;
        Ok(TaggedTunnelMediumType { tag, value: medium })
    }

    fn encode_value(&self) -> Vec<u8> {
        encode_tagged_u24(self.tag, self.value.as_u32())
    }
}

impl From<TaggedTunnelMediumType> for Attribute {
    fn from(attr: TaggedTunnelMediumType) -> Self {
        Attribute::TunnelMediumType(attr)
    }
}

/// Tunnel-Private-Group-ID (81).
///
/// The tag is optional on the wire: a leading octet of 0x1F or less is read
/// as a tag, anything else as the start of the string. A group id that
/// genuinely begins with a control character therefore cannot be sent
/// untagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelPrivateGroupId {
    tag: Option<u8>,
    value: String,
}

impl TunnelPrivateGroupId {
    pub fn new(tag: Option<u8>, value: impl Into<String>) -> Result<Self, PacketError> {
        let tag = tag.map(|t| check_tag(Self::TYPE, t)).transpose()?;
        let value = value.into();
        if value.is_empty() {
            return Err(invalid(Self::TYPE, "empty group id"));
        }
        Ok(TunnelPrivateGroupId { tag, value })
    }

    pub fn tag(&self) -> Option<u8> {
        self.tag
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl TypedAttribute for TunnelPrivateGroupId {
    const TYPE: AttributeType = AttributeType::TunnelPrivateGroupId;

    fn decode_value(value: &[u8]) -> Result<Self, PacketError> {
        let (tag, rest) = match value.split_first() {
            Some((&first, rest)) if first <= MAX_TAG => (Some(first), rest),
            Some(_) => (None, value),
            None => return Err(invalid(Self::TYPE, "empty value")),
        };
        let text = std::str::from_utf8(rest)
            .map_err(|e| invalid(Self::TYPE, format!("not UTF-8: {}", e)))?;
        Ok(TunnelPrivateGroupId {
            tag,
            value: text.to_string(),
        })
    }

    fn encode_value(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.value.len() + 1);
        if let Some(tag) = self.tag {
            out.push(tag);
        }
        out.extend_from_slice(self.value.as_bytes());
        out
    }
}

impl From<TunnelPrivateGroupId> for Attribute {
    fn from(attr: TunnelPrivateGroupId) -> Self {
        Attribute::TunnelPrivateGroupId(attr)
    }
}

/// Message-Authenticator (80), an HMAC-MD5 over the packet (RFC 3579 Section 3.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageAuthenticator {
    value: [u8; 16],
}

impl MessageAuthenticator {
    pub fn new(value: [u8; 16]) -> Self {
        MessageAuthenticator { value }
    }

    pub fn value(&self) -> &[u8; 16] {
        &self.value
    }
}

impl TypedAttribute for MessageAuthenticator {
    const TYPE: AttributeType = AttributeType::MessageAuthenticator;

    fn decode_value(value: &[u8]) -> Result<Self, PacketError> {
        let bytes: [u8; 16] = value.try_into().map_err(|_| {
            invalid(Self::TYPE, format!("expected 16 bytes, got {}", value.len()))
        })?;
        Ok(MessageAuthenticator::new(bytes))
    }

    fn encode_value(&self) -> Vec<u8> {
        self.value.to_vec()
    }
}

impl From<MessageAuthenticator> for Attribute {
    fn from(attr: MessageAuthenticator) -> Self {
        Attribute::MessageAuthenticator(attr)
    }
}
