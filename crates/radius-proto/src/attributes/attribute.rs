use super::typed::{
    AcctSessionId, AcctStatus, CalledStationId, CallingStationId, FramedIpAddress,
    MessageAuthenticator, NasIdentifier, NasIpAddress, TaggedTunnelMediumType, TaggedTunnelType,
    TunnelPrivateGroupId, TypedAttribute, UserName,
};
use crate::packet::PacketError;

/// RADIUS Attribute structure as defined in RFC 2865 Section 5
///
/// ```text
///  0                   1                   2
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Type      |    Length     |  Value ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute {
    /// Attribute type (1 byte)
    pub attr_type: u8,
    /// Attribute value (0-253 bytes)
    pub value: Vec<u8>,
}

impl RawAttribute {
    /// Minimum attribute length (type + length fields = 2 bytes)
    pub const MIN_LENGTH: usize = 2;
    /// Maximum attribute length (255 bytes including type and length)
    pub const MAX_LENGTH: usize = 255;
    /// Maximum value length (253 bytes)
    pub const MAX_VALUE_LENGTH: usize = 253;

    pub fn new(attr_type: u8, value: Vec<u8>) -> Result<Self, PacketError> {
        if value.len() > Self::MAX_VALUE_LENGTH {
            return Err(PacketError::AttributeError(format!(
                "Attribute value too long: {} bytes (max {})",
                value.len(),
                Self::MAX_VALUE_LENGTH
            )));
        }
        Ok(RawAttribute { attr_type, value })
    }

    /// Append the encoded attribute to `buffer`
    pub fn encode_into(&self, buffer: &mut Vec<u8>) -> Result<(), PacketError> {
        let length = self.encoded_length();
        if length > Self::MAX_LENGTH {
            return Err(PacketError::AttributeError(format!(
                "Encoded attribute too long: {} bytes",
                length
            )));
        }

        buffer.push(self.attr_type);
        buffer.push(length as u8);
        buffer.extend_from_slice(&self.value);
        Ok(())
    }

    /// Encode attribute to bytes
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let mut buffer = Vec::with_capacity(self.encoded_length());
        self.encode_into(&mut buffer)?;
        Ok(buffer)
    }

    /// Decode the first attribute in `data`; trailing bytes are left for the caller
    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < Self::MIN_LENGTH {
            return Err(PacketError::AttributeError(format!(
                "Attribute data too short: {} bytes",
                data.len()
            )));
        }

        let attr_type = data[0];
        let length = data[1] as usize;

        if length < Self::MIN_LENGTH {
            return Err(PacketError::AttributeError(format!(
                "Invalid attribute length: {}",
                length
            )));
        }

        if data.len() < length {
            return Err(PacketError::AttributeError(format!(
                "Insufficient data for attribute: expected {}, got {}",
                length,
                data.len()
            )));
        }

        Ok(RawAttribute {
            attr_type,
            value: data[Self::MIN_LENGTH..length].to_vec(),
        })
    }

    /// Get the encoded length of this attribute
    pub fn encoded_length(&self) -> usize {
        Self::MIN_LENGTH + self.value.len()
    }
}

/// An attribute as held by a [`Packet`](crate::Packet).
///
/// Registered types carry their decoded value; everything else is kept raw.
/// Both forms encode back to the same wire bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    UserName(UserName),
    NasIpAddress(NasIpAddress),
    FramedIpAddress(FramedIpAddress),
    CalledStationId(CalledStationId),
    CallingStationId(CallingStationId),
    NasIdentifier(NasIdentifier),
    AcctStatusType(AcctStatus),
    AcctSessionId(AcctSessionId),
    TunnelType(TaggedTunnelType),
    TunnelMediumType(TaggedTunnelMediumType),
    MessageAuthenticator(MessageAuthenticator),
    TunnelPrivateGroupId(TunnelPrivateGroupId),
    Raw(RawAttribute),
}

impl Attribute {
    /// Wire type code
    pub fn attr_type(&self) -> u8 {
        match self {
            Attribute::UserName(_) => UserName::TYPE.as_u8(),
            Attribute::NasIpAddress(_) => NasIpAddress::TYPE.as_u8(),
            Attribute::FramedIpAddress(_) => FramedIpAddress::TYPE.as_u8(),
            Attribute::CalledStationId(_) => CalledStationId::TYPE.as_u8(),
            Attribute::CallingStationId(_) => CallingStationId::TYPE.as_u8(),
            Attribute::NasIdentifier(_) => NasIdentifier::TYPE.as_u8(),
            Attribute::AcctStatusType(_) => AcctStatus::TYPE.as_u8(),
            Attribute::AcctSessionId(_) => AcctSessionId::TYPE.as_u8(),
            Attribute::TunnelType(_) => TaggedTunnelType::TYPE.as_u8(),
            Attribute::TunnelMediumType(_) => TaggedTunnelMediumType::TYPE.as_u8(),
            Attribute::MessageAuthenticator(_) => MessageAuthenticator::TYPE.as_u8(),
            Attribute::TunnelPrivateGroupId(_) => TunnelPrivateGroupId::TYPE.as_u8(),
            Attribute::Raw(raw) => raw.attr_type,
        }
    }

    /// Encode the value into its raw wire form
    pub fn to_raw(&self) -> Result<RawAttribute, PacketError> {
        match self {
            Attribute::UserName(v) => v.to_raw(),
            Attribute::NasIpAddress(v) => v.to_raw(),
            Attribute::FramedIpAddress(v) => v.to_raw(),
            Attribute::CalledStationId(v) => v.to_raw(),
            Attribute::CallingStationId(v) => v.to_raw(),
            Attribute::NasIdentifier(v) => v.to_raw(),
            Attribute::AcctStatusType(v) => v.to_raw(),
            Attribute::AcctSessionId(v) => v.to_raw(),
            Attribute::TunnelType(v) => v.to_raw(),
            Attribute::TunnelMediumType(v) => v.to_raw(),
            Attribute::MessageAuthenticator(v) => v.to_raw(),
            Attribute::TunnelPrivateGroupId(v) => v.to_raw(),
            Attribute::Raw(raw) => Ok(raw.clone()),
        }
    }

    pub fn encoded_length(&self) -> Result<usize, PacketError> {
        Ok(self.to_raw()?.encoded_length())
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Attribute::Raw(_))
    }
}

impl From<RawAttribute> for Attribute {
    fn from(raw: RawAttribute) -> Self {
        Attribute::Raw(raw)
    }
}
