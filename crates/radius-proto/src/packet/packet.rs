use super::Code;
use crate::attributes::{
    Attribute, AttributeRegistry, AttributeType, MessageAuthenticator, RawAttribute,
    TypedAttribute,
};
use crate::auth::md5_authenticator;
use crate::message_auth::calculate_message_authenticator;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PacketError {
    #[error("Invalid packet length: {0}")]
    InvalidLength(usize),
    #[error("Invalid packet code: {0}")]
    InvalidCode(u8),
    #[error("Attribute error: {0}")]
    AttributeError(String),
    #[error("Invalid value for attribute type {attr_type}: {reason}")]
    InvalidAttributeValue { attr_type: u8, reason: String },
    #[error("Refusing to add duplicate attribute of type {0}")]
    DuplicateAttribute(u8),
    #[error("Packet too large: {0} bytes")]
    PacketTooLarge(usize),
}

/// RADIUS Packet structure as defined in RFC 2865 Section 3
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Code      |  Identifier   |            Length             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// |                         Authenticator                         |
/// |                                                               |
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Attributes ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-
/// ```
///
/// Attributes are kept private so that a packet under construction never
/// holds two attributes of the same type and its length always equals
/// 20 plus the encoded length of its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet type (1 byte)
    pub code: Code,
    /// Packet identifier for matching requests/responses (1 byte)
    pub identifier: u8,
    /// Request or Response Authenticator (16 bytes)
    pub authenticator: [u8; 16],
    attributes: Vec<Attribute>,
}

impl Packet {
    /// Minimum RADIUS packet size (20 bytes: 1 code + 1 id + 2 length + 16 authenticator)
    pub const MIN_PACKET_SIZE: usize = 20;
    /// Maximum RADIUS packet size (4096 bytes as per RFC 2865)
    pub const MAX_PACKET_SIZE: usize = 4096;
    /// Authenticator used while a response or CoA request is being built
    pub const ZERO_AUTHENTICATOR: [u8; 16] = [0u8; 16];

    pub fn new(code: Code, identifier: u8, authenticator: [u8; 16]) -> Self {
        Packet {
            code,
            identifier,
            authenticator,
            attributes: Vec::new(),
        }
    }

    /// Start a response to `request`: same identifier, zeroed authenticator.
    pub fn response_to(request: &Packet, code: Code) -> Self {
        Self::new(code, request.identifier, Self::ZERO_AUTHENTICATOR)
    }

    /// Append an attribute.
    ///
    /// A raw attribute of a registered type is stored in its typed form, the
    /// same form [`Packet::decode`] produces, so a packet compares equal to
    /// its own decoded encoding.
    ///
    /// Fails if an attribute of the same type is already present or if the
    /// value cannot be encoded within the 253 byte limit.
    pub fn add_attribute(
        &mut self,
        attribute: impl Into<Attribute>,
    ) -> Result<&mut Self, PacketError> {
        let attribute = match attribute.into() {
            Attribute::Raw(raw) => AttributeRegistry::shared().resolve(raw),
            typed => typed,
        };
        let attr_type = attribute.attr_type();

        if self.attributes.iter().any(|a| a.attr_type() == attr_type) {
            return Err(PacketError::DuplicateAttribute(attr_type));
        }

        // Validates the encoded length up front
        attribute.to_raw()?;

        self.attributes.push(attribute);
        Ok(self)
    }

    /// Remove the attribute of the given type, if present
    pub fn remove_attribute(&mut self, attr_type: u8) -> Option<Attribute> {
        let index = self
            .attributes
            .iter()
            .position(|a| a.attr_type() == attr_type)?;
        Some(self.attributes.remove(index))
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Find first attribute by type
    pub fn find_attribute(&self, attr_type: u8) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.attr_type() == attr_type)
    }

    /// Typed view of the attribute registered for `T`.
    ///
    /// Returns `Ok(None)` when absent. The raw bytes are re-validated on every
    /// call, so a malformed value surfaces here rather than during decoding.
    pub fn get_attribute<T: TypedAttribute>(&self) -> Result<Option<T>, PacketError> {
        self.find_attribute(T::TYPE.as_u8())
            .map(T::from_attribute)
            .transpose()
    }

    /// Encode packet to bytes
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let total_length = self.length()?;
        if total_length > Self::MAX_PACKET_SIZE {
            return Err(PacketError::PacketTooLarge(total_length));
        }

        let mut buffer = Vec::with_capacity(total_length);
        buffer.push(self.code.as_u8());
        buffer.push(self.identifier);
        buffer.extend_from_slice(&(total_length as u16).to_be_bytes());
        buffer.extend_from_slice(&self.authenticator);

        for attr in &self.attributes {
            attr.to_raw()?.encode_into(&mut buffer)?;
        }

        Ok(buffer)
    }

    /// Decode packet from bytes using the compiled-in attribute registry
    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        Self::decode_with(data, AttributeRegistry::shared())
    }

    /// Decode packet from bytes, resolving attributes through `registry`
    pub fn decode_with(data: &[u8], registry: &AttributeRegistry) -> Result<Self, PacketError> {
        if data.len() < Self::MIN_PACKET_SIZE {
            return Err(PacketError::InvalidLength(data.len()));
        }

        let code = Code::from_u8(data[0]).ok_or(PacketError::InvalidCode(data[0]))?;
        let identifier = data[1];
        let length = u16::from_be_bytes([data[2], data[3]]) as usize;

        if !(Self::MIN_PACKET_SIZE..=Self::MAX_PACKET_SIZE).contains(&length) {
            return Err(PacketError::InvalidLength(length));
        }

        // Octets beyond the length field are padding and ignored (RFC 2865 Section 3)
        if data.len() < length {
            return Err(PacketError::InvalidLength(data.len()));
        }

        let mut authenticator = [0u8; 16];
        authenticator.copy_from_slice(&data[4..20]);

        let mut attributes = Vec::new();
        let mut attr_data = &data[Self::MIN_PACKET_SIZE..length];

        while !attr_data.is_empty() {
            let raw = RawAttribute::decode(attr_data)?;
            let attr_len = raw.encoded_length();
            attributes.push(registry.resolve(raw));
            attr_data = &attr_data[attr_len..];
        }

        Ok(Packet {
            code,
            identifier,
            authenticator,
            attributes,
        })
    }

    /// Get the length of the encoded packet
    pub fn length(&self) -> Result<usize, PacketError> {
        let mut len = Self::MIN_PACKET_SIZE;
        for attr in &self.attributes {
            len += attr.encoded_length()?;
        }
        Ok(len)
    }

    /// MD5 over the serialised packet followed by `secret`.
    ///
    /// When `preinsert` is given it replaces the authenticator field in the
    /// hashed bytes (the request authenticator, for responses).
    pub fn calculate_authenticator(
        &self,
        secret: &[u8],
        preinsert: Option<&[u8; 16]>,
    ) -> Result<[u8; 16], PacketError> {
        let mut buffer = self.encode()?;
        if let Some(authenticator) = preinsert {
            buffer[4..20].copy_from_slice(authenticator);
        }
        Ok(md5_authenticator(&buffer, secret))
    }

    /// Append a Message-Authenticator computed over the packet as it is now.
    ///
    /// The HMAC covers the bytes before the attribute exists, so this must be
    /// called before the Response Authenticator is set and at most once.
    pub fn add_message_authenticator(&mut self, secret: &[u8]) -> Result<&mut Self, PacketError> {
        let buffer = self.encode()?;
        let hmac = calculate_message_authenticator(&buffer, secret);
        self.add_attribute(MessageAuthenticator::new(hmac))
    }

    /// Replace the authenticator with the Response Authenticator for `request_authenticator`
    pub fn add_response_authenticator(
        &mut self,
        secret: &[u8],
        request_authenticator: &[u8; 16],
    ) -> Result<&mut Self, PacketError> {
        self.authenticator = self.calculate_authenticator(secret, Some(request_authenticator))?;
        Ok(self)
    }

    /// Sign a server-originated request (RFC 5176 Section 3).
    ///
    /// The authenticator is the MD5 of the packet with a zeroed authenticator
    /// field followed by the secret.
    pub fn sign_request(&mut self, secret: &[u8]) -> Result<&mut Self, PacketError> {
        self.authenticator =
            self.calculate_authenticator(secret, Some(&Self::ZERO_AUTHENTICATOR))?;
        Ok(self)
    }

    /// Whether an attribute of the given well-known type is present
    pub fn has_attribute(&self, attr_type: AttributeType) -> bool {
        self.find_attribute(attr_type.as_u8()).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{
        AcctSessionId, CallingStationId, FramedIpAddress, NasIpAddress, TaggedTunnelType,
        TunnelPrivateGroupId, UserName,
    };
    use crate::TunnelType;
    use std::net::Ipv4Addr;

    #[test]
    fn test_packet_encode_decode() {
        let packet = Packet::new(Code::AccessRequest, 42, [1u8; 16]);
        let encoded = packet.encode().unwrap();
        let decoded = Packet::decode(&encoded).unwrap();

        assert_eq!(decoded.code, Code::AccessRequest);
        assert_eq!(decoded.identifier, 42);
        assert_eq!(decoded.authenticator, [1u8; 16]);
    }

    #[test]
    fn test_packet_min_size() {
        let data = vec![0u8; 19];
        assert!(matches!(
            Packet::decode(&data),
            Err(PacketError::InvalidLength(19))
        ));
    }

    #[test]
    fn test_unknown_code_rejected() {
        let mut data = Packet::new(Code::AccessRequest, 1, [0u8; 16])
            .encode()
            .unwrap();
        data[0] = 99;
        assert!(matches!(
            Packet::decode(&data),
            Err(PacketError::InvalidCode(99))
        ));
    }

    #[test]
    fn test_length_field_larger_than_datagram() {
        let mut data = Packet::new(Code::AccessRequest, 1, [0u8; 16])
            .encode()
            .unwrap();
        data[3] = 40;
        assert!(Packet::decode(&data).is_err());
    }

    #[test]
    fn test_trailing_padding_ignored() {
        let mut packet = Packet::new(Code::AccessRequest, 7, [3u8; 16]);
        packet.add_attribute(UserName::new("aa:bb")).unwrap();
        let mut data = packet.encode().unwrap();
        data.extend_from_slice(&[0, 0, 0]);

        let decoded = Packet::decode(&data).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_truncated_attribute_rejected() {
        let mut packet = Packet::new(Code::AccessRequest, 7, [3u8; 16]);
        packet.add_attribute(UserName::new("aa:bb")).unwrap();
        let mut data = packet.encode().unwrap();
        // Attribute claims more bytes than the packet holds
        data[21] = 30;
        assert!(Packet::decode(&data).is_err());
    }

    #[test]
    fn test_length_tracks_attributes() {
        let mut packet = Packet::new(Code::AccountingRequest, 1, [0u8; 16]);
        assert_eq!(packet.length().unwrap(), 20);

        packet.add_attribute(UserName::new("abc")).unwrap();
        assert_eq!(packet.length().unwrap(), 25);

        packet
            .add_attribute(FramedIpAddress::new(Ipv4Addr::new(10, 0, 0, 5)))
            .unwrap();
        assert_eq!(packet.length().unwrap(), 31);

        packet.remove_attribute(AttributeType::UserName.as_u8());
        assert_eq!(packet.length().unwrap(), 26);

        let encoded = packet.encode().unwrap();
        assert_eq!(encoded.len(), 26);
        assert_eq!(u16::from_be_bytes([encoded[2], encoded[3]]), 26);
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        let mut packet = Packet::new(Code::AccessAccept, 1, [0u8; 16]);
        packet.add_attribute(UserName::new("first")).unwrap();

        let result = packet.add_attribute(UserName::new("second"));
        assert!(matches!(result, Err(PacketError::DuplicateAttribute(1))));
        assert_eq!(packet.attributes().len(), 1);
    }

    #[test]
    fn test_duplicate_raw_and_typed_rejected() {
        let mut packet = Packet::new(Code::AccessAccept, 1, [0u8; 16]);
        packet.add_attribute(UserName::new("first")).unwrap();
        let raw = RawAttribute::new(AttributeType::UserName.as_u8(), b"x".to_vec()).unwrap();
        assert!(packet.add_attribute(raw).is_err());
    }

    #[test]
    fn test_round_trip_preserves_attribute_set() {
        let mut packet = Packet::new(Code::DisconnectRequest, 9, [5u8; 16]);
        packet
            .add_attribute(CallingStationId::new("AA-BB-CC-DD-EE-FF"))
            .unwrap()
            .add_attribute(NasIpAddress::new(Ipv4Addr::new(192, 168, 1, 2)))
            .unwrap()
            .add_attribute(AcctSessionId::new("5F2A0001"))
            .unwrap()
            .add_attribute(TaggedTunnelType::new(0, TunnelType::Vlan).unwrap())
            .unwrap()
            .add_attribute(TunnelPrivateGroupId::new(Some(0), "20").unwrap())
            .unwrap()
            .add_attribute(RawAttribute::new(26, vec![0, 0, 0, 9, 1, 2]).unwrap())
            .unwrap();

        let decoded = Packet::decode(&packet.encode().unwrap()).unwrap();
        assert_eq!(decoded.code, packet.code);
        assert_eq!(decoded.identifier, packet.identifier);
        assert_eq!(decoded.authenticator, packet.authenticator);
        assert_eq!(decoded.attributes().len(), packet.attributes().len());
        for attr in packet.attributes() {
            assert!(decoded.attributes().contains(attr));
        }
    }

    #[test]
    fn test_round_trip_mixes_raw_and_typed() {
        let mut packet = Packet::new(Code::AccountingRequest, 4, [9u8; 16]);
        packet
            .add_attribute(RawAttribute::new(AttributeType::UserName.as_u8(), b"x".to_vec()).unwrap())
            .unwrap()
            .add_attribute(NasIpAddress::new(Ipv4Addr::new(10, 1, 1, 1)))
            .unwrap()
            .add_attribute(RawAttribute::new(8, vec![10, 0, 0]).unwrap())
            .unwrap()
            .add_attribute(RawAttribute::new(26, vec![0, 0, 0, 9, 1, 2]).unwrap())
            .unwrap();

        assert_eq!(
            packet.attributes()[0],
            Attribute::UserName(UserName::new("x"))
        );
        assert!(packet.attributes()[2].is_raw());

        let decoded = Packet::decode(&packet.encode().unwrap()).unwrap();
        assert_eq!(decoded.attributes(), packet.attributes());
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_get_attribute_typed() {
        let mut packet = Packet::new(Code::AccessRequest, 1, [0u8; 16]);
        packet.add_attribute(UserName::new("AA:BB:CC:DD:EE:FF")).unwrap();

        let user = packet.get_attribute::<UserName>().unwrap().unwrap();
        assert_eq!(user.value(), "AA:BB:CC:DD:EE:FF");
        assert!(packet.get_attribute::<NasIpAddress>().unwrap().is_none());
    }

    #[test]
    fn test_malformed_typed_attribute_fails_on_access() {
        let mut packet = Packet::new(Code::AccountingRequest, 1, [0u8; 16]);
        // Framed-IP-Address with 3 bytes
        packet
            .add_attribute(RawAttribute::new(8, vec![10, 0, 0]).unwrap())
            .unwrap();

        let decoded = Packet::decode(&packet.encode().unwrap()).unwrap();
        assert!(matches!(decoded.attributes()[0], Attribute::Raw(_)));
        assert!(decoded.get_attribute::<FramedIpAddress>().is_err());
    }

    #[test]
    fn test_response_authenticator_uses_request_authenticator() {
        let secret = b"sharedsecret";
        let request_auth = [7u8; 16];
        let mut response = Packet::new(Code::AccessAccept, 3, Packet::ZERO_AUTHENTICATOR);
        response.add_response_authenticator(secret, &request_auth).unwrap();

        let mut hashed = Packet::new(Code::AccessAccept, 3, request_auth)
            .encode()
            .unwrap();
        hashed.extend_from_slice(secret);
        assert_eq!(response.authenticator, md5::compute(&hashed).0);
    }

    #[test]
    fn test_message_authenticator_covers_packet_without_itself() {
        let secret = b"sharedsecret";
        let mut response = Packet::new(Code::AccessReject, 3, Packet::ZERO_AUTHENTICATOR);
        let before = response.encode().unwrap();
        response.add_message_authenticator(secret).unwrap();

        let attr = response
            .get_attribute::<MessageAuthenticator>()
            .unwrap()
            .unwrap();
        assert_eq!(
            *attr.value(),
            calculate_message_authenticator(&before, secret)
        );
        assert_eq!(response.length().unwrap(), 38);
    }

    #[test]
    fn test_message_authenticator_added_once() {
        let mut response = Packet::new(Code::AccessReject, 3, Packet::ZERO_AUTHENTICATOR);
        response.add_message_authenticator(b"secret").unwrap();
        assert!(matches!(
            response.add_message_authenticator(b"secret"),
            Err(PacketError::DuplicateAttribute(80))
        ));
    }

    #[test]
    fn test_authenticators_deterministic() {
        let build = || {
            let mut packet = Packet::new(Code::AccessAccept, 11, Packet::ZERO_AUTHENTICATOR);
            packet.add_attribute(UserName::new("device")).unwrap();
            packet
                .add_message_authenticator(b"secret")
                .unwrap()
                .add_response_authenticator(b"secret", &[9u8; 16])
                .unwrap();
            packet.encode().unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_sign_request() {
        let secret = b"acctsecret";
        let mut packet = Packet::new(Code::DisconnectRequest, 0, [0xFFu8; 16]);
        packet.add_attribute(UserName::new("x")).unwrap();
        packet.sign_request(secret).unwrap();

        let mut zeroed = packet.clone();
        zeroed.authenticator = Packet::ZERO_AUTHENTICATOR;
        let mut hashed = zeroed.encode().unwrap();
        hashed.extend_from_slice(secret);
        assert_eq!(packet.authenticator, md5::compute(&hashed).0);
    }

    #[test]
    fn test_packet_too_large() {
        let mut packet = Packet::new(Code::AccessAccept, 1, [0u8; 16]);
        for attr_type in 100..120u8 {
            packet
                .add_attribute(RawAttribute::new(attr_type, vec![0u8; 253]).unwrap())
                .unwrap();
        }
        assert!(matches!(
            packet.encode(),
            Err(PacketError::PacketTooLarge(_))
        ));
    }
}
