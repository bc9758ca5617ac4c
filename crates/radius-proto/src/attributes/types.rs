/// RADIUS Attribute Types as defined in RFC 2865 and related RFCs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AttributeType {
    /// User-Name (1) - RFC 2865
    UserName = 1,
    /// User-Password (2) - RFC 2865
    UserPassword = 2,
    /// NAS-IP-Address (4) - RFC 2865
    NasIpAddress = 4,
    /// NAS-Port (5) - RFC 2865
    NasPort = 5,
    /// Service-Type (6) - RFC 2865
    ServiceType = 6,
    /// Framed-IP-Address (8) - RFC 2865
    FramedIpAddress = 8,
    /// Reply-Message (18) - RFC 2865
    ReplyMessage = 18,
    /// State (24) - RFC 2865
    State = 24,
    /// Class (25) - RFC 2865
    Class = 25,
    /// Vendor-Specific (26) - RFC 2865
    VendorSpecific = 26,
    /// Session-Timeout (27) - RFC 2865
    SessionTimeout = 27,
    /// Called-Station-Id (30) - RFC 2865
    CalledStationId = 30,
    /// Calling-Station-Id (31) - RFC 2865
    CallingStationId = 31,
    /// NAS-Identifier (32) - RFC 2865
    NasIdentifier = 32,
    /// Proxy-State (33) - RFC 2865
    ProxyState = 33,
    /// Acct-Status-Type (40) - RFC 2866
    AcctStatusType = 40,
    /// Acct-Session-Id (44) - RFC 2866
    AcctSessionId = 44,
    /// NAS-Port-Type (61) - RFC 2865
    NasPortType = 61,
    /// Tunnel-Type (64) - RFC 2868
    TunnelType = 64,
    /// Tunnel-Medium-Type (65) - RFC 2868
    TunnelMediumType = 65,
    /// Message-Authenticator (80) - RFC 3579
    MessageAuthenticator = 80,
    /// Tunnel-Private-Group-ID (81) - RFC 2868
    TunnelPrivateGroupId = 81,
}

impl AttributeType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(AttributeType::UserName),
            2 => Some(AttributeType::UserPassword),
            4 => Some(AttributeType::NasIpAddress),
            5 => Some(AttributeType::NasPort),
            6 => Some(AttributeType::ServiceType),
            8 => Some(AttributeType::FramedIpAddress),
            18 => Some(AttributeType::ReplyMessage),
            24 => Some(AttributeType::State),
            25 => Some(AttributeType::Class),
            26 => Some(AttributeType::VendorSpecific),
            27 => Some(AttributeType::SessionTimeout),
            30 => Some(AttributeType::CalledStationId),
            31 => Some(AttributeType::CallingStationId),
            32 => Some(AttributeType::NasIdentifier),
            33 => Some(AttributeType::ProxyState),
            40 => Some(AttributeType::AcctStatusType),
            44 => Some(AttributeType::AcctSessionId),
            61 => Some(AttributeType::NasPortType),
            64 => Some(AttributeType::TunnelType),
            65 => Some(AttributeType::TunnelMediumType),
            80 => Some(AttributeType::MessageAuthenticator),
            81 => Some(AttributeType::TunnelPrivateGroupId),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_codes() {
        for code in 0..=255u8 {
            if let Some(attr_type) = AttributeType::from_u8(code) {
                assert_eq!(attr_type.as_u8(), code);
            }
        }
    }

    #[test]
    fn test_tunnel_codes() {
        assert_eq!(AttributeType::from_u8(64), Some(AttributeType::TunnelType));
        assert_eq!(AttributeType::from_u8(65), Some(AttributeType::TunnelMediumType));
        assert_eq!(AttributeType::from_u8(81), Some(AttributeType::TunnelPrivateGroupId));
        assert_eq!(AttributeType::from_u8(3), None);
    }
}
