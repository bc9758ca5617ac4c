//! Tunnel attribute values (RFC 2868, RFC 3580)
//!
//! Dynamic VLAN assignment answers an Access-Request with
//! Tunnel-Type = VLAN, Tunnel-Medium-Type = IEEE-802 and the VLAN id in
//! Tunnel-Private-Group-ID.

/// Tunnel-Type values (RFC 2868 Section 3.1, RFC 3580 Section 3.31)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TunnelType {
    /// Point-to-Point Tunneling Protocol (1)
    Pptp = 1,
    /// Layer Two Forwarding (2)
    L2f = 2,
    /// Layer Two Tunneling Protocol (3)
    L2tp = 3,
    /// Ascend Tunnel Management Protocol (4)
    Atmp = 4,
    /// Virtual Tunneling Protocol (5)
    Vtp = 5,
    /// IP Authentication Header in Tunnel-mode (6)
    Ah = 6,
    /// IP-in-IP Encapsulation (7)
    IpIp = 7,
    /// Minimal IP-in-IP Encapsulation (8)
    MinIpIp = 8,
    /// IP Encapsulating Security Payload in Tunnel-mode (9)
    Esp = 9,
    /// Generic Route Encapsulation (10)
    Gre = 10,
    /// Bay Dial Virtual Services (11)
    Dvs = 11,
    /// IP-in-IP Tunneling (12)
    IpInIp = 12,
    /// Virtual LANs (13) - RFC 3580
    Vlan = 13,
}

impl TunnelType {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(TunnelType::Pptp),
            2 => Some(TunnelType::L2f),
            3 => Some(TunnelType::L2tp),
            4 => Some(TunnelType::Atmp),
            5 => Some(TunnelType::Vtp),
            6 => Some(TunnelType::Ah),
            7 => Some(TunnelType::IpIp),
            8 => Some(TunnelType::MinIpIp),
            9 => Some(TunnelType::Esp),
            10 => Some(TunnelType::Gre),
            11 => Some(TunnelType::Dvs),
            12 => Some(TunnelType::IpInIp),
            13 => Some(TunnelType::Vlan),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// Tunnel-Medium-Type values (RFC 2868 Section 3.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TunnelMediumType {
    /// IPv4 (1)
    Ipv4 = 1,
    /// IPv6 (2)
    Ipv6 = 2,
    /// NSAP (3)
    Nsap = 3,
    /// HDLC (4)
    Hdlc = 4,
    /// BBN 1822 (5)
    Bbn1822 = 5,
    /// IEEE 802, including Ethernet (6)
    Ieee802 = 6,
    /// E.163 (7)
    E163 = 7,
    /// E.164 (8)
    E164 = 8,
    /// F.69 (9)
    F69 = 9,
    /// X.121 (10)
    X121 = 10,
    /// IPX (11)
    Ipx = 11,
    /// Appletalk (12)
    Appletalk = 12,
    /// Decnet IV (13)
    DecnetIv = 13,
    /// Banyan Vines (14)
    BanyanVines = 14,
    /// E.164 with NSAP format subaddress (15)
    E164Nsap = 15,
}

impl TunnelMediumType {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(TunnelMediumType::Ipv4),
            2 => Some(TunnelMediumType::Ipv6),
            3 => Some(TunnelMediumType::Nsap),
            4 => Some(TunnelMediumType::Hdlc),
            5 => Some(TunnelMediumType::Bbn1822),
            6 => Some(TunnelMediumType::Ieee802),
            7 => Some(TunnelMediumType::E163),
            8 => Some(TunnelMediumType::E164),
            9 => Some(TunnelMediumType::F69),
            10 => Some(TunnelMediumType::X121),
            11 => Some(TunnelMediumType::Ipx),
            12 => Some(TunnelMediumType::Appletalk),
            13 => Some(TunnelMediumType::DecnetIv),
            14 => Some(TunnelMediumType::BanyanVines),
            15 => Some(TunnelMediumType::E164Nsap),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tunnel_type_conversion() {
        assert_eq!(TunnelType::Vlan.as_u32(), 13);
        assert_eq!(TunnelType::from_u32(1), Some(TunnelType::Pptp));
        assert_eq!(TunnelType::from_u32(13), Some(TunnelType::Vlan));
        assert_eq!(TunnelType::from_u32(0), None);
        assert_eq!(TunnelType::from_u32(14), None);
    }

    #[test]
    fn test_tunnel_medium_type_conversion() {
        assert_eq!(TunnelMediumType::Ieee802.as_u32(), 6);
        for value in 1..=15 {
            assert_eq!(TunnelMediumType::from_u32(value).unwrap().as_u32(), value);
        }
        assert_eq!(TunnelMediumType::from_u32(16), None);
    }
}
