/// Header opcodes (RFC 1035 Section 4.1.1, RFC 1996, RFC 2136, RFC 8490)
///
/// Unassigned values decode as `Other` and keep their 4-bit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Query,
    /// Inverse query, obsoleted by RFC 3425
    IQuery,
    Status,
    Notify,
    Update,
    Dso,
    Other(u8),
}

impl Opcode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Opcode::Query,
            1 => Opcode::IQuery,
            2 => Opcode::Status,
            4 => Opcode::Notify,
            5 => Opcode::Update,
            6 => Opcode::Dso,
            other => Opcode::Other(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Opcode::Query => 0,
            Opcode::IQuery => 1,
            Opcode::Status => 2,
            Opcode::Notify => 4,
            Opcode::Update => 5,
            Opcode::Dso => 6,
            Opcode::Other(value) => value,
        }
    }
}

/// Header response codes that fit the 4-bit RCODE field
///
/// Values 12-15 have no meaning without EDNS and decode as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
    YxDomain,
    YxRrSet,
    NxRrSet,
    NotAuth,
    NotZone,
    DsoTypeNotImplemented,
    Other(u8),
}

impl ResponseCode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormatError,
            2 => ResponseCode::ServerFailure,
            3 => ResponseCode::NameError,
            4 => ResponseCode::NotImplemented,
            5 => ResponseCode::Refused,
            6 => ResponseCode::YxDomain,
            7 => ResponseCode::YxRrSet,
            8 => ResponseCode::NxRrSet,
            9 => ResponseCode::NotAuth,
            10 => ResponseCode::NotZone,
            11 => ResponseCode::DsoTypeNotImplemented,
            other => ResponseCode::Other(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            ResponseCode::NoError => 0,
            ResponseCode::FormatError => 1,
            ResponseCode::ServerFailure => 2,
            ResponseCode::NameError => 3,
            ResponseCode::NotImplemented => 4,
            ResponseCode::Refused => 5,
            ResponseCode::YxDomain => 6,
            ResponseCode::YxRrSet => 7,
            ResponseCode::NxRrSet => 8,
            ResponseCode::NotAuth => 9,
            ResponseCode::NotZone => 10,
            ResponseCode::DsoTypeNotImplemented => 11,
            ResponseCode::Other(value) => value,
        }
    }
}

/// The 16-bit flags word of the header
///
/// ```text
///   0  1  2  3  4  5  6  7  8  9 10 11 12 13 14 15
/// +--+-----------+--+--+--+--+--+--+--+-----------+
/// |QR|  Opcode   |AA|TC|RD|RA| Z|AD|CD|   RCODE   |
/// +--+-----------+--+--+--+--+--+--+--+-----------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    pub response: bool,
    pub opcode: Opcode,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub authentic_data: bool,
    pub checking_disabled: bool,
    pub response_code: ResponseCode,
}

impl Default for Flags {
    fn default() -> Self {
        Flags {
            response: false,
            opcode: Opcode::Query,
            authoritative: false,
            truncated: false,
            recursion_desired: false,
            recursion_available: false,
            authentic_data: false,
            checking_disabled: false,
            response_code: ResponseCode::NoError,
        }
    }
}

impl Flags {
    pub fn from_bytes(bytes: [u8; 2]) -> Self {
        let [high, low] = bytes;

        Flags {
            response: high & 0x80 != 0,
            opcode: Opcode::from_u8((high >> 3) & 0x0F),
            authoritative: high & 0x04 != 0,
            truncated: high & 0x02 != 0,
            recursion_desired: high & 0x01 != 0,
            recursion_available: low & 0x80 != 0,
            authentic_data: low & 0x20 != 0,
            checking_disabled: low & 0x10 != 0,
            response_code: ResponseCode::from_u8(low & 0x0F),
        }
    }

    pub fn to_bytes(self) -> [u8; 2] {
        let mut high = (self.opcode.as_u8() & 0x0F) << 3;
        if self.response {
            high |= 0x80;
        }
        if self.authoritative {
            high |= 0x04;
        }
        if self.truncated {
            high |= 0x02;
        }
        if self.recursion_desired {
            high |= 0x01;
        }

        let mut low = self.response_code.as_u8() & 0x0F;
        if self.recursion_available {
            low |= 0x80;
        }
        if self.authentic_data {
            low |= 0x20;
        }
        if self.checking_disabled {
            low |= 0x10;
        }

        [high, low]
    }
}
