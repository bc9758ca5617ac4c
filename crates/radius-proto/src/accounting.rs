//! Acct-Status-Type values (RFC 2866 Section 5.1)
//!
//! Only Start and Interim-Update describe a live session; the network
//! access controller records the session details they carry and
//! acknowledges everything else unchanged.
//!
//! ```rust
//! use radius_proto::AcctStatusType;
//!
//! let status = AcctStatusType::from_u32(3).unwrap();
//! assert_eq!(status, AcctStatusType::InterimUpdate);
//! assert!(status.updates_session());
//! assert!(!AcctStatusType::Stop.updates_session());
//! ```

/// Status carried in attribute 40, encoded as a 32-bit big-endian integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AcctStatusType {
    Start = 1,
    Stop = 2,
    InterimUpdate = 3,
    /// NAS came up
    AccountingOn = 7,
    /// NAS is going down
    AccountingOff = 8,
}

impl AcctStatusType {
    const ALL: [AcctStatusType; 5] = [
        AcctStatusType::Start,
        AcctStatusType::Stop,
        AcctStatusType::InterimUpdate,
        AcctStatusType::AccountingOn,
        AcctStatusType::AccountingOff,
    ];

    /// `None` for values outside the five above
    pub fn from_u32(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_u32() == value)
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Whether the packet carries the current session details of a device
    /// (Framed-IP-Address, NAS identity, Acct-Session-Id)
    pub fn updates_session(self) -> bool {
        matches!(self, AcctStatusType::Start | AcctStatusType::InterimUpdate)
    }
}
