use std::net::Ipv4Addr;

use crate::name::{encode_name, read_name};
use crate::reader::Reader;
use crate::DnsError;

/// Resource record types (RFC 1035 Section 3.2.2 and later registrations)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Ns,
    Cname,
    Soa,
    Ptr,
    Mx,
    Txt,
    Aaaa,
    Srv,
    Opt,
    Https,
    Any,
    Other(u16),
}

impl RecordType {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => RecordType::A,
            2 => RecordType::Ns,
            5 => RecordType::Cname,
            6 => RecordType::Soa,
            12 => RecordType::Ptr,
            15 => RecordType::Mx,
            16 => RecordType::Txt,
            28 => RecordType::Aaaa,
            33 => RecordType::Srv,
            41 => RecordType::Opt,
            65 => RecordType::Https,
            255 => RecordType::Any,
            other => RecordType::Other(other),
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::Ns => 2,
            RecordType::Cname => 5,
            RecordType::Soa => 6,
            RecordType::Ptr => 12,
            RecordType::Mx => 15,
            RecordType::Txt => 16,
            RecordType::Aaaa => 28,
            RecordType::Srv => 33,
            RecordType::Opt => 41,
            RecordType::Https => 65,
            RecordType::Any => 255,
            RecordType::Other(value) => value,
        }
    }
}

/// Record classes (RFC 1035 Section 3.2.4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    Internet,
    Chaos,
    Hesiod,
    None,
    Any,
    Other(u16),
}

impl Class {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Class::Internet,
            3 => Class::Chaos,
            4 => Class::Hesiod,
            254 => Class::None,
            255 => Class::Any,
            other => Class::Other(other),
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Class::Internet => 1,
            Class::Chaos => 3,
            Class::Hesiod => 4,
            Class::None => 254,
            Class::Any => 255,
            Class::Other(value) => value,
        }
    }
}

/// Entry of the question section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub record_type: RecordType,
    pub class: Class,
}

impl Question {
    /// Internet-class question for `name`
    pub fn new(name: impl Into<String>, record_type: RecordType) -> Self {
        Question {
            name: name.into(),
            record_type,
            class: Class::Internet,
        }
    }

    pub(crate) fn read(reader: &mut Reader<'_>) -> Result<Self, DnsError> {
        let name = read_name(reader)?;
        let record_type = RecordType::from_u16(reader.read_u16()?);
        let class = Class::from_u16(reader.read_u16()?);
        Ok(Question {
            name,
            record_type,
            class,
        })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) -> Result<(), DnsError> {
        encode_name(&self.name, out)?;
        out.extend_from_slice(&self.record_type.as_u16().to_be_bytes());
        out.extend_from_slice(&self.class.as_u16().to_be_bytes());
        Ok(())
    }
}

/// Entry of the answer, authority or additional section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    pub record_type: RecordType,
    pub class: Class,
    pub ttl: u32,
    pub data: Vec<u8>,
}

impl ResourceRecord {
    /// Internet-class A record
    pub fn a(name: impl Into<String>, address: Ipv4Addr, ttl: u32) -> Self {
        ResourceRecord {
            name: name.into(),
            record_type: RecordType::A,
            class: Class::Internet,
            ttl,
            data: address.octets().to_vec(),
        }
    }

    /// The address carried by an A record
    pub fn as_a(&self) -> Option<Ipv4Addr> {
        if self.record_type != RecordType::A {
            return None;
        }
        let octets: [u8; 4] = self.data.as_slice().try_into().ok()?;
        Some(Ipv4Addr::from(octets))
    }

    pub(crate) fn read(reader: &mut Reader<'_>) -> Result<Self, DnsError> {
        let name = read_name(reader)?;
        let record_type = RecordType::from_u16(reader.read_u16()?);
        let class = Class::from_u16(reader.read_u16()?);
        let ttl = reader.read_u32()?;
        let data_len = reader.read_u16()? as usize;
        let data = reader.read_bytes(data_len)?.to_vec();
        Ok(ResourceRecord {
            name,
            record_type,
            class,
            ttl,
            data,
        })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) -> Result<(), DnsError> {
        let data_len = u16::try_from(self.data.len())
            .map_err(|_| DnsError::RecordDataTooLong(self.data.len()))?;
        encode_name(&self.name, out)?;
        out.extend_from_slice(&self.record_type.as_u16().to_be_bytes());
        out.extend_from_slice(&self.class.as_u16().to_be_bytes());
        out.extend_from_slice(&self.ttl.to_be_bytes());
        out.extend_from_slice(&data_len.to_be_bytes());
        out.extend_from_slice(&self.data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_codes() {
        assert_eq!(RecordType::from_u16(1), RecordType::A);
        assert_eq!(RecordType::from_u16(28), RecordType::Aaaa);
        assert_eq!(RecordType::from_u16(999), RecordType::Other(999));
        assert_eq!(RecordType::Other(999).as_u16(), 999);
        assert_eq!(RecordType::Https.as_u16(), 65);
    }

    #[test]
    fn test_class_codes() {
        assert_eq!(Class::from_u16(1), Class::Internet);
        assert_eq!(Class::from_u16(42), Class::Other(42));
        assert_eq!(Class::Any.as_u16(), 255);
    }

    #[test]
    fn test_a_record_wire_form() {
        let record = ResourceRecord::a("portal.example.", Ipv4Addr::new(10, 0, 0, 1), 60);
        let mut out = Vec::new();
        record.write(&mut out).unwrap();

        let mut expected = b"\x06portal\x07example\x00".to_vec();
        expected.extend_from_slice(&[0, 1, 0, 1, 0, 0, 0, 60, 0, 4, 10, 0, 0, 1]);
        assert_eq!(out, expected);

        let mut reader = Reader::new(&out);
        let decoded = ResourceRecord::read(&mut reader).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.as_a(), Some(Ipv4Addr::new(10, 0, 0, 1)));
    }

    #[test]
    fn test_as_a_requires_a_record() {
        let mut record = ResourceRecord::a("x.", Ipv4Addr::LOCALHOST, 1);
        record.data.push(0);
        assert_eq!(record.as_a(), None);

        record.record_type = RecordType::Txt;
        record.data.truncate(4);
        assert_eq!(record.as_a(), None);
    }

    #[test]
    fn test_truncated_record_data() {
        let mut out = Vec::new();
        ResourceRecord::a("x.", Ipv4Addr::LOCALHOST, 1)
            .write(&mut out)
            .unwrap();
        out.truncate(out.len() - 1);
        let mut reader = Reader::new(&out);
        assert!(matches!(
            ResourceRecord::read(&mut reader),
            Err(DnsError::Truncated { .. })
        ));
    }
}
