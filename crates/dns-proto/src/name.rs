//! Domain names as sequences of length-prefixed labels (RFC 1035 Section 3.1)

use crate::reader::Reader;
use crate::DnsError;

/// Maximum length of a single label
pub const MAX_LABEL_LENGTH: usize = 63;
/// Maximum length of an encoded name, including length octets and the root
pub const MAX_NAME_LENGTH: usize = 255;

const POINTER_MASK: u8 = 0xC0;

/// Decode the name starting at `offset`.
///
/// Returns the fully qualified name (always ending in `.`) and the number of
/// bytes consumed. Compression pointers are rejected.
pub fn decode_name(data: &[u8], offset: usize) -> Result<(String, usize), DnsError> {
    let mut reader = Reader::new(data);
    reader.read_bytes(offset)?;
    let name = read_name(&mut reader)?;
    Ok((name, reader.position() - offset))
}

pub(crate) fn read_name(reader: &mut Reader<'_>) -> Result<String, DnsError> {
    let mut name = String::new();
    let mut encoded_len = 0usize;

    loop {
        let start = reader.position();
        let len = reader.read_u8()?;
        encoded_len += 1;

        if len == 0 {
            break;
        }
        if len & POINTER_MASK == POINTER_MASK {
            return Err(DnsError::CompressionNotSupported(start));
        }
        if len as usize > MAX_LABEL_LENGTH {
            return Err(DnsError::LabelTooLong(len as usize));
        }

        let label = reader.read_bytes(len as usize)?;
        encoded_len += label.len();
        if encoded_len > MAX_NAME_LENGTH {
            return Err(DnsError::NameTooLong(encoded_len));
        }

        name.push_str(std::str::from_utf8(label).map_err(|_| DnsError::InvalidLabel)?);
        name.push('.');
    }

    if name.is_empty() {
        name.push('.');
    }
    Ok(name)
}

/// Append the wire form of `name` to `out`.
///
/// A trailing dot is optional; `""` and `"."` both encode the root.
pub fn encode_name(name: &str, out: &mut Vec<u8>) -> Result<(), DnsError> {
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    let start = out.len();

    if !trimmed.is_empty() {
        for label in trimmed.split('.') {
            if label.is_empty() {
                out.truncate(start);
                return Err(DnsError::EmptyLabel(name.to_string()));
            }
            if label.len() > MAX_LABEL_LENGTH {
                out.truncate(start);
                return Err(DnsError::LabelTooLong(label.len()));
            }
            out.push(label.len() as u8);
            out.extend_from_slice(label.as_bytes());
        }
    }
    out.push(0);

    let encoded_len = out.len() - start;
    if encoded_len > MAX_NAME_LENGTH {
        out.truncate(start);
        return Err(DnsError::NameTooLong(encoded_len));
    }
    Ok(())
}
