use crate::header::Flags;
use crate::reader::Reader;
use crate::record::{Question, ResourceRecord};
use crate::DnsError;

/// DNS message (RFC 1035 Section 4.1)
///
/// ```text
/// +---------------------+
/// |        Header       |  id, flags, four section counts
/// +---------------------+
/// |       Question      |
/// +---------------------+
/// |        Answer       |
/// +---------------------+
/// |      Authority      |
/// +---------------------+
/// |      Additional     |
/// +---------------------+
/// ```
///
/// Section counts are not stored; they are taken from the lists on encode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub id: u16,
    pub flags: Flags,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

impl Message {
    pub const HEADER_SIZE: usize = 12;

    pub fn new(id: u16) -> Self {
        Message {
            id,
            ..Message::default()
        }
    }

    /// Start a response: same id, opcode and questions, RD mirrored, QR set
    pub fn response_to(request: &Message) -> Self {
        let flags = Flags {
            response: true,
            opcode: request.flags.opcode,
            recursion_desired: request.flags.recursion_desired,
            checking_disabled: request.flags.checking_disabled,
            ..Flags::default()
        };
        Message {
            id: request.id,
            flags,
            questions: request.questions.clone(),
            ..Message::default()
        }
    }

    pub fn decode(data: &[u8]) -> Result<Self, DnsError> {
        let mut reader = Reader::new(data);

        let id = reader.read_u16()?;
        let flag_bytes = reader.read_bytes(2)?;
        let flags = Flags::from_bytes([flag_bytes[0], flag_bytes[1]]);
        let question_count = reader.read_u16()?;
        let answer_count = reader.read_u16()?;
        let authority_count = reader.read_u16()?;
        let additional_count = reader.read_u16()?;

        let questions = (0..question_count)
            .map(|_| Question::read(&mut reader))
            .collect::<Result<Vec<_>, _>>()?;
        let answers = read_section(&mut reader, answer_count)?;
        let authorities = read_section(&mut reader, authority_count)?;
        let additional = read_section(&mut reader, additional_count)?;

        Ok(Message {
            id,
            flags,
            questions,
            answers,
            authorities,
            additional,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, DnsError> {
        let mut out = Vec::with_capacity(512);
        out.extend_from_slice(&self.id.to_be_bytes());
        out.extend_from_slice(&self.flags.to_bytes());
        for count in [
            self.questions.len(),
            self.answers.len(),
            self.authorities.len(),
            self.additional.len(),
        ] {
            let count = u16::try_from(count).map_err(|_| DnsError::TooManyRecords(count))?;
            out.extend_from_slice(&count.to_be_bytes());
        }

        for question in &self.questions {
            question.write(&mut out)?;
        }
        for record in self
            .answers
            .iter()
            .chain(&self.authorities)
            .chain(&self.additional)
        {
            record.write(&mut out)?;
        }

        Ok(out)
    }
}

fn read_section(reader: &mut Reader<'_>, count: u16) -> Result<Vec<ResourceRecord>, DnsError> {
    (0..count).map(|_| ResourceRecord::read(reader)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Class, Opcode, RecordType, ResponseCode};
    use std::net::Ipv4Addr;

    fn query_bytes() -> Vec<u8> {
        // id 0x1234, RD, one question portal.example A IN
        let mut data = vec![0x12, 0x34, 0x01, 0x00, 0, 1, 0, 0, 0, 0, 0, 0];
        data.extend_from_slice(b"\x06portal\x07example\x00");
        data.extend_from_slice(&[0, 1, 0, 1]);
        data
    }

    #[test]
    fn test_decode_query() {
        let message = Message::decode(&query_bytes()).unwrap();
        assert_eq!(message.id, 0x1234);
        assert!(message.flags.recursion_desired);
        assert!(!message.flags.response);
        assert_eq!(message.flags.opcode, Opcode::Query);
        assert_eq!(message.questions.len(), 1);
        assert_eq!(message.questions[0].name, "portal.example.");
        assert_eq!(message.questions[0].record_type, RecordType::A);
        assert_eq!(message.questions[0].class, Class::Internet);
    }

    #[test]
    fn test_encode_query_matches_wire() {
        let mut message = Message::new(0x1234);
        message.flags.recursion_desired = true;
        message
            .questions
            .push(Question::new("portal.example", RecordType::A));
        assert_eq!(message.encode().unwrap(), query_bytes());
    }

    #[test]
    fn test_header_too_short() {
        assert!(matches!(
            Message::decode(&[0x12, 0x34, 0x01]),
            Err(DnsError::Truncated { .. })
        ));
    }

    #[test]
    fn test_question_count_exceeds_data() {
        let mut data = query_bytes();
        data[5] = 2;
        assert!(Message::decode(&data).is_err());
    }

    #[test]
    fn test_all_sections_encoded() {
        let request = Message::decode(&query_bytes()).unwrap();
        let mut response = Message::response_to(&request);
        response.answers.push(ResourceRecord::a(
            "portal.example.",
            Ipv4Addr::new(10, 0, 0, 1),
            60,
        ));
        response.authorities.push(ResourceRecord {
            name: "example.".to_string(),
            record_type: RecordType::Ns,
            class: Class::Internet,
            ttl: 300,
            data: b"\x02ns\x00".to_vec(),
        });
        response.additional.push(ResourceRecord {
            name: ".".to_string(),
            record_type: RecordType::Opt,
            class: Class::Other(1232),
            ttl: 0,
            data: Vec::new(),
        });

        let bytes = response.encode().unwrap();
        assert_eq!(&bytes[4..12], &[0, 1, 0, 1, 0, 1, 0, 1]);
        assert_eq!(Message::decode(&bytes).unwrap(), response);
    }

    #[test]
    fn test_response_to() {
        let request = Message::decode(&query_bytes()).unwrap();
        let response = Message::response_to(&request);
        assert_eq!(response.id, 0x1234);
        assert!(response.flags.response);
        assert!(response.flags.recursion_desired);
        assert!(!response.flags.recursion_available);
        assert_eq!(response.flags.response_code, ResponseCode::NoError);
        assert_eq!(response.questions, request.questions);
        assert!(response.answers.is_empty());
    }
}
