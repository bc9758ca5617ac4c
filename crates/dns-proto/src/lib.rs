//! DNS Protocol Implementation
//!
//! A small DNS message codec (RFC 1035) covering the header, questions and
//! uncompressed resource records. It is enough to answer single A queries for
//! a captive portal; it is not a resolver.
//!
//! # Example
//!
//! ```rust
//! use dns_proto::{Message, Question, RecordType, ResourceRecord, ResponseCode};
//! use std::net::Ipv4Addr;
//!
//! let mut query = Message::new(0x1234);
//! query.flags.recursion_desired = true;
//! query.questions.push(Question::new("portal.example", RecordType::A));
//! let query = Message::decode(&query.encode().unwrap()).unwrap();
//!
//! let mut reply = Message::response_to(&query);
//! reply.flags.response_code = ResponseCode::NoError;
//! reply.answers.push(ResourceRecord::a(
//!     &query.questions[0].name,
//!     Ipv4Addr::new(10, 0, 0, 1),
//!     60,
//! ));
//! let bytes = reply.encode().unwrap();
//! assert_eq!(&bytes[0..2], &[0x12, 0x34]);
//! ```

mod error;
mod header;
mod message;
mod name;
mod reader;
mod record;

pub use error::DnsError;
pub use header::{Flags, Opcode, ResponseCode};
pub use message::Message;
pub use name::{decode_name, encode_name, MAX_LABEL_LENGTH, MAX_NAME_LENGTH};
pub use record::{Class, Question, RecordType, ResourceRecord};

/// Well-known DNS port
pub const DNS_PORT: u16 = 53;
