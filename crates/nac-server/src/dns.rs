//! Captive-portal DNS responder
//!
//! Answers every single-question A query with the portal address so that
//! devices on a registration network land on the portal whatever name they
//! look up. Anything else is refused.

use crate::error::ServerError;
use crate::udp::DatagramHandler;
use async_trait::async_trait;
use dns_proto::{Message, Opcode, RecordType, ResourceRecord, ResponseCode};
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::debug;

/// TTL of redirect answers, in seconds
pub const REDIRECT_TTL: u32 = 60;

/// Datagram handler for the DNS port
#[derive(Debug, Clone)]
pub struct DnsRedirectHandler {
    redirect: Ipv4Addr,
}

impl DnsRedirectHandler {
    pub fn new(redirect: Ipv4Addr) -> Self {
        Self { redirect }
    }

    /// Build the reply to `query`.
    ///
    /// Echoes the id, the questions and the RD bit. A standard query with a
    /// lone A question gets one A record for the redirect address; other
    /// opcodes and shapes get REFUSED with no answers.
    pub fn answer(&self, query: &Message) -> Message {
        let mut response = Message::response_to(query);
        match query.questions.as_slice() {
            [question]
                if query.flags.opcode == Opcode::Query && question.record_type == RecordType::A =>
            {
                response.answers.push(ResourceRecord::a(
                    question.name.clone(),
                    self.redirect,
                    REDIRECT_TTL,
                ));
            }
            _ => response.flags.response_code = ResponseCode::Refused,
        }
        response
    }
}

#[async_trait]
impl DatagramHandler for DnsRedirectHandler {
    async fn handle(
        &self,
        socket: &UdpSocket,
        data: &[u8],
        peer: SocketAddr,
    ) -> Result<(), ServerError> {
        let query = Message::decode(data)?;
        let response = self.answer(&query);
        socket.send_to(&response.encode()?, peer).await?;

        debug!(
            client_addr = %peer,
            query_id = query.id,
            questions = query.questions.len(),
            response_code = ?response.flags.response_code,
            "DNS query answered"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dns_proto::Question;

    const PORTAL: Ipv4Addr = Ipv4Addr::new(10, 10, 0, 1);

    fn query(questions: Vec<Question>) -> Message {
        let mut query = Message::new(0x1234);
        query.flags.recursion_desired = true;
        query.questions = questions;
        query
    }

    #[test]
    fn test_a_query_redirected() {
        let handler = DnsRedirectHandler::new(PORTAL);
        let response = handler.answer(&query(vec![Question::new("portal.example.", RecordType::A)]));

        assert_eq!(response.id, 0x1234);
        assert!(response.flags.response);
        assert!(response.flags.recursion_desired);
        assert_eq!(response.flags.response_code, ResponseCode::NoError);
        assert_eq!(response.questions.len(), 1);
        assert_eq!(response.answers.len(), 1);
        assert_eq!(response.answers[0].name, "portal.example.");
        assert_eq!(response.answers[0].ttl, REDIRECT_TTL);
        assert_eq!(response.answers[0].as_a(), Some(PORTAL));
    }

    #[test]
    fn test_rd_mirrored_when_clear() {
        let handler = DnsRedirectHandler::new(PORTAL);
        let mut request = query(vec![Question::new("a.example.", RecordType::A)]);
        request.flags.recursion_desired = false;
        assert!(!handler.answer(&request).flags.recursion_desired);
    }

    #[test]
    fn test_other_shapes_refused() {
        let handler = DnsRedirectHandler::new(PORTAL);
        let cases = [
            vec![],
            vec![Question::new("portal.example.", RecordType::Aaaa)],
            vec![
                Question::new("a.example.", RecordType::A),
                Question::new("b.example.", RecordType::A),
            ],
        ];
        for questions in cases {
            let expected = questions.len();
            let response = handler.answer(&query(questions));
            assert_eq!(response.flags.response_code, ResponseCode::Refused);
            assert!(response.answers.is_empty());
            assert_eq!(response.questions.len(), expected);
        }
    }

    #[test]
    fn test_unassigned_opcode_refused() {
        let handler = DnsRedirectHandler::new(PORTAL);
        let mut bytes = query(vec![Question::new("portal.example.", RecordType::A)])
            .encode()
            .unwrap();
        // Opcode 3 with an undefined RCODE of 12
        bytes[2] |= 3 << 3;
        bytes[3] |= 0x0C;

        let request = Message::decode(&bytes).unwrap();
        assert_eq!(request.flags.opcode, Opcode::Other(3));
        let response = handler.answer(&request);
        assert_eq!(response.id, 0x1234);
        assert_eq!(response.flags.opcode, Opcode::Other(3));
        assert_eq!(response.flags.response_code, ResponseCode::Refused);
        assert!(response.answers.is_empty());
    }
}
