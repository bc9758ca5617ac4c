use crate::packet::{Packet, PacketError};
use rand::Rng;

/// MD5 over `bytes` followed by `secret`
pub fn md5_authenticator(bytes: &[u8], secret: &[u8]) -> [u8; 16] {
    let mut context = md5::Context::new();
    context.consume(bytes);
    context.consume(secret);
    context.compute().0
}

/// Generate a random Request Authenticator (16 bytes) per RFC 2865 Section 3
pub fn generate_request_authenticator() -> [u8; 16] {
    let mut rng = rand::rng();
    let mut authenticator = [0u8; 16];
    rng.fill(&mut authenticator);
    authenticator
}

/// Calculate Response Authenticator per RFC 2865 Section 3
///
/// Response Authenticator = MD5(Code + ID + Length + Request Authenticator + Attributes + Secret)
///
/// This is used for Access-Accept, Access-Reject and Accounting-Response packets.
pub fn calculate_response_authenticator(
    packet: &Packet,
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<[u8; 16], PacketError> {
    packet.calculate_authenticator(secret, Some(request_authenticator))
}

/// Verify that a response carries the authenticator expected for the request
pub fn verify_response_authenticator(
    response: &Packet,
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<bool, PacketError> {
    let calculated = calculate_response_authenticator(response, request_authenticator, secret)?;
    Ok(response.authenticator == calculated)
}

/// Verify the authenticator of an Accounting-Request (RFC 2866 Section 3) or a
/// Disconnect/CoA request (RFC 5176 Section 3): MD5 over the packet with a
/// zeroed authenticator field, followed by the secret.
pub fn verify_request_authenticator(request: &Packet, secret: &[u8]) -> Result<bool, PacketError> {
    let calculated = request.calculate_authenticator(secret, Some(&Packet::ZERO_AUTHENTICATOR))?;
    Ok(request.authenticator == calculated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::UserName;
    use crate::packet::Code;

    #[test]
    fn test_generate_authenticator() {
        let auth1 = generate_request_authenticator();
        let auth2 = generate_request_authenticator();
        // Should be random
        assert_ne!(auth1, auth2);
    }

    #[test]
    fn test_md5_authenticator_matches_concatenation() {
        let mut joined = b"packet".to_vec();
        joined.extend_from_slice(b"secret");
        assert_eq!(md5_authenticator(b"packet", b"secret"), md5::compute(&joined).0);
    }

    #[test]
    fn test_response_authenticator() {
        let secret = b"sharedsecret";
        let request_auth = [1u8; 16];
        let mut packet = Packet::new(Code::AccessAccept, 42, [0u8; 16]);

        let response_auth =
            calculate_response_authenticator(&packet, &request_auth, secret).unwrap();
        packet.authenticator = response_auth;

        assert!(verify_response_authenticator(&packet, &request_auth, secret).unwrap());
        assert!(!verify_response_authenticator(&packet, &[2u8; 16], secret).unwrap());
        assert!(!verify_response_authenticator(&packet, &request_auth, b"other").unwrap());
    }

    #[test]
    fn test_request_authenticator() {
        let secret = b"sharedsecret";
        let mut packet = Packet::new(Code::AccountingRequest, 5, Packet::ZERO_AUTHENTICATOR);
        packet.add_attribute(UserName::new("aa-bb")).unwrap();
        packet.sign_request(secret).unwrap();

        assert!(verify_request_authenticator(&packet, secret).unwrap());
        assert!(!verify_request_authenticator(&packet, b"wrong").unwrap());
    }
}
