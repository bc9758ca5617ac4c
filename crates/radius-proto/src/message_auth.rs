//! Message-Authenticator Support (RFC 2869 Section 5.14)
//!
//! HMAC-MD5 keyed with the shared secret, 16 bytes long.
//!
//! Responses built by [`Packet::add_message_authenticator`](crate::Packet::add_message_authenticator)
//! hash the packet as it stands before the attribute is appended. Verification
//! of received packets follows the RFC form, where the attribute is present
//! with its value zeroed.

use crate::attributes::{MessageAuthenticator, TypedAttribute};
use crate::packet::{Packet, PacketError};
use hmac::{Hmac, Mac};
use md5_digest::Md5;

type HmacMd5 = Hmac<Md5>;

/// HMAC-MD5 of `packet_bytes` keyed with `secret`
pub fn calculate_message_authenticator(packet_bytes: &[u8], secret: &[u8]) -> [u8; 16] {
    let mut mac = HmacMd5::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(packet_bytes);
    let bytes = mac.finalize().into_bytes();

    let mut output = [0u8; 16];
    output.copy_from_slice(&bytes);
    output
}

/// Verify an RFC 2869 Message-Authenticator found at `message_auth_offset`
/// (the first value byte) by re-hashing the packet with that value zeroed.
pub fn verify_message_authenticator(
    packet_bytes: &[u8],
    secret: &[u8],
    message_auth_offset: usize,
) -> bool {
    if message_auth_offset + 16 > packet_bytes.len() {
        return false;
    }

    let received_auth = &packet_bytes[message_auth_offset..message_auth_offset + 16];

    let mut packet_copy = packet_bytes.to_vec();
    packet_copy[message_auth_offset..message_auth_offset + 16].fill(0);

    let expected_auth = calculate_message_authenticator(&packet_copy, secret);

    received_auth == expected_auth
}

/// Verify a Message-Authenticator produced by
/// [`Packet::add_message_authenticator`].
///
/// `signing_authenticator` is the authenticator field as it was when the
/// attribute was appended (all zeros for responses built by this crate).
/// Returns `Ok(false)` when the packet carries no Message-Authenticator.
pub fn verify_appended_message_authenticator(
    packet: &Packet,
    signing_authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<bool, PacketError> {
    let Some(received) = packet.get_attribute::<MessageAuthenticator>()? else {
        return Ok(false);
    };

    let mut unsigned = packet.clone();
    unsigned.remove_attribute(MessageAuthenticator::TYPE.as_u8());
    unsigned.authenticator = *signing_authenticator;
    let expected = calculate_message_authenticator(&unsigned.encode()?, secret);

    Ok(*received.value() == expected)
}
