use radius_proto::attributes::{
    CallingStationId, NasIdentifier, NasIpAddress, TunnelPrivateGroupId, UserName,
};
use radius_proto::{generate_request_authenticator, verify_response_authenticator, Code, Packet};
use std::net::{Ipv4Addr, UdpSocket};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <mac> <secret> [server_addr]", args[0]);
        eprintln!("Example: {} AA:BB:CC:DD:EE:FF testing123 127.0.0.1:1812", args[0]);
        std::process::exit(1);
    }

    let mac = &args[1];
    let secret = args[2].as_bytes();
    let server_addr = args.get(3).map(|s| s.as_str()).unwrap_or("127.0.0.1:1812");

    println!("NAC Authorization Probe");
    println!("=======================");
    println!("Server: {}", server_addr);
    println!("MAC: {}", mac);
    println!();

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect(server_addr)?;
    socket.set_read_timeout(Some(Duration::from_secs(5)))?;

    // Shaped like a switch doing MAC authentication bypass
    let mut request = Packet::new(Code::AccessRequest, 1, generate_request_authenticator());
    request
        .add_attribute(UserName::new(mac.as_str()))?
        .add_attribute(CallingStationId::new(mac.as_str()))?
        .add_attribute(NasIpAddress::new(Ipv4Addr::LOCALHOST))?
        .add_attribute(NasIdentifier::new("simple-client"))?;

    socket.send(&request.encode()?)?;
    println!("Sent Access-Request ({} attributes)", request.attributes().len());

    let mut buf = [0u8; 4096];
    let len = socket.recv(&mut buf)?;
    let response = Packet::decode(&buf[..len])?;

    if !verify_response_authenticator(&response, &request.authenticator, secret)? {
        eprintln!("Response authenticator mismatch (wrong secret?)");
        std::process::exit(1);
    }

    match response.code {
        Code::AccessAccept => {
            let vlan = response
                .get_attribute::<TunnelPrivateGroupId>()?
                .map(|group| group.value().to_string())
                .unwrap_or_else(|| "<none>".to_string());
            println!("Access-Accept: VLAN {}", vlan);
        }
        Code::AccessReject => println!("Access-Reject"),
        other => println!("Unexpected response code: {:?}", other),
    }

    Ok(())
}
