use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use radius_proto::attributes::{
    AcctSessionId, AcctStatus, CallingStationId, FramedIpAddress, NasIdentifier, NasIpAddress,
    TaggedTunnelMediumType, TaggedTunnelType, TunnelPrivateGroupId, UserName,
};
use radius_proto::auth::generate_request_authenticator;
use radius_proto::{AcctStatusType, Code, Packet, RawAttribute, TunnelMediumType, TunnelType};
use std::net::Ipv4Addr;

fn create_accounting_request(num_vendor_attributes: usize) -> Packet {
    let mut packet = Packet::new(Code::AccountingRequest, 1, generate_request_authenticator());

    packet
        .add_attribute(UserName::new("AA-BB-CC-DD-EE-FF"))
        .and_then(|p| p.add_attribute(AcctStatus::new(AcctStatusType::InterimUpdate)))
        .and_then(|p| p.add_attribute(FramedIpAddress::new(Ipv4Addr::new(10, 20, 0, 15))))
        .and_then(|p| p.add_attribute(NasIpAddress::new(Ipv4Addr::new(192, 168, 1, 2))))
        .and_then(|p| p.add_attribute(NasIdentifier::new("switch-01")))
        .and_then(|p| p.add_attribute(CallingStationId::new("AA-BB-CC-DD-EE-FF")))
        .and_then(|p| p.add_attribute(AcctSessionId::new("5F2A0001")))
        .expect("Failed to build accounting request");

    // Unregistered types stay raw and exercise the fallback path
    for i in 0..num_vendor_attributes {
        let attr = RawAttribute::new(100 + i as u8, format!("vendor_{}", i).into_bytes())
            .expect("Failed to create raw attribute");
        packet.add_attribute(attr).expect("Failed to add raw attribute");
    }

    packet
}

fn bench_packet_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_encode");

    for num_attrs in [0, 5, 10, 20].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_attrs),
            num_attrs,
            |b, &num_attrs| {
                let packet = create_accounting_request(num_attrs);
                b.iter(|| packet.encode().expect("Failed to encode packet"));
            },
        );
    }

    group.finish();
}

fn bench_packet_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_decode");

    for num_attrs in [0, 5, 10, 20].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_attrs),
            num_attrs,
            |b, &num_attrs| {
                let encoded = create_accounting_request(num_attrs)
                    .encode()
                    .expect("Failed to encode");
                b.iter(|| Packet::decode(black_box(&encoded)).expect("Failed to decode packet"));
            },
        );
    }

    group.finish();
}

fn bench_vlan_accept(c: &mut Criterion) {
    let secret = b"testing123";
    let mut request = Packet::new(Code::AccessRequest, 1, generate_request_authenticator());
    request
        .add_attribute(UserName::new("AA:BB:CC:DD:EE:FF"))
        .expect("Failed to add User-Name");

    c.bench_function("vlan_accept_build", |b| {
        b.iter(|| {
            let mut accept = Packet::response_to(black_box(&request), Code::AccessAccept);
            accept
                .add_attribute(TaggedTunnelType::new(0, TunnelType::Vlan).expect("tag"))
                .and_then(|p| {
                    p.add_attribute(
                        TaggedTunnelMediumType::new(0, TunnelMediumType::Ieee802).expect("tag"),
                    )
                })
                .and_then(|p| p.add_attribute(TunnelPrivateGroupId::new(Some(0), "20").expect("tag")))
                .and_then(|p| p.add_message_authenticator(secret))
                .and_then(|p| p.add_response_authenticator(secret, &request.authenticator))
                .expect("Failed to build accept");
            accept.encode().expect("Failed to encode")
        });
    });
}

fn bench_typed_access(c: &mut Criterion) {
    let packet = Packet::decode(&create_accounting_request(5).encode().expect("encode"))
        .expect("decode");

    c.bench_function("typed_attribute_access", |b| {
        b.iter(|| {
            let user = black_box(&packet).get_attribute::<UserName>().expect("user");
            let ip = black_box(&packet).get_attribute::<FramedIpAddress>().expect("ip");
            black_box((user, ip))
        });
    });
}

criterion_group!(
    benches,
    bench_packet_encode,
    bench_packet_decode,
    bench_vlan_accept,
    bench_typed_access
);
criterion_main!(benches);
