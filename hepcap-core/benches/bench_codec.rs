//! Micro benchmark for the HEP3 TLV codec. Pure CPU, no network, no IO.
//!
//! ```bash
//! cargo bench --bench bench_codec
//! ```

use criterion::{criterion_group, criterion_main, Criterion};
use hepcap_core::codec::{decode, encode, Packet};

fn sample_packet() -> Packet {
    Packet {
        version: 0x02,
        protocol: 0x11,
        src_ip: vec![10, 0, 0, 1],
        dst_ip: vec![10, 0, 0, 2],
        src_ip_string: "10.0.0.1".into(),
        dst_ip_string: "10.0.0.2".into(),
        src_port: 5060,
        dst_port: 5060,
        tsec: 1_600_000_000,
        tmsec: 123_456,
        proto_type: 1,
        node_id: 42,
        keep_alive_timer: 0,
        node_pw: "secret".into(),
        payload: "INVITE sip:bob@example.com SIP/2.0\r\nCall-ID: abc123callid\r\nCSeq: 1 INVITE\r\n\r\n"
            .into(),
        compressed_payload: Vec::new(),
        correlation_id: "corr-1".into(),
        vlan: 0,
        sip: None,
    }
}

fn bench_encode(c: &mut Criterion) {
    let packet = sample_packet();
    c.bench_function("hep3_encode", |b| b.iter(|| encode(&packet)));
}

fn bench_decode(c: &mut Criterion) {
    let wire = encode(&sample_packet());
    c.bench_function("hep3_decode", |b| b.iter(|| decode(&wire).expect("decode")));
}

fn bench_round_trip(c: &mut Criterion) {
    let packet = sample_packet();
    c.bench_function("hep3_round_trip", |b| {
        b.iter(|| {
            let wire = encode(&packet);
            decode(&wire).expect("decode")
        })
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_round_trip);
criterion_main!(benches);
