//! End-to-end ingest pipeline tests driving a live [`IngestServer`] over a
//! real UDP loopback socket (spec §8 concrete scenarios 1-3).

use std::net::{SocketAddr, UdpSocket as StdUdpSocket};
use std::time::Duration;

use hepcap_core::config::{Config, HepConfig, LoggingConfig};
use hepcap_core::IngestServer;
use tokio::net::UdpSocket;
use tokio::time::sleep;

fn pick_free_udp_addr() -> SocketAddr {
    let socket = StdUdpSocket::bind("127.0.0.1:0").expect("bind ephemeral udp port");
    let addr = socket.local_addr().expect("local_addr");
    drop(socket);
    addr
}

fn minimal_config(addr: SocketAddr) -> Config {
    Config {
        hep: HepConfig { addr, workers: 2, inbound_capacity: 256 },
        db: None,
        mq: None,
        metrics: None,
        sentry: None,
        logging: LoggingConfig::default(),
    }
}

/// Builds a minimal valid HEP3/IPv4 datagram matching spec §8 scenario 1.
fn build_minimal_hep3(payload: &str) -> Vec<u8> {
    fn chunk(out: &mut Vec<u8>, kind: u16, body: &[u8]) {
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&kind.to_be_bytes());
        out.extend_from_slice(&((6 + body.len()) as u16).to_be_bytes());
        out.extend_from_slice(body);
    }

    let mut body = Vec::new();
    chunk(&mut body, 0x0001, &[0x02]); // version: IPv4
    chunk(&mut body, 0x0002, &[0x11]); // protocol: UDP
    chunk(&mut body, 0x0003, &[10, 0, 0, 1]); // src ip
    chunk(&mut body, 0x0004, &[10, 0, 0, 2]); // dst ip
    chunk(&mut body, 0x0007, &5060u16.to_be_bytes()); // src port
    chunk(&mut body, 0x0008, &5060u16.to_be_bytes()); // dst port
    chunk(&mut body, 0x0009, &1_600_000_000u32.to_be_bytes()); // tsec
    chunk(&mut body, 0x000a, &0u32.to_be_bytes()); // tmsec
    chunk(&mut body, 0x000b, &[100]); // protoType: not SIP
    chunk(&mut body, 0x000c, &1u32.to_be_bytes()); // nodeID
    chunk(&mut body, 0x000f, payload.as_bytes()); // payload

    let total_len = 6 + body.len();
    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(b"HEP3");
    out.extend_from_slice(&(total_len as u16).to_be_bytes());
    out.extend_from_slice(&body);
    out
}

async fn wait_until<F: Fn() -> bool>(cond: F, timeout: Duration) {
    let start = tokio::time::Instant::now();
    while !cond() {
        if start.elapsed() > timeout {
            panic!("condition not met within {timeout:?}");
        }
        sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn minimal_sip_free_capture_is_counted() {
    let addr = pick_free_udp_addr();
    let server = IngestServer::start(minimal_config(addr)).await.expect("start ingest server");

    let client = UdpSocket::bind("127.0.0.1:0").await.expect("bind client socket");
    client.send_to(&build_minimal_hep3("X"), addr).await.expect("send datagram");

    wait_until(|| server.stats().pkt_count >= 1, Duration::from_secs(2)).await;
    wait_until(|| server.stats().hep_count >= 1, Duration::from_secs(2)).await;

    let snap = server.stats();
    assert_eq!(snap.pkt_count, 1);
    assert_eq!(snap.hep_count, 1);
    assert_eq!(snap.err_count, 0);

    server.shutdown().await;
}

#[tokio::test]
async fn truncated_frame_is_counted_as_error_only() {
    let addr = pick_free_udp_addr();
    let server = IngestServer::start(minimal_config(addr)).await.expect("start ingest server");

    let client = UdpSocket::bind("127.0.0.1:0").await.expect("bind client socket");
    let mut truncated = b"HEP3".to_vec();
    truncated.extend_from_slice(&0x0010u16.to_be_bytes());
    truncated.extend_from_slice(&[0u8; 4]);
    client.send_to(&truncated, addr).await.expect("send truncated datagram");

    wait_until(|| server.stats().pkt_count >= 1, Duration::from_secs(2)).await;
    wait_until(|| server.stats().err_count >= 1, Duration::from_secs(2)).await;

    let snap = server.stats();
    assert_eq!(snap.hep_count, 0);
    assert_eq!(snap.err_count, 1);

    server.shutdown().await;
}

#[tokio::test]
async fn wrong_magic_is_counted_as_error_only() {
    let addr = pick_free_udp_addr();
    let server = IngestServer::start(minimal_config(addr)).await.expect("start ingest server");

    let client = UdpSocket::bind("127.0.0.1:0").await.expect("bind client socket");
    let garbage = vec![0x41u8; 20];
    client.send_to(&garbage, addr).await.expect("send garbage datagram");

    wait_until(|| server.stats().err_count >= 1, Duration::from_secs(2)).await;

    let snap = server.stats();
    assert_eq!(snap.hep_count, 0);
    assert_eq!(snap.err_count, 1);

    server.shutdown().await;
}
