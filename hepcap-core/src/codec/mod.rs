//! HEP3 TLV wire framing: decode captured datagrams into [`Packet`]s and
//! encode them back for sinks that want the raw wire form.

use std::net::IpAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{HepError, Result};
use crate::sip::ParsedSip;

const MAGIC: &[u8; 4] = b"HEP3";
const HEADER_LEN: usize = 6;
const CHUNK_HEADER_LEN: usize = 6;

const VERSION_IPV4: u8 = 0x02;
const VERSION_IPV6: u8 = 0x0a;

/// SIP payload type, as carried in the ProtoType chunk.
pub const PROTO_TYPE_SIP: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
enum ChunkType {
    Version = 0x0001,
    Protocol = 0x0002,
    Ipv4Src = 0x0003,
    Ipv4Dst = 0x0004,
    Ipv6Src = 0x0005,
    Ipv6Dst = 0x0006,
    SrcPort = 0x0007,
    DstPort = 0x0008,
    Tsec = 0x0009,
    Tmsec = 0x000a,
    ProtoType = 0x000b,
    NodeId = 0x000c,
    KeepAliveTimer = 0x000d,
    NodePw = 0x000e,
    Payload = 0x000f,
    CompressedPayload = 0x0010,
    CorrelationId = 0x0011,
    Vlan = 0x0012,
}

impl ChunkType {
    fn from_u16(id: u16) -> Option<Self> {
        Some(match id {
            0x0001 => Self::Version,
            0x0002 => Self::Protocol,
            0x0003 => Self::Ipv4Src,
            0x0004 => Self::Ipv4Dst,
            0x0005 => Self::Ipv6Src,
            0x0006 => Self::Ipv6Dst,
            0x0007 => Self::SrcPort,
            0x0008 => Self::DstPort,
            0x0009 => Self::Tsec,
            0x000a => Self::Tmsec,
            0x000b => Self::ProtoType,
            0x000c => Self::NodeId,
            0x000d => Self::KeepAliveTimer,
            0x000e => Self::NodePw,
            0x000f => Self::Payload,
            0x0010 => Self::CompressedPayload,
            0x0011 => Self::CorrelationId,
            0x0012 => Self::Vlan,
            _ => return None,
        })
    }
}

/// A fully decoded HEP3 packet.
///
/// Constructed once by [`decode`]; mutated only by SIP enrichment before
/// handoff to the sink dispatcher, read-only and shared thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub version: u8,
    pub protocol: u8,
    pub src_ip: Vec<u8>,
    pub dst_ip: Vec<u8>,
    pub src_ip_string: String,
    pub dst_ip_string: String,
    pub src_port: u16,
    pub dst_port: u16,
    pub tsec: u32,
    pub tmsec: u32,
    pub proto_type: u8,
    pub node_id: u32,
    pub keep_alive_timer: u16,
    pub node_pw: String,
    pub payload: String,
    pub compressed_payload: Vec<u8>,
    pub correlation_id: String,
    pub vlan: u16,
    pub sip: Option<ParsedSip>,
}

impl Packet {
    /// Wall-clock instant derived from `tsec` seconds plus `tmsec` microseconds.
    pub fn timestamp(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.tsec as u64) + Duration::from_micros(self.tmsec as u64)
    }
}

/// Decode a single HEP3 datagram.
///
/// Unknown chunk types are skipped for forward compatibility. The Payload
/// chunk is sanitised per [`sanitize_text`] rather than rejected outright.
pub fn decode(bytes: &[u8]) -> Result<Packet> {
    if bytes.len() < HEADER_LEN || &bytes[0..4] != MAGIC {
        return Err(HepError::Magic);
    }
    let declared_len = u16::from_be_bytes([bytes[4], bytes[5]]) as usize;
    if declared_len != bytes.len() {
        return Err(HepError::Length { declared: declared_len, actual: bytes.len() });
    }

    let mut version = 0u8;
    let mut protocol = 0u8;
    let mut src_ip: Vec<u8> = Vec::new();
    let mut dst_ip: Vec<u8> = Vec::new();
    let mut src_port = 0u16;
    let mut dst_port = 0u16;
    let mut tsec = 0u32;
    let mut tmsec = 0u32;
    let mut proto_type = 0u8;
    let mut node_id = 0u32;
    let mut keep_alive_timer = 0u16;
    let mut node_pw = String::new();
    let mut payload = String::new();
    let mut compressed_payload: Vec<u8> = Vec::new();
    let mut correlation_id = String::new();
    let mut vlan = 0u16;

    let mut offset = HEADER_LEN;
    while offset < bytes.len() {
        let remaining = bytes.len() - offset;
        if remaining < CHUNK_HEADER_LEN {
            return Err(HepError::ChunkOverflow { declared: remaining, remaining });
        }
        let chunk_id = u16::from_be_bytes([bytes[offset + 2], bytes[offset + 3]]);
        let chunk_len = u16::from_be_bytes([bytes[offset + 4], bytes[offset + 5]]) as usize;
        if chunk_len < CHUNK_HEADER_LEN || chunk_len > remaining {
            return Err(HepError::ChunkOverflow { declared: chunk_len, remaining });
        }
        let body = &bytes[offset + CHUNK_HEADER_LEN..offset + chunk_len];

        if let Some(kind) = ChunkType::from_u16(chunk_id) {
            match kind {
                ChunkType::Version => version = body.first().copied().unwrap_or_default(),
                ChunkType::Protocol => protocol = body.first().copied().unwrap_or_default(),
                ChunkType::Ipv4Src => src_ip = body.to_vec(),
                ChunkType::Ipv4Dst => dst_ip = body.to_vec(),
                ChunkType::Ipv6Src => src_ip = body.to_vec(),
                ChunkType::Ipv6Dst => dst_ip = body.to_vec(),
                ChunkType::SrcPort => src_port = be_u16(body),
                ChunkType::DstPort => dst_port = be_u16(body),
                ChunkType::Tsec => tsec = be_u32(body),
                ChunkType::Tmsec => tmsec = be_u32(body),
                ChunkType::ProtoType => proto_type = body.first().copied().unwrap_or_default(),
                ChunkType::NodeId => node_id = be_u32(body),
                ChunkType::KeepAliveTimer => keep_alive_timer = be_u16(body),
                ChunkType::NodePw => node_pw = sanitize_text(body),
                ChunkType::Payload => payload = sanitize_text(body),
                ChunkType::CompressedPayload => compressed_payload = body.to_vec(),
                ChunkType::CorrelationId => correlation_id = sanitize_text(body),
                ChunkType::Vlan => vlan = be_u16(body),
            }
        }
        // unknown chunk types are tolerated and skipped

        offset += chunk_len;
    }

    let src_ip_string = ip_to_string(&src_ip);
    let dst_ip_string = ip_to_string(&dst_ip);

    Ok(Packet {
        version,
        protocol,
        src_ip,
        dst_ip,
        src_ip_string,
        dst_ip_string,
        src_port,
        dst_port,
        tsec,
        tmsec,
        proto_type,
        node_id,
        keep_alive_timer,
        node_pw,
        payload,
        compressed_payload,
        correlation_id,
        vlan,
        sip: None,
    })
}

/// Encode a packet back into its HEP3 wire form.
///
/// Emits chunks in a fixed order (Version, Protocol, src/dst IP, ports,
/// timestamps, ProtoType, NodeID, NodePW, Payload, CorrelationID).
/// `KeepAliveTimer`, `CompressedPayload`, and `Vlan` are reserved fields and
/// are not emitted, matching the reference encoder.
pub fn encode(packet: &Packet) -> Vec<u8> {
    let mut body = Vec::new();

    push_u8_chunk(&mut body, ChunkType::Version, packet.version);
    push_u8_chunk(&mut body, ChunkType::Protocol, packet.protocol);
    if packet.version == VERSION_IPV6 {
        push_bytes_chunk(&mut body, ChunkType::Ipv6Src, &packet.src_ip);
        push_bytes_chunk(&mut body, ChunkType::Ipv6Dst, &packet.dst_ip);
    } else {
        push_bytes_chunk(&mut body, ChunkType::Ipv4Src, &packet.src_ip);
        push_bytes_chunk(&mut body, ChunkType::Ipv4Dst, &packet.dst_ip);
    }
    push_u16_chunk(&mut body, ChunkType::SrcPort, packet.src_port);
    push_u16_chunk(&mut body, ChunkType::DstPort, packet.dst_port);
    push_u32_chunk(&mut body, ChunkType::Tsec, packet.tsec);
    push_u32_chunk(&mut body, ChunkType::Tmsec, packet.tmsec);
    push_u8_chunk(&mut body, ChunkType::ProtoType, packet.proto_type);
    push_u32_chunk(&mut body, ChunkType::NodeId, packet.node_id);
    push_bytes_chunk(&mut body, ChunkType::NodePw, packet.node_pw.as_bytes());
    push_bytes_chunk(&mut body, ChunkType::Payload, packet.payload.as_bytes());
    if !packet.correlation_id.is_empty() {
        push_bytes_chunk(&mut body, ChunkType::CorrelationId, packet.correlation_id.as_bytes());
    }

    let total_len = HEADER_LEN + body.len();
    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&(total_len as u16).to_be_bytes());
    out.extend_from_slice(&body);
    out
}

fn push_u8_chunk(out: &mut Vec<u8>, kind: ChunkType, value: u8) {
    push_bytes_chunk(out, kind, &[value]);
}

fn push_u16_chunk(out: &mut Vec<u8>, kind: ChunkType, value: u16) {
    push_bytes_chunk(out, kind, &value.to_be_bytes());
}

fn push_u32_chunk(out: &mut Vec<u8>, kind: ChunkType, value: u32) {
    push_bytes_chunk(out, kind, &value.to_be_bytes());
}

fn push_bytes_chunk(out: &mut Vec<u8>, kind: ChunkType, body: &[u8]) {
    let chunk_len = CHUNK_HEADER_LEN + body.len();
    out.extend_from_slice(&[0u8, 0u8]); // vendor id, ignored on decode
    out.extend_from_slice(&(kind as u16).to_be_bytes());
    out.extend_from_slice(&(chunk_len as u16).to_be_bytes());
    out.extend_from_slice(body);
}

fn be_u16(body: &[u8]) -> u16 {
    let mut buf = [0u8; 2];
    let n = body.len().min(2);
    buf[2 - n..].copy_from_slice(&body[..n]);
    u16::from_be_bytes(buf)
}

fn be_u32(body: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    let n = body.len().min(4);
    buf[4 - n..].copy_from_slice(&body[..n]);
    u32::from_be_bytes(buf)
}

fn ip_to_string(raw: &[u8]) -> String {
    match raw.len() {
        4 => IpAddr::from(<[u8; 4]>::try_from(raw).expect("checked len")).to_string(),
        16 => IpAddr::from(<[u8; 16]>::try_from(raw).expect("checked len")).to_string(),
        _ => String::new(),
    }
}

/// Convert a byte sequence into valid Unicode, eliding lone invalid bytes and
/// replacing genuine multi-byte invalid sequences with U+FFFD, so the result
/// is always valid text regardless of what the capture agent sent.
fn sanitize_text(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                break;
            }
            Err(err) => {
                let valid_up_to = err.valid_up_to();
                out.push_str(std::str::from_utf8(&rest[..valid_up_to]).expect("valid prefix"));
                match err.error_len() {
                    Some(1) => {
                        // lone invalid byte: elide entirely, no replacement rune
                        rest = &rest[valid_up_to + 1..];
                    }
                    Some(n) => {
                        out.push('\u{FFFD}');
                        rest = &rest[valid_up_to + n..];
                    }
                    None => {
                        // incomplete sequence at the end of the buffer
                        out.push('\u{FFFD}');
                        break;
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_packet() -> Packet {
        Packet {
            version: VERSION_IPV4,
            protocol: 0x11,
            src_ip: vec![10, 0, 0, 1],
            dst_ip: vec![10, 0, 0, 2],
            src_ip_string: "10.0.0.1".into(),
            dst_ip_string: "10.0.0.2".into(),
            src_port: 5060,
            dst_port: 5060,
            tsec: 1_600_000_000,
            tmsec: 0,
            proto_type: 100,
            node_id: 1,
            keep_alive_timer: 0,
            node_pw: "secret".into(),
            payload: "X".into(),
            compressed_payload: Vec::new(),
            correlation_id: String::new(),
            vlan: 0,
            sip: None,
        }
    }

    #[test]
    fn round_trip_preserves_emitted_fields() {
        let packet = sample_packet();
        let wire = encode(&packet);
        let decoded = decode(&wire).expect("decode");
        assert_eq!(decoded.version, packet.version);
        assert_eq!(decoded.protocol, packet.protocol);
        assert_eq!(decoded.src_ip, packet.src_ip);
        assert_eq!(decoded.dst_ip, packet.dst_ip);
        assert_eq!(decoded.src_ip_string, "10.0.0.1");
        assert_eq!(decoded.src_port, packet.src_port);
        assert_eq!(decoded.dst_port, packet.dst_port);
        assert_eq!(decoded.tsec, packet.tsec);
        assert_eq!(decoded.tmsec, packet.tmsec);
        assert_eq!(decoded.proto_type, packet.proto_type);
        assert_eq!(decoded.node_id, packet.node_id);
        assert_eq!(decoded.node_pw, packet.node_pw);
        assert_eq!(decoded.payload, packet.payload);
        // reserved fields are not emitted by the encoder
        assert_eq!(decoded.keep_alive_timer, 0);
        assert_eq!(decoded.vlan, 0);
        assert!(decoded.compressed_payload.is_empty());
    }

    #[test]
    fn round_trip_ipv6() {
        let mut packet = sample_packet();
        packet.version = VERSION_IPV6;
        packet.src_ip = vec![0u8; 16];
        packet.dst_ip = vec![1u8; 16];
        let wire = encode(&packet);
        let decoded = decode(&wire).expect("decode");
        assert_eq!(decoded.src_ip.len(), 16);
        assert_eq!(decoded.dst_ip.len(), 16);
    }

    #[test]
    fn rejects_wrong_magic() {
        let bytes = vec![0u8; 20];
        assert!(matches!(decode(&bytes), Err(HepError::Magic)));
    }

    #[test]
    fn rejects_length_mismatch() {
        let mut bytes = b"HEP3".to_vec();
        bytes.extend_from_slice(&0x0010u16.to_be_bytes());
        bytes.extend_from_slice(&[0u8; 4]);
        assert!(matches!(decode(&bytes), Err(HepError::Length { .. })));
    }

    #[test]
    fn unknown_chunk_is_skipped_without_affecting_known_fields() {
        let packet = sample_packet();
        let mut wire = encode(&packet);
        // splice an unknown chunk (vendor 0, type 0xbeef) right after the header
        let mut unknown_chunk = vec![0u8, 0u8, 0xbe, 0xef, 0u8, 0u8];
        unknown_chunk[4..6].copy_from_slice(&(6u16).to_be_bytes());
        wire.splice(6..6, unknown_chunk);
        let new_len = wire.len() as u16;
        wire[4..6].copy_from_slice(&new_len.to_be_bytes());

        let decoded = decode(&wire).expect("decode with unknown chunk");
        assert_eq!(decoded.src_ip_string, "10.0.0.1");
        assert_eq!(decoded.payload, "X");
    }

    #[test]
    fn payload_sanitisation_yields_valid_unicode() {
        let bytes: &[u8] = &[b'o', b'k', 0xff, b'!', 0xc3, 0x28];
        let text = sanitize_text(bytes);
        assert!(std::str::from_utf8(text.as_bytes()).is_ok());
    }

    #[test]
    fn lone_invalid_byte_is_elided() {
        let text = sanitize_text(&[b'a', 0xff, b'b']);
        assert_eq!(text, "ab");
    }
}
