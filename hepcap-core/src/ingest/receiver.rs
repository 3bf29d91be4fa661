//! UDP Receiver (spec §4.4): reads datagrams into pooled buffers and
//! enqueues them for the worker pool.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::buffer::{BufferPool, MAX_DGRAM};
use crate::error::{HepError, Result};
use crate::stats::Stats;

/// A datagram read from the socket: a pooled buffer plus the number of
/// bytes actually filled. The worker decodes `buf[..len]`, then returns
/// `buf` to the pool once it's done with both the decode and the mq copy.
pub struct InboundMessage {
    pub buf: BytesMut,
    pub len: usize,
}

/// Per-iteration read deadline (spec §4.4 rationale: bounds shutdown latency
/// without requiring an async cancellation primitive on the socket itself).
const READ_DEADLINE: Duration = Duration::from_secs(1);

/// Scratch buffer length for the raw socket read: one byte past `MAX_DGRAM`
/// so a datagram larger than the accepted maximum actually reads back a
/// length greater than `MAX_DGRAM` instead of being silently truncated to
/// it by `recv_from`. The pooled buffer itself stays exactly `MAX_DGRAM`
/// (spec §3.2, §4.3); only accepted datagrams are copied into it.
const RECV_SCRATCH_LEN: usize = MAX_DGRAM + 1;

/// Binds `addr` and loops until `shutdown` fires, pushing each accepted
/// datagram onto `inbound`. Enqueueing is true backpressure: a full inbound
/// queue stalls the receiver (spec §5), which is the intended flow-control
/// back into the kernel socket buffer.
pub async fn run(
    addr: SocketAddr,
    pool: Arc<BufferPool>,
    inbound: mpsc::Sender<InboundMessage>,
    stats: Arc<Stats>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let socket = UdpSocket::bind(addr).await.map_err(HepError::Bind)?;
    info!(%addr, "udp receiver bound");

    let mut scratch = vec![0u8; RECV_SCRATCH_LEN];

    loop {
        if *shutdown.borrow() {
            break;
        }

        let mut buf = pool.acquire();
        let read = tokio::select! {
            res = timeout(READ_DEADLINE, socket.recv_from(&mut scratch)) => res,
            _ = shutdown.changed() => {
                pool.release(buf);
                if *shutdown.borrow() {
                    break;
                }
                continue;
            }
        };

        match read {
            Ok(Ok((n, _peer))) if n > MAX_DGRAM => {
                stats.incr_err();
                pool.release(buf);
            }
            Ok(Ok((n, _peer))) => {
                stats.incr_pkt();
                buf[..n].copy_from_slice(&scratch[..n]);
                if inbound.send(InboundMessage { buf, len: n }).await.is_err() {
                    // inbound channel closed: shutting down
                    break;
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "udp receiver: read error");
                pool.release(buf);
            }
            Err(_timeout) => {
                pool.release(buf);
            }
        }
    }

    info!("udp receiver stopping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recv_scratch_is_one_byte_larger_than_max_dgram() {
        assert_eq!(RECV_SCRATCH_LEN, MAX_DGRAM + 1);
    }
}
