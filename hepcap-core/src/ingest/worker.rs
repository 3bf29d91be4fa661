//! Worker Pool (spec §4.5): decode, enrich, dispatch, and recycle.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::buffer::BufferPool;
use crate::codec::{self, PROTO_TYPE_SIP};
use crate::error_reporter::ErrorReporter;
use crate::ingest::dispatcher::SinkHandles;
use crate::ingest::receiver::InboundMessage;
use crate::sip::{self, SipParser, MIN_SIP_PAYLOAD_LEN};
use crate::stats::Stats;
use crate::telemetry::Metrics;

/// Decode, enrich, dispatch, and recycle a single inbound message (spec
/// §4.5 steps 1-5). Shared by every worker task; `W` workers calling this
/// concurrently over a shared inbound queue is what gives the pool its
/// "no total ordering across workers" semantics (spec §4.5).
#[allow(clippy::too_many_arguments)]
pub async fn process_one(
    message: InboundMessage,
    pool: &BufferPool,
    sinks: &SinkHandles,
    stats: &Stats,
    metrics: &Metrics,
    sip_parser: &Arc<dyn SipParser>,
    error_reporter: &Arc<dyn ErrorReporter>,
) {
    let InboundMessage { buf, len } = message;
    let wire = &buf[..len];

    let mut packet = match codec::decode(wire) {
        Ok(p) => p,
        Err(e) => {
            stats.incr_err();
            metrics.decode_errors_total.add(1, &[]);
            error_reporter.report(&e);
            pool.release(buf);
            return;
        }
    };
    stats.incr_hep();
    metrics.hep_decodes_total.add(1, &[]);

    if packet.proto_type == PROTO_TYPE_SIP && packet.payload.len() > MIN_SIP_PAYLOAD_LEN {
        let output = sip_parser.parse(&packet.payload);
        match sip::enrich(output) {
            Ok(parsed) => {
                metrics.sip_enrichments_total.add(1, &[]);
                packet.sip = Some(parsed);
            }
            Err(e) => {
                // spec §9 open question: on SIP enrichment failure the
                // reference drops the whole packet; this keeps that
                // behavior rather than silently changing it.
                stats.incr_err();
                metrics.sip_enrichment_errors_total.add(1, &[]);
                error_reporter.report(&e);
                pool.release(buf);
                return;
            }
        }
    }

    // copy wire bytes before recycling the buffer (spec §9: resolves the
    // buffer-pool dual-use race via option (a))
    let raw = Bytes::copy_from_slice(wire);
    debug!(src = %packet.src_ip_string, dst = %packet.dst_ip_string, "dispatching packet");
    sinks.dispatch(Arc::new(packet), raw);

    pool.release(buf);
}
