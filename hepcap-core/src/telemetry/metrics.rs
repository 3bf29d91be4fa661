use opentelemetry::global;
use opentelemetry::metrics::{Counter, Meter};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;

/// Prometheus-backed counters for the ingest pipeline (spec §6.3, §9
/// "C9 Telemetry"). Registered against a [`Registry`] served by
/// [`super::start_metrics_server`].
#[derive(Clone)]
pub struct Metrics {
    pub hep_decodes_total: Counter<u64>,
    pub decode_errors_total: Counter<u64>,
    pub sip_enrichments_total: Counter<u64>,
    pub sip_enrichment_errors_total: Counter<u64>,

    pub db_writes_total: Counter<u64>,
    pub mq_publishes_total: Counter<u64>,
    pub metric_exports_total: Counter<u64>,

    pub db_overflow_total: Counter<u64>,
    pub mq_overflow_total: Counter<u64>,
    pub metric_overflow_total: Counter<u64>,
}

impl Metrics {
    fn new(meter: Meter) -> Self {
        Self {
            hep_decodes_total: meter
                .u64_counter("hepcap_hep_decodes_total")
                .with_description("Total number of HEP3 datagrams successfully decoded")
                .build(),
            decode_errors_total: meter
                .u64_counter("hepcap_decode_errors_total")
                .with_description("Total number of datagrams dropped for framing errors")
                .build(),
            sip_enrichments_total: meter
                .u64_counter("hepcap_sip_enrichments_total")
                .with_description("Total number of packets successfully SIP-enriched")
                .build(),
            sip_enrichment_errors_total: meter
                .u64_counter("hepcap_sip_enrichment_errors_total")
                .with_description("Total number of SIP enrichment failures")
                .build(),

            db_writes_total: meter
                .u64_counter("hepcap_db_writes_total")
                .with_description("Total number of packets handed to the database sink")
                .build(),
            mq_publishes_total: meter
                .u64_counter("hepcap_mq_publishes_total")
                .with_description("Total number of raw HEP messages handed to the message-queue sink")
                .build(),
            metric_exports_total: meter
                .u64_counter("hepcap_metric_exports_total")
                .with_description("Total number of packets handed to the metrics sink")
                .build(),

            db_overflow_total: meter
                .u64_counter("hepcap_db_overflow_total")
                .with_description("Total number of packets dropped because the db queue was full")
                .build(),
            mq_overflow_total: meter
                .u64_counter("hepcap_mq_overflow_total")
                .with_description("Total number of messages dropped because the mq queue was full")
                .build(),
            metric_overflow_total: meter
                .u64_counter("hepcap_metric_overflow_total")
                .with_description("Total number of packets dropped because the metric queue was full")
                .build(),
        }
    }
}

/// Builds a [`Metrics`] instance registered against a fresh Prometheus
/// [`Registry`], installing it as the global `opentelemetry` meter provider.
pub fn init_metrics() -> Result<(Metrics, Registry), Box<dyn std::error::Error + Send + Sync>> {
    let registry = Registry::default();

    let exporter = opentelemetry_prometheus::exporter().with_registry(registry.clone()).build()?;

    let meter_provider = SdkMeterProvider::builder().with_reader(exporter).build();
    global::set_meter_provider(meter_provider);

    let meter = global::meter("hepcap");
    Ok((Metrics::new(meter), registry))
}
