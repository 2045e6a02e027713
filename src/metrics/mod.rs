use prometheus::{
    Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

pub const STAGE_ENCODE: &str = "encode";
pub const STAGE_CONNECT: &str = "connect";
pub const STAGE_SEND: &str = "send";

pub struct Metrics {
    pub messages_sent_total: CounterVec,
    pub send_failures_total: CounterVec,
    pub connections_opened_total: Counter,
    pub send_duration_seconds: Histogram,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let messages_sent_total = CounterVec::new(
            Opts::new(
                "tools_publisher_messages_sent_total",
                "Total number of messages confirmed by the broker",
            ),
            &["topic"],
        )?;

        let send_failures_total = CounterVec::new(
            Opts::new(
                "tools_publisher_send_failures_total",
                "Total number of failed sends by stage",
            ),
            &["stage"],
        )?;

        let connections_opened_total = Counter::new(
            "tools_publisher_connections_opened_total",
            "Total number of transport connections opened",
        )?;

        let send_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "tools_publisher_send_duration_seconds",
                "Time from encode to broker confirmation",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;

        registry.register(Box::new(messages_sent_total.clone()))?;
        registry.register(Box::new(send_failures_total.clone()))?;
        registry.register(Box::new(connections_opened_total.clone()))?;
        registry.register(Box::new(send_duration_seconds.clone()))?;

        Ok(Arc::new(Self {
            messages_sent_total,
            send_failures_total,
            connections_opened_total,
            send_duration_seconds,
            registry,
        }))
    }

    pub fn record_failure(&self, stage: &str) {
        self.send_failures_total.with_label_values(&[stage]).inc();
    }

    /// Prometheus text exposition of everything in the registry.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = vec![];
        encoder.encode(&self.registry.gather(), &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
