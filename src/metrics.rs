//! Optional observability: Prometheus metrics (`metrics` feature) and
//! `tracing` spans (`tracing` feature).

#[cfg(feature = "metrics")]
pub use self::prometheus_metrics::{BedrockMetrics, METRICS};

#[cfg(feature = "metrics")]
mod prometheus_metrics {
    use once_cell::sync::Lazy;
    use opentelemetry::{
        global,
        metrics::{Counter, Histogram},
        KeyValue,
    };
    use opentelemetry_prometheus::PrometheusExporter;
    use opentelemetry_sdk::metrics::SdkMeterProvider;

    pub static METRICS: Lazy<BedrockMetrics> = Lazy::new(BedrockMetrics::init);

    pub struct BedrockMetrics {
        pub provider: SdkMeterProvider,
        pub install_runs_total: Counter<u64>,
        pub migrations_applied_total: Counter<u64>,
        pub queries_total: Counter<u64>,
        pub query_duration: Histogram<f64>,
    }

    impl BedrockMetrics {
        pub fn init() -> Self {
            let exporter: PrometheusExporter = opentelemetry_prometheus::exporter()
                .with_registry(prometheus::default_registry().clone())
                .build()
                .expect("failed to build prometheus exporter");
            let provider = SdkMeterProvider::builder().with_reader(exporter).build();
            global::set_meter_provider(provider.clone());
            let meter = global::meter("bedrock");

            let install_runs_total = meter
                .u64_counter("bedrock_install_runs_total")
                .with_description("Install sequencer invocations by overall outcome")
                .build();

            let migrations_applied_total = meter
                .u64_counter("bedrock_migrations_applied_total")
                .with_description("Migration definitions applied and recorded in the ledger")
                .build();

            let queries_total = meter
                .u64_counter("bedrock_queries_total")
                .with_description("Total queries executed")
                .build();

            let query_duration = meter
                .f64_histogram("bedrock_query_duration_seconds")
                .with_description("Duration of queries")
                .build();

            Self {
                provider,
                install_runs_total,
                migrations_applied_total,
                queries_total,
                query_duration,
            }
        }

        pub fn record_install(&self, outcome: &'static str) {
            self.install_runs_total
                .add(1, &[KeyValue::new("outcome", outcome)]);
        }

        pub fn record_migrations_applied(&self, count: usize) {
            self.migrations_applied_total.add(count as u64, &[]);
        }

        pub fn record_query(&self, elapsed: std::time::Duration, ok: bool) {
            self.queries_total.add(1, &[KeyValue::new("ok", ok)]);
            self.query_duration.record(elapsed.as_secs_f64(), &[]);
        }
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render() -> Result<String, prometheus::Error> {
        use prometheus::Encoder;

        Lazy::force(&METRICS);
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(feature = "metrics")]
pub use self::prometheus_metrics::render;

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{info_span, Span};

    /// Span covering one executed statement. Only the leading keyword is
    /// recorded so parameters and identifiers stay out of the trace.
    pub fn execute_query_span(query: &str) -> Span {
        let verb = query.split_whitespace().next().unwrap_or("");
        info_span!("bedrock.query", db.operation = %verb)
    }

    /// Span covering one state of the install sequencer.
    pub fn install_step_span(state: &'static str) -> Span {
        info_span!("bedrock.install", state)
    }
}
