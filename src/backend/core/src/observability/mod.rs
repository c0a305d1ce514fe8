//! Observability: logging, distributed tracing and metrics.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use opentelemetry_otlp::WithExportConfig;
use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::{LogFormat, ObservabilityConfig};

/// Initialize the tracing subscriber, with OTLP export when an endpoint is set.
///
/// `RUST_LOG` wins over `observability.log_level` when both are present.
pub fn init(service_name: &str, config: &ObservabilityConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().pretty().boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer().compact().boxed(),
    };

    let telemetry_layer = match config.otlp_endpoint.as_deref() {
        Some(endpoint) => {
            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(
                    opentelemetry_otlp::new_exporter()
                        .tonic()
                        .with_endpoint(endpoint),
                )
                .with_trace_config(
                    opentelemetry_sdk::trace::config().with_resource(
                        opentelemetry_sdk::Resource::new(vec![opentelemetry::KeyValue::new(
                            "service.name",
                            service_name.to_string(),
                        )]),
                    ),
                )
                .install_batch(opentelemetry_sdk::runtime::Tokio)?;

            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .with(telemetry_layer)
        .try_init()?;

    Ok(())
}

/// Shutdown OpenTelemetry, flushing pending spans.
pub fn shutdown() {
    opentelemetry::global::shutdown_tracer_provider();
}

/// Metric names and registration.
pub mod metrics {
    use super::*;
    use ::metrics::describe_counter;

    pub const GRAPHQL_REQUESTS: &str = "kinetic_graphql_requests_total";
    pub const AUTHZ_DENIED: &str = "kinetic_authz_denied_total";
    pub const CACHE_HITS: &str = "kinetic_response_cache_hits_total";
    pub const CACHE_MISSES: &str = "kinetic_response_cache_misses_total";
    pub const ERRORS: &str = "kinetic_errors_total";

    /// Install the Prometheus recorder and describe every metric.
    pub fn install_prometheus() -> anyhow::Result<PrometheusHandle> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        register_metrics();
        Ok(handle)
    }

    /// Register all metric descriptions.
    pub fn register_metrics() {
        describe_counter!(
            GRAPHQL_REQUESTS,
            "GraphQL requests by operation kind and outcome"
        );
        describe_counter!(
            AUTHZ_DENIED,
            "Fields rejected by a permission guard, by resource and action"
        );
        describe_counter!(CACHE_HITS, "Query responses served from the response cache");
        describe_counter!(CACHE_MISSES, "Cacheable queries that had to be executed");
        describe_counter!(ERRORS, "Errors raised, by code and category");
        describe_counter!(
            "kinetic_auth_errors_total",
            "Requests rejected during authentication"
        );
        describe_counter!(
            "kinetic_auth_success_total",
            "Requests authenticated, by method"
        );
        describe_counter!(
            "kinetic_csrf_rejected_total",
            "Requests rejected by CSRF prevention"
        );
        describe_counter!(
            "kinetic_query_limit_rejected_total",
            "Documents rejected by alias, directive or length limits"
        );
    }
}
