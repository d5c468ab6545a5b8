//! Tracing subscriber and OpenTelemetry exporter wiring.
//!
//! Logs always go to stderr so stdout carries only the search result. The
//! OTLP exporter is enabled when `OTEL_EXPORTER_OTLP_ENDPOINT` is set; the
//! exporter reads the endpoint and headers from the standard `OTEL_*`
//! variables itself.

use anyhow::Context;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::{runtime, Resource};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

const SERVICE_NAME: &str = "niceboard";
const DEFAULT_FILTER: &str = "info";

/// Flushes buffered spans when dropped.
pub struct TelemetryGuard {
    provider: Option<TracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(err) = provider.shutdown() {
                eprintln!("failed to flush traces: {err}");
            }
        }
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides the default `info` filter. With `json` set, events
/// are written as one JSON object per line.
pub fn init(json: bool) -> anyhow::Result<TelemetryGuard> {
    let (otel, provider) = match std::env::var_os("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Some(_) => {
            let (layer, provider) = otel_layer()?;
            (Some(layer), Some(provider))
        }
        None => (None, None),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json_layer = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!json).then(|| fmt::layer().compact().with_writer(std::io::stderr));

    // The OTEL layer goes first so its type is `Layer<Registry>`.
    tracing_subscriber::registry()
        .with(otel)
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(TelemetryGuard { provider })
}

fn otel_layer() -> anyhow::Result<(impl Layer<Registry> + Send + Sync, TracerProvider)> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .context("failed to build OTLP span exporter")?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new([
            KeyValue::new("service.name", SERVICE_NAME),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ]))
        .build();

    opentelemetry::global::set_tracer_provider(provider.clone());
    let layer = tracing_opentelemetry::layer().with_tracer(provider.tracer(SERVICE_NAME));
    Ok((layer, provider))
}
