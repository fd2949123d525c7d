//! Logging and trace export.
//!
//! Logs always go to stderr: stdout carries nothing but the licensing
//! document.

use std::io::IsTerminal;

use anyhow::Result;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::{trace::SdkTracerProvider, Resource};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Service name reported to the collector unless `OTEL_SERVICE_NAME` is set.
const SERVICE_NAME: &str = "licensing-info";

/// Keeps the trace pipeline alive; pending spans are flushed on drop.
pub struct TelemetryGuard {
	tracer_provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
	fn drop(&mut self) {
		if let Some(provider) = self.tracer_provider.take() {
			if let Err(e) = provider.shutdown() {
				eprintln!("failed to flush traces: {e}");
			}
		}
	}
}

/// Whether an OTLP endpoint is configured through the standard variables.
fn otel_export_enabled() -> bool {
	std::env::var(opentelemetry_otlp::OTEL_EXPORTER_OTLP_ENDPOINT).is_ok()
		|| std::env::var(opentelemetry_otlp::OTEL_EXPORTER_OTLP_TRACES_ENDPOINT).is_ok()
}

/// Build the level filter: an explicit level wins over `RUST_LOG`, which wins
/// over `info`.
fn filter(log_level: Option<Level>) -> EnvFilter {
	match log_level {
		Some(level) => EnvFilter::new(level.as_str()),
		None => EnvFilter::builder()
			.with_default_directive(Level::INFO.into())
			.from_env_lossy(),
	}
}

/// Install the global subscriber.
///
/// Human-readable output on a terminal, JSON lines otherwise. Spans are also
/// exported over OTLP when `OTEL_EXPORTER_OTLP_ENDPOINT` (or the traces
/// specific variant) is set; the transport follows
/// `OTEL_EXPORTER_OTLP_PROTOCOL`.
///
/// Must be called inside a tokio runtime context when export is enabled.
pub fn init(log_level: Option<Level>) -> Result<TelemetryGuard> {
	let fmt_layer = if std::io::stderr().is_terminal() {
		tracing_subscriber::fmt::layer()
			.with_writer(std::io::stderr)
			.with_target(false)
			.boxed()
	} else {
		tracing_subscriber::fmt::layer()
			.with_writer(std::io::stderr)
			.json()
			.boxed()
	};

	let registry = tracing_subscriber::registry()
		.with(filter(log_level))
		.with(fmt_layer);

	if !otel_export_enabled() {
		registry.init();
		return Ok(TelemetryGuard {
			tracer_provider: None,
		});
	}

	let tracer_provider = tracer_provider()?;
	let otel_layer = tracing_opentelemetry::layer()
		.with_error_records_to_exceptions(true)
		.with_tracer(tracer_provider.tracer(SERVICE_NAME));
	registry.with(otel_layer).init();

	opentelemetry::global::set_tracer_provider(tracer_provider.clone());

	Ok(TelemetryGuard {
		tracer_provider: Some(tracer_provider),
	})
}

fn tracer_provider() -> Result<SdkTracerProvider> {
	// Resource::builder() already honours OTEL_SERVICE_NAME and OTEL_RESOURCE_ATTRIBUTES
	let mut resource = Resource::builder();
	if std::env::var("OTEL_SERVICE_NAME").is_err() {
		resource = resource.with_service_name(SERVICE_NAME);
	}

	let exporter = match std::env::var(opentelemetry_otlp::OTEL_EXPORTER_OTLP_PROTOCOL)
		.as_deref()
		.unwrap_or(opentelemetry_otlp::OTEL_EXPORTER_OTLP_PROTOCOL_DEFAULT)
	{
		"grpc" => opentelemetry_otlp::SpanExporter::builder()
			.with_tonic()
			.build()?,
		_ => opentelemetry_otlp::SpanExporter::builder()
			.with_http()
			.build()?,
	};

	Ok(SdkTracerProvider::builder()
		.with_resource(resource.build())
		.with_batch_exporter(exporter)
		.build())
}
