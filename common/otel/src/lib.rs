//! Tracing/logging/metrics initialization shared by every `corestack-*`
//! crate.
//!
//! Every manager in the workspace logs at `debug!` for internal bookkeeping,
//! `info!` for state transitions (checkpoint created, approval resolved,
//! mission completed) and `warn!` for recoverable anomalies (budget
//! exhaustion, stale context) using structured fields (`task_id = %id`)
//! rather than interpolated strings. This crate owns the one-time process
//! setup those call sites assume has already run.

use once_cell::sync::OnceCell;
use opentelemetry::trace::TraceContextExt;
use opentelemetry::trace::TraceError;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static TRACER_PROVIDER: OnceCell<SdkTracerProvider> = OnceCell::new();

/// Configuration for [`init_tracing`].
#[derive(Debug, Clone)]
pub struct OtelConfig {
    /// Service name attached to every emitted span as `service.name`.
    pub service_name: String,
    /// `RUST_LOG`-style filter directive; falls back to `info` when absent.
    pub filter: Option<String>,
    /// Emit JSON-formatted log lines instead of the human-readable default.
    pub json: bool,
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            service_name: "corestack".to_string(),
            filter: None,
            json: false,
        }
    }
}

/// Initialize the global `tracing` subscriber plus an in-process OTel
/// tracer provider. Idempotent: subsequent calls are no-ops so tests that
/// each construct a `MissionContext` don't panic on double-init.
pub fn init_tracing(config: OtelConfig) -> Result<(), TraceError> {
    if TRACER_PROVIDER.get().is_some() {
        return Ok(());
    }

    let provider = SdkTracerProvider::builder().build();
    let tracer = provider.tracer(config.service_name.clone());
    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    let env_filter = config
        .filter
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter).with(otel_layer);

    let result = if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    // A previous global subscriber (e.g. installed by a test harness) is not
    // fatal; the tracer provider itself is still usable for span creation.
    let _ = result;

    let _ = TRACER_PROVIDER.set(provider);
    Ok(())
}

/// Parse a `traceparent` HTTP header (W3C Trace Context) into an
/// [`opentelemetry::Context`] carrying the remote span, or `None` if the
/// header is malformed. Used to stitch an event-log task's spans to an
/// upstream editor-host trace when one is supplied.
pub fn extract_traceparent_context(
    traceparent: String,
    tracestate: Option<String>,
) -> Option<opentelemetry::Context> {
    use opentelemetry::trace::SpanContext;
    use opentelemetry::trace::SpanId;
    use opentelemetry::trace::TraceFlags;
    use opentelemetry::trace::TraceId;
    use opentelemetry::trace::TraceState;
    use std::str::FromStr;

    let parts: Vec<&str> = traceparent.split('-').collect();
    if parts.len() != 4 {
        return None;
    }
    let [version, trace_id, span_id, flags] = [parts[0], parts[1], parts[2], parts[3]];
    if version.len() != 2 {
        return None;
    }
    let trace_id = TraceId::from_hex(trace_id).ok()?;
    let span_id = SpanId::from_hex(span_id).ok()?;
    let flags = u8::from_str_radix(flags, 16).ok()?;
    let trace_state = tracestate
        .and_then(|s| TraceState::from_str(&s).ok())
        .unwrap_or_default();

    let span_context = SpanContext::new(
        trace_id,
        span_id,
        TraceFlags::new(flags),
        true,
        trace_state,
    );
    if !span_context.is_valid() {
        return None;
    }
    let context = opentelemetry::Context::new().with_remote_span_context(span_context);
    Some(context)
}

#[cfg(test)]
#[path = "otel_provider.test.rs"]
mod tests;
