//! Trace context, spans and propagation
//!
//! The tracing backend is an external collaborator behind the [`Tracer`]
//! trait. This module defines that interface, the span guard the call
//! wrapper relies on, the text-map carrier traits and the W3C
//! `traceparent` format used by the default [`LogTracer`].

pub mod carrier;
pub mod correlation;
pub mod span;
pub mod trace_context;
pub mod tracer;

pub use carrier::{Extractor, Injector};
pub use correlation::{CORRELATION_ID_HEADER, CorrelationId};
pub use span::{ActiveSpan, SpanGuard, SpanKind, SpanOptions, Tag, TagValue, tags};
pub use trace_context::{TRACEPARENT_HEADER, TRACESTATE_HEADER, TraceContext, TraceContextError};
pub use tracer::{LogTracer, PropagationError, Tracer, inject_w3c};

/// Read a W3C trace context back out of a carrier
pub fn extract_trace_context(carrier: &dyn Extractor) -> Option<TraceContext> {
    let parent: TraceContext = carrier.get(TRACEPARENT_HEADER)?.parse().ok()?;
    Some(match carrier.get(TRACESTATE_HEADER) {
        Some(state) => parent.with_trace_state(state),
        None => parent,
    })
}
