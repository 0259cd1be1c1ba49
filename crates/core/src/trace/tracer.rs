//! Tracer collaborator interface and the default log-emitting tracer

use std::fmt;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use crate::trace::carrier::Injector;
use crate::trace::span::{ActiveSpan, SpanKind, SpanOptions, Tag};
use crate::trace::trace_context::{TRACEPARENT_HEADER, TRACESTATE_HEADER, TraceContext};

/// Failure to serialize a span context into a carrier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Propagation failed: {0}")]
pub struct PropagationError(pub String);

impl PropagationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Tracing backend as seen by the instrumentation layer
pub trait Tracer: Send + Sync + fmt::Debug {
    /// Start a span; a child of `options.parent` when present, a root otherwise.
    fn start_span(&self, options: SpanOptions<'_>) -> Box<dyn ActiveSpan>;

    /// Serialize `context` into `carrier` using the text-map format.
    fn inject(
        &self,
        context: &TraceContext,
        carrier: &mut dyn Injector,
    ) -> Result<(), PropagationError>;
}

/// Write `context` as W3C `traceparent` / `tracestate` entries
pub fn inject_w3c(context: &TraceContext, carrier: &mut dyn Injector) {
    carrier.set(TRACEPARENT_HEADER, context.to_string());
    if let Some(state) = context.trace_state() {
        carrier.set(TRACESTATE_HEADER, state.to_string());
    }
}

/// Default tracer: spans are reported as structured `tracing` events when
/// they finish, and propagated with the W3C text-map format.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

impl Tracer for LogTracer {
    fn start_span(&self, options: SpanOptions<'_>) -> Box<dyn ActiveSpan> {
        let context = options
            .parent
            .map_or_else(TraceContext::new, TraceContext::child);
        debug!(
            span = options.name,
            trace_id = %context.trace_id_hex(),
            span_id = %context.span_id_hex(),
            "Span started"
        );
        Box::new(LogSpan {
            name: options.name.to_string(),
            component: options.component.to_string(),
            kind: options.kind,
            parent_span_id: options.parent.map(TraceContext::span_id_hex),
            context,
            tags: options.tags,
            started: Instant::now(),
        })
    }

    fn inject(
        &self,
        context: &TraceContext,
        carrier: &mut dyn Injector,
    ) -> Result<(), PropagationError> {
        inject_w3c(context, carrier);
        Ok(())
    }
}

struct LogSpan {
    name: String,
    component: String,
    kind: SpanKind,
    parent_span_id: Option<String>,
    context: TraceContext,
    tags: Vec<Tag>,
    started: Instant,
}

impl ActiveSpan for LogSpan {
    fn context(&self) -> &TraceContext {
        &self.context
    }

    fn set_tag(&mut self, tag: Tag) {
        if let Some(existing) = self.tags.iter_mut().find(|t| t.key == tag.key) {
            existing.value = tag.value;
        } else {
            self.tags.push(tag);
        }
    }

    fn finish(self: Box<Self>) {
        let tags = self
            .tags
            .iter()
            .map(|t| format!("{}={}", t.key, t.value))
            .collect::<Vec<_>>()
            .join(" ");
        info!(
            target: "courier::span",
            span = %self.name,
            component = %self.component,
            kind = %self.kind,
            trace_id = %self.context.trace_id_hex(),
            span_id = %self.context.span_id_hex(),
            parent_span_id = self.parent_span_id.as_deref().unwrap_or(""),
            duration_seconds = self.started.elapsed().as_secs_f64(),
            tags = %tags,
            "Span finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::str::FromStr;

    fn options<'a>(parent: Option<&'a TraceContext>) -> SpanOptions<'a> {
        SpanOptions {
            name: "sql.db.Exec",
            component: "sql",
            kind: SpanKind::Client,
            parent,
            tags: vec![Tag::new("db.instance", "mydb")],
        }
    }

    #[test]
    fn test_start_span_without_parent_is_root() {
        let span = LogTracer.start_span(options(None));
        assert!(span.context().is_sampled());
        span.finish();
    }

    #[test]
    fn test_start_span_derives_child_of_parent() {
        let parent = TraceContext::new();
        let span = LogTracer.start_span(options(Some(&parent)));

        assert_eq!(span.context().trace_id(), parent.trace_id());
        assert_ne!(span.context().span_id(), parent.span_id());
        span.finish();
    }

    #[test]
    fn test_inject_writes_traceparent() {
        let ctx = TraceContext::new();
        let mut carrier: HashMap<String, String> = HashMap::new();

        LogTracer.inject(&ctx, &mut carrier).unwrap();

        let written = TraceContext::from_str(&carrier[TRACEPARENT_HEADER]).unwrap();
        assert_eq!(written.trace_id(), ctx.trace_id());
        assert!(!carrier.contains_key(TRACESTATE_HEADER));
    }

    #[test]
    fn test_inject_writes_tracestate_when_present() {
        let ctx = TraceContext::new().with_trace_state("vendor=abc");
        let mut carrier: HashMap<String, String> = HashMap::new();

        LogTracer.inject(&ctx, &mut carrier).unwrap();

        assert_eq!(carrier[TRACESTATE_HEADER], "vendor=abc");
    }
}
