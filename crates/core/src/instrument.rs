//! Instrumented call pipeline
//!
//! Every facade method is one pass through the same steps:
//!
//! 1. [`Instrumentation::start`] opens a span named `<component>.<op>` as a
//!    child of the caller's context.
//! 2. Publish paths call [`Call::inject`] with a carrier bound to the
//!    outgoing message's metadata.
//! 3. [`Call::run`] awaits the driver future, observes
//!    `(destination, success, seconds)`, completes the span and wraps any
//!    driver error into [`Error::Call`].
//!
//! The measured duration covers only the driver future.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error};

use crate::context::CallContext;
use crate::error::{BoxError, Error, Result};
use crate::metrics::{HistogramVec, MetricsRegistry, SeriesOpts};
use crate::trace::{
    Injector, LogTracer, SpanGuard, SpanKind, SpanOptions, Tag, TraceContext, Tracer, span, tags,
};

/// Tracer and metric registry shared by every facade of a process
#[derive(Debug, Clone)]
pub struct Telemetry {
    tracer: Arc<dyn Tracer>,
    registry: Arc<MetricsRegistry>,
}

impl Telemetry {
    pub fn new(tracer: Arc<dyn Tracer>, registry: Arc<MetricsRegistry>) -> Self {
        Self { tracer, registry }
    }

    /// Use `tracer` with a fresh registry
    pub fn with_tracer(tracer: Arc<dyn Tracer>) -> Self {
        Self::new(tracer, Arc::new(MetricsRegistry::new()))
    }

    pub const fn tracer(&self) -> &Arc<dyn Tracer> {
        &self.tracer
    }

    pub const fn registry(&self) -> &Arc<MetricsRegistry> {
        &self.registry
    }

    /// Register the series for one resource kind and build its descriptor.
    ///
    /// # Errors
    ///
    /// Fails when the series name is already registered with a different
    /// destination label.
    pub fn instrumentation(
        &self,
        component: &'static str,
        kind: SpanKind,
        series: SeriesOpts,
    ) -> Result<Instrumentation> {
        let histogram = self.registry.register_histogram(series)?;
        Ok(Instrumentation {
            component,
            kind,
            tracer: self.tracer.clone(),
            histogram,
        })
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::with_tracer(Arc::new(LogTracer))
    }
}

/// Per-resource-kind descriptor: component name, span kind and histogram
#[derive(Debug, Clone)]
pub struct Instrumentation {
    component: &'static str,
    kind: SpanKind,
    tracer: Arc<dyn Tracer>,
    histogram: HistogramVec,
}

impl Instrumentation {
    pub const fn component(&self) -> &'static str {
        self.component
    }

    pub const fn histogram(&self) -> &HistogramVec {
        &self.histogram
    }

    /// Open the span for one call of `op` against `destination`
    pub fn start(
        &self,
        ctx: &CallContext,
        op: &'static str,
        destination: impl Into<String>,
        extra_tags: Vec<Tag>,
    ) -> Call {
        let name = format!("{}.{op}", self.component);
        let mut span_tags = vec![
            Tag::new(tags::COMPONENT, self.component),
            Tag::new(tags::SPAN_KIND, self.kind.as_str()),
        ];
        span_tags.extend(extra_tags);
        span_tags.push(Tag::new(tags::VERSION, span::VERSION));

        let active = self.tracer.start_span(SpanOptions {
            name: &name,
            component: self.component,
            kind: self.kind,
            parent: ctx.parent(),
            tags: span_tags,
        });

        Call {
            op,
            intent: Cow::Owned(format!("{name} failed")),
            destination: destination.into(),
            tracer: self.tracer.clone(),
            histogram: self.histogram.clone(),
            span: SpanGuard::new(active),
            started: None,
        }
    }
}

/// Reported on the span of a call dropped while its driver future was pending
#[derive(Debug, thiserror::Error)]
#[error("call dropped before the driver returned")]
pub struct Cancelled;

/// One in-flight instrumented call
///
/// Dropping a `Call` before [`Call::run`] finishes its span as cancelled and
/// records no metric. Dropping it while the driver future is pending (a
/// timeout or a losing `select!` branch) observes a failure and errors the
/// span with [`Cancelled`].
#[derive(Debug)]
pub struct Call {
    op: &'static str,
    intent: Cow<'static, str>,
    destination: String,
    tracer: Arc<dyn Tracer>,
    histogram: HistogramVec,
    span: SpanGuard,
    started: Option<Instant>,
}

impl Call {
    /// Message prefix of the wrapped error
    #[must_use]
    pub fn with_intent(mut self, intent: &'static str) -> Self {
        self.intent = Cow::Borrowed(intent);
        self
    }

    pub const fn op(&self) -> &'static str {
        self.op
    }

    /// Context of this call's span
    pub const fn context(&self) -> &TraceContext {
        self.span.context()
    }

    pub fn set_tag(&mut self, tag: Tag) {
        self.span.set_tag(tag);
    }

    /// Write this call's span context into an outgoing carrier.
    ///
    /// A tracer failure is logged and otherwise ignored; the publish goes
    /// ahead without trace metadata.
    pub fn inject(&self, carrier: &mut dyn Injector) {
        if let Err(err) = self.tracer.inject(self.span.context(), carrier) {
            error!(op = self.op, error = %err, "failed to inject tracing headers");
        }
    }

    /// Await the driver future and record its outcome.
    ///
    /// # Errors
    ///
    /// A driver error is returned as [`Error::Call`] with the driver error as
    /// its source.
    pub async fn run<T, E, F>(mut self, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Into<BoxError>,
    {
        self.started = Some(Instant::now());
        let outcome = fut.await;
        self.finish(outcome.map_err(Into::into))
    }

    /// Await a driver future that cannot fail; observed as a success unless
    /// dropped while pending
    pub async fn run_infallible<T, F>(mut self, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        self.started = Some(Instant::now());
        let value = fut.await;
        self.record(None);
        value
    }

    fn finish<T>(mut self, outcome: std::result::Result<T, BoxError>) -> Result<T> {
        match outcome {
            Ok(value) => {
                self.record(None);
                Ok(value)
            }
            Err(source) => {
                self.record(Some(source.as_ref()));
                Err(Error::Call {
                    op: self.op.to_string(),
                    intent: self.intent.clone().into_owned(),
                    source,
                })
            }
        }
    }

    /// Observe and complete the span once; a no-op unless the driver was started
    fn record(&mut self, err: Option<&(dyn std::error::Error + Send + Sync + 'static)>) {
        let Some(started) = self.started.take() else {
            return;
        };
        let seconds = started.elapsed().as_secs_f64();
        let success = err.is_none();
        self.histogram.observe(&self.destination, success, seconds);
        debug!(
            op = self.op,
            destination = %self.destination,
            success = success,
            duration_seconds = seconds,
            "Call completed"
        );
        self.span
            .complete(err.map(|e| e as &(dyn std::error::Error + 'static)));
    }
}

impl Drop for Call {
    fn drop(&mut self) {
        if self.started.is_some() {
            self.span.set_tag(Tag::new(tags::CANCELLED, true));
            self.record(Some(&Cancelled));
        }
    }
}
