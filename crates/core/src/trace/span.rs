//! Span handles and their lifecycle
//!
//! [`ActiveSpan`] is the tracer-side handle. [`SpanGuard`] wraps one and
//! guarantees it is finished exactly once: [`SpanGuard::complete`] consumes
//! the guard, and dropping an uncompleted guard finishes the span as
//! cancelled.

use std::borrow::Cow;
use std::fmt;

use crate::trace::trace_context::TraceContext;

/// Standard tag keys
pub mod tags {
    pub const COMPONENT: &str = "component";
    pub const SPAN_KIND: &str = "span.kind";
    pub const VERSION: &str = "version";
    pub const ERROR: &str = "error";
    pub const ERROR_MESSAGE: &str = "error.message";
    pub const CANCELLED: &str = "cancelled";
    pub const DB_TYPE: &str = "db.type";
    pub const DB_INSTANCE: &str = "db.instance";
    pub const DB_USER: &str = "db.user";
    pub const DB_STATEMENT: &str = "db.statement";
    pub const QUEUE_URL: &str = "queue.url";
    pub const EXCHANGE: &str = "exchange";
}

/// Version stamped on every span produced by this layer
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Role of the span in the exchange with the remote system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    /// Request/response call whose result the caller waits for
    Client,
    /// Fire-and-forget message publish
    Producer,
}

impl SpanKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Producer => "producer",
        }
    }
}

impl fmt::Display for SpanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag value
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Str(Cow<'static, str>),
    Bool(bool),
    I64(i64),
    F64(f64),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::I64(i) => write!(f, "{i}"),
            Self::F64(v) => write!(f, "{v}"),
        }
    }
}

impl From<&'static str> for TagValue {
    fn from(value: &'static str) -> Self {
        Self::Str(Cow::Borrowed(value))
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        Self::Str(Cow::Owned(value))
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        Self::F64(value)
    }
}

/// A single key/value span tag
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub key: Cow<'static, str>,
    pub value: TagValue,
}

impl Tag {
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<TagValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Everything a tracer needs to start a span
#[derive(Debug, Clone)]
pub struct SpanOptions<'a> {
    pub name: &'a str,
    pub component: &'a str,
    pub kind: SpanKind,
    /// Parent found in the caller's context; `None` starts a root span
    pub parent: Option<&'a TraceContext>,
    pub tags: Vec<Tag>,
}

/// Tracer-side handle for one in-flight span
pub trait ActiveSpan: Send {
    /// Context identifying this span, used for injection and child spans
    fn context(&self) -> &TraceContext;

    fn set_tag(&mut self, tag: Tag);

    /// Finalize the span. Called exactly once by [`SpanGuard`].
    fn finish(self: Box<Self>);
}

/// Owns an [`ActiveSpan`] and finishes it exactly once
pub struct SpanGuard {
    context: TraceContext,
    span: Option<Box<dyn ActiveSpan>>,
}

impl SpanGuard {
    pub fn new(span: Box<dyn ActiveSpan>) -> Self {
        Self {
            context: span.context().clone(),
            span: Some(span),
        }
    }

    /// Context of the guarded span
    pub const fn context(&self) -> &TraceContext {
        &self.context
    }

    pub fn set_tag(&mut self, tag: Tag) {
        if let Some(span) = self.span.as_mut() {
            span.set_tag(tag);
        }
    }

    /// Tag the span with the outcome and finish it. Later calls are no-ops.
    pub fn complete(&mut self, error: Option<&(dyn std::error::Error + 'static)>) {
        if let Some(mut span) = self.span.take() {
            if let Some(err) = error {
                span.set_tag(Tag::new(tags::ERROR, true));
                span.set_tag(Tag::new(tags::ERROR_MESSAGE, err.to_string()));
            }
            span.finish();
        }
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        // Reached when the owning future is dropped before the call completes
        if let Some(mut span) = self.span.take() {
            span.set_tag(Tag::new(tags::CANCELLED, true));
            span.finish();
        }
    }
}

impl fmt::Debug for SpanGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanGuard")
            .field("context", &self.context.to_string())
            .finish()
    }
}
