//! Test doubles for span assertions

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::trace::{
    ActiveSpan, Injector, PropagationError, SpanKind, SpanOptions, Tag, TagValue, TraceContext,
    Tracer, inject_w3c, tags,
};

/// A span as it was when finished
#[derive(Debug, Clone)]
pub struct FinishedSpan {
    pub name: String,
    pub component: String,
    pub kind: SpanKind,
    pub context: TraceContext,
    pub parent: Option<TraceContext>,
    pub tags: Vec<Tag>,
}

impl FinishedSpan {
    /// Last value written for `key`
    pub fn tag(&self, key: &str) -> Option<&TagValue> {
        self.tags.iter().rev().find(|t| t.key == key).map(|t| &t.value)
    }

    pub fn is_error(&self) -> bool {
        self.tag(tags::ERROR) == Some(&TagValue::Bool(true))
    }
}

#[derive(Debug, Default)]
struct Inner {
    finished: Mutex<Vec<FinishedSpan>>,
    fail_inject: AtomicBool,
}

/// Tracer that keeps every finished span in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingTracer {
    inner: Arc<Inner>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `inject` call fail
    pub fn fail_injection(&self, fail: bool) {
        self.inner.fail_inject.store(fail, Ordering::SeqCst);
    }

    pub fn finished(&self) -> Vec<FinishedSpan> {
        self.inner
            .finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The only finished span.
    ///
    /// # Panics
    ///
    /// Panics unless exactly one span has finished.
    pub fn single(&self) -> FinishedSpan {
        let mut finished = self.finished();
        assert_eq!(finished.len(), 1, "expected exactly one finished span");
        finished.remove(0)
    }
}

impl Tracer for RecordingTracer {
    fn start_span(&self, options: SpanOptions<'_>) -> Box<dyn ActiveSpan> {
        Box::new(RecordingSpan {
            span: FinishedSpan {
                name: options.name.to_string(),
                component: options.component.to_string(),
                kind: options.kind,
                context: options
                    .parent
                    .map_or_else(TraceContext::new, TraceContext::child),
                parent: options.parent.cloned(),
                tags: options.tags,
            },
            inner: self.inner.clone(),
        })
    }

    fn inject(
        &self,
        context: &TraceContext,
        carrier: &mut dyn Injector,
    ) -> Result<(), PropagationError> {
        if self.inner.fail_inject.load(Ordering::SeqCst) {
            return Err(PropagationError::new("injection disabled"));
        }
        inject_w3c(context, carrier);
        Ok(())
    }
}

struct RecordingSpan {
    span: FinishedSpan,
    inner: Arc<Inner>,
}

impl ActiveSpan for RecordingSpan {
    fn context(&self) -> &TraceContext {
        &self.span.context
    }

    fn set_tag(&mut self, tag: Tag) {
        self.span.tags.push(tag);
    }

    fn finish(self: Box<Self>) {
        self.inner
            .finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(self.span);
    }
}
