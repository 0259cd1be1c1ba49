//! Per-call context
//!
//! [`CallContext`] is passed by reference into every facade method and
//! forwarded untouched to the driver. The instrumentation layer only reads
//! the parent trace context and the correlation ID from it.

use tokio_util::sync::CancellationToken;

use crate::trace::{
    CORRELATION_ID_HEADER, CorrelationId, Extractor, TraceContext, extract_trace_context,
};

#[derive(Debug, Clone, Default)]
pub struct CallContext {
    parent: Option<TraceContext>,
    correlation_id: Option<CorrelationId>,
    cancellation: CancellationToken,
}

impl CallContext {
    /// Root context: no parent span, no correlation ID
    pub fn new() -> Self {
        Self::default()
    }

    /// Context continuing the trace and correlation ID found in an inbound
    /// carrier, if any
    pub fn from_carrier(carrier: &dyn Extractor) -> Self {
        Self {
            parent: extract_trace_context(carrier),
            correlation_id: carrier
                .get(CORRELATION_ID_HEADER)
                .map(CorrelationId::from_string),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: TraceContext) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn with_correlation_id(mut self, id: CorrelationId) -> Self {
        self.correlation_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub const fn parent(&self) -> Option<&TraceContext> {
        self.parent.as_ref()
    }

    pub const fn correlation_id(&self) -> Option<&CorrelationId> {
        self.correlation_id.as_ref()
    }

    /// Token drivers may observe to abort in-flight work
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TRACEPARENT_HEADER;
    use std::collections::HashMap;

    #[test]
    fn test_default_is_root() {
        let ctx = CallContext::new();
        assert!(ctx.parent().is_none());
        assert!(ctx.correlation_id().is_none());
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn test_from_carrier() {
        let parent = TraceContext::new();
        let mut carrier = HashMap::new();
        carrier.insert(TRACEPARENT_HEADER.to_string(), parent.to_string());
        carrier.insert(CORRELATION_ID_HEADER.to_string(), "req-42".to_string());

        let ctx = CallContext::from_carrier(&carrier);
        assert_eq!(ctx.parent(), Some(&parent));
        assert_eq!(ctx.correlation_id().map(CorrelationId::as_str), Some("req-42"));

        let empty: HashMap<String, String> = HashMap::new();
        assert!(CallContext::from_carrier(&empty).parent().is_none());
    }

    #[test]
    fn test_clones_share_cancellation() {
        let token = CancellationToken::new();
        let ctx = CallContext::new().with_cancellation(token.clone());
        let cloned = ctx.clone();

        token.cancel();
        assert!(cloned.is_cancelled());
    }
}
