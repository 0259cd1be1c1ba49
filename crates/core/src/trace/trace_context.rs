//! `traceparent` / `tracestate` context
//!
//! The text-map format written by the default tracer:
//! `00-<32 hex trace id>-<16 hex span id>-<2 hex flags>`.
//! See <https://www.w3.org/TR/trace-context/>.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use thiserror::Error;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";

const SUPPORTED_VERSION: &str = "00";
const SAMPLED: u8 = 0x01;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceContextError {
    #[error("traceparent must have four dash-separated fields")]
    FieldCount,
    #[error("unsupported traceparent version {0:?}")]
    UnsupportedVersion(String),
    #[error("malformed trace id")]
    TraceId,
    #[error("malformed span id")]
    SpanId,
    #[error("malformed trace flags")]
    Flags,
}

/// Position of one span in one trace
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TraceContext {
    trace_id: [u8; 16],
    span_id: [u8; 8],
    flags: u8,
    trace_state: Option<String>,
}

impl TraceContext {
    /// Fresh sampled root
    pub fn new() -> Self {
        Self {
            trace_id: random_id(),
            span_id: random_id(),
            flags: SAMPLED,
            trace_state: None,
        }
    }

    pub const fn trace_id(&self) -> &[u8; 16] {
        &self.trace_id
    }

    pub const fn span_id(&self) -> &[u8; 8] {
        &self.span_id
    }

    pub fn trace_id_hex(&self) -> String {
        hex::encode(self.trace_id)
    }

    pub fn span_id_hex(&self) -> String {
        hex::encode(self.span_id)
    }

    pub fn trace_state(&self) -> Option<&str> {
        self.trace_state.as_deref()
    }

    /// Attach vendor `tracestate`; an empty value clears it
    #[must_use]
    pub fn with_trace_state(mut self, state: impl Into<String>) -> Self {
        self.trace_state = Some(state.into()).filter(|s| !s.is_empty());
        self
    }

    pub const fn is_sampled(&self) -> bool {
        self.flags & SAMPLED == SAMPLED
    }

    pub fn set_sampled(&mut self, sampled: bool) {
        self.flags = if sampled {
            self.flags | SAMPLED
        } else {
            self.flags & !SAMPLED
        };
    }

    /// Same trace, flags and state under a new span id
    #[must_use]
    pub fn child(&self) -> Self {
        let span_id = std::iter::repeat_with(random_id)
            .find(|id| id != &self.span_id)
            .unwrap_or_default();
        Self {
            span_id,
            ..self.clone()
        }
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Random id that is never all zeroes
fn random_id<const N: usize>() -> [u8; N] {
    let mut rng = rand::thread_rng();
    let mut id = [0u8; N];
    while id.iter().all(|&b| b == 0) {
        rng.fill(&mut id[..]);
    }
    id
}

fn parse_id<const N: usize>(field: &str) -> Option<[u8; N]> {
    let mut id = [0u8; N];
    hex::decode_to_slice(field, &mut id).ok()?;
    id.iter().any(|&b| b != 0).then_some(id)
}

impl fmt::Display for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SUPPORTED_VERSION}-{}-{}-{:02x}",
            self.trace_id_hex(),
            self.span_id_hex(),
            self.flags
        )
    }
}

impl FromStr for TraceContext {
    type Err = TraceContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.trim().split('-');
        let (Some(version), Some(trace_id), Some(span_id), Some(flags), None) = (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) else {
            return Err(TraceContextError::FieldCount);
        };

        if version != SUPPORTED_VERSION {
            return Err(TraceContextError::UnsupportedVersion(version.to_string()));
        }
        let trace_id = parse_id(trace_id).ok_or(TraceContextError::TraceId)?;
        let span_id = parse_id(span_id).ok_or(TraceContextError::SpanId)?;
        let flags = match hex::decode(flags).as_deref() {
            Ok([flags]) => *flags,
            _ => return Err(TraceContextError::Flags),
        };

        Ok(Self {
            trace_id,
            span_id,
            flags,
            trace_state: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01";

    #[test]
    fn test_roots_are_distinct_and_sampled() {
        let a = TraceContext::new();
        let b = TraceContext::new();
        assert_ne!(a.trace_id(), b.trace_id());
        assert!(a.is_sampled());
    }

    #[test]
    fn test_header_value_round_trip() {
        let ctx: TraceContext = SAMPLE.parse().unwrap();
        assert_eq!(ctx.trace_id_hex(), "0af7651916cd43dd8448eb211c80319c");
        assert_eq!(ctx.span_id_hex(), "b7ad6b7169203331");
        assert_eq!(ctx.to_string(), SAMPLE);
    }

    #[test]
    fn test_rejects_malformed_values() {
        let cases = [
            ("00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331", TraceContextError::FieldCount),
            (
                "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01-extra",
                TraceContextError::FieldCount,
            ),
            (
                "01-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01",
                TraceContextError::UnsupportedVersion("01".to_string()),
            ),
            ("00-0af7651916cd43dd-b7ad6b7169203331-01", TraceContextError::TraceId),
            (
                "00-00000000000000000000000000000000-b7ad6b7169203331-01",
                TraceContextError::TraceId,
            ),
            (
                "00-0af7651916cd43dd8448eb211c80319c-0000000000000000-01",
                TraceContextError::SpanId,
            ),
            ("00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-1", TraceContextError::Flags),
            ("00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-xy", TraceContextError::Flags),
        ];
        for (value, expected) in cases {
            assert_eq!(value.parse::<TraceContext>(), Err(expected), "{value}");
        }
    }

    #[test]
    fn test_child_keeps_trace_and_state() {
        let parent = TraceContext::new().with_trace_state("congo=t61rcWkgMzE");
        let child = parent.child();

        assert_eq!(child.trace_id(), parent.trace_id());
        assert_ne!(child.span_id(), parent.span_id());
        assert_eq!(child.trace_state(), Some("congo=t61rcWkgMzE"));
    }

    #[test]
    fn test_sampling_flag() {
        let mut ctx = TraceContext::new();
        ctx.set_sampled(false);
        let parsed: TraceContext = ctx.to_string().parse().unwrap();
        assert!(!parsed.is_sampled());
        assert!(TraceContext::new().with_trace_state("").trace_state().is_none());
    }
}
