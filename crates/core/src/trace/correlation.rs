//! Application-level request id
//!
//! Travels next to the trace context but is independent of it. The AMQP
//! publisher stamps it into [`CORRELATION_ID_HEADER`] so consumers can tie
//! their logs to the producer's.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use uuid::Uuid;

pub const CORRELATION_ID_HEADER: &str = "X-Correlation-Id";

/// Cheaply cloned request id
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Random UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string().into())
    }

    /// Adopt an upstream id; blank input falls back to [`CorrelationId::new`]
    pub fn from_string(s: &str) -> Self {
        match s.trim() {
            "" => Self::new(),
            id => Self(id.into()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrelationId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_string(s))
    }
}
