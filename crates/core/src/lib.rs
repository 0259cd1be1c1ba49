//! Courier core: span lifecycle, trace propagation and metric series shared
//! by the instrumented queue, SQL and AMQP clients.

pub mod config;
pub mod context;
pub mod error;
pub mod init;
pub mod instrument;
pub mod metrics;
#[cfg(feature = "testing")]
pub mod testing;
pub mod trace;

pub use self::config::{InstrumentationConfig, LogFormat};
pub use context::CallContext;
pub use error::{BoxError, Error, Result, aggregate};
pub use instrument::{Call, Cancelled, Instrumentation, Telemetry};
pub use metrics::{HistogramVec, MetricsError, MetricsRegistry, SeriesOpts};
pub use trace::{CorrelationId, Injector, SpanKind, Tag, TraceContext, Tracer};
