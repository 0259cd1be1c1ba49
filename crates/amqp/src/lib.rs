//! Instrumented AMQP publisher
//!
//! Wraps a broker [`Connector`] so each publish opens a producer span,
//! stamps the trace context and an `X-Correlation-Id` into the message
//! headers and records `client_amqp_publish_duration_seconds{exchange, success}`.

pub mod carrier;
pub mod client;
pub mod config;
pub mod publisher;
pub mod types;

pub use self::config::AmqpConfig;
pub use carrier::HeaderCarrier;
pub use client::{AmqpChannel, AmqpConnection, Connector};
pub use publisher::{PUBLISH_DURATION_METRIC, Publisher, PublisherBuilder};
pub use types::{FieldTable, FieldValue, Publishing};
