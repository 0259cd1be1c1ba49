//! Instrumented SQS publisher
//!
//! Wraps an [`SqsApi`] client so each publish opens a producer span, carries
//! the trace context in the message attributes and records
//! `client_sqs_publish_duration_seconds{queue, success}`.

pub mod api;
pub mod carrier;
pub mod publisher;

pub use api::{MessageAttributeValue, SendMessageInput, SendMessageOutput, SqsApi};
pub use carrier::AttributeCarrier;
pub use publisher::{PUBLISH_DURATION_METRIC, Publisher};
