//! Traced queue publisher

use std::sync::Arc;

use courier_core::error::{BoxError, Error, Result};
use courier_core::metrics::SeriesOpts;
use courier_core::trace::{SpanKind, Tag, tags};
use courier_core::{CallContext, Instrumentation, Telemetry};
use tracing::debug;

use crate::api::{SendMessageInput, SqsApi};
use crate::carrier::AttributeCarrier;

pub const COMPONENT: &str = "sqs-publisher";
pub const PUBLISH_DURATION_METRIC: &str = "client_sqs_publish_duration_seconds";

const PUBLISH_OP: &str = "publish";
const PUBLISH_INTENT: &str = "failed to publish message";

fn publish_series() -> SeriesOpts {
    SeriesOpts::new(
        "client",
        "sqs",
        "publish_duration_seconds",
        "AWS SQS publish completed by the client.",
        "queue",
    )
}

/// Queue publisher that traces and meters every send.
///
/// The active trace context travels as `String` message attributes so the
/// consumer can continue the trace.
#[derive(Clone)]
pub struct Publisher {
    api: Arc<dyn SqsApi>,
    instrumentation: Instrumentation,
}

impl Publisher {
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `api` is `None`, and a metrics error if
    /// the publish series conflicts with one already registered.
    pub fn new(api: Option<Arc<dyn SqsApi>>, telemetry: &Telemetry) -> Result<Self> {
        let api = api.ok_or_else(|| Error::config("missing api"))?;
        let instrumentation =
            telemetry.instrumentation(COMPONENT, SpanKind::Producer, publish_series())?;
        Ok(Self {
            api,
            instrumentation,
        })
    }

    /// Send one message and return the id assigned by the queue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty queue URL. Driver failures and a
    /// response without a message id are returned as [`Error::Call`]; the
    /// latter carries [`Error::MissingMessageId`] as its source.
    pub async fn publish(&self, ctx: &CallContext, mut input: SendMessageInput) -> Result<String> {
        if input.queue_url.is_empty() {
            return Err(Error::config("queue url is required"));
        }

        let queue = input.queue_url.clone();
        let call = self
            .instrumentation
            .start(
                ctx,
                PUBLISH_OP,
                queue.clone(),
                vec![Tag::new(tags::QUEUE_URL, queue.clone())],
            )
            .with_intent(PUBLISH_INTENT);

        call.inject(&mut AttributeCarrier::new(&mut input));

        let api = &self.api;
        let input = &input;
        let message_id = call
            .run(async move {
                let output = api.send_message(ctx, input).await?;
                output
                    .message_id
                    .ok_or_else(|| BoxError::from(Error::MissingMessageId))
            })
            .await?;

        debug!(queue = %queue, message_id = %message_id, "Message published");
        Ok(message_id)
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("instrumentation", &self.instrumentation)
            .finish_non_exhaustive()
    }
}
