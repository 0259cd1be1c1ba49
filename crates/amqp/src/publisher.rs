//! Traced AMQP publisher

use courier_core::error::{Error, Result};
use courier_core::metrics::SeriesOpts;
use courier_core::trace::{CORRELATION_ID_HEADER, SpanKind, Tag, tags};
use courier_core::{CallContext, Instrumentation, Telemetry};
use tracing::{debug, info};

use crate::carrier::HeaderCarrier;
use crate::client::{AmqpChannel, AmqpConnection, Connector};
use crate::config::AmqpConfig;
use crate::types::{FieldTable, FieldValue, Publishing};

pub const COMPONENT: &str = "amqp-publisher";
pub const PUBLISH_DURATION_METRIC: &str = "client_amqp_publish_duration_seconds";

const PUBLISH_OP: &str = "publish";
const PUBLISH_INTENT: &str = "failed to publish message";

fn publish_series() -> SeriesOpts {
    SeriesOpts::new(
        "client",
        "amqp",
        "publish_duration_seconds",
        "AMQP publish completed by the client.",
        "exchange",
    )
}

/// Builder for [`Publisher`]
#[derive(Debug, Clone)]
pub struct PublisherBuilder {
    url: String,
    config: Option<AmqpConfig>,
}

impl PublisherBuilder {
    /// Dial with explicit tuning instead of the connector's defaults
    #[must_use]
    pub fn with_config(mut self, config: AmqpConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Open the connection and a channel on it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty URL. Dial and channel failures
    /// are wrapped as [`Error::Call`]; if closing the connection after a
    /// channel failure also fails, both are returned as [`Error::Aggregate`].
    pub async fn connect(self, connector: &dyn Connector, telemetry: &Telemetry) -> Result<Publisher> {
        if self.url.is_empty() {
            return Err(Error::config("url is required"));
        }

        let instrumentation =
            telemetry.instrumentation(COMPONENT, SpanKind::Producer, publish_series())?;

        let connection = connector
            .dial(&self.url, self.config)
            .await
            .map_err(|e| Error::call("dial", "failed to open connection", e))?;

        let channel = match connection.channel().await {
            Ok(channel) => channel,
            Err(e) => {
                let open_err = Error::call("channel", "failed to open channel", e);
                return Err(match connection.close().await {
                    Ok(()) => open_err,
                    Err(close) => Error::Aggregate(vec![
                        open_err,
                        Error::call("close", "failed to close connection", close),
                    ]),
                });
            }
        };

        info!(component = COMPONENT, "Connected to broker");
        Ok(Publisher {
            connection,
            channel,
            instrumentation,
        })
    }
}

/// Publisher holding one connection and one channel.
///
/// Each publish opens a producer span tagged with the exchange, writes the
/// trace context and a correlation id into the message headers and records
/// `client_amqp_publish_duration_seconds{exchange, success}`.
pub struct Publisher {
    connection: Box<dyn AmqpConnection>,
    channel: Box<dyn AmqpChannel>,
    instrumentation: Instrumentation,
}

impl Publisher {
    pub fn builder(url: impl Into<String>) -> PublisherBuilder {
        PublisherBuilder {
            url: url.into(),
            config: None,
        }
    }

    /// Publish `msg` to `exchange` with routing `key`.
    ///
    /// The correlation id header comes from `ctx`, or is freshly generated
    /// when the caller has none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Call`] wrapping the channel's error.
    pub async fn publish(
        &self,
        ctx: &CallContext,
        exchange: &str,
        key: &str,
        mandatory: bool,
        immediate: bool,
        mut msg: Publishing,
    ) -> Result<()> {
        let call = self
            .instrumentation
            .start(
                ctx,
                PUBLISH_OP,
                exchange,
                vec![Tag::new(tags::EXCHANGE, exchange.to_string())],
            )
            .with_intent(PUBLISH_INTENT);

        let headers = msg.headers.get_or_insert_with(FieldTable::new);
        call.inject(&mut HeaderCarrier::new(headers));
        let correlation_id = ctx.correlation_id().cloned().unwrap_or_default();
        headers.insert(
            CORRELATION_ID_HEADER.to_string(),
            FieldValue::Str(correlation_id.to_string()),
        );

        call.run(
            self.channel
                .publish(ctx, exchange, key, mandatory, immediate, msg),
        )
        .await?;

        debug!(exchange = %exchange, key = %key, correlation_id = %correlation_id, "Message published");
        Ok(())
    }

    /// Close the channel, then the connection.
    ///
    /// Unlike the SQL `close` methods this opens no span and records no
    /// metric: the publish series is keyed by exchange and a close has none.
    ///
    /// # Errors
    ///
    /// Every failed close is reported; two failures come back as
    /// [`Error::Aggregate`].
    pub async fn close(self) -> Result<()> {
        let mut errors = Vec::new();
        if let Err(e) = self.channel.close().await {
            errors.push(Error::call("close", "failed to close channel", e));
        }
        if let Err(e) = self.connection.close().await {
            errors.push(Error::call("close", "failed to close connection", e));
        }
        courier_core::aggregate(errors)
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("instrumentation", &self.instrumentation)
            .finish_non_exhaustive()
    }
}
