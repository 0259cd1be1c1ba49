//! Broker client as seen by the publisher

use async_trait::async_trait;
use courier_core::{BoxError, CallContext};

use crate::config::AmqpConfig;
use crate::types::Publishing;

/// Opens broker connections
#[async_trait]
pub trait Connector: Send + Sync {
    /// Dial `url`, with tuning options when `config` is given
    async fn dial(
        &self,
        url: &str,
        config: Option<AmqpConfig>,
    ) -> Result<Box<dyn AmqpConnection>, BoxError>;
}

#[async_trait]
pub trait AmqpConnection: Send + Sync {
    async fn channel(&self) -> Result<Box<dyn AmqpChannel>, BoxError>;

    async fn close(&self) -> Result<(), BoxError>;
}

#[async_trait]
pub trait AmqpChannel: Send + Sync {
    async fn publish(
        &self,
        ctx: &CallContext,
        exchange: &str,
        key: &str,
        mandatory: bool,
        immediate: bool,
        msg: Publishing,
    ) -> Result<(), BoxError>;

    async fn close(&self) -> Result<(), BoxError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use mockall::mock;

    mock! {
        pub Connector {}

        #[async_trait]
        impl Connector for Connector {
            async fn dial(
                &self,
                url: &str,
                config: Option<AmqpConfig>,
            ) -> Result<Box<dyn AmqpConnection>, BoxError>;
        }
    }

    mock! {
        pub AmqpConnection {}

        #[async_trait]
        impl AmqpConnection for AmqpConnection {
            async fn channel(&self) -> Result<Box<dyn AmqpChannel>, BoxError>;
            async fn close(&self) -> Result<(), BoxError>;
        }
    }

    mock! {
        pub AmqpChannel {}

        #[async_trait]
        impl AmqpChannel for AmqpChannel {
            async fn publish(
                &self,
                ctx: &CallContext,
                exchange: &str,
                key: &str,
                mandatory: bool,
                immediate: bool,
                msg: Publishing,
            ) -> Result<(), BoxError>;
            async fn close(&self) -> Result<(), BoxError>;
        }
    }
}
