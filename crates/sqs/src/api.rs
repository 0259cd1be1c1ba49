//! The queue service client as seen by the publisher

use std::collections::HashMap;

use async_trait::async_trait;
use courier_core::{BoxError, CallContext};
use serde::{Deserialize, Serialize};

/// Data type of attributes holding a plain string
pub const STRING_DATA_TYPE: &str = "String";

/// One typed message attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageAttributeValue {
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_value: Option<Vec<u8>>,
}

impl MessageAttributeValue {
    /// `String`-typed attribute
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            data_type: STRING_DATA_TYPE.to_string(),
            string_value: Some(value.into()),
            binary_value: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendMessageInput {
    pub queue_url: String,
    pub message_body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_attributes: Option<HashMap<String, MessageAttributeValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_deduplication_id: Option<String>,
}

impl SendMessageInput {
    pub fn new(queue_url: impl Into<String>, message_body: impl Into<String>) -> Self {
        Self {
            queue_url: queue_url.into(),
            message_body: message_body.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: MessageAttributeValue) -> Self {
        self.message_attributes
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendMessageOutput {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default, rename = "MD5OfMessageBody")]
    pub md5_of_message_body: Option<String>,
    #[serde(default)]
    pub sequence_number: Option<String>,
}

/// Queue service client
#[async_trait]
pub trait SqsApi: Send + Sync {
    async fn send_message(
        &self,
        ctx: &CallContext,
        input: &SendMessageInput,
    ) -> Result<SendMessageOutput, BoxError>;
}
