//! Message types

use std::collections::HashMap;

/// Header table
pub type FieldTable = HashMap<String, FieldValue>;

/// A header value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Void,
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    Table(FieldTable),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Outgoing message with its basic properties
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Publishing {
    pub headers: Option<FieldTable>,
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    /// 1 transient, 2 persistent
    pub delivery_mode: Option<u8>,
    pub priority: Option<u8>,
    pub correlation_id: Option<String>,
    pub reply_to: Option<String>,
    pub expiration: Option<String>,
    pub message_id: Option<String>,
    /// Seconds since the Unix epoch
    pub timestamp: Option<u64>,
    pub kind: Option<String>,
    pub app_id: Option<String>,
    pub body: Vec<u8>,
}

impl Publishing {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.headers
            .get_or_insert_with(FieldTable::new)
            .insert(key.into(), value);
        self
    }
}
