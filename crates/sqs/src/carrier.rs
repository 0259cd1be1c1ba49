//! Message attribute carrier

use std::collections::HashMap;

use courier_core::trace::{Extractor, Injector};

use crate::api::{MessageAttributeValue, STRING_DATA_TYPE, SendMessageInput};

/// Writes trace fields into a message's attributes as `String` values
#[derive(Debug)]
pub struct AttributeCarrier<'a> {
    attributes: &'a mut HashMap<String, MessageAttributeValue>,
}

impl<'a> AttributeCarrier<'a> {
    /// Bind to `input`'s attributes, creating the map if absent
    pub fn new(input: &'a mut SendMessageInput) -> Self {
        Self {
            attributes: input.message_attributes.get_or_insert_with(HashMap::new),
        }
    }
}

impl Injector for AttributeCarrier<'_> {
    fn set(&mut self, key: &str, value: String) {
        self.attributes
            .insert(key.to_string(), MessageAttributeValue::string(value));
    }
}

impl Extractor for AttributeCarrier<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .filter(|attr| attr.data_type == STRING_DATA_TYPE)
            .and_then(|attr| attr.string_value.as_deref())
    }

    fn keys(&self) -> Vec<&str> {
        self.attributes.keys().map(String::as_str).collect()
    }
}
