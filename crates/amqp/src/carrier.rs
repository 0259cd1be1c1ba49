//! Header table carrier

use courier_core::trace::{Extractor, Injector};

use crate::types::{FieldTable, FieldValue};

/// Writes trace fields into a header table as string values
#[derive(Debug)]
pub struct HeaderCarrier<'a> {
    headers: &'a mut FieldTable,
}

impl<'a> HeaderCarrier<'a> {
    pub const fn new(headers: &'a mut FieldTable) -> Self {
        Self { headers }
    }
}

impl Injector for HeaderCarrier<'_> {
    fn set(&mut self, key: &str, value: String) {
        self.headers.insert(key.to_string(), FieldValue::Str(value));
    }
}

impl Extractor for HeaderCarrier<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(FieldValue::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        self.headers.keys().map(String::as_str).collect()
    }
}
