//! Text-map carriers
//!
//! A carrier adapts a protocol's native metadata (message attributes, header
//! tables) to the flat string-keyed form the tracer serializes into. Client
//! crates implement [`Injector`] over their own message types; the map
//! implementations here cover generic use and tests.

use std::collections::{BTreeMap, HashMap};

/// Write side of a text-map carrier.
///
/// Insertion cannot fail. An implementation that cannot represent a key or
/// value should drop it silently.
pub trait Injector {
    /// Set `key` to `value`, replacing any previous value for `key`.
    fn set(&mut self, key: &str, value: String);
}

/// Read side of a text-map carrier.
pub trait Extractor {
    /// Value for `key`, if present.
    fn get(&self, key: &str) -> Option<&str>;

    /// All keys present in the carrier.
    fn keys(&self) -> Vec<&str>;
}

impl<S: std::hash::BuildHasher> Injector for HashMap<String, String, S> {
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_string(), value);
    }
}

impl<S: std::hash::BuildHasher> Extractor for HashMap<String, String, S> {
    fn get(&self, key: &str) -> Option<&str> {
        Self::get(self, key).map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        Self::keys(self).map(String::as_str).collect()
    }
}

impl Injector for BTreeMap<String, String> {
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_string(), value);
    }
}

impl Extractor for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        Self::get(self, key).map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        Self::keys(self).map(String::as_str).collect()
    }
}
