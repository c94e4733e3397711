//! Flat key/value persistence record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// A single persisted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordValue {
    Bool(bool),
    Int(i64),
}

/// A flat record of named integers and booleans.
///
/// This is the only persistence shape the core needs; hosts decide how the
/// record is framed on disk. It serializes as a plain JSON-style object.
///
/// # Examples
///
/// ```
/// use evoseq::clock::Record;
///
/// let mut record = Record::new();
/// record.set_int("clockLength", 480);
/// record.set_bool("clockHigh", true);
///
/// assert_eq!(record.int("clockLength"), Ok(480));
/// assert_eq!(record.bool("clockHigh"), Ok(true));
/// assert!(record.int("clockHigh").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    entries: BTreeMap<String, RecordValue>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an integer under `key`.
    pub fn set_int(&mut self, key: &str, value: i64) {
        self.entries.insert(key.to_string(), RecordValue::Int(value));
    }

    /// Stores a boolean under `key`.
    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.entries.insert(key.to_string(), RecordValue::Bool(value));
    }

    /// Reads an integer.
    pub fn int(&self, key: &'static str) -> Result<i64, RecordError> {
        match self.entries.get(key) {
            Some(RecordValue::Int(value)) => Ok(*value),
            Some(RecordValue::Bool(_)) => Err(RecordError::Kind(key)),
            None => Err(RecordError::Missing(key)),
        }
    }

    /// Reads a boolean.
    pub fn bool(&self, key: &'static str) -> Result<bool, RecordError> {
        match self.entries.get(key) {
            Some(RecordValue::Bool(value)) => Ok(*value),
            Some(RecordValue::Int(_)) => Err(RecordError::Kind(key)),
            None => Err(RecordError::Missing(key)),
        }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the record holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, RecordValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), *value))
    }
}
