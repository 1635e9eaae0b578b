use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use crate::common::KeyValue;
use crate::metrics::MetricAttribute;

/// The client and monitored-resource attributes attached to every measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClientAttribute {
    Project,
    Instance,
    InstanceConfig,
    Location,
    ClientHash,
    ClientUid,
    ClientName,
    Database,
}

impl ClientAttribute {
    pub const ALL: [ClientAttribute; 8] = [
        ClientAttribute::Project,
        ClientAttribute::Instance,
        ClientAttribute::InstanceConfig,
        ClientAttribute::Location,
        ClientAttribute::ClientHash,
        ClientAttribute::ClientUid,
        ClientAttribute::ClientName,
        ClientAttribute::Database,
    ];

    /// The metric attribute key.
    pub fn key(&self) -> &'static str {
        match self {
            ClientAttribute::Project => MetricAttribute::PROJECT_ID,
            ClientAttribute::Instance => MetricAttribute::INSTANCE_ID,
            ClientAttribute::InstanceConfig => MetricAttribute::INSTANCE_CONFIG,
            ClientAttribute::Location => MetricAttribute::LOCATION,
            ClientAttribute::ClientHash => MetricAttribute::CLIENT_HASH,
            ClientAttribute::ClientUid => MetricAttribute::CLIENT_UID,
            ClientAttribute::ClientName => MetricAttribute::CLIENT_NAME,
            ClientAttribute::Database => MetricAttribute::DATABASE,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.key() == key)
    }
}

impl fmt::Display for ClientAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A last-write-wins mapping of client attributes.
/// Unset attributes are absent rather than empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientAttributes {
    values: BTreeMap<ClientAttribute, String>,
}

impl ClientAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, attribute: ClientAttribute, value: impl Into<String>) {
        self.values.insert(attribute, value.into());
    }

    pub fn get(&self, attribute: ClientAttribute) -> Option<&str> {
        self.values.get(&attribute).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClientAttribute, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Returns the attributes as metric key-value pairs, in key order.
    pub fn key_values(&self) -> Vec<KeyValue> {
        self.values
            .iter()
            .map(|(k, v)| (k.key(), Cow::Owned(v.clone())))
            .collect()
    }
}

impl<V: Into<String>> FromIterator<(ClientAttribute, V)> for ClientAttributes {
    fn from_iter<I: IntoIterator<Item = (ClientAttribute, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (k, v) in iter {
            attributes.set(k, v);
        }
        attributes
    }
}
