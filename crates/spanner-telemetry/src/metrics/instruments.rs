use std::borrow::Cow;
use std::sync::Arc;

use log::debug;
use opentelemetry::{metrics, StringValue};

use crate::common::KeyValue;
use crate::metrics::InstrumentDescriptor;

/// An instrument that accepts measurements of type `T`.
pub trait Measure<T> {
    /// The attribute keys accepted by the instrument.
    fn keys(&self) -> &[&'static str];

    fn measure(&self, value: T, attributes: &[opentelemetry::KeyValue]);
}

/// A monotonic counter with a fixed set of accepted attribute keys.
#[derive(Clone)]
pub struct Counter<T> {
    descriptor: InstrumentDescriptor,
    inner: metrics::Counter<T>,
    keys: Arc<[&'static str]>,
}

impl<T> Counter<T> {
    pub fn new(
        descriptor: InstrumentDescriptor,
        inner: metrics::Counter<T>,
        keys: Arc<[&'static str]>,
    ) -> Self {
        Self {
            descriptor,
            inner,
            keys,
        }
    }

    pub fn descriptor(&self) -> &InstrumentDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(self.descriptor.name)
    }

    pub fn recorder(&self, value: T) -> Recorder<'_, Self, T> {
        Recorder::new(self, value)
    }
}

impl<T> Measure<T> for Counter<T> {
    fn keys(&self) -> &[&'static str] {
        &self.keys
    }

    fn measure(&self, value: T, attributes: &[opentelemetry::KeyValue]) {
        self.inner.add(value, attributes);
    }
}

/// A histogram with a fixed set of accepted attribute keys.
#[derive(Clone)]
pub struct Histogram<T> {
    descriptor: InstrumentDescriptor,
    inner: metrics::Histogram<T>,
    keys: Arc<[&'static str]>,
}

impl<T> Histogram<T> {
    pub fn new(
        descriptor: InstrumentDescriptor,
        inner: metrics::Histogram<T>,
        keys: Arc<[&'static str]>,
    ) -> Self {
        Self {
            descriptor,
            inner,
            keys,
        }
    }

    pub fn descriptor(&self) -> &InstrumentDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(self.descriptor.name)
    }

    pub fn recorder(&self, value: T) -> Recorder<'_, Self, T> {
        Recorder::new(self, value)
    }
}

impl<T> Measure<T> for Histogram<T> {
    fn keys(&self) -> &[&'static str] {
        &self.keys
    }

    fn measure(&self, value: T, attributes: &[opentelemetry::KeyValue]) {
        self.inner.record(value, attributes);
    }
}

/// A builder for a single measurement.
/// Attributes whose keys are not accepted by the instrument are dropped on [`Recorder::emit`].
#[must_use]
pub struct Recorder<'a, I, T> {
    instrument: &'a I,
    value: T,
    attributes: Vec<KeyValue>,
}

impl<'a, I, T> Recorder<'a, I, T>
where
    I: Measure<T>,
{
    fn new(instrument: &'a I, value: T) -> Self {
        Self {
            instrument,
            value,
            attributes: vec![],
        }
    }

    pub fn with_attribute(mut self, key: &'static str, value: impl Into<Cow<'static, str>>) -> Self {
        self.attributes.push((key, value.into()));
        self
    }

    pub fn with_optional_attribute(
        self,
        key: &'static str,
        value: Option<impl Into<Cow<'static, str>>>,
    ) -> Self {
        match value {
            Some(value) => self.with_attribute(key, value),
            None => self,
        }
    }

    pub fn with_attributes(mut self, attributes: &[KeyValue]) -> Self {
        self.attributes.extend_from_slice(attributes);
        self
    }

    pub fn emit(self) {
        let keys = self.instrument.keys();
        let attributes = self
            .attributes
            .into_iter()
            .filter_map(|(key, value)| {
                if keys.contains(&key) {
                    Some(opentelemetry::KeyValue::new(key, StringValue::from(value)))
                } else {
                    debug!("dropping metric attribute not accepted by the instrument: {key}");
                    None
                }
            })
            .collect::<Vec<_>>();
        self.instrument.measure(self.value, &attributes);
    }
}
