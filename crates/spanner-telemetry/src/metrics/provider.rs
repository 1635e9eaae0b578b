use opentelemetry::metrics::{Counter, Histogram, Meter};

use crate::error::{TelemetryError, TelemetryResult};

const INSTRUMENT_NAME_MAX_LENGTH: usize = 255;
const INSTRUMENT_UNIT_MAX_LENGTH: usize = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    Counter,
    Histogram,
}

/// The static metadata of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstrumentDescriptor {
    pub name: &'static str,
    pub unit: &'static str,
    pub description: &'static str,
    pub kind: InstrumentKind,
}

impl InstrumentDescriptor {
    /// Checks the descriptor against the OpenTelemetry instrument naming rules.
    ///
    /// Reference: <https://opentelemetry.io/docs/specs/otel/metrics/api/#instrument-name-syntax>
    pub fn validate(&self) -> TelemetryResult<()> {
        let mut chars = self.name.chars();
        match chars.next() {
            None => return Err(self.creation_error("instrument name must not be empty")),
            Some(c) if !c.is_ascii_alphabetic() => {
                return Err(self.creation_error("instrument name must start with a letter"))
            }
            Some(_) => {}
        }
        if self.name.len() > INSTRUMENT_NAME_MAX_LENGTH {
            return Err(self.creation_error(format!(
                "instrument name exceeds {INSTRUMENT_NAME_MAX_LENGTH} characters"
            )));
        }
        if let Some(c) = chars.find(|c| !(c.is_ascii_alphanumeric() || "_.-/".contains(*c))) {
            return Err(self.creation_error(format!("invalid character in instrument name: {c:?}")));
        }
        if !self.unit.is_ascii() || self.unit.len() > INSTRUMENT_UNIT_MAX_LENGTH {
            return Err(self.creation_error(format!(
                "instrument unit must be ASCII with at most {INSTRUMENT_UNIT_MAX_LENGTH} characters"
            )));
        }
        Ok(())
    }

    pub fn creation_error(&self, message: impl Into<String>) -> TelemetryError {
        TelemetryError::creation(self.name, message)
    }
}

/// A capability that creates the instruments of the registry.
///
/// This is implemented for the OpenTelemetry [`Meter`]. Tests may provide
/// their own implementation to exercise creation failures without touching
/// the process-wide meter provider.
pub trait InstrumentProvider {
    fn u64_counter(&self, descriptor: &InstrumentDescriptor) -> TelemetryResult<Counter<u64>>;

    fn f64_histogram(&self, descriptor: &InstrumentDescriptor)
        -> TelemetryResult<Histogram<f64>>;
}

impl InstrumentProvider for Meter {
    fn u64_counter(&self, descriptor: &InstrumentDescriptor) -> TelemetryResult<Counter<u64>> {
        if descriptor.kind != InstrumentKind::Counter {
            return Err(descriptor.creation_error("instrument is not a counter"));
        }
        descriptor.validate()?;
        Ok(self
            .u64_counter(descriptor.name)
            .with_unit(descriptor.unit)
            .with_description(descriptor.description)
            .build())
    }

    fn f64_histogram(
        &self,
        descriptor: &InstrumentDescriptor,
    ) -> TelemetryResult<Histogram<f64>> {
        if descriptor.kind != InstrumentKind::Histogram {
            return Err(descriptor.creation_error("instrument is not a histogram"));
        }
        descriptor.validate()?;
        Ok(self
            .f64_histogram(descriptor.name)
            .with_unit(descriptor.unit)
            .with_description(descriptor.description)
            .build())
    }
}
