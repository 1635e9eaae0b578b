use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

use log::debug;

use crate::common::KeyValue;
use crate::instrument_factory::InstrumentFactory;
use crate::metrics::{ClientAttributes, MetricAttribute};

/// The name of the Google Front End (GFE) timing entry in the `server-timing` header.
const GFE_TIMING_HEADER_ENTRY: &str = "gfet4t7";

/// Records the metrics of one logical operation and its attempts.
///
/// The tracer carries a snapshot of the client attributes taken when it was created.
/// Later changes to the attributes of the issuing factory are not observed.
#[derive(Debug)]
pub struct MetricsTracer {
    attributes: Arc<ClientAttributes>,
    instruments: Arc<InstrumentFactory>,
    enabled: bool,
    gfe_enabled: bool,
    method: Option<Cow<'static, str>>,
    operation_start: Option<Instant>,
    attempt_start: Option<Instant>,
    attempt_count: u64,
}

impl MetricsTracer {
    pub(crate) fn new(
        attributes: Arc<ClientAttributes>,
        instruments: Arc<InstrumentFactory>,
        enabled: bool,
        gfe_enabled: bool,
    ) -> Self {
        Self {
            attributes,
            instruments,
            enabled,
            gfe_enabled,
            method: None,
            operation_start: None,
            attempt_start: None,
            attempt_count: 0,
        }
    }

    pub fn client_attributes(&self) -> &ClientAttributes {
        &self.attributes
    }

    pub fn instruments(&self) -> &InstrumentFactory {
        &self.instruments
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn gfe_enabled(&self) -> bool {
        self.gfe_enabled
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// The number of attempts completed so far.
    pub fn attempt_count(&self) -> u64 {
        self.attempt_count
    }

    pub fn set_method(&mut self, method: impl Into<Cow<'static, str>>) {
        self.method = Some(method.into());
    }

    pub fn record_operation_start(&mut self) {
        if !self.enabled {
            return;
        }
        self.operation_start = Some(Instant::now());
        self.attempt_count = 0;
    }

    pub fn record_operation_completion(&mut self, status: impl Into<Cow<'static, str>>) {
        if !self.enabled {
            return;
        }
        let Some(start) = self.operation_start.take() else {
            debug!("operation completed without a recorded start");
            return;
        };
        let latency = start.elapsed().as_secs_f64() * 1000.0;
        let attributes = self.measurement_attributes(status.into());
        self.instruments
            .operation_counter()
            .recorder(1)
            .with_attributes(&attributes)
            .emit();
        self.instruments
            .operation_latency()
            .recorder(latency)
            .with_attributes(&attributes)
            .emit();
    }

    pub fn record_attempt_start(&mut self) {
        if !self.enabled {
            return;
        }
        self.attempt_start = Some(Instant::now());
    }

    pub fn record_attempt_completion(&mut self, status: impl Into<Cow<'static, str>>) {
        if !self.enabled {
            return;
        }
        let Some(start) = self.attempt_start.take() else {
            debug!("attempt completed without a recorded start");
            return;
        };
        self.attempt_count += 1;
        let latency = start.elapsed().as_secs_f64() * 1000.0;
        let attributes = self.measurement_attributes(status.into());
        self.instruments
            .attempt_counter()
            .recorder(1)
            .with_attributes(&attributes)
            .emit();
        self.instruments
            .attempt_latency()
            .recorder(latency)
            .with_attributes(&attributes)
            .emit();
    }

    /// Records the GFE latency in milliseconds.
    pub fn record_gfe_latency(&self, latency: f64) {
        if !self.gfe_enabled {
            return;
        }
        self.instruments
            .gfe_latency()
            .recorder(latency)
            .with_attributes(&self.base_attributes())
            .emit();
    }

    /// Counts a response that did not carry the GFE timing entry.
    pub fn record_gfe_connectivity_error(&self) {
        if !self.gfe_enabled {
            return;
        }
        self.instruments
            .gfe_connectivity_error_count()
            .recorder(1)
            .with_attributes(&self.base_attributes())
            .emit();
    }

    /// Records the GFE metrics from the value of the `server-timing` response header.
    /// A missing header or a header without a valid GFE entry is counted as a connectivity error.
    pub fn record_server_timing_header(&self, header: Option<&str>) {
        match header.and_then(parse_gfe_latency) {
            Some(latency) => self.record_gfe_latency(latency),
            None => self.record_gfe_connectivity_error(),
        }
    }

    fn base_attributes(&self) -> Vec<KeyValue> {
        let mut attributes = self.attributes.key_values();
        if let Some(method) = &self.method {
            attributes.push((MetricAttribute::METHOD, method.clone()));
        }
        attributes
    }

    fn measurement_attributes(&self, status: Cow<'static, str>) -> Vec<KeyValue> {
        let mut attributes = self.base_attributes();
        attributes.push((MetricAttribute::STATUS, status));
        attributes
    }
}

/// Extracts the GFE latency in milliseconds from a `server-timing` header value,
/// e.g. `gfet4t7; dur=123`.
fn parse_gfe_latency(header: &str) -> Option<f64> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';').map(str::trim);
        if parts.next()? != GFE_TIMING_HEADER_ENTRY {
            return None;
        }
        parts
            .filter_map(|p| p.strip_prefix("dur="))
            .find_map(|v| v.trim().parse::<f64>().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gfe_latency() {
        assert_eq!(parse_gfe_latency("gfet4t7; dur=123"), Some(123.0));
        assert_eq!(parse_gfe_latency("gfet4t7;dur=1.5"), Some(1.5));
        assert_eq!(
            parse_gfe_latency("cache;desc=hit, gfet4t7; dur=42"),
            Some(42.0)
        );
        assert_eq!(parse_gfe_latency("gfet4t7"), None);
        assert_eq!(parse_gfe_latency("gfet4t7; dur=abc"), None);
        assert_eq!(parse_gfe_latency("other; dur=10"), None);
        assert_eq!(parse_gfe_latency(""), None);
    }
}
