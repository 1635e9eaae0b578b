use std::fmt;

use log::debug;
use opentelemetry::metrics::MeterProvider;
use opentelemetry::InstrumentationScope;

use crate::common::{SPANNER_METER_NAME, SPANNER_METER_VERSION};
use crate::error::TelemetryResult;
use crate::metrics::{Counter, Histogram, InstrumentDescriptor, InstrumentProvider, InstrumentRegistry};

/// Owns the client-side metric instruments.
///
/// The instruments are created once when the factory is constructed,
/// and are never recreated afterward.
pub struct InstrumentFactory {
    registry: InstrumentRegistry,
}

impl InstrumentFactory {
    /// Creates the instruments with a meter scoped to the client library name and version.
    ///
    /// Getting the meter may register state in the given provider that lives
    /// as long as the provider.
    pub fn try_new(provider: &dyn MeterProvider) -> TelemetryResult<Self> {
        let meter = provider.meter_with_scope(get_instrumentation_scope());
        Self::try_from_provider(&meter)
    }

    pub fn try_from_provider(provider: &dyn InstrumentProvider) -> TelemetryResult<Self> {
        let registry = InstrumentRegistry::try_new(provider)?;
        debug!(
            "created {} client-side metric instruments",
            InstrumentRegistry::DESCRIPTORS.len()
        );
        Ok(Self { registry })
    }

    pub fn descriptors(&self) -> &'static [InstrumentDescriptor] {
        InstrumentRegistry::DESCRIPTORS
    }

    pub fn attempt_latency(&self) -> &Histogram<f64> {
        &self.registry.attempt_latencies
    }

    pub fn attempt_counter(&self) -> &Counter<u64> {
        &self.registry.attempt_count
    }

    pub fn operation_latency(&self) -> &Histogram<f64> {
        &self.registry.operation_latencies
    }

    pub fn operation_counter(&self) -> &Counter<u64> {
        &self.registry.operation_count
    }

    pub fn gfe_latency(&self) -> &Histogram<f64> {
        &self.registry.gfe_latencies
    }

    pub fn gfe_connectivity_error_count(&self) -> &Counter<u64> {
        &self.registry.gfe_connectivity_error_count
    }
}

impl fmt::Debug for InstrumentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentFactory")
            .field("registry", &self.registry)
            .finish()
    }
}

fn get_instrumentation_scope() -> InstrumentationScope {
    InstrumentationScope::builder(SPANNER_METER_NAME)
        .with_version(SPANNER_METER_VERSION)
        .build()
}

#[cfg(test)]
mod tests {
    use opentelemetry::metrics;
    use opentelemetry_sdk::metrics::SdkMeterProvider;

    use super::*;
    use crate::error::TelemetryError;
    use crate::metrics::InstrumentKind;
    use crate::testing::MetricTester;

    /// An instrument provider that fails to create one of the instruments.
    struct FailingProvider {
        meter: metrics::Meter,
        fail_on: &'static str,
    }

    impl InstrumentProvider for FailingProvider {
        fn u64_counter(
            &self,
            descriptor: &InstrumentDescriptor,
        ) -> TelemetryResult<metrics::Counter<u64>> {
            if descriptor.name == self.fail_on {
                return Err(descriptor.creation_error("meter unavailable"));
            }
            InstrumentProvider::u64_counter(&self.meter, descriptor)
        }

        fn f64_histogram(
            &self,
            descriptor: &InstrumentDescriptor,
        ) -> TelemetryResult<metrics::Histogram<f64>> {
            if descriptor.name == self.fail_on {
                return Err(descriptor.creation_error("meter unavailable"));
            }
            InstrumentProvider::f64_histogram(&self.meter, descriptor)
        }
    }

    #[test]
    fn test_instrument_descriptors() {
        let expected = [
            ("attempt_latencies", "ms", InstrumentKind::Histogram),
            ("attempt_count", "1", InstrumentKind::Counter),
            ("operation_latencies", "ms", InstrumentKind::Histogram),
            ("operation_count", "1", InstrumentKind::Counter),
            ("gfe_latencies", "ms", InstrumentKind::Histogram),
            ("gfe_connectivity_error_count", "1", InstrumentKind::Counter),
        ];
        let actual = InstrumentRegistry::DESCRIPTORS
            .iter()
            .map(|d| (d.name, d.unit, d.kind))
            .collect::<Vec<_>>();
        assert_eq!(actual, expected);
        for descriptor in InstrumentRegistry::DESCRIPTORS {
            assert!(descriptor.validate().is_ok());
            assert!(!descriptor.description.is_empty());
        }
    }

    #[test]
    fn test_instruments_are_created() -> Result<(), Box<dyn std::error::Error>> {
        let tester = MetricTester::new();
        let factory = InstrumentFactory::try_new(tester.provider())?;
        assert_eq!(factory.attempt_latency().name(), "attempt_latencies");
        assert_eq!(factory.attempt_counter().name(), "attempt_count");
        assert_eq!(factory.operation_latency().name(), "operation_latencies");
        assert_eq!(factory.operation_counter().name(), "operation_count");
        assert_eq!(factory.gfe_latency().name(), "gfe_latencies");
        assert_eq!(
            factory.gfe_connectivity_error_count().name(),
            "gfe_connectivity_error_count"
        );
        assert_eq!(factory.descriptors().len(), 6);
        Ok(())
    }

    #[test]
    fn test_instruments_are_exported_with_metadata() -> Result<(), Box<dyn std::error::Error>> {
        let tester = MetricTester::new();
        let factory = InstrumentFactory::try_new(tester.provider())?;
        factory.attempt_latency().recorder(1.5).emit();
        factory.attempt_counter().recorder(1).emit();
        factory.operation_latency().recorder(3.0).emit();
        factory.operation_counter().recorder(1).emit();
        factory.gfe_latency().recorder(0.5).emit();
        factory.gfe_connectivity_error_count().recorder(1).emit();

        let metrics = tester.collect()?;
        assert_eq!(metrics.len(), 6);
        for descriptor in factory.descriptors() {
            let metric = metrics
                .iter()
                .find(|m| m.name == descriptor.name)
                .ok_or_else(|| format!("missing metric: {}", descriptor.name))?;
            assert_eq!(metric.unit, descriptor.unit);
            assert_eq!(metric.description, descriptor.description);
            assert_eq!(metric.scope, SPANNER_METER_NAME);
            assert_eq!(metric.scope_version.as_deref(), Some(SPANNER_METER_VERSION));
        }
        Ok(())
    }

    #[test]
    fn test_instrument_creation_failure() {
        let provider = SdkMeterProvider::builder().build();
        let meter = provider.meter_with_scope(get_instrumentation_scope());
        for descriptor in InstrumentRegistry::DESCRIPTORS {
            let failing = FailingProvider {
                meter: meter.clone(),
                fail_on: descriptor.name,
            };
            let result = InstrumentFactory::try_from_provider(&failing);
            assert!(matches!(
                result,
                Err(TelemetryError::InstrumentCreationError { ref name, .. })
                    if name == descriptor.name
            ));
        }
    }
}
