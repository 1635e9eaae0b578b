use std::sync::Arc;

use opentelemetry::global;
use opentelemetry::metrics::MeterProvider;
use spanner_common::config::{ClientConfig, MetricsConfig};

use crate::error::TelemetryResult;
use crate::instrument_factory::InstrumentFactory;
use crate::metrics::{ClientAttribute, ClientAttributes, Counter, Histogram};
use crate::tracer::MetricsTracer;

/// The feature flags of a [`MetricsTracerFactory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsOptions {
    pub enabled: bool,
    pub gfe_enabled: bool,
}

impl MetricsOptions {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            gfe_enabled: false,
        }
    }

    pub fn with_gfe_enabled(mut self, gfe_enabled: bool) -> Self {
        self.gfe_enabled = gfe_enabled;
        self
    }
}

impl From<&MetricsConfig> for MetricsOptions {
    fn from(config: &MetricsConfig) -> Self {
        Self::new(config.enabled).with_gfe_enabled(config.gfe_enabled)
    }
}

/// Issues [`MetricsTracer`]s for a database client.
///
/// The factory owns the client attributes, which are set as the connection
/// context becomes known, and shares its instruments with every tracer.
/// The instruments are created even if metrics are disabled, since the flags
/// only control whether tracers record measurements.
#[derive(Debug)]
pub struct MetricsTracerFactory {
    instruments: Arc<InstrumentFactory>,
    attributes: Arc<ClientAttributes>,
    options: MetricsOptions,
}

impl MetricsTracerFactory {
    /// Creates the factory with instruments from the process-global meter provider.
    pub fn try_new(options: MetricsOptions) -> TelemetryResult<Self> {
        Self::try_new_with_provider(&*global::meter_provider(), options)
    }

    /// Creates the factory with the options loaded from the environment.
    pub fn try_from_env() -> TelemetryResult<Self> {
        let config = ClientConfig::load()?;
        Self::try_new(MetricsOptions::from(&config.metrics))
    }

    pub fn try_new_with_provider(
        provider: &dyn MeterProvider,
        options: MetricsOptions,
    ) -> TelemetryResult<Self> {
        let instruments = InstrumentFactory::try_new(provider)?;
        Ok(Self::with_instruments(Arc::new(instruments), options))
    }

    /// Creates the factory with existing instruments, which may be shared
    /// with other factories.
    pub fn with_instruments(instruments: Arc<InstrumentFactory>, options: MetricsOptions) -> Self {
        Self {
            instruments,
            attributes: Arc::new(ClientAttributes::new()),
            options,
        }
    }

    pub fn enabled(&self) -> bool {
        self.options.enabled
    }

    pub fn gfe_enabled(&self) -> bool {
        self.options.gfe_enabled
    }

    pub fn client_attributes(&self) -> &ClientAttributes {
        &self.attributes
    }

    /// Sets a client attribute, replacing any previous value.
    /// Tracers created before the call keep their previous attributes.
    pub fn set_attribute(&mut self, attribute: ClientAttribute, value: impl Into<String>) {
        Arc::make_mut(&mut self.attributes).set(attribute, value);
    }

    pub fn set_project(&mut self, project: impl Into<String>) {
        self.set_attribute(ClientAttribute::Project, project);
    }

    pub fn set_instance(&mut self, instance: impl Into<String>) {
        self.set_attribute(ClientAttribute::Instance, instance);
    }

    pub fn set_instance_config(&mut self, instance_config: impl Into<String>) {
        self.set_attribute(ClientAttribute::InstanceConfig, instance_config);
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.set_attribute(ClientAttribute::Location, location);
    }

    pub fn set_client_hash(&mut self, client_hash: impl Into<String>) {
        self.set_attribute(ClientAttribute::ClientHash, client_hash);
    }

    pub fn set_client_uid(&mut self, client_uid: impl Into<String>) {
        self.set_attribute(ClientAttribute::ClientUid, client_uid);
    }

    pub fn set_client_name(&mut self, client_name: impl Into<String>) {
        self.set_attribute(ClientAttribute::ClientName, client_name);
    }

    pub fn set_database(&mut self, database: impl Into<String>) {
        self.set_attribute(ClientAttribute::Database, database);
    }

    pub fn instruments(&self) -> &Arc<InstrumentFactory> {
        &self.instruments
    }

    pub fn instrument_attempt_latency(&self) -> &Histogram<f64> {
        self.instruments.attempt_latency()
    }

    pub fn instrument_attempt_counter(&self) -> &Counter<u64> {
        self.instruments.attempt_counter()
    }

    pub fn instrument_operation_latency(&self) -> &Histogram<f64> {
        self.instruments.operation_latency()
    }

    pub fn instrument_operation_counter(&self) -> &Counter<u64> {
        self.instruments.operation_counter()
    }

    pub fn instrument_gfe_connectivity_error_count(&self) -> &Counter<u64> {
        self.instruments.gfe_connectivity_error_count()
    }

    pub fn instrument_gfe_latency(&self) -> &Histogram<f64> {
        self.instruments.gfe_latency()
    }

    pub fn create_tracer(&self) -> MetricsTracer {
        MetricsTracer::new(
            Arc::clone(&self.attributes),
            Arc::clone(&self.instruments),
            self.options.enabled,
            self.options.gfe_enabled,
        )
    }
}
