use std::collections::BTreeMap;
use std::error::Error;

use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::data::{Histogram, Sum};
use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};

/// A single data point of a collected metric.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedPoint {
    pub attributes: BTreeMap<String, String>,
    /// The counter value, or the histogram sum.
    pub value: f64,
    /// The number of histogram measurements, or zero for counters.
    pub count: u64,
}

/// A metric collected by the in-memory exporter.
#[derive(Debug, Clone)]
pub struct CollectedMetric {
    pub name: String,
    pub unit: String,
    pub description: String,
    pub scope: String,
    pub scope_version: Option<String>,
    pub points: Vec<CollectedPoint>,
}

/// A utility for instrument unit tests.
/// The tester owns a meter provider whose metrics are collected
/// by an in-memory exporter.
pub struct MetricTester {
    exporter: InMemoryMetricExporter,
    provider: SdkMeterProvider,
}

impl MetricTester {
    pub fn new() -> Self {
        let exporter = InMemoryMetricExporter::default();
        let reader = PeriodicReader::builder(exporter.clone()).build();
        let provider = SdkMeterProvider::builder().with_reader(reader).build();
        Self { exporter, provider }
    }

    pub fn provider(&self) -> &SdkMeterProvider {
        &self.provider
    }

    /// Flushes the provider and returns the metrics exported so far.
    /// This should be called at most once per tester since the exporter
    /// accumulates every export.
    pub fn collect(&self) -> Result<Vec<CollectedMetric>, Box<dyn Error>> {
        self.provider.force_flush()?;
        let exported = self.exporter.get_finished_metrics()?;
        let mut out = vec![];
        for resource in exported {
            for scope in resource.scope_metrics {
                for metric in scope.metrics {
                    let data = metric.data.as_any();
                    let points = if let Some(sum) = data.downcast_ref::<Sum<u64>>() {
                        sum.data_points
                            .iter()
                            .map(|p| CollectedPoint {
                                attributes: to_map(&p.attributes),
                                value: p.value as f64,
                                count: 0,
                            })
                            .collect()
                    } else if let Some(histogram) = data.downcast_ref::<Histogram<f64>>() {
                        histogram
                            .data_points
                            .iter()
                            .map(|p| CollectedPoint {
                                attributes: to_map(&p.attributes),
                                value: p.sum,
                                count: p.count,
                            })
                            .collect()
                    } else {
                        return Err(format!("unexpected data for metric: {}", metric.name).into());
                    };
                    out.push(CollectedMetric {
                        name: metric.name.to_string(),
                        unit: metric.unit.to_string(),
                        description: metric.description.to_string(),
                        scope: scope.scope.name().to_string(),
                        scope_version: scope.scope.version().map(|v| v.to_string()),
                        points,
                    });
                }
            }
        }
        Ok(out)
    }

    /// Collects the metrics and returns the data points of the named metric.
    /// Returns an empty list if nothing was recorded for the metric.
    pub fn collect_points(&self, name: &str) -> Result<Vec<CollectedPoint>, Box<dyn Error>> {
        Ok(self
            .collect()?
            .into_iter()
            .filter(|m| m.name == name)
            .flat_map(|m| m.points)
            .collect())
    }
}

fn to_map(attributes: &[KeyValue]) -> BTreeMap<String, String> {
    attributes
        .iter()
        .map(|kv| (kv.key.as_str().to_string(), kv.value.as_str().into_owned()))
        .collect()
}
