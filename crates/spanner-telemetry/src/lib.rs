//! Client-side metrics for the Spanner database client.
//!
//! A [`MetricsTracerFactory`] is created once per client. It owns the metric
//! instruments and the client attributes, and issues a [`MetricsTracer`] for
//! each operation.

pub mod common;
pub mod error;
mod instrument_factory;
pub mod metrics;
mod tracer;
mod tracer_factory;
#[cfg(test)]
mod testing;

pub use instrument_factory::InstrumentFactory;
pub use tracer::MetricsTracer;
pub use tracer_factory::{MetricsOptions, MetricsTracerFactory};
