use std::borrow::Cow;

/// The instrumentation scope name of the client-side metrics.
pub const SPANNER_METER_NAME: &str = "spanner-rust";

/// The instrumentation scope version of the client-side metrics.
pub const SPANNER_METER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A key-value pair for metric attributes.
/// This is a restriction over [`opentelemetry::KeyValue`] to only allow
/// static string keys and clone-on-write string values.
pub type KeyValue = (&'static str, Cow<'static, str>);
