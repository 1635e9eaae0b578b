mod attributes;
mod instruments;
mod provider;

mod gen {
    include!(concat!(env!("OUT_DIR"), "/instrument_registry.rs"));
    include!(concat!(env!("OUT_DIR"), "/metric_attributes.rs"));
}

use std::fmt;

pub use attributes::{ClientAttribute, ClientAttributes};
pub use gen::{InstrumentRegistry, MetricAttribute};
pub use instruments::*;
pub use provider::{InstrumentDescriptor, InstrumentKind, InstrumentProvider};

impl fmt::Debug for InstrumentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentRegistry").finish()
    }
}
