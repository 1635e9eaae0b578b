mod application;

pub use application::*;
