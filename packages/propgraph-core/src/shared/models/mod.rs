//! Shared models

mod span;

pub use span::{Location, PhysicalLocation, Span};
