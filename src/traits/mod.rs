//! Core traits for components managed by the container.

mod lifecycle;

pub use lifecycle::{Dispose, Initialize};
