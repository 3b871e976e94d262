//! Image preprocessing toolkit.

mod slice;

pub use slice::*;
