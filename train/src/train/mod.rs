//! The training step worker and the batch consumer seam.

mod consumer;
mod worker;

pub use consumer::*;
pub use worker::*;
