//! The building blocks of the MRNet knee MRI data pipeline.

mod common;
pub mod dataset;
pub mod label;
pub mod processor;
pub mod profiling;
pub mod task;
pub mod volume;
