//! Batch sequencing of exam volumes.

mod dataset_;
mod inventory;
mod record;
mod sequence;

pub use dataset_::*;
pub use inventory::*;
pub use record::*;
pub use sequence::*;
