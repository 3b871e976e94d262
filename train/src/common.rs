//! Common imports from external crates.

pub use anyhow::{bail, ensure, format_err, Context, Error, Result};
pub use chrono::{DateTime, Local};
pub use futures::future::FutureExt;
pub use indexmap::IndexMap;
pub use mrnet::{
    dataset::{Batch, BatchSequence, BatchStats, MriSequence, MriSequenceInit},
    label::{LabelSummary, TaskLabels},
    processor::{ResizeFilter, SlicePreprocessor},
    task::{Plane, Split, Task},
};
pub use noisy_float::prelude::*;
pub use rand::{prelude::*, rngs::StdRng};
pub use serde::{Deserialize, Serialize};
pub use std::{
    borrow::Cow,
    future::Future,
    mem,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};
pub use tokio::sync::mpsc;
pub use tracing::{debug, error, info, info_span, warn, Instrument};

pub type Fallible<T> = Result<T, Error>;
