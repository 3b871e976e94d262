pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
#[cfg(test)]
pub use approx::assert_abs_diff_eq;
pub use image::{imageops::FilterType, ImageBuffer, Luma};
pub use indexmap::{IndexMap, IndexSet};
pub use itertools::{izip, Itertools as _};
pub use lazy_static::lazy_static;
pub use ndarray::{s, Array1, Array2, Array3, Array4, ArrayView2, ArrayView3, Axis};
pub use rand::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::{
    collections::HashSet,
    fmt::{self, Debug, Display},
    fs::File,
    io::{self, BufReader, Cursor, Read},
    num::NonZeroUsize,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
    time::{Duration, Instant},
};
pub use tracing::{debug, info, warn};
