//! 🧠欢迎光临🧠
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::InclusionSequence;

pub use crate::config::ExpansionConfig;
pub use crate::consts::{EXCLUDE, KEEP, MIN_PREPROC_VOLUMES, MIN_RETAINED_VOLUMES};
pub use crate::error::{CensorError, CensorResult, ErrorKind};

pub use crate::expand::{expand, expand_all, expand_raw};
pub use crate::fd::{fd_censor, fd_censor_file};
pub use crate::indicator::{indicator_to_inclusion, reduce_indicator};
pub use crate::io::{read_censor_1d, write_censor_1d};
pub use crate::outlier::{outlier_reasons, record_outlier, OutlierReason};
pub use crate::run::{CensorRun, RunSummary};

#[cfg(feature = "rayon")]
pub use crate::expand::par_expand_all;
