//! 通用常量.

/// 删失序列中, 保留 TR 的取值.
pub const KEEP: u8 = 1;

/// 删失序列中, 删除 TR 的取值.
pub const EXCLUDE: u8 = 0;

/// fMRIPrep confounds 表中 framewise displacement 的列名.
pub const FD_COLUMN: &str = "framewise_displacement";

/// 默认 FD 阈值 (毫米).
pub const DEFAULT_FD_THRESHOLD: f64 = 0.35;

/// 删失后至少需要保留的 TR 个数. 不足时该 run 应被视为离群.
pub const MIN_RETAINED_VOLUMES: usize = 100;

/// 预处理后的 BOLD 图像至少需要的 TR 个数. 不足时该 run 应被视为离群.
pub const MIN_PREPROC_VOLUMES: usize = 365;

/// 离群 run 登记表中 run 名称的列名.
pub const OUTLIER_COLUMN: &str = "bids_name";

/// 离群 run 登记表的默认文件名.
pub const OUTLIER_FILE_NAME: &str = "runs_to_exclude.tsv";

/// 删失文件的默认匹配模式.
pub const CENSOR_FILE_PATTERN: &str = "*_censoring*.1D";

/// TR 是否被保留?
#[inline]
pub const fn is_keep(v: u8) -> bool {
    matches!(v, KEEP)
}

/// TR 是否被删除?
#[inline]
pub const fn is_excluded(v: u8) -> bool {
    matches!(v, EXCLUDE)
}

/// 取值是否是合法的删失标记 (0 或 1)?
#[inline]
pub const fn is_binary(v: u8) -> bool {
    matches!(v, KEEP | EXCLUDE)
}
