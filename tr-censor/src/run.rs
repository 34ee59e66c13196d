//! 单个 run 的删失流程.
//!
//! confounds 表 -> FD 初始删失 -> 掩码扩展 -> 去除 dummy scans -> 写入 `.1D` 文件.
//! 已存在的删失文件会被直接复用, 以便批量任务中断后可以继续.

use crate::consts::{DEFAULT_FD_THRESHOLD, FD_COLUMN, MIN_PREPROC_VOLUMES};
use crate::expand::expand;
use crate::fd::{fd_censor_file, mean_fd, read_confound_column};
use crate::io::{read_censor_1d, write_censor_1d};
use crate::{CensorError, CensorResult, ExpansionConfig, InclusionSequence};
use ndarray::{s, ArrayView1};
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 删失文件名: `{prefix}_censoring{threshold}.1D`.
///
/// 阈值的写法与已有批处理产物保持一致: 整数保留一位小数 (如 `1.0`),
/// 十进制指数小于 -4 或不小于 16 时使用科学计数法 (如 `1e-05`, `2.5e+16`).
pub fn censor_file_name(prefix: &str, threshold: f64) -> String {
    format!("{prefix}_censoring{}.1D", threshold_repr(threshold))
}

fn threshold_repr(x: f64) -> String {
    // `{:e}` 给出最短的尾数, 如 `1.5e-5`.
    let sci = format!("{x:e}");
    if let Some((mantissa, exp)) = sci.split_once('e') {
        if let Ok(exp) = exp.parse::<i32>() {
            if x != 0.0 && (exp < -4 || exp >= 16) {
                let sign = if exp < 0 { '-' } else { '+' };
                return format!("{mantissa}e{sign}{:02}", exp.abs());
            }
        }
    }
    if x.fract() == 0.0 {
        format!("{x:.1}")
    } else {
        format!("{x}")
    }
}

/// 去除开头 `n` 个 dummy scans. `n` 超过序列长度时返回空序列.
pub fn trim_dummy_scans(seq: ArrayView1<u8>, n: usize) -> InclusionSequence {
    seq.slice(s![n.min(seq.len())..]).to_owned()
}

/// 获取 nifti 图像的 TR (体积) 个数. 只读取文件头.
///
/// 三维及以下的图像视为只有一个体积.
pub fn volume_count<P: AsRef<Path>>(path: P) -> CensorResult<usize> {
    let header = nifti::NiftiHeader::from_file(path.as_ref())?;
    let [ndim, _, _, _, t, ..] = header.dim;
    Ok(if ndim >= 4 { t as usize } else { 1 })
}

/// 检查预处理后的 BOLD 图像是否足够长. 返回 `(TR 个数, 是否足够)`.
pub fn check_preproc_length<P: AsRef<Path>>(path: P) -> CensorResult<(usize, bool)> {
    let path = path.as_ref();
    let n = volume_count(path)?;
    let ok = n >= MIN_PREPROC_VOLUMES;
    if !ok {
        log::warn!(
            "{}: {n} volumes, fewer than {MIN_PREPROC_VOLUMES}",
            path.display()
        );
    }
    Ok((n, ok))
}

/// 删失序列的统计信息.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunSummary {
    /// TR 总数.
    pub total: usize,

    /// 保留的 TR 个数.
    pub retained: usize,

    /// 删除的 TR 个数.
    pub excluded: usize,
}

impl RunSummary {
    /// 统计删失序列.
    pub fn from_sequence(seq: ArrayView1<u8>) -> Self {
        let retained = seq.iter().filter(|&&v| crate::consts::is_keep(v)).count();
        Self {
            total: seq.len(),
            retained,
            excluded: seq.len() - retained,
        }
    }

    /// 保留比例. 序列为空时返回 `None`.
    #[inline]
    pub fn retained_fraction(&self) -> Option<f64> {
        (self.total > 0).then(|| self.retained as f64 / self.total as f64)
    }

    /// 保留的 TR 是否不少于 `min_retained`?
    #[inline]
    pub fn is_usable(&self, min_retained: usize) -> bool {
        self.retained >= min_retained
    }
}

/// `CensorRun::load_or_compute` 的结果.
#[derive(Clone, Debug)]
pub struct Censored {
    /// 删失文件路径.
    pub path: PathBuf,

    /// 删失序列 (已去除 dummy scans).
    pub sequence: InclusionSequence,

    /// 是否复用了已存在的文件.
    pub reused: bool,
}

impl Censored {
    /// 统计信息.
    #[inline]
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_sequence(self.sequence.view())
    }
}

/// 单个 run 的删失流程.
#[derive(Clone, Debug)]
pub struct CensorRun {
    confounds: PathBuf,
    bold: Option<PathBuf>,
    fd_threshold: f64,
    dummy_scans: usize,
    config: ExpansionConfig,
}

impl CensorRun {
    /// 以 confounds 表路径初始化. 默认阈值为 `DEFAULT_FD_THRESHOLD`,
    /// 不去除 dummy scans, 扩展参数为 `ExpansionConfig::rest_denoise()`.
    pub fn new<P: Into<PathBuf>>(confounds: P) -> Self {
        Self {
            confounds: confounds.into(),
            bold: None,
            fd_threshold: DEFAULT_FD_THRESHOLD,
            dummy_scans: 0,
            config: ExpansionConfig::rest_denoise(),
        }
    }

    /// 设置 FD 阈值.
    #[inline]
    pub fn fd_threshold(mut self, threshold: f64) -> Self {
        self.fd_threshold = threshold;
        self
    }

    /// 设置需要去除的 dummy scans 个数.
    #[inline]
    pub fn dummy_scans(mut self, n: usize) -> Self {
        self.dummy_scans = n;
        self
    }

    /// 设置扩展参数.
    #[inline]
    pub fn config(mut self, config: ExpansionConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置对应的 BOLD 图像. 设置后会检查 confounds 表行数与图像 TR 个数是否一致.
    #[inline]
    pub fn bold<P: Into<PathBuf>>(mut self, bold: P) -> Self {
        self.bold = Some(bold.into());
        self
    }

    /// confounds 表中 FD 的均值 (忽略 `n/a`).
    pub fn mean_fd(&self) -> CensorResult<Option<f64>> {
        Ok(mean_fd(&read_confound_column(&self.confounds, FD_COLUMN)?))
    }

    /// 计算删失序列. dummy scans 在扩展之后去除.
    pub fn compute(&self) -> CensorResult<InclusionSequence> {
        let raw = fd_censor_file(&self.confounds, self.fd_threshold)?;
        if let Some(bold) = self.bold.as_ref() {
            let expected = volume_count(bold)?;
            if expected != raw.len() {
                return Err(CensorError::LengthMismatch {
                    expected,
                    found: raw.len(),
                });
            }
        }
        if self.dummy_scans > raw.len() {
            log::warn!(
                "{}: {} dummy scans but only {} volumes",
                self.confounds.display(),
                self.dummy_scans,
                raw.len()
            );
        }
        let refined = expand(raw.view(), self.config)?;
        Ok(trim_dummy_scans(refined.view(), self.dummy_scans))
    }

    /// 删失文件在 `out_dir` 下的路径.
    pub fn output_path<P: AsRef<Path>>(&self, out_dir: P, prefix: &str) -> PathBuf {
        out_dir
            .as_ref()
            .join(censor_file_name(prefix, self.fd_threshold))
    }

    /// 若 `out_dir` 下已存在删失文件且 `force` 为假, 则直接读取;
    /// 否则计算删失序列并写入该文件.
    pub fn load_or_compute<P: AsRef<Path>>(
        &self,
        out_dir: P,
        prefix: &str,
        force: bool,
    ) -> CensorResult<Censored> {
        let path = self.output_path(out_dir, prefix);
        if path.is_file() && !force {
            log::debug!("{}: reusing existing censor file", path.display());
            let sequence = read_censor_1d(&path)?;
            return Ok(Censored {
                path,
                sequence,
                reused: true,
            });
        }

        let sequence = self.compute()?;
        write_censor_1d(&path, sequence.view())?;
        let summary = RunSummary::from_sequence(sequence.view());
        log::info!(
            "{}: kept {}/{} volumes",
            path.display(),
            summary.retained,
            summary.total
        );
        Ok(Censored {
            path,
            sequence,
            reused: false,
        })
    }
}
