//! 删失掩码扩展参数.

use crate::{CensorError, CensorResult};
use std::env;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 覆盖 `before` 的环境变量.
pub const ENV_BEFORE: &str = "TR_CENSOR_BEFORE";

/// 覆盖 `after` 的环境变量.
pub const ENV_AFTER: &str = "TR_CENSOR_AFTER";

/// 覆盖 `min_gap` 的环境变量.
pub const ENV_MIN_GAP: &str = "TR_CENSOR_MIN_GAP";

/// 删失掩码扩展参数, 包含向前扩展数、向后扩展数和最小保留间隔.
///
/// 该参数是只读的. 若要修改参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExpansionConfig {
    before: usize,
    after: usize,
    min_gap: usize,
}

impl ExpansionConfig {
    /// 构建扩展参数.
    ///
    /// 任意一个参数为负数时返回 `CensorError::NegativeParameter`.
    pub fn new(before: i64, after: i64, min_gap: i64) -> CensorResult<Self> {
        Ok(Self {
            before: non_negative("before", before)?,
            after: non_negative("after", after)?,
            min_gap: non_negative("min_gap", min_gap)?,
        })
    }

    /// 直接由非负整数构建.
    #[inline]
    pub const fn from_counts(before: usize, after: usize, min_gap: usize) -> Self {
        Self {
            before,
            after,
            min_gap,
        }
    }

    /// 独立删失扩展脚本使用的默认参数: 向前 1, 向后 2, 最小间隔 2.
    #[inline]
    pub const fn enhance_default() -> Self {
        Self::from_counts(1, 2, 2)
    }

    /// 静息态去噪流程使用的参数: 向前 1, 向后 1, 不做间隔填充.
    #[inline]
    pub const fn rest_denoise() -> Self {
        Self::from_counts(1, 1, 0)
    }

    /// 恒等变换参数. 扩展结果与输入完全相同.
    #[inline]
    pub const fn identity() -> Self {
        Self::from_counts(0, 0, 0)
    }

    /// 以 `base` 为基础, 读取 `$TR_CENSOR_{BEFORE, AFTER, MIN_GAP}` 覆盖对应参数.
    ///
    /// 未设置的变量保留 `base` 中的值; 无法解析或为负数的变量返回错误.
    pub fn from_env_or(base: Self) -> CensorResult<Self> {
        Ok(Self {
            before: env_count(ENV_BEFORE, "before")?.unwrap_or(base.before),
            after: env_count(ENV_AFTER, "after")?.unwrap_or(base.after),
            min_gap: env_count(ENV_MIN_GAP, "min_gap")?.unwrap_or(base.min_gap),
        })
    }

    /// 每个被删除的 TR 之前额外删除的 TR 个数.
    #[inline]
    pub fn before(&self) -> usize {
        self.before
    }

    /// 每个被删除的 TR 之后额外删除的 TR 个数.
    #[inline]
    pub fn after(&self) -> usize {
        self.after
    }

    /// 相邻两个被删除 TR 的下标差小于该值时, 两者之间的 TR 也被删除.
    #[inline]
    pub fn min_gap(&self) -> usize {
        self.min_gap
    }

    /// 是否为恒等变换?
    ///
    /// `min_gap` 为 1 时下标差永远不会小于它, 因此同样不做任何填充.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.before == 0 && self.after == 0 && self.min_gap <= 1
    }
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self::enhance_default()
    }
}

fn non_negative(name: &'static str, value: i64) -> CensorResult<usize> {
    usize::try_from(value).map_err(|_| CensorError::NegativeParameter { name, value })
}

fn env_count(var: &str, name: &'static str) -> CensorResult<Option<usize>> {
    let Ok(raw) = env::var(var) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let value: i64 = raw.parse().map_err(|_| CensorError::Parse {
        line: 0,
        token: format!("{var}={raw}"),
    })?;
    non_negative(name, value).map(Some)
}
