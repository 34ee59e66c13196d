//! 删失掩码扩展.
//!
//! 给定原始删失序列, 对每个被删除的 TR 向前、向后扩展, 再删除两段删除区之间过短的保留段.
//! 这些保留段太短, 不足以支撑后续需要时间连续数据的信号处理步骤.

use crate::consts::{is_binary, is_excluded, EXCLUDE, KEEP};
use crate::{CensorError, CensorResult, ExpansionConfig, InclusionSequence};
use itertools::Itertools;
use ndarray::{Array1, ArrayView1};

/// 扩展删失序列.
///
/// `seq` 中 `1` 代表保留, `0` 代表删除. 算法依次为:
///
/// 1. 收集所有被删除的下标 `E0`.
/// 2. 对 `E0` 中每个下标 `i`, 删除 `i - 1, ..., i - before` (越界的下标直接丢弃), 得到 `E1`.
/// 3. 对 `E1` 中每个下标 `i`, 删除 `i + 1, ..., i + after` (越界的下标直接丢弃), 得到 `E2`.
/// 4. 将 `E2` 升序排列, 对每一对相邻元素 `(a, b)`, 若 `b - a < min_gap`,
///   则删除开区间 `(a, b)` 内所有下标, 得到 `E3`.
/// 5. 输出在 `E3` 中的位置为 `0`, 其余为 `1`.
///
/// 输出长度与输入相同, 且输入中被删除的 TR 在输出中一定仍被删除.
///
/// # 注意
///
/// 第 4 步比较的是下标差, 而不是保留段长度: `b - a < min_gap`
/// 等价于两者之间的保留 TR 少于 `min_gap - 1` 个.
///
/// `seq` 中出现 0/1 以外的取值时返回 `CensorError::NonBinaryValue`.
pub fn expand(seq: ArrayView1<u8>, config: ExpansionConfig) -> CensorResult<InclusionSequence> {
    if let Some((index, &value)) = seq.indexed_iter().find(|(_, v)| !is_binary(**v)) {
        return Err(CensorError::NonBinaryValue {
            index,
            value: value as f64,
        });
    }
    Ok(ExpandImp::new(seq.len(), config).run(excluded_indices(seq)))
}

/// 同 `expand`, 但接受未经检查的整数序列和参数.
///
/// 参数为负数时返回 `CensorError::NegativeParameter`,
/// 序列中出现 0/1 以外的取值时返回 `CensorError::NonBinaryValue`.
pub fn expand_raw(
    seq: &[i64],
    before: i64,
    after: i64,
    min_gap: i64,
) -> CensorResult<InclusionSequence> {
    let config = ExpansionConfig::new(before, after, min_gap)?;
    let seq = seq
        .iter()
        .enumerate()
        .map(|(index, &v)| match v {
            0 => Ok(EXCLUDE),
            1 => Ok(KEEP),
            _ => Err(CensorError::NonBinaryValue {
                index,
                value: v as f64,
            }),
        })
        .collect::<CensorResult<Array1<u8>>>()?;
    expand(seq.view(), config)
}

/// 获取被删除 TR 的下标, 升序排列.
pub fn excluded_indices(seq: ArrayView1<u8>) -> Vec<usize> {
    seq.indexed_iter()
        .filter_map(|(i, &v)| is_excluded(v).then_some(i))
        .collect()
}

/// 依次扩展多个相互独立的删失序列.
pub fn expand_all(
    seqs: &[InclusionSequence],
    config: ExpansionConfig,
) -> Vec<CensorResult<InclusionSequence>> {
    seqs.iter().map(|s| expand(s.view(), config)).collect()
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

        /// 借助 `rayon`, 并行地扩展多个相互独立的删失序列. 结果顺序与输入一致.
        pub fn par_expand_all(
            seqs: &[InclusionSequence],
            config: ExpansionConfig,
        ) -> Vec<CensorResult<InclusionSequence>> {
            seqs.par_iter().map(|s| expand(s.view(), config)).collect()
        }
    }
}

/// `expand` 函数的实现细节. 以布尔掩码维护当前被删除的下标集合.
struct ExpandImp {
    config: ExpansionConfig,
    excluded: Vec<bool>,
}

impl ExpandImp {
    #[inline]
    fn new(len: usize, config: ExpansionConfig) -> Self {
        Self {
            config,
            excluded: vec![false; len],
        }
    }

    fn run(mut self, e0: Vec<usize>) -> InclusionSequence {
        for &i in e0.iter() {
            self.excluded[i] = true;
        }
        if !e0.is_empty() && !self.config.is_identity() {
            self.dilate_before(&e0);
            let e1 = self.snapshot();
            self.dilate_after(&e1);
            let e2 = self.snapshot();
            self.fill_gaps(&e2);
        }

        self.excluded
            .into_iter()
            .map(|ex| if ex { EXCLUDE } else { KEEP })
            .collect()
    }

    /// `from` 升序. 从右往左扫描, 已标记过的区间不再重复标记.
    fn dilate_before(&mut self, from: &[usize]) {
        let before = self.config.before();
        let mut covered = self.excluded.len();
        for &i in from.iter().rev() {
            let lo = i.saturating_sub(before);
            let hi = i.min(covered);
            if lo < hi {
                self.excluded[lo..hi].fill(true);
            }
            covered = covered.min(lo);
        }
    }

    /// `from` 升序. 从左往右扫描, 已标记过的区间不再重复标记.
    fn dilate_after(&mut self, from: &[usize]) {
        let len = self.excluded.len();
        let after = self.config.after();
        let mut covered = 0;
        for &i in from {
            let lo = (i + 1).max(covered);
            let hi = i.saturating_add(after).saturating_add(1).min(len);
            if lo < hi {
                self.excluded[lo..hi].fill(true);
            }
            covered = covered.max(hi);
        }
    }

    fn fill_gaps(&mut self, from: &[usize]) {
        let min_gap = self.config.min_gap();
        for (&a, &b) in from.iter().tuple_windows() {
            if b - a < min_gap {
                self.excluded[(a + 1)..b].fill(true);
            }
        }
    }

    /// 当前被删除下标的升序快照. 每一步只扩展上一步结束时的集合.
    fn snapshot(&self) -> Vec<usize> {
        self.excluded
            .iter()
            .enumerate()
            .filter_map(|(i, &ex)| ex.then_some(i))
            .collect()
    }
}
