//! 离群 run 登记表.
//!
//! 保留的 TR 过少, 或预处理后的图像过短的 run 不参与后续分析.
//! 这些 run 以 BIDS 名称 (如 `sub-01_task-rest_run-1`) 登记在一个制表符分隔的表中,
//! 表头至少包含 `bids_name` 一列. 同一个 run 只登记一次.

use crate::consts::{MIN_PREPROC_VOLUMES, OUTLIER_COLUMN};
use crate::run::RunSummary;
use crate::{CensorError, CensorResult};
use std::path::Path;

/// 判定为离群的原因.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutlierReason {
    /// 删失后保留的 TR 过少. 参数为保留个数.
    FewRetained(usize),

    /// 预处理后的图像 TR 过少. 参数为 TR 个数.
    ShortPreproc(usize),
}

impl OutlierReason {
    /// 对应的 TR 个数.
    #[inline]
    pub fn volumes(&self) -> usize {
        match *self {
            OutlierReason::FewRetained(n) | OutlierReason::ShortPreproc(n) => n,
        }
    }
}

/// 根据删失统计与 (可选的) 预处理图像 TR 个数, 列出该 run 的全部离群原因.
pub fn outlier_reasons(
    summary: &RunSummary,
    min_retained: usize,
    preproc_volumes: Option<usize>,
) -> Vec<OutlierReason> {
    let mut reasons = Vec::new();
    if !summary.is_usable(min_retained) {
        reasons.push(OutlierReason::FewRetained(summary.retained));
    }
    if let Some(n) = preproc_volumes.filter(|&n| n < MIN_PREPROC_VOLUMES) {
        reasons.push(OutlierReason::ShortPreproc(n));
    }
    reasons
}

/// 从文件名前缀中取出 BIDS run 名称, 即 `_space-` 之前的部分.
pub fn run_name(prefix: &str) -> &str {
    prefix.split("_space-").next().unwrap_or(prefix)
}

/// 读取登记表中已有的 run 名称. 文件不存在时返回空表.
pub fn read_outliers<P: AsRef<Path>>(path: P) -> CensorResult<Vec<String>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let (headers, records) = read_table(path)?;
    let index = name_column(&headers)?;
    Ok(records
        .iter()
        .filter_map(|r| r.get(index).map(str::to_string))
        .collect())
}

/// 将 `name` 登记到 `path`. 已登记过时不做任何修改并返回 `false`.
///
/// 文件不存在时新建, 只有 `bids_name` 一列; 已有的其他列原样保留, 新行的其他列留空.
pub fn record_outlier<P: AsRef<Path>>(path: P, name: &str) -> CensorResult<bool> {
    let path = path.as_ref();
    let (headers, mut records) = if path.exists() {
        read_table(path)?
    } else {
        (csv::StringRecord::from(vec![OUTLIER_COLUMN]), Vec::new())
    };
    let index = name_column(&headers)?;

    if records.iter().any(|r| r.get(index) == Some(name)) {
        log::debug!("{name} already in {}", path.display());
        return Ok(false);
    }

    let mut row = vec![""; headers.len()];
    row[index] = name;
    records.push(csv::StringRecord::from(row));

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_path(path)?;
    wtr.write_record(&headers)?;
    for r in records.iter() {
        wtr.write_record(r)?;
    }
    wtr.flush().map_err(|e| CensorError::io(path, e))?;
    log::info!("{}: added {name}", path.display());
    Ok(true)
}

fn read_table(path: &Path) -> CensorResult<(csv::StringRecord, Vec<csv::StringRecord>)> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let headers = rdr.headers()?.clone();
    let records = rdr.records().collect::<Result<Vec<_>, _>>()?;
    Ok((headers, records))
}

fn name_column(headers: &csv::StringRecord) -> CensorResult<usize> {
    headers
        .iter()
        .position(|h| h.trim() == OUTLIER_COLUMN)
        .ok_or_else(|| CensorError::MissingColumn(OUTLIER_COLUMN.to_string()))
}
