//! 基于 framewise displacement (FD) 的初始删失.
//!
//! FD 来自 fMRIPrep 输出的 `*_desc-confounds_timeseries.tsv`. 第一个 TR 没有前一帧可比较,
//! 其 FD 恒为 `n/a`, 因此永远保留.

use crate::consts::{EXCLUDE, FD_COLUMN, KEEP};
use crate::{CensorError, CensorResult, InclusionSequence};
use std::path::Path;

/// 按阈值生成初始删失序列.
///
/// 第 0 个 TR 总是保留; 其余 TR 的 FD 严格大于 `threshold` 时删除. `NaN` 视为保留.
/// 调用方负责确保 `threshold` 合法, 见 `check_threshold`.
pub fn fd_censor(values: &[f64], threshold: f64) -> InclusionSequence {
    values
        .iter()
        .enumerate()
        .map(|(i, &fd)| if i > 0 && fd > threshold { EXCLUDE } else { KEEP })
        .collect()
}

/// FD 的均值, 忽略 `NaN`. 没有可用数值时返回 `None`.
pub fn mean_fd(values: &[f64]) -> Option<f64> {
    let (sum, n) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// 检查 FD 阈值是否为有限非负数.
pub fn check_threshold(threshold: f64) -> CensorResult<f64> {
    if threshold.is_finite() && threshold >= 0.0 {
        Ok(threshold)
    } else {
        Err(CensorError::InvalidThreshold(threshold))
    }
}

/// 从制表符分隔、带表头的 confounds 表中读取名为 `column` 的一列.
///
/// `n/a` 和空单元格读为 `NaN`.
pub fn read_confound_column<P: AsRef<Path>>(path: P, column: &str) -> CensorResult<Vec<f64>> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path)?;

    let index = rdr
        .headers()?
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| CensorError::MissingColumn(column.to_string()))?;

    let mut values = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let cell = record.get(index).unwrap_or("").trim();
        values.push(parse_cell(cell, row + 2)?);
    }
    log::debug!("{}: {} rows of `{column}`", path.display(), values.len());
    Ok(values)
}

/// 读取 confounds 表中的 FD 列并按阈值生成初始删失序列.
pub fn fd_censor_file<P: AsRef<Path>>(path: P, threshold: f64) -> CensorResult<InclusionSequence> {
    let threshold = check_threshold(threshold)?;
    let fd = read_confound_column(path, FD_COLUMN)?;
    Ok(fd_censor(&fd, threshold))
}

fn parse_cell(cell: &str, line: usize) -> CensorResult<f64> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("n/a") || cell.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    cell.parse().map_err(|_| CensorError::Parse {
        line,
        token: cell.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use std::io::Write;

    const CONFOUNDS: &str = "\
global_signal\tframewise_displacement\ttrans_x
1.0\tn/a\t0.0
1.1\t0.10\t0.1
1.2\t0.50\t0.1
1.3\t0.35\t0.2
1.4\t0.36\t0.2
1.5\tn/a\t0.3
";

    fn confounds_file(text: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(text.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_fd_censor_threshold_is_strict() {
        let fd = [f64::NAN, 0.1, 0.5, 0.35, 0.36, f64::NAN];
        assert_eq!(fd_censor(&fd, 0.35).to_vec(), vec![1, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn test_fd_censor_first_volume_is_kept() {
        assert_eq!(fd_censor(&[9.0, 9.0], 0.2).to_vec(), vec![1, 0]);
        assert!(fd_censor(&[], 0.2).is_empty());
    }

    #[test]
    fn test_mean_fd() {
        let fd = [f64::NAN, 0.1, 0.5, 0.3];
        assert!((mean_fd(&fd).unwrap() - 0.3).abs() < 1e-12);
        assert_eq!(mean_fd(&[f64::NAN]), None);
        assert_eq!(mean_fd(&[]), None);
    }

    #[test]
    fn test_check_threshold() {
        assert_eq!(check_threshold(0.0).unwrap(), 0.0);
        for bad in [-0.1, f64::NAN, f64::INFINITY] {
            let e = check_threshold(bad).unwrap_err();
            assert_eq!(e.kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn test_read_confound_column() {
        let f = confounds_file(CONFOUNDS);
        let fd = read_confound_column(f.path(), FD_COLUMN).unwrap();
        assert_eq!(fd.len(), 6);
        assert!(fd[0].is_nan() && fd[5].is_nan());
        assert_eq!(&fd[1..5], &[0.10, 0.50, 0.35, 0.36]);

        let e = read_confound_column(f.path(), "rot_z").unwrap_err();
        assert!(matches!(e, CensorError::MissingColumn(ref c) if c == "rot_z"));
    }

    #[test]
    fn test_read_confound_column_bad_cell() {
        let f = confounds_file("framewise_displacement\nn/a\nabc\n");
        let e = read_confound_column(f.path(), FD_COLUMN).unwrap_err();
        assert!(matches!(e, CensorError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_fd_censor_file() {
        let f = confounds_file(CONFOUNDS);
        let seq = fd_censor_file(f.path(), 0.35).unwrap();
        assert_eq!(seq.to_vec(), vec![1, 1, 0, 1, 0, 1]);

        let e = fd_censor_file("/nonexistent/confounds.tsv", 0.35).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Io);
    }
}
