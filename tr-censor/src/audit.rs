//! 删失文件批量统计.
//!
//! 遍历输出目录, 统计每个删失文件保留的 TR 个数, 找出保留过少、应视为离群的 run.

use crate::io::read_censor_1d;
use crate::run::RunSummary;
use crate::CensorResult;
use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 单个删失文件的统计结果.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AuditEntry {
    /// 删失文件路径.
    pub path: PathBuf,

    /// 统计信息.
    pub summary: RunSummary,

    /// 保留的 TR 是否足够.
    pub usable: bool,
}

/// 在 `root` 下递归查找文件名匹配 `pattern` 的删失文件并逐个统计. 结果按路径排序.
///
/// 任意一个文件读取失败时返回错误.
pub fn audit_dir<P: AsRef<Path>>(
    root: P,
    pattern: &str,
    min_retained: usize,
) -> CensorResult<Vec<AuditEntry>> {
    let matcher = Glob::new(pattern)?.compile_matcher();
    let mut files = find_files(root.as_ref(), &matcher)?;
    files.sort();
    log::debug!("{}: {} censor files", root.as_ref().display(), files.len());

    let entries = summarize_all(files, min_retained)?;
    let short = entries.iter().filter(|e| !e.usable).count();
    if short > 0 {
        log::warn!("{short} of {} runs keep fewer than {min_retained} volumes", entries.len());
    }
    Ok(entries)
}

fn find_files(root: &Path, matcher: &GlobMatcher) -> CensorResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_file() && matcher.is_match(entry.file_name()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn summarize(path: PathBuf, min_retained: usize) -> CensorResult<AuditEntry> {
    let seq = read_censor_1d(&path)?;
    let summary = RunSummary::from_sequence(seq.view());
    Ok(AuditEntry {
        path,
        usable: summary.is_usable(min_retained),
        summary,
    })
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};

        /// 借助 `rayon`, 并行地统计所有文件. 结果顺序与输入一致.
        fn summarize_all(files: Vec<PathBuf>, min_retained: usize) -> CensorResult<Vec<AuditEntry>> {
            files
                .into_par_iter()
                .map(|p| summarize(p, min_retained))
                .collect()
        }
    } else {
        fn summarize_all(files: Vec<PathBuf>, min_retained: usize) -> CensorResult<Vec<AuditEntry>> {
            files
                .into_iter()
                .map(|p| summarize(p, min_retained))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::CENSOR_FILE_PATTERN;
    use crate::{CensorError, ErrorKind};
    use std::fs;

    #[test]
    fn test_audit_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub-02").join("func");
        fs::create_dir_all(&sub).unwrap();

        fs::write(dir.path().join("sub-01_censoring0.35.1D"), "1\n1\n1\n0\n").unwrap();
        fs::write(sub.join("sub-02_censoring0.35.1D"), "0\n0\n1\n").unwrap();
        fs::write(sub.join("sub-02_regressors.1D"), "0.5 0.2\n").unwrap();

        let entries = audit_dir(dir.path(), CENSOR_FILE_PATTERN, 2).unwrap();
        assert_eq!(entries.len(), 2);

        assert!(entries[0].path.ends_with("sub-01_censoring0.35.1D"));
        assert_eq!(entries[0].summary.retained, 3);
        assert!(entries[0].usable);

        assert!(entries[1].path.ends_with("sub-02_censoring0.35.1D"));
        assert_eq!(entries[1].summary.excluded, 2);
        assert!(!entries[1].usable);
    }

    #[test]
    fn test_audit_dir_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(audit_dir(dir.path(), CENSOR_FILE_PATTERN, 1).unwrap().is_empty());

        let e = audit_dir(dir.path(), "[", 1).unwrap_err();
        assert!(matches!(e, CensorError::Glob(_)));

        fs::write(dir.path().join("bad_censoring.1D"), "1\n5\n").unwrap();
        let e = audit_dir(dir.path(), CENSOR_FILE_PATTERN, 1).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidInput);

        let e = audit_dir(dir.path().join("missing"), CENSOR_FILE_PATTERN, 1).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Io);
    }
}
