//! 运行时错误.

use std::path::PathBuf;
use thiserror::Error;

/// 删失相关操作的运行时错误.
#[derive(Debug, Error)]
pub enum CensorError {
    /// 删失序列或指示矩阵中出现了 0/1 以外的取值.
    #[error("non-binary censoring value {value} at index {index}")]
    NonBinaryValue {
        /// 出错位置 (矩阵按行展平).
        index: usize,
        /// 原始取值.
        value: f64,
    },

    /// 扩展参数为负数.
    #[error("parameter `{name}` must be non-negative, got {value}")]
    NegativeParameter {
        /// 参数名.
        name: &'static str,
        /// 原始取值.
        value: i64,
    },

    /// 指示矩阵某一行有多于一列被置位.
    #[error("indicator matrix row {row} has {count} columns set, expected at most one")]
    MalformedIndicator {
        /// 行号.
        row: usize,
        /// 被置位的列数.
        count: usize,
    },

    /// 文本无法解析.
    #[error("cannot parse `{token}` at line {line}")]
    Parse {
        /// 行号 (从 1 开始).
        line: usize,
        /// 出错的片段.
        token: String,
    },

    /// confounds 表缺少需要的列.
    #[error("column `{0}` not found")]
    MissingColumn(String),

    /// FD 阈值不是有限非负数.
    #[error("invalid threshold {0}")]
    InvalidThreshold(f64),

    /// 化简后仍不是一维数据. 参数为实际维数.
    #[error("expected 1-D or 2-D censoring data, got {0} dimensions")]
    NotOneDimensional(usize),

    /// 长度不一致.
    #[error("length mismatch: expected {expected}, found {found}")]
    LengthMismatch {
        /// 期望长度.
        expected: usize,
        /// 实际长度.
        found: usize,
    },

    /// 底层 I/O 错误.
    #[error("{}: {source}", path.display())]
    Io {
        /// 出错文件.
        path: PathBuf,
        /// 底层错误.
        source: std::io::Error,
    },

    /// confounds 表读取错误.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// nifti 头读取错误.
    #[error(transparent)]
    Nifti(#[from] nifti::NiftiError),

    /// npy 读取错误. 元素类型不受支持时归为输入不合法.
    #[error(transparent)]
    ReadNpy(#[from] ndarray_npy::ReadNpyError),

    /// npy 写入错误.
    #[error(transparent)]
    WriteNpy(#[from] ndarray_npy::WriteNpyError),

    /// 目录遍历错误.
    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    /// 文件名匹配模式错误.
    #[error(transparent)]
    Glob(#[from] globset::Error),
}

/// 错误大类.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// 输入内容不合法 (取值、参数或格式).
    InvalidInput,

    /// 输入形状不合法.
    Shape,

    /// 读写文件失败.
    Io,
}

impl CensorError {
    /// 获取错误大类.
    pub fn kind(&self) -> ErrorKind {
        use CensorError::*;
        match self {
            NonBinaryValue { .. }
            | NegativeParameter { .. }
            | MalformedIndicator { .. }
            | Parse { .. }
            | MissingColumn(_)
            | InvalidThreshold(_)
            | ReadNpy(ndarray_npy::ReadNpyError::WrongDescriptor(_))
            | Glob(_) => ErrorKind::InvalidInput,
            NotOneDimensional(_) | LengthMismatch { .. } => ErrorKind::Shape,
            Io { .. } | Csv(_) | Nifti(_) | ReadNpy(_) | WriteNpy(_) | Walk(_) => ErrorKind::Io,
        }
    }

    /// 为底层 I/O 错误附上文件路径.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CensorError::Io {
            path: path.into(),
            source,
        }
    }
}

/// 删失操作结果.
pub type CensorResult<T> = Result<T, CensorError>;
