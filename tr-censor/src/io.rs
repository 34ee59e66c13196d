//! 删失文件的持久化存储.
//!
//! 纯文本格式 (通常以 `.1D` 结尾) 每行一个整数, 没有表头. 读取时也接受每行多列的指示矩阵,
//! 以及只有一行、多列排布的序列.

use crate::indicator::reduce_owned;
use crate::{CensorError, CensorResult, InclusionSequence};
use ndarray::{ArrayD, ArrayView1, ArrayViewD, IxDyn};
use ndarray_npy::{read_npy, ReadNpyError};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// 解析删失文本.
///
/// 数值以空白 (空格或制表符) 分隔, 每行一个时间点; 空行与 `#` 开头的行被跳过.
/// 数值可以写成整数或浮点数 (如 `1.0`), 但只能取 0 或 1.
///
/// - 只有一列时返回一维数组;
/// - 只有一行时, 该行被视为按列排布的一维序列;
/// - 否则返回二维数组 (行数 x 列数). 各行列数不一致时返回 `CensorError::Parse`.
pub fn parse_censor_text(text: &str) -> CensorResult<ArrayD<u8>> {
    let mut data = Vec::new();
    let mut rows = 0;
    let mut cols = None;

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let before = data.len();
        for token in line.split_whitespace() {
            data.push(parse_value(token, line_no + 1, data.len())?);
        }
        let width = data.len() - before;
        match cols {
            None => cols = Some(width),
            Some(c) if c != width => {
                return Err(CensorError::Parse {
                    line: line_no + 1,
                    token: line.to_string(),
                })
            }
            _ => {}
        }
        rows += 1;
    }

    let shape = match (rows, cols.unwrap_or(1)) {
        (1, c) => vec![c],
        (r, 1) => vec![r],
        (r, c) => vec![r, c],
    };
    // 形状与元素个数一定匹配.
    ArrayD::from_shape_vec(IxDyn(&shape), data)
        .map_err(|_| CensorError::NotOneDimensional(shape.len()))
}

fn parse_value(token: &str, line: usize, index: usize) -> CensorResult<u8> {
    let v: f64 = token.parse().map_err(|_| CensorError::Parse {
        line,
        token: token.to_string(),
    })?;
    binary_value(v, index)
}

fn binary_value(v: f64, index: usize) -> CensorResult<u8> {
    if v == 0.0 || v == 1.0 {
        Ok(v as u8)
    } else {
        Err(CensorError::NonBinaryValue { index, value: v })
    }
}

/// 读取纯文本删失文件. 指示矩阵会被转换为删失序列.
pub fn read_censor_1d<P: AsRef<Path>>(path: P) -> CensorResult<InclusionSequence> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| CensorError::io(path, e))?;
    let seq = reduce_owned(parse_censor_text(&text)?)?;
    log::debug!("{}: read {} volumes", path.display(), seq.len());
    Ok(seq)
}

/// 将删失序列按每行一个整数的格式写入 `path`.
pub fn write_censor_1d<P: AsRef<Path>>(path: P, seq: ArrayView1<u8>) -> CensorResult<()> {
    let path = path.as_ref();
    let text = format_censor_1d(seq);
    fs::write(path, text).map_err(|e| CensorError::io(path, e))?;
    log::debug!("{}: wrote {} volumes", path.display(), seq.len());
    Ok(())
}

/// 删失序列的文本表示, 每行一个整数.
pub fn format_censor_1d(seq: ArrayView1<u8>) -> String {
    let mut s = String::with_capacity(seq.len() * 2);
    for v in seq.iter() {
        // 写入 `String` 不会失败.
        let _ = writeln!(s, "{v}");
    }
    s
}

/// 读取 `.npy` 删失文件. 一维或二维 (指示矩阵) 均可.
///
/// 元素类型可以是 `u8`, 或 numpy 默认的 `int64` / `float64`; 后两者的取值同样只能是 0 或 1.
/// 其余元素类型返回 `CensorError::ReadNpy`, 归为 `ErrorKind::InvalidInput`.
pub fn read_censor_npy<P: AsRef<Path>>(path: P) -> CensorResult<InclusionSequence> {
    let path = path.as_ref();
    let a = match read_npy::<_, ArrayD<u8>>(path) {
        Ok(a) => a,
        Err(ReadNpyError::WrongDescriptor(_)) => read_wide_npy(path)?,
        Err(e) => return Err(e.into()),
    };
    reduce_owned(a)
}

/// 依次尝试 `int64` 与 `float64`.
fn read_wide_npy(path: &Path) -> CensorResult<ArrayD<u8>> {
    match read_npy::<_, ArrayD<i64>>(path) {
        Ok(a) => return narrow(a.view(), |v| v as f64),
        Err(ReadNpyError::WrongDescriptor(_)) => {}
        Err(e) => return Err(e.into()),
    }
    let a: ArrayD<f64> = read_npy(path)?;
    narrow(a.view(), |v| v)
}

/// 逐元素 (按行展平的顺序) 检查并转换为 `u8`.
fn narrow<T: Copy>(a: ArrayViewD<T>, to_f64: impl Fn(T) -> f64) -> CensorResult<ArrayD<u8>> {
    let data = a
        .iter()
        .enumerate()
        .map(|(index, &v)| binary_value(to_f64(v), index))
        .collect::<CensorResult<Vec<u8>>>()?;
    ArrayD::from_shape_vec(a.raw_dim(), data)
        .map_err(|_| CensorError::NotOneDimensional(a.ndim()))
}

/// 将删失序列写为 `u8` 类型的 `.npy` 文件.
pub fn write_censor_npy<P: AsRef<Path>>(path: P, seq: ArrayView1<u8>) -> CensorResult<()> {
    ndarray_npy::write_npy(path.as_ref(), &seq)?;
    Ok(())
}
