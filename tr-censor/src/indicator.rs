//! `TR x 离群列` 指示矩阵与一维删失序列之间的转换.
//!
//! 指示矩阵中每一列对应一个离群 TR, 该 TR 所在行取 `1`, 其余行取 `0`.
//! 因此每一行至多只能有一列被置位.

use crate::consts::{is_binary, EXCLUDE, KEEP};
use crate::{CensorError, CensorResult, InclusionSequence};
use ndarray::{Array1, Array2, ArrayD, ArrayView1, ArrayView2, ArrayViewD, Ix1, Ix2};

/// 将指示矩阵按行做逻辑或, 化简为一维离群标记. 结果中 `1` 代表该行被置位.
///
/// 出现 0/1 以外的取值时返回 `CensorError::NonBinaryValue`
/// (`index` 为按行展平后的位置); 某一行多于一列被置位时返回
/// `CensorError::MalformedIndicator`. 没有列的矩阵化简为全 `0`.
pub fn reduce_indicator(m: ArrayView2<u8>) -> CensorResult<Array1<u8>> {
    let cols = m.ncols();
    let mut out = Array1::zeros(m.nrows());
    for (row, line) in m.rows().into_iter().enumerate() {
        let mut count = 0;
        for (col, &v) in line.iter().enumerate() {
            if !is_binary(v) {
                return Err(CensorError::NonBinaryValue {
                    index: row * cols + col,
                    value: v as f64,
                });
            }
            count += v as usize;
        }
        if count > 1 {
            return Err(CensorError::MalformedIndicator { row, count });
        }
        out[row] = count as u8;
    }
    Ok(out)
}

/// 将指示矩阵转换为删失序列: 被置位的行删除, 其余行保留.
pub fn indicator_to_inclusion(m: ArrayView2<u8>) -> CensorResult<InclusionSequence> {
    Ok(reduce_indicator(m)?.mapv(|flag| if flag == 1 { EXCLUDE } else { KEEP }))
}

/// 将删失序列展开为指示矩阵, 每个被删除的 TR 占一列.
///
/// 该操作是 `indicator_to_inclusion` 的逆操作. 调用方负责确保 `seq` 只包含 0/1.
pub fn inclusion_to_indicator(seq: ArrayView1<u8>) -> Array2<u8> {
    let rows: Vec<usize> = crate::expand::excluded_indices(seq);
    let mut m = Array2::zeros((seq.len(), rows.len()));
    for (col, &row) in rows.iter().enumerate() {
        m[(row, col)] = 1;
    }
    m
}

/// 接受一维删失序列或二维指示矩阵, 统一转换为删失序列.
///
/// 一维输入原样返回 (但会检查取值); 二维输入经 `indicator_to_inclusion` 转换;
/// 其它维数返回 `CensorError::NotOneDimensional`.
pub fn reduce_dyn(a: ArrayViewD<u8>) -> CensorResult<InclusionSequence> {
    match a.ndim() {
        1 => {
            let v = a.into_dimensionality::<Ix1>().map_err(|_| CensorError::NotOneDimensional(1))?;
            if let Some((index, &value)) = v.indexed_iter().find(|(_, v)| !is_binary(**v)) {
                return Err(CensorError::NonBinaryValue {
                    index,
                    value: value as f64,
                });
            }
            Ok(v.to_owned())
        }
        2 => {
            let m = a.into_dimensionality::<Ix2>().map_err(|_| CensorError::NotOneDimensional(2))?;
            indicator_to_inclusion(m)
        }
        n => Err(CensorError::NotOneDimensional(n)),
    }
}

/// 同 `reduce_dyn`, 但接受 owned 数组.
#[inline]
pub fn reduce_owned(a: ArrayD<u8>) -> CensorResult<InclusionSequence> {
    reduce_dyn(a.view())
}
