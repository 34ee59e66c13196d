#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供静息态/任务态 fMRI 时间点 (TR) 删失掩码的生成、扩展、读写与批量统计.
//!
//! 该 crate 只负责 "算出哪些 TR 应当保留", 不负责调用外部影像工具,
//! 也不负责集群作业调度.
//!
//! # 约定
//!
//! 1. 删失序列 (inclusion sequence) 中 `1` 代表保留, `0` 代表删除.
//!   见 [`consts::KEEP`], [`consts::EXCLUDE`].
//! 2. 所有操作都只会删除更多的 TR, 绝不会把已删除的 TR 恢复为保留.
//! 3. 输入不合法时返回 [`CensorError`], 不会产生部分结果.
//!
//! # 功能
//!
//! ### 删失掩码扩展 ✅
//!
//! 对每个被删除的 TR 向前、向后扩展若干个 TR, 再把两段删除区之间过短的保留段一并删除.
//!
//! 实现位于 `tr-censor/src/expand.rs`.
//!
//! ### 指示矩阵适配 ✅
//!
//! 将 `TR x 离群列` 形式的 0/1 指示矩阵化简为一维序列, 以及反向展开.
//!
//! 实现位于 `tr-censor/src/indicator.rs`.
//!
//! ### 基于 framewise displacement 的初始删失 ✅
//!
//! 从 fMRIPrep confounds 表读取 FD 列并按阈值删失.
//!
//! 实现位于 `tr-censor/src/fd.rs`.
//!
//! ### 删失文件读写 ✅
//!
//! 纯文本 (`.1D`, 每行一个整数) 与 `.npy` 两种格式.
//!
//! 实现位于 `tr-censor/src/io.rs`.
//!
//! ### 单个 run 的删失流程, 及批量统计 ✅
//!
//! 实现位于 `tr-censor/src/run.rs` 与 `tr-censor/src/audit.rs`.
//!
//! ### 离群 run 登记 ✅
//!
//! 保留 TR 过少或预处理图像过短的 run 被登记到 `runs_to_exclude.tsv`.
//!
//! 实现位于 `tr-censor/src/outlier.rs`.

use ndarray::Array1;

/// 删失序列. 每个元素对应一个 TR, `1` 保留, `0` 删除.
pub type InclusionSequence = Array1<u8>;

pub mod audit;
pub mod config;
pub mod consts;
mod error;
pub mod expand;
pub mod fd;
pub mod indicator;
pub mod io;
pub mod outlier;
pub mod prelude;
pub mod run;

pub use config::ExpansionConfig;
pub use error::{CensorError, CensorResult, ErrorKind};
pub use expand::{expand, expand_raw};
