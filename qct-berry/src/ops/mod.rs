//! 五个肺叶指标的完整流程.
//!
//! 每个子模块一个指标: 解析输入, 跑分类或场计算, 写统计表和
//! 派生体数据. 文件命名全部走 [`crate::paths`], 数组工作全部走
//! [`crate::lobar`].

pub mod airt;
pub mod emph_fsad;
pub mod haa;
pub mod rravc;
pub mod s_norm;

use std::path::PathBuf;

/// 一次指标运行写出的产物位置.
#[derive(Debug, Clone)]
pub struct OpOutcome {
    /// 肺叶统计表 (`lobar_*.txt`).
    pub stats: PathBuf,
    /// 派生体数据 (`.img`, 相邻 `.hdr`).
    pub image: PathBuf,
}
