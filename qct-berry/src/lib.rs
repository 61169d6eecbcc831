#![warn(missing_docs)]

//! 肺部 QCT 配准分析核心库.
//!
//! 面向吸气/呼气双相 CT 及其配准产物, 在肺叶粒度上做体素级定量
//! 分析. 提供五个指标和一个聚合器:
//!
//! - **AirT**: 呼气相气体潴留占比 (HU 阈值分类).
//! - **Emph / fSAD**: 吸气相肺气肿与配准呼气相功能性小气道病变,
//!   两级互斥分类.
//! - **HAA**: 高衰减区占比 (HU 闭区间分类).
//! - **RRAVC**: 气量变化的相对区域分布, 全肺归一化的连续场.
//! - **S\***: 位移场模长经肺体积变化立方根归一后的无量纲形变量.
//! - **extract**: 把上述统计表与配准/VIDA 汇总表聚合成受试者宽表.
//!
//! # 数据约定
//!
//! 体数据是双文件 nii (`.hdr` + `.img[.gz]`) 或 MetaImage (`.mhd`),
//! 文件名全部由 [`paths::CasePaths`] 按受试者和呼吸相拼装; 肺叶
//! 标签以 2 的幂编码, 见 [`consts::lobe`]. 每个指标落盘两件产物:
//! 六行 (`Lobe0..Lobe4` 加总计) 统计表和派生体数据.
//!
//! # 骨架
//!
//! 五个指标共享 [`lobar`] 里同一套分类/聚合引擎, 各自的输入组合,
//! 阈值与列名在 [`ops`]; 聚合器在 [`extract`]. 非期望输入以
//! [`QctError`] 尽早报错; 统计退化 (空肺叶, 零均值) 不是错误,
//! NaN / inf 按字面落表.

/// 体数据基础结构: 双文件 nii 与 MetaImage 位移场.
mod data;

pub use data::{save_pair, BoxedHeader, CtScan, DispField, HeaderAttr, LobeMask};

pub mod consts;
pub mod error;

pub use error::{QctError, Result};

pub mod extract;
pub mod lobar;
pub mod ops;
pub mod paths;
pub mod vida;

pub use paths::CasePaths;

pub mod prelude;
