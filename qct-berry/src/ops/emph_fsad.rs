//! 肺气肿与 fSAD (功能性小气道病变).
//!
//! 吸气相低于肺气肿阈值的体素记 2; 其余体素若配准后呼气相低于
//! fSAD 阈值则记 1. 两类互斥, 分母同为吸气相肺叶体素数.

use crate::consts::{class, hu};
use crate::data::{save_pair, CtScan, HeaderAttr, LobeMask};
use crate::error::Result;
use crate::lobar::report::LobarTable;
use crate::lobar::{classify, tally, ClassRule};
use crate::paths::CasePaths;

use super::OpOutcome;

/// 肺气肿 / fSAD 运行参数.
#[derive(Debug, Clone, Copy)]
pub struct EmphFsadConfig {
    /// 肺气肿阈值 (HU), 作用于吸气相.
    pub emph: i32,
    /// fSAD 阈值 (HU), 作用于配准后呼气相.
    pub fsad: i32,
}

impl Default for EmphFsadConfig {
    fn default() -> Self {
        Self {
            emph: hu::EMPH,
            fsad: hu::FSAD,
        }
    }
}

/// 在吸气相几何上运行肺气肿 / fSAD 分析.
///
/// 输出 `lobar_Emph_fSAD.txt` 与 `Emph_fSAD.img`, 几何沿用吸气相扫描.
pub fn run(case: &CasePaths, cfg: EmphFsadConfig) -> Result<OpOutcome> {
    let scan = CtScan::open(case.scan(case.fixed()))?;
    let lobes = LobeMask::open(case.lobes(case.fixed())?)?;
    let warped = CtScan::open(case.warped())?;

    let map = classify(
        scan.data(),
        Some(warped.data()),
        lobes.data(),
        ClassRule::TwoTier {
            emph: cfg.emph as f32,
            fsad: cfg.fsad as f32,
        },
    )?;
    let emph = tally(map.view(), lobes.data(), class::SECONDARY)?;
    let fsad = tally(map.view(), lobes.data(), class::PRIMARY)?;

    let stats = case.lobar_stats("Emph_fSAD");
    LobarTable::new("Total")
        .push_float("Emphysratio", emph.ratios())
        .push_int("voxels_Emphys", *emph.hits())
        .push_float("fSADratio", fsad.ratios())
        .push_int("voxels_fSAD", *fsad.hits())
        .push_int("VoxelsAll", *emph.voxels())
        .write(&stats)?;

    let image = case.derived_img("Emph_fSAD");
    save_pair(&image, scan.header(), &map)?;

    Ok(OpOutcome { stats, image })
}
