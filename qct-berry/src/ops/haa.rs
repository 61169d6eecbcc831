//! HAA (high attenuation area, 高衰减区).
//!
//! 吸气相 HU 落在闭区间内的肺内体素记 1. 阈值写进输出文件名,
//! 同一受试者不同阈值的结果可以并存.

use crate::consts::{class, hu};
use crate::data::{save_pair, CtScan, HeaderAttr, LobeMask};
use crate::error::Result;
use crate::lobar::report::LobarTable;
use crate::lobar::{classify, tally, ClassRule};
use crate::paths::CasePaths;

use super::OpOutcome;

/// HAA 运行参数.
#[derive(Debug, Clone, Copy)]
pub struct HaaConfig {
    /// 区间下限 (HU).
    pub lower: i32,
    /// 区间上限 (HU).
    pub upper: i32,
}

impl Default for HaaConfig {
    fn default() -> Self {
        Self {
            lower: hu::HAA_LOWER,
            upper: hu::HAA_UPPER,
        }
    }
}

impl HaaConfig {
    /// 输出文件用的标记: `HAA{lower}to{upper}`.
    pub fn tag(&self) -> String {
        format!("HAA{}to{}", self.lower, self.upper)
    }
}

/// 在吸气相上运行 HAA 分析.
///
/// 输出 `lobar_{tag}.txt` 与 `{tag}.img`, 几何沿用吸气相扫描.
pub fn run(case: &CasePaths, cfg: HaaConfig) -> Result<OpOutcome> {
    let scan = CtScan::open(case.scan(case.fixed()))?;
    let lobes = LobeMask::open(case.lobes(case.fixed())?)?;

    let map = classify(
        scan.data(),
        None,
        lobes.data(),
        ClassRule::Range {
            lower: cfg.lower as f32,
            upper: cfg.upper as f32,
        },
    )?;
    let counts = tally(map.view(), lobes.data(), class::PRIMARY)?;

    let stats = case.lobar_stats(&cfg.tag());
    LobarTable::new("total")
        .push_float("HAAratio", counts.ratios())
        .push_int("voxels_HAA", *counts.hits())
        .push_int("Voxels", *counts.voxels())
        .write(&stats)?;

    let image = case.derived_img(&cfg.tag());
    save_pair(&image, scan.header(), &map)?;

    Ok(OpOutcome { stats, image })
}
