//! 气体潴留 (air trapping).
//!
//! 呼气相扫描中 HU 低于阈值的肺内体素记 1, 按呼气相肺叶聚合占比.

use crate::consts::{class, hu};
use crate::data::{save_pair, CtScan, HeaderAttr, LobeMask};
use crate::error::Result;
use crate::lobar::report::LobarTable;
use crate::lobar::{classify, tally, ClassRule};
use crate::paths::CasePaths;

use super::OpOutcome;

/// 气体潴留运行参数.
#[derive(Debug, Clone, Copy)]
pub struct AirtConfig {
    /// 潴留阈值 (HU), 低于其记潴留.
    pub threshold: i32,
}

impl Default for AirtConfig {
    fn default() -> Self {
        Self {
            threshold: hu::AIRTRAP,
        }
    }
}

/// 在呼气相上运行气体潴留分析.
///
/// 输出 `lobar_AirT.txt` 与 `AirT.img`, 几何沿用呼气相扫描.
pub fn run(case: &CasePaths, cfg: AirtConfig) -> Result<OpOutcome> {
    let scan = CtScan::open(case.scan(case.floating()))?;
    let lobes = LobeMask::open(case.lobes(case.floating())?)?;

    let map = classify(
        scan.data(),
        None,
        lobes.data(),
        ClassRule::Below {
            thr: cfg.threshold as f32,
        },
    )?;
    let counts = tally(map.view(), lobes.data(), class::PRIMARY)?;

    let stats = case.lobar_stats("AirT");
    LobarTable::new("total")
        .push_float("airtrapratio", counts.ratios())
        .push_int("voxels_trap", *counts.hits())
        .push_int("Voxels", *counts.voxels())
        .write(&stats)?;

    let image = case.derived_img("AirT");
    save_pair(&image, scan.header(), &map)?;

    Ok(OpOutcome { stats, image })
}
