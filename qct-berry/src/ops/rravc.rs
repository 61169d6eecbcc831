//! RRAVC (relative regional air volume change, 相对区域气量变化).
//!
//! 逐体素气量变化率除以全图总变化率. 0/0 体素在归一前记 0,
//! 其余非有限值原样保留; 肺外写哨兵值 -100.

use ndarray::{Array3, ArrayView3, Zip};

use crate::consts::{lobe, RRAVC_BACKGROUND};
use crate::data::{save_pair, CtScan, HeaderAttr, LobeMask};
use crate::error::Result;
use crate::lobar::report::LobarTable;
use crate::lobar::{ensure_same_shape, moments};
use crate::paths::CasePaths;

use super::OpOutcome;

/// 归一化的 RRAVC 场.
///
/// 分母是不掩膜的全图 sum(airdiff)/sum(fixed), 肺外体素也计入.
fn rravc_field(
    airdiff: ArrayView3<f32>,
    fixed: ArrayView3<f32>,
    lobes: ArrayView3<u8>,
) -> Result<Array3<f32>> {
    ensure_same_shape("airdiff vs fixed airVol", airdiff.dim(), fixed.dim())?;
    ensure_same_shape("airdiff vs lobes", airdiff.dim(), lobes.dim())?;

    let diff_sum: f64 = airdiff.iter().map(|&v| v as f64).sum();
    let fixed_sum: f64 = fixed.iter().map(|&v| v as f64).sum();
    let den = diff_sum / fixed_sum;

    let mut out = Array3::<f32>::zeros(airdiff.raw_dim());
    Zip::from(&mut out)
        .and(airdiff)
        .and(fixed)
        .and(lobes)
        .for_each(|o, &d, &f, &l| {
            if !lobe::is_lung(l) {
                *o = RRAVC_BACKGROUND;
                return;
            }
            let mut num = d as f64 / f as f64;
            if num.is_nan() {
                num = 0.0;
            }
            *o = (num / den) as f32;
        });
    Ok(out)
}

/// 运行 RRAVC 分析.
///
/// 输入为配准管线的 airDiff 与 fixed_airVol 体数据加吸气相肺叶;
/// 输出 `lobar_RRAVC.txt` 与 `RRAVC.img`, 几何沿用 fixed_airVol.
pub fn run(case: &CasePaths) -> Result<OpOutcome> {
    let fixed = CtScan::open(case.fixed_air_vol()?)?;
    let airdiff = CtScan::open(case.air_diff()?)?;
    let lobes = LobeMask::open(case.lobes(case.fixed())?)?;

    let field = rravc_field(airdiff.data(), fixed.data(), lobes.data())?;
    let m = moments(field.view(), lobes.data())?;

    let stats = case.lobar_stats("RRAVC");
    LobarTable::new("All")
        .push_float("RRAVC_m", *m.mean())
        .push_float("RRAVC_sd", *m.sd())
        .push_float("RRAVC_cv", *m.cv())
        .write(&stats)?;

    let image = case.derived_img("RRAVC");
    save_pair(&image, fixed.header(), &field)?;

    Ok(OpOutcome { stats, image })
}
