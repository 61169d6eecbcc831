//! S* (归一化位移幅值).
//!
//! 位移幅值除以全肺体积变化的立方根. 体积差为负时立方根保号,
//! 整场随之取负, 不做回退.

use ndarray::Zip;

use crate::consts::lobe;
use crate::data::{save_pair, DispField, LobeMask};
use crate::error::Result;
use crate::lobar::report::LobarTable;
use crate::lobar::{ensure_same_shape, moments};
use crate::paths::CasePaths;
use crate::vida;

use super::OpOutcome;

/// 运行 S* 分析.
///
/// 位移场来自重采样 `.mhd`, 全肺体积来自两个呼吸相的 vida-histo 表;
/// 输出 `lobar_s_norm.txt` 与 `s_norm.img`, 几何由 MetaImage 元信息合成.
pub fn run(case: &CasePaths) -> Result<OpOutcome> {
    let disp = DispField::open(case.disp_field())?;
    let lobes = LobeMask::open(case.lobes(case.fixed())?)?;
    let v_in = vida::lung_volume_mm3(&case.histo(case.fixed()))?;
    let v_ex = vida::lung_volume_mm3(&case.histo(case.floating()))?;

    let mut field = disp.magnitude();
    ensure_same_shape("displacement vs lobes", field.dim(), lobes.data().dim())?;

    // mm / mm: S* 无量纲.
    let scale = (v_in - v_ex).cbrt();
    Zip::from(&mut field).and(lobes.data()).for_each(|v, &l| {
        *v = if lobe::is_lung(l) {
            (*v as f64 / scale) as f32
        } else {
            0.0
        };
    });

    let m = moments(field.view(), lobes.data())?;

    let stats = case.lobar_stats("s_norm");
    LobarTable::new("All")
        .push_float("sStar_m", *m.mean())
        .push_float("sStar_sd", *m.sd())
        .push_float("sStar_cv", *m.cv())
        .write(&stats)?;

    let image = case.derived_img("s_norm");
    save_pair(&image, &disp.to_header(), &field)?;

    Ok(OpOutcome { stats, image })
}
