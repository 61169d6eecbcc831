//! 肺叶统计引擎.
//!
//! 五个指标工具共享同一副骨架: 先做逐体素分类 (或连续场求值),
//! 再按肺叶编码聚合出六行统计表. 本模块只做数组层面的工作,
//! 文件读写在 [`report`] 与 `ops` 中.

pub mod report;

use ndarray::{Array3, ArrayView3, Zip};

use crate::consts::{class, lobe, LOBAR_ROWS};
use crate::error::{QctError, Result};

/// 逐体素分类规则.
#[derive(Debug, Clone, Copy)]
pub enum ClassRule {
    /// 低于阈值记一级分类 (气体潴留).
    Below {
        /// HU 阈值.
        thr: f32,
    },

    /// 两级互斥分类 (肺气肿 / fSAD): 主体数据低于 `emph` 记二级,
    /// 否则副体数据低于 `fsad` 记一级. 两级按构造互斥.
    TwoTier {
        /// 肺气肿阈值, 作用于主体数据.
        emph: f32,
        /// fSAD 阈值, 作用于副体数据.
        fsad: f32,
    },

    /// 闭区间分类 (HAA).
    Range {
        /// 区间下限.
        lower: f32,
        /// 区间上限.
        upper: f32,
    },
}

impl ClassRule {
    /// 该规则是否需要副体数据.
    #[inline]
    pub fn needs_secondary(&self) -> bool {
        matches!(self, Self::TwoTier { .. })
    }
}

/// 校验两个体数据形状一致, 不一致时带着双方形状报错.
pub(crate) fn ensure_same_shape(
    what: &'static str,
    lhs: (usize, usize, usize),
    rhs: (usize, usize, usize),
) -> Result<()> {
    if lhs == rhs {
        Ok(())
    } else {
        Err(QctError::ShapeMismatch {
            what,
            lhs: [lhs.0, lhs.1, lhs.2],
            rhs: [rhs.0, rhs.1, rhs.2],
        })
    }
}

/// 按 `rule` 做逐体素分类. 输出编码见 [`crate::consts::class`],
/// 肺外 (`lobes == 0`) 处恒为 0.
///
/// `secondary` 仅 [`ClassRule::TwoTier`] 使用; 该规则下缺省 panic.
/// 任何形状不一致在计算前返回错误.
pub fn classify(
    primary: ArrayView3<f32>,
    secondary: Option<ArrayView3<f32>>,
    lobes: ArrayView3<u8>,
    rule: ClassRule,
) -> Result<Array3<u8>> {
    ensure_same_shape("primary vs lobes", primary.dim(), lobes.dim())?;
    if let Some(sec) = secondary {
        ensure_same_shape("primary vs secondary", primary.dim(), sec.dim())?;
    }
    assert!(
        secondary.is_some() || !rule.needs_secondary(),
        "two-tier rule needs a secondary volume"
    );

    let mut out = Array3::<u8>::zeros(primary.raw_dim());
    match rule {
        ClassRule::Below { thr } => {
            Zip::from(&mut out)
                .and(primary)
                .and(lobes)
                .for_each(|o, &p, &l| {
                    if lobe::is_lung(l) && p < thr {
                        *o = class::PRIMARY;
                    }
                });
        }
        ClassRule::TwoTier { emph, fsad } => {
            // 入口处已断言副体数据存在.
            let sec = secondary.unwrap();
            Zip::from(&mut out)
                .and(primary)
                .and(sec)
                .and(lobes)
                .for_each(|o, &p, &s, &l| {
                    if !lobe::is_lung(l) {
                        return;
                    }
                    if p < emph {
                        *o = class::SECONDARY;
                    } else if s < fsad {
                        *o = class::PRIMARY;
                    }
                });
        }
        ClassRule::Range { lower, upper } => {
            Zip::from(&mut out)
                .and(primary)
                .and(lobes)
                .for_each(|o, &p, &l| {
                    if lobe::is_lung(l) && lower <= p && p <= upper {
                        *o = class::PRIMARY;
                    }
                });
        }
    }
    Ok(out)
}

/// 目标类体素在各肺叶中的计数.
///
/// 行 0..4 与五个肺叶编码对应, 行 5 为五行之和.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LobeCounts {
    hits: [u64; LOBAR_ROWS],
    voxels: [u64; LOBAR_ROWS],
}

impl LobeCounts {
    /// 各行命中体素数.
    #[inline]
    pub fn hits(&self) -> &[u64; LOBAR_ROWS] {
        &self.hits
    }

    /// 各行肺叶体素数.
    #[inline]
    pub fn voxels(&self) -> &[u64; LOBAR_ROWS] {
        &self.voxels
    }

    /// 各行命中占比. 空肺叶产生 NaN, 原样下传.
    pub fn ratios(&self) -> [f64; LOBAR_ROWS] {
        let mut out = [0.0; LOBAR_ROWS];
        for row in 0..LOBAR_ROWS {
            out[row] = self.hits[row] as f64 / self.voxels[row] as f64;
        }
        out
    }
}

/// 统计 `target` 类体素在各肺叶中的命中数与体素数.
///
/// 总计行是五个肺叶行的和, 不是占比的平均;
/// 肺内出现未知编码的体素不参与任何行.
pub fn tally(class_map: ArrayView3<u8>, lobes: ArrayView3<u8>, target: u8) -> Result<LobeCounts> {
    ensure_same_shape("class map vs lobes", class_map.dim(), lobes.dim())?;

    let mut counts = LobeCounts::default();
    Zip::from(class_map).and(lobes).for_each(|&c, &l| {
        if let Some(row) = lobe::row_of(l) {
            counts.voxels[row] += 1;
            if c == target {
                counts.hits[row] += 1;
            }
        }
    });

    let hits_total: u64 = counts.hits[..5].iter().sum();
    let voxels_total: u64 = counts.voxels[..5].iter().sum();
    counts.hits[5] = hits_total;
    counts.voxels[5] = voxels_total;
    Ok(counts)
}

/// 连续场按肺叶聚合的均值 / 标准差 / 变异系数.
///
/// 总计行的均值是五个肺叶均值的算术平均, 标准差却是全部肺内体素上的
/// 总体标准差. 两者口径不一致, 但下游一直按这一定义比对历史数据,
/// 必须原样保留.
#[derive(Debug, Clone, Copy)]
pub struct LobeMoments {
    mean: [f64; LOBAR_ROWS],
    sd: [f64; LOBAR_ROWS],
    cv: [f64; LOBAR_ROWS],
}

impl LobeMoments {
    /// 各行均值.
    #[inline]
    pub fn mean(&self) -> &[f64; LOBAR_ROWS] {
        &self.mean
    }

    /// 各行标准差 (总体).
    #[inline]
    pub fn sd(&self) -> &[f64; LOBAR_ROWS] {
        &self.sd
    }

    /// 各行变异系数 (sd / mean).
    #[inline]
    pub fn cv(&self) -> &[f64; LOBAR_ROWS] {
        &self.cv
    }
}

/// 两趟扫描计算连续场的肺叶统计.
///
/// 空肺叶的行或零均值下的变异系数是非有限值, 原样写入结果,
/// 绝不折叠成 0, 下游靠它识别退化肺叶.
pub fn moments(field: ArrayView3<f32>, lobes: ArrayView3<u8>) -> Result<LobeMoments> {
    ensure_same_shape("field vs lobes", field.dim(), lobes.dim())?;

    // 第一趟: 各肺叶与全肺的和与计数.
    let mut sum = [0.0f64; 5];
    let mut count = [0u64; 5];
    let mut lung_sum = 0.0f64;
    let mut lung_count = 0u64;
    Zip::from(field).and(lobes).for_each(|&v, &l| {
        if !lobe::is_lung(l) {
            return;
        }
        lung_sum += v as f64;
        lung_count += 1;
        if let Some(row) = lobe::row_of(l) {
            sum[row] += v as f64;
            count[row] += 1;
        }
    });

    let mut mean = [f64::NAN; LOBAR_ROWS];
    for row in 0..5 {
        mean[row] = sum[row] / count[row] as f64;
    }
    mean[5] = mean[..5].iter().sum::<f64>() / 5.0;
    let lung_mean = lung_sum / lung_count as f64;

    // 第二趟: 离差平方和.
    let mut ssd = [0.0f64; 5];
    let mut lung_ssd = 0.0f64;
    Zip::from(field).and(lobes).for_each(|&v, &l| {
        if !lobe::is_lung(l) {
            return;
        }
        let d = v as f64 - lung_mean;
        lung_ssd += d * d;
        if let Some(row) = lobe::row_of(l) {
            let d = v as f64 - mean[row];
            ssd[row] += d * d;
        }
    });

    let mut sd = [f64::NAN; LOBAR_ROWS];
    for row in 0..5 {
        sd[row] = (ssd[row] / count[row] as f64).sqrt();
    }
    sd[5] = (lung_ssd / lung_count as f64).sqrt();

    let mut cv = [f64::NAN; LOBAR_ROWS];
    for row in 0..LOBAR_ROWS {
        cv[row] = sd[row] / mean[row];
    }

    Ok(LobeMoments { mean, sd, cv })
}
