//! 气道测量的派生量.
//!
//! 圆度, 分支夹角, 以及按人口学预测值归一的壁厚与水力直径.
//! 预测回归分美国与韩国两套, 系数来自已发表的队列拟合.

use std::f64::consts::PI;

use super::demo::DemoRow;
use crate::vida::BranchRow;

/// 截面圆度: 4πA / P². 正圆为 1, 越扁越小.
pub fn circularity(branch: &BranchRow) -> f64 {
    let a = branch.inner_area();
    let p = branch.inner_perimeter();
    4.0 * PI * a / (p * p)
}

/// 两个方向余弦向量的夹角 (度).
///
/// 点积不做定义域截断: 输入未归一化时可能得到 NaN, 原样下传.
pub fn vector_angle_deg(v1: [f64; 3], v2: [f64; 3]) -> f64 {
    let dot = v1[0] * v2[0] + v1[1] * v2[1] + v1[2] * v2[2];
    dot.acos().to_degrees()
}

/// 预测壁厚 (mm).
pub fn wt_pred(demo: &DemoRow, kor: bool) -> f64 {
    let age = demo.age_yr();
    let g = demo.gender_m0f1();
    let h = demo.height_m();
    if kor {
        (9.11 - 1.02 * age.log10() - 0.98 * h * h * g + 1.01 * h * h * age.log10()).log10()
    } else {
        4.5493 - 0.5007 * g + 0.3007 * age.log10() * h
    }
}

/// 预测水力直径 (mm).
pub fn dh_pred(demo: &DemoRow, kor: bool) -> f64 {
    let age = demo.age_yr();
    let g = demo.gender_m0f1();
    let h = demo.height_m();
    if kor {
        12.79 - 0.13 * age.log10() - 5.82 * h.log10() * g + 3.01 * age.log10() * h
    } else {
        16.446 - 2.4019 * g - 0.298809 * g * age + 0.0284836 * age * h + 0.1786604 * g * age * h
    }
}

/// 归一化壁厚: 实测壁厚 / 预测壁厚.
pub fn wt_norm(branch: &BranchRow, demo: &DemoRow, kor: bool) -> f64 {
    branch.wall_thickness() / wt_pred(demo, kor)
}

/// 归一化水力直径: (4A/P) / 预测直径.
pub fn dh_norm(branch: &BranchRow, demo: &DemoRow, kor: bool) -> f64 {
    let dh = 4.0 * branch.inner_area() / branch.inner_perimeter();
    dh / dh_pred(demo, kor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_branch(area: f64, perim: f64, wall: f64) -> BranchRow {
        let text = format!(
            "anatomicalName,avgInnerArea,avgInnerPerimeter,avgAvgWallThickness,dirCosX,dirCosY,dirCosZ\n\
             X,{area},{perim},{wall},1,0,0\n"
        );
        csv::Reader::from_reader(text.as_bytes())
            .deserialize()
            .next()
            .unwrap()
            .unwrap()
    }

    fn sample_demo(age: f64, gender: f64, height: f64) -> DemoRow {
        let text = format!(
            "Subj,Age_yr,Gender_m0f1,Height_m,Weight_kg\nS,{age},{gender},{height},70\n"
        );
        csv::Reader::from_reader(text.as_bytes())
            .deserialize()
            .next()
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_circularity_of_circle_is_one() {
        // r = 3 的正圆: A = 9π, P = 6π.
        let b = sample_branch(9.0 * PI, 6.0 * PI, 1.0);
        assert!((circularity(&b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_vector_angle() {
        assert!((vector_angle_deg([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]) - 90.0).abs() < 1e-9);
        assert!(vector_angle_deg([1.0, 0.0, 0.0], [1.0, 0.0, 0.0]).abs() < 1e-9);
        // 未归一化输入把点积推出 [-1, 1], 结果为 NaN.
        assert!(vector_angle_deg([1.1, 0.0, 0.0], [1.0, 0.0, 0.0]).is_nan());
    }

    #[test]
    fn test_us_predictors() {
        // age = 100 (log10 = 2), 女性, 身高 1 m: 手算值.
        let d = sample_demo(100.0, 1.0, 1.0);
        assert!((wt_pred(&d, false) - 4.65).abs() < 1e-9);
        assert!((dh_pred(&d, false) - 4.8776).abs() < 1e-9);
    }

    #[test]
    fn test_kor_predictors() {
        let d = sample_demo(100.0, 1.0, 1.0);
        // 内层: 9.11 - 2.04 - 0.98 + 2.02 = 8.11.
        assert!((wt_pred(&d, true) - 8.11f64.log10()).abs() < 1e-9);
        // 12.79 - 0.26 - 0 + 6.02 = 18.55.
        assert!((dh_pred(&d, true) - 18.55).abs() < 1e-9);
    }

    #[test]
    fn test_normalized_measures() {
        let d = sample_demo(100.0, 1.0, 1.0);
        let b = sample_branch(100.0, 40.0, 2.0);
        assert!((wt_norm(&b, &d, false) - 2.0 / 4.65).abs() < 1e-9);
        // Dh = 4 * 100 / 40 = 10.
        assert!((dh_norm(&b, &d, false) - 10.0 / 4.8776).abs() < 1e-9);
    }

    #[test]
    fn test_missing_demographics_propagate_nan() {
        let text = "Subj,Age_yr,Gender_m0f1,Height_m,Weight_kg\nS,,1,1.0,70\n";
        let d: DemoRow = csv::Reader::from_reader(text.as_bytes())
            .deserialize()
            .next()
            .unwrap()
            .unwrap();
        assert!(wt_pred(&d, false).is_nan());
        assert!(dh_pred(&d, true).is_nan());
    }
}
