//! 文件命名约定.
//!
//! 所有输入输出文件名都由受试者编号和两个呼吸相编号拼出,
//! 配准产物以 `{subj}_{floating}-TO-{subj}_{fixed}-SSTVD` 为公共前缀.

use std::path::{Path, PathBuf};

use crate::error::{QctError, Result};

/// 单个受试者一次配准分析涉及的全部文件位置.
///
/// `fixed` 通常是吸气相 (如 `IN0`), `floating` 是呼气相 (如 `EX0`).
#[derive(Debug, Clone)]
pub struct CasePaths {
    root: PathBuf,
    subj: String,
    fixed: String,
    floating: String,
}

impl CasePaths {
    /// 创建命名上下文. `root` 是该受试者文件所在目录.
    pub fn new<P, S1, S2, S3>(root: P, subj: S1, fixed: S2, floating: S3) -> Self
    where
        P: AsRef<Path>,
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self {
            root: root.as_ref().to_owned(),
            subj: subj.into(),
            fixed: fixed.into(),
            floating: floating.into(),
        }
    }

    /// 受试者编号.
    #[inline]
    pub fn subj(&self) -> &str {
        &self.subj
    }

    /// 固定相编号.
    #[inline]
    pub fn fixed(&self) -> &str {
        &self.fixed
    }

    /// 浮动相编号.
    #[inline]
    pub fn floating(&self) -> &str {
        &self.floating
    }

    /// 受试者目录.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 配准产物的公共前缀: `{subj}_{floating}-TO-{subj}_{fixed}-SSTVD`.
    pub fn reg_prefix(&self) -> String {
        format!(
            "{s}_{f2}-TO-{s}_{f1}-SSTVD",
            s = self.subj,
            f2 = self.floating,
            f1 = self.fixed
        )
    }

    fn join(&self, name: String) -> PathBuf {
        self.root.join(name)
    }

    /// 原始 CT 扫描: `{subj}_{phase}.img.gz`.
    pub fn scan(&self, phase: &str) -> PathBuf {
        self.join(format!("{}_{phase}.img.gz", self.subj))
    }

    /// 肺叶标签: `{subj}_{phase}_vida-lobes.img`, 不存在时回退 `.img.gz`.
    pub fn lobes(&self, phase: &str) -> Result<PathBuf> {
        probe_gz(self.join(format!("{}_{phase}_vida-lobes.img", self.subj)))
    }

    /// 配准后的浮动相扫描: `{prefix}.img.gz`.
    pub fn warped(&self) -> PathBuf {
        self.join(format!("{}.img.gz", self.reg_prefix()))
    }

    /// 气量差体数据: `{prefix}_airDiff.img`, 不存在时回退 `.img.gz`.
    pub fn air_diff(&self) -> Result<PathBuf> {
        probe_gz(self.join(format!("{}_airDiff.img", self.reg_prefix())))
    }

    /// 固定相气量体数据: `{prefix}_fixed_airVol.img`, 不存在时回退 `.img.gz`.
    pub fn fixed_air_vol(&self) -> Result<PathBuf> {
        probe_gz(self.join(format!("{}_fixed_airVol.img", self.reg_prefix())))
    }

    /// 重采样后的位移场: `{prefix}_disp_resample.mhd`.
    pub fn disp_field(&self) -> PathBuf {
        self.join(format!("{}_disp_resample.mhd", self.reg_prefix()))
    }

    /// VIDA 体积汇总表: `{subj}_{phase}_vida-histo.csv`.
    pub fn histo(&self, phase: &str) -> PathBuf {
        self.join(format!("{}_{phase}_vida-histo.csv", self.subj))
    }

    /// VIDA 气道测量表: `{subj}_{phase}_vida-airmeas.csv`.
    pub fn airmeas(&self, phase: &str) -> PathBuf {
        self.join(format!("{}_{phase}_vida-airmeas.csv", self.subj))
    }

    /// 肺叶统计表: `{prefix}_lobar_{tag}.txt`.
    pub fn lobar_stats(&self, tag: &str) -> PathBuf {
        self.join(format!("{}_lobar_{tag}.txt", self.reg_prefix()))
    }

    /// 派生体数据: `{prefix}_{tag}.img`.
    pub fn derived_img(&self, tag: &str) -> PathBuf {
        self.join(format!("{}_{tag}.img", self.reg_prefix()))
    }

    /// 上游配准管线输出的肺叶汇总表: `{prefix}_{tag}_Lobe.dat`.
    /// `tag` 为 `airDiff` / `fixed_tissue` / `jacob` / `ADI`.
    pub fn lobe_dat(&self, tag: &str) -> PathBuf {
        self.join(format!("{}_{tag}_Lobe.dat", self.reg_prefix()))
    }

    /// 聚合输出的单受试者 QCT 表: `{proj}_{subj}_{fixed}_{floating}_QCT.csv`.
    pub fn qct_csv(&self, proj: &str) -> PathBuf {
        self.join(format!(
            "{proj}_{}_{}_{}_QCT.csv",
            self.subj, self.fixed, self.floating
        ))
    }
}

/// 要求 `path` 存在, 否则报缺失输入.
pub fn require(path: PathBuf) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(QctError::MissingInput(path))
    }
}

/// `path` 存在时返回 `path`, 否则探测 `path.gz`. 两者都缺失时报错,
/// 错误中给出未加 `.gz` 的基础名.
pub fn probe_gz(path: PathBuf) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path);
    }
    let mut os = path.clone().into_os_string();
    os.push(".gz");
    let gz = PathBuf::from(os);
    if gz.is_file() {
        Ok(gz)
    } else {
        Err(QctError::MissingInput(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case() -> CasePaths {
        CasePaths::new("/data/ENV18PM_PMSN03001", "PMSN03001", "IN0", "EX0")
    }

    #[test]
    fn test_reg_prefix() {
        assert_eq!(case().reg_prefix(), "PMSN03001_EX0-TO-PMSN03001_IN0-SSTVD");
    }

    #[test]
    fn test_input_names() {
        let p = case();
        assert_eq!(
            p.scan("EX0"),
            PathBuf::from("/data/ENV18PM_PMSN03001/PMSN03001_EX0.img.gz")
        );
        assert_eq!(
            p.warped(),
            PathBuf::from(
                "/data/ENV18PM_PMSN03001/PMSN03001_EX0-TO-PMSN03001_IN0-SSTVD.img.gz"
            )
        );
        assert_eq!(
            p.disp_field(),
            PathBuf::from(
                "/data/ENV18PM_PMSN03001/PMSN03001_EX0-TO-PMSN03001_IN0-SSTVD_disp_resample.mhd"
            )
        );
        assert_eq!(
            p.histo("IN0"),
            PathBuf::from("/data/ENV18PM_PMSN03001/PMSN03001_IN0_vida-histo.csv")
        );
        assert_eq!(
            p.airmeas("IN0"),
            PathBuf::from("/data/ENV18PM_PMSN03001/PMSN03001_IN0_vida-airmeas.csv")
        );
    }

    #[test]
    fn test_output_names() {
        let p = case();
        assert_eq!(
            p.lobar_stats("AirT"),
            PathBuf::from(
                "/data/ENV18PM_PMSN03001/PMSN03001_EX0-TO-PMSN03001_IN0-SSTVD_lobar_AirT.txt"
            )
        );
        assert_eq!(
            p.lobar_stats("HAA-700to0"),
            PathBuf::from(
                "/data/ENV18PM_PMSN03001/PMSN03001_EX0-TO-PMSN03001_IN0-SSTVD_lobar_HAA-700to0.txt"
            )
        );
        assert_eq!(
            p.derived_img("Emph_fSAD"),
            PathBuf::from(
                "/data/ENV18PM_PMSN03001/PMSN03001_EX0-TO-PMSN03001_IN0-SSTVD_Emph_fSAD.img"
            )
        );
        assert_eq!(
            p.lobe_dat("airDiff"),
            PathBuf::from(
                "/data/ENV18PM_PMSN03001/PMSN03001_EX0-TO-PMSN03001_IN0-SSTVD_airDiff_Lobe.dat"
            )
        );
        assert_eq!(
            p.qct_csv("ENV18PM"),
            PathBuf::from("/data/ENV18PM_PMSN03001/ENV18PM_PMSN03001_IN0_EX0_QCT.csv")
        );
    }

    #[test]
    fn test_probe_gz() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("case_vida-lobes.img");

        // 两者都缺失: 报基础名.
        let err = probe_gz(base.clone()).unwrap_err();
        assert!(err.to_string().contains("case_vida-lobes.img"));

        // 只有 .gz.
        let mut os = base.clone().into_os_string();
        os.push(".gz");
        let gz = PathBuf::from(os);
        std::fs::write(&gz, b"x").unwrap();
        assert_eq!(probe_gz(base.clone()).unwrap(), gz);

        // 裸 .img 优先.
        std::fs::write(&base, b"x").unwrap();
        assert_eq!(probe_gz(base.clone()).unwrap(), base);
    }
}
