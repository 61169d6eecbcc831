//! QCT 变量聚合.
//!
//! 扫描项目目录下的 `{proj}_{subj}` 受试者目录, 从肺叶统计表,
//! 配准汇总表, VIDA 气道表与人口学表中抽取变量拼成一行宽表:
//! 先写单受试者 CSV, 再把全部受试者按列并集合并成总表.
//!
//! 输入表缺失只是跳过对应列族; 表存在但损坏则告警并丢弃该
//! 受试者, 不影响其余受试者.

pub mod airway;
pub mod demo;

use std::fs;
use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::consts::lobe;
use crate::error::Result;
use crate::lobar::report::LobarFile;
use crate::ops::haa::HaaConfig;
use crate::paths::CasePaths;
use crate::vida::AirwayMeasures;

use demo::{DemoRow, Demographics};

/// 气道列族涉及的分支: (输出名, vida-airmeas 表内解剖名).
const BRANCHES: [(&str, &str); 8] = [
    ("Trachea", "Trachea"),
    ("RMB", "RMB"),
    ("LMB", "LMB"),
    ("LLB", "LLB"),
    ("BI", "BronInt"),
    ("sLUL", "LUL"),
    ("sRUL", "RUL"),
    ("sRLL", "RLL"),
];

/// 聚合一个项目的运行配置.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// 项目目录, 其下是 `{proj}_{subj}` 受试者目录.
    pub proj_dir: PathBuf,
    /// 人口学表位置. 允许不存在.
    pub demo_csv: PathBuf,
    /// 项目编号.
    pub proj: String,
    /// 固定相编号.
    pub img0: String,
    /// 浮动相编号.
    pub img1: String,
    /// 随访期标签, 拼进时间型变量名.
    pub fu: String,
    /// 壁厚/水力直径预测回归用韩国系数.
    pub kor: bool,
}

impl ExtractConfig {
    /// 创建配置, 呼吸相与随访期取惯用默认: `IN0` / `EX0` / `T0`,
    /// 预测回归用美国系数.
    pub fn new<P1, P2, S>(proj_dir: P1, demo_csv: P2, proj: S) -> Self
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
        S: Into<String>,
    {
        Self {
            proj_dir: proj_dir.as_ref().to_owned(),
            demo_csv: demo_csv.as_ref().to_owned(),
            proj: proj.into(),
            img0: "IN0".to_owned(),
            img1: "EX0".to_owned(),
            fu: "T0".to_owned(),
            kor: false,
        }
    }
}

/// 一次聚合运行的产物位置.
#[derive(Debug, Clone)]
pub struct ExtractOutcome {
    /// 成功受试者的单受试者 CSV, 按受试者编号排序.
    pub per_subject: Vec<PathBuf>,
    /// 合并总表. 没有任何成功受试者时不写, 为 `None`.
    pub combined: Option<PathBuf>,
}

/// 跑完整个项目.
pub fn run(cfg: &ExtractConfig) -> Result<ExtractOutcome> {
    let demo = load_demo(&cfg.demo_csv)?;
    let subjects = scan_subjects(&cfg.proj_dir, &cfg.proj)?;
    if subjects.is_empty() {
        log::warn!(
            "no {}_* subject directories in {}",
            cfg.proj,
            cfg.proj_dir.display()
        );
    }

    let mut rows = Vec::new();
    let mut per_subject = Vec::new();
    for subj in &subjects {
        let dir = cfg.proj_dir.join(format!("{}_{subj}", cfg.proj));
        let case = CasePaths::new(&dir, subj.as_str(), cfg.img0.as_str(), cfg.img1.as_str());
        let person = demo.as_ref().and_then(|d| d.subject(subj));

        let assembled = assemble(cfg, &case, person).and_then(|row| {
            let path = case.qct_csv(&cfg.proj);
            row.write(&path)?;
            Ok((row, path))
        });
        match assembled {
            Ok((row, path)) => {
                rows.push(row);
                per_subject.push(path);
            }
            Err(err) => log::warn!("{subj}: {err}; subject dropped"),
        }
    }

    let combined = if rows.is_empty() {
        None
    } else {
        let path = cfg
            .proj_dir
            .join(format!("{}_{}_{}_QCT_all.csv", cfg.proj, cfg.img0, cfg.img1));
        write_union_csv(&path, &rows)?;
        Some(path)
    };
    Ok(ExtractOutcome {
        per_subject,
        combined,
    })
}

/// 读人口学表. 文件不存在时告警并继续, 之后所有人口学相关列取 `na`.
fn load_demo(path: &Path) -> Result<Option<Demographics>> {
    if path.is_file() {
        Ok(Some(Demographics::open(path)?))
    } else {
        log::warn!(
            "{} not found; extracting without demographics",
            path.display()
        );
        Ok(None)
    }
}

/// 列出项目内全部受试者编号, 排序后返回.
///
/// 受试者目录名按 `_` 切分, 首段等于项目编号时第二段即受试者编号;
/// 普通文件与不带受试者段的目录名跳过.
fn scan_subjects(proj_dir: &Path, proj: &str) -> Result<Vec<String>> {
    let mut subjects = Vec::new();
    for entry in fs::read_dir(proj_dir)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name();
        let name = match name.to_str() {
            Some(n) => n,
            None => continue,
        };
        let mut parts = name.split('_');
        if parts.next() != Some(proj) {
            continue;
        }
        if let Some(subj) = parts.next() {
            if !subj.is_empty() {
                subjects.push(subj.to_owned());
            }
        }
    }
    subjects.sort();
    Ok(subjects)
}

/// 拼一个受试者的全部变量. 列序即插入序, 与历史表保持一致.
fn assemble(cfg: &ExtractConfig, case: &CasePaths, person: Option<&DemoRow>) -> Result<VarRow> {
    let mut row = VarRow::new(&cfg.proj, case.subj());

    match person {
        Some(p) => {
            row.push_num("Age_yr".to_owned(), p.age_yr());
            row.push_num("Gender_m0f1".to_owned(), p.gender_m0f1());
            row.push_num("Height_m".to_owned(), p.height_m());
            row.push_num("Weight_kg".to_owned(), p.weight_kg());
        }
        None => {
            for name in ["Age_yr", "Gender_m0f1", "Height_m", "Weight_kg"] {
                row.push(name.to_owned(), "na".to_owned());
            }
        }
    }

    // 通气分布: 肺叶气量差及上/中/下分布比.
    if let Some(vent) = open_optional(case.lobe_dat("airDiff"))? {
        let t = vent.column("total")?;
        row.push_num(
            format!("dAV_U_ML_{}", cfg.fu),
            (t[0] + t[2]) / (t[1] + t[3] + t[4]),
        );
        row.push_num(
            format!("dAV_UM_L_{}", cfg.fu),
            (t[0] + t[2] + t[3]) / (t[1] + t[4]),
        );
        for (i, name) in lobe::NAMES.iter().enumerate() {
            row.push_num(format!("dAV_x{name}_{}", cfg.fu), t[i] / t[5]);
        }
    }

    // 固定相组织分数.
    if let Some(tf) = open_optional(case.lobe_dat("fixed_tissue"))? {
        push_family(&mut row, &tf, "average", "TF", &cfg.img0)?;
    }

    // 肺气肿与 fSAD. 旧流水线落盘名是 lobar_Emphys.txt, 作为回退.
    let emph_path = {
        let primary = case.lobar_stats("Emph_fSAD");
        if primary.is_file() {
            primary
        } else {
            case.lobar_stats("Emphys")
        }
    };
    if let Some(emph) = open_optional(emph_path)? {
        push_family(&mut row, &emph, "Emphysratio", "Emph", &cfg.fu)?;
        push_family(&mut row, &emph, "fSADratio", "fSAD", &cfg.fu)?;
    }

    if let Some(airt) = open_optional(case.lobar_stats("AirT"))? {
        push_family(&mut row, &airt, "airtrapratio", "AirT", &cfg.fu)?;
    }
    if let Some(rravc) = open_optional(case.lobar_stats("RRAVC"))? {
        push_family(&mut row, &rravc, "RRAVC_m", "RRAVC", &cfg.fu)?;
    }
    if let Some(s_norm) = open_optional(case.lobar_stats("s_norm"))? {
        push_family(&mut row, &s_norm, "sStar_m", "sStar", &cfg.fu)?;
    }
    if let Some(haa) = open_optional(case.lobar_stats(&HaaConfig::default().tag()))? {
        push_family(&mut row, &haa, "HAAratio", "HAA", &cfg.fu)?;
    }
    if let Some(jacob) = open_optional(case.lobe_dat("jacob"))? {
        push_family(&mut row, &jacob, "average", "J", &cfg.fu)?;
    }
    if let Some(adi) = open_optional(case.lobe_dat("ADI"))? {
        push_family(&mut row, &adi, "average", "ADI", &cfg.fu)?;
    }

    // 气道列族: 分叉角, 圆度, 归一化壁厚与水力直径.
    let airmeas_path = case.airmeas(&cfg.img0);
    if airmeas_path.is_file() {
        let meas = AirwayMeasures::open(&airmeas_path)?;
        row.push_num(
            format!("Angle_eTrachea_{}", cfg.img0),
            angle_between(&meas, "RMB", "LMB"),
        );
        row.push_num(
            format!("Angle_eRMB_{}", cfg.img0),
            angle_between(&meas, "RUL", "BronInt"),
        );
        for (out, branch) in BRANCHES {
            let c = meas
                .branch(branch)
                .map(airway::circularity)
                .unwrap_or(f64::NAN);
            row.push_num(format!("Cr_{out}_{}", cfg.img0), c);
        }
        // 预测回归要人口学信息, 缺人口学时整族占位 na.
        match person {
            Some(p) => {
                for (out, branch) in BRANCHES {
                    let v = meas
                        .branch(branch)
                        .map(|b| airway::wt_norm(b, p, cfg.kor))
                        .unwrap_or(f64::NAN);
                    row.push_num(format!("WTn_{out}_{}", cfg.img0), v);
                }
                for (out, branch) in BRANCHES {
                    let v = meas
                        .branch(branch)
                        .map(|b| airway::dh_norm(b, p, cfg.kor))
                        .unwrap_or(f64::NAN);
                    row.push_num(format!("Dhn_{out}_{}", cfg.img0), v);
                }
            }
            None => {
                for (out, _) in BRANCHES {
                    row.push(format!("WTn_{out}_{}", cfg.img0), "na".to_owned());
                }
                for (out, _) in BRANCHES {
                    row.push(format!("Dhn_{out}_{}", cfg.img0), "na".to_owned());
                }
            }
        }
    }

    Ok(row)
}

/// 按统一命名推一族六列: `{prefix}_All` 在前, 随后五个肺叶.
fn push_family(
    row: &mut VarRow,
    table: &LobarFile,
    col: &str,
    prefix: &str,
    suffix: &str,
) -> Result<()> {
    let v = table.column(col)?;
    row.push_num(format!("{prefix}_All_{suffix}"), v[5]);
    for (i, name) in lobe::NAMES.iter().enumerate() {
        row.push_num(format!("{prefix}_{name}_{suffix}"), v[i]);
    }
    Ok(())
}

/// 两条分支中轴的夹角. 任一分支缺席取 NaN.
fn angle_between(meas: &AirwayMeasures, a: &str, b: &str) -> f64 {
    match (meas.branch(a), meas.branch(b)) {
        (Some(a), Some(b)) => airway::vector_angle_deg(a.direction(), b.direction()),
        _ => f64::NAN,
    }
}

/// `path` 存在则读成统计表, 不存在按列族缺席处理.
fn open_optional(path: PathBuf) -> Result<Option<LobarFile>> {
    if path.is_file() {
        Ok(Some(LobarFile::open(&path)?))
    } else {
        Ok(None)
    }
}

/// 一个受试者的一行宽表, 列序即插入序.
///
/// 数值单元: NaN 写空串, ±inf 按字面写出, 其余按十进制最短表示.
#[derive(Debug, Clone)]
struct VarRow {
    cols: Vec<(String, String)>,
}

impl VarRow {
    fn new(proj: &str, subj: &str) -> Self {
        let mut row = Self { cols: Vec::new() };
        row.push("Proj".to_owned(), proj.to_owned());
        row.push("Subj".to_owned(), subj.to_owned());
        row
    }

    fn push(&mut self, name: String, cell: String) {
        self.cols.push((name, cell));
    }

    fn push_num(&mut self, name: String, value: f64) {
        let cell = if value.is_nan() {
            String::new()
        } else {
            format!("{value}")
        };
        self.push(name, cell);
    }

    fn names(&self) -> impl Iterator<Item = &String> {
        self.cols.iter().map(|(name, _)| name)
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.cols
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, cell)| cell.as_str())
    }

    fn write(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(self.names())?;
        wtr.write_record(self.cols.iter().map(|(_, cell)| cell))?;
        wtr.flush()?;
        Ok(())
    }
}

/// 合并所有受试者: 列取并集, 序按首次出现; 某受试者缺的列留空.
fn write_union_csv(path: &Path, rows: &[VarRow]) -> Result<()> {
    let names: Vec<&String> = rows.iter().flat_map(VarRow::names).unique().collect();

    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&names)?;
    for row in rows {
        let record: Vec<&str> = names
            .iter()
            .map(|name| row.get(name.as_str()).unwrap_or(""))
            .collect();
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    use std::fs;

    use crate::lobar::report::LobarTable;

    const AIRMEAS_HEADER: &str =
        "anatomicalName,avgInnerArea,avgInnerPerimeter,avgAvgWallThickness,dirCosX,dirCosY,dirCosZ\n";

    /// 配准流水线风格的 `*_Lobe.dat`: 带行索引列的 `total average` 表.
    fn write_dat(path: &Path, totals: [f64; 6], averages: [f64; 6]) {
        let mut text = String::from("total average\n");
        for row in 0..6 {
            text.push_str(&format!("{row} {} {}\n", totals[row], averages[row]));
        }
        fs::write(path, text).unwrap();
    }

    fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        let header = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        let rows = rdr
            .records()
            .map(|r| r.unwrap().iter().map(str::to_owned).collect())
            .collect();
        (header, rows)
    }

    fn cell<'a>(header: &[String], row: &'a [String], name: &str) -> &'a str {
        let idx = header.iter().position(|h| h == name).unwrap();
        row[idx].as_str()
    }

    fn num(header: &[String], row: &[String], name: &str) -> f64 {
        cell(header, row, name).parse().unwrap()
    }

    #[test]
    fn test_extract_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        fs::write(
            root.join("demo.csv"),
            "Subj,Age_yr,Gender_m0f1,Height_m,Weight_kg\nSUBA,64,1,1.6,60\n",
        )
        .unwrap();

        // SUBA: 除 ADI 外所有列族齐备, Emph 表用旧名回退.
        let a = root.join("TESTPJ_SUBA");
        fs::create_dir(&a).unwrap();
        let ca = CasePaths::new(&a, "SUBA", "IN0", "EX0");
        write_dat(
            &ca.lobe_dat("airDiff"),
            [10.0, 20.0, 30.0, 40.0, 100.0, 200.0],
            [0.0; 6],
        );
        write_dat(
            &ca.lobe_dat("fixed_tissue"),
            [0.0; 6],
            [0.1, 0.2, 0.3, 0.4, 0.5, 0.25],
        );
        write_dat(&ca.lobe_dat("jacob"), [0.0; 6], [1.1, 1.2, 1.3, 1.4, 1.5, 1.25]);
        LobarTable::new("Total")
            .push_float("Emphysratio", [0.01, 0.02, 0.03, 0.04, 0.05, 0.03])
            .push_float("fSADratio", [0.11, 0.12, 0.13, 0.14, 0.15, 0.13])
            .push_int("VoxelsAll", [100; 6])
            .write(&ca.lobar_stats("Emphys"))
            .unwrap();
        LobarTable::new("total")
            .push_float("airtrapratio", [0.1, 0.2, 0.3, 0.4, 0.5, 0.3])
            .push_int("voxels_trap", [1, 2, 3, 4, 5, 15])
            .push_int("Voxels", [10; 6])
            .write(&ca.lobar_stats("AirT"))
            .unwrap();
        LobarTable::new("All")
            .push_float("RRAVC_m", [0.9, 1.0, 1.1, 1.2, 1.3, 1.1])
            .push_float("RRAVC_sd", [0.1; 6])
            .push_float("RRAVC_cv", [0.1; 6])
            .write(&ca.lobar_stats("RRAVC"))
            .unwrap();
        LobarTable::new("All")
            .push_float("sStar_m", [1.5, 1.6, 1.7, 1.8, 1.9, 1.7])
            .push_float("sStar_sd", [0.2; 6])
            .push_float("sStar_cv", [0.2; 6])
            .write(&ca.lobar_stats("s_norm"))
            .unwrap();
        LobarTable::new("total")
            .push_float("HAAratio", [0.21, 0.22, 0.23, 0.24, 0.25, 0.23])
            .push_int("voxels_HAA", [7; 6])
            .push_int("Voxels", [10; 6])
            .write(&ca.lobar_stats("HAA-700to0"))
            .unwrap();
        // 气管是 r=1 的正圆; LLB / LUL / RLL 缺席.
        fs::write(
            ca.airmeas("IN0"),
            format!(
                "{AIRMEAS_HEADER}Trachea,{},{},2.0,0,0,1\n\
                 RMB,100,40,2.4,1,0,0\n\
                 LMB,90,38,2.2,0,1,0\n\
                 BronInt,80,36,2.0,0,0,1\n\
                 RUL,70,34,1.8,0,0,1\n",
                PI,
                2.0 * PI
            ),
        )
        .unwrap();

        // SUBB: 只有气道表 (仅气管) 和 ADI, 人口学表里没有这个编号.
        let b = root.join("TESTPJ_SUBB");
        fs::create_dir(&b).unwrap();
        let cb = CasePaths::new(&b, "SUBB", "IN0", "EX0");
        fs::write(
            cb.airmeas("IN0"),
            format!("{AIRMEAS_HEADER}Trachea,200,50,3.0,0,0,1\n"),
        )
        .unwrap();
        write_dat(&cb.lobe_dat("ADI"), [0.0; 6], [2.5, 2.5, 2.5, 2.5, 2.5, 2.4]);

        // SUBC: 统计表损坏, 应整个被丢弃.
        let c = root.join("TESTPJ_SUBC");
        fs::create_dir(&c).unwrap();
        let cc = CasePaths::new(&c, "SUBC", "IN0", "EX0");
        fs::write(
            cc.lobar_stats("AirT"),
            "Lobes airtrapratio\nLobe0 0.1\nLobe1 0.2\n",
        )
        .unwrap();

        // 不属于本项目的目录和普通文件都不算受试者.
        fs::create_dir(root.join("OTHER_X")).unwrap();
        fs::create_dir(root.join("TESTPJ")).unwrap();
        fs::write(root.join("TESTPJ_SUBF"), "not a directory").unwrap();

        let cfg = ExtractConfig::new(root, root.join("demo.csv"), "TESTPJ");
        let out = run(&cfg).unwrap();

        assert_eq!(out.per_subject.len(), 2);
        assert_eq!(out.per_subject[0], a.join("TESTPJ_SUBA_IN0_EX0_QCT.csv"));
        assert_eq!(out.per_subject[1], b.join("TESTPJ_SUBB_IN0_EX0_QCT.csv"));

        // SUBA 单受试者表: 开头六列固定, 其后按列族插入序排列.
        let (header, rows) = read_csv(&out.per_subject[0]);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        let first: Vec<&str> = header.iter().take(6).map(String::as_str).collect();
        assert_eq!(
            first,
            ["Proj", "Subj", "Age_yr", "Gender_m0f1", "Height_m", "Weight_kg"]
        );
        let pos = |name: &str| header.iter().position(|h| h == name).unwrap();
        assert!(pos("dAV_U_ML_T0") < pos("TF_All_IN0"));
        assert!(pos("TF_All_IN0") < pos("Emph_All_T0"));
        assert!(pos("Emph_All_T0") < pos("fSAD_All_T0"));
        assert!(pos("fSAD_All_T0") < pos("AirT_All_T0"));
        assert!(pos("AirT_All_T0") < pos("AirT_LUL_T0"));
        assert!(pos("AirT_RLL_T0") < pos("RRAVC_All_T0"));
        assert!(pos("RRAVC_All_T0") < pos("sStar_All_T0"));
        assert!(pos("sStar_All_T0") < pos("HAA_All_T0"));
        assert!(pos("HAA_All_T0") < pos("J_All_T0"));
        assert!(pos("J_All_T0") < pos("Angle_eTrachea_IN0"));
        assert!(pos("Cr_Trachea_IN0") < pos("WTn_Trachea_IN0"));
        assert!(pos("WTn_sRLL_IN0") < pos("Dhn_Trachea_IN0"));

        assert_eq!(cell(&header, row, "Proj"), "TESTPJ");
        assert_eq!(cell(&header, row, "Subj"), "SUBA");
        assert_eq!(cell(&header, row, "Age_yr"), "64");
        assert_eq!(cell(&header, row, "Height_m"), "1.6");
        // dAV_U_ML = (10+30)/(20+40+100), dAV_xLUL = 10/200.
        assert_eq!(cell(&header, row, "dAV_U_ML_T0"), "0.25");
        assert_eq!(cell(&header, row, "dAV_xLUL_T0"), "0.05");
        assert_eq!(cell(&header, row, "dAV_xRLL_T0"), "0.5");
        assert_eq!(cell(&header, row, "TF_All_IN0"), "0.25");
        assert_eq!(cell(&header, row, "TF_LUL_IN0"), "0.1");
        assert_eq!(cell(&header, row, "Emph_All_T0"), "0.03");
        assert_eq!(cell(&header, row, "fSAD_RLL_T0"), "0.15");
        assert_eq!(cell(&header, row, "AirT_All_T0"), "0.3");
        assert_eq!(cell(&header, row, "RRAVC_All_T0"), "1.1");
        assert_eq!(cell(&header, row, "sStar_All_T0"), "1.7");
        assert_eq!(cell(&header, row, "HAA_All_T0"), "0.23");
        assert_eq!(cell(&header, row, "J_All_T0"), "1.25");
        assert!(!header.iter().any(|h| h == "ADI_All_T0"));

        // 气道角: RMB(1,0,0) 对 LMB(0,1,0) 90 度, RUL 与 BronInt 同向 0 度.
        assert!((num(&header, row, "Angle_eTrachea_IN0") - 90.0).abs() < 1e-9);
        assert!(num(&header, row, "Angle_eRMB_IN0").abs() < 1e-9);
        assert!((num(&header, row, "Cr_Trachea_IN0") - 1.0).abs() < 1e-12);
        assert_eq!(cell(&header, row, "Cr_LLB_IN0"), "");
        let wt_pred = 4.5493 - 0.5007 + 0.3007 * 64f64.log10() * 1.6;
        assert!((num(&header, row, "WTn_Trachea_IN0") - 2.0 / wt_pred).abs() < 1e-9);
        let dh_pred = 16.446 - 2.4019 - 0.298809 * 64.0 + 0.0284836 * 64.0 * 1.6
            + 0.1786604 * 64.0 * 1.6;
        assert!((num(&header, row, "Dhn_Trachea_IN0") - 2.0 / dh_pred).abs() < 1e-9);
        assert_eq!(cell(&header, row, "WTn_sRLL_IN0"), "");

        // SUBB: 人口学占位 na, 角度因分支缺席留空, WTn/Dhn 整族 na.
        let (bh, brows) = read_csv(&out.per_subject[1]);
        let brow = &brows[0];
        assert_eq!(cell(&bh, brow, "Subj"), "SUBB");
        assert_eq!(cell(&bh, brow, "Age_yr"), "na");
        assert_eq!(cell(&bh, brow, "Weight_kg"), "na");
        assert_eq!(cell(&bh, brow, "Angle_eTrachea_IN0"), "");
        let cr = num(&bh, brow, "Cr_Trachea_IN0");
        assert!((cr - 4.0 * PI * 200.0 / (50.0 * 50.0)).abs() < 1e-9);
        assert_eq!(cell(&bh, brow, "WTn_Trachea_IN0"), "na");
        assert_eq!(cell(&bh, brow, "Dhn_sRLL_IN0"), "na");
        assert_eq!(cell(&bh, brow, "ADI_All_T0"), "2.4");
        assert!(!bh.iter().any(|h| h == "AirT_All_T0"));

        // 总表: 列并集按首次出现排序, SUBB 独有的 ADI 族排在末尾.
        let combined = out.combined.unwrap();
        assert_eq!(combined, root.join("TESTPJ_IN0_EX0_QCT_all.csv"));
        let (ch, crows) = read_csv(&combined);
        assert_eq!(crows.len(), 2);
        assert_eq!(cell(&ch, &crows[0], "Subj"), "SUBA");
        assert_eq!(cell(&ch, &crows[1], "Subj"), "SUBB");
        let cpos = |name: &str| ch.iter().position(|h| h == name).unwrap();
        assert!(cpos("Dhn_sRLL_IN0") < cpos("ADI_All_T0"));
        assert_eq!(cell(&ch, &crows[0], "ADI_All_T0"), "");
        assert_eq!(cell(&ch, &crows[1], "AirT_All_T0"), "");
        assert_eq!(cell(&ch, &crows[1], "Age_yr"), "na");
        assert_eq!(cell(&ch, &crows[0], "AirT_All_T0"), "0.3");
    }

    #[test]
    fn test_missing_demo_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("PX_S1")).unwrap();

        let cfg = ExtractConfig::new(root, root.join("absent.csv"), "PX");
        let out = run(&cfg).unwrap();

        assert_eq!(out.per_subject.len(), 1);
        let (header, rows) = read_csv(&out.per_subject[0]);
        assert_eq!(header.len(), 6);
        assert_eq!(cell(&header, &rows[0], "Age_yr"), "na");
        assert_eq!(cell(&header, &rows[0], "Weight_kg"), "na");

        let (ch, crows) = read_csv(&out.combined.unwrap());
        assert_eq!(ch.len(), 6);
        assert_eq!(crows.len(), 1);
    }

    #[test]
    fn test_no_subjects() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("OTHER_S1")).unwrap();

        let cfg = ExtractConfig::new(dir.path(), dir.path().join("demo.csv"), "PX");
        let out = run(&cfg).unwrap();

        assert!(out.per_subject.is_empty());
        assert!(out.combined.is_none());
        assert!(!dir.path().join("PX_IN0_EX0_QCT_all.csv").exists());
    }
}
