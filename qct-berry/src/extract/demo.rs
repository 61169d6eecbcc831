//! 人口学信息表.
//!
//! 逗号分隔, 必备列 `Subj Age_yr Gender_m0f1 Height_m Weight_kg`,
//! 多余列忽略. 表在运行时缺失是常态, 由调用方决定缺省行为.

use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::paths;

/// 一条人口学记录. 数值列允许留空, 取值时以 NaN 下传.
#[derive(Debug, Clone, Deserialize)]
pub struct DemoRow {
    #[serde(rename = "Subj")]
    subj: String,
    #[serde(rename = "Age_yr")]
    age_yr: Option<f64>,
    #[serde(rename = "Gender_m0f1")]
    gender_m0f1: Option<f64>,
    #[serde(rename = "Height_m")]
    height_m: Option<f64>,
    #[serde(rename = "Weight_kg")]
    weight_kg: Option<f64>,
}

impl DemoRow {
    /// 受试者编号.
    #[inline]
    pub fn subj(&self) -> &str {
        &self.subj
    }

    /// 年龄 (岁).
    #[inline]
    pub fn age_yr(&self) -> f64 {
        self.age_yr.unwrap_or(f64::NAN)
    }

    /// 性别编码: 男 0, 女 1.
    #[inline]
    pub fn gender_m0f1(&self) -> f64 {
        self.gender_m0f1.unwrap_or(f64::NAN)
    }

    /// 身高 (米).
    #[inline]
    pub fn height_m(&self) -> f64 {
        self.height_m.unwrap_or(f64::NAN)
    }

    /// 体重 (千克).
    #[inline]
    pub fn weight_kg(&self) -> f64 {
        self.weight_kg.unwrap_or(f64::NAN)
    }
}

/// 整张人口学表, 按受试者编号查询.
#[derive(Debug, Clone)]
pub struct Demographics {
    rows: Vec<DemoRow>,
}

impl Demographics {
    /// 读取 `path` 处的人口学表.
    pub fn open(path: &Path) -> Result<Self> {
        let path = paths::require(path.to_path_buf())?;
        let mut rdr = csv::Reader::from_path(&path)?;
        let mut rows = Vec::new();
        for record in rdr.deserialize() {
            rows.push(record?);
        }
        Ok(Self { rows })
    }

    /// 第一条编号为 `subj` 的记录, 不存在时 `None`.
    pub fn subject(&self, subj: &str) -> Option<&DemoRow> {
        self.rows.iter().find(|r| r.subj == subj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_lookup_and_blank_cells() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("demo.csv");
        fs::write(
            &p,
            "Subj,Age_yr,Gender_m0f1,Height_m,Weight_kg,site\n\
             12345,63,1,1.62,58,A\n\
             12346,,0,1.80,80,B\n",
        )
        .unwrap();

        let demo = Demographics::open(&p).unwrap();
        let row = demo.subject("12345").unwrap();
        assert_eq!(row.age_yr(), 63.0);
        assert_eq!(row.gender_m0f1(), 1.0);
        assert!((row.height_m() - 1.62).abs() < 1e-9);

        // 空单元格按 NaN 取出.
        assert!(demo.subject("12346").unwrap().age_yr().is_nan());

        assert!(demo.subject("99999").is_none());
    }
}
