//! VIDA 导出表的读取.
//!
//! 两张逗号分隔表: `*_vida-histo.csv` (直方图/体积) 与
//! `*_vida-airmeas.csv` (气道分支测量). 列名沿用导出原文,
//! 本模块只认需要的列, 其余照单忽略.

use std::path::Path;

use serde::Deserialize;

use crate::error::{QctError, Result};
use crate::paths;

fn col(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

/// 从 vida-histo 表取全肺体积 (mm³).
///
/// 取 `location == "both"` 行的 `total-volume-cm3` 列, cm³ 换算 mm³.
/// 表中没有 `both` 行时报错, 不退回左右肺之和.
pub fn lung_volume_mm3(path: &Path) -> Result<f64> {
    let path = paths::require(path.to_path_buf())?;
    let mut rdr = csv::Reader::from_path(&path)?;
    let headers = rdr.headers()?.clone();

    let loc = col(&headers, "location").ok_or_else(|| QctError::MissingColumn {
        path: path.clone(),
        name: "location".to_owned(),
    })?;
    let vol = col(&headers, "total-volume-cm3").ok_or_else(|| QctError::MissingColumn {
        path: path.clone(),
        name: "total-volume-cm3".to_owned(),
    })?;

    for record in rdr.records() {
        let record = record?;
        if record.get(loc) == Some("both") {
            let cell = record.get(vol).unwrap_or("");
            let cm3: f64 = cell.parse().map_err(|_| QctError::BadCell {
                path: path.clone(),
                name: "total-volume-cm3".to_owned(),
                cell: cell.to_owned(),
            })?;
            return Ok(cm3 * 1000.0);
        }
    }
    Err(QctError::HistoBothRow(path))
}

/// vida-airmeas 表中的一条气道分支.
///
/// 数值列允许留空, 取值时以 NaN 下传, 与整条流水线的退化值
/// 处理口径一致.
#[derive(Debug, Clone, Deserialize)]
pub struct BranchRow {
    #[serde(rename = "anatomicalName")]
    anatomical_name: String,
    #[serde(rename = "avgInnerArea")]
    avg_inner_area: Option<f64>,
    #[serde(rename = "avgInnerPerimeter")]
    avg_inner_perimeter: Option<f64>,
    #[serde(rename = "avgAvgWallThickness")]
    avg_avg_wall_thickness: Option<f64>,
    #[serde(rename = "dirCosX")]
    dir_cos_x: Option<f64>,
    #[serde(rename = "dirCosY")]
    dir_cos_y: Option<f64>,
    #[serde(rename = "dirCosZ")]
    dir_cos_z: Option<f64>,
}

impl BranchRow {
    /// 分支解剖名 (Trachea / RMB / LMB / ...).
    #[inline]
    pub fn name(&self) -> &str {
        &self.anatomical_name
    }

    /// 平均内腔面积 (mm²).
    #[inline]
    pub fn inner_area(&self) -> f64 {
        self.avg_inner_area.unwrap_or(f64::NAN)
    }

    /// 平均内腔周长 (mm).
    #[inline]
    pub fn inner_perimeter(&self) -> f64 {
        self.avg_inner_perimeter.unwrap_or(f64::NAN)
    }

    /// 平均壁厚 (mm).
    #[inline]
    pub fn wall_thickness(&self) -> f64 {
        self.avg_avg_wall_thickness.unwrap_or(f64::NAN)
    }

    /// 分支中轴方向余弦.
    #[inline]
    pub fn direction(&self) -> [f64; 3] {
        [
            self.dir_cos_x.unwrap_or(f64::NAN),
            self.dir_cos_y.unwrap_or(f64::NAN),
            self.dir_cos_z.unwrap_or(f64::NAN),
        ]
    }
}

/// 一张 vida-airmeas 表.
#[derive(Debug, Clone)]
pub struct AirwayMeasures {
    rows: Vec<BranchRow>,
}

impl AirwayMeasures {
    /// 读取 `path` 处的 vida-airmeas 表.
    pub fn open(path: &Path) -> Result<Self> {
        let path = paths::require(path.to_path_buf())?;
        let mut rdr = csv::Reader::from_path(&path)?;
        let mut rows = Vec::new();
        for record in rdr.deserialize() {
            rows.push(record?);
        }
        Ok(Self { rows })
    }

    /// 第一条解剖名为 `name` 的分支, 不存在时 `None`.
    pub fn branch(&self, name: &str) -> Option<&BranchRow> {
        self.rows.iter().find(|r| r.anatomical_name == name)
    }
}
