//! 肺叶统计表的落盘与读回.
//!
//! 写出格式与历史数据对齐: 单空格分隔, 首列 `Lobes`, 行序
//! `Lobe0..Lobe4` 加总计行. 非有限值按字面写出 (`NaN` / `inf` /
//! `-inf`), 从不留空单元格, 读回时整行仍可按空白切分.

use std::fs;
use std::path::{Path, PathBuf};

use crate::consts::{LOBAR_ROWS, LOBE_ROW_LABELS};
use crate::error::{QctError, Result};
use crate::paths;

#[derive(Debug, Clone)]
enum Column {
    Float([f64; LOBAR_ROWS]),
    Int([u64; LOBAR_ROWS]),
}

/// 待写出的六行肺叶统计表.
#[derive(Debug, Clone)]
pub struct LobarTable {
    total_label: &'static str,
    columns: Vec<(String, Column)>,
}

impl LobarTable {
    /// 新建空表. `total_label` 是第六行的标签
    /// (各指标间不统一, `"total"` / `"Total"` / `"All"` 都有).
    pub fn new(total_label: &'static str) -> Self {
        Self {
            total_label,
            columns: Vec::new(),
        }
    }

    /// 追加一个浮点列.
    pub fn push_float(mut self, name: &str, values: [f64; LOBAR_ROWS]) -> Self {
        self.columns.push((name.to_owned(), Column::Float(values)));
        self
    }

    /// 追加一个计数列.
    pub fn push_int(mut self, name: &str, values: [u64; LOBAR_ROWS]) -> Self {
        self.columns.push((name.to_owned(), Column::Int(values)));
        self
    }

    /// 写出整表.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new().delimiter(b' ').from_path(path)?;

        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push("Lobes".to_owned());
        header.extend(self.columns.iter().map(|(name, _)| name.clone()));
        wtr.write_record(&header)?;

        for row in 0..LOBAR_ROWS {
            let mut record = Vec::with_capacity(self.columns.len() + 1);
            record.push(self.row_label(row).to_owned());
            for (_, col) in &self.columns {
                record.push(match col {
                    Column::Float(v) => format!("{}", v[row]),
                    Column::Int(v) => format!("{}", v[row]),
                });
            }
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn row_label(&self, row: usize) -> &str {
        if row < 5 {
            LOBE_ROW_LABELS[row]
        } else {
            self.total_label
        }
    }
}

/// 读回的肺叶统计表.
///
/// 覆盖两种来源: 本 crate 写出的 `lobar_*.txt`, 以及配准流水线
/// 落盘的 `*_Lobe.dat`. 行按位置取 (0..4 肺叶, 5 总计), 列按名取.
#[derive(Debug, Clone)]
pub struct LobarFile {
    path: PathBuf,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl LobarFile {
    /// 读取 `path` 处的统计表.
    ///
    /// 数据行与表头等宽, 或各多出一个未命名的行标签列
    /// (带索引写出的 `.dat` 表); 后者去掉行首标签再对齐.
    /// 数据行数必须恰好为 6.
    pub fn open(path: &Path) -> Result<Self> {
        let path = paths::require(path.to_path_buf())?;
        let text = fs::read_to_string(&path)?;
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());

        let header: Vec<String> = match lines.next() {
            Some(l) => l.split_whitespace().map(str::to_owned).collect(),
            None => return Err(QctError::TableShape { path, found: 0 }),
        };

        let mut rows = Vec::new();
        for line in lines {
            let mut fields: Vec<String> = line.split_whitespace().map(str::to_owned).collect();
            if fields.len() == header.len() + 1 {
                fields.remove(0);
            }
            rows.push(fields);
        }
        if rows.len() != LOBAR_ROWS {
            return Err(QctError::TableShape {
                path,
                found: rows.len(),
            });
        }
        Ok(Self { path, header, rows })
    }

    /// 列名表.
    #[inline]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// 表文件位置.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn col_index(&self, name: &str) -> Result<usize> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| QctError::MissingColumn {
                path: self.path.clone(),
                name: name.to_owned(),
            })
    }

    /// `name` 列第 `row` 行的原始单元格. 短行缺失的尾部单元取空串.
    pub fn cell(&self, name: &str, row: usize) -> Result<&str> {
        assert!(row < LOBAR_ROWS, "lobar tables have exactly 6 data rows");
        let idx = self.col_index(name)?;
        Ok(self.rows[row].get(idx).map(String::as_str).unwrap_or(""))
    }

    /// `name` 列第 `row` 行解析为数值. `NaN` / `inf` 字面量按原义解析.
    pub fn value(&self, name: &str, row: usize) -> Result<f64> {
        let cell = self.cell(name, row)?;
        cell.parse::<f64>().map_err(|_| QctError::BadCell {
            path: self.path.clone(),
            name: name.to_owned(),
            cell: cell.to_owned(),
        })
    }

    /// `name` 整列数值, 按行序.
    pub fn column(&self, name: &str) -> Result<[f64; LOBAR_ROWS]> {
        let mut out = [0.0; LOBAR_ROWS];
        for (row, slot) in out.iter_mut().enumerate() {
            *slot = self.value(name, row)?;
        }
        Ok(out)
    }
}
