//! 运行时错误.

use std::path::PathBuf;

/// 本 crate 统一的 `Result` 别名.
pub type Result<T> = std::result::Result<T, QctError>;

/// QCT 分析的运行时错误.
///
/// 单个受试者运行中的任何错误都会中止该次运行;
/// 统计退化 (空肺叶, 零均值) 不是错误, 以非有限值写入结果表.
#[derive(Debug, thiserror::Error)]
pub enum QctError {
    /// 必需的输入文件缺失. 不允许用默认数据静默替代.
    #[error("missing input file: {}", .0.display())]
    MissingInput(PathBuf),

    /// 两个体数据形状不一致.
    #[error("shape mismatch ({what}): {lhs:?} vs {rhs:?}")]
    ShapeMismatch {
        /// 冲突双方的描述, 如 `"scan vs lobes"`.
        what: &'static str,
        /// 左侧形状.
        lhs: [usize; 3],
        /// 右侧形状.
        rhs: [usize; 3],
    },

    /// nii 文件不是三维体数据.
    #[error("{}: expected a 3-D volume, found {ndim} dims", path.display())]
    NotVolume3d {
        /// 文件位置.
        path: PathBuf,
        /// 实际维数.
        ndim: usize,
    },

    /// MetaImage 头解析失败.
    #[error("{}: bad MetaImage header: {reason}", path.display())]
    MhdParse {
        /// `.mhd` 文件位置.
        path: PathBuf,
        /// 失败原因.
        reason: String,
    },

    /// 肺叶统计表的数据行数不是 6.
    #[error("{}: expected {} data rows, found {found}", path.display(), crate::consts::LOBAR_ROWS)]
    TableShape {
        /// 表文件位置.
        path: PathBuf,
        /// 实际行数.
        found: usize,
    },

    /// 表中缺少指定列.
    #[error("{}: column `{name}` not found", path.display())]
    MissingColumn {
        /// 表文件位置.
        path: PathBuf,
        /// 要找的列名.
        name: String,
    },

    /// 表中单元格无法解析为数值.
    #[error("{}: bad numeric cell `{cell}` in column `{name}`", path.display())]
    BadCell {
        /// 表文件位置.
        path: PathBuf,
        /// 列名.
        name: String,
        /// 原始内容.
        cell: String,
    },

    /// vida-histo 表中没有 `location == "both"` 的行.
    #[error("{}: no `both` row in vida-histo table", .0.display())]
    HistoBothRow(PathBuf),

    /// nifti 读写错误.
    #[error(transparent)]
    Nifti(#[from] nifti::NiftiError),

    /// CSV 读写错误.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// 底层 I/O 错误.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
