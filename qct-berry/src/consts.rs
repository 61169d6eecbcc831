//! 通用常量.

/// 肺叶标签编码.
///
/// VIDA 分割输出以 2 的幂为肺叶编码, 0 为肺外背景.
/// 统计表的行序固定为 `Lobe0..Lobe4` 再加总计行,
/// 下游聚合按行号取数, 该顺序不可改变.
pub mod lobe {
    /// 肺外背景.
    pub const BACKGROUND: u8 = 0;

    /// 左上叶 (LUL).
    pub const LOBE0: u8 = 8;

    /// 左下叶 (LLL).
    pub const LOBE1: u8 = 16;

    /// 右上叶 (RUL).
    pub const LOBE2: u8 = 32;

    /// 右中叶 (RML).
    pub const LOBE3: u8 = 64;

    /// 右下叶 (RLL).
    pub const LOBE4: u8 = 128;

    /// 五个肺叶编码, 按统计表行序排列.
    pub const CODES: [u8; 5] = [LOBE0, LOBE1, LOBE2, LOBE3, LOBE4];

    /// 五个肺叶的解剖学缩写, 与 [`CODES`] 同序.
    pub const NAMES: [&str; 5] = ["LUL", "LLL", "RUL", "RML", "RLL"];

    /// 体素是否在肺内 (非背景)?
    #[inline]
    pub const fn is_lung(p: u8) -> bool {
        p != BACKGROUND
    }

    /// 肺叶编码对应的统计表行号. 背景和未知编码返回 `None`.
    #[inline]
    pub const fn row_of(p: u8) -> Option<usize> {
        match p {
            LOBE0 => Some(0),
            LOBE1 => Some(1),
            LOBE2 => Some(2),
            LOBE3 => Some(3),
            LOBE4 => Some(4),
            _ => None,
        }
    }
}

/// 分类输出体素编码.
pub mod class {
    /// 未分类或肺外.
    pub const NONE: u8 = 0;

    /// 一级分类 (气体潴留 / fSAD / HAA).
    pub const PRIMARY: u8 = 1;

    /// 二级分类 (肺气肿).
    pub const SECONDARY: u8 = 2;
}

/// 默认 HU 阈值.
pub mod hu {
    /// 呼气相气体潴留阈值.
    pub const AIRTRAP: i32 = -856;

    /// 肺气肿阈值 (吸气相).
    pub const EMPH: i32 = -950;

    /// fSAD 阈值 (配准后呼气相).
    pub const FSAD: i32 = -856;

    /// HAA 区间下限.
    pub const HAA_LOWER: i32 = -700;

    /// HAA 区间上限.
    pub const HAA_UPPER: i32 = 0;

    /// 只给下限时使用的开放上限.
    pub const HAA_UPPER_OPEN: i32 = 1000;
}

/// RRAVC 连续场中肺外体素的哨兵值. 0 在 RRAVC 中是合法取值,
/// 所以背景不能写 0.
pub const RRAVC_BACKGROUND: f32 = -100.0;

/// 统计表固定的六个行标签中前五行.
pub const LOBE_ROW_LABELS: [&str; 5] = ["Lobe0", "Lobe1", "Lobe2", "Lobe3", "Lobe4"];

/// 统计表的数据行数: 五个肺叶加一行总计.
pub const LOBAR_ROWS: usize = 6;

#[cfg(test)]
mod tests {
    use super::lobe;

    #[test]
    fn test_lobe_rows() {
        for (i, code) in lobe::CODES.iter().enumerate() {
            assert_eq!(lobe::row_of(*code), Some(i));
        }
        assert_eq!(lobe::row_of(0), None);
        assert_eq!(lobe::row_of(9), None);
        assert!(!lobe::is_lung(lobe::BACKGROUND));
        assert!(lobe::is_lung(lobe::LOBE3));
    }
}
