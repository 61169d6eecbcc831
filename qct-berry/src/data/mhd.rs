//! MetaImage (`.mhd`) 位移场读取.
//!
//! 配准管线输出的位移场是文本头加二进制负载的 MetaImage 文件.
//! 负载按 MetaImage 惯例以最快变化维在前的 `DimSize` 描述:
//! 三维加 `ElementNumberOfChannels = 3` 时分量在体素内交错,
//! 四维时分量是最慢维. 两种布局都归一成逻辑 \[w, h, z, 3\] 数组.

use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use ndarray::{Array3, Array4, ArrayView4, Axis, Zip};
use nifti::NiftiHeader;
use num::ToPrimitive;

use super::BoxedHeader;
use crate::error::{QctError, Result};
use crate::paths;

/// 负载元素类型.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    U8,
    I8,
    I16,
    U16,
    F32,
    F64,
}

impl ElementKind {
    fn from_met(s: &str) -> Option<Self> {
        match s {
            "MET_UCHAR" => Some(Self::U8),
            "MET_CHAR" => Some(Self::I8),
            "MET_SHORT" => Some(Self::I16),
            "MET_USHORT" => Some(Self::U16),
            "MET_FLOAT" => Some(Self::F32),
            "MET_DOUBLE" => Some(Self::F64),
            _ => None,
        }
    }

    /// 单个元素的字节宽度.
    fn width(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/// 负载来源.
#[derive(Debug, Clone)]
enum DataFileRef {
    /// 负载紧跟在头之后.
    Local,
    /// 负载在相邻文件中 (`.raw` / `.zraw`).
    External(PathBuf),
}

/// MetaImage 头字段中本模块关心的部分.
#[derive(Debug, Clone)]
pub struct MhdMeta {
    ndims: usize,
    /// 最快变化维在前.
    dim_size: Vec<usize>,
    channels: usize,
    spacing: [f32; 3],
    element: ElementKind,
    compressed: bool,
    msb: bool,
    data_file: DataFileRef,
}

impl MhdMeta {
    /// 空间维大小, 按 \[w, h, z\] 排列.
    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        [self.dim_size[0], self.dim_size[1], self.dim_size[2]]
    }

    /// 体素间距, 按 \[w, h, z\] 排列, 以毫米为单位.
    #[inline]
    pub fn spacing(&self) -> [f32; 3] {
        self.spacing
    }

    /// 解析 `.mhd` 头, 返回元信息和未解码的负载字节.
    ///
    /// 负载可能仍是压缩态, 由调用方按 `compressed` 决定是否解压.
    fn parse(path: &Path) -> Result<(Self, Vec<u8>)> {
        let raw = std::fs::read(path)?;

        let mut ndims = None;
        let mut dim_size: Option<Vec<usize>> = None;
        let mut channels = 1usize;
        let mut spacing = [1.0f32; 3];
        let mut element = None;
        let mut compressed = false;
        let mut msb = false;
        let mut data_file = None;

        let mut offset = 0usize;
        while offset < raw.len() {
            let (line_end, next) = match raw[offset..].iter().position(|&b| b == b'\n') {
                Some(p) => (offset + p, offset + p + 1),
                None => (raw.len(), raw.len()),
            };
            let line = String::from_utf8_lossy(&raw[offset..line_end]);
            let line = line.trim_end_matches('\r').trim().to_owned();
            offset = next;
            if line.is_empty() {
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| perr(path, format!("line without `=`: `{line}`")))?;
            let (key, value) = (key.trim(), value.trim());

            match key {
                "NDims" => ndims = Some(parse_one(path, key, value)?),
                "DimSize" => dim_size = Some(parse_list(path, key, value)?),
                "ElementNumberOfChannels" => channels = parse_one(path, key, value)?,
                "ElementSpacing" => {
                    let all: Vec<f32> = parse_list(path, key, value)?;
                    if all.len() < 3 {
                        return Err(perr(path, "ElementSpacing needs at least 3 entries"));
                    }
                    spacing = [all[0], all[1], all[2]];
                }
                "ElementType" => {
                    element = Some(ElementKind::from_met(value).ok_or_else(|| {
                        perr(path, format!("unsupported ElementType `{value}`"))
                    })?);
                }
                "CompressedData" => compressed = value.eq_ignore_ascii_case("true"),
                "BinaryDataByteOrderMSB" | "ElementByteOrderMSB" => {
                    msb = value.eq_ignore_ascii_case("true");
                }
                "ElementDataFile" => {
                    data_file = Some(if value == "LOCAL" {
                        DataFileRef::Local
                    } else if value == "LIST" {
                        return Err(perr(path, "ElementDataFile = LIST is not supported"));
                    } else {
                        let parent = path.parent().unwrap_or_else(|| Path::new("."));
                        DataFileRef::External(parent.join(value))
                    });
                    // 头到此为止, LOCAL 负载紧随其后.
                    break;
                }
                _ => {}
            }
        }

        let ndims = ndims.ok_or_else(|| perr(path, "missing NDims"))?;
        let dim_size = dim_size.ok_or_else(|| perr(path, "missing DimSize"))?;
        if dim_size.len() != ndims {
            return Err(perr(
                path,
                format!("DimSize has {} entries, NDims says {ndims}", dim_size.len()),
            ));
        }
        if !(3..=4).contains(&ndims) {
            return Err(perr(path, format!("unsupported NDims {ndims}")));
        }
        let element = element.ok_or_else(|| perr(path, "missing ElementType"))?;
        let data_file = data_file.ok_or_else(|| perr(path, "missing ElementDataFile"))?;

        let meta = Self {
            ndims,
            dim_size,
            channels,
            spacing,
            element,
            compressed,
            msb,
            data_file,
        };

        let payload = match &meta.data_file {
            DataFileRef::Local => raw[offset..].to_vec(),
            DataFileRef::External(p) => std::fs::read(paths::require(p.clone())?)?,
        };
        Ok((meta, payload))
    }
}

fn perr(path: &Path, reason: impl Into<String>) -> QctError {
    QctError::MhdParse {
        path: path.to_owned(),
        reason: reason.into(),
    }
}

fn parse_one<T: std::str::FromStr>(path: &Path, key: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| perr(path, format!("bad {key} value `{value}`")))
}

fn parse_list<T: std::str::FromStr>(path: &Path, key: &str, value: &str) -> Result<Vec<T>> {
    value
        .split_whitespace()
        .map(|tok| {
            tok.parse::<T>()
                .map_err(|_| perr(path, format!("bad {key} entry `{tok}`")))
        })
        .collect()
}

/// 按元素类型和字节序把负载展开成 `f32` 序列.
fn decode_scalars(kind: ElementKind, msb: bool, bytes: &[u8]) -> Vec<f32> {
    fn go<const N: usize, T: ToPrimitive>(bytes: &[u8], conv: impl Fn([u8; N]) -> T) -> Vec<f32> {
        bytes
            .chunks_exact(N)
            .map(|c| {
                let mut buf = [0u8; N];
                buf.copy_from_slice(c);
                conv(buf).to_f32().unwrap_or(f32::NAN)
            })
            .collect()
    }

    match (kind, msb) {
        (ElementKind::U8, _) => go(bytes, u8::from_le_bytes),
        (ElementKind::I8, _) => go(bytes, i8::from_le_bytes),
        (ElementKind::I16, false) => go(bytes, i16::from_le_bytes),
        (ElementKind::I16, true) => go(bytes, i16::from_be_bytes),
        (ElementKind::U16, false) => go(bytes, u16::from_le_bytes),
        (ElementKind::U16, true) => go(bytes, u16::from_be_bytes),
        (ElementKind::F32, false) => go(bytes, f32::from_le_bytes),
        (ElementKind::F32, true) => go(bytes, f32::from_be_bytes),
        (ElementKind::F64, false) => go(bytes, f64::from_le_bytes),
        (ElementKind::F64, true) => go(bytes, f64::from_be_bytes),
    }
}

/// 三分量位移场, 逻辑布局 \[w, h, z, 3\].
#[derive(Debug, Clone)]
pub struct DispField {
    meta: MhdMeta,
    data: Array4<f32>,
}

impl DispField {
    /// 打开 `.mhd` 位移场文件. 支持 LOCAL 与外部 `.raw`/`.zraw` 负载.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = paths::require(path.as_ref().to_owned())?;
        let (meta, payload) = MhdMeta::parse(&path)?;

        let payload = if meta.compressed {
            let mut out = Vec::new();
            ZlibDecoder::new(&payload[..]).read_to_end(&mut out)?;
            out
        } else {
            payload
        };

        let total: usize = meta.dim_size.iter().product::<usize>() * meta.channels;
        let expected = total * meta.element.width();
        if payload.len() != expected {
            return Err(perr(
                &path,
                format!("payload is {} bytes, expected {expected}", payload.len()),
            ));
        }

        let scalars = decode_scalars(meta.element, meta.msb, &payload);
        let [w, h, z] = meta.dims();

        // 文件序最慢维在前; 逻辑序换成 (w, h, z, c).
        let data = match (meta.ndims, meta.channels) {
            (3, 3) => Array4::from_shape_vec((z, h, w, 3), scalars)
                .map(|a| a.permuted_axes([2, 1, 0, 3])),
            (4, 1) if meta.dim_size[3] == 3 => Array4::from_shape_vec((3, z, h, w), scalars)
                .map(|a| a.permuted_axes([3, 2, 1, 0])),
            _ => {
                return Err(perr(
                    &path,
                    "cannot interpret as a 3-component displacement field",
                ))
            }
        }
        .map_err(|_| perr(&path, "payload does not fill the declared dimensions"))?;

        Ok(Self { meta, data })
    }

    /// 位移数据视图, 按 \[w, h, z, 分量\] 索引.
    #[inline]
    pub fn data(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    /// 空间维大小, 按 \[w, h, z\] 排列.
    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.meta.dims()
    }

    /// 体素间距, 按 \[w, h, z\] 排列, 以毫米为单位.
    #[inline]
    pub fn spacing(&self) -> [f32; 3] {
        self.meta.spacing()
    }

    /// 逐体素位移幅值 (欧氏范数), 以毫米为单位.
    pub fn magnitude(&self) -> Array3<f32> {
        let (w, h, z, _) = self.data.dim();
        let dx = self.data.index_axis(Axis(3), 0);
        let dy = self.data.index_axis(Axis(3), 1);
        let dz = self.data.index_axis(Axis(3), 2);

        let mut out = Array3::<f32>::zeros((w, h, z));
        Zip::from(&mut out)
            .and(&dx)
            .and(&dy)
            .and(&dz)
            .for_each(|o, &a, &b, &c| *o = (a * a + b * b + c * c).sqrt());
        out
    }

    /// 由 MetaImage 元信息合成双文件格式可用的 header (维数与间距).
    pub fn to_header(&self) -> BoxedHeader {
        let [w, h, z] = self.dims();
        let [sw, sh, sz] = self.spacing();
        let mut header = Box::<NiftiHeader>::default();
        header.dim = [3, w as u16, h as u16, z as u16, 1, 1, 1, 1];
        header.pixdim = [1.0, sw, sh, sz, 1.0, 1.0, 1.0, 1.0];
        header
    }
}
