//! 双文件 (`.hdr` + `.img[.gz]`) 体数据的读写与基础结构.
//!
//! 体素数组一律按 nifti 原生的 \[w, h, z\] 逻辑顺序保存,
//! 派生体数据写盘时可直接沿用输入的几何信息而无需换轴.

use std::path::{Path, PathBuf};

use ndarray::{Array3, ArrayBase, ArrayD, ArrayView3, Axis, Ix3};
use nifti::writer::WriterOptions;
use nifti::{DataElement, IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::error::{QctError, Result};
use crate::paths;

pub mod mhd;

pub use mhd::DispField;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
pub type BoxedHeader = Box<NiftiHeader>;

/// 3D 体数据文件 header 的共用属性.
pub trait HeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取 header 声明的数据形状, 按 \[w, h, z\] 排列.
    #[inline]
    fn shape(&self) -> [usize; 3] {
        let [_, w, h, z, ..] = self.header().dim;
        [w as usize, h as usize, z as usize]
    }

    /// 获取 header 声明的体素个数.
    #[inline]
    fn size(&self) -> usize {
        self.shape().iter().product()
    }

    /// 获取单个体素分辨率, 以毫米为单位, 按 \[w, h, z\] 排列.
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        let [_, w, h, z, ..] = self.header().pixdim;
        [w as f64, h as f64, z as f64]
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    fn voxel_mm3(&self) -> f64 {
        self.pix_dim().iter().product()
    }
}

/// 3D CT 扫描, 包括 header 和 HU 体数据. HU 值以 `f32` 保存.
#[derive(Debug, Clone)]
pub struct CtScan {
    header: BoxedHeader,
    data: Array3<f32>,
}

impl HeaderAttr for CtScan {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl CtScan {
    /// 打开 `.img[.gz]` 格式的 3D 体数据. `volume` 为数据文件路径,
    /// 同名 `.hdr[.gz]` 必须与其相邻.
    pub fn open<P: AsRef<Path>>(volume: P) -> Result<Self> {
        let (header, data) = open_pair::<f32>(volume.as_ref())?;
        Ok(Self { header, data })
    }

    /// 体素数据视图, 按 \[w, h, z\] 索引.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// 交出体素数据所有权.
    #[inline]
    pub fn into_data(self) -> Array3<f32> {
        self.data
    }

    /// 手动拼接实例, 体素分辨率为 `pix_dim` (毫米).
    ///
    /// # 注意
    ///
    /// 该方法可能会创建不一致的实体, 因此你应仅将其用于实验目的.
    pub fn fake(data: Array3<f32>, pix_dim: [f32; 3]) -> Self {
        let header = fake_header(data.dim(), pix_dim);
        Self { header, data }
    }
}

/// 肺叶标签体数据. 体素值为 0 (肺外) 或五个肺叶编码之一.
#[derive(Debug, Clone)]
pub struct LobeMask {
    header: BoxedHeader,
    data: Array3<u8>,
}

impl HeaderAttr for LobeMask {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl LobeMask {
    /// 打开 `.img[.gz]` 格式的肺叶标签. `volume` 为数据文件路径,
    /// 同名 `.hdr[.gz]` 必须与其相邻.
    pub fn open<P: AsRef<Path>>(volume: P) -> Result<Self> {
        let (header, data) = open_pair::<u8>(volume.as_ref())?;
        Ok(Self { header, data })
    }

    /// 标签数据视图, 按 \[w, h, z\] 索引.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }

    /// 手动拼接实例, 体素分辨率为 `pix_dim` (毫米).
    ///
    /// # 注意
    ///
    /// 该方法可能会创建不一致的实体, 因此你应仅将其用于实验目的.
    pub fn fake(data: Array3<u8>, pix_dim: [f32; 3]) -> Self {
        let header = fake_header(data.dim(), pix_dim);
        Self { header, data }
    }
}

/// 将体数据按 `.hdr`/`.img` 双文件格式写盘.
///
/// `img_path` 以 `.img` 结尾; 同名 `.hdr` 一并生成.
/// 几何信息沿用 `header`, 数据类型由元素类型决定.
pub fn save_pair<T, S>(
    img_path: &Path,
    header: &NiftiHeader,
    data: &ArrayBase<S, Ix3>,
) -> Result<()>
where
    T: DataElement + bytemuck::Pod,
    S: ndarray::Data<Elem = T>,
{
    let hdr_path = img_path.with_extension("hdr");
    WriterOptions::new(&hdr_path)
        .reference_header(header)
        .write_nifti(data)?;
    Ok(())
}

/// 由数据文件路径推导相邻 header 路径: 去掉可能的 `.gz` 后把扩展名换成 `.hdr`.
fn header_twin(volume: &Path) -> PathBuf {
    let mut base = volume.to_owned();
    if let Some(name) = base.file_name().and_then(|s| s.to_str()) {
        if let Some(stripped) = name.strip_suffix(".gz") {
            base.set_file_name(stripped.to_owned());
        }
    }
    base.set_extension("hdr");
    base
}

fn open_pair<T: DataElement>(volume: &Path) -> Result<(BoxedHeader, Array3<T>)> {
    let volume = paths::require(volume.to_owned())?;
    let hdr = paths::probe_gz(header_twin(&volume))?;

    let obj = ReaderOptions::new().read_file_pair(&hdr, &volume)?;
    let header = Box::new(obj.header().clone());
    let data = obj.into_volume().into_ndarray::<T>()?;
    let data = squeeze3(data, &volume)?;
    Ok((header, data))
}

/// 去掉长度为 1 的尾轴. ANALYZE 头常以 4 维声明 3 维数据.
fn squeeze3<T>(mut data: ArrayD<T>, path: &Path) -> Result<Array3<T>> {
    while data.ndim() > 3 && data.shape().last() == Some(&1) {
        let last = data.ndim() - 1;
        data = data.remove_axis(Axis(last));
    }
    let ndim = data.ndim();
    data.into_dimensionality::<Ix3>()
        .map_err(|_| QctError::NotVolume3d {
            path: path.to_owned(),
            ndim,
        })
}

fn fake_header((w, h, z): (usize, usize, usize), pix_dim: [f32; 3]) -> BoxedHeader {
    let mut header = Box::<NiftiHeader>::default();
    header.dim = [3, w as u16, h as u16, z as u16, 1, 1, 1, 1];
    header.pixdim = [1.0, pix_dim[0], pix_dim[1], pix_dim[2], 1.0, 1.0, 1.0, 1.0];
    header.intent_name[..4].copy_from_slice(b"fake");
    header
}
