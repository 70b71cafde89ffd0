//! 致密体素掩膜表示与其布尔引擎.

use crate::consts::voxel::{is_inside, INSIDE};
use crate::error::EngineResult;
use crate::grid::Grid;
use crate::Idx3d;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use ndarray::{Array3, ArrayView2, ArrayView3, ArrayViewMut2, Axis, Zip};
use std::io::{Read, Write};
use std::ops::{Index, IndexMut};

/// 以致密二值缓冲表示的三维结构.
///
/// 数据为标准布局的 `(z, y, x)` 三维数组, 等价于按
/// `x + y * x_size + z * x_size * y_size` 寻址的平铺缓冲.
/// 体素值限定为 {0, 1}.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaskStructure {
    grid: Grid,
    data: Array3<u8>,
}

/// 为三个布尔操作生成实现: 克隆左操作数形状, 逐体素套用 `$op`.
macro_rules! mask_boolean_op {
    ($(#[$doc:meta])* $name:ident, $op:expr) => {
        $(#[$doc])*
        pub fn $name(&self, other: &Self) -> EngineResult<Self> {
            self.grid.ensure_compatible(other.grid())?;
            let mut data = self.data.clone();
            Zip::from(&mut data)
                .and(other.data())
                .for_each(|a, &b| *a = $op(*a, b));
            Ok(Self {
                grid: self.grid.clone(),
                data,
            })
        }
    };
}

/// `rayon` 特性下的并行版本.
#[cfg(feature = "rayon")]
macro_rules! mask_boolean_op_par {
    ($(#[$doc:meta])* $name:ident, $op:expr) => {
        $(#[$doc])*
        pub fn $name(&self, other: &Self) -> EngineResult<Self> {
            self.grid.ensure_compatible(other.grid())?;
            let mut data = self.data.clone();
            Zip::from(&mut data)
                .and(other.data())
                .par_for_each(|a, &b| *a = $op(*a, b));
            Ok(Self {
                grid: self.grid.clone(),
                data,
            })
        }
    };
}

impl MaskStructure {
    /// 创建空掩膜.
    pub fn new_empty(grid: Grid) -> Self {
        let data = Array3::zeros(grid.shape());
        Self { grid, data }
    }

    /// 获取网格描述.
    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }

    /// 获取 z 空间的第 `z_index` 层切片视图. 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ArrayView2<'_, u8> {
        self.data.index_axis(Axis(0), z_index)
    }

    /// 获取 z 空间的第 `z_index` 层可变切片视图. 越界时 panic.
    #[inline]
    pub(crate) fn slice_at_mut(&mut self, z_index: usize) -> ArrayViewMut2<'_, u8> {
        self.data.index_axis_mut(Axis(0), z_index)
    }

    /// 获取 "内部" 体素个数.
    #[inline]
    pub fn voxel_count(&self) -> usize {
        self.data.iter().filter(|&&v| is_inside(v)).count()
    }

    /// 结构是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voxel_count() == 0
    }

    /// 获取结构的物理体积, 以立方毫米为单位.
    #[inline]
    pub fn volume_mm3(&self) -> f64 {
        self.voxel_count() as f64 * self.grid.voxel_mm3()
    }

    mask_boolean_op!(
        /// 并集: 逐体素 `a | b`.
        union,
        |a: u8, b: u8| (a | b) & 1
    );

    mask_boolean_op!(
        /// 交集: 逐体素 `a & b`.
        intersect,
        |a: u8, b: u8| a & b & 1
    );

    mask_boolean_op!(
        /// 差集: 逐体素 `a & !b`.
        subtract,
        |a: u8, b: u8| a & !b & 1
    );

    /// 压缩当前掩膜为快照.
    pub fn compress(&self) -> CompactMask {
        // 标准布局缓冲, as_slice 必然成功.
        let buf = self.data.as_slice().expect("掩膜缓冲非标准布局");
        let mut e = ZlibEncoder::new(Vec::with_capacity(64), Compression::best());
        e.write_all(buf).expect("Compression error");
        CompactMask {
            buf: e.finish().expect("Compression error"),
            grid: self.grid.clone(),
        }
    }
}

/// 并发操作部分.
#[cfg(feature = "rayon")]
impl MaskStructure {
    mask_boolean_op_par!(
        /// 借助 `rayon` 并行计算并集. 语义与 [`MaskStructure::union`] 一致.
        par_union,
        |a: u8, b: u8| (a | b) & 1
    );

    mask_boolean_op_par!(
        /// 借助 `rayon` 并行计算交集. 语义与 [`MaskStructure::intersect`] 一致.
        par_intersect,
        |a: u8, b: u8| a & b & 1
    );

    mask_boolean_op_par!(
        /// 借助 `rayon` 并行计算差集. 语义与 [`MaskStructure::subtract`] 一致.
        par_subtract,
        |a: u8, b: u8| a & !b & 1
    );
}

impl Index<Idx3d> for MaskStructure {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for MaskStructure {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

/// 压缩存储的掩膜快照; 不透明类型.
///
/// 用于结构编辑场景中的低成本备份 (如撤销栈), 经由
/// [`MaskStructure::compress`] 产出, [`CompactMask::decompress`] 还原.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompactMask {
    /// 压缩的不透明字节流.
    buf: Vec<u8>,

    /// 原网格描述.
    grid: Grid,
}

impl CompactMask {
    /// 解压缩还原掩膜.
    pub fn decompress(self) -> MaskStructure {
        let Self { buf, grid } = self;
        let mut d = ZlibDecoder::new(buf.as_slice());
        let mut raw = Vec::with_capacity(grid.len());
        d.read_to_end(&mut raw).expect("Decompression error");
        debug_assert_eq!(raw.len(), grid.len());
        let data = Array3::from_shape_vec(grid.shape(), raw).expect("快照形状不一致");
        MaskStructure { grid, data }
    }
}

/// 掩膜辅助: 将二维切片按位并入.
pub(crate) fn or_into_slice(mut dst: ArrayViewMut2<'_, u8>, src: &ndarray::Array2<u8>) {
    Zip::from(&mut dst).and(src).for_each(|d, &s| {
        if is_inside(s) {
            *d = INSIDE;
        }
    });
}
