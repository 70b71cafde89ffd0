//! 规则三维采样网格.

use crate::error::{EngineError, EngineResult};
use crate::{Idx2d, Idx3d, Mm3};
use num::ToPrimitive;

/// 不可变的规则三维采样网格描述: 体素个数、世界原点与逐轴间距.
///
/// 构建之后不可修改. 所有世界坐标以毫米为单位.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid {
    x_size: usize,
    y_size: usize,
    z_size: usize,
    origin: Mm3,
    spacing: Mm3,
}

impl Grid {
    /// 创建网格.
    ///
    /// 任一方向体素个数为 0, 或任一方向间距非正/非有限时 panic.
    pub fn new(x_size: usize, y_size: usize, z_size: usize, origin: Mm3, spacing: Mm3) -> Self {
        assert!(x_size > 0 && y_size > 0 && z_size > 0, "网格尺寸必须为正");
        let (sx, sy, sz) = spacing;
        assert!(
            sx > 0.0 && sy > 0.0 && sz > 0.0 && sx.is_finite() && sy.is_finite() && sz.is_finite(),
            "体素间距必须为正有限值"
        );
        Self {
            x_size,
            y_size,
            z_size,
            origin,
            spacing,
        }
    }

    /// 获取 x 方向体素个数.
    #[inline]
    pub fn x_size(&self) -> usize {
        self.x_size
    }

    /// 获取 y 方向体素个数.
    #[inline]
    pub fn y_size(&self) -> usize {
        self.y_size
    }

    /// 获取 z 方向体素个数 (切片数).
    #[inline]
    pub fn z_size(&self) -> usize {
        self.z_size
    }

    /// 获取世界原点 (毫米).
    #[inline]
    pub fn origin(&self) -> Mm3 {
        self.origin
    }

    /// 获取逐轴体素间距 (毫米).
    #[inline]
    pub fn spacing(&self) -> Mm3 {
        self.spacing
    }

    /// 获取数据形状大小, (z, y, x) 顺序.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        (self.z_size, self.y_size, self.x_size)
    }

    /// 获取水平切片形状大小, (y, x) 顺序.
    #[inline]
    pub fn slice_shape(&self) -> Idx2d {
        (self.y_size, self.x_size)
    }

    /// 获取体素总个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.x_size * self.y_size * self.z_size
    }

    /// 网格体素个数是否为 0? 构建不变式保证恒为 `false`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 获取单个体素的实际体积值, 以立方毫米为单位.
    #[inline]
    pub fn voxel_mm3(&self) -> f64 {
        let (sx, sy, sz) = self.spacing;
        sx * sy * sz
    }

    /// 检查三维索引是否合法.
    #[inline]
    pub fn check(&self, (z, y, x): &Idx3d) -> bool {
        *z < self.z_size && *y < self.y_size && *x < self.x_size
    }

    /// 两个网格是否 "兼容"?
    ///
    /// 兼容性只比较三个方向的体素个数. spacing 与 origin 有意 **不参与比较**:
    /// 按约定, 进入布尔运算的体积已经在上游完成重采样.
    #[inline]
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }

    /// 校验兼容性. 不兼容时返回 [`EngineError::GridMismatch`].
    #[inline]
    pub fn ensure_compatible(&self, other: &Self) -> EngineResult<()> {
        if self.is_compatible(other) {
            Ok(())
        } else {
            Err(EngineError::GridMismatch(self.shape(), other.shape()))
        }
    }

    /// 将世界 x 坐标 (毫米) 映射为连续像素坐标.
    #[inline]
    pub fn x_to_px(&self, x_mm: f64) -> f64 {
        (x_mm - self.origin.0) / self.spacing.0
    }

    /// 将世界 y 坐标 (毫米) 映射为连续像素坐标.
    #[inline]
    pub fn y_to_px(&self, y_mm: f64) -> f64 {
        (y_mm - self.origin.1) / self.spacing.1
    }

    /// 将连续像素坐标映射回世界 x 坐标 (毫米).
    #[inline]
    pub fn px_to_x(&self, px: f64) -> f64 {
        px * self.spacing.0 + self.origin.0
    }

    /// 将连续像素坐标映射回世界 y 坐标 (毫米).
    #[inline]
    pub fn px_to_y(&self, px: f64) -> f64 {
        px * self.spacing.1 + self.origin.1
    }

    /// 将世界 z 坐标 (毫米) 四舍五入映射为切片索引.
    ///
    /// 落在网格 z 范围之外 (或非有限值) 时返回 `None`.
    pub fn slice_index_of(&self, z_mm: f64) -> Option<usize> {
        let zi = ((z_mm - self.origin.2) / self.spacing.2).round();
        zi.to_usize().filter(|&z| z < self.z_size)
    }
}
