//! margin 运算的工作体素网格.

use crate::consts::voxel::{is_inside, INSIDE};
use crate::consts::{MARGIN_PADDING_MM, SLICE_GAP_FILL_LIMIT};
use crate::contour::Contour;
use crate::raster;
use crate::{Idx2dF, Idx3d, Mm3};
use ndarray::{Array3, ArrayView2, Axis};
use num::ToPrimitive;

/// margin 引擎的工作缓冲.
///
/// 每次 margin 调用都从输入轮廓的包围盒出发新建一块网格:
/// 包围盒各向外扩 [`MARGIN_PADDING_MM`], 给膨胀留出生长空间.
/// 它独立于任何外部 [`crate::Grid`], 用后即弃 (或进入
/// [`super::GridCache`] 复用).
#[derive(Debug, Clone)]
pub(crate) struct VoxelGrid {
    data: Array3<u8>,
    origin: Mm3,
    spacing: Mm3,
}

impl VoxelGrid {
    /// 从轮廓集合构建工作网格.
    ///
    /// 流程: 求合法轮廓的世界包围盒并外扩; 逐切片扫描线光栅化;
    /// 最后对 z 方向的小空隙做内部填充. 不存在合法轮廓时返回 `None`.
    ///
    /// 任一方向 `spacing` 非正时 panic.
    pub(crate) fn build(contours: &[Contour], spacing: Mm3) -> Option<Self> {
        let (sx, sy, sz) = spacing;
        assert!(sx > 0.0 && sy > 0.0 && sz > 0.0, "体素间距必须为正");

        let valid: Vec<&Contour> = contours.iter().filter(|c| c.is_well_formed()).collect();
        if valid.is_empty() {
            return None;
        }

        // 世界包围盒.
        let (mut min_x, mut min_y, mut min_z) = (f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y, mut max_z) =
            (f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for c in &valid {
            for (x, y) in c.vertices() {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
            min_z = min_z.min(c.slice_position());
            max_z = max_z.max(c.slice_position());
        }

        let origin = (
            min_x - MARGIN_PADDING_MM,
            min_y - MARGIN_PADDING_MM,
            min_z - MARGIN_PADDING_MM,
        );
        let x_size = extent_to_len(max_x + MARGIN_PADDING_MM - origin.0, sx)?;
        let y_size = extent_to_len(max_y + MARGIN_PADDING_MM - origin.1, sy)?;
        let z_size = extent_to_len(max_z + MARGIN_PADDING_MM - origin.2, sz)?;

        let mut grid = Self {
            data: Array3::zeros((z_size, y_size, x_size)),
            origin,
            spacing,
        };

        for c in &valid {
            let Some(zi) = grid.slice_index_of(c.slice_position()) else {
                continue;
            };
            let poly: Vec<Idx2dF> = c
                .vertices()
                .map(|(x, y)| ((x - origin.0) / sx, (y - origin.1) / sy))
                .collect();
            let filled = raster::fill_polygon(&poly, x_size, y_size);
            let mut plane = grid.data.index_axis_mut(Axis(0), zi);
            plane.zip_mut_with(&filled, |d, &s| {
                if is_inside(s) {
                    *d = INSIDE;
                }
            });
        }

        grid.fill_slice_gaps(SLICE_GAP_FILL_LIMIT);
        Some(grid)
    }

    /// 对每个 (y, x) 柱, 桥接相邻已填充 z 段之间不超过 `limit` 层的空隙.
    ///
    /// 更大的空隙保持原样: 它们被视为互不相关的轮廓岛, 不应被桥接.
    fn fill_slice_gaps(&mut self, limit: usize) {
        for mut lane in self.data.lanes_mut(Axis(0)) {
            let mut last_set: Option<usize> = None;
            for z in 0..lane.len() {
                if !is_inside(lane[z]) {
                    continue;
                }
                if let Some(ls) = last_set {
                    let gap = z - ls - 1;
                    if (1..=limit).contains(&gap) {
                        for k in ls + 1..z {
                            lane[k] = INSIDE;
                        }
                    }
                }
                last_set = Some(z);
            }
        }
    }

    /// 获取数据形状大小, (z, y, x) 顺序.
    #[inline]
    pub(crate) fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获取逐轴体素间距 (毫米).
    #[inline]
    pub(crate) fn spacing(&self) -> Mm3 {
        self.spacing
    }

    /// 获得底层缓冲.
    #[inline]
    pub(crate) fn data(&self) -> &Array3<u8> {
        &self.data
    }

    /// 获得底层缓冲的可变引用.
    #[inline]
    pub(crate) fn data_mut(&mut self) -> &mut Array3<u8> {
        &mut self.data
    }

    /// 整体替换底层缓冲. 形状不一致时 panic.
    pub(crate) fn replace_data(&mut self, data: Array3<u8>) {
        assert_eq!(self.data.dim(), data.dim());
        self.data = data;
    }

    /// 获取 "内部" 体素个数.
    pub(crate) fn voxel_count(&self) -> usize {
        self.data.iter().filter(|&&v| is_inside(v)).count()
    }

    /// 获取第 `z_index` 层切片视图. 越界时 panic.
    #[inline]
    pub(crate) fn slice_at(&self, z_index: usize) -> ArrayView2<'_, u8> {
        self.data.index_axis(Axis(0), z_index)
    }

    /// 将世界 z 坐标四舍五入映射为切片索引. 越界时返回 `None`.
    pub(crate) fn slice_index_of(&self, z_mm: f64) -> Option<usize> {
        let zi = ((z_mm - self.origin.2) / self.spacing.2).round();
        zi.to_usize().filter(|&z| z < self.data.dim().0)
    }

    /// 将连续像素坐标映射回世界平面坐标 (毫米).
    #[inline]
    pub(crate) fn px_to_mm(&self, (x_px, y_px): Idx2dF) -> Idx2dF {
        (
            x_px * self.spacing.0 + self.origin.0,
            y_px * self.spacing.1 + self.origin.1,
        )
    }
}

/// 将世界跨度换算为体素个数 (向上取整再加 1, 保证两端都被覆盖).
fn extent_to_len(extent_mm: f64, spacing_mm: f64) -> Option<usize> {
    (extent_mm / spacing_mm).ceil().to_usize().map(|n| n + 1)
}
