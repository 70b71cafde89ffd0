//! 表示转换: 掩膜 ↔ VIP ↔ 轮廓.

use super::mask::or_into_slice;
use super::{MaskStructure, VipStructure};
use crate::consts::voxel::is_inside;
use crate::contour::Contour;
use crate::grid::Grid;
use crate::interval::VoxelIndexPair;
use crate::raster;
use crate::Idx2dF;
use ndarray::s;

impl VipStructure {
    /// 由掩膜转换: 对每个 (z, y) 行自左向右扫描, 进入 "1" 段时记录起点,
    /// 离开时产出一条游程. 产出的行天然满足归一化不变式.
    pub fn from_mask(mask: &MaskStructure) -> Self {
        let grid = mask.grid().clone();
        let x_size = grid.x_size();
        let mut out = Self::new_empty(grid.clone());

        for z in 0..grid.z_size() {
            let plane = mask.slice_at(z);
            for (y, row) in plane.outer_iter().enumerate() {
                let base = (y * x_size) as u32;
                let mut runs = Vec::new();
                let mut start: Option<usize> = None;
                for (x, &v) in row.iter().enumerate() {
                    match (start, is_inside(v)) {
                        (None, true) => start = Some(x),
                        (Some(s0), false) => {
                            runs.push(VoxelIndexPair::new(base + s0 as u32, (x - s0) as u32));
                            start = None;
                        }
                        _ => {}
                    }
                }
                if let Some(s0) = start {
                    runs.push(VoxelIndexPair::new(base + s0 as u32, (x_size - s0) as u32));
                }
                if !runs.is_empty() {
                    out.set_row(z, y, runs);
                }
            }
        }
        out
    }

    /// 转换为掩膜: 将每条游程的 `[x_start, x_start + length)` 置 1.
    ///
    /// 行外的 x 位置被静默裁剪 (防御性行为, 不是硬性契约的一部分).
    pub fn to_mask(&self) -> MaskStructure {
        let grid = self.grid().clone();
        let x_size = grid.x_size();
        let mut mask = MaskStructure::new_empty(grid.clone());

        for z in 0..grid.z_size() {
            let mut plane = mask.slice_at_mut(z);
            for y in 0..grid.y_size() {
                for run in self.row(z, y) {
                    let x0 = run.index() as usize % x_size;
                    let x1 = (x0 + run.length() as usize).min(x_size);
                    plane
                        .slice_mut(s![y, x0..x1])
                        .fill(crate::consts::voxel::INSIDE);
                }
            }
        }
        mask
    }

    /// 由轮廓集合光栅化 (逐切片扫描线填充, 再做逐行游程扫描).
    ///
    /// 不合法轮廓被静默跳过; 落在网格 z 范围之外的切片被丢弃.
    pub fn from_contours(grid: &Grid, contours: &[Contour]) -> Self {
        Self::from_mask(&MaskStructure::from_contours(grid, contours))
    }

    /// 提取逐切片边界轮廓. 等价于先转掩膜再提取,
    /// 见 [`MaskStructure::to_contours`].
    #[inline]
    pub fn to_contours(&self) -> Vec<Contour> {
        self.to_mask().to_contours()
    }
}

impl MaskStructure {
    /// 由轮廓集合光栅化.
    ///
    /// 每条合法轮廓按四舍五入后的切片索引进入对应 z 层;
    /// 同层多条轮廓按位并入. 不合法轮廓被静默跳过,
    /// 落在网格 z 范围之外的切片被丢弃.
    pub fn from_contours(grid: &Grid, contours: &[Contour]) -> Self {
        let mut mask = Self::new_empty(grid.clone());
        for c in contours.iter().filter(|c| c.is_well_formed()) {
            let Some(zi) = grid.slice_index_of(c.slice_position()) else {
                continue;
            };
            let poly: Vec<Idx2dF> = c
                .vertices()
                .map(|(x, y)| (grid.x_to_px(x), grid.y_to_px(y)))
                .collect();
            let filled = raster::fill_polygon(&poly, grid.x_size(), grid.y_size());
            or_into_slice(mask.slice_at_mut(zi), &filled);
        }
        mask
    }

    /// 转换为 VIP 表示.
    #[inline]
    pub fn to_vip(&self) -> VipStructure {
        VipStructure::from_mask(self)
    }

    /// 提取逐切片边界轮廓 (世界坐标, 毫米).
    ///
    /// 对每个非空 z 层做边界跟踪与简化, 像素坐标经
    /// `coord * spacing + origin` 映射回毫米. 每层至多产出一条轮廓.
    pub fn to_contours(&self) -> Vec<Contour> {
        let grid = self.grid();
        let (ox, oy, oz) = grid.origin();
        let (sx, sy, sz) = grid.spacing();

        let mut out = Vec::new();
        for z in 0..grid.z_size() {
            let Some(outline) = raster::extract_outline(self.slice_at(z)) else {
                continue;
            };
            let z_mm = z as f64 * sz + oz;
            let mut points = Vec::with_capacity(outline.len() * 3);
            for (px, py) in outline {
                points.push(px * sx + ox);
                points.push(py * sy + oy);
                points.push(z_mm);
            }
            out.push(Contour::new(z_mm, points));
        }
        out
    }
}
