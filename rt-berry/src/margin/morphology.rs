//! 三维形态学: 以毫米距离为半径的膨胀与腐蚀.

use super::voxel_grid::VoxelGrid;
use crate::consts::voxel::{is_inside, INSIDE, OUTSIDE};
use crate::Mm3;
use ndarray::{Array3, Axis};

/// 形态学实现策略.
///
/// 两种策略都被完整实现并在测试中互相对照, 以便量化近似误差,
/// 而不是静默选定其中一种.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MorphologyStrategy {
    /// 参考实现: 核内逐偏移检验真欧氏距离的球形结构元.
    /// 各向异性 spacing 下仍然精确, 但开销为 O(体素数 x 核体积).
    Exact,

    /// 可分离近似: 沿 X, Y, Z 依次做三趟一维盒型 max/min 扫描.
    /// 以盒形/八面体形结构元近似球形, 在各向异性 spacing 下与
    /// [`Self::Exact`] **不几何等价** — 这是被接受的近似, 不是缺陷.
    SeparableApprox,
}

/// 按 `margin_mm` 的符号就地做膨胀 (正) 或腐蚀 (负), 幅度为其绝对值.
///
/// `margin_mm == 0` 时不做任何事.
pub(crate) fn apply_morphology(grid: &mut VoxelGrid, margin_mm: f64, strategy: MorphologyStrategy) {
    if margin_mm == 0.0 {
        return;
    }
    let dilate = margin_mm > 0.0;
    let radius_mm = margin_mm.abs();
    match strategy {
        MorphologyStrategy::Exact => exact_pass(grid, radius_mm, dilate),
        MorphologyStrategy::SeparableApprox => separable_pass(grid, radius_mm, dilate),
    }
}

/// 球形结构元的体素偏移核: 只保留真欧氏距离不超过 `radius_mm` 的偏移,
/// 距离按逐轴 spacing 换算 (各向异性感知). 核总是包含原点.
fn sphere_offsets(spacing: Mm3, radius_mm: f64) -> Vec<(isize, isize, isize)> {
    let (sx, sy, sz) = spacing;
    let (rx, ry, rz) = (
        (radius_mm / sx).ceil() as isize,
        (radius_mm / sy).ceil() as isize,
        (radius_mm / sz).ceil() as isize,
    );
    let r2 = radius_mm * radius_mm;

    let mut offsets = Vec::new();
    for dz in -rz..=rz {
        let z2 = (dz as f64 * sz).powi(2);
        for dy in -ry..=ry {
            let y2 = (dy as f64 * sy).powi(2);
            for dx in -rx..=rx {
                let d2 = z2 + y2 + (dx as f64 * sx).powi(2);
                if d2 <= r2 {
                    offsets.push((dz, dy, dx));
                }
            }
        }
    }
    offsets
}

/// 参考实现: 膨胀时把每个前景体素的球形核盖印到输出;
/// 腐蚀时仅保留整个球形核都落在前景内的体素 (网格之外视为背景).
fn exact_pass(grid: &mut VoxelGrid, radius_mm: f64, dilate: bool) {
    let offsets = sphere_offsets(grid.spacing(), radius_mm);
    let (zs, ys, xs) = grid.shape();
    let src = grid.data().clone();

    let mut dst = if dilate {
        src.clone()
    } else {
        Array3::zeros((zs, ys, xs))
    };

    for ((z, y, x), &v) in src.indexed_iter() {
        if !is_inside(v) {
            continue;
        }
        if dilate {
            for &(dz, dy, dx) in &offsets {
                let (nz, ny, nx) = (z as isize + dz, y as isize + dy, x as isize + dx);
                if nz < 0 || ny < 0 || nx < 0 {
                    continue;
                }
                let (nz, ny, nx) = (nz as usize, ny as usize, nx as usize);
                if nz < zs && ny < ys && nx < xs {
                    dst[(nz, ny, nx)] = INSIDE;
                }
            }
        } else {
            let keep = offsets.iter().all(|&(dz, dy, dx)| {
                let (nz, ny, nx) = (z as isize + dz, y as isize + dy, x as isize + dx);
                if nz < 0 || ny < 0 || nx < 0 {
                    return false;
                }
                let (nz, ny, nx) = (nz as usize, ny as usize, nx as usize);
                nz < zs && ny < ys && nx < xs && is_inside(src[(nz, ny, nx)])
            });
            if keep {
                dst[(z, y, x)] = INSIDE;
            }
        }
    }
    grid.replace_data(dst);
}

/// 可分离近似: X, Y, Z 三趟一维扫描, 每趟在半径窗口内取
/// max (膨胀) 或 min (腐蚀).
fn separable_pass(grid: &mut VoxelGrid, radius_mm: f64, dilate: bool) {
    let (sx, sy, sz) = grid.spacing();
    let radii = [
        (Axis(2), (radius_mm / sx).ceil() as usize),
        (Axis(1), (radius_mm / sy).ceil() as usize),
        (Axis(0), (radius_mm / sz).ceil() as usize),
    ];
    for (axis, r) in radii {
        if r > 0 {
            axis_pass(grid.data_mut(), axis, r, dilate);
        }
    }
}

/// 沿单轴做半径 `r` 的一维 max/min 滑窗.
///
/// 腐蚀时窗口越过数组边界即视为触到背景, 结果为 0.
fn axis_pass(data: &mut Array3<u8>, axis: Axis, r: usize, take_max: bool) {
    let mut buf: Vec<u8> = Vec::new();
    for mut lane in data.lanes_mut(axis) {
        buf.clear();
        buf.extend(lane.iter());
        let n = buf.len();
        for i in 0..n {
            let lo = i.saturating_sub(r);
            let hi = (i + r).min(n - 1);
            lane[i] = if take_max {
                buf[lo..=hi].iter().copied().max().unwrap_or(OUTSIDE)
            } else if i < r || i + r >= n {
                OUTSIDE
            } else {
                buf[lo..=hi].iter().copied().min().unwrap_or(OUTSIDE)
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::Contour;

    fn square_contour(z: f64, lo: f64, hi: f64) -> Contour {
        Contour::new(z, vec![lo, lo, z, hi, lo, z, hi, hi, z, lo, hi, z])
    }

    /// 单层正方形工作网格.
    fn slab() -> VoxelGrid {
        let contours = [square_contour(0.0, 0.0, 10.0)];
        VoxelGrid::build(&contours, (1.0, 1.0, 1.0)).unwrap()
    }

    /// 11 层立方体工作网格 (z = 0..=10), 腐蚀后仍有存活体素.
    fn block() -> VoxelGrid {
        let contours: Vec<Contour> = (0..=10)
            .map(|z| square_contour(z as f64, 0.0, 10.0))
            .collect();
        VoxelGrid::build(&contours, (1.0, 1.0, 1.0)).unwrap()
    }

    /// 球形偏移核的基本性质.
    #[test]
    fn test_sphere_offsets() {
        // 半径 1, 各向同性: 恰为 6-邻域 + 原点.
        let k = sphere_offsets((1.0, 1.0, 1.0), 1.0);
        assert_eq!(k.len(), 7);
        assert!(k.contains(&(0, 0, 0)));
        assert!(k.contains(&(1, 0, 0)) && k.contains(&(0, -1, 0)));
        assert!(!k.contains(&(1, 1, 0)));

        // 各向异性: z 间距大, z 方向偏移更早出界.
        let k = sphere_offsets((1.0, 1.0, 3.0), 2.0);
        assert!(k.contains(&(0, 0, 2)));
        assert!(!k.contains(&(1, 0, 0)));
    }

    /// 膨胀严格增加体素数, 腐蚀严格减少, 且关于 |margin| 单调.
    #[test]
    fn test_morphology_monotonic() {
        for strategy in [MorphologyStrategy::Exact, MorphologyStrategy::SeparableApprox] {
            let base = block().voxel_count();

            let counts: Vec<usize> = [2.0, 4.0]
                .iter()
                .map(|&mm| {
                    let mut g = block();
                    apply_morphology(&mut g, mm, strategy);
                    g.voxel_count()
                })
                .collect();
            assert!(base < counts[0], "{strategy:?}");
            assert!(counts[0] < counts[1], "{strategy:?}");

            let shrunk: Vec<usize> = [-2.0, -4.0]
                .iter()
                .map(|&mm| {
                    let mut g = block();
                    apply_morphology(&mut g, mm, strategy);
                    g.voxel_count()
                })
                .collect();
            assert!(shrunk[0] < base, "{strategy:?}");
            assert!(shrunk[1] < shrunk[0], "{strategy:?}");
            assert!(shrunk[1] > 0, "{strategy:?}");
        }
    }

    /// margin 为 0 时两种策略都不触碰网格.
    #[test]
    fn test_morphology_zero_noop() {
        for strategy in [MorphologyStrategy::Exact, MorphologyStrategy::SeparableApprox] {
            let mut g = slab();
            let before = g.data().clone();
            apply_morphology(&mut g, 0.0, strategy);
            assert_eq!(g.data(), &before);
        }
    }

    /// 盒形核包含球形核: 可分离膨胀 ⊇ 精确膨胀, 可分离腐蚀 ⊆ 精确腐蚀.
    #[test]
    fn test_separable_bounds_exact() {
        for mm in [3.0, -3.0] {
            let mut exact = block();
            apply_morphology(&mut exact, mm, MorphologyStrategy::Exact);
            let mut approx = block();
            apply_morphology(&mut approx, mm, MorphologyStrategy::SeparableApprox);

            let (sup, sub) = if mm > 0.0 {
                (approx.data(), exact.data())
            } else {
                (exact.data(), approx.data())
            };
            for (s, t) in sub.iter().zip(sup.iter()) {
                assert!(!is_inside(*s) || is_inside(*t));
            }
        }
    }

    /// 精确膨胀后的截面半径符合欧氏球.
    #[test]
    fn test_exact_dilation_shape() {
        let mut g = slab();
        apply_morphology(&mut g, 3.0, MorphologyStrategy::Exact);

        // 原正方形像素域为 [40, 50)^2, z = 40. 膨胀 3mm 后, 同层
        // 距原区域切比雪夫距离 3 以内且欧氏距离 ≤ 3 的体素全部进入.
        let zi = g.slice_index_of(0.0).unwrap();
        let plane = g.slice_at(zi);
        assert!(is_inside(plane[(40, 37)]));
        assert!(is_inside(plane[(37, 45)]));
        // 角点 (37, 37) 离最近的原体素 (40, 40) 距离 3*sqrt(2) > 3.
        assert!(!is_inside(plane[(37, 37)]));

        // z 方向同样生长.
        assert!(g
            .slice_at(zi - 3)
            .iter()
            .any(|&v| is_inside(v)));
        assert!(g.slice_at(zi - 4).iter().all(|&v| !is_inside(v)));
    }
}
