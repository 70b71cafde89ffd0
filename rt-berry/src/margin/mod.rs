//! 三维 margin 引擎: 对一组逐切片轮廓做以毫米计的体积膨胀/腐蚀.
//!
//! 流程分三步: 由轮廓包围盒构建带外扩的工作网格 (逐切片光栅化 +
//! z 方向小空隙填充); 按 margin 符号施加三维形态学; 最后对每个原始
//! 切片位置做边界跟踪, 把像素坐标映射回世界毫米, 重新产出轮廓.
//!
//! 每次调用都是输入的纯函数; 可选的 [`GridCache`] 由调用者持有,
//! 用于在相同输入上复用已构建的工作网格.

mod cache;
mod morphology;
mod voxel_grid;

pub use cache::GridCache;

pub use morphology::MorphologyStrategy;

use morphology::apply_morphology;
use voxel_grid::VoxelGrid;

use crate::contour::Contour;
use crate::Mm3;
use log::debug;

/// 对轮廓集合施加三维 margin.
///
/// `margin_mm > 0` 膨胀, `< 0` 以其绝对值腐蚀, `== 0` 原样返回输入.
/// 不含任何合法轮廓时同样原样返回输入 (no-op, 不是错误).
pub fn apply_3d_margin(
    contours: &[Contour],
    margin_mm: f64,
    spacing: Mm3,
    strategy: MorphologyStrategy,
) -> Vec<Contour> {
    if margin_mm == 0.0 {
        return contours.to_vec();
    }
    let Some(grid) = VoxelGrid::build(contours, spacing) else {
        return contours.to_vec();
    };
    morph_and_extract(grid, contours, margin_mm, strategy)
}

/// 同 [`apply_3d_margin`], 但经由调用者持有的 [`GridCache`]
/// 复用已构建的工作网格.
pub fn apply_3d_margin_cached(
    cache: &mut GridCache,
    contours: &[Contour],
    margin_mm: f64,
    spacing: Mm3,
    strategy: MorphologyStrategy,
) -> Vec<Contour> {
    if margin_mm == 0.0 {
        return contours.to_vec();
    }
    let Some(grid) = cache
        .fetch_or_build(contours, margin_mm, spacing)
        .cloned()
    else {
        return contours.to_vec();
    };
    morph_and_extract(grid, contours, margin_mm, strategy)
}

/// 施加形态学并按原始切片位置重新提取轮廓.
fn morph_and_extract(
    mut grid: VoxelGrid,
    contours: &[Contour],
    margin_mm: f64,
    strategy: MorphologyStrategy,
) -> Vec<Contour> {
    apply_morphology(&mut grid, margin_mm, strategy);
    debug!(
        "margin {margin_mm:+} mm ({strategy:?}) 后工作网格内体素数: {}",
        grid.voxel_count()
    );

    let mut seen_positions: Vec<u64> = Vec::new();
    let mut out = Vec::new();
    for c in contours.iter().filter(|c| c.is_well_formed()) {
        let z_mm = c.slice_position();
        let z_bits = z_mm.to_bits();
        if seen_positions.contains(&z_bits) {
            continue;
        }
        seen_positions.push(z_bits);

        let Some(zi) = grid.slice_index_of(z_mm) else {
            continue;
        };
        let Some(outline) = crate::raster::extract_outline(grid.slice_at(zi)) else {
            continue;
        };
        if outline.len() < 3 {
            // 该层已被腐蚀殆尽或只剩零散像素.
            continue;
        }

        let mut points = Vec::with_capacity(outline.len() * 3);
        for px in outline {
            let (x_mm, y_mm) = grid.px_to_mm(px);
            points.push(x_mm);
            points.push(y_mm);
            points.push(z_mm);
        }
        out.push(Contour::new(z_mm, points));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::structure::MaskStructure;

    fn square_contour(z: f64, lo: f64, hi: f64) -> Contour {
        Contour::new(z, vec![lo, lo, z, hi, lo, z, hi, hi, z, lo, hi, z])
    }

    fn cube_contours() -> Vec<Contour> {
        (0..=10)
            .map(|z| square_contour(z as f64, 10.0, 20.0))
            .collect()
    }

    /// 用公共网格把轮廓集合光栅化后计数, 作为跨调用的可比度量.
    fn rasterized_count(contours: &[Contour]) -> usize {
        let grid = Grid::new(60, 60, 40, (-10.0, -10.0, -10.0), (1.0, 1.0, 1.0));
        MaskStructure::from_contours(&grid, contours).voxel_count()
    }

    /// margin 为 0 与空输入都是 no-op.
    #[test]
    fn test_margin_noop() {
        let contours = cube_contours();
        for strategy in [MorphologyStrategy::Exact, MorphologyStrategy::SeparableApprox] {
            let out = apply_3d_margin(&contours, 0.0, (1.0, 1.0, 1.0), strategy);
            assert_eq!(out, contours);
        }

        let none: Vec<Contour> = vec![];
        let out = apply_3d_margin(&none, 5.0, (1.0, 1.0, 1.0), MorphologyStrategy::Exact);
        assert!(out.is_empty());

        // 全部不合法 (顶点不足) → 原样返回.
        let bad = vec![Contour::new(0.0, vec![0.0; 6])];
        let out = apply_3d_margin(&bad, 5.0, (1.0, 1.0, 1.0), MorphologyStrategy::Exact);
        assert_eq!(out, bad);
    }

    /// 正 margin 生长, 负 margin 收缩, 且对 |margin| 单调.
    #[test]
    fn test_margin_sign_behavior() {
        let contours = cube_contours();
        let spacing = (1.0, 1.0, 1.0);
        let base = rasterized_count(&contours);

        for strategy in [MorphologyStrategy::Exact, MorphologyStrategy::SeparableApprox] {
            let grow2 = rasterized_count(&apply_3d_margin(&contours, 2.0, spacing, strategy));
            let grow4 = rasterized_count(&apply_3d_margin(&contours, 4.0, spacing, strategy));
            assert!(base < grow2, "{strategy:?}");
            assert!(grow2 < grow4, "{strategy:?}");

            let shrink2 = rasterized_count(&apply_3d_margin(&contours, -2.0, spacing, strategy));
            let shrink4 = rasterized_count(&apply_3d_margin(&contours, -4.0, spacing, strategy));
            assert!(shrink2 < base, "{strategy:?}");
            assert!(shrink4 < shrink2, "{strategy:?}");
            assert!(shrink4 > 0, "{strategy:?}");
        }
    }

    /// 产出轮廓与输入切片位置一一对应, 且落在生长后的范围内.
    #[test]
    fn test_margin_output_contours() {
        let contours = cube_contours();
        let out = apply_3d_margin(&contours, 3.0, (1.0, 1.0, 1.0), MorphologyStrategy::Exact);

        // 每个原始切片位置恰好一条.
        assert_eq!(out.len(), contours.len());
        for (c, o) in contours.iter().zip(&out) {
            assert_eq!(c.slice_position(), o.slice_position());
            assert!(o.is_well_formed());
            // 膨胀后的轮廓超出原 [10, 20] 范围.
            let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
            for (x, _) in o.vertices() {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
            }
            assert!(min_x < 10.0 && max_x > 20.0);
        }
    }

    /// 缓存入口与免缓存入口产出一致, 且第二次调用命中缓存.
    #[test]
    fn test_margin_cached_matches() {
        let contours = cube_contours();
        let spacing = (1.0, 1.0, 1.0);
        let mut cache = GridCache::new();

        let direct = apply_3d_margin(&contours, 3.0, spacing, MorphologyStrategy::Exact);
        let cached = apply_3d_margin_cached(
            &mut cache,
            &contours,
            3.0,
            spacing,
            MorphologyStrategy::Exact,
        );
        assert_eq!(direct, cached);
        assert_eq!(cache.len(), 1);

        let again = apply_3d_margin_cached(
            &mut cache,
            &contours,
            3.0,
            spacing,
            MorphologyStrategy::Exact,
        );
        assert_eq!(direct, again);
        assert_eq!(cache.len(), 1);
    }
}
