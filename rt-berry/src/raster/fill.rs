//! 扫描线多边形填充 (even-odd 规则).

use crate::consts::voxel::INSIDE;
use crate::Idx2dF;
use itertools::Itertools;
use ndarray::{s, Array2};
use num::ToPrimitive;
use ordered_float::NotNan;

/// 将连续像素坐标系下的多边形填充为 `(y_size, x_size)` 的二值掩膜.
///
/// 经典 even-odd 扫描线: 每行在 `y + 0.5` 处采样, 对所有跨越该扫描线的边
/// (判定条件 `min_y < scan_y <= max_y`, 水平边因此自然被排除)
/// 线性插值求 x 截点, 排序后成对取区间, 覆盖区间内像素中心的像素置 1,
/// 并裁剪到 `[0, x_size)`.
///
/// 顶点不足 3 个时返回全空掩膜, 不报错.
pub fn fill_polygon(vertices: &[Idx2dF], x_size: usize, y_size: usize) -> Array2<u8> {
    let mut out = Array2::zeros((y_size, x_size));
    if vertices.len() < 3 {
        return out;
    }

    let mut intercepts: Vec<NotNan<f64>> = Vec::new();
    for (y, mut row) in out.outer_iter_mut().enumerate() {
        let scan_y = y as f64 + 0.5;

        intercepts.clear();
        for ((x0, y0), (x1, y1)) in vertices.iter().copied().circular_tuple_windows::<(_, _)>() {
            let (min_y, max_y) = if y0 < y1 { (y0, y1) } else { (y1, y0) };
            if !(min_y < scan_y && scan_y <= max_y) {
                continue;
            }
            let x = x0 + (scan_y - y0) * (x1 - x0) / (y1 - y0);
            if let Ok(x) = NotNan::new(x) {
                intercepts.push(x);
            }
        }
        intercepts.sort_unstable();

        for span in intercepts.chunks_exact(2) {
            let (xa, xb) = (span[0].into_inner(), span[1].into_inner());
            // 覆盖像素中心 x + 0.5 ∈ [xa, xb) 的像素.
            let lo = (xa - 0.5).ceil().max(0.0);
            let hi = (xb - 0.5).ceil().min(x_size as f64);
            let (Some(lo), Some(hi)) = (lo.to_usize(), hi.to_usize()) else {
                continue;
            };
            if lo < hi {
                row.slice_mut(s![lo..hi]).fill(INSIDE);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(mask: &Array2<u8>) -> usize {
        mask.iter().filter(|&&v| v == INSIDE).count()
    }

    /// 正方形 [2,8]x[2,8] 恰好覆盖 36 个像素.
    #[test]
    fn test_fill_square() {
        let square = [(2.0, 2.0), (8.0, 2.0), (8.0, 8.0), (2.0, 8.0)];
        let mask = fill_polygon(&square, 10, 10);
        assert_eq!(count(&mask), 36);

        // 覆盖区域恰为像素 [2, 8) x [2, 8).
        for ((y, x), &v) in mask.indexed_iter() {
            let expect = (2..8).contains(&x) && (2..8).contains(&y);
            assert_eq!(v == INSIDE, expect, "({y}, {x})");
        }
    }

    /// 顶点不足 3 个时产出空掩膜.
    #[test]
    fn test_fill_degenerate() {
        assert_eq!(count(&fill_polygon(&[], 8, 8)), 0);
        assert_eq!(count(&fill_polygon(&[(1.0, 1.0)], 8, 8)), 0);
        assert_eq!(count(&fill_polygon(&[(1.0, 1.0), (5.0, 5.0)], 8, 8)), 0);
    }

    /// 超出网格的多边形被裁剪而非报错.
    #[test]
    fn test_fill_clamping() {
        let square = [(-4.0, -4.0), (4.0, -4.0), (4.0, 4.0), (-4.0, 4.0)];
        let mask = fill_polygon(&square, 8, 8);
        // 只有 [0, 4) x [0, 4) 落在网格内.
        assert_eq!(count(&mask), 16);
    }

    /// 三角形: even-odd 规则下行覆盖宽度随扫描线线性变化.
    #[test]
    fn test_fill_triangle() {
        let tri = [(0.0, 0.0), (8.0, 0.0), (0.0, 8.0)];
        let mask = fill_polygon(&tri, 8, 8);
        for ((y, x), &v) in mask.indexed_iter() {
            // 斜边为 x + y = 8, 像素中心在其下方才被覆盖.
            let expect = (x as f64 + 0.5) + (y as f64 + 0.5) < 8.0;
            assert_eq!(v == INSIDE, expect, "({y}, {x})");
        }
    }
}
