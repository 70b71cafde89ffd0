//! 边界跟踪 (Moore 邻域) 与折线简化.

use crate::consts::voxel::{is_inside, is_outside};
use crate::consts::SIMPLIFY_EPSILON_PX;
use crate::error::EngineError;
use crate::{Idx2d, Idx2dF};
use log::warn;
use ndarray::ArrayView2;

/// 顺时针排列的 8-邻域方向增量, (dy, dx) 顺序, 0 号方向为东.
const DIRS: [(isize, isize); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// 获得 `(y, x)` 的 4-邻居索引. 不检查越界.
#[inline]
fn neighbour4((y, x): Idx2d) -> [Idx2d; 4] {
    [
        (y.wrapping_sub(1), x),
        (y.saturating_add(1), x),
        (y, x.wrapping_sub(1)),
        (y, x.saturating_add(1)),
    ]
}

/// 边界跟踪结果.
#[derive(Debug, Clone)]
pub struct TraceOutcome {
    /// 按边界顺序排列的像素索引, (y, x) 顺序.
    pub points: Vec<Idx2d>,

    /// 是否因步数预算耗尽而提前中止 (此时 `points` 为部分折线).
    pub budget_exceeded: bool,
}

/// 从二值切片中跟踪一条外边界.
///
/// 起点为扫描序下第一个 "内部" 且与背景 4-相邻 (或位于图像边框) 的像素;
/// 之后沿 Moore 邻域行走: 每步从进入方向回退 3 个位置开始顺时针搜索
/// (偏向右转), 直至回到起点或耗尽 `width * height` 的步数预算.
/// 预算耗尽是可恢复情况: 记录一条警告日志并返回已有的部分折线.
///
/// 切片全为背景时返回 `None`.
pub fn trace_boundary(view: ArrayView2<u8>) -> Option<TraceOutcome> {
    let (h, w) = view.dim();
    trace_with_budget(view, w * h)
}

/// 同 [`trace_boundary`], 但允许指定步数预算.
fn trace_with_budget(view: ArrayView2<u8>, budget: usize) -> Option<TraceOutcome> {
    let (h, w) = view.dim();
    let start = find_boundary_start(view)?;

    let mut points = vec![start];
    let mut cur = start;
    // 起点由行扫描发现, 视作自西向东进入.
    let mut incoming = 0usize;
    let mut steps = 0usize;
    let mut budget_exceeded = false;

    loop {
        steps += 1;
        if steps > budget {
            budget_exceeded = true;
            warn!(
                "边界跟踪提前中止, 返回部分折线: {:?}",
                EngineError::StepBudgetExceeded(steps)
            );
            break;
        }

        let mut found = None;
        for turn in 0..DIRS.len() {
            let dir = (incoming + 5 + turn) % DIRS.len();
            let (dy, dx) = DIRS[dir];
            let (ny, nx) = (cur.0 as isize + dy, cur.1 as isize + dx);
            if ny < 0 || nx < 0 || ny as usize >= h || nx as usize >= w {
                continue;
            }
            let next = (ny as usize, nx as usize);
            if is_inside(view[next]) {
                found = Some((dir, next));
                break;
            }
        }

        // 孤立像素: 没有任何前景邻居.
        let Some((dir, next)) = found else {
            break;
        };
        if next == start {
            break;
        }
        points.push(next);
        cur = next;
        incoming = dir;
    }

    Some(TraceOutcome {
        points,
        budget_exceeded,
    })
}

/// 扫描序寻找第一个边界像素: 值为 "内部" 且位于图像边框或与背景 4-相邻.
fn find_boundary_start(view: ArrayView2<u8>) -> Option<Idx2d> {
    let (h, w) = view.dim();
    view.indexed_iter().find_map(|(pos, &v)| {
        if !is_inside(v) {
            return None;
        }
        let (y, x) = pos;
        let on_border = y == 0 || x == 0 || y + 1 == h || x + 1 == w;
        let touching = on_border
            || neighbour4(pos)
                .iter()
                .any(|&p| view.get(p).is_some_and(|&n| is_outside(n)));
        touching.then_some(pos)
    })
}

/// Douglas-Peucker 风格折线简化: 删除到弦线垂距不超过 `epsilon` 的点.
///
/// 首尾两点恒被保留; 输入不足 3 个点时原样返回.
pub fn simplify_polyline(points: &[Idx2dF], epsilon: f64) -> Vec<Idx2dF> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut ranges = vec![(0usize, points.len() - 1)];
    while let Some((a, b)) = ranges.pop() {
        if b <= a + 1 {
            continue;
        }
        let (mut idx, mut dmax) = (a, 0.0f64);
        for i in a + 1..b {
            let d = perpendicular_distance(points[i], points[a], points[b]);
            if d > dmax {
                (idx, dmax) = (i, d);
            }
        }
        if dmax > epsilon {
            keep[idx] = true;
            ranges.push((a, idx));
            ranges.push((idx, b));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// 点 `p` 到弦线 `ab` 的垂距. 弦线退化为点时取两点距离.
fn perpendicular_distance(p: Idx2dF, a: Idx2dF, b: Idx2dF) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let norm = (dx * dx + dy * dy).sqrt();
    if norm == 0.0 {
        return ((p.0 - a.0).powi(2) + (p.1 - a.1).powi(2)).sqrt();
    }
    (dx * (a.1 - p.1) - (a.0 - p.0) * dy).abs() / norm
}

/// 从二值切片中提取一条简化后的边界折线, 以 (x, y) 顺序的连续像素坐标给出.
///
/// 切片全为背景时返回 `None`.
pub fn extract_outline(view: ArrayView2<u8>) -> Option<Vec<Idx2dF>> {
    let outcome = trace_boundary(view)?;
    let px: Vec<Idx2dF> = outcome
        .points
        .iter()
        .map(|&(y, x)| (x as f64, y as f64))
        .collect();
    Some(simplify_polyline(&px, SIMPLIFY_EPSILON_PX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::voxel::INSIDE;
    use ndarray::Array2;

    fn square_mask(n: usize, lo: usize, hi: usize) -> Array2<u8> {
        let mut m = Array2::zeros((n, n));
        for y in lo..hi {
            for x in lo..hi {
                m[(y, x)] = INSIDE;
            }
        }
        m
    }

    /// 追踪 4x4 正方形块的边界.
    #[test]
    fn test_trace_square() {
        let m = square_mask(8, 2, 6);
        let outcome = trace_boundary(m.view()).unwrap();
        assert!(!outcome.budget_exceeded);

        // 边界像素恰为外圈一周: 4*4 的块周长为 12 个像素.
        assert_eq!(outcome.points.len(), 12);
        assert_eq!(outcome.points[0], (2, 2));
        for &(y, x) in &outcome.points {
            assert!((2..6).contains(&y) && (2..6).contains(&x));
            assert!(y == 2 || y == 5 || x == 2 || x == 5);
        }
    }

    /// 孤立单像素产出单点折线; 全背景产出 None.
    #[test]
    fn test_trace_degenerate() {
        let mut m = Array2::zeros((4, 4));
        assert!(trace_boundary(m.view()).is_none());

        m[(2, 1)] = INSIDE;
        let outcome = trace_boundary(m.view()).unwrap();
        assert_eq!(outcome.points, vec![(2, 1)]);
        assert!(!outcome.budget_exceeded);
    }

    /// 预算耗尽时返回部分折线并打上标记.
    #[test]
    fn test_trace_budget() {
        let m = square_mask(8, 1, 7);
        let outcome = trace_with_budget(m.view(), 3).unwrap();
        assert!(outcome.budget_exceeded);
        // 起点 + 预算内的 3 步.
        assert_eq!(outcome.points.len(), 4);
    }

    /// 共线点被简化掉, 拐角点被保留.
    #[test]
    fn test_simplify_collinear() {
        let line: Vec<_> = (0..10).map(|i| (i as f64, 0.0)).collect();
        assert_eq!(simplify_polyline(&line, 0.5), vec![(0.0, 0.0), (9.0, 0.0)]);

        let corner = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0)];
        assert_eq!(simplify_polyline(&corner, 0.5).len(), 3);
    }

    /// 提取的外轮廓是简化后的正方形四角.
    #[test]
    fn test_extract_outline() {
        let m = square_mask(10, 2, 8);
        let outline = extract_outline(m.view()).unwrap();
        assert!(outline.len() >= 4);
        for &(x, y) in &outline {
            assert!(x == 2.0 || x == 7.0 || y == 2.0 || y == 7.0);
        }
    }
}
