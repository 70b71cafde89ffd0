//! 合成测试模体 (phantom) 的轮廓生成.

use rt_berry::prelude::*;
use std::f64::consts::TAU;

/// 圆形轮廓的边数.
const CIRCLE_SEGMENTS: usize = 64;

/// 以原点为中心、半径 `radius_mm` 的球: 逐整毫米切片的圆形轮廓.
pub fn sphere(radius_mm: f64) -> Vec<Contour> {
    let r_int = radius_mm.floor() as i64;
    let mut out = Vec::new();
    for z in -r_int..=r_int {
        let z_mm = z as f64;
        let r = (radius_mm * radius_mm - z_mm * z_mm).sqrt();
        if r < 1.0 {
            continue;
        }
        out.push(circle(z_mm, r));
    }
    out
}

/// 边长 `edge_mm`、厚度 `edge_mm` 的立方体: 逐整毫米切片的正方形轮廓.
pub fn cube(edge_mm: f64) -> Vec<Contour> {
    let half = edge_mm / 2.0;
    let layers = edge_mm.floor() as i64;
    (0..=layers)
        .map(|z| {
            let z_mm = z as f64 - half;
            Contour::new(
                z_mm,
                vec![
                    -half, -half, z_mm, half, -half, z_mm, half, half, z_mm, -half, half, z_mm,
                ],
            )
        })
        .collect()
}

/// 单层圆形轮廓.
fn circle(z_mm: f64, radius_mm: f64) -> Contour {
    let mut points = Vec::with_capacity(CIRCLE_SEGMENTS * 3);
    for i in 0..CIRCLE_SEGMENTS {
        let theta = TAU * i as f64 / CIRCLE_SEGMENTS as f64;
        points.push(radius_mm * theta.cos());
        points.push(radius_mm * theta.sin());
        points.push(z_mm);
    }
    Contour::new(z_mm, points)
}

/// 在公共评估网格上光栅化轮廓集合并计数, 作为跨策略的可比度量.
pub fn evaluate_count(contours: &[Contour]) -> usize {
    let grid = Grid::new(120, 120, 80, (-60.0, -60.0, -40.0), (1.0, 1.0, 1.0));
    MaskStructure::from_contours(&grid, contours).voxel_count()
}
