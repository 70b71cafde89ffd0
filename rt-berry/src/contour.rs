//! 临床轮廓对象.

use crate::consts::MIN_CONTOUR_COORDS;
use crate::error::{EngineError, EngineResult};
use crate::Idx2dF;

/// 单条平面轮廓: 所在切片的世界 Z 坐标与展平的多边形顶点表.
///
/// 顶点表为 `[x0, y0, z0, x1, y1, z1, ...]` 形式的世界坐标 (毫米),
/// 多边形无孔洞; 自相交不做校验. 末尾不足一个顶点的零散分量被忽略.
///
/// 该结构只在引擎边界出现: 引擎内部除光栅化/边界跟踪的瞬态外不存储轮廓.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contour {
    slice_position: f64,
    points: Vec<f64>,
}

impl Contour {
    /// 直接创建轮廓. 不做任何校验 — 不合法的轮廓可以存在,
    /// 引擎的批量入口会把它们静默跳过 (见 [`Self::is_well_formed`]).
    #[inline]
    pub fn new(slice_position: f64, points: Vec<f64>) -> Self {
        Self {
            slice_position,
            points,
        }
    }

    /// 获取所在切片的世界 Z 坐标 (毫米).
    #[inline]
    pub fn slice_position(&self) -> f64 {
        self.slice_position
    }

    /// 获取展平的顶点坐标表.
    #[inline]
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// 获取完整顶点个数.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.points.len() / 3
    }

    /// 获取按序迭代顶点平面坐标 (x, y) 的迭代器.
    #[inline]
    pub fn vertices(&self) -> impl Iterator<Item = Idx2dF> + '_ {
        self.points.chunks_exact(3).map(|p| (p[0], p[1]))
    }

    /// 校验轮廓: 顶点坐标分量不足 [`MIN_CONTOUR_COORDS`] 个,
    /// 或切片位置非有限值时返回 [`EngineError::MalformedContour`].
    pub fn validate(&self) -> EngineResult<()> {
        if self.slice_position.is_finite() && self.points.len() >= MIN_CONTOUR_COORDS {
            Ok(())
        } else {
            Err(EngineError::MalformedContour)
        }
    }

    /// 轮廓是否合法?
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.validate().is_ok()
    }
}
