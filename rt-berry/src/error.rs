//! 引擎运行时错误.

use crate::Idx3d;

/// 几何/体积引擎的运行时错误.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// 两个操作数的网格体素维度不一致.
    ///
    /// 两个参数依次为左、右操作数的形状 (z, y, x).
    /// 该错误在任何实际计算开始之前抛出, 不存在部分写入.
    GridMismatch(Idx3d, Idx3d),

    /// 轮廓不合法: 顶点坐标分量不足 9 个, 或切片位置非有限值.
    ///
    /// 批量入口把此类轮廓静默跳过, 单条轮廓校验则返回该错误.
    MalformedContour,

    /// 未知操作名. 参数为原始输入.
    UnknownOperation(String),

    /// 未知后端名, 或后端与操作数表示不一致. 参数为问题描述.
    UnknownBackend(String),

    /// 边界跟踪超出步数预算. 参数为已经走过的步数.
    ///
    /// 该错误是可恢复的: 跟踪器记录一条警告日志并返回已有的部分折线.
    StepBudgetExceeded(usize),
}

/// 引擎操作结果.
pub type EngineResult<T> = Result<T, EngineError>;
