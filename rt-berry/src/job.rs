//! 任务分发器: 把布尔运算请求派发到专用工作线程池.
//!
//! 每个任务都是输入的纯函数: 无共享可变状态, 无锁, 无重试, 无取消 —
//! 已派发的任务总是运行至完成或失败. 响应经由通道送回, 由调用者按
//! `job_id` 匹配 (没有内建请求队列与背压). 任何任务内失败都被捕获进
//! 响应信封, 不会越过线程边界抛出.

use crate::error::{EngineError, EngineResult};
use crate::structure::{MaskStructure, VipStructure};
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, Sender};
use threadpool::ThreadPool;

/// 集合布尔操作种类.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operation {
    /// 并集.
    Union,

    /// 交集.
    Intersect,

    /// 差集.
    Subtract,
}

impl FromStr for Operation {
    type Err = EngineError;

    /// 解析线上操作名. 未知名字返回 [`EngineError::UnknownOperation`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "union" => Ok(Self::Union),
            "intersect" => Ok(Self::Intersect),
            "subtract" => Ok(Self::Subtract),
            other => Err(EngineError::UnknownOperation(other.to_string())),
        }
    }
}

/// 运算后端: 以哪种表示执行布尔运算.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Backend {
    /// 稀疏 VIP 游程表示.
    Vip,

    /// 致密体素掩膜表示.
    Mask,
}

impl FromStr for Backend {
    type Err = EngineError;

    /// 解析线上后端名. 未知名字返回 [`EngineError::UnknownBackend`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vip" => Ok(Self::Vip),
            "mask" => Ok(Self::Mask),
            other => Err(EngineError::UnknownBackend(other.to_string())),
        }
    }
}

/// 单个操作数.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JobOperand {
    /// VIP 表示的结构.
    Vip(VipStructure),

    /// 掩膜表示的结构.
    Mask(MaskStructure),
}

impl JobOperand {
    /// 获取该操作数对应的后端.
    #[inline]
    pub fn backend(&self) -> Backend {
        match self {
            Self::Vip(_) => Backend::Vip,
            Self::Mask(_) => Backend::Mask,
        }
    }
}

/// 运算结果载荷.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JobOutput {
    /// VIP 表示的结果.
    Vip(VipStructure),

    /// 掩膜表示的结果.
    Mask(MaskStructure),
}

/// 任务请求信封.
///
/// 该结构完全透明, 调用者直接填充各字段. `job_id` 仅用于响应匹配,
/// 引擎不解释其含义.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JobRequest {
    /// 调用者提供的关联标识.
    pub job_id: u64,

    /// 操作种类.
    pub operation: Operation,

    /// 期望的运算后端. 必须与两个操作数的表示一致.
    pub backend: Backend,

    /// 左操作数.
    pub a: JobOperand,

    /// 右操作数.
    pub b: JobOperand,
}

/// 任务响应信封.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JobResponse {
    /// 成功: 携带后端与运算结果.
    Success {
        /// 请求中的关联标识.
        job_id: u64,

        /// 实际执行的后端.
        backend: Backend,

        /// 运算结果.
        result: JobOutput,
    },

    /// 失败: 携带调试格式的错误描述.
    Failure {
        /// 请求中的关联标识.
        job_id: u64,

        /// 错误描述.
        error: String,
    },
}

impl JobResponse {
    /// 获取关联标识.
    #[inline]
    pub fn job_id(&self) -> u64 {
        match self {
            Self::Success { job_id, .. } | Self::Failure { job_id, .. } => *job_id,
        }
    }

    /// 响应是否成功?
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// 同步执行单个请求.
///
/// 纯函数: 任何失败 (包括网格不匹配、后端与操作数不一致) 都被捕获进
/// [`JobResponse::Failure`], 不会 panic.
pub fn execute(req: JobRequest) -> JobResponse {
    let JobRequest {
        job_id,
        operation,
        backend,
        a,
        b,
    } = req;
    match run_boolean(operation, backend, a, b) {
        Ok(result) => JobResponse::Success {
            job_id,
            backend,
            result,
        },
        Err(e) => JobResponse::Failure {
            job_id,
            error: format!("{e:?}"),
        },
    }
}

/// 校验后端一致性并执行布尔运算.
fn run_boolean(
    op: Operation,
    backend: Backend,
    a: JobOperand,
    b: JobOperand,
) -> EngineResult<JobOutput> {
    match (backend, a, b) {
        (Backend::Vip, JobOperand::Vip(a), JobOperand::Vip(b)) => {
            let result = match op {
                Operation::Union => a.union(&b),
                Operation::Intersect => a.intersect(&b),
                Operation::Subtract => a.subtract(&b),
            }?;
            Ok(JobOutput::Vip(result))
        }
        (Backend::Mask, JobOperand::Mask(a), JobOperand::Mask(b)) => {
            let result = match op {
                Operation::Union => a.union(&b),
                Operation::Intersect => a.intersect(&b),
                Operation::Subtract => a.subtract(&b),
            }?;
            Ok(JobOutput::Mask(result))
        }
        (backend, a, b) => Err(EngineError::UnknownBackend(format!(
            "后端 {backend:?} 与操作数表示 ({:?}, {:?}) 不一致",
            a.backend(),
            b.backend()
        ))),
    }
}

/// 任务分发器.
///
/// 内部持有一个专用工作线程池, 长耗时的体积运算不会阻塞调用方线程.
/// 派发是 fire-and-forget 的; 响应经由创建时返回的接收端取回.
pub struct JobDispatcher {
    pool: ThreadPool,
    tx: Sender<JobResponse>,
}

impl JobDispatcher {
    /// 以 `workers` 个工作线程创建分发器, 返回分发器与响应接收端.
    ///
    /// `workers == 0` 时 panic.
    pub fn new(workers: usize) -> (Self, Receiver<JobResponse>) {
        assert!(workers > 0, "至少需要一个工作线程");
        let (tx, rx) = mpsc::channel();
        (
            Self {
                pool: ThreadPool::new(workers),
                tx,
            },
            rx,
        )
    }

    /// 以可并行核心数创建分发器.
    #[inline]
    pub fn with_default_workers() -> (Self, Receiver<JobResponse>) {
        Self::new(cpus())
    }

    /// 派发一个请求. 立即返回; 结果稍后出现在响应通道上.
    ///
    /// 接收端已被丢弃时, 响应被静默丢弃.
    pub fn dispatch(&self, req: JobRequest) {
        let tx = self.tx.clone();
        self.pool.execute(move || {
            tx.send(execute(req)).ok();
        });
    }

    /// 阻塞等待所有已派发任务执行完毕.
    #[inline]
    pub fn join(&self) {
        self.pool.join();
    }
}

/// 获得可并行核心数.
fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}
