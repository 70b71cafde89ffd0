#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供放射治疗 (RT) 解剖结构的双重体积表示与相关几何算法.
//!
//! 同一个三维结构可以表示为:
//!
//! 1. 稀疏 **VIP** (voxel index pair) 游程表示: 每行一张半开区间表;
//! 2. 致密 **掩膜** 表示: 一块值域为 {0, 1} 的标准布局三维体素缓冲.
//!
//! 两种表示之间可以无损互转, 并都支持并/交/差布尔代数.
//! 临床轮廓 (逐切片多边形) 经由扫描线光栅化进入体素世界,
//! 再经由边界跟踪回到轮廓世界; 三维 margin 引擎在二者之间
//! 完成以毫米计的球形膨胀/腐蚀.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 布尔运算只校验操作数网格的体素维度, **不校验** spacing 与 origin
//!    (约定由上游完成重采样). 详见 [`Grid::is_compatible`].
//! 2. 在非期望情况下 (API 误用), 程序会直接 panic, 而不会导致内存错误.
//!    As what Rust promises.
//!
//! # 功能一览
//!
//! ### 单行游程区间代数 ✅
//!
//! 排序、合并 (相邻即合并)、求交、求差. 实现位于 `rt-berry/src/interval.rs`.
//!
//! ### VIP / 掩膜双表示与互转 ✅
//!
//! 实现位于 `rt-berry/src/structure`.
//!
//! ### 扫描线光栅化与边界跟踪 ✅
//!
//! even-odd 扫描线填充; Moore 邻域边界跟踪 + Douglas-Peucker 简化.
//! 实现位于 `rt-berry/src/raster`.
//!
//! ### 三维 margin 形态学 ✅
//!
//! 球形结构元的精确实现与可分离近似实现, 以及工作网格缓存.
//! 实现位于 `rt-berry/src/margin`.
//!
//! ### 任务分发器 ✅
//!
//! 工作线程池上的单发请求/响应信封. 实现位于 `rt-berry/src/job.rs`.

/// 二维索引, (y, x) 顺序. 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, (z, y, x) 顺序. 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 高精度通用平面坐标, (x, y) 顺序. 该结构不对外公开.
type Idx2dF = (f64, f64);

/// 三维世界坐标或逐轴间距, 以毫米为单位, (x, y, z) 顺序.
pub type Mm3 = (f64, f64, f64);

pub mod consts;

mod contour;

pub use contour::Contour;

mod error;

pub use error::{EngineError, EngineResult};

mod grid;

pub use grid::Grid;

pub mod interval;

pub mod job;

pub mod margin;

pub mod raster;

pub mod structure;

pub use structure::{CompactMask, MaskStructure, VipStructure};

pub mod prelude;
