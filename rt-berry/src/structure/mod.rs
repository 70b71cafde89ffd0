//! RT 结构的双重体积表示.
//!
//! 同一个三维结构既可以表示为稀疏的 [`VipStructure`] (逐行游程表),
//! 也可以表示为致密的 [`MaskStructure`] (标准布局体素缓冲).
//! 两种表示各自支持并/交/差布尔代数, 并可以无损互转
//! (VIP 一侧的 "无损" 以归一化后的游程表为准).

mod convert;
mod mask;
mod vip;

pub use mask::{CompactMask, MaskStructure};

pub use vip::VipStructure;
