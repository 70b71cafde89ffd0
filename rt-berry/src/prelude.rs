//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d, Mm3};

pub use crate::contour::Contour;
pub use crate::error::{EngineError, EngineResult};
pub use crate::grid::Grid;
pub use crate::interval::VoxelIndexPair;
pub use crate::structure::{CompactMask, MaskStructure, VipStructure};

pub use crate::job::{
    Backend, JobDispatcher, JobOperand, JobOutput, JobRequest, JobResponse, Operation,
};
pub use crate::margin::{apply_3d_margin, apply_3d_margin_cached, GridCache, MorphologyStrategy};

pub use crate::consts::voxel::{INSIDE, OUTSIDE};
