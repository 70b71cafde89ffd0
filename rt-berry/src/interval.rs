//! 单行游程 (voxel index pair) 区间代数.
//!
//! 一条游程代表某一行上连续的 "内部" 体素段, 以半开区间
//! `[x_start, x_start + length)` 表示. 同一行的游程表在 **归一化** 之后
//! 按 `index` 升序排列, 且任意两条游程互不重叠、互不相邻
//! (相邻即合并是不变式, 不是优化).
//!
//! 本模块的三个操作都以单行游程表为单位; 跨行的组织方式见
//! [`crate::VipStructure`].

/// 单行上的一条游程.
///
/// `index` 是行内全局索引 `y * x_size + x_start`; `length` 恒为正.
/// 出于紧凑存储的考虑, 两个字段均为 `u32`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoxelIndexPair {
    index: u32,
    length: u32,
}

impl VoxelIndexPair {
    /// 创建一条游程. 当 `length == 0` 时 panic.
    #[inline]
    pub fn new(index: u32, length: u32) -> Self {
        assert!(length > 0, "游程长度必须为正");
        Self { index, length }
    }

    /// 获取起始索引 (含).
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// 获取游程长度.
    #[inline]
    pub fn length(&self) -> u32 {
        self.length
    }

    /// 获取结束索引 (不含).
    #[inline]
    pub fn end(&self) -> u32 {
        self.index + self.length
    }
}

/// 归一化一行游程: 按 `index` 排序, 然后合并所有重叠或 **相邻** 的游程.
///
/// 相邻判定使用 `next.index <= cur.end()` (注意是 `<=`):
/// 首尾相接的两条游程总是被并成一条. 结果满足模块级不变式,
/// 且对已归一化输入幂等.
pub fn merge(mut runs: Vec<VoxelIndexPair>) -> Vec<VoxelIndexPair> {
    if runs.len() <= 1 {
        return runs;
    }
    runs.sort_unstable_by_key(VoxelIndexPair::index);

    let mut out = Vec::with_capacity(runs.len());
    let mut it = runs.into_iter();
    // len >= 2, 首元素必然存在.
    let mut cur = it.next().unwrap();
    for next in it {
        if next.index <= cur.end() {
            let end = cur.end().max(next.end());
            cur.length = end - cur.index;
        } else {
            out.push(cur);
            cur = next;
        }
    }
    out.push(cur);
    out
}

/// 计算两张已归一化游程表的交集 (双指针扫描).
///
/// 对每一对相交游程产出 `[max(起点), min(终点))`; 先结束的一侧指针前进.
/// 输入未归一化时结果无意义.
pub fn overlap(a: &[VoxelIndexPair], b: &[VoxelIndexPair]) -> Vec<VoxelIndexPair> {
    let (mut i, mut j) = (0usize, 0usize);
    let mut out = Vec::new();
    while i < a.len() && j < b.len() {
        let lo = a[i].index().max(b[j].index());
        let hi = a[i].end().min(b[j].end());
        if lo < hi {
            out.push(VoxelIndexPair::new(lo, hi - lo));
        }
        if a[i].end() <= b[j].end() {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

/// 从已归一化的 `a` 中去掉被 `b` 覆盖的部分.
///
/// 对 `a` 的每条游程, 反复用与之重叠的 `b` 游程切分, 产出左右残段;
/// 单条游程可能被完全吞掉 (不产出任何残段), 一条 `b` 游程也可能
/// 连续覆盖多条 `a` 游程. 结果最后统一重新归一化.
pub fn subtract(a: &[VoxelIndexPair], b: &[VoxelIndexPair]) -> Vec<VoxelIndexPair> {
    let mut out = Vec::with_capacity(a.len());
    let mut j = 0usize;
    for r in a {
        let (mut start, end) = (r.index(), r.end());
        // 在当前游程起点之前就已结束的 b 游程对后续 a 游程同样无效, 永久跳过.
        while j < b.len() && b[j].end() <= start {
            j += 1;
        }
        let mut k = j;
        while k < b.len() && b[k].index() < end {
            if b[k].index() > start {
                out.push(VoxelIndexPair::new(start, b[k].index() - start));
            }
            start = start.max(b[k].end());
            if start >= end {
                break;
            }
            k += 1;
        }
        if start < end {
            out.push(VoxelIndexPair::new(start, end - start));
        }
    }
    merge(out)
}
