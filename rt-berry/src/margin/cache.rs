//! 工作网格缓存.

use super::voxel_grid::VoxelGrid;
use crate::contour::Contour;
use crate::Mm3;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// 由调用者持有的工作网格缓存.
///
/// 键是 (轮廓集合, margin, spacing) 的 **内容哈希**: 每个坐标分量的位模式
/// 都参与哈希, 因此等长但内容不同的轮廓集合不会相互碰撞.
/// margin 或轮廓集合发生任何变化都会落到新键上, 旧条目自然失效,
/// 也可以通过 [`Self::invalidate`] / [`Self::clear`] 显式清除.
///
/// 所有修改方法都要求 `&mut self`, 单写者纪律由借用检查天然保证;
/// 需要跨线程共享时, 请由调用者包一层互斥锁.
#[derive(Debug, Default)]
pub struct GridCache {
    entries: HashMap<u64, VoxelGrid>,
}

impl GridCache {
    /// 创建空缓存.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 计算一次 margin 调用的内容哈希键.
    pub fn content_key(contours: &[Contour], margin_mm: f64, spacing: Mm3) -> u64 {
        let mut h = DefaultHasher::new();
        contours.len().hash(&mut h);
        for c in contours {
            c.slice_position().to_bits().hash(&mut h);
            c.points().len().hash(&mut h);
            for p in c.points() {
                p.to_bits().hash(&mut h);
            }
        }
        margin_mm.to_bits().hash(&mut h);
        spacing.0.to_bits().hash(&mut h);
        spacing.1.to_bits().hash(&mut h);
        spacing.2.to_bits().hash(&mut h);
        h.finish()
    }

    /// 查表, 未命中时构建并登记.
    ///
    /// 轮廓集合不含任何合法轮廓 (无法构建工作网格) 时返回 `None`.
    pub(crate) fn fetch_or_build(
        &mut self,
        contours: &[Contour],
        margin_mm: f64,
        spacing: Mm3,
    ) -> Option<&VoxelGrid> {
        let key = Self::content_key(contours, margin_mm, spacing);
        if !self.entries.contains_key(&key) {
            let built = VoxelGrid::build(contours, spacing)?;
            self.entries.insert(key, built);
        }
        self.entries.get(&key)
    }

    /// 使单个键失效. 返回值指示该键原先是否存在.
    #[inline]
    pub fn invalidate(&mut self, key: u64) -> bool {
        self.entries.remove(&key).is_some()
    }

    /// 清空所有条目.
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 获取条目个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 缓存是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_contour(z: f64, lo: f64, hi: f64) -> Contour {
        Contour::new(z, vec![lo, lo, z, hi, lo, z, hi, hi, z, lo, hi, z])
    }

    /// 等长但内容不同的轮廓集合必须落在不同键上.
    #[test]
    fn test_content_key_no_length_collision() {
        let spacing = (1.0, 1.0, 1.0);
        let a = [square_contour(0.0, 0.0, 10.0)];
        let b = [square_contour(0.0, 0.0, 12.0)];

        assert_ne!(
            GridCache::content_key(&a, 5.0, spacing),
            GridCache::content_key(&b, 5.0, spacing)
        );
        // margin 改变同样换键.
        assert_ne!(
            GridCache::content_key(&a, 5.0, spacing),
            GridCache::content_key(&a, -5.0, spacing)
        );
        // 完全相同的输入键稳定.
        assert_eq!(
            GridCache::content_key(&a, 5.0, spacing),
            GridCache::content_key(&a, 5.0, spacing)
        );
    }

    /// 命中复用, 失效与清空.
    #[test]
    fn test_cache_lifecycle() {
        let spacing = (1.0, 1.0, 1.0);
        let contours = [square_contour(0.0, 0.0, 10.0)];
        let mut cache = GridCache::new();

        assert!(cache.fetch_or_build(&contours, 5.0, spacing).is_some());
        assert_eq!(cache.len(), 1);
        // 相同输入命中同一条目.
        assert!(cache.fetch_or_build(&contours, 5.0, spacing).is_some());
        assert_eq!(cache.len(), 1);
        // margin 不同 → 新条目.
        assert!(cache.fetch_or_build(&contours, 8.0, spacing).is_some());
        assert_eq!(cache.len(), 2);

        let key = GridCache::content_key(&contours, 5.0, spacing);
        assert!(cache.invalidate(key));
        assert!(!cache.invalidate(key));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());

        // 不可构建的输入不登记条目.
        assert!(cache.fetch_or_build(&[], 5.0, spacing).is_none());
        assert!(cache.is_empty());
    }
}
