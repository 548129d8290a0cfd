//! A non-concurrent mark and sweep collector.
//!
//! Every allocation is prefixed by a [`Header`] and tracked in an allocation
//! table keyed by the data pointer handed out to callers. Objects carry no
//! reference layout, so marking only reaches the roots themselves.

use std::{
    alloc::{alloc, dealloc, Layout},
    collections::HashMap,
    mem::size_of,
    ptr::NonNull,
};

/// Alignment of every allocation, and offset of the data from its header.
const ALIGN: usize = 16;

const _: () = assert!(size_of::<Header>() <= ALIGN);

#[repr(C)]
struct Header {
    /// Requested size, excluding the header.
    size: usize,
    marked: bool,
}

/// A snapshot of a tracked allocation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ObjectRecord {
    pub size: usize,
    pub marked: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    OutOfMemory { size: usize },
}

#[derive(Default)]
pub struct GarbageCollector {
    /// Data pointer to header.
    objects: HashMap<NonNull<u8>, NonNull<Header>>,
    /// Always a subset of the tracked data pointers. May hold duplicates.
    roots: Vec<NonNull<u8>>,
}

impl GarbageCollector {
    pub fn new() -> GarbageCollector {
        GarbageCollector::default()
    }

    /// Allocates `size` zeroed bytes, returning the data pointer. The
    /// allocation is tracked, but not rooted, so the next collection frees it
    /// unless [`GarbageCollector::add_root`] is called.
    pub fn allocate(&mut self, size: usize) -> Result<NonNull<u8>, Error> {
        let layout = Self::layout(size).ok_or(Error::OutOfMemory { size })?;

        // SAFETY: The layout is never zero-sized, since it includes the header.
        let base = unsafe { alloc(layout) };
        let Some(base) = NonNull::new(base) else {
            return Err(Error::OutOfMemory { size });
        };

        let header = base.cast::<Header>();
        // SAFETY: `base` is valid for `layout.size()` bytes and aligned to
        // `ALIGN`, which satisfies both `Header` and the data offset.
        let data = unsafe {
            header.as_ptr().write(Header {
                size,
                marked: false,
            });
            let data = NonNull::new_unchecked(base.as_ptr().add(ALIGN));
            data.as_ptr().write_bytes(0, size);
            data
        };

        self.objects.insert(data, header);
        Ok(data)
    }

    /// Roots `ptr`. Untracked pointers are ignored.
    pub fn add_root(&mut self, ptr: NonNull<u8>) {
        if self.is_tracked(ptr) {
            self.roots.push(ptr);
        }
    }

    /// Removes every occurrence of `ptr` from the root set.
    pub fn remove_root(&mut self, ptr: NonNull<u8>) {
        self.roots.retain(|&root| root != ptr);
    }

    /// Frees every allocation not reachable from the roots. Survivors have their
    /// mark reset.
    pub fn collect(&mut self) {
        self.mark();
        self.sweep();
    }

    fn mark(&mut self) {
        for root in &self.roots {
            if let Some(header) = self.objects.get(root) {
                // SAFETY: Tracked headers are live until swept.
                unsafe { (*header.as_ptr()).marked = true };
            }
        }
    }

    fn sweep(&mut self) {
        self.objects.retain(|_, &mut header| {
            // SAFETY: Tracked headers are live until swept.
            let header_ref = unsafe { &mut *header.as_ptr() };
            if header_ref.marked {
                header_ref.marked = false;
                true
            } else {
                // SAFETY: Removed from the table right after, hence freed once.
                unsafe { Self::free(header) };
                false
            }
        });
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn is_tracked(&self, ptr: NonNull<u8>) -> bool {
        self.objects.contains_key(&ptr)
    }

    pub fn record(&self, ptr: NonNull<u8>) -> Option<ObjectRecord> {
        let header = self.objects.get(&ptr)?;
        // SAFETY: Tracked headers are live until swept.
        let header = unsafe { header.as_ref() };
        Some(ObjectRecord {
            size: header.size,
            marked: header.marked,
        })
    }

    pub fn roots(&self) -> &[NonNull<u8>] {
        &self.roots
    }

    fn layout(size: usize) -> Option<Layout> {
        let total = size.checked_add(ALIGN)?;
        Layout::from_size_align(total, ALIGN).ok()
    }

    /// # Safety
    ///
    /// `header` must come from [`GarbageCollector::allocate`] and must not have
    /// been freed already.
    unsafe fn free(header: NonNull<Header>) {
        let size = header.as_ref().size;
        // Known to be valid, since the same layout was used to allocate.
        let layout = Layout::from_size_align_unchecked(size + ALIGN, ALIGN);
        dealloc(header.as_ptr().cast(), layout);
    }
}

impl Drop for GarbageCollector {
    fn drop(&mut self) {
        for (_, header) in self.objects.drain() {
            // SAFETY: Each tracked header is freed exactly once, here.
            unsafe { Self::free(header) };
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_allocate_tracks_zeroed_memory() {
        let mut gc = GarbageCollector::new();
        let ptr = gc.allocate(32).unwrap();

        assert!(gc.is_tracked(ptr));
        assert_eq!(gc.len(), 1);
        assert_eq!(ptr.as_ptr() as usize % ALIGN, 0);
        assert_eq!(
            gc.record(ptr),
            Some(ObjectRecord {
                size: 32,
                marked: false
            })
        );

        let bytes = unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), 32) };
        assert!(bytes.iter().all(|&b| b == 0));
        bytes.copy_from_slice(&[7; 32]);
        assert_eq!(bytes[31], 7);
    }

    #[test]
    fn test_allocate_zero_bytes() {
        let mut gc = GarbageCollector::new();
        let a = gc.allocate(0).unwrap();
        let b = gc.allocate(0).unwrap();
        assert_ne!(a, b);
        assert_eq!(gc.len(), 2);
    }

    #[test]
    fn test_allocate_too_large() {
        let mut gc = GarbageCollector::new();
        assert_eq!(
            gc.allocate(usize::MAX),
            Err(Error::OutOfMemory { size: usize::MAX })
        );
        assert!(gc.is_empty());
    }

    #[test]
    fn test_collect_frees_unrooted() {
        let mut gc = GarbageCollector::new();
        let rooted = gc.allocate(8).unwrap();
        let garbage = gc.allocate(8).unwrap();
        gc.add_root(rooted);

        gc.collect();

        assert!(gc.is_tracked(rooted));
        assert!(!gc.is_tracked(garbage));
        assert_eq!(gc.len(), 1);
        assert_eq!(
            gc.record(rooted),
            Some(ObjectRecord {
                size: 8,
                marked: false
            })
        );
        assert_eq!(gc.record(garbage), None);
    }

    #[test]
    fn test_collect_twice_keeps_roots() {
        let mut gc = GarbageCollector::new();
        let ptr = gc.allocate(16).unwrap();
        gc.add_root(ptr);

        gc.collect();
        gc.collect();

        assert!(gc.is_tracked(ptr));
        assert_eq!(gc.record(ptr).map(|r| r.marked), Some(false));
    }

    #[test]
    fn test_add_root_ignores_untracked() {
        let mut gc = GarbageCollector::new();
        let mut local = 0_u8;
        gc.add_root(NonNull::from(&mut local));
        assert!(gc.roots().is_empty());
    }

    #[test]
    fn test_remove_root_removes_every_occurrence() {
        let mut gc = GarbageCollector::new();
        let ptr = gc.allocate(4).unwrap();
        gc.add_root(ptr);
        gc.add_root(ptr);
        assert_eq!(gc.roots(), [ptr, ptr]);

        gc.remove_root(ptr);
        assert!(gc.roots().is_empty());

        gc.collect();
        assert!(gc.is_empty());
    }

    #[test]
    fn test_drop_frees_live_allocations() {
        let mut gc = GarbageCollector::new();
        for size in [1, 64, 1024] {
            let ptr = gc.allocate(size).unwrap();
            gc.add_root(ptr);
        }
        gc.allocate(3).unwrap();
        assert_eq!(gc.len(), 4);
        drop(gc);
    }
}
