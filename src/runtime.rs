use std::{io, ptr::NonNull};

use crate::gc::{self, GarbageCollector};

/// The services generated code links against. Owns the collector.
pub struct Runtime<W> {
    gc: GarbageCollector,
    out: W,
}

impl Runtime<io::Stdout> {
    pub fn stdout() -> Runtime<io::Stdout> {
        Runtime::new(io::stdout())
    }
}

impl<W: io::Write> Runtime<W> {
    pub fn new(out: W) -> Runtime<W> {
        Runtime {
            gc: GarbageCollector::new(),
            out,
        }
    }

    /// Writes `text` followed by a line break.
    pub fn print(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    /// Best-effort check of a textual value against a type name. Unknown type
    /// names always pass.
    pub fn check_type(value: &str, type_name: &str) -> bool {
        match type_name {
            "int" => value.parse::<i32>().is_ok(),
            "float" => value.parse::<f32>().is_ok(),
            _ => true,
        }
    }

    /// Allocates through the collector. The result must be rooted with
    /// [`Runtime::mark_root`] to survive a collection.
    pub fn allocate(&mut self, size: usize) -> Result<NonNull<u8>, gc::Error> {
        self.gc.allocate(size)
    }

    /// Releases `ptr` to the collector, which frees it on the next collection.
    pub fn free(&mut self, ptr: NonNull<u8>) {
        self.gc.remove_root(ptr);
    }

    pub fn mark_root(&mut self, ptr: NonNull<u8>) {
        self.gc.add_root(ptr);
    }

    /// Hands a value produced by generated code to the collector, which keeps
    /// it alive until it is freed. Pointers the collector doesn't own are
    /// ignored.
    pub fn register(&mut self, ptr: NonNull<u8>) {
        self.gc.add_root(ptr);
    }

    /// Formats `value` as a new NUL-terminated string owned by the collector.
    pub fn int_to_str(&mut self, value: i32) -> Result<NonNull<u8>, gc::Error> {
        self.alloc_str(&value.to_string())
    }

    /// Returns a new NUL-terminated `true` or `false`.
    pub fn bool_to_str(&mut self, value: bool) -> Result<NonNull<u8>, gc::Error> {
        self.alloc_str(if value { "true" } else { "false" })
    }

    fn alloc_str(&mut self, text: &str) -> Result<NonNull<u8>, gc::Error> {
        let ptr = self.gc.allocate(text.len() + 1)?;
        // SAFETY: The block holds `text.len() + 1` bytes and was just
        // allocated, so it can't overlap `text`.
        unsafe {
            std::ptr::copy_nonoverlapping(text.as_ptr(), ptr.as_ptr(), text.len());
            ptr.as_ptr().add(text.len()).write(0);
        }
        Ok(ptr)
    }

    pub fn collect_garbage(&mut self) {
        self.gc.collect();
    }

    pub fn is_khali(ptr: *const u8) -> bool {
        ptr.is_null()
    }

    pub fn create_khali() -> *mut u8 {
        std::ptr::null_mut()
    }

    pub fn gc(&self) -> &GarbageCollector {
        &self.gc
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
