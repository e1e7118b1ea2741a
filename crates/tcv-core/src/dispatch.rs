use core::marker::PhantomData;

/// Parallel-for seam consumed by the kernels.
///
/// Kernels only produce a flat task count and a per-task closure; thread
/// count and scheduling policy belong to the implementation. Tasks must be
/// safe to run in any order and concurrently: kernels guarantee that tasks
/// write disjoint destination regions and share sources read-only.
pub trait Dispatcher: Sync {
    fn dispatch(&self, task_count: usize, task: &(dyn Fn(usize, usize) + Sync));
}

/// Runs every task inline on the calling thread. Reference implementation;
/// parallel dispatchers must produce identical output.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialDispatcher;

impl Dispatcher for SerialDispatcher {
    fn dispatch(&self, task_count: usize, task: &(dyn Fn(usize, usize) + Sync)) {
        for index in 0..task_count {
            task(index, 0);
        }
    }
}

/// Maps the flat task space onto the global rayon pool.
#[cfg(feature = "rayon")]
#[derive(Debug, Default, Clone, Copy)]
pub struct RayonDispatcher;

#[cfg(feature = "rayon")]
impl Dispatcher for RayonDispatcher {
    fn dispatch(&self, task_count: usize, task: &(dyn Fn(usize, usize) + Sync)) {
        use rayon::prelude::*;

        (0..task_count)
            .into_par_iter()
            .for_each(|index| task(index, rayon::current_thread_index().unwrap_or(0)));
    }
}

/// Shared handle over a mutable slice for tasks that write disjoint regions.
///
/// The aliasing contract lives entirely in `slice_mut`: concurrent callers
/// must request non-overlapping ranges. Kernels uphold this by construction
/// (one destination tile or image per task).
pub struct DisjointWriter<'a, T> {
    ptr: *mut T,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

// SAFETY: `DisjointWriter` only hands out ranges of the underlying slice;
// callers of `slice_mut` guarantee the ranges are disjoint across threads.
unsafe impl<T: Send> Send for DisjointWriter<'_, T> {}
unsafe impl<T: Send> Sync for DisjointWriter<'_, T> {}

impl<'a, T> DisjointWriter<'a, T> {
    pub fn new(data: &'a mut [T]) -> Self {
        Self {
            ptr: data.as_mut_ptr(),
            len: data.len(),
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns a mutable subslice `[start, start + len)`.
    ///
    /// # Safety
    /// No two live slices obtained from the same writer may overlap. Each
    /// concurrent task must confine itself to ranges no other task touches.
    pub unsafe fn slice_mut(&self, start: usize, len: usize) -> &mut [T] {
        assert!(
            start.checked_add(len).is_some_and(|end| end <= self.len),
            "writer range out of bounds"
        );
        // SAFETY: Range is in bounds per the assert; disjointness across
        // callers is the caller's contract.
        unsafe { core::slice::from_raw_parts_mut(self.ptr.add(start), len) }
    }
}
