//! Lazily computed evaluation data.

use std::fmt;
use std::sync::OnceLock;

/// A value derived from spline control data, computed on first read.
///
/// Concurrent readers race to fill the cache but only one computation runs;
/// the others block until it is stored and then share it. Invalidation needs
/// `&mut self`, so a cache can never be cleared while a reader holds a
/// reference into it.
pub struct EvalCache<T> {
    cell: OnceLock<T>,
}

impl<T> EvalCache<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Return the cached value, running `compute` first if the cache is dirty.
    pub fn get_or_compute(&self, compute: impl FnOnce() -> T) -> &T {
        self.cell.get_or_init(compute)
    }

    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn is_dirty(&self) -> bool {
        self.cell.get().is_none()
    }

    /// Drop the cached value so the next read recomputes it.
    pub fn invalidate(&mut self) {
        self.cell.take();
    }
}

impl<T> Default for EvalCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies start dirty; evaluated data is never shared between splines.
impl<T> Clone for EvalCache<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EvalCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalCache")
            .field("dirty", &self.is_dirty())
            .finish()
    }
}
