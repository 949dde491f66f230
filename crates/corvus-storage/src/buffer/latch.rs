//! RAII page guards.
//!
//! Guards wrap the pool's explicit pin discipline: construction pins a
//! page (via [`BufferPool::read_page`] / [`BufferPool::write_page`]) and
//! dropping the guard unpins it, so a page can never stay pinned past
//! the scope that uses it.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use corvus_common::types::PageId;

use super::frame::BufferFrame;
use super::pool::BufferPool;

/// Read guard for a page in the buffer pool.
///
/// Keeps the page pinned while held and unpins it (clean) on drop.
pub struct PageReadGuard<'a> {
    pool: &'a BufferPool,
    frame: Arc<BufferFrame>,
}

impl<'a> PageReadGuard<'a> {
    pub(crate) fn new(pool: &'a BufferPool, frame: Arc<BufferFrame>) -> Self {
        Self { pool, frame }
    }

    /// Returns the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.frame.page_id()
    }

    /// Returns a reference to the page payload.
    #[inline]
    pub fn data(&self) -> impl Deref<Target = [u8]> + '_ {
        PageDataRef {
            guard: self.frame.read_data(),
        }
    }
}

impl Drop for PageReadGuard<'_> {
    fn drop(&mut self) {
        let _ = self.pool.unpin_page(self.frame.page_id(), false);
    }
}

impl std::fmt::Debug for PageReadGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageReadGuard")
            .field("page_id", &self.page_id())
            .finish()
    }
}

/// Helper struct to provide `Deref` for page payloads.
struct PageDataRef<'a> {
    guard: parking_lot::RwLockReadGuard<'a, Vec<u8>>,
}

impl Deref for PageDataRef<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Write guard for a page in the buffer pool.
///
/// Keeps the page pinned while held; borrowing the payload mutably
/// marks the page modified, and the drop-time unpin carries that as the
/// dirty hint.
pub struct PageWriteGuard<'a> {
    pool: &'a BufferPool,
    frame: Arc<BufferFrame>,
    /// Whether the payload was borrowed mutably.
    modified: bool,
}

impl<'a> PageWriteGuard<'a> {
    pub(crate) fn new(pool: &'a BufferPool, frame: Arc<BufferFrame>) -> Self {
        Self {
            pool,
            frame,
            modified: false,
        }
    }

    /// Returns the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.frame.page_id()
    }

    /// Returns a reference to the page payload.
    #[inline]
    pub fn data(&self) -> impl Deref<Target = [u8]> + '_ {
        PageDataRef {
            guard: self.frame.read_data(),
        }
    }

    /// Returns a mutable reference to the page payload, marking the
    /// page modified.
    #[inline]
    pub fn data_mut(&mut self) -> impl DerefMut<Target = [u8]> + '_ {
        self.modified = true;
        PageDataMut {
            guard: self.frame.write_data(),
        }
    }

    /// Marks the page modified without borrowing the payload.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.modified = true;
    }

    /// Returns true if the page was marked modified.
    #[inline]
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

impl Drop for PageWriteGuard<'_> {
    fn drop(&mut self) {
        let _ = self
            .pool
            .unpin_page(self.frame.page_id(), self.modified);
    }
}

impl std::fmt::Debug for PageWriteGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageWriteGuard")
            .field("page_id", &self.page_id())
            .field("modified", &self.modified)
            .finish()
    }
}

/// Helper struct to provide `DerefMut` for page payloads.
struct PageDataMut<'a> {
    guard: parking_lot::RwLockWriteGuard<'a, Vec<u8>>,
}

impl Deref for PageDataMut<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl DerefMut for PageDataMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}
