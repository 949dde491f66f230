//! Buffer pool manager.
//!
//! The buffer pool owns the frame array, the free list, the page table
//! (an extendible hash directory), and the LRU-K replacer, and mediates
//! every page's journey between disk and memory.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use corvus_common::types::PageId;
use parking_lot::Mutex;

use super::config::BufferPoolConfig;
use super::error::{BufferError, BufferResult};
use super::eviction::LruKReplacer;
use super::frame::{BufferFrame, FrameId};
use super::latch::{PageReadGuard, PageWriteGuard};
use super::BufferPoolStats;
use crate::disk::{DiskManager, IoResult};
use crate::hash::ExtendibleHashTable;

/// Write-ahead log hook.
///
/// When a log manager is configured, the pool invokes it before any
/// page write-back so the log never lags the data it describes.
pub trait LogManager: Send + Sync {
    /// Forces the log's buffered records down to durable storage.
    fn flush_log(&self) -> IoResult<()>;
}

/// State guarded by the pool's outer latch.
///
/// Holding this lock serializes whole pool operations, including the
/// disk transfer on the miss path; the replacer and page table carry
/// their own inner latches underneath.
struct PoolState {
    /// Frames not currently holding any page.
    free_list: VecDeque<FrameId>,
}

/// The buffer pool manages page caching for the database.
///
/// Callers obtain pinned frames through [`new_page`] and [`fetch_page`]
/// and give them back through [`unpin_page`]; a frame is only eligible
/// for eviction once its pin count has returned to zero. The
/// [`read_page`] and [`write_page`] guards wrap the same contract in
/// RAII form.
///
/// [`new_page`]: BufferPool::new_page
/// [`fetch_page`]: BufferPool::fetch_page
/// [`unpin_page`]: BufferPool::unpin_page
/// [`read_page`]: BufferPool::read_page
/// [`write_page`]: BufferPool::write_page
pub struct BufferPool {
    /// Configuration.
    config: BufferPoolConfig,
    /// Array of buffer frames, fixed at construction.
    frames: Vec<Arc<BufferFrame>>,
    /// Outer latch; held across the body of every operation.
    state: Mutex<PoolState>,
    /// Page table: maps resident PageId -> FrameId.
    page_table: ExtendibleHashTable<PageId, FrameId>,
    /// LRU-K replacer for victim selection.
    replacer: LruKReplacer,
    /// Backing storage device.
    disk: Arc<dyn DiskManager>,
    /// Optional write-ahead log flushed before page write-backs.
    log_manager: Option<Arc<dyn LogManager>>,
    /// Monotonic page-id allocator; ids are never reused.
    next_page_id: AtomicU64,
    /// Fetch counter for statistics.
    fetch_count: AtomicU64,
    /// Hit counter for statistics.
    hit_count: AtomicU64,
    /// Miss counter for statistics.
    miss_count: AtomicU64,
    /// Eviction counter for statistics.
    eviction_count: AtomicU64,
    /// Write-back counter for statistics.
    flush_count: AtomicU64,
}

impl BufferPool {
    /// Creates a new buffer pool over the given disk.
    ///
    /// Every frame starts on the free list; the page table starts as a
    /// single empty bucket at global depth zero.
    pub fn new(config: BufferPoolConfig, disk: Arc<dyn DiskManager>) -> BufferResult<Self> {
        config
            .validate()
            .map_err(|e| BufferError::config(e.to_string()))?;

        let num_frames = config.num_frames;
        let page_size = config.page_size;

        let frames: Vec<Arc<BufferFrame>> = (0..num_frames)
            .map(|i| Arc::new(BufferFrame::new(FrameId::new(i), page_size)))
            .collect();
        let free_list: VecDeque<FrameId> = (0..num_frames).map(FrameId::new).collect();

        Ok(Self {
            frames,
            state: Mutex::new(PoolState { free_list }),
            page_table: ExtendibleHashTable::new(config.bucket_capacity),
            replacer: LruKReplacer::new(num_frames, config.replacer_k),
            disk,
            log_manager: None,
            next_page_id: AtomicU64::new(PageId::FIRST.as_u64()),
            fetch_count: AtomicU64::new(0),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            eviction_count: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
            config,
        })
    }

    /// Attaches a write-ahead log manager, flushed before write-backs.
    pub fn with_log_manager(mut self, log_manager: Arc<dyn LogManager>) -> Self {
        self.log_manager = Some(log_manager);
        self
    }

    /// Allocates a fresh page and returns its zeroed frame, pinned once.
    ///
    /// The new page id is available as `frame.page_id()`. Fails with
    /// [`BufferError::NoFreeFrames`] when every frame is pinned.
    pub fn new_page(&self) -> BufferResult<Arc<BufferFrame>> {
        let mut state = self.state.lock();

        let frame_id = self.acquire_frame(&mut state)?;
        let frame = Arc::clone(&self.frames[frame_id.index()]);
        self.evict_resident(&frame)?;

        let page_id = self.allocate_page();
        frame.write_data().fill(0);
        frame.set_page_id(page_id);
        frame.pin();

        self.page_table.insert(page_id, frame_id);
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);
        Ok(frame)
    }

    /// Fetches the page with the given id, pinning its frame.
    ///
    /// A resident page is returned directly; otherwise a frame is
    /// acquired (free list first, eviction second) and the page is read
    /// from disk. Fails with [`BufferError::NoFreeFrames`] when the
    /// page is not resident and every frame is pinned.
    pub fn fetch_page(&self, page_id: PageId) -> BufferResult<Arc<BufferFrame>> {
        let mut state = self.state.lock();
        self.fetch_count.fetch_add(1, Ordering::Relaxed);

        if let Some(frame_id) = self.page_table.find(&page_id) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            let frame = Arc::clone(&self.frames[frame_id.index()]);
            frame.pin();
            // A pinned frame must not stay an eviction candidate, and
            // the hit counts as an access for the k-distance.
            self.replacer.record_access(frame_id);
            self.replacer.set_evictable(frame_id, false);
            return Ok(frame);
        }

        self.miss_count.fetch_add(1, Ordering::Relaxed);
        let frame_id = self.acquire_frame(&mut state)?;
        let frame = Arc::clone(&self.frames[frame_id.index()]);
        self.evict_resident(&frame)?;

        {
            let mut data = frame.write_data();
            data.fill(0);
            self.disk.read_page(page_id, &mut data)?;
        }
        frame.set_page_id(page_id);
        frame.pin();

        self.page_table.insert(page_id, frame_id);
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);
        Ok(frame)
    }

    /// Drops one pin on a page, optionally marking it dirty.
    ///
    /// When the pin count reaches zero the frame becomes an eviction
    /// candidate. The dirty hint only ever sets the flag; a page dirtied
    /// by an earlier caller stays dirty through a clean unpin.
    pub fn unpin_page(&self, page_id: PageId, dirty: bool) -> BufferResult<()> {
        let _state = self.state.lock();

        let frame_id = self
            .page_table
            .find(&page_id)
            .ok_or(BufferError::PageNotFound { page_id })?;
        let frame = &self.frames[frame_id.index()];
        if frame.pin_count() == 0 {
            return Err(BufferError::PageNotPinned { page_id });
        }

        if dirty {
            frame.set_dirty(true);
        }
        if frame.unpin() == 0 {
            self.replacer.set_evictable(frame_id, true);
        }
        Ok(())
    }

    /// Writes a resident page to disk, dirty or not, and clears its
    /// dirty flag. Pins and evictability are unaffected.
    pub fn flush_page(&self, page_id: PageId) -> BufferResult<()> {
        let _state = self.state.lock();

        let frame_id = self
            .page_table
            .find(&page_id)
            .ok_or(BufferError::PageNotFound { page_id })?;
        self.write_frame(&self.frames[frame_id.index()])
    }

    /// Writes every dirty resident page to disk. Returns how many pages
    /// were written.
    pub fn flush_all(&self) -> BufferResult<usize> {
        let _state = self.state.lock();

        let mut flushed = 0;
        for frame in &self.frames {
            if !frame.is_empty() && frame.is_dirty() {
                self.write_frame(frame)?;
                flushed += 1;
            }
        }
        tracing::debug!("flushed {} dirty pages", flushed);
        Ok(flushed)
    }

    /// Deletes a page from the pool, freeing its frame and releasing
    /// its id.
    ///
    /// A page that is not resident is trivially deleted. Fails with
    /// [`BufferError::PagePinned`] while callers still hold pins.
    pub fn delete_page(&self, page_id: PageId) -> BufferResult<()> {
        let mut state = self.state.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return Ok(());
        };
        let frame = &self.frames[frame_id.index()];
        let pin_count = frame.pin_count();
        if pin_count > 0 {
            return Err(BufferError::PagePinned { page_id, pin_count });
        }

        self.page_table.remove(&page_id);
        // The pin count only reaches zero through unpin_page, which
        // marks the frame evictable, so the replacer will accept this.
        self.replacer.remove(frame_id);
        frame.reset();
        state.free_list.push_back(frame_id);
        self.deallocate_page(page_id);

        tracing::debug!("deleted page {} from frame {}", page_id, frame_id.index());
        Ok(())
    }

    /// Fetches a page and wraps it in a read guard that unpins on drop.
    pub fn read_page(&self, page_id: PageId) -> BufferResult<PageReadGuard<'_>> {
        let frame = self.fetch_page(page_id)?;
        Ok(PageReadGuard::new(self, frame))
    }

    /// Fetches a page and wraps it in a write guard that unpins on
    /// drop, flagging the page dirty if its payload was borrowed
    /// mutably.
    pub fn write_page(&self, page_id: PageId) -> BufferResult<PageWriteGuard<'_>> {
        let frame = self.fetch_page(page_id)?;
        Ok(PageWriteGuard::new(self, frame))
    }

    /// Returns the number of frames in the buffer pool.
    pub fn num_frames(&self) -> usize {
        self.config.num_frames
    }

    /// Returns the page size.
    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    /// Returns true if a page is resident in the buffer pool.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.page_table.find(&page_id).is_some()
    }

    /// Number of frames currently on the free list.
    pub fn free_frame_count(&self) -> usize {
        self.state.lock().free_list.len()
    }

    /// Number of pages currently resident.
    pub fn resident_page_count(&self) -> usize {
        self.page_table.len()
    }

    /// Returns statistics about the buffer pool.
    pub fn stats(&self) -> BufferPoolStats {
        let mut pinned = 0;
        let mut dirty = 0;
        for frame in &self.frames {
            if frame.is_pinned() {
                pinned += 1;
            }
            if frame.is_dirty() {
                dirty += 1;
            }
        }

        BufferPoolStats {
            fetches: self.fetch_count.load(Ordering::Relaxed),
            hits: self.hit_count.load(Ordering::Relaxed),
            misses: self.miss_count.load(Ordering::Relaxed),
            evictions: self.eviction_count.load(Ordering::Relaxed),
            flushes: self.flush_count.load(Ordering::Relaxed),
            pinned_frames: pinned,
            dirty_frames: dirty,
        }
    }

    // -------------------------------------------------------------------------
    // Private helpers
    // -------------------------------------------------------------------------

    /// Hands out the next page id. Ids are monotonic for the pool's
    /// lifetime.
    fn allocate_page(&self) -> PageId {
        PageId::new(self.next_page_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Releases a page id. Advisory: ids are never reused, so the
    /// monotonic counter is the only allocator state.
    fn deallocate_page(&self, _page_id: PageId) {}

    /// Acquires a frame for a new occupant: free list first, then the
    /// replacer. The returned frame may still hold its previous page;
    /// [`Self::evict_resident`] finishes the hand-over.
    fn acquire_frame(&self, state: &mut PoolState) -> BufferResult<FrameId> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(frame_id);
        }

        let frame_id = self.replacer.evict().ok_or(BufferError::NoFreeFrames)?;
        self.eviction_count.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "evicted page {} from frame {}",
            self.frames[frame_id.index()].page_id(),
            frame_id.index()
        );
        Ok(frame_id)
    }

    /// Writes back and unmaps the frame's current occupant, if any.
    /// The write-back targets the frame's *current* page id, never the
    /// incoming one.
    fn evict_resident(&self, frame: &BufferFrame) -> BufferResult<()> {
        if frame.is_dirty() {
            self.write_frame(frame)?;
        }
        let old_page_id = frame.page_id();
        if old_page_id.is_valid() {
            self.page_table.remove(&old_page_id);
        }
        Ok(())
    }

    /// Writes a frame's payload to disk (flushing the log first when
    /// one is configured) and clears the dirty flag.
    fn write_frame(&self, frame: &BufferFrame) -> BufferResult<()> {
        if let Some(log_manager) = &self.log_manager {
            log_manager.flush_log()?;
        }
        {
            let data = frame.read_data();
            self.disk.write_page(frame.page_id(), &data)?;
        }
        frame.set_dirty(false);
        self.flush_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("num_frames", &self.config.num_frames)
            .field("page_size", &self.config.page_size)
            .field("resident", &self.page_table.len())
            .field("stats", &self.stats())
            .finish()
    }
}
