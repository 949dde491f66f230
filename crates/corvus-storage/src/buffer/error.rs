//! Buffer pool errors.

use corvus_common::types::PageId;
use thiserror::Error;

use crate::disk::IoError;

/// Result type for buffer pool operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer pool operations.
///
/// Everything except `Disk` is an expected failure the caller branches
/// on; precondition violations abort instead of surfacing here.
#[derive(Debug, Error)]
#[allow(missing_docs)] // Fields are documented by variant docs
pub enum BufferError {
    /// No frame can be acquired: the free list is empty and every
    /// resident page is pinned.
    #[error("no free frames available, all pages are pinned")]
    NoFreeFrames,

    /// Page not resident in the buffer pool.
    #[error("page {page_id} not found in buffer pool")]
    PageNotFound { page_id: PageId },

    /// Unpin of a page whose pin count is already zero.
    #[error("page {page_id} is not pinned")]
    PageNotPinned { page_id: PageId },

    /// Delete of a page that still has live references.
    #[error("page {page_id} is pinned ({pin_count} pins)")]
    PagePinned { page_id: PageId, pin_count: u32 },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Disk I/O failure during read or write-back.
    #[error("disk I/O error: {0}")]
    Disk(#[from] IoError),
}

impl BufferError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a page not found error.
    pub fn page_not_found(page_id: PageId) -> Self {
        Self::PageNotFound { page_id }
    }

    /// Returns true if this is a transient condition that can clear
    /// once another caller unpins a page.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NoFreeFrames)
    }
}
