//! System-wide constants for CorvusDB.

// =============================================================================
// Page and Memory Constants
// =============================================================================

/// Default page size in bytes (4 KB).
///
/// Matches the typical OS page size and SSD sector granularity.
pub const DEFAULT_PAGE_SIZE: usize = 4 * 1024;

/// Minimum page size in bytes (4 KB).
pub const MIN_PAGE_SIZE: usize = 4 * 1024;

/// Maximum page size in bytes (64 KB).
pub const MAX_PAGE_SIZE: usize = 64 * 1024;

// =============================================================================
// Buffer Pool Constants
// =============================================================================

/// Default number of frames in the buffer pool.
pub const DEFAULT_BUFFER_POOL_FRAMES: usize = 1024;

/// Default `k` for the LRU-K replacement policy.
///
/// `k = 2` distinguishes pages touched once from pages with a reuse
/// history, which is enough to keep a single sequential scan from
/// flushing the whole pool.
pub const DEFAULT_REPLACER_K: usize = 2;

/// Default capacity of a page-table bucket before it splits.
pub const DEFAULT_BUCKET_CAPACITY: usize = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_constants() {
        assert!(DEFAULT_PAGE_SIZE.is_power_of_two());
        assert!(MIN_PAGE_SIZE.is_power_of_two());
        assert!(MAX_PAGE_SIZE.is_power_of_two());
        assert!(MIN_PAGE_SIZE <= DEFAULT_PAGE_SIZE);
        assert!(DEFAULT_PAGE_SIZE <= MAX_PAGE_SIZE);
    }

    #[test]
    fn test_buffer_pool_constants() {
        assert!(DEFAULT_BUFFER_POOL_FRAMES > 0);
        assert!(DEFAULT_REPLACER_K >= 1);
        assert!(DEFAULT_BUCKET_CAPACITY > 0);
    }
}
