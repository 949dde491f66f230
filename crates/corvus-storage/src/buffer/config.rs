//! Buffer pool configuration.

use corvus_common::constants::{
    DEFAULT_BUCKET_CAPACITY, DEFAULT_BUFFER_POOL_FRAMES, DEFAULT_PAGE_SIZE, DEFAULT_REPLACER_K,
    MIN_PAGE_SIZE,
};

/// Configuration for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Number of page frames in the buffer pool.
    pub num_frames: usize,
    /// Page size in bytes.
    pub page_size: usize,
    /// `k` for the LRU-K replacement policy.
    pub replacer_k: usize,
    /// Page-table bucket capacity before a split.
    pub bucket_capacity: usize,
}

impl BufferPoolConfig {
    /// Creates a new configuration with the specified number of frames.
    pub fn new(num_frames: usize) -> Self {
        Self {
            num_frames,
            page_size: DEFAULT_PAGE_SIZE,
            replacer_k: DEFAULT_REPLACER_K,
            bucket_capacity: DEFAULT_BUCKET_CAPACITY,
        }
    }

    /// Creates a configuration from a memory budget in bytes.
    pub fn from_memory_size(memory_bytes: usize) -> Self {
        let num_frames = (memory_bytes / DEFAULT_PAGE_SIZE).max(1);
        Self::new(num_frames)
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets `k` for the LRU-K replacer.
    pub fn with_replacer_k(mut self, replacer_k: usize) -> Self {
        self.replacer_k = replacer_k;
        self
    }

    /// Sets the page-table bucket capacity.
    pub fn with_bucket_capacity(mut self, bucket_capacity: usize) -> Self {
        self.bucket_capacity = bucket_capacity;
        self
    }

    /// Returns the total payload memory used by the buffer pool.
    pub fn memory_usage(&self) -> usize {
        self.num_frames * self.page_size
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.num_frames == 0 {
            return Err("num_frames must be > 0");
        }
        if !self.page_size.is_power_of_two() {
            return Err("page_size must be a power of 2");
        }
        if self.page_size < MIN_PAGE_SIZE {
            return Err("page_size must be >= 4096");
        }
        if self.replacer_k == 0 {
            return Err("replacer_k must be >= 1");
        }
        if self.bucket_capacity == 0 {
            return Err("bucket_capacity must be > 0");
        }
        Ok(())
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_POOL_FRAMES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = BufferPoolConfig::new(100);
        assert_eq!(config.num_frames, 100);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.replacer_k, DEFAULT_REPLACER_K);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_memory() {
        let config = BufferPoolConfig::from_memory_size(64 * 1024 * 1024);
        assert_eq!(config.num_frames, 64 * 1024 * 1024 / DEFAULT_PAGE_SIZE);
        assert_eq!(config.memory_usage(), 64 * 1024 * 1024);
    }

    #[test]
    fn test_config_builder() {
        let config = BufferPoolConfig::new(100)
            .with_page_size(16384)
            .with_replacer_k(3)
            .with_bucket_capacity(8);

        assert_eq!(config.page_size, 16384);
        assert_eq!(config.replacer_k, 3);
        assert_eq!(config.bucket_capacity, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(BufferPoolConfig::new(0).validate().is_err());
        assert!(BufferPoolConfig::new(10)
            .with_page_size(5000)
            .validate()
            .is_err());
        assert!(BufferPoolConfig::new(10)
            .with_replacer_k(0)
            .validate()
            .is_err());
        assert!(BufferPoolConfig::new(10)
            .with_bucket_capacity(0)
            .validate()
            .is_err());
    }
}
