//! In-memory disk manager.

use std::collections::HashMap;

use corvus_common::types::PageId;
use parking_lot::Mutex;

use super::error::IoResult;
use super::DiskManager;

/// Disk manager that keeps pages in a hash map instead of a file.
///
/// Useful for tests and for ephemeral pools that never need to survive
/// a restart. Behaves like [`super::FileDisk`] otherwise: pages that
/// were never written read back as zeroes.
pub struct MemoryDisk {
    pages: Mutex<HashMap<PageId, Vec<u8>>>,
    page_size: usize,
}

impl MemoryDisk {
    /// Creates an empty in-memory disk.
    pub fn new(page_size: usize) -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            page_size,
        }
    }

    /// Returns the page size this disk was created with.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages that have been written at least once.
    pub fn page_count(&self) -> usize {
        self.pages.lock().len()
    }
}

impl DiskManager for MemoryDisk {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> IoResult<()> {
        debug_assert_eq!(buf.len(), self.page_size);
        match self.pages.lock().get(&page_id) {
            Some(data) => buf.copy_from_slice(data),
            None => buf.fill(0),
        }
        Ok(())
    }

    fn write_page(&self, page_id: PageId, buf: &[u8]) -> IoResult<()> {
        debug_assert_eq!(buf.len(), self.page_size);
        self.pages.lock().insert(page_id, buf.to_vec());
        Ok(())
    }

    fn sync(&self) -> IoResult<()> {
        Ok(())
    }
}

impl std::fmt::Debug for MemoryDisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDisk")
            .field("page_size", &self.page_size)
            .field("pages", &self.page_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_SIZE: usize = 4096;

    #[test]
    fn test_write_then_read() {
        let disk = MemoryDisk::new(PAGE_SIZE);

        let mut page = vec![0u8; PAGE_SIZE];
        page[10] = 0x42;
        disk.write_page(PageId::new(1), &page).unwrap();

        let mut out = vec![0xffu8; PAGE_SIZE];
        disk.read_page(PageId::new(1), &mut out).unwrap();
        assert_eq!(out, page);
        assert_eq!(disk.page_count(), 1);
    }

    #[test]
    fn test_unwritten_page_reads_zeroes() {
        let disk = MemoryDisk::new(PAGE_SIZE);
        let mut out = vec![0xffu8; PAGE_SIZE];
        disk.read_page(PageId::new(5), &mut out).unwrap();
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_overwrite() {
        let disk = MemoryDisk::new(PAGE_SIZE);

        disk.write_page(PageId::new(0), &vec![1u8; PAGE_SIZE]).unwrap();
        disk.write_page(PageId::new(0), &vec![2u8; PAGE_SIZE]).unwrap();

        let mut out = vec![0u8; PAGE_SIZE];
        disk.read_page(PageId::new(0), &mut out).unwrap();
        assert!(out.iter().all(|&b| b == 2));
        assert_eq!(disk.page_count(), 1);
    }
}
