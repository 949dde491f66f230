//! File-backed disk manager.
//!
//! All pages live in a single data file, placed at `page_id * page_size`.
//! The file grows as pages are written; a read of a page entirely beyond
//! the current end of file yields zeroes, since such a page has simply
//! never been written.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use corvus_common::types::PageId;
use parking_lot::Mutex;

use super::error::{IoError, IoResult};
use super::DiskManager;

/// Disk manager backed by a single data file.
///
/// The file handle is guarded by a mutex, so seeks and transfers of a
/// page are atomic with respect to concurrent callers.
pub struct FileDisk {
    /// The underlying file, wrapped in a mutex for thread-safe access.
    file: Mutex<File>,
    /// The data file path.
    path: PathBuf,
    /// Size of one page in bytes.
    page_size: usize,
}

impl FileDisk {
    /// Opens (creating if necessary) a data file at `path`.
    pub fn open(path: impl AsRef<Path>, page_size: usize) -> IoResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| IoError::from_io_with_path(e, &path))?;

        Ok(Self {
            file: Mutex::new(file),
            path,
            page_size,
        })
    }

    /// Returns the data file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the page size this disk was opened with.
    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

impl DiskManager for FileDisk {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> IoResult<()> {
        debug_assert_eq!(buf.len(), self.page_size);

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(page_id.file_offset(self.page_size)))?;

        let mut total = 0;
        while total < buf.len() {
            match file.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if total == 0 {
            // Never-written page: reads as zeroes.
            buf.fill(0);
        } else if total < buf.len() {
            // The file ends mid-page: the tail was truncated.
            return Err(IoError::short_read(buf.len(), total));
        }
        Ok(())
    }

    fn write_page(&self, page_id: PageId, buf: &[u8]) -> IoResult<()> {
        debug_assert_eq!(buf.len(), self.page_size);

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(page_id.file_offset(self.page_size)))?;

        let mut total = 0;
        while total < buf.len() {
            match file.write(&buf[total..]) {
                Ok(0) => return Err(IoError::short_write(buf.len(), total)),
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn sync(&self) -> IoResult<()> {
        self.file.lock().sync_all().map_err(Into::into)
    }
}

impl std::fmt::Debug for FileDisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDisk")
            .field("path", &self.path)
            .field("page_size", &self.page_size)
            .finish()
    }
}
