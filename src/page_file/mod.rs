use crate::error::{Result, StorageError};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Size of a page in bytes. Every on-disk layout in this crate is computed
/// against this constant directly; it is not a runtime-configurable knob.
pub const PAGE_SIZE: usize = 4096;

/// Fixed-size block storage over a single backing file. The file's length
/// is always an exact multiple of `PAGE_SIZE`; pages are addressed by a
/// zero-based page number and read/written as whole blocks only.
#[derive(Debug)]
pub struct PageFile {
    path: PathBuf,
    file: File,
    total_pages: usize,
    cur_page_pos: usize,
}

impl PageFile {
    /// Creates (or truncates) the backing file and writes exactly one
    /// zero-filled page.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        file.write_all(&[0u8; PAGE_SIZE])
            .map_err(|_| StorageError::WriteFailed)?;
        Ok(Self {
            path,
            file,
            total_pages: 1,
            cur_page_pos: 0,
        })
    }

    /// Opens an existing page file. Total page count is derived from the
    /// file's length; the cursor starts at page 0.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(StorageError::FileNotFound);
        }
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let len = file.metadata()?.len() as usize;
        let total_pages = len.div_ceil(PAGE_SIZE);
        Ok(Self {
            path,
            file,
            total_pages,
            cur_page_pos: 0,
        })
    }

    /// Removes the backing file. Fails with `FileNotFound` if it is absent.
    pub fn destroy(path: impl AsRef<Path>) -> Result<()> {
        std::fs::remove_file(path).map_err(|_| StorageError::FileNotFound)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn cur_page_pos(&self) -> usize {
        self.cur_page_pos
    }

    fn validate_page_num(&self, n: usize) -> Result<()> {
        if n >= self.total_pages {
            return Err(StorageError::ReadNonExistingPage);
        }
        Ok(())
    }

    pub fn read_block(&mut self, n: usize, buf: &mut [u8]) -> Result<()> {
        self.validate_page_num(n)?;
        self.file.seek(SeekFrom::Start((n * PAGE_SIZE) as u64))?;
        self.file.read_exact(&mut buf[..PAGE_SIZE])?;
        self.cur_page_pos = n;
        Ok(())
    }

    pub fn write_block(&mut self, n: usize, buf: &[u8]) -> Result<()> {
        if n >= self.total_pages {
            return Err(StorageError::ReadNonExistingPage);
        }
        self.file.seek(SeekFrom::Start((n * PAGE_SIZE) as u64))?;
        self.file
            .write_all(&buf[..PAGE_SIZE])
            .map_err(|_| StorageError::WriteFailed)?;
        self.cur_page_pos = n;
        Ok(())
    }

    pub fn append_empty_block(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::End(0))?;
        self.file
            .write_all(&[0u8; PAGE_SIZE])
            .map_err(|_| StorageError::WriteFailed)?;
        self.total_pages += 1;
        Ok(())
    }

    /// Appends pages until at least `k` pages exist, in a single batched
    /// write. No-op if the file already has `k` or more pages.
    pub fn ensure_capacity(&mut self, k: usize) -> Result<()> {
        if self.total_pages >= k {
            return Ok(());
        }
        let needed = k - self.total_pages;
        self.file.seek(SeekFrom::End(0))?;
        self.file
            .write_all(&vec![0u8; PAGE_SIZE * needed])
            .map_err(|_| StorageError::WriteFailed)?;
        self.total_pages = k;
        Ok(())
    }

    pub fn read_first_block(&mut self, buf: &mut [u8]) -> Result<()> {
        self.read_block(0, buf)
    }

    pub fn read_last_block(&mut self, buf: &mut [u8]) -> Result<()> {
        let n = self.total_pages.saturating_sub(1);
        self.read_block(n, buf)
    }

    pub fn read_current_block(&mut self, buf: &mut [u8]) -> Result<()> {
        let n = self.cur_page_pos;
        self.read_block(n, buf)
    }

    pub fn read_next_block(&mut self, buf: &mut [u8]) -> Result<()> {
        let n = self.cur_page_pos + 1;
        self.read_block(n, buf)
    }

    pub fn read_previous_block(&mut self, buf: &mut [u8]) -> Result<()> {
        let n = self
            .cur_page_pos
            .checked_sub(1)
            .ok_or(StorageError::ReadNonExistingPage)?;
        self.read_block(n, buf)
    }

    pub fn write_current_block(&mut self, buf: &[u8]) -> Result<()> {
        let n = self.cur_page_pos;
        self.write_block(n, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn scratch_path() -> PathBuf {
        let f = NamedTempFile::new().unwrap();
        let path = f.path().to_path_buf();
        // drop the file so `create` can make it fresh at this path
        drop(f);
        path
    }

    #[test]
    fn create_writes_one_zero_page() {
        let path = scratch_path();
        let mut pf = PageFile::create(&path).unwrap();
        assert_eq!(pf.total_pages(), 1);
        let mut buf = vec![0xFFu8; PAGE_SIZE];
        pf.read_block(0, &mut buf).unwrap();
        assert_eq!(buf, vec![0u8; PAGE_SIZE]);
    }

    #[test]
    fn open_missing_file_fails() {
        let err = PageFile::open("/nonexistent/path/does-not-exist").unwrap_err();
        assert!(matches!(err, StorageError::FileNotFound));
    }

    #[test]
    fn round_trip_write_then_read() {
        let path = scratch_path();
        let mut pf = PageFile::create(&path).unwrap();
        pf.ensure_capacity(2).unwrap();
        let mut write_buf = vec![0u8; PAGE_SIZE];
        write_buf[0..5].copy_from_slice(b"hello");
        pf.write_block(1, &write_buf).unwrap();

        let mut read_buf = vec![0u8; PAGE_SIZE];
        pf.read_block(1, &mut read_buf).unwrap();
        assert_eq!(read_buf, write_buf);
    }

    #[test]
    fn read_out_of_range_fails() {
        let path = scratch_path();
        let mut pf = PageFile::create(&path).unwrap();
        let mut buf = vec![0u8; PAGE_SIZE];
        let err = pf.read_block(5, &mut buf).unwrap_err();
        assert!(matches!(err, StorageError::ReadNonExistingPage));
    }

    #[test]
    fn ensure_capacity_is_idempotent() {
        let path = scratch_path();
        let mut pf = PageFile::create(&path).unwrap();
        pf.ensure_capacity(4).unwrap();
        assert_eq!(pf.total_pages(), 4);
        pf.ensure_capacity(2).unwrap();
        assert_eq!(pf.total_pages(), 4);
    }

    #[test]
    fn append_empty_block_grows_by_one() {
        let path = scratch_path();
        let mut pf = PageFile::create(&path).unwrap();
        pf.append_empty_block().unwrap();
        assert_eq!(pf.total_pages(), 2);
    }

    #[test]
    fn destroy_removes_file() {
        let path = scratch_path();
        let pf = PageFile::create(&path).unwrap();
        drop(pf);
        PageFile::destroy(&path).unwrap();
        assert!(!path.exists());
    }
}
