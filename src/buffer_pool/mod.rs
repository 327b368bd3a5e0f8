mod frame;
mod replacer;

use crate::error::{Result, StorageError};
use crate::page_file::{PageFile, PAGE_SIZE};
use frame::Frame;
use parking_lot::Mutex;
use replacer::{Clock, Fifo, Lfu, Lru, Replacer};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Page-replacement strategy used by a buffer pool when it is full and a
/// frame must be reclaimed to satisfy a pin miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementPolicy {
    Fifo,
    Lru,
    Lfu,
    Clock,
}

pub type SharedBufferPool = Arc<Mutex<BufferPoolManager>>;

/// In-memory cache of pages with pinning and eviction. A pool owns exactly
/// one `PageFile` for its whole lifetime (the reference implementation
/// reopens the file on every I/O; keeping one descriptor is an unobservable,
/// explicitly permitted change).
pub struct BufferPoolManager {
    file: PageFile,
    frames: Vec<Frame>,
    page_table: HashMap<usize, usize>,
    free_slots: VecDeque<usize>,
    replacer: Box<dyn Replacer + Send>,
    timer: u64,
    read_count: u64,
    write_count: u64,
}

impl BufferPoolManager {
    pub fn new(file: PageFile, capacity: usize, policy: ReplacementPolicy) -> SharedBufferPool {
        let replacer: Box<dyn Replacer + Send> = match policy {
            ReplacementPolicy::Fifo => Box::new(Fifo::new()),
            ReplacementPolicy::Lru => Box::new(Lru::new()),
            ReplacementPolicy::Lfu => Box::new(Lfu::new()),
            ReplacementPolicy::Clock => Box::new(Clock::new()),
        };
        Arc::new(Mutex::new(Self {
            file,
            frames: (0..capacity).map(|_| Frame::empty()).collect(),
            page_table: HashMap::new(),
            free_slots: (0..capacity).collect(),
            replacer,
            timer: 0,
            read_count: 0,
            write_count: 0,
        }))
    }

    pub fn capacity(&self) -> usize {
        self.frames.len()
    }

    pub fn num_read_io(&self) -> u64 {
        self.read_count
    }

    pub fn num_write_io(&self) -> u64 {
        self.write_count
    }

    /// Frame contents / dirty flags / pin counts in frame-insertion order.
    /// Never-populated frames report `None` / `false` / `0`.
    pub fn frame_contents(&self) -> Vec<Option<usize>> {
        self.frames.iter().map(|f| f.page_num).collect()
    }

    pub fn dirty_flags(&self) -> Vec<bool> {
        self.frames.iter().map(|f| f.dirty).collect()
    }

    pub fn fix_counts(&self) -> Vec<u32> {
        self.frames.iter().map(|f| f.pin_count).collect()
    }

    fn synth_page(page_num: usize) -> Vec<u8> {
        let mut buf = vec![0u8; PAGE_SIZE];
        let label = format!("Page-{page_num}");
        let bytes = label.as_bytes();
        let n = bytes.len().min(PAGE_SIZE);
        buf[..n].copy_from_slice(&bytes[..n]);
        buf
    }

    /// Loads `page_num` into `buf`, extending the file if needed. Pages
    /// beyond the file's current extent are synthesized with a literal
    /// `Page-<n>` marker rather than read, matching the reference behavior.
    fn load_into(&mut self, page_num: usize, buf: &mut [u8]) -> Result<()> {
        let existed = page_num < self.file.total_pages();
        self.file.ensure_capacity(page_num + 1)?;
        if existed {
            self.file.read_block(page_num, buf)?;
        } else {
            buf.copy_from_slice(&Self::synth_page(page_num));
        }
        self.read_count += 1;
        Ok(())
    }

    fn pin(&mut self, page_num: usize) -> Result<usize> {
        if let Some(&frame_idx) = self.page_table.get(&page_num) {
            self.timer += 1;
            let frame = &mut self.frames[frame_idx];
            frame.pin_count += 1;
            frame.access_count += 1;
            frame.last_accessed = self.timer;
            return Ok(frame_idx);
        }

        if let Some(frame_idx) = self.free_slots.pop_front() {
            let mut buf = vec![0u8; PAGE_SIZE];
            self.load_into(page_num, &mut buf)?;
            self.timer += 1;
            let frame = &mut self.frames[frame_idx];
            frame.page_num = Some(page_num);
            frame.buf = buf;
            frame.dirty = false;
            frame.pin_count = 1;
            frame.access_count = 1;
            frame.last_accessed = self.timer;
            self.page_table.insert(page_num, frame_idx);
            return Ok(frame_idx);
        }

        let victim = self
            .replacer
            .evict(&mut self.frames)
            .ok_or(StorageError::NoEvictableFrame)?;
        if self.frames[victim].pin_count != 0 {
            return Err(StorageError::NoEvictableFrame);
        }
        let old_page = self.frames[victim].page_num;
        if let Some(old_page) = old_page {
            if self.frames[victim].dirty {
                self.file.write_block(old_page, &self.frames[victim].buf)?;
                self.write_count += 1;
            }
        }

        // Load the incoming page into a scratch buffer before touching the
        // victim frame or page table: if this fails, the victim frame must
        // still hold `old_page` exactly as before, so a later pin of
        // `old_page` doesn't find it missing from the page table and load a
        // second copy into another frame.
        let mut buf = vec![0u8; PAGE_SIZE];
        self.load_into(page_num, &mut buf)?;

        if let Some(old_page) = old_page {
            self.page_table.remove(&old_page);
        }
        self.timer += 1;
        let frame = &mut self.frames[victim];
        frame.page_num = Some(page_num);
        frame.buf = buf;
        frame.dirty = false;
        frame.pin_count = 1;
        frame.access_count = 1;
        frame.last_accessed = self.timer;
        self.page_table.insert(page_num, victim);
        Ok(victim)
    }

    fn frame_of(&self, page_num: usize) -> Result<usize> {
        self.page_table.get(&page_num).copied().ok_or_else(|| {
            StorageError::InvalidParameter(format!("page {page_num} is not resident"))
        })
    }

    fn unpin(&mut self, page_num: usize) -> Result<()> {
        let frame_idx = self.frame_of(page_num)?;
        let frame = &mut self.frames[frame_idx];
        if frame.pin_count == 0 {
            return Err(StorageError::InvalidParameter(format!(
                "page {page_num} has no outstanding pins"
            )));
        }
        frame.pin_count -= 1;
        Ok(())
    }

    fn mark_dirty(&mut self, page_num: usize) -> Result<()> {
        let frame_idx = self.frame_of(page_num)?;
        self.frames[frame_idx].dirty = true;
        Ok(())
    }

    fn force_page(&mut self, page_num: usize) -> Result<()> {
        let frame_idx = self.frame_of(page_num)?;
        self.file.write_block(page_num, &self.frames[frame_idx].buf)?;
        self.frames[frame_idx].dirty = false;
        self.write_count += 1;
        Ok(())
    }

    /// Writes every dirty, unpinned frame back to disk. Pinned dirty frames
    /// are skipped, not an error.
    pub fn force_flush(&mut self) -> Result<()> {
        for idx in 0..self.frames.len() {
            if self.frames[idx].page_num.is_none()
                || !self.frames[idx].dirty
                || self.frames[idx].pin_count != 0
            {
                continue;
            }
            let page_num = self.frames[idx].page_num.unwrap();
            self.file.write_block(page_num, &self.frames[idx].buf)?;
            self.frames[idx].dirty = false;
            self.write_count += 1;
        }
        Ok(())
    }

    /// Flushes dirty unpinned frames, then refuses to tear down if any
    /// frame still has a live pin.
    pub fn shutdown(&mut self) -> Result<()> {
        self.force_flush()?;
        if self.frames.iter().any(|f| f.pin_count > 0) {
            log::warn!("buffer pool shutdown with pinned frames still outstanding");
            return Err(StorageError::PinnedPagesInBuffer);
        }
        Ok(())
    }
}

/// A pinned reference to a page. Dropping the handle unpins the frame; this
/// is the redesign called for in place of manual pin/unpin bookkeeping --
/// the release happens on every exit path, including `?`-propagated errors,
/// because it happens in `Drop` rather than at explicit call sites.
pub struct PageHandle {
    pool: SharedBufferPool,
    page_num: usize,
}

impl PageHandle {
    pub fn page_num(&self) -> usize {
        self.page_num
    }

    pub fn read_bytes(&self, offset: usize, len: usize) -> Vec<u8> {
        let pool = self.pool.lock();
        let idx = pool.frame_of(self.page_num).expect("pinned page vanished");
        pool.frames[idx].buf[offset..offset + len].to_vec()
    }

    /// Overwrites `bytes` at `offset` and marks the frame dirty.
    pub fn write_bytes(&self, offset: usize, bytes: &[u8]) {
        let mut pool = self.pool.lock();
        let idx = pool.frame_of(self.page_num).expect("pinned page vanished");
        pool.frames[idx].buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        pool.frames[idx].dirty = true;
    }

    pub fn mark_dirty(&self) {
        let mut pool = self.pool.lock();
        let _ = pool.mark_dirty(self.page_num);
    }

    pub fn force(&self) -> Result<()> {
        self.pool.lock().force_page(self.page_num)
    }
}

impl Drop for PageHandle {
    fn drop(&mut self) {
        let mut pool = self.pool.lock();
        if let Err(e) = pool.unpin(self.page_num) {
            log::warn!("unpin on drop failed for page {}: {e}", self.page_num);
        }
    }
}

/// Pins `page_num` in `pool`, returning a guard that unpins on drop.
pub fn pin_page(pool: &SharedBufferPool, page_num: usize) -> Result<PageHandle> {
    pool.lock().pin(page_num)?;
    Ok(PageHandle {
        pool: pool.clone(),
        page_num,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn scratch_pool(capacity: usize, policy: ReplacementPolicy) -> SharedBufferPool {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        drop(tmp);
        let file = PageFile::create(&path).unwrap();
        BufferPoolManager::new(file, capacity, policy)
    }

    #[test]
    fn fifo_eviction_scenario() {
        let pool = scratch_pool(3, ReplacementPolicy::Fifo);
        for p in 1..=3 {
            let h = pin_page(&pool, p).unwrap();
            drop(h);
        }
        let h4 = pin_page(&pool, 4).unwrap();
        assert_eq!(
            pool.lock().frame_contents(),
            vec![Some(4), Some(2), Some(3)]
        );
        assert_eq!(pool.lock().num_read_io(), 4);
        assert_eq!(pool.lock().num_write_io(), 0);
        drop(h4);
    }

    #[test]
    fn lru_eviction_scenario() {
        let pool = scratch_pool(3, ReplacementPolicy::Lru);
        for p in 1..=3 {
            drop(pin_page(&pool, p).unwrap());
        }
        drop(pin_page(&pool, 1).unwrap());
        drop(pin_page(&pool, 4).unwrap());
        assert_eq!(
            pool.lock().frame_contents(),
            vec![Some(1), Some(4), Some(3)]
        );
    }

    #[test]
    fn clock_second_chance_scenario() {
        let pool = scratch_pool(3, ReplacementPolicy::Clock);
        for p in 1..=3 {
            drop(pin_page(&pool, p).unwrap());
        }
        drop(pin_page(&pool, 4).unwrap());
        assert_eq!(
            pool.lock().frame_contents(),
            vec![Some(4), Some(2), Some(3)]
        );
    }

    #[test]
    fn dirty_eviction_forces_write_back() {
        let pool = scratch_pool(1, ReplacementPolicy::Fifo);
        let h0 = pin_page(&pool, 0).unwrap();
        h0.write_bytes(0, b"X");
        drop(h0);

        drop(pin_page(&pool, 1).unwrap());
        assert_eq!(pool.lock().num_write_io(), 1);

        let pool2 = {
            let p = pool.lock();
            let file = PageFile::open(p.file.path()).unwrap();
            BufferPoolManager::new(file, 1, ReplacementPolicy::Fifo)
        };
        let h = pin_page(&pool2, 0).unwrap();
        assert_eq!(&h.read_bytes(0, 1), b"X");
    }

    #[test]
    fn pinned_frame_is_never_evicted() {
        let pool = scratch_pool(1, ReplacementPolicy::Fifo);
        let _h0 = pin_page(&pool, 0).unwrap();
        assert!(pin_page(&pool, 1).is_err());
    }

    #[test]
    fn shutdown_rejects_pinned_frames() {
        let pool = scratch_pool(1, ReplacementPolicy::Fifo);
        let _h0 = pin_page(&pool, 0).unwrap();
        assert!(matches!(
            pool.lock().shutdown(),
            Err(StorageError::PinnedPagesInBuffer)
        ));
    }
}
