use crate::page_file::PAGE_SIZE;

/// One slot of the buffer pool. A frame is allocated the first time its slot
/// is used and is then reused in place for the lifetime of the pool; only
/// its contents (`page_num`, `buf`, `dirty`, ...) change across an eviction,
/// never its position in the pool's frame array. Replacement policies that
/// need a stable iteration order (FIFO, CLOCK) depend on that.
#[derive(Debug, Clone)]
pub(super) struct Frame {
    pub page_num: Option<usize>,
    pub buf: Vec<u8>,
    pub dirty: bool,
    pub pin_count: u32,
    pub access_count: u32,
    pub last_accessed: u64,
}

impl Frame {
    pub fn empty() -> Self {
        Self {
            page_num: None,
            buf: vec![0u8; PAGE_SIZE],
            dirty: false,
            pin_count: 0,
            access_count: 0,
            last_accessed: 0,
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.pin_count == 0
    }
}
