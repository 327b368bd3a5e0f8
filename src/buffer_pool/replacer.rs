use core::fmt::Debug;

use super::frame::Frame;

/// Chooses which eligible (unpinned) frame to evict next. Implementations
/// hold whatever cursor state their policy needs (a FIFO head, a clock hand)
/// but never own the frames themselves -- `evict` is handed the pool's frame
/// array and returns an index into it, mutating per-frame bookkeeping
/// (CLOCK's second-chance bit) in place where the policy requires it.
pub(super) trait Replacer: Debug {
    /// Select a victim among `frames`. Only frames with `pin_count == 0` are
    /// eligible. Returns `None` if no frame is eligible.
    fn evict(&mut self, frames: &mut [Frame]) -> Option<usize>;
}

#[derive(Debug, Default)]
pub(super) struct Fifo {
    head: usize,
}

impl Fifo {
    pub fn new() -> Self {
        Self { head: 0 }
    }
}

impl Replacer for Fifo {
    fn evict(&mut self, frames: &mut [Frame]) -> Option<usize> {
        let n = frames.len();
        for step in 0..n {
            let idx = (self.head + step) % n;
            if frames[idx].page_num.is_some() && frames[idx].is_eligible() {
                self.head = (idx + 1) % n;
                return Some(idx);
            }
        }
        None
    }
}

#[derive(Debug, Default)]
pub(super) struct Lru;

impl Lru {
    pub fn new() -> Self {
        Self
    }
}

impl Replacer for Lru {
    fn evict(&mut self, frames: &mut [Frame]) -> Option<usize> {
        frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.page_num.is_some() && f.is_eligible())
            .min_by_key(|(_, f)| f.last_accessed)
            .map(|(idx, _)| idx)
    }
}

#[derive(Debug, Default)]
pub(super) struct Lfu;

impl Lfu {
    pub fn new() -> Self {
        Self
    }
}

impl Replacer for Lfu {
    fn evict(&mut self, frames: &mut [Frame]) -> Option<usize> {
        frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.page_num.is_some() && f.is_eligible())
            .min_by_key(|(_, f)| (f.access_count, f.last_accessed))
            .map(|(idx, _)| idx)
    }
}

#[derive(Debug, Default)]
pub(super) struct Clock {
    hand: usize,
}

impl Clock {
    pub fn new() -> Self {
        Self { hand: 0 }
    }
}

impl Replacer for Clock {
    fn evict(&mut self, frames: &mut [Frame]) -> Option<usize> {
        let n = frames.len();
        if n == 0 || !frames.iter().any(|f| f.page_num.is_some() && f.is_eligible()) {
            return None;
        }
        loop {
            let idx = self.hand;
            let frame = &mut frames[idx];
            if frame.page_num.is_some() && frame.is_eligible() && frame.access_count == 0 {
                self.hand = (idx + 1) % n;
                return Some(idx);
            }
            if frame.access_count > 0 {
                frame.access_count = 0;
            }
            self.hand = (idx + 1) % n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(page_num: usize, pin: u32, access: u32, last: u64) -> Frame {
        let mut f = Frame::empty();
        f.page_num = Some(page_num);
        f.pin_count = pin;
        f.access_count = access;
        f.last_accessed = last;
        f
    }

    #[test]
    fn fifo_advances_head_past_victim() {
        let mut frames = vec![frame_with(1, 0, 0, 1), frame_with(2, 0, 0, 2), frame_with(3, 0, 0, 3)];
        let mut r = Fifo::new();
        assert_eq!(r.evict(&mut frames), Some(0));
        assert_eq!(r.evict(&mut frames), Some(1));
    }

    #[test]
    fn fifo_skips_pinned() {
        let mut frames = vec![frame_with(1, 1, 0, 1), frame_with(2, 0, 0, 2)];
        let mut r = Fifo::new();
        assert_eq!(r.evict(&mut frames), Some(1));
    }

    #[test]
    fn lru_picks_smallest_last_accessed() {
        let mut frames = vec![frame_with(1, 0, 0, 5), frame_with(2, 0, 0, 1), frame_with(3, 0, 0, 9)];
        let mut r = Lru::new();
        assert_eq!(r.evict(&mut frames), Some(1));
    }

    #[test]
    fn lfu_breaks_ties_with_last_accessed() {
        let mut frames = vec![frame_with(1, 0, 3, 10), frame_with(2, 0, 1, 20), frame_with(3, 0, 1, 5)];
        let mut r = Lfu::new();
        assert_eq!(r.evict(&mut frames), Some(2));
    }

    #[test]
    fn clock_gives_second_chance_before_selecting() {
        let mut frames = vec![frame_with(1, 0, 1, 0), frame_with(2, 0, 1, 0), frame_with(3, 0, 1, 0)];
        let mut r = Clock::new();
        let victim = r.evict(&mut frames);
        assert_eq!(victim, Some(0));
        assert_eq!(r.hand, 1);
        assert!(frames.iter().all(|f| f.access_count == 0));
    }
}
