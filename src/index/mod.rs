use std::path::Path;

use crate::buffer_pool::{pin_page, BufferPoolManager, ReplacementPolicy, SharedBufferPool};
use crate::error::{Result, StorageError};
use crate::page_file::{PageFile, PAGE_SIZE};
use crate::tuple::cursor::{ByteCursor, ByteReader};
use crate::tuple::Rid;

const INDEX_POOL_CAPACITY: usize = 10;

/// Encodes one data page: `[full: bool][mother: i32][leaf: bool][left: Rid]
/// [value1: i32][mid: Rid][value2: i32][right: Rid]`. `mother`/`leaf`/`right`
/// are reserved for a real B-tree and are always written as zero/invalid --
/// nothing in this module ever reads them back as meaningful.
fn encode_page(full: bool, left: Rid, value1: i32, mid: Rid, value2: i32) -> Vec<u8> {
    let mut buf = vec![0u8; PAGE_SIZE];
    let mut cursor = ByteCursor::new(&mut buf);
    cursor.write_bool(full).unwrap();
    cursor.write_i32(0).unwrap();
    cursor.write_bool(false).unwrap();
    cursor.write_i32(left.page).unwrap();
    cursor.write_i32(left.slot).unwrap();
    cursor.write_i32(value1).unwrap();
    cursor.write_i32(mid.page).unwrap();
    cursor.write_i32(mid.slot).unwrap();
    cursor.write_i32(value2).unwrap();
    cursor.write_i32(Rid::INVALID.page).unwrap();
    cursor.write_i32(Rid::INVALID.slot).unwrap();
    buf
}

fn decode_page(buf: &[u8]) -> (bool, Rid, i32, Rid, i32) {
    let mut reader = ByteReader::new(buf);
    let full = reader.read_bool().unwrap();
    let _mother = reader.read_i32().unwrap();
    let _leaf = reader.read_bool().unwrap();
    let left = Rid::new(reader.read_i32().unwrap(), reader.read_i32().unwrap());
    let value1 = reader.read_i32().unwrap();
    let mid = Rid::new(reader.read_i32().unwrap(), reader.read_i32().unwrap());
    let value2 = reader.read_i32().unwrap();
    (full, left, value1, mid, value2)
}

/// Maps a dense entry index to its (page, slot-within-page) location. Pages
/// hold at most two entries apiece, starting at page 1.
fn entry_loc(idx: usize) -> (usize, usize) {
    (1 + idx / 2, idx % 2)
}

pub fn create_index(path: impl AsRef<Path>, order: i32) -> Result<()> {
    let file = PageFile::create(&path)?;
    let pool = BufferPoolManager::new(file, INDEX_POOL_CAPACITY, ReplacementPolicy::Fifo);
    {
        let handle = pin_page(&pool, 0)?;
        let mut buf = vec![0u8; PAGE_SIZE];
        ByteCursor::new(&mut buf).write_i32(order)?;
        handle.write_bytes(0, &buf);
    }
    pool.lock().shutdown()
}

pub fn delete_index(path: impl AsRef<Path>) -> Result<()> {
    PageFile::destroy(path)
}

/// A flat, two-entries-per-page key index over integer keys. Each open
/// handle owns its own `last_page`/`global_count`, unlike the reference
/// implementation's process-wide globals.
pub struct BTree {
    pool: SharedBufferPool,
    order: i32,
    last_page: usize,
    global_count: usize,
}

impl BTree {
    /// Opens the tree's backing file and reads its order, but does not
    /// reconstruct entries left over from a previous session: `last_page`
    /// and `global_count` always start at zero, matching the reference
    /// implementation's `openBtree` (`globalCount = 0`) and `closeBtree`
    /// (`lastPage = 0`). A tree is logically empty every time it is opened;
    /// inserting after reopen overwrites whatever data pages already exist
    /// on disk starting from page 1.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = PageFile::open(&path)?;
        let pool = BufferPoolManager::new(file, INDEX_POOL_CAPACITY, ReplacementPolicy::Fifo);

        let order = {
            let handle = pin_page(&pool, 0)?;
            let mut reader = ByteReader::new(&handle.read_bytes(0, 4));
            reader.read_i32()?
        };

        Ok(Self {
            pool,
            order,
            last_page: 0,
            global_count: 0,
        })
    }

    pub fn close(self) -> Result<()> {
        self.pool.lock().shutdown()
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    /// `lastPage + 1` in the reference implementation, counting page 0
    /// alongside the data pages. Preserved verbatim rather than "fixed".
    pub fn num_nodes(&self) -> usize {
        self.last_page + 1
    }

    pub fn num_entries(&self) -> usize {
        self.global_count
    }

    fn get_entry(&self, idx: usize) -> Result<(i32, Rid)> {
        let (page, slot) = entry_loc(idx);
        let handle = pin_page(&self.pool, page)?;
        let buf = handle.read_bytes(0, PAGE_SIZE);
        let (_, left, value1, mid, value2) = decode_page(&buf);
        Ok(if slot == 0 {
            (value1, left)
        } else {
            (value2, mid)
        })
    }

    fn set_entry(&self, idx: usize, key: i32, rid: Rid) -> Result<()> {
        let (page, slot) = entry_loc(idx);
        let handle = pin_page(&self.pool, page)?;
        let buf = handle.read_bytes(0, PAGE_SIZE);
        let (full, mut left, mut value1, mut mid, mut value2) = decode_page(&buf);
        if slot == 0 {
            left = rid;
            value1 = key;
        } else {
            mid = rid;
            value2 = key;
        }
        handle.write_bytes(0, &encode_page(full, left, value1, mid, value2));
        handle.mark_dirty();
        Ok(())
    }

    pub fn insert_key(&mut self, key: i32, rid: Rid) -> Result<()> {
        let idx = self.global_count;
        let (page, slot) = entry_loc(idx);
        let handle = pin_page(&self.pool, page)?;
        let new_buf = if slot == 0 {
            encode_page(false, rid, key, Rid::INVALID, 0)
        } else {
            let existing = handle.read_bytes(0, PAGE_SIZE);
            let (_, left, value1, _, _) = decode_page(&existing);
            encode_page(true, left, value1, rid, key)
        };
        handle.write_bytes(0, &new_buf);
        handle.mark_dirty();
        drop(handle);

        self.global_count += 1;
        self.last_page = page;
        Ok(())
    }

    pub fn find_key(&self, key: i32) -> Result<Rid> {
        for idx in 0..self.global_count {
            let (k, rid) = self.get_entry(idx)?;
            if k == key {
                return Ok(rid);
            }
        }
        Err(StorageError::KeyNotFound)
    }

    /// Locates `key`, then moves the tree's last entry into the vacated
    /// slot to keep storage dense, shrinking `last_page` if that empties it.
    pub fn delete_key(&mut self, key: i32) -> Result<()> {
        let mut target = None;
        for idx in 0..self.global_count {
            if self.get_entry(idx)?.0 == key {
                target = Some(idx);
                break;
            }
        }
        let idx = target.ok_or(StorageError::KeyNotFound)?;
        let last_idx = self.global_count - 1;

        if idx != last_idx {
            let (last_key, last_rid) = self.get_entry(last_idx)?;
            self.set_entry(idx, last_key, last_rid)?;
        }

        let (last_page, last_slot) = entry_loc(last_idx);
        if last_slot == 1 {
            let handle = pin_page(&self.pool, last_page)?;
            let buf = handle.read_bytes(0, PAGE_SIZE);
            let (_, left, value1, _, _) = decode_page(&buf);
            handle.write_bytes(0, &encode_page(false, left, value1, Rid::INVALID, 0));
            handle.mark_dirty();
        }

        self.global_count -= 1;
        self.last_page = if self.global_count == 0 {
            0
        } else {
            entry_loc(self.global_count - 1).0
        };
        Ok(())
    }

    pub fn open_scan(&self) -> Result<IndexScan> {
        let mut entries = Vec::with_capacity(self.global_count);
        for idx in 0..self.global_count {
            entries.push(self.get_entry(idx)?);
        }
        entries.sort_by_key(|&(k, _)| k);
        Ok(IndexScan { entries, pos: 0 })
    }
}

/// A snapshot of the tree's keys in ascending order at the time the scan
/// was opened, owned entirely by the scan handle.
pub struct IndexScan {
    entries: Vec<(i32, Rid)>,
    pos: usize,
}

impl IndexScan {
    pub fn next_entry(&mut self) -> Result<Rid> {
        match self.entries.get(self.pos) {
            Some(&(_, rid)) => {
                self.pos += 1;
                Ok(rid)
            }
            None => Err(StorageError::NoMoreEntries),
        }
    }

    pub fn close(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn scratch_path() -> std::path::PathBuf {
        let f = NamedTempFile::new().unwrap();
        let path = f.path().to_path_buf();
        drop(f);
        path
    }

    #[test]
    fn insert_and_find_across_multiple_pages() {
        let path = scratch_path();
        create_index(&path, 2).unwrap();
        let mut tree = BTree::open(&path).unwrap();

        for key in 0..5 {
            tree.insert_key(key, Rid::new(key, 0)).unwrap();
        }
        for key in 0..5 {
            assert_eq!(tree.find_key(key).unwrap(), Rid::new(key, 0));
        }
        assert_eq!(tree.num_entries(), 5);
        // 5 entries -> pages 1,2,3 (2,2,1) -> last_page = 3 -> num_nodes = 4
        assert_eq!(tree.num_nodes(), 4);
        tree.close().unwrap();
    }

    #[test]
    fn delete_compacts_by_moving_last_entry() {
        let path = scratch_path();
        create_index(&path, 2).unwrap();
        let mut tree = BTree::open(&path).unwrap();

        for key in 0..4 {
            tree.insert_key(key, Rid::new(key, 0)).unwrap();
        }
        tree.delete_key(1).unwrap();

        assert!(matches!(tree.find_key(1), Err(StorageError::KeyNotFound)));
        assert_eq!(tree.num_entries(), 3);
        assert_eq!(tree.find_key(3).unwrap(), Rid::new(3, 0));
        tree.close().unwrap();
    }

    #[test]
    fn scan_returns_keys_in_ascending_order() {
        let path = scratch_path();
        create_index(&path, 2).unwrap();
        let mut tree = BTree::open(&path).unwrap();
        for key in [5, 1, 3] {
            tree.insert_key(key, Rid::new(key, 0)).unwrap();
        }

        let mut scan = tree.open_scan().unwrap();
        assert_eq!(scan.next_entry().unwrap(), Rid::new(1, 0));
        assert_eq!(scan.next_entry().unwrap(), Rid::new(3, 0));
        assert_eq!(scan.next_entry().unwrap(), Rid::new(5, 0));
        assert!(matches!(
            scan.next_entry(),
            Err(StorageError::NoMoreEntries)
        ));
        tree.close().unwrap();
    }

    #[test]
    fn num_nodes_counts_page_zero_for_empty_tree() {
        let path = scratch_path();
        create_index(&path, 2).unwrap();
        let tree = BTree::open(&path).unwrap();
        assert_eq!(tree.num_nodes(), 1);
        tree.close().unwrap();
    }

    #[test]
    fn entries_do_not_survive_close_and_reopen() {
        let path = scratch_path();
        create_index(&path, 2).unwrap();
        let mut tree = BTree::open(&path).unwrap();
        for key in 0..3 {
            tree.insert_key(key, Rid::new(key, 0)).unwrap();
        }
        assert_eq!(tree.num_entries(), 3);
        tree.close().unwrap();

        let reopened = BTree::open(&path).unwrap();
        assert_eq!(reopened.num_entries(), 0);
        assert_eq!(reopened.num_nodes(), 1);
        assert!(matches!(
            reopened.find_key(0),
            Err(StorageError::KeyNotFound)
        ));
        reopened.close().unwrap();
    }

    #[test]
    fn scan_order_is_independent_of_insertion_order() {
        use rand::seq::SliceRandom;
        use rand::thread_rng;

        let path = scratch_path();
        create_index(&path, 2).unwrap();
        let mut tree = BTree::open(&path).unwrap();

        let mut keys: Vec<i32> = (0..20).collect();
        keys.shuffle(&mut thread_rng());
        for &key in &keys {
            tree.insert_key(key, Rid::new(key, 0)).unwrap();
        }

        let mut scan = tree.open_scan().unwrap();
        for expected in 0..20 {
            assert_eq!(scan.next_entry().unwrap(), Rid::new(expected, 0));
        }
        assert!(matches!(
            scan.next_entry(),
            Err(StorageError::NoMoreEntries)
        ));
        tree.close().unwrap();
    }
}
