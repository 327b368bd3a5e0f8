use std::path::Path;

use crate::buffer_pool::{pin_page, BufferPoolManager, SharedBufferPool};
use crate::config::StorageConfig;
use crate::error::{Result, StorageError};
use crate::page_file::{PageFile, PAGE_SIZE};
use crate::tuple::cursor::{ByteCursor, ByteReader};
use crate::tuple::{
    Attribute, DataType, Record, Rid, Schema, ATTR_NAME_MAX_LEN, TOMBSTONE_DEAD, TOMBSTONE_LIVE,
};

fn build_header_page(schema: &Schema) -> Vec<u8> {
    let mut page = vec![0u8; PAGE_SIZE];
    let mut cursor = ByteCursor::new(&mut page);
    cursor.write_i32(0).unwrap(); // tuple_count
    cursor.write_i32(1).unwrap(); // free_page_index
    cursor.write_i32(schema.num_attrs() as i32).unwrap();
    cursor.write_i32(schema.key_size() as i32).unwrap();
    for attr in &schema.attributes {
        cursor.write_fixed_str(&attr.name, ATTR_NAME_MAX_LEN).unwrap();
        cursor.write_i32(attr.data_type.tag()).unwrap();
        cursor.write_i32(attr.type_length).unwrap();
    }
    page
}

fn parse_header_page(page: &[u8]) -> Result<(usize, usize, Schema)> {
    let mut reader = ByteReader::new(page);
    let tuple_count = reader.read_i32()? as usize;
    let free_page_index = reader.read_i32()? as usize;
    let num_attrs = reader.read_i32()? as usize;
    let _key_size = reader.read_i32()?;

    let mut attributes = Vec::with_capacity(num_attrs);
    for _ in 0..num_attrs {
        let name = reader.read_fixed_str(ATTR_NAME_MAX_LEN)?;
        let type_tag = reader.read_i32()?;
        let type_length = reader.read_i32()?;
        attributes.push(Attribute {
            name,
            data_type: DataType::from_tag(type_tag)?,
            type_length,
        });
    }
    // key_attrs indices are not part of the on-disk header (only their
    // combined byte width is), so a reopened table always comes back with
    // an empty key list. Callers that need key semantics across a
    // close/open cycle must track key_attrs themselves.
    Ok((tuple_count, free_page_index, Schema::new(attributes, vec![])))
}

fn locate_empty_slot(page: &[u8], record_size: usize, slots_per_page: usize) -> Option<usize> {
    (0..slots_per_page).find(|&slot| page[slot * record_size] != TOMBSTONE_LIVE)
}

/// Creates the backing page file for a table and writes its header page.
/// Does not return a live handle: call `open_table` afterwards to work with
/// the table. This mirrors the source's createTable/openTable split, where
/// the pool created here never outlives this call.
pub fn create_table(path: impl AsRef<Path>, schema: &Schema, config: &StorageConfig) -> Result<()> {
    let file = PageFile::create(&path)?;
    let pool = BufferPoolManager::new(file, config.default_pool_capacity, config.default_replacement_policy);
    {
        let handle = pin_page(&pool, 0)?;
        handle.write_bytes(0, &build_header_page(schema));
    }
    pool.lock().shutdown()
}

pub fn delete_table(path: impl AsRef<Path>) -> Result<()> {
    PageFile::destroy(path)
}

/// An open table: its own buffer pool, reconstructed schema, and the
/// tuple-count / free-page-index bookkeeping from the header page.
pub struct Table {
    pool: SharedBufferPool,
    schema: Schema,
    tuple_count: usize,
    free_page_index: usize,
}

impl Table {
    pub fn open(path: impl AsRef<Path>, config: &StorageConfig) -> Result<Self> {
        let file = PageFile::open(&path)?;
        let pool = BufferPoolManager::new(file, config.default_pool_capacity, config.default_replacement_policy);
        let header = {
            let handle = pin_page(&pool, 0)?;
            handle.read_bytes(0, PAGE_SIZE)
        };
        let (tuple_count, free_page_index, schema) = parse_header_page(&header)?;
        Ok(Self {
            pool,
            schema,
            tuple_count,
            free_page_index,
        })
    }

    pub fn close(self) -> Result<()> {
        self.pool.lock().shutdown()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn num_tuples(&self) -> usize {
        self.tuple_count
    }

    fn record_size(&self) -> usize {
        self.schema.record_size()
    }

    fn slots_per_page(&self) -> usize {
        PAGE_SIZE / self.record_size()
    }

    /// Finds the first slot with room starting at `free_page_index`,
    /// writes the record there, and stamps its RID.
    pub fn insert_record(&mut self, record: &mut Record) -> Result<()> {
        let record_size = self.record_size();
        let slots_per_page = self.slots_per_page();
        let mut page = self.free_page_index;

        loop {
            let handle = pin_page(&self.pool, page)?;
            let contents = handle.read_bytes(0, PAGE_SIZE);
            match locate_empty_slot(&contents, record_size, slots_per_page) {
                Some(slot) => {
                    let mut payload = record.as_bytes().to_vec();
                    payload[0] = TOMBSTONE_LIVE;
                    handle.write_bytes(slot * record_size, &payload);
                    handle.mark_dirty();
                    drop(handle);
                    record.id = Rid::new(page as i32, slot as i32);
                    self.tuple_count += 1;
                    return Ok(());
                }
                None => {
                    drop(handle);
                    page += 1;
                }
            }
        }
    }

    pub fn delete_record(&mut self, rid: Rid) -> Result<()> {
        let record_size = self.record_size();
        let handle = pin_page(&self.pool, rid.page as usize)?;
        handle.write_bytes(rid.slot as usize * record_size, &[TOMBSTONE_DEAD]);
        handle.mark_dirty();
        drop(handle);
        self.free_page_index = rid.page as usize;
        Ok(())
    }

    pub fn update_record(&mut self, record: &Record) -> Result<()> {
        let record_size = self.record_size();
        let handle = pin_page(&self.pool, record.id.page as usize)?;
        let mut payload = record.as_bytes().to_vec();
        payload[0] = TOMBSTONE_LIVE;
        handle.write_bytes(record.id.slot as usize * record_size, &payload);
        handle.mark_dirty();
        Ok(())
    }

    pub fn get_record(&mut self, rid: Rid) -> Result<Record> {
        let record_size = self.record_size();
        let handle = pin_page(&self.pool, rid.page as usize)?;
        let mut bytes = handle.read_bytes(rid.slot as usize * record_size, record_size);
        if bytes[0] != TOMBSTONE_LIVE {
            return Err(StorageError::NoTupleForRid);
        }
        bytes[0] = TOMBSTONE_LIVE;
        Ok(Record::from_bytes(rid, bytes))
    }

    /// Reads the slot at `rid` unconditionally, forcing its tombstone byte
    /// to dead. Used only by `Scan::next`, which evaluates its predicate
    /// against every slot regardless of occupancy.
    fn read_slot_for_scan(&mut self, rid: Rid) -> Result<Record> {
        let record_size = self.record_size();
        let handle = pin_page(&self.pool, rid.page as usize)?;
        let mut bytes = handle.read_bytes(rid.slot as usize * record_size, record_size);
        bytes[0] = TOMBSTONE_DEAD;
        Ok(Record::from_bytes(rid, bytes))
    }

    pub fn start_scan<'p>(&self, predicate: impl Fn(&Record) -> bool + 'p) -> Scan<'p> {
        Scan {
            page: 0,
            slot: 0,
            count: 0,
            predicate: Box::new(predicate),
        }
    }
}

/// Scan cursor over a table, owned entirely by the handle that opened it --
/// no global scan registry. The predicate is evaluated against every slot
/// visited, live or not, matching the reference implementation.
pub struct Scan<'p> {
    page: i32,
    slot: i32,
    count: usize,
    predicate: Box<dyn Fn(&Record) -> bool + 'p>,
}

impl<'p> Scan<'p> {
    pub fn next(&mut self, table: &mut Table) -> Result<Record> {
        let slots_per_page = table.slots_per_page() as i32;
        let total = table.tuple_count;
        if total == 0 {
            return Err(StorageError::NoMoreTuples);
        }

        while self.count <= total {
            if self.count == 0 {
                self.page = 1;
                self.slot = 0;
            } else {
                self.slot += 1;
                if self.slot >= slots_per_page {
                    self.slot = 0;
                    self.page += 1;
                }
            }

            let rid = Rid::new(self.page, self.slot);
            let record = table.read_slot_for_scan(rid)?;
            self.count += 1;

            if (self.predicate)(&record) {
                return Ok(record);
            }
        }

        self.page = 1;
        self.slot = 0;
        self.count = 0;
        Err(StorageError::NoMoreTuples)
    }

    pub fn close(self) {}
}
