use super::cursor::{ByteCursor, ByteReader};
use super::schema::{DataType, Schema};
use crate::error::{Result, StorageError};

pub const TOMBSTONE_LIVE: u8 = b'+';
pub const TOMBSTONE_DEAD: u8 = b'-';

/// Record identifier: a page number and a slot number within that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rid {
    pub page: i32,
    pub slot: i32,
}

impl Rid {
    pub const INVALID: Rid = Rid { page: -1, slot: -1 };

    pub fn new(page: i32, slot: i32) -> Self {
        Self { page, slot }
    }
}

/// A typed attribute value, as read out of or written into a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Bool(bool),
    String(String),
}

impl Value {
    fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Bool(_) => DataType::Bool,
            Value::String(_) => DataType::String,
        }
    }
}

/// {RID, raw bytes}. Byte 0 of `data` is the tombstone marker; attribute
/// values follow in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: Rid,
    data: Vec<u8>,
}

impl Record {
    /// Allocates a fresh, empty (tombstoned) record sized for `schema`.
    pub fn new(schema: &Schema) -> Self {
        let mut data = vec![0u8; schema.record_size()];
        data[0] = TOMBSTONE_DEAD;
        Self {
            id: Rid::INVALID,
            data,
        }
    }

    /// Wraps an already-serialized slot (tombstone byte included).
    pub fn from_bytes(id: Rid, data: Vec<u8>) -> Self {
        Self { id, data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_live(&self) -> bool {
        self.data[0] == TOMBSTONE_LIVE
    }

    pub fn set_live(&mut self, live: bool) {
        self.data[0] = if live { TOMBSTONE_LIVE } else { TOMBSTONE_DEAD };
    }

    /// Reads attribute `idx` out of the record. Never mutates `schema` --
    /// the reference implementation's `getAttr` has a confirmed bug where
    /// it overwrites `schema->dataTypes[1]` on every call reading attribute
    /// index 1; this function only reads.
    pub fn get_attr(&self, schema: &Schema, idx: usize) -> Result<Value> {
        let attr = schema.attr(idx)?;
        let offset = schema.attr_offset(idx)?;
        let mut cursor = ByteReader::at(&self.data, offset);
        Ok(match attr.data_type {
            DataType::Int => Value::Int(cursor.read_i32()?),
            DataType::Float => Value::Float(cursor.read_f32()?),
            DataType::Bool => Value::Bool(cursor.read_bool()?),
            DataType::String => Value::String(cursor.read_fixed_str(attr.size())?),
        })
    }

    pub fn set_attr(&mut self, schema: &Schema, idx: usize, value: &Value) -> Result<()> {
        let attr = schema.attr(idx)?;
        if attr.data_type != value.data_type() {
            return Err(StorageError::InvalidParameter(format!(
                "attribute {idx} is {:?}, got {:?}",
                attr.data_type,
                value.data_type()
            )));
        }
        let offset = schema.attr_offset(idx)?;
        let mut cursor = ByteCursor::at(&mut self.data, offset);
        match value {
            Value::Int(v) => cursor.write_i32(*v)?,
            Value::Float(v) => cursor.write_f32(*v)?,
            Value::Bool(v) => cursor.write_bool(*v)?,
            Value::String(s) => cursor.write_fixed_str(s, attr.size())?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::schema::Attribute;

    fn schema() -> Schema {
        Schema::new(
            vec![Attribute::int("id"), Attribute::string("name", 10)],
            vec![0],
        )
    }

    #[test]
    fn new_record_is_dead_and_sized_for_schema() {
        let schema = schema();
        let record = Record::new(&schema);
        assert!(!record.is_live());
        assert_eq!(record.as_bytes().len(), schema.record_size());
    }

    #[test]
    fn set_then_get_attr_round_trips() {
        let schema = schema();
        let mut record = Record::new(&schema);
        record.set_live(true);
        record.set_attr(&schema, 0, &Value::Int(42)).unwrap();
        record
            .set_attr(&schema, 1, &Value::String("hello".into()))
            .unwrap();

        assert_eq!(record.get_attr(&schema, 0).unwrap(), Value::Int(42));
        assert_eq!(
            record.get_attr(&schema, 1).unwrap(),
            Value::String("hello".into())
        );
    }

    #[test]
    fn set_attr_type_mismatch_is_rejected() {
        let schema = schema();
        let mut record = Record::new(&schema);
        assert!(record.set_attr(&schema, 0, &Value::Bool(true)).is_err());
    }

    #[test]
    fn get_attr_never_mutates_schema() {
        let schema = schema();
        let mut record = Record::new(&schema);
        record.set_attr(&schema, 1, &Value::String("x".into())).unwrap();
        let before = schema.clone();
        let _ = record.get_attr(&schema, 1);
        assert_eq!(schema, before);
    }
}
