use crate::error::{Result, StorageError};

/// Longest attribute name storable in the header page (matches the
/// reference implementation's 15-byte, nul-padded name field).
pub const ATTR_NAME_MAX_LEN: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int,
    Float,
    String,
    Bool,
}

impl DataType {
    pub(crate) fn tag(self) -> i32 {
        match self {
            DataType::Int => 0,
            DataType::Float => 1,
            DataType::String => 2,
            DataType::Bool => 3,
        }
    }

    pub(crate) fn from_tag(tag: i32) -> Result<Self> {
        match tag {
            0 => Ok(DataType::Int),
            1 => Ok(DataType::Float),
            2 => Ok(DataType::String),
            3 => Ok(DataType::Bool),
            _ => Err(StorageError::UnknownDataType),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub data_type: DataType,
    /// Only meaningful for `DataType::String`; the serialized width in bytes.
    pub type_length: i32,
}

impl Attribute {
    pub fn int(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Int,
            type_length: 0,
        }
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Float,
            type_length: 0,
        }
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Bool,
            type_length: 0,
        }
    }

    pub fn string(name: impl Into<String>, length: i32) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::String,
            type_length: length,
        }
    }

    /// Serialized width of this attribute's value, in bytes.
    pub fn size(&self) -> usize {
        match self.data_type {
            DataType::Int | DataType::Float => 4,
            DataType::Bool => 1,
            DataType::String => self.type_length.max(0) as usize,
        }
    }
}

/// An ordered attribute list plus the key-attribute indices, as described
/// for a table's header page. `create_schema` in the reference
/// implementation takes ownership of caller-built arrays without
/// deep-copying them; the Rust analogue is simply taking owned `Vec`s by
/// value, which this constructor does.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub attributes: Vec<Attribute>,
    pub key_attrs: Vec<usize>,
}

impl Schema {
    pub fn new(attributes: Vec<Attribute>, key_attrs: Vec<usize>) -> Self {
        Self {
            attributes,
            key_attrs,
        }
    }

    pub fn num_attrs(&self) -> usize {
        self.attributes.len()
    }

    pub fn key_size(&self) -> usize {
        self.key_attrs
            .iter()
            .map(|&i| self.attributes[i].size())
            .sum()
    }

    /// Total bytes needed for one record slot, tombstone byte included.
    pub fn record_size(&self) -> usize {
        1 + self.attributes.iter().map(|a| a.size()).sum::<usize>()
    }

    /// Byte offset of attribute `idx` within a record's payload: one past
    /// the tombstone, plus the cumulative size of preceding attributes.
    pub fn attr_offset(&self, idx: usize) -> Result<usize> {
        if idx >= self.attributes.len() {
            return Err(StorageError::InvalidParameter(format!(
                "no attribute at index {idx}"
            )));
        }
        Ok(1 + self.attributes[..idx].iter().map(|a| a.size()).sum::<usize>())
    }

    pub fn attr(&self, idx: usize) -> Result<&Attribute> {
        self.attributes
            .get(idx)
            .ok_or_else(|| StorageError::InvalidParameter(format!("no attribute at index {idx}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_size_sums_attributes_plus_tombstone() {
        let schema = Schema::new(
            vec![Attribute::int("id"), Attribute::string("name", 10)],
            vec![0],
        );
        assert_eq!(schema.record_size(), 1 + 4 + 10);
    }

    #[test]
    fn attr_offset_accounts_for_tombstone_and_predecessors() {
        let schema = Schema::new(
            vec![Attribute::int("id"), Attribute::string("name", 10)],
            vec![0],
        );
        assert_eq!(schema.attr_offset(0).unwrap(), 1);
        assert_eq!(schema.attr_offset(1).unwrap(), 5);
    }

    #[test]
    fn attr_offset_out_of_range_is_invalid_parameter() {
        let schema = Schema::new(vec![Attribute::int("id")], vec![0]);
        assert!(matches!(
            schema.attr_offset(5),
            Err(StorageError::InvalidParameter(_))
        ));
    }
}
