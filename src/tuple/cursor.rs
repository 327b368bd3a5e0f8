use crate::error::{Result, StorageError};

/// Bounds-checked cursor over a byte buffer, fixed to little-endian for
/// every multi-byte field. Replaces the raw pointer arithmetic the
/// reference implementation uses to read and write fields at computed
/// offsets in a page buffer.
pub struct ByteCursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn at(buf: &'a mut [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn check(&self, len: usize) -> Result<()> {
        if self.pos + len > self.buf.len() {
            return Err(StorageError::InvalidParameter(format!(
                "cursor out of bounds: pos {} len {} buf {}",
                self.pos,
                len,
                self.buf.len()
            )));
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.check(1)?;
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(b)
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.check(1)?;
        self.buf[self.pos] = v;
        self.pos += 1;
        Ok(())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn write_bool(&mut self, v: bool) -> Result<()> {
        self.write_u8(v as u8)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.check(4)?;
        let bytes: [u8; 4] = self.buf[self.pos..self.pos + 4].try_into().unwrap();
        self.pos += 4;
        Ok(i32::from_le_bytes(bytes))
    }

    pub fn write_i32(&mut self, v: i32) -> Result<()> {
        self.check(4)?;
        self.buf[self.pos..self.pos + 4].copy_from_slice(&v.to_le_bytes());
        self.pos += 4;
        Ok(())
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.check(4)?;
        let bytes: [u8; 4] = self.buf[self.pos..self.pos + 4].try_into().unwrap();
        self.pos += 4;
        Ok(f32::from_le_bytes(bytes))
    }

    pub fn write_f32(&mut self, v: f32) -> Result<()> {
        self.check(4)?;
        self.buf[self.pos..self.pos + 4].copy_from_slice(&v.to_le_bytes());
        self.pos += 4;
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.check(len)?;
        let out = self.buf[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(out)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.check(bytes.len())?;
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    /// Writes a zero-padded fixed-width string field with no length prefix.
    pub fn write_fixed_str(&mut self, s: &str, width: usize) -> Result<()> {
        self.check(width)?;
        let bytes = s.as_bytes();
        let n = bytes.len().min(width);
        self.buf[self.pos..self.pos + n].copy_from_slice(&bytes[..n]);
        for b in &mut self.buf[self.pos + n..self.pos + width] {
            *b = 0;
        }
        self.pos += width;
        Ok(())
    }

    /// Reads a fixed-width string field, trimming at the first nul byte.
    pub fn read_fixed_str(&mut self, width: usize) -> Result<String> {
        self.check(width)?;
        let raw = &self.buf[self.pos..self.pos + width];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(width);
        let s = String::from_utf8_lossy(&raw[..end]).into_owned();
        self.pos += width;
        Ok(s)
    }
}

/// Read-only counterpart of `ByteCursor`, for callers that only have a
/// shared reference to the underlying buffer (e.g. reading an attribute out
/// of a record without needing to mutate it).
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    fn check(&self, len: usize) -> Result<()> {
        if self.pos + len > self.buf.len() {
            return Err(StorageError::InvalidParameter(format!(
                "cursor out of bounds: pos {} len {} buf {}",
                self.pos,
                len,
                self.buf.len()
            )));
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.check(1)?;
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(b)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.check(4)?;
        let bytes: [u8; 4] = self.buf[self.pos..self.pos + 4].try_into().unwrap();
        self.pos += 4;
        Ok(i32::from_le_bytes(bytes))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.check(4)?;
        let bytes: [u8; 4] = self.buf[self.pos..self.pos + 4].try_into().unwrap();
        self.pos += 4;
        Ok(f32::from_le_bytes(bytes))
    }

    pub fn read_fixed_str(&mut self, width: usize) -> Result<String> {
        self.check(width)?;
        let raw = &self.buf[self.pos..self.pos + width];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(width);
        let s = String::from_utf8_lossy(&raw[..end]).into_owned();
        self.pos += width;
        Ok(s)
    }
}
