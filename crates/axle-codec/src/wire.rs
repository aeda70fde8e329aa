//! Primitive readers and writers for the canonical layout

use axle_types::{Address, ContentHash, TaskId, TaskStatus};

use crate::{CodecError, CodecResult};

/// Append-only encoder
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_discriminator(discriminator: [u8; 8]) -> Self {
        let mut writer = Self::new();
        writer.put_raw(&discriminator);
        writer
    }

    pub fn put_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn put_u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn put_bool(&mut self, value: bool) -> &mut Self {
        self.put_u8(value as u8)
    }

    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.put_raw(&value.to_le_bytes())
    }

    pub fn put_u64(&mut self, value: u64) -> &mut Self {
        self.put_raw(&value.to_le_bytes())
    }

    pub fn put_i64(&mut self, value: i64) -> &mut Self {
        self.put_raw(&value.to_le_bytes())
    }

    pub fn put_address(&mut self, value: &Address) -> &mut Self {
        self.put_raw(value.as_bytes())
    }

    pub fn put_task_id(&mut self, value: &TaskId) -> &mut Self {
        self.put_raw(value.as_bytes())
    }

    pub fn put_hash(&mut self, value: &ContentHash) -> &mut Self {
        self.put_raw(value.as_bytes())
    }

    pub fn put_status(&mut self, value: TaskStatus) -> &mut Self {
        self.put_u8(value.as_u8())
    }

    /// Callers keep strings under `u32::MAX` bytes; every protocol string
    /// is bounded far below that.
    pub fn put_str(&mut self, value: &str) -> &mut Self {
        self.put_u32(value.len() as u32);
        self.put_raw(value.as_bytes())
    }

    pub fn put_str_seq<S: AsRef<str>>(&mut self, values: &[S]) -> &mut Self {
        self.put_u32(values.len() as u32);
        for value in values {
            self.put_str(value.as_ref());
        }
        self
    }

    /// Presence byte, then the payload written by `write` if present
    pub fn put_option<T>(
        &mut self,
        value: Option<&T>,
        write: impl FnOnce(&mut Self, &T),
    ) -> &mut Self
    where
        T: ?Sized,
    {
        match value {
            Some(inner) => {
                self.put_u8(1);
                write(self, inner);
            }
            None => {
                self.put_u8(0);
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over an encoded buffer; every read is bounds-checked
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    pub fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CodecError::Truncated {
                offset: self.offset,
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.buf[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    pub fn array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn discriminator(&mut self) -> CodecResult<[u8; 8]> {
        self.array::<8>()
    }

    pub fn u8(&mut self) -> CodecResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    pub fn bool(&mut self, field: &'static str) -> CodecResult<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(CodecError::InvalidTag { field, value }),
        }
    }

    pub fn u32(&mut self) -> CodecResult<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn u64(&mut self) -> CodecResult<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    pub fn i64(&mut self) -> CodecResult<i64> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    pub fn address(&mut self) -> CodecResult<Address> {
        Ok(Address::new(self.array()?))
    }

    pub fn task_id(&mut self) -> CodecResult<TaskId> {
        Ok(TaskId::new(self.array()?))
    }

    pub fn hash(&mut self) -> CodecResult<ContentHash> {
        Ok(ContentHash::from(self.array::<32>()?))
    }

    pub fn status(&mut self) -> CodecResult<TaskStatus> {
        let value = self.u8()?;
        TaskStatus::from_u8(value).map_err(|_| CodecError::InvalidTag {
            field: "status",
            value,
        })
    }

    pub fn string(&mut self, field: &'static str) -> CodecResult<String> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8(field))
    }

    pub fn string_seq(&mut self, field: &'static str) -> CodecResult<Vec<String>> {
        let count = self.u32()? as usize;
        // Each entry needs at least its length prefix
        if count > self.remaining() / 4 {
            return Err(CodecError::Truncated {
                offset: self.offset,
                needed: count.saturating_mul(4),
                available: self.remaining(),
            });
        }
        (0..count).map(|_| self.string(field)).collect()
    }

    /// Presence byte, then the payload read by `read` if present
    pub fn option<T>(
        &mut self,
        field: &'static str,
        read: impl FnOnce(&mut Self) -> CodecResult<T>,
    ) -> CodecResult<Option<T>> {
        match self.u8()? {
            0 => Ok(None),
            1 => read(self).map(Some),
            value => Err(CodecError::InvalidTag { field, value }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_layout() {
        let mut writer = ByteWriter::new();
        writer.put_u32(1).put_u64(2).put_i64(-1);
        let bytes = writer.into_bytes();
        assert_eq!(&bytes[..4], &[1, 0, 0, 0]);
        assert_eq!(&bytes[4..12], &[2, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[12..], &[0xff; 8]);
    }

    #[test]
    fn test_string_is_length_prefixed() {
        let mut writer = ByteWriter::new();
        writer.put_str("abc");
        assert_eq!(writer.into_bytes(), vec![3, 0, 0, 0, b'a', b'b', b'c']);
    }

    #[test]
    fn test_option_presence_byte() {
        let mut writer = ByteWriter::new();
        writer.put_option(Some(&7i64), |w, v| {
            w.put_i64(*v);
        });
        writer.put_option(None::<&i64>, |w, v| {
            w.put_i64(*v);
        });
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), 1 + 8 + 1);

        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.option("a", |r| r.i64()).unwrap(), Some(7));
        assert_eq!(reader.option("b", |r| r.i64()).unwrap(), None);
    }

    #[test]
    fn test_invalid_bool_rejected() {
        let mut reader = ByteReader::new(&[2]);
        assert_eq!(
            reader.bool("is_active"),
            Err(CodecError::InvalidTag {
                field: "is_active",
                value: 2
            })
        );
    }

    #[test]
    fn test_truncated_string() {
        let mut reader = ByteReader::new(&[10, 0, 0, 0, b'a']);
        assert!(matches!(reader.string("s"), Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn test_huge_sequence_count_does_not_allocate() {
        let mut reader = ByteReader::new(&[0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(
            reader.string_seq("capabilities"),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut reader = ByteReader::new(&[2, 0, 0, 0, 0xc3, 0x28]);
        assert_eq!(reader.string("node_id"), Err(CodecError::InvalidUtf8("node_id")));
    }
}
