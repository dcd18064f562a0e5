//! File descriptor records of the FileGroupDescriptorW format.
//!
//! A FileGroupDescriptorW payload is a 4-byte record count followed by
//! fixed-size records:
//!
//! ```text
//! Offset | Size | Field
//! -------|------|-------------------------------------------
//! 0      | 4    | flags
//! 4      | 32   | reserved (clsid, sizel, pointl)
//! 36     | 4    | fileAttributes
//! 40     | 16   | reserved (creation and access times)
//! 56     | 8    | lastWriteTime (low, high)
//! 64     | 8    | fileSize (high, low)
//! 72     | 520  | fileName (UTF-16LE, 260 units, zero padded)
//! ```

use bytes::{Buf, BufMut};

use super::ensure_remaining;
use crate::CliprdrResult;

/// Size of one file descriptor record
pub const FILE_DESCRIPTOR_SIZE: usize = 592;

/// Size of the fileName field
const FILE_NAME_SIZE: usize = 520;

/// One parsed file descriptor record.
///
/// The name borrows from the record it was parsed from and holds the
/// UTF-16LE code units before the first NUL unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileDescriptor<'a> {
    /// Record flags (which optional fields are valid)
    pub flags: u32,
    /// Windows FILE_ATTRIBUTE_* bits
    pub attributes: u32,
    /// Low half of the last write FILETIME
    pub last_write_time_low: u32,
    /// High half of the last write FILETIME
    pub last_write_time_high: u32,
    /// High half of the file size
    pub size_high: u32,
    /// Low half of the file size
    pub size_low: u32,
    /// File name, UTF-16LE without terminator
    pub name: &'a [u8],
}

impl<'a> FileDescriptor<'a> {
    /// Parse one record from the start of `record`
    pub fn decode(record: &'a [u8]) -> CliprdrResult<Self> {
        let mut src = record;
        ensure_remaining(&mut src, FILE_DESCRIPTOR_SIZE, "FileDescriptorW")?;

        let flags = src.get_u32_le();
        src.advance(32);
        let attributes = src.get_u32_le();
        src.advance(16);
        let last_write_time_low = src.get_u32_le();
        let last_write_time_high = src.get_u32_le();
        let size_high = src.get_u32_le();
        let size_low = src.get_u32_le();

        let name_field = &src[..FILE_NAME_SIZE];
        let name = &name_field[..utf16_effective_len(name_field)];

        Ok(Self {
            flags,
            attributes,
            last_write_time_low,
            last_write_time_high,
            size_high,
            size_low,
            name,
        })
    }

    /// File size in bytes
    pub fn size(&self) -> u64 {
        (u64::from(self.size_high) << 32) | u64::from(self.size_low)
    }

    /// Last write time as a FILETIME (100ns intervals since 1601-01-01)
    pub fn last_write_time(&self) -> u64 {
        (u64::from(self.last_write_time_high) << 32) | u64::from(self.last_write_time_low)
    }

    /// Decoded file name
    pub fn name_lossy(&self) -> String {
        let units: Vec<u16> = self
            .name
            .chunks_exact(2)
            .map(|unit| u16::from_le_bytes([unit[0], unit[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    }

    /// Write a full 592-byte record. Names longer than 259 units are cut.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u32_le(self.flags);
        dst.put_bytes(0, 32);
        dst.put_u32_le(self.attributes);
        dst.put_bytes(0, 16);
        dst.put_u32_le(self.last_write_time_low);
        dst.put_u32_le(self.last_write_time_high);
        dst.put_u32_le(self.size_high);
        dst.put_u32_le(self.size_low);

        let name_len = self.name.len().min(FILE_NAME_SIZE - 2) & !1;
        dst.put_slice(&self.name[..name_len]);
        dst.put_bytes(0, FILE_NAME_SIZE - name_len);
    }
}

/// Byte length of the UTF-16LE string stored in a zero-padded field.
///
/// The field is padded with zero units after the string, so the first
/// zero unit is found by binary search over 2-byte units instead of a
/// linear scan. Any odd trailing byte is ignored.
pub fn utf16_effective_len(field: &[u8]) -> usize {
    let mut first = 0;
    let mut count = field.len() / 2;

    while count > 0 {
        let step = count / 2;
        let unit = first + step;
        if field[unit * 2] | field[unit * 2 + 1] != 0 {
            first = unit + 1;
            count -= step + 1;
        } else {
            count = step;
        }
    }

    first * 2
}
