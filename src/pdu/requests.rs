//! Request PDUs: Format Data Request, File Contents Request and
//! Lock/Unlock Clipboard Data.
//!
//! # File Contents Request (24 or 28 bytes)
//! ```text
//! Offset | Size | Field
//! -------|------|--------------
//! 0      | 4    | streamId
//! 4      | 4    | lindex
//! 8      | 4    | dwFlags
//! 12     | 4    | nPositionLow
//! 16     | 4    | nPositionHigh
//! 20     | 4    | cbRequested
//! 24     | 4    | clipDataId (optional)
//! ```

use bytes::{Buf, BufMut};

use super::{ensure_remaining, read_u32};
use crate::CliprdrResult;

/// dwFlags: request the size of the file
pub const FILECONTENTS_SIZE: u32 = 0x0000_0001;

/// dwFlags: request a range of the file data
pub const FILECONTENTS_RANGE: u32 = 0x0000_0002;

/// cbRequested value mandated for size requests
pub const FILECONTENTS_SIZE_CB_REQUESTED: u32 = 0x0000_0008;

/// Format Data Request PDU payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDataRequest {
    /// Requested format id
    pub format_id: u32,
}

impl FormatDataRequest {
    /// Encoded payload size
    pub const SIZE: usize = 4;

    /// Write the payload
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u32_le(self.format_id);
    }

    /// Read the payload
    pub fn decode(src: &mut impl Buf) -> CliprdrResult<Self> {
        Ok(Self {
            format_id: read_u32(src, "FormatDataRequestPDU")?,
        })
    }
}

/// File Contents Request PDU payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileContentsRequest {
    /// Stream correlating the request with its response
    pub stream_id: u32,
    /// Index of the file in the file list
    pub lindex: u32,
    /// `FILECONTENTS_SIZE` or `FILECONTENTS_RANGE`
    pub flags: u32,
    /// Low 32 bits of the read offset
    pub position_low: u32,
    /// High 32 bits of the read offset
    pub position_high: u32,
    /// Maximum number of bytes to return
    pub requested_size: u32,
    /// Lock id, present only if locking is in use
    pub clip_data_id: Option<u32>,
}

impl FileContentsRequest {
    /// Size without the optional clipDataId
    pub const FIXED_PART_SIZE: usize = 24;

    /// True for size queries
    pub fn is_size_request(&self) -> bool {
        self.flags & FILECONTENTS_SIZE != 0
    }

    /// 64-bit read offset
    pub fn position(&self) -> u64 {
        (u64::from(self.position_high) << 32) | u64::from(self.position_low)
    }

    /// Encoded payload size
    pub fn size(&self) -> usize {
        Self::FIXED_PART_SIZE + if self.clip_data_id.is_some() { 4 } else { 0 }
    }

    /// Write the payload
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u32_le(self.stream_id);
        dst.put_u32_le(self.lindex);
        dst.put_u32_le(self.flags);
        dst.put_u32_le(self.position_low);
        dst.put_u32_le(self.position_high);
        dst.put_u32_le(self.requested_size);
        if let Some(clip_data_id) = self.clip_data_id {
            dst.put_u32_le(clip_data_id);
        }
    }

    /// Read the payload; clipDataId is taken if 4 more bytes are present
    pub fn decode(src: &mut impl Buf) -> CliprdrResult<Self> {
        ensure_remaining(src, Self::FIXED_PART_SIZE, "FileContentsRequestPDU")?;

        let mut request = Self {
            stream_id: src.get_u32_le(),
            lindex: src.get_u32_le(),
            flags: src.get_u32_le(),
            position_low: src.get_u32_le(),
            position_high: src.get_u32_le(),
            requested_size: src.get_u32_le(),
            clip_data_id: None,
        };

        if src.remaining() >= 4 {
            request.clip_data_id = Some(src.get_u32_le());
        }

        Ok(request)
    }
}

/// Lock/Unlock Clipboard Data PDU payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockClipData {
    /// Lock id
    pub clip_data_id: u32,
}

impl LockClipData {
    /// Encoded payload size
    pub const SIZE: usize = 4;

    /// Write the payload
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u32_le(self.clip_data_id);
    }

    /// Read the payload
    pub fn decode(src: &mut impl Buf, context: &'static str) -> CliprdrResult<Self> {
        Ok(Self {
            clip_data_id: read_u32(src, context)?,
        })
    }
}
