//! Clipboard PDU header (CLIPRDR_HEADER).
//!
//! # Format (8 bytes)
//! ```text
//! Offset | Size | Field
//! -------|------|---------
//! 0      | 2    | msgType
//! 2      | 2    | msgFlags
//! 4      | 4    | dataLen
//! ```
//!
//! `dataLen` is the length of the logical payload following the header,
//! independent of how many channel chunks carry it. It is not range-checked
//! here.

use std::fmt;

use bytes::{Buf, BufMut};
use enumflags2::{bitflags, BitFlags};

use super::ensure_remaining;
use crate::CliprdrResult;

/// Clipboard PDU types (msgType)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageType {
    /// Monitor Ready PDU
    MonitorReady = 0x0001,
    /// Format List PDU
    FormatList = 0x0002,
    /// Format List Response PDU
    FormatListResponse = 0x0003,
    /// Format Data Request PDU
    FormatDataRequest = 0x0004,
    /// Format Data Response PDU
    FormatDataResponse = 0x0005,
    /// Temporary Directory PDU
    TempDirectory = 0x0006,
    /// Clipboard Capabilities PDU
    ClipCaps = 0x0007,
    /// File Contents Request PDU
    FileContentsRequest = 0x0008,
    /// File Contents Response PDU
    FileContentsResponse = 0x0009,
    /// Lock Clipboard Data PDU
    LockClipdata = 0x000A,
    /// Unlock Clipboard Data PDU
    UnlockClipdata = 0x000B,
}

impl MessageType {
    /// Map a raw msgType value, `None` for types this engine does not know
    pub fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            0x0001 => Self::MonitorReady,
            0x0002 => Self::FormatList,
            0x0003 => Self::FormatListResponse,
            0x0004 => Self::FormatDataRequest,
            0x0005 => Self::FormatDataResponse,
            0x0006 => Self::TempDirectory,
            0x0007 => Self::ClipCaps,
            0x0008 => Self::FileContentsRequest,
            0x0009 => Self::FileContentsResponse,
            0x000A => Self::LockClipdata,
            0x000B => Self::UnlockClipdata,
            _ => return None,
        })
    }

    /// MS-RDPECLIP name of the message type
    pub fn name(self) -> &'static str {
        match self {
            Self::MonitorReady => "CB_MONITOR_READY",
            Self::FormatList => "CB_FORMAT_LIST",
            Self::FormatListResponse => "CB_FORMAT_LIST_RESPONSE",
            Self::FormatDataRequest => "CB_FORMAT_DATA_REQUEST",
            Self::FormatDataResponse => "CB_FORMAT_DATA_RESPONSE",
            Self::TempDirectory => "CB_TEMP_DIRECTORY",
            Self::ClipCaps => "CB_CLIP_CAPS",
            Self::FileContentsRequest => "CB_FILECONTENTS_REQUEST",
            Self::FileContentsResponse => "CB_FILECONTENTS_RESPONSE",
            Self::LockClipdata => "CB_LOCK_CLIPDATA",
            Self::UnlockClipdata => "CB_UNLOCK_CLIPDATA",
        }
    }
}

impl From<MessageType> for u16 {
    fn from(value: MessageType) -> Self {
        value as u16
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Display helper for raw msgType values that may be unknown
#[derive(Debug, Clone, Copy)]
pub struct MessageTypeName(pub u16);

impl fmt::Display for MessageTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match MessageType::from_u16(self.0) {
            Some(msg_type) => write!(f, "{}(0x{:x})", msg_type, self.0),
            None => write!(f, "<unknown>(0x{:x})", self.0),
        }
    }
}

/// Clipboard PDU flags (msgFlags)
#[bitflags]
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFlag {
    /// Associated request was processed successfully
    ResponseOk = 0x0001,
    /// Associated request failed
    ResponseFail = 0x0002,
    /// Short format names are ASCII 8
    AsciiNames = 0x0004,
}

/// Set of [`MessageFlag`]
pub type MessageFlags = BitFlags<MessageFlag>;

/// Clipboard PDU header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CliprdrHeader {
    /// Raw msgType
    pub msg_type: u16,
    /// Raw msgFlags
    pub msg_flags: u16,
    /// Logical payload length
    pub data_len: u32,
}

impl CliprdrHeader {
    /// Encoded size of the header
    pub const SIZE: usize = 8;

    /// Create a header from raw field values
    pub fn new(msg_type: impl Into<u16>, msg_flags: MessageFlags, data_len: u32) -> Self {
        Self {
            msg_type: msg_type.into(),
            msg_flags: msg_flags.bits(),
            data_len,
        }
    }

    /// Known message type, if any
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_u16(self.msg_type)
    }

    /// Known message flags (unknown bits dropped)
    pub fn flags(&self) -> MessageFlags {
        MessageFlags::from_bits_truncate(self.msg_flags)
    }

    /// True if the peer reported a failed request
    pub fn is_response_fail(&self) -> bool {
        self.flags().contains(MessageFlag::ResponseFail)
    }

    /// Write the 8-byte header
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u16_le(self.msg_type);
        dst.put_u16_le(self.msg_flags);
        dst.put_u32_le(self.data_len);
    }

    /// Encode into a fresh 8-byte array
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        let mut cursor = &mut out[..];
        self.encode(&mut cursor);
        out
    }

    /// Read a header, failing if fewer than 8 bytes remain
    pub fn decode(src: &mut impl Buf) -> CliprdrResult<Self> {
        ensure_remaining(src, Self::SIZE, "CliprdrHeader")?;

        Ok(Self {
            msg_type: src.get_u16_le(),
            msg_flags: src.get_u16_le(),
            data_len: src.get_u32_le(),
        })
    }
}

impl fmt::Display for CliprdrHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CliprdrHeader{{msgType={} msgFlags={:?} dataLen={}}}",
            MessageTypeName(self.msg_type),
            self.flags(),
            self.data_len
        )
    }
}
