//! Chunk reassembly state for multi-chunk responses.
//!
//! Format Data and File Contents responses may span many channel chunks.
//! Only the first chunk carries the clipboard header; the following chunks
//! are raw payload continuations. The state kept here lets the dispatcher
//! route a continuation without a header.
//!
//! ```text
//!            FIRST (not LAST)              continuation
//!   None  ───────────────────▶ Data ◀──────────────────┐
//!    ▲                          │  └───────────────────┘
//!    └──────────── LAST ────────┘
//! ```
//!
//! File Contents responses follow the same transitions through
//! [`ResponseState::FileContents`].

use std::borrow::Cow;

use tracing::warn;

use super::records::FixedRecordReassembler;
use crate::pdu::FILE_DESCRIPTOR_SIZE;

/// What the next inbound chunk continues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseState {
    /// A fresh PDU with its header is expected
    #[default]
    None,
    /// Continuation of a Format Data Response
    Data,
    /// Continuation of a File Contents Response
    FileContents,
}

/// File Contents Response being received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileContentsPendingState {
    /// Stream id read from the first chunk
    pub stream_id: u32,
    /// Payload bytes still expected
    pub remaining: u32,
}

#[derive(Debug)]
pub(crate) struct ResponseReassembler {
    state: ResponseState,
    /// Remaining Format Data Response bytes
    remaining: u32,
    file_contents: FileContentsPendingState,
    /// Zero bytes at the end of a non-LAST CF_UNICODETEXT chunk that may
    /// belong to the terminator
    held_zeros: usize,
    pub(crate) records: FixedRecordReassembler,
}

impl Default for ResponseReassembler {
    fn default() -> Self {
        Self {
            state: ResponseState::None,
            remaining: 0,
            file_contents: FileContentsPendingState::default(),
            held_zeros: 0,
            records: FixedRecordReassembler::new(FILE_DESCRIPTOR_SIZE),
        }
    }
}

impl ResponseReassembler {
    pub(crate) fn state(&self) -> ResponseState {
        self.state
    }

    pub(crate) fn file_contents(&self) -> FileContentsPendingState {
        self.file_contents
    }

    /// Set the state expected for the chunk after the current one
    pub(crate) fn advance(&mut self, continuing: ResponseState, last: bool) {
        self.state = if last { ResponseState::None } else { continuing };
    }

    /// First chunk of a Format Data Response declaring `data_len` bytes
    pub(crate) fn start_format_data(&mut self, data_len: u32) {
        self.remaining = data_len;
        self.held_zeros = 0;
        self.records.start();
    }

    /// First chunk of a File Contents Response
    pub(crate) fn start_file_contents(&mut self, stream_id: u32, remaining: u32) {
        self.file_contents = FileContentsPendingState { stream_id, remaining };
    }

    /// Limit a Format Data Response chunk to the declared length
    pub(crate) fn take_format_data<'a>(&mut self, data: &'a [u8]) -> (&'a [u8], u32) {
        let data = clamp(data, &mut self.remaining, "Format Data Response");
        (data, self.remaining)
    }

    /// Drop the UTF-16 terminator of a CF_UNICODETEXT response.
    ///
    /// `data` is a chunk already limited by [`take_format_data`](Self::take_format_data).
    /// Zero bytes falling in the last two declared bytes of a non-LAST chunk
    /// are held back and prepended to the next chunk, so the terminator is
    /// stripped wherever the chunk boundary falls.
    pub(crate) fn take_unicode_text<'a>(&mut self, data: &'a [u8], last: bool) -> Cow<'a, [u8]> {
        let data = match std::mem::take(&mut self.held_zeros) {
            0 => Cow::Borrowed(data),
            held => {
                let mut joined = vec![0u8; held];
                joined.extend_from_slice(data);
                Cow::Owned(joined)
            }
        };

        let cut = if last {
            if data.ends_with(&UTF16_TERMINATOR) {
                UTF16_TERMINATOR.len()
            } else {
                0
            }
        } else {
            let tail = UTF16_TERMINATOR
                .len()
                .saturating_sub(self.remaining as usize)
                .min(data.len());
            if data[data.len() - tail..].iter().all(|&b| b == 0) {
                self.held_zeros = tail;
                tail
            } else {
                0
            }
        };

        match data {
            Cow::Borrowed(slice) => Cow::Borrowed(&slice[..slice.len() - cut]),
            Cow::Owned(mut vec) => {
                vec.truncate(vec.len() - cut);
                Cow::Owned(vec)
            }
        }
    }

    /// Limit a File Contents Response chunk to the declared length
    pub(crate) fn take_file_contents<'a>(&mut self, data: &'a [u8]) -> (&'a [u8], u32) {
        let data = clamp(data, &mut self.file_contents.remaining, "File Contents Response");
        (data, self.file_contents.remaining)
    }

    /// Drop any response in flight
    pub(crate) fn reset(&mut self) {
        self.state = ResponseState::None;
        self.remaining = 0;
        self.file_contents = FileContentsPendingState::default();
        self.held_zeros = 0;
        self.records.finish();
    }
}

const UTF16_TERMINATOR: [u8; 2] = [0, 0];

/// Cut `data` to `remaining` bytes and consume them from `remaining`
fn clamp<'a>(data: &'a [u8], remaining: &mut u32, context: &'static str) -> &'a [u8] {
    let limit = *remaining as usize;
    let data = if data.len() > limit {
        warn!(
            received = data.len(),
            remaining = limit,
            "{context}: chunk exceeds declared length, truncating"
        );
        &data[..limit]
    } else {
        data
    };

    *remaining -= data.len() as u32;
    data
}
