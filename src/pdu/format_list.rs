//! Format List PDU entries (CLIPRDR_SHORT_FORMAT_NAME / CLIPRDR_LONG_FORMAT_NAME).
//!
//! Four wire variants exist, selected by the negotiated
//! `CB_USE_LONG_FORMAT_NAMES` capability and the `CB_ASCII_NAMES` message flag:
//!
//! ```text
//! Short (36 bytes per entry)         Long (variable)
//! Offset | Size | Field              Offset | Size | Field
//! -------|------|----------          -------|------|-------------------------
//! 0      | 4    | formatId           0      | 4    | formatId
//! 4      | 32   | formatName         4      | var  | formatName + terminator
//!                 (NUL padded)
//! ```
//!
//! ASCII names use single-byte characters and a 1-byte terminator, Unicode
//! names UTF-16LE with a 2-byte terminator.

use std::borrow::Cow;

use bytes::{Buf, BufMut};
use tracing::warn;

// =============================================================================
// Windows Clipboard Format IDs
// =============================================================================

/// Standard Windows clipboard format: ANSI text
pub const CF_TEXT: u32 = 1;

/// Standard Windows clipboard format: OEM text
pub const CF_OEMTEXT: u32 = 7;

/// Standard Windows clipboard format: Device-independent bitmap
pub const CF_DIB: u32 = 8;

/// Standard Windows clipboard format: Unicode text (UTF-16LE, NUL terminated)
pub const CF_UNICODETEXT: u32 = 13;

/// Standard Windows clipboard format: File drop list
pub const CF_HDROP: u32 = 15;

/// Standard Windows clipboard format: DIBV5
pub const CF_DIBV5: u32 = 17;

/// Registered name of the file list custom format
pub const FILE_GROUP_DESCRIPTOR_W: &str = "FileGroupDescriptorW";

/// Name of a predefined clipboard format id
pub fn format_id_name(format_id: u32) -> &'static str {
    match format_id {
        1 => "CF_TEXT",
        2 => "CF_BITMAP",
        3 => "CF_METAFILEPICT",
        4 => "CF_SYLK",
        5 => "CF_DIF",
        6 => "CF_TIFF",
        7 => "CF_OEMTEXT",
        8 => "CF_DIB",
        9 => "CF_PALETTE",
        10 => "CF_PENDATA",
        11 => "CF_RIFF",
        12 => "CF_WAVE",
        13 => "CF_UNICODETEXT",
        14 => "CF_ENHMETAFILE",
        15 => "CF_HDROP",
        16 => "CF_LOCALE",
        17 => "CF_DIBV5",
        128 => "CF_OWNERDISPLAY",
        129 => "CF_DSPTEXT",
        130 => "CF_DSPBITMAP",
        131 => "CF_DSPMETAFILEPICT",
        142 => "CF_DSPENHMETAFILE",
        512 => "CF_PRIVATEFIRST",
        767 => "CF_PRIVATELAST",
        768 => "CF_GDIOBJFIRST",
        1023 => "CF_GDIOBJLAST",
        _ => "<unknown>",
    }
}

// =============================================================================
// Custom format detection
// =============================================================================

/// Custom formats the engine reassembles specially
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CustomFormat {
    /// Plain format, data forwarded as-is
    #[default]
    None = 0,
    /// FileGroupDescriptorW: a count followed by fixed-size file records
    FileGroupDescriptorW = 1,
}

/// Character set of outbound format names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// Single-byte names, `CB_ASCII_NAMES` set on the PDU
    Ascii,
    /// UTF-16LE names
    Utf16,
}

/// A format name as found on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatName<'a> {
    /// ASCII bytes, terminator and padding removed
    Ascii(&'a [u8]),
    /// UTF-16LE bytes, terminator and padding removed
    Unicode(&'a [u8]),
}

impl<'a> FormatName<'a> {
    /// Raw name bytes in their wire encoding
    pub fn bytes(&self) -> &'a [u8] {
        match *self {
            Self::Ascii(bytes) | Self::Unicode(bytes) => bytes,
        }
    }

    /// True for single-byte names
    pub fn is_ascii(&self) -> bool {
        matches!(self, Self::Ascii(_))
    }

    /// Decode the name, replacing invalid sequences
    pub fn to_string_lossy(&self) -> Cow<'a, str> {
        match *self {
            Self::Ascii(bytes) => String::from_utf8_lossy(bytes),
            Self::Unicode(bytes) => Cow::Owned(String::from_utf16_lossy(&utf16_units(bytes).collect::<Vec<_>>())),
        }
    }

    /// Exact, case-sensitive comparison against `name` in this name's encoding
    pub fn same_as(&self, name: &str) -> bool {
        match *self {
            Self::Ascii(bytes) => bytes == name.as_bytes(),
            Self::Unicode(bytes) => bytes.len() % 2 == 0 && utf16_units(bytes).eq(name.encode_utf16()),
        }
    }

    /// Custom format this name designates
    pub fn custom_format(&self) -> CustomFormat {
        if self.same_as(FILE_GROUP_DESCRIPTOR_W) {
            CustomFormat::FileGroupDescriptorW
        } else {
            CustomFormat::None
        }
    }
}

fn utf16_units(bytes: &[u8]) -> impl Iterator<Item = u16> + '_ {
    bytes.chunks_exact(2).map(|unit| u16::from_le_bytes([unit[0], unit[1]]))
}

// =============================================================================
// Entry codec
// =============================================================================

/// Wire variant of format list entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatNameEncoding {
    /// 32-byte ASCII name slot
    ShortAscii,
    /// 32-byte UTF-16LE name slot
    ShortUnicode,
    /// NUL-terminated ASCII name
    LongAscii,
    /// NUL-terminated UTF-16LE name
    LongUnicode,
}

impl FormatNameEncoding {
    /// Size of the fixed name slot of short entries
    pub const SHORT_NAME_SIZE: usize = 32;

    /// Size of a short entry (formatId + name slot)
    pub const SHORT_ENTRY_SIZE: usize = 4 + Self::SHORT_NAME_SIZE;

    /// Select the variant from the long-name capability and the ascii flag
    pub fn select(is_long_format: bool, is_ascii: bool) -> Self {
        match (is_long_format, is_ascii) {
            (false, true) => Self::ShortAscii,
            (false, false) => Self::ShortUnicode,
            (true, true) => Self::LongAscii,
            (true, false) => Self::LongUnicode,
        }
    }

    /// True if names are single-byte
    pub fn is_ascii(self) -> bool {
        matches!(self, Self::ShortAscii | Self::LongAscii)
    }

    /// True for the variable-length variants
    pub fn is_long(self) -> bool {
        matches!(self, Self::LongAscii | Self::LongUnicode)
    }

    /// Encoded size of one entry named `name`
    pub fn entry_len(self, name: &str) -> usize {
        match self {
            Self::ShortAscii | Self::ShortUnicode => Self::SHORT_ENTRY_SIZE,
            Self::LongAscii => 4 + name.chars().count() + 1,
            Self::LongUnicode => 4 + (name.encode_utf16().count() + 1) * 2,
        }
    }

    /// Write one entry.
    ///
    /// Characters outside ASCII are written as `?` in the ASCII variants.
    /// Short names are truncated so the slot always keeps a terminator.
    pub fn encode_entry(self, dst: &mut impl BufMut, format_id: u32, name: &str) {
        dst.put_u32_le(format_id);

        match self {
            Self::ShortAscii => {
                let mut written = 0;
                for byte in ascii_bytes(name).take(Self::SHORT_NAME_SIZE - 1) {
                    dst.put_u8(byte);
                    written += 1;
                }
                dst.put_bytes(0, Self::SHORT_NAME_SIZE - written);
            }
            Self::ShortUnicode => {
                let mut written = 0;
                for unit in name.encode_utf16().take(Self::SHORT_NAME_SIZE / 2 - 1) {
                    dst.put_u16_le(unit);
                    written += 2;
                }
                dst.put_bytes(0, Self::SHORT_NAME_SIZE - written);
            }
            Self::LongAscii => {
                for byte in ascii_bytes(name) {
                    dst.put_u8(byte);
                }
                dst.put_u8(0);
            }
            Self::LongUnicode => {
                for unit in name.encode_utf16() {
                    dst.put_u16_le(unit);
                }
                dst.put_u16_le(0);
            }
        }
    }

    /// Walk the entries of a format list payload, calling `on_format` for each.
    ///
    /// Trailing bytes too short to hold an entry are logged and ignored. A
    /// long name missing its terminator extends to the end of the payload.
    /// Returns the number of entries found.
    pub fn decode_entries<'a>(self, payload: &'a [u8], mut on_format: impl FnMut(u32, FormatName<'a>)) -> usize {
        let mut src = payload;
        let mut count = 0;

        match self {
            Self::ShortAscii | Self::ShortUnicode => {
                while src.len() >= Self::SHORT_ENTRY_SIZE {
                    let format_id = src.get_u32_le();
                    let (slot, rest) = src.split_at(Self::SHORT_NAME_SIZE);
                    src = rest;

                    let name = if self.is_ascii() {
                        FormatName::Ascii(&slot[..ascii_len(slot)])
                    } else {
                        FormatName::Unicode(&slot[..utf16_len(slot)])
                    };
                    on_format(format_id, name);
                    count += 1;
                }
            }
            Self::LongAscii | Self::LongUnicode => {
                let unit = if self.is_ascii() { 1 } else { 2 };

                while src.len() >= 4 + unit {
                    let format_id = src.get_u32_le();

                    let name_len = if self.is_ascii() { ascii_len(src) } else { utf16_len(src) };
                    let (name, rest) = src.split_at(name_len);
                    src = &rest[rest.len().min(unit)..];

                    let name = if self.is_ascii() {
                        FormatName::Ascii(name)
                    } else {
                        FormatName::Unicode(name)
                    };
                    on_format(format_id, name);
                    count += 1;
                }
            }
        }

        if !src.is_empty() {
            warn!(
                encoding = ?self,
                trailing = src.len(),
                "Format list has trailing bytes that do not form an entry"
            );
        }

        count
    }
}

fn ascii_bytes(name: &str) -> impl Iterator<Item = u8> + '_ {
    name.chars().map(|c| if c.is_ascii() { c as u8 } else { b'?' })
}

/// Length of a NUL-terminated byte string (whole slice if unterminated)
fn ascii_len(bytes: &[u8]) -> usize {
    bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len())
}

/// Byte length of a NUL-terminated UTF-16LE string (whole even prefix if unterminated)
fn utf16_len(bytes: &[u8]) -> usize {
    bytes
        .chunks_exact(2)
        .position(|unit| unit == [0, 0])
        .map_or(bytes.len() & !1, |units| units * 2)
}
