//! CLIPRDR wire structures (MS-RDPECLIP).
//!
//! All integers are little-endian. Decoders read from any [`bytes::Buf`]
//! (usually a `&[u8]` positioned inside a channel chunk) and check the
//! remaining length before every fixed-size read, so a short buffer yields
//! [`CliprdrError::Truncated`](crate::CliprdrError::Truncated) instead of a
//! panic.

use bytes::Buf;

use crate::{CliprdrError, CliprdrResult};

pub mod capabilities;
pub mod file_descriptor;
pub mod format_list;
pub mod header;
pub mod requests;

pub use capabilities::{
    CapabilitiesPdu, GeneralCapability, GeneralCapabilityFlags, CB_CAPSTYPE_GENERAL, CB_CAPS_VERSION_1,
    CB_CAPS_VERSION_2,
};
pub use file_descriptor::{utf16_effective_len, FileDescriptor, FILE_DESCRIPTOR_SIZE};
pub use format_list::{
    format_id_name, Charset, CustomFormat, FormatName, FormatNameEncoding, CF_DIB, CF_DIBV5, CF_HDROP, CF_OEMTEXT,
    CF_TEXT, CF_UNICODETEXT, FILE_GROUP_DESCRIPTOR_W,
};
pub use header::{CliprdrHeader, MessageFlag, MessageFlags, MessageType, MessageTypeName};
pub use requests::{
    FileContentsRequest, FormatDataRequest, LockClipData, FILECONTENTS_RANGE, FILECONTENTS_SIZE,
    FILECONTENTS_SIZE_CB_REQUESTED,
};

/// Fail with a truncation error unless `needed` bytes remain in `src`
pub(crate) fn ensure_remaining(src: &mut impl Buf, needed: usize, context: &'static str) -> CliprdrResult<()> {
    if src.remaining() < needed {
        return Err(CliprdrError::truncated(context, needed, src.remaining()));
    }
    Ok(())
}

/// Read a little-endian u32, failing with a truncation error
pub(crate) fn read_u32(src: &mut impl Buf, context: &'static str) -> CliprdrResult<u32> {
    ensure_remaining(src, 4, context)?;
    Ok(src.get_u32_le())
}
