//! Clipboard Capabilities PDU (CLIPRDR_CAPS) and General Capability Set.
//!
//! # Format
//! ```text
//! CLIPRDR_CAPS (after the header)
//! Offset | Size | Field
//! -------|------|------------------
//! 0      | 2    | cCapabilitiesSets
//! 2      | 2    | pad1
//! 4      | var  | capabilitySets
//!
//! CLIPRDR_GENERAL_CAPABILITY (12 bytes)
//! 0      | 2    | capabilitySetType (CB_CAPSTYPE_GENERAL)
//! 2      | 2    | lengthCapability
//! 4      | 4    | version
//! 8      | 4    | generalFlags
//! ```

use bytes::{Buf, BufMut};
use enumflags2::{bitflags, BitFlags};
use tracing::{debug, trace};

use super::ensure_remaining;
use crate::{CliprdrError, CliprdrResult};

/// Capability set type of the General Capability Set
pub const CB_CAPSTYPE_GENERAL: u16 = 0x0001;

/// Clipboard protocol version 1
pub const CB_CAPS_VERSION_1: u32 = 0x0000_0001;

/// Clipboard protocol version 2
pub const CB_CAPS_VERSION_2: u32 = 0x0000_0002;

/// General capability flags (generalFlags)
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneralCapability {
    /// Long Format Name variant of the Format List PDU is supported
    UseLongFormatNames = 0x0000_0002,
    /// Stream-based file copy and paste is supported
    StreamFileclipEnabled = 0x0000_0004,
    /// File descriptions must not include source paths
    FileclipNoFilePaths = 0x0000_0008,
    /// Lock/Unlock Clipboard Data PDUs are supported
    CanLockClipdata = 0x0000_0010,
    /// Files larger than 4 GiB can be transferred
    HugeFileSupportEnabled = 0x0000_0020,
}

/// Set of [`GeneralCapability`]
pub type GeneralCapabilityFlags = BitFlags<GeneralCapability>;

/// Capabilities PDU carrying a single General Capability Set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilitiesPdu {
    /// Informational protocol version
    pub version: u32,
    /// Advertised general flags
    pub general_flags: GeneralCapabilityFlags,
}

impl CapabilitiesPdu {
    /// cCapabilitiesSets(2) + pad1(2)
    const FIXED_PART_SIZE: usize = 4;

    /// capabilitySetType(2) + lengthCapability(2)
    const SET_HEADER_SIZE: usize = 4;

    /// Size of the General Capability Set
    pub const GENERAL_SET_SIZE: usize = 12;

    /// Encoded payload size (without the clipboard header)
    pub const SIZE: usize = Self::FIXED_PART_SIZE + Self::GENERAL_SET_SIZE;

    /// Create a capabilities PDU advertising `general_flags`
    pub fn new(version: u32, general_flags: GeneralCapabilityFlags) -> Self {
        Self { version, general_flags }
    }

    /// Write the payload (one General Capability Set)
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u16_le(1);
        dst.put_u16_le(0);

        dst.put_u16_le(CB_CAPSTYPE_GENERAL);
        dst.put_u16_le(Self::GENERAL_SET_SIZE as u16);
        dst.put_u32_le(self.version);
        dst.put_u32_le(self.general_flags.bits());
    }

    /// Extract the general flags from a Capabilities PDU payload.
    ///
    /// Flags of every General Capability Set are combined; sets of other
    /// types are skipped using their declared length. With no general set
    /// the default (empty) flags are returned.
    pub fn decode_general_flags(src: &mut impl Buf) -> CliprdrResult<GeneralCapabilityFlags> {
        ensure_remaining(src, Self::FIXED_PART_SIZE, "ClipboardCapabilitiesPDU")?;

        let set_count = src.get_u16_le();
        src.advance(2); // pad1

        let mut general_flags = GeneralCapabilityFlags::empty();

        for _ in 0..set_count {
            ensure_remaining(src, Self::SET_HEADER_SIZE, "CapabilitySet")?;

            let set_type = src.get_u16_le();
            let length = src.get_u16_le();

            let body_len = (length as usize)
                .checked_sub(Self::SET_HEADER_SIZE)
                .ok_or(CliprdrError::InvalidCapabilitySet { set_type, length })?;
            ensure_remaining(src, body_len, "CapabilitySet")?;

            if set_type == CB_CAPSTYPE_GENERAL {
                if body_len < 8 {
                    return Err(CliprdrError::InvalidCapabilitySet { set_type, length });
                }

                let version = src.get_u32_le();
                let raw_flags = src.get_u32_le();
                src.advance(body_len - 8);

                let flags = GeneralCapabilityFlags::from_bits_truncate(raw_flags);
                debug!(version, length, raw_flags, ?flags, "GeneralCapabilitySet");

                general_flags |= flags;
            } else {
                trace!(set_type, length, "Skipping unknown capability set");
                src.advance(body_len);
            }
        }

        Ok(general_flags)
    }
}
