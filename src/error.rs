//! Error types for the CLIPRDR engine.

use thiserror::Error;

/// Result type for CLIPRDR operations
pub type CliprdrResult<T> = std::result::Result<T, CliprdrError>;

/// Errors raised while decoding or sequencing clipboard channel traffic
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CliprdrError {
    /// A header or fixed-size field is shorter than required
    #[error("{context}: truncated data (need {needed} bytes, {remaining} remaining)")]
    Truncated {
        /// Structure being decoded
        context: &'static str,
        /// Bytes required
        needed: usize,
        /// Bytes available
        remaining: usize,
    },

    /// A continuation chunk arrived while no response was being reassembled
    #[error("continuation chunk received with no response in flight")]
    UnexpectedContinuation,

    /// A File Contents Response ended before delivering its declared length
    #[error("file contents response for stream {stream_id} ended with {remaining} bytes missing")]
    IncompleteResponse {
        /// Stream the response belongs to
        stream_id: u32,
        /// Bytes still expected when the LAST chunk arrived
        remaining: u32,
    },

    /// A capability set declares a length smaller than its own header
    #[error("invalid capability set type 0x{set_type:04x}: length {length}")]
    InvalidCapabilitySet {
        /// Declared capability set type
        set_type: u16,
        /// Declared lengthCapability
        length: u16,
    },

    /// Caller-supplied output buffer is too small
    #[error("output buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes required
        needed: usize,
        /// Bytes available
        available: usize,
    },
}

impl CliprdrError {
    /// Shorthand for [`CliprdrError::Truncated`]
    pub(crate) fn truncated(context: &'static str, needed: usize, remaining: usize) -> Self {
        Self::Truncated {
            context,
            needed,
            remaining,
        }
    }

    /// Returns true if the owning session should treat this error as a
    /// protocol violation (message boundaries can no longer be trusted)
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. }
                | Self::UnexpectedContinuation
                | Self::IncompleteResponse { .. }
                | Self::InvalidCapabilitySet { .. }
        )
    }

    /// Returns true if the error is local to the call and the channel can
    /// keep running
    pub fn is_recoverable(&self) -> bool {
        !self.is_protocol_violation()
    }
}
