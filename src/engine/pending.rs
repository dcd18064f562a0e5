//! Request/response correlation.
//!
//! At most one Format Data Request and one File Contents Request are
//! tracked. A new request replaces the outstanding one.

use tracing::{debug, warn};

use crate::pdu::CustomFormat;

/// The Format Data Request awaiting its response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingFormatRequest {
    /// Requested format id
    pub format_id: u32,
    /// How the response payload is reassembled
    pub custom_format: CustomFormat,
}

#[derive(Debug, Default)]
pub(crate) struct RequestCorrelator {
    format: Option<PendingFormatRequest>,
    file_contents_stream: Option<u32>,
}

impl RequestCorrelator {
    pub(crate) fn format_request(&self) -> Option<PendingFormatRequest> {
        self.format
    }

    pub(crate) fn set_format_request(&mut self, request: PendingFormatRequest) {
        if let Some(previous) = self.format.replace(request) {
            debug!(?previous, ?request, "Format data request replaces outstanding request");
        }
    }

    pub(crate) fn clear_format_request(&mut self) {
        self.format = None;
    }

    pub(crate) fn set_file_contents_stream(&mut self, stream_id: u32) {
        if let Some(previous) = self.file_contents_stream.replace(stream_id) {
            debug!(previous, stream_id, "File contents request replaces outstanding request");
        }
    }

    /// Check the stream id of a starting File Contents Response
    pub(crate) fn match_file_contents_stream(&self, stream_id: u32) -> bool {
        match self.file_contents_stream {
            Some(expected) if expected != stream_id => {
                warn!(expected, stream_id, "File contents response for unexpected stream");
                false
            }
            _ => true,
        }
    }

    pub(crate) fn clear_file_contents_stream(&mut self) {
        self.file_contents_stream = None;
    }

    /// Forget every outstanding request
    pub(crate) fn clear(&mut self) {
        self.format = None;
        self.file_contents_stream = None;
    }
}
