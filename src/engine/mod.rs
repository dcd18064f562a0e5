//! CLIPRDR channel engine.
//!
//! [`ClipboardChannel`] owns the channel state for one RDP session: the
//! negotiated capabilities, the outstanding requests and the reassembly
//! state of multi-chunk responses. Inbound chunks are fed to
//! [`ClipboardChannel::receive`] in arrival order; events are reported to
//! the [`ClipboardHost`] and outbound PDUs go through the
//! [`ChannelTransport`].
//!
//! # Dispatch
//!
//! ```text
//! chunk ──▶ ResponseState::None ──▶ header ──┬─ RESPONSE_FAIL ─▶ host.receive_response_fail
//!      │                                     ├─ Capabilities / Monitor Ready / Format List ...
//!      │                                     ├─ Format Data Response ──▶ data or file records
//!      │                                     └─ File Contents Response ─▶ file chunks
//!      ├──▶ ResponseState::Data ───────────────▶ data or file records (no header)
//!      └──▶ ResponseState::FileContents ───────▶ file chunks (no header)
//! ```
//!
//! The engine is single-threaded and never blocks. A peer that stops in
//! the middle of a response leaves the channel waiting for continuations;
//! timeouts belong to the session layer.

/// Log a PDU line at info when verbose, trace otherwise
macro_rules! log_pdu {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+)
        } else {
            tracing::trace!($($arg)+)
        }
    };
}

mod outbound;
mod pending;
mod reassembly;
mod records;

use std::borrow::Cow;

use tracing::{debug, trace, warn};

pub use pending::PendingFormatRequest;
pub use reassembly::{FileContentsPendingState, ResponseState};

use self::pending::RequestCorrelator;
use self::reassembly::ResponseReassembler;
use self::records::RecordEvent;
use crate::channel::{ChannelFlag, ChannelFlags, ChannelTransport};
use crate::config::EngineConfig;
use crate::host::ClipboardHost;
use crate::pdu::{
    read_u32, CapabilitiesPdu, CliprdrHeader, CustomFormat, FileContentsRequest, FileDescriptor,
    FormatDataRequest, FormatNameEncoding, GeneralCapability, GeneralCapabilityFlags, LockClipData, MessageFlag,
    MessageType, MessageTypeName, CF_UNICODETEXT,
};
use crate::{CliprdrError, CliprdrResult};

/// Clipboard virtual channel engine for one session
#[derive(Debug)]
pub struct ClipboardChannel<H, T> {
    host: H,
    transport: T,
    verbose: bool,
    caps_version: u32,
    /// Flags advertised before the peer's capabilities are known
    local_flags: GeneralCapabilityFlags,
    /// Negotiated flags
    general_flags: GeneralCapabilityFlags,
    caps_received: bool,
    requests: RequestCorrelator,
    reassembly: ResponseReassembler,
    /// Drop continuation chunks of a non-streamed PDU until LAST
    skip_to_last: bool,
}

impl<H: ClipboardHost, T: ChannelTransport> ClipboardChannel<H, T> {
    /// Create a channel engine.
    ///
    /// Long format names are off until the peer's capabilities arrive.
    pub fn new(config: &EngineConfig, host: H, transport: T) -> Self {
        Self {
            host,
            transport,
            verbose: config.verbose,
            caps_version: config.caps_version,
            local_flags: config.general_flags(),
            general_flags: GeneralCapabilityFlags::empty(),
            caps_received: false,
            requests: RequestCorrelator::default(),
            reassembly: ResponseReassembler::default(),
            skip_to_last: false,
        }
    }

    /// Process one inbound channel chunk.
    ///
    /// `total_len` is the length of the whole PDU as announced by the
    /// transport. Errors are protocol violations the session should treat
    /// as fatal, see [`CliprdrError::is_protocol_violation`].
    pub fn receive(&mut self, chunk: &[u8], total_len: u32, flags: ChannelFlags) -> CliprdrResult<()> {
        trace!(
            len = chunk.len(),
            total_len,
            ?flags,
            state = ?self.reassembly.state(),
            "Clipboard channel chunk"
        );

        if flags.contains(ChannelFlag::First) {
            if self.reassembly.state() != ResponseState::None || self.skip_to_last {
                warn!(
                    state = ?self.reassembly.state(),
                    "New clipboard PDU before the previous one ended, abandoning it"
                );
                self.abandon_response();
            }
            return self.process_pdu(chunk, flags);
        }

        match self.reassembly.state() {
            ResponseState::Data => self.process_format_data_response(chunk, flags, 0),
            ResponseState::FileContents => self.process_file_contents_response(chunk, flags, 0),
            ResponseState::None if self.skip_to_last => {
                trace!(len = chunk.len(), "Skipping clipboard PDU continuation");
                if flags.contains(ChannelFlag::Last) {
                    self.skip_to_last = false;
                }
                Ok(())
            }
            ResponseState::None => Err(CliprdrError::UnexpectedContinuation),
        }
    }

    fn process_pdu(&mut self, chunk: &[u8], flags: ChannelFlags) -> CliprdrResult<()> {
        let mut src = chunk;
        let header = CliprdrHeader::decode(&mut src)?;
        let last = flags.contains(ChannelFlag::Last);

        let streamed = matches!(
            header.message_type(),
            Some(MessageType::FormatDataResponse | MessageType::FileContentsResponse)
        );
        if !last && (!streamed || header.is_response_fail()) {
            debug!(
                msg_type = %MessageTypeName(header.msg_type),
                "Clipboard PDU spans several chunks, only the first is parsed"
            );
            self.skip_to_last = true;
        }

        if header.is_response_fail() {
            warn!(msg_type = %MessageTypeName(header.msg_type), "Clipboard response FAIL");
            self.requests.clear();
            self.host.receive_response_fail(header.msg_type);
            return Ok(());
        }

        let Some(msg_type) = header.message_type() else {
            debug!(%header, "Unknown clipboard PDU ignored");
            return Ok(());
        };

        match msg_type {
            MessageType::ClipCaps => self.process_capabilities(src),
            MessageType::MonitorReady => {
                log_pdu!(self.verbose, "Monitor Ready PDU");
                self.send_capabilities();
                self.send_empty_format_list();
                Ok(())
            }
            MessageType::FormatListResponse => {
                log_pdu!(self.verbose, msg_flags = ?header.flags(), "Format List Response PDU");
                Ok(())
            }
            MessageType::FormatList => {
                self.process_format_list(&header, src);
                Ok(())
            }
            MessageType::FormatDataResponse => self.process_format_data_response(src, flags, header.data_len),
            MessageType::FileContentsResponse => self.process_file_contents_response(src, flags, header.data_len),
            MessageType::FormatDataRequest => {
                let request = FormatDataRequest::decode(&mut src)?;
                log_pdu!(self.verbose, format_id = request.format_id, "Format Data Request PDU");
                self.host.format_data_request(request.format_id);
                Ok(())
            }
            MessageType::FileContentsRequest => {
                let request = FileContentsRequest::decode(&mut src)?;
                log_pdu!(self.verbose, ?request, "File Contents Request PDU");
                self.host.file_contents_request(&request);
                Ok(())
            }
            MessageType::LockClipdata => {
                let lock = LockClipData::decode(&mut src, "Lock Clipboard Data PDU")?;
                log_pdu!(self.verbose, clip_data_id = lock.clip_data_id, "Lock Clipboard Data PDU");
                self.host.lock(lock.clip_data_id);
                Ok(())
            }
            MessageType::UnlockClipdata => {
                let lock = LockClipData::decode(&mut src, "Unlock Clipboard Data PDU")?;
                log_pdu!(self.verbose, clip_data_id = lock.clip_data_id, "Unlock Clipboard Data PDU");
                self.host.unlock(lock.clip_data_id);
                Ok(())
            }
            MessageType::TempDirectory => {
                debug!(%header, "Temporary Directory PDU ignored");
                Ok(())
            }
        }
    }

    fn process_capabilities(&mut self, mut src: &[u8]) -> CliprdrResult<()> {
        let remote = CapabilitiesPdu::decode_general_flags(&mut src)?;
        log_pdu!(self.verbose, ?remote, "Clipboard Capabilities PDU");

        self.requests.clear_format_request();
        self.general_flags = self.host.set_general_capability(remote);
        self.caps_received = true;

        debug!(negotiated = ?self.general_flags, "Clipboard capabilities set");
        Ok(())
    }

    fn process_format_list(&mut self, header: &CliprdrHeader, src: &[u8]) {
        let declared = header.data_len as usize;
        if declared > src.len() {
            warn!(
                data_len = header.data_len,
                available = src.len(),
                "Format List PDU shorter than its declared length"
            );
        }
        let payload = &src[..declared.min(src.len())];

        let encoding = FormatNameEncoding::select(
            self.uses_long_format_names(),
            header.flags().contains(MessageFlag::AsciiNames),
        );
        log_pdu!(self.verbose, ?encoding, data_len = header.data_len, "Format List PDU");

        let verbose = self.verbose;
        let host = &mut self.host;
        host.format_list_start();
        let count = encoding.decode_entries(payload, |format_id, name| {
            let custom_format = name.custom_format();
            log_pdu!(verbose, format_id, name = %name.to_string_lossy(), ?custom_format, "Format");
            host.format_list_format(name, format_id, custom_format);
        });
        host.format_list_stop();
        debug!(count, "Format list received");

        self.send_format_list_response();
    }

    fn process_format_data_response(&mut self, data: &[u8], flags: ChannelFlags, data_len: u32) -> CliprdrResult<()> {
        let last = flags.contains(ChannelFlag::Last);

        if flags.contains(ChannelFlag::First) {
            log_pdu!(self.verbose, data_len, "Format Data Response PDU");
            self.reassembly.start_format_data(data_len);
        } else {
            log_pdu!(self.verbose, len = data.len(), "Format Data Response PDU Continuation");
        }
        self.reassembly.advance(ResponseState::Data, last);

        let (data, remaining) = self.reassembly.take_format_data(data);
        let pending = self.requests.format_request().unwrap_or_default();
        if last && remaining != 0 {
            warn!(remaining, "Format Data Response ended before its declared length");
        }

        match pending.custom_format {
            CustomFormat::FileGroupDescriptorW => self.process_file_group_descriptor(data, last),
            CustomFormat::None => {
                let data = if pending.format_id == CF_UNICODETEXT {
                    self.reassembly.take_unicode_text(data, last)
                } else {
                    Cow::Borrowed(data)
                };

                self.host.format_data_response(
                    &data,
                    remaining,
                    pending.format_id,
                    flags & (ChannelFlag::First | ChannelFlag::Last),
                );

                if last {
                    self.requests.clear_format_request();
                }
                Ok(())
            }
        }
    }

    fn process_file_group_descriptor(&mut self, data: &[u8], last: bool) -> CliprdrResult<()> {
        let verbose = self.verbose;
        let host = &mut self.host;

        self.reassembly.records.feed(data, |event| {
            match event {
                RecordEvent::Count(count) => {
                    log_pdu!(verbose, count, "File list");
                    host.format_data_response_file_start(count);
                }
                RecordEvent::Record(record) => {
                    let file = FileDescriptor::decode(record)?;
                    log_pdu!(
                        verbose,
                        name = %file.name_lossy(),
                        size = file.size(),
                        attributes = file.attributes,
                        "File"
                    );
                    host.format_data_response_file(&file);
                }
            }
            Ok(())
        })?;

        if last {
            self.requests.clear_format_request();
            let leftover = self.reassembly.records.finish();
            if leftover != 0 {
                warn!(leftover, "File list ended inside a record, discarding partial record");
            }
            self.host.format_data_response_file_stop();
        }

        Ok(())
    }

    fn process_file_contents_response(
        &mut self,
        mut data: &[u8],
        flags: ChannelFlags,
        data_len: u32,
    ) -> CliprdrResult<()> {
        let last = flags.contains(ChannelFlag::Last);

        if flags.contains(ChannelFlag::First) {
            if data_len < 4 {
                return Err(CliprdrError::truncated("File Contents Response PDU", 4, data_len as usize));
            }
            let stream_id = read_u32(&mut data, "File Contents Response PDU")?;
            let requested = self.requests.match_file_contents_stream(stream_id);
            log_pdu!(self.verbose, stream_id, data_len, requested, "File Contents Response PDU");

            self.reassembly.start_file_contents(stream_id, data_len - 4);
        } else {
            log_pdu!(self.verbose, len = data.len(), "File Contents Response PDU Continuation");
        }
        self.reassembly.advance(ResponseState::FileContents, last);

        let (data, remaining) = self.reassembly.take_file_contents(data);
        let stream_id = self.reassembly.file_contents().stream_id;

        self.host.file_contents_response(
            data,
            stream_id,
            remaining,
            flags & (ChannelFlag::First | ChannelFlag::Last),
        );

        if last {
            self.requests.clear_file_contents_stream();
            if remaining != 0 {
                return Err(CliprdrError::IncompleteResponse { stream_id, remaining });
            }
        }

        Ok(())
    }

    fn abandon_response(&mut self) {
        match self.reassembly.state() {
            ResponseState::Data => self.requests.clear_format_request(),
            ResponseState::FileContents => self.requests.clear_file_contents_stream(),
            ResponseState::None => {}
        }
        self.reassembly.reset();
        self.skip_to_last = false;
    }

    fn uses_long_format_names(&self) -> bool {
        self.general_flags.contains(GeneralCapability::UseLongFormatNames)
    }

    /// What the next inbound chunk is expected to continue
    pub fn response_state(&self) -> ResponseState {
        self.reassembly.state()
    }

    /// Outstanding Format Data Request
    pub fn pending_format_request(&self) -> Option<PendingFormatRequest> {
        self.requests.format_request()
    }

    /// Negotiated general capability flags (empty until negotiated)
    pub fn general_flags(&self) -> GeneralCapabilityFlags {
        self.general_flags
    }

    /// File Contents Response being reassembled, if any
    pub fn file_contents_state(&self) -> Option<FileContentsPendingState> {
        (self.reassembly.state() == ResponseState::FileContents).then(|| self.reassembly.file_contents())
    }

    /// Discard in-flight responses, outstanding requests and negotiated
    /// capabilities, as if the channel had just been created
    pub fn reset(&mut self) {
        self.reassembly.reset();
        self.requests.clear();
        self.general_flags = GeneralCapabilityFlags::empty();
        self.caps_received = false;
        self.skip_to_last = false;
    }

    /// Host receiving the channel events
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Outbound transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Split the channel into its host and transport
    pub fn into_parts(self) -> (H, T) {
        (self.host, self.transport)
    }
}
