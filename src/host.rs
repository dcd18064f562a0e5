//! Host callback interface.
//!
//! Whatever embeds the engine (a recorder, a UI bridge, a scripting
//! runtime) implements [`ClipboardHost`]. The engine calls into it while
//! processing [`ClipboardChannel::receive`](crate::ClipboardChannel::receive);
//! callbacks only observe data and never re-enter the channel. A host
//! that needs to answer (e.g. a Format Data Request) does so after
//! `receive` returns, through the channel's `send_*` methods.
//!
//! Every method except [`set_general_capability`](ClipboardHost::set_general_capability)
//! has an empty default so hosts only implement the events they use.
//!
//! # Answering requests
//!
//! The channel owns its host, so a callback cannot reach `send_*` on the
//! same channel. For request/reply flows use [`QueuedHost`](crate::QueuedHost):
//! drain its events once `receive` returns and answer from there.
//!
//! ```rust
//! use lamco_cliprdr_engine::pdu::{CliprdrHeader, FormatDataRequest, MessageFlags, MessageType, CF_UNICODETEXT};
//! use lamco_cliprdr_engine::{ChannelFlag, ChunkRecorder, ClipboardChannel, EngineConfig, HostEvent, QueuedHost};
//!
//! let config = EngineConfig::default();
//! let (host, events) = QueuedHost::create_with_channel(config.general_flags());
//! let mut channel = ClipboardChannel::new(&config, host, ChunkRecorder::new());
//!
//! let mut request = CliprdrHeader::new(MessageType::FormatDataRequest, MessageFlags::empty(), 4)
//!     .to_bytes()
//!     .to_vec();
//! FormatDataRequest { format_id: CF_UNICODETEXT }.encode(&mut request);
//! channel
//!     .receive(&request, request.len() as u32, ChannelFlag::First | ChannelFlag::Last)
//!     .unwrap();
//!
//! for event in events.drain() {
//!     if let HostEvent::FormatDataRequest { format_id } = event {
//!         assert_eq!(format_id, CF_UNICODETEXT);
//!         channel.send_data_with_header(MessageType::FormatDataResponse, &[b'h', 0, 0, 0]);
//!     }
//! }
//!
//! // Response header, then its payload closing the PDU
//! assert_eq!(channel.transport().chunks().len(), 2);
//! ```

use crate::channel::ChannelFlags;
use crate::pdu::{CustomFormat, FileContentsRequest, FileDescriptor, FormatName, GeneralCapabilityFlags};

/// Sink for clipboard channel events
pub trait ClipboardHost {
    /// A Format List PDU is about to be reported
    fn format_list_start(&mut self) {}

    /// One entry of the Format List PDU.
    ///
    /// `name` keeps its wire encoding ([`FormatName::is_ascii`] tells
    /// single-byte names from UTF-16LE ones).
    fn format_list_format(&mut self, name: FormatName<'_>, format_id: u32, custom_format: CustomFormat) {
        let _ = (name, format_id, custom_format);
    }

    /// All entries of the Format List PDU were reported
    fn format_list_stop(&mut self) {}

    /// A chunk of a Format Data Response.
    ///
    /// `remaining` is the number of payload bytes still expected after this
    /// chunk and `flags` carries only `FIRST` and `LAST`.
    fn format_data_response(&mut self, data: &[u8], remaining: u32, format_id: u32, flags: ChannelFlags) {
        let _ = (data, remaining, format_id, flags);
    }

    /// A FileGroupDescriptorW response announced `count` file records
    fn format_data_response_file_start(&mut self, count: u32) {
        let _ = count;
    }

    /// One file record of a FileGroupDescriptorW response
    fn format_data_response_file(&mut self, file: &FileDescriptor<'_>) {
        let _ = file;
    }

    /// The FileGroupDescriptorW response is complete
    fn format_data_response_file_stop(&mut self) {}

    /// A chunk of a File Contents Response.
    ///
    /// The engine does not buffer file data: hosts assemble the stream from
    /// these chunks.
    fn file_contents_response(&mut self, data: &[u8], stream_id: u32, remaining: u32, flags: ChannelFlags) {
        let _ = (data, stream_id, remaining, flags);
    }

    /// The peer asks for clipboard data in `format_id`
    fn format_data_request(&mut self, format_id: u32) {
        let _ = format_id;
    }

    /// The peer asks for file contents (size or range)
    fn file_contents_request(&mut self, request: &FileContentsRequest) {
        let _ = request;
    }

    /// The peer locked its clipboard data under `clip_data_id`
    fn lock(&mut self, clip_data_id: u32) {
        let _ = clip_data_id;
    }

    /// The peer released the lock `clip_data_id`
    fn unlock(&mut self, clip_data_id: u32) {
        let _ = clip_data_id;
    }

    /// The peer answered a request of type `msg_type` with `CB_RESPONSE_FAIL`
    fn receive_response_fail(&mut self, msg_type: u16) {
        let _ = msg_type;
    }

    /// The peer advertised `remote` general capabilities.
    ///
    /// Returns the flags the channel uses from now on.
    fn set_general_capability(&mut self, remote: GeneralCapabilityFlags) -> GeneralCapabilityFlags;
}

impl<H: ClipboardHost + ?Sized> ClipboardHost for Box<H> {
    fn format_list_start(&mut self) {
        (**self).format_list_start();
    }

    fn format_list_format(&mut self, name: FormatName<'_>, format_id: u32, custom_format: CustomFormat) {
        (**self).format_list_format(name, format_id, custom_format);
    }

    fn format_list_stop(&mut self) {
        (**self).format_list_stop();
    }

    fn format_data_response(&mut self, data: &[u8], remaining: u32, format_id: u32, flags: ChannelFlags) {
        (**self).format_data_response(data, remaining, format_id, flags);
    }

    fn format_data_response_file_start(&mut self, count: u32) {
        (**self).format_data_response_file_start(count);
    }

    fn format_data_response_file(&mut self, file: &FileDescriptor<'_>) {
        (**self).format_data_response_file(file);
    }

    fn format_data_response_file_stop(&mut self) {
        (**self).format_data_response_file_stop();
    }

    fn file_contents_response(&mut self, data: &[u8], stream_id: u32, remaining: u32, flags: ChannelFlags) {
        (**self).file_contents_response(data, stream_id, remaining, flags);
    }

    fn format_data_request(&mut self, format_id: u32) {
        (**self).format_data_request(format_id);
    }

    fn file_contents_request(&mut self, request: &FileContentsRequest) {
        (**self).file_contents_request(request);
    }

    fn lock(&mut self, clip_data_id: u32) {
        (**self).lock(clip_data_id);
    }

    fn unlock(&mut self, clip_data_id: u32) {
        (**self).unlock(clip_data_id);
    }

    fn receive_response_fail(&mut self, msg_type: u16) {
        (**self).receive_response_fail(msg_type);
    }

    fn set_general_capability(&mut self, remote: GeneralCapabilityFlags) -> GeneralCapabilityFlags {
        (**self).set_general_capability(remote)
    }
}
