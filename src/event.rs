//! Queued host adapter.
//!
//! [`QueuedHost`] turns every host callback into an owned [`HostEvent`]
//! pushed onto a crossbeam channel. The channel loop never blocks on the
//! host; the consumer drains events whenever it runs.
//!
//! ```rust,ignore
//! let (host, events) = QueuedHost::create_with_channel(config.general_flags());
//! let mut channel = ClipboardChannel::new(config, host, transport);
//!
//! channel.receive(chunk, total_len, flags)?;
//! for event in events.drain() {
//!     if let HostEvent::FormatDataRequest { format_id } = event {
//!         // answer through channel.send_data_with_header(..)
//!     }
//! }
//! ```

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use tracing::{debug, warn};

use crate::channel::ChannelFlags;
use crate::host::ClipboardHost;
use crate::pdu::{CustomFormat, FileContentsRequest, FileDescriptor, FormatName, GeneralCapabilityFlags};

/// Owned copy of one file record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Decoded file name
    pub name: String,
    /// FILE_ATTRIBUTE_* bits
    pub attributes: u32,
    /// Record flags
    pub flags: u32,
    /// File size in bytes
    pub size: u64,
    /// Last write FILETIME
    pub last_write_time: u64,
}

impl From<&FileDescriptor<'_>> for FileEntry {
    fn from(file: &FileDescriptor<'_>) -> Self {
        Self {
            name: file.name_lossy(),
            attributes: file.attributes,
            flags: file.flags,
            size: file.size(),
            last_write_time: file.last_write_time(),
        }
    }
}

/// Host callbacks as owned values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Capabilities were negotiated
    Capabilities {
        /// Flags advertised by the peer
        remote: GeneralCapabilityFlags,
        /// Flags in use from now on
        negotiated: GeneralCapabilityFlags,
    },
    /// A Format List PDU starts
    FormatListStart,
    /// One Format List entry
    Format {
        /// Format id
        format_id: u32,
        /// Decoded name
        name: String,
        /// Detected custom format
        custom_format: CustomFormat,
        /// Name was single-byte on the wire
        is_ascii: bool,
    },
    /// A Format List PDU ended
    FormatListStop,
    /// A Format Data Response chunk
    FormatData {
        /// Chunk bytes
        data: Vec<u8>,
        /// Bytes still expected
        remaining: u32,
        /// Requested format id
        format_id: u32,
        /// FIRST/LAST flags
        flags: ChannelFlags,
    },
    /// A file list announced `count` records
    FileListStart {
        /// Record count
        count: u32,
    },
    /// One file list record
    File(FileEntry),
    /// The file list ended
    FileListStop,
    /// A File Contents Response chunk
    FileContents {
        /// Chunk bytes
        data: Vec<u8>,
        /// Stream id
        stream_id: u32,
        /// Bytes still expected
        remaining: u32,
        /// FIRST/LAST flags
        flags: ChannelFlags,
    },
    /// The peer requests format data
    FormatDataRequest {
        /// Requested format id
        format_id: u32,
    },
    /// The peer requests file contents
    FileContentsRequest(FileContentsRequest),
    /// The peer locked its clipboard data
    Lock {
        /// Lock id
        clip_data_id: u32,
    },
    /// The peer unlocked its clipboard data
    Unlock {
        /// Lock id
        clip_data_id: u32,
    },
    /// The peer failed a request
    ResponseFail {
        /// Raw msgType of the failed response
        msg_type: u16,
    },
}

/// Sending half of the host event queue
#[derive(Debug, Clone)]
pub struct HostEventSender {
    sender: Sender<HostEvent>,
    receiver: Receiver<HostEvent>,
}

impl Default for HostEventSender {
    fn default() -> Self {
        Self::new()
    }
}

impl HostEventSender {
    /// Create an unbounded event queue
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Queue an event
    pub fn send(&self, event: HostEvent) {
        if self.sender.send(event).is_err() {
            warn!("Host event queue disconnected, dropping event");
        }
    }

    /// Get a receiver for the queued events
    pub fn subscribe(&self) -> HostEventReceiver {
        HostEventReceiver {
            receiver: self.receiver.clone(),
        }
    }
}

/// Receiving half of the host event queue
#[derive(Debug, Clone)]
pub struct HostEventReceiver {
    receiver: Receiver<HostEvent>,
}

impl HostEventReceiver {
    /// Next event, if one is queued
    pub fn try_recv(&self) -> Option<HostEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Take every queued event
    pub fn drain(&self) -> Vec<HostEvent> {
        self.receiver.try_iter().collect()
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// True if no event is queued
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// [`ClipboardHost`] that queues every callback as a [`HostEvent`]
#[derive(Debug)]
pub struct QueuedHost {
    event_sender: HostEventSender,
    local_flags: GeneralCapabilityFlags,
}

impl QueuedHost {
    /// Create a host answering capability negotiation with `local_flags`
    pub fn new(local_flags: GeneralCapabilityFlags, event_sender: HostEventSender) -> Self {
        Self {
            event_sender,
            local_flags,
        }
    }

    /// Create a host together with the receiver of its events
    pub fn create_with_channel(local_flags: GeneralCapabilityFlags) -> (Self, HostEventReceiver) {
        let sender = HostEventSender::new();
        let receiver = sender.subscribe();
        (Self::new(local_flags, sender), receiver)
    }

    /// Flags this host supports
    pub fn local_flags(&self) -> GeneralCapabilityFlags {
        self.local_flags
    }
}

impl ClipboardHost for QueuedHost {
    fn format_list_start(&mut self) {
        self.event_sender.send(HostEvent::FormatListStart);
    }

    fn format_list_format(&mut self, name: FormatName<'_>, format_id: u32, custom_format: CustomFormat) {
        self.event_sender.send(HostEvent::Format {
            format_id,
            name: name.to_string_lossy().into_owned(),
            custom_format,
            is_ascii: name.is_ascii(),
        });
    }

    fn format_list_stop(&mut self) {
        self.event_sender.send(HostEvent::FormatListStop);
    }

    fn format_data_response(&mut self, data: &[u8], remaining: u32, format_id: u32, flags: ChannelFlags) {
        self.event_sender.send(HostEvent::FormatData {
            data: data.to_vec(),
            remaining,
            format_id,
            flags,
        });
    }

    fn format_data_response_file_start(&mut self, count: u32) {
        self.event_sender.send(HostEvent::FileListStart { count });
    }

    fn format_data_response_file(&mut self, file: &FileDescriptor<'_>) {
        self.event_sender.send(HostEvent::File(file.into()));
    }

    fn format_data_response_file_stop(&mut self) {
        self.event_sender.send(HostEvent::FileListStop);
    }

    fn file_contents_response(&mut self, data: &[u8], stream_id: u32, remaining: u32, flags: ChannelFlags) {
        self.event_sender.send(HostEvent::FileContents {
            data: data.to_vec(),
            stream_id,
            remaining,
            flags,
        });
    }

    fn format_data_request(&mut self, format_id: u32) {
        self.event_sender.send(HostEvent::FormatDataRequest { format_id });
    }

    fn file_contents_request(&mut self, request: &FileContentsRequest) {
        self.event_sender.send(HostEvent::FileContentsRequest(*request));
    }

    fn lock(&mut self, clip_data_id: u32) {
        self.event_sender.send(HostEvent::Lock { clip_data_id });
    }

    fn unlock(&mut self, clip_data_id: u32) {
        self.event_sender.send(HostEvent::Unlock { clip_data_id });
    }

    fn receive_response_fail(&mut self, msg_type: u16) {
        self.event_sender.send(HostEvent::ResponseFail { msg_type });
    }

    fn set_general_capability(&mut self, remote: GeneralCapabilityFlags) -> GeneralCapabilityFlags {
        let negotiated = remote & self.local_flags;
        debug!(?remote, ?negotiated, "Negotiated clipboard capabilities");
        self.event_sender
            .send(HostEvent::Capabilities { remote, negotiated });
        negotiated
    }
}
