//! # lamco-cliprdr-engine
//!
//! CLIPRDR (MS-RDPECLIP) clipboard virtual channel engine for an
//! intercepting RDP proxy.
//!
//! The engine sits between the virtual channel transport and whatever
//! consumes clipboard traffic:
//!
//! - **[`ClipboardChannel`]** - inbound dispatch, chunk reassembly and the
//!   outbound `send_*` surface
//! - **[`ClipboardHost`] trait** - callbacks for every clipboard event
//! - **[`ChannelTransport`] trait** - outbound chunk sink
//! - **[`pdu`]** - wire structures (header, capabilities, format lists,
//!   requests, file descriptors)
//! - **[`QueuedHost`]** - host adapter queueing events on a crossbeam channel
//!
//! ## Quick Start
//!
//! ```rust
//! use lamco_cliprdr_engine::{ChannelFlag, ChunkRecorder, ClipboardChannel, EngineConfig, QueuedHost};
//!
//! let config = EngineConfig::default();
//! let (host, events) = QueuedHost::create_with_channel(config.general_flags());
//! let mut channel = ClipboardChannel::new(&config, host, ChunkRecorder::new());
//!
//! // Monitor Ready from the peer
//! let monitor_ready = [0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
//! channel
//!     .receive(&monitor_ready, 8, ChannelFlag::First | ChannelFlag::Last)
//!     .unwrap();
//!
//! // Capabilities PDU then an empty Format List were sent
//! assert_eq!(channel.transport().chunks().len(), 2);
//! assert!(events.is_empty());
//! ```
//!
//! ## Architecture
//!
//! ```text
//! transport ──▶ ClipboardChannel::receive
//!                 ├─ header codec (pdu::CliprdrHeader)
//!                 ├─ capability negotiation ──────────▶ host.set_general_capability
//!                 ├─ format list codec ───────────────▶ host.format_list_*
//!                 ├─ chunk reassembler ───────────────▶ host.format_data_response
//!                 │    └─ fixed-record reassembler ───▶ host.format_data_response_file*
//!                 └─ file contents reassembler ───────▶ host.file_contents_response
//! host ──▶ ClipboardChannel::send_* ──▶ transport
//! ```
//!
//! The engine is single-threaded and synchronous. All state belongs to
//! one [`ClipboardChannel`] per session.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;

pub mod channel;
pub mod config;
pub mod engine;
pub mod event;
pub mod host;
pub mod pdu;

pub use channel::{ChannelFlag, ChannelFlags, ChannelTransport, ChunkRecorder, SentChunk};
pub use config::EngineConfig;
pub use engine::{ClipboardChannel, FileContentsPendingState, PendingFormatRequest, ResponseState};
pub use error::{CliprdrError, CliprdrResult};
pub use event::{FileEntry, HostEvent, HostEventReceiver, HostEventSender, QueuedHost};
pub use host::ClipboardHost;
