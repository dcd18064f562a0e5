//! Outbound PDUs.
//!
//! Complete PDUs are sent as a single chunk flagged `FIRST | LAST`. Hosts
//! streaming a large payload themselves use [`ClipboardChannel::send_header`]
//! followed by [`ClipboardChannel::send_data`]. Every chunk carries
//! `SHOW_PROTOCOL`.

use bytes::BufMut;
use tracing::debug;

use super::{ClipboardChannel, PendingFormatRequest};
use crate::channel::{single_chunk, ChannelFlag, ChannelFlags, ChannelTransport};
use crate::host::ClipboardHost;
use crate::pdu::{
    CapabilitiesPdu, Charset, CliprdrHeader, CustomFormat, FileContentsRequest, FormatDataRequest,
    FormatNameEncoding, GeneralCapability, LockClipData, MessageFlag, MessageFlags, MessageType,
    FILECONTENTS_SIZE_CB_REQUESTED,
};
use crate::{CliprdrError, CliprdrResult};

impl<H: ClipboardHost, T: ChannelTransport> ClipboardChannel<H, T> {
    fn send_pdu(&mut self, msg_type: MessageType, msg_flags: MessageFlags, payload: &[u8]) {
        let header = CliprdrHeader::new(msg_type, msg_flags, payload.len() as u32);

        let mut pdu = Vec::with_capacity(CliprdrHeader::SIZE + payload.len());
        header.encode(&mut pdu);
        pdu.put_slice(payload);

        log_pdu!(self.verbose, %header, "Sending clipboard PDU");
        self.transport
            .send(&pdu, pdu.len() as u32, single_chunk() | ChannelFlag::ShowProtocol);
    }

    /// Capabilities PDU answering Monitor Ready
    pub(super) fn send_capabilities(&mut self) {
        let flags = if self.caps_received {
            self.general_flags
        } else {
            self.local_flags
        };

        let mut payload = Vec::with_capacity(CapabilitiesPdu::SIZE);
        CapabilitiesPdu::new(self.caps_version, flags).encode(&mut payload);
        self.send_pdu(MessageType::ClipCaps, MessageFlags::empty(), &payload);
    }

    pub(super) fn send_empty_format_list(&mut self) {
        self.send_pdu(MessageType::FormatList, MessageFlag::AsciiNames.into(), &[]);
    }

    pub(super) fn send_format_list_response(&mut self) {
        self.send_pdu(MessageType::FormatListResponse, MessageFlag::ResponseOk.into(), &[]);
    }

    /// Request clipboard data in `format_id`.
    ///
    /// The request replaces any outstanding one; `custom_format` selects
    /// how the response is reassembled.
    pub fn send_request_format(&mut self, format_id: u32, custom_format: CustomFormat) {
        self.requests.set_format_request(PendingFormatRequest {
            format_id,
            custom_format,
        });

        let mut payload = Vec::with_capacity(FormatDataRequest::SIZE);
        FormatDataRequest { format_id }.encode(&mut payload);
        self.send_pdu(MessageType::FormatDataRequest, MessageFlags::empty(), &payload);
    }

    /// Request file contents.
    ///
    /// Size queries always ask for 8 bytes. The lock id is dropped unless
    /// locking was negotiated.
    pub fn send_file_contents_request(&mut self, mut request: FileContentsRequest) {
        if request.is_size_request() {
            request.requested_size = FILECONTENTS_SIZE_CB_REQUESTED;
        }

        if request.clip_data_id.is_some() && !self.general_flags.contains(GeneralCapability::CanLockClipdata) {
            debug!(clip_data_id = ?request.clip_data_id, "Locking not negotiated, dropping clipDataId");
            request.clip_data_id = None;
        }

        self.requests.set_file_contents_stream(request.stream_id);

        let mut payload = Vec::with_capacity(request.size());
        request.encode(&mut payload);
        self.send_pdu(MessageType::FileContentsRequest, MessageFlags::empty(), &payload);
    }

    /// Announce a single format
    pub fn send_format(&mut self, format_id: u32, charset: Charset, name: &str) {
        self.send_format_list(charset, &[(format_id, name)]);
    }

    /// Announce the local formats, in priority order
    pub fn send_format_list(&mut self, charset: Charset, formats: &[(u32, &str)]) {
        let encoding = self.format_name_encoding(charset);

        let mut payload = Vec::new();
        for &(format_id, name) in formats {
            encoding.encode_entry(&mut payload, format_id, name);
        }

        let msg_flags = if encoding.is_ascii() {
            MessageFlag::AsciiNames.into()
        } else {
            MessageFlags::empty()
        };
        self.send_pdu(MessageType::FormatList, msg_flags, &payload);
    }

    /// Write one Format List entry into `buf` using the negotiated encoding.
    ///
    /// Returns the number of bytes written.
    pub fn add_format(&self, buf: &mut [u8], format_id: u32, charset: Charset, name: &str) -> CliprdrResult<usize> {
        let encoding = self.format_name_encoding(charset);
        let needed = encoding.entry_len(name);
        if buf.len() < needed {
            return Err(CliprdrError::BufferTooSmall {
                needed,
                available: buf.len(),
            });
        }

        let mut dst = &mut buf[..needed];
        encoding.encode_entry(&mut dst, format_id, name);
        Ok(needed)
    }

    /// Send a bare header opening a PDU of `data_len` payload bytes.
    ///
    /// The payload follows through [`send_data`](Self::send_data) with a
    /// total length of `data_len + 8`.
    pub fn send_header(&mut self, msg_type: MessageType, msg_flags: MessageFlags, data_len: u32, flags: ChannelFlags) {
        let header = CliprdrHeader::new(msg_type, msg_flags, data_len);
        log_pdu!(self.verbose, %header, "Sending clipboard header");

        self.transport.send(
            &header.to_bytes(),
            data_len.saturating_add(CliprdrHeader::SIZE as u32),
            flags | ChannelFlag::First | ChannelFlag::ShowProtocol,
        );
    }

    /// Send raw PDU bytes as one chunk of a PDU of `total_len` bytes
    pub fn send_data(&mut self, data: &[u8], total_len: u32, flags: ChannelFlags) {
        self.transport.send(data, total_len, flags | ChannelFlag::ShowProtocol);
    }

    /// Send a successful response: header then `data` closing the PDU
    pub fn send_data_with_header(&mut self, msg_type: MessageType, data: &[u8]) {
        let data_len = data.len() as u32;
        self.send_header(msg_type, MessageFlag::ResponseOk.into(), data_len, ChannelFlags::empty());
        self.send_data(
            data,
            data_len.saturating_add(CliprdrHeader::SIZE as u32),
            ChannelFlag::Last.into(),
        );
    }

    /// Answer a request of type `msg_type` with `CB_RESPONSE_FAIL`
    pub fn send_response_fail(&mut self, msg_type: MessageType) {
        self.send_pdu(msg_type, MessageFlag::ResponseFail.into(), &[]);
    }

    /// Lock the local clipboard data under `clip_data_id`.
    ///
    /// Returns false (nothing sent) if locking was not negotiated.
    pub fn send_lock(&mut self, clip_data_id: u32) -> bool {
        self.send_lock_pdu(MessageType::LockClipdata, clip_data_id)
    }

    /// Release the lock `clip_data_id`.
    ///
    /// Returns false (nothing sent) if locking was not negotiated.
    pub fn send_unlock(&mut self, clip_data_id: u32) -> bool {
        self.send_lock_pdu(MessageType::UnlockClipdata, clip_data_id)
    }

    fn send_lock_pdu(&mut self, msg_type: MessageType, clip_data_id: u32) -> bool {
        if !self.general_flags.contains(GeneralCapability::CanLockClipdata) {
            debug!(%msg_type, clip_data_id, "Locking not negotiated, not sending");
            return false;
        }

        let mut payload = Vec::with_capacity(LockClipData::SIZE);
        LockClipData { clip_data_id }.encode(&mut payload);
        self.send_pdu(msg_type, MessageFlags::empty(), &payload);
        true
    }

    fn format_name_encoding(&self, charset: Charset) -> FormatNameEncoding {
        FormatNameEncoding::select(self.uses_long_format_names(), charset == Charset::Ascii)
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use mockall::Sequence;

    use super::*;
    use crate::channel::MockChannelTransport;
    use crate::config::EngineConfig;
    use crate::pdu::{GeneralCapabilityFlags, FILECONTENTS_RANGE, FILECONTENTS_SIZE};

    struct NullHost {
        flags: GeneralCapabilityFlags,
    }

    impl ClipboardHost for NullHost {
        fn set_general_capability(&mut self, _remote: GeneralCapabilityFlags) -> GeneralCapabilityFlags {
            self.flags
        }
    }

    fn shown() -> ChannelFlags {
        single_chunk() | ChannelFlag::ShowProtocol
    }

    fn caps_pdu(flags: u32) -> Vec<u8> {
        let mut pdu = vec![0x07, 0x00, 0x00, 0x00, 16, 0, 0, 0, 1, 0, 0, 0, 1, 0, 12, 0, 2, 0, 0, 0];
        pdu.extend(flags.to_le_bytes());
        pdu
    }

    fn negotiated_channel(
        negotiated: GeneralCapabilityFlags,
        transport: MockChannelTransport,
    ) -> ClipboardChannel<NullHost, MockChannelTransport> {
        let mut channel = ClipboardChannel::new(&EngineConfig::default(), NullHost { flags: negotiated }, transport);
        channel
            .receive(&caps_pdu(negotiated.bits()), 24, single_chunk())
            .unwrap();
        channel
    }

    #[test]
    fn test_monitor_ready_sends_caps_then_empty_format_list() {
        let mut transport = MockChannelTransport::new();
        let mut seq = Sequence::new();

        let mut caps = vec![0x07, 0x00, 0x00, 0x00, 16, 0, 0, 0, 1, 0, 0, 0, 1, 0, 12, 0, 2, 0, 0, 0];
        caps.extend(0x1Eu32.to_le_bytes());

        transport
            .expect_send()
            .with(eq(caps), eq(24), eq(shown()))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        transport
            .expect_send()
            .with(eq(vec![0x02u8, 0x00, 0x04, 0x00, 0, 0, 0, 0]), eq(8), eq(shown()))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let host = NullHost {
            flags: GeneralCapabilityFlags::empty(),
        };
        let mut channel = ClipboardChannel::new(&EngineConfig::default(), host, transport);
        channel
            .receive(&[0x01, 0x00, 0x00, 0x00, 0, 0, 0, 0], 8, single_chunk())
            .unwrap();
    }

    #[test]
    fn test_size_request_forces_cb_requested() {
        let mut transport = MockChannelTransport::new();
        transport
            .expect_send()
            .withf(|data, total_len, flags| {
                data.len() == 8 + 24
                    && *total_len == 32
                    && *flags == shown()
                    && data[..8] == [0x08, 0x00, 0x00, 0x00, 24, 0, 0, 0]
                    && data[28..32] == FILECONTENTS_SIZE_CB_REQUESTED.to_le_bytes()
            })
            .times(1)
            .return_const(());

        let host = NullHost {
            flags: GeneralCapabilityFlags::empty(),
        };
        let mut channel = ClipboardChannel::new(&EngineConfig::default(), host, transport);
        channel.send_file_contents_request(FileContentsRequest {
            stream_id: 1,
            flags: FILECONTENTS_SIZE,
            requested_size: 4096,
            clip_data_id: Some(5),
            ..Default::default()
        });
    }

    #[test]
    fn test_lock_id_kept_when_negotiated() {
        let mut transport = MockChannelTransport::new();
        transport
            .expect_send()
            .withf(|data, _, _| data.len() == 8 + 28 && data[32..36] == 5u32.to_le_bytes())
            .times(1)
            .return_const(());

        let mut channel = negotiated_channel(GeneralCapability::CanLockClipdata.into(), transport);
        channel.send_file_contents_request(FileContentsRequest {
            stream_id: 1,
            flags: FILECONTENTS_RANGE,
            requested_size: 4096,
            clip_data_id: Some(5),
            ..Default::default()
        });
    }

    #[test]
    fn test_lock_skipped_without_negotiation() {
        let mut transport = MockChannelTransport::new();
        transport.expect_send().times(0);

        let host = NullHost {
            flags: GeneralCapabilityFlags::empty(),
        };
        let mut channel = ClipboardChannel::new(&EngineConfig::default(), host, transport);
        assert!(!channel.send_lock(3));
        assert!(!channel.send_unlock(3));
    }

    #[test]
    fn test_send_data_with_header() {
        let mut transport = MockChannelTransport::new();
        let mut seq = Sequence::new();
        transport
            .expect_send()
            .with(
                eq(vec![0x05u8, 0x00, 0x01, 0x00, 3, 0, 0, 0]),
                eq(11),
                eq(ChannelFlag::First | ChannelFlag::ShowProtocol),
            )
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        transport
            .expect_send()
            .with(
                eq(vec![b'a', b'b', 0]),
                eq(11),
                eq(ChannelFlag::Last | ChannelFlag::ShowProtocol),
            )
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let host = NullHost {
            flags: GeneralCapabilityFlags::empty(),
        };
        let mut channel = ClipboardChannel::new(&EngineConfig::default(), host, transport);
        channel.send_data_with_header(MessageType::FormatDataResponse, b"ab\0");
    }

    #[test]
    fn test_add_format_uses_negotiated_encoding() {
        let mut transport = MockChannelTransport::new();
        transport.expect_send().return_const(());

        let host = NullHost {
            flags: GeneralCapabilityFlags::empty(),
        };
        let channel = ClipboardChannel::new(&EngineConfig::default(), host, transport);
        let mut buf = [0xFFu8; 64];
        assert_eq!(channel.add_format(&mut buf, 13, Charset::Ascii, "x").unwrap(), 36);
        assert_eq!(&buf[4..6], &[b'x', 0]);

        let channel = negotiated_channel(GeneralCapability::UseLongFormatNames.into(), {
            let mut transport = MockChannelTransport::new();
            transport.expect_send().return_const(());
            transport
        });
        let mut buf = [0xFFu8; 64];
        assert_eq!(channel.add_format(&mut buf, 13, Charset::Utf16, "x").unwrap(), 8);
        assert_eq!(&buf[..8], &[13, 0, 0, 0, b'x', 0, 0, 0]);
        assert_eq!(buf[8], 0xFF);

        let mut small = [0u8; 4];
        assert_eq!(
            channel.add_format(&mut small, 13, Charset::Utf16, "x"),
            Err(CliprdrError::BufferTooSmall {
                needed: 8,
                available: 4
            })
        );
    }
}
