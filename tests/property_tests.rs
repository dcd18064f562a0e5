//! Property tests for the header codec and chunk reassembly
//!
//! Split invariance: feeding a response as one chunk or split at arbitrary
//! points yields the same data and the same file records.

use proptest::prelude::*;

use lamco_cliprdr_engine::pdu::{
    CliprdrHeader, CustomFormat, FileDescriptor, MessageFlag, MessageType, CF_TEXT, CF_UNICODETEXT,
    FILE_DESCRIPTOR_SIZE,
};
use lamco_cliprdr_engine::{
    ChannelFlag, ChannelFlags, ChunkRecorder, ClipboardChannel, EngineConfig, HostEvent, HostEventReceiver,
    QueuedHost, ResponseState,
};

type Channel = ClipboardChannel<QueuedHost, ChunkRecorder>;

fn new_channel() -> (Channel, HostEventReceiver) {
    let config = EngineConfig::default();
    let (host, events) = QueuedHost::create_with_channel(config.general_flags());
    (ClipboardChannel::new(&config, host, ChunkRecorder::new()), events)
}

fn format_data_response(payload: &[u8]) -> Vec<u8> {
    let mut out = CliprdrHeader::new(
        MessageType::FormatDataResponse,
        MessageFlag::ResponseOk.into(),
        payload.len() as u32,
    )
    .to_bytes()
    .to_vec();
    out.extend_from_slice(payload);
    out
}

/// Feed `message` cut at `cuts` (sorted). Cuts inside the header are
/// ignored since the first chunk always carries the whole header.
fn feed(channel: &mut Channel, message: &[u8], cuts: &[usize]) {
    let total = message.len() as u32;
    let mut bounds = vec![0];
    bounds.extend(
        cuts.iter()
            .copied()
            .filter(|&cut| cut >= CliprdrHeader::SIZE && cut < message.len()),
    );
    bounds.push(message.len());
    bounds.dedup();

    for (index, pair) in bounds.windows(2).enumerate() {
        let mut flags = ChannelFlags::empty();
        if index == 0 {
            flags |= ChannelFlag::First;
        }
        if pair[1] == message.len() {
            flags |= ChannelFlag::Last;
        }
        channel.receive(&message[pair[0]..pair[1]], total, flags).unwrap();
    }
}

fn file_records(count: usize) -> Vec<u8> {
    let mut payload = (count as u32).to_le_bytes().to_vec();
    for index in 0..count {
        let name: Vec<u8> = format!("file-{index}.dat")
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect();
        FileDescriptor {
            flags: 0x4041,
            attributes: 0x80,
            last_write_time_low: 0x1000 + index as u32,
            last_write_time_high: 0x01DA_0000,
            size_high: index as u32,
            size_low: 0xFFFF_0000 + index as u32,
            name: &name,
        }
        .encode(&mut payload);
    }
    payload
}

fn file_events(channel: &mut Channel, events: &HostEventReceiver, message: &[u8], cuts: &[usize]) -> Vec<HostEvent> {
    channel.send_request_format(0xC0B1, CustomFormat::FileGroupDescriptorW);
    feed(channel, message, cuts);
    events.drain()
}

/// Concatenated data and final remaining count of FormatData events
fn collect_data(events: Vec<HostEvent>) -> (Vec<u8>, Vec<u32>) {
    let mut data = Vec::new();
    let mut remaining = Vec::new();
    for event in events {
        match event {
            HostEvent::FormatData {
                data: chunk,
                remaining: left,
                ..
            } => {
                data.extend(chunk);
                remaining.push(left);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
    (data, remaining)
}

#[test]
fn test_unicode_text_every_split_offset() {
    let mut payload: Vec<u8> = "split".encode_utf16().flat_map(u16::to_le_bytes).collect();
    let expected = payload.clone();
    payload.extend([0, 0]);
    let message = format_data_response(&payload);

    for first in 8..message.len() {
        for second in first..message.len() {
            let (mut channel, events) = new_channel();
            channel.send_request_format(CF_UNICODETEXT, CustomFormat::None);
            feed(&mut channel, &message, &[first, second]);

            let (data, _) = collect_data(events.drain());
            assert_eq!(data, expected, "split at {first}, {second}");
        }
    }
}

#[test]
fn test_file_records_every_split_offset() {
    let message = format_data_response(&file_records(2));
    let (mut channel, events) = new_channel();
    let unsplit = file_events(&mut channel, &events, &message, &[]);
    assert_eq!(unsplit.len(), 4);

    for cut in 8..=8 + 4 + 2 * FILE_DESCRIPTOR_SIZE {
        let (mut channel, events) = new_channel();
        let split = file_events(&mut channel, &events, &message, &[cut]);
        assert_eq!(split, unsplit, "split at {cut}");
        assert_eq!(channel.response_state(), ResponseState::None);
    }
}

proptest! {
    #[test]
    fn prop_header_roundtrip(msg_type in any::<u16>(), msg_flags in any::<u16>(), data_len in any::<u32>()) {
        let header = CliprdrHeader { msg_type, msg_flags, data_len };
        let bytes = header.to_bytes();
        let decoded = CliprdrHeader::decode(&mut &bytes[..]).unwrap();
        prop_assert_eq!(decoded, header);
    }

    #[test]
    fn prop_format_data_split_invariance(
        payload in proptest::collection::vec(any::<u8>(), 0..600),
        cuts in proptest::collection::btree_set(1usize..620, 0..8),
    ) {
        let message = format_data_response(&payload);
        let cuts: Vec<usize> = cuts.into_iter().collect();

        let (mut whole, whole_events) = new_channel();
        whole.send_request_format(CF_TEXT, CustomFormat::None);
        feed(&mut whole, &message, &[]);
        let (whole_data, _) = collect_data(whole_events.drain());

        let (mut split, split_events) = new_channel();
        split.send_request_format(CF_TEXT, CustomFormat::None);
        feed(&mut split, &message, &cuts);
        let (split_data, remaining) = collect_data(split_events.drain());

        prop_assert_eq!(&split_data, &payload);
        prop_assert_eq!(split_data, whole_data);
        prop_assert!(remaining.windows(2).all(|pair| pair[0] >= pair[1]));
        prop_assert_eq!(remaining.last().copied(), Some(0));
        prop_assert_eq!(split.pending_format_request(), None);
    }

    #[test]
    fn prop_unicode_text_terminator_stripped_once(
        text in "[a-zA-Z0-9 ]{0,64}",
        cuts in proptest::collection::btree_set(8usize..140, 0..4),
    ) {
        let mut payload: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        let expected = payload.clone();
        payload.extend([0, 0]);

        let message = format_data_response(&payload);

        let (mut channel, events) = new_channel();
        channel.send_request_format(CF_UNICODETEXT, CustomFormat::None);
        let cuts: Vec<usize> = cuts.into_iter().collect();
        feed(&mut channel, &message, &cuts);

        let (data, _) = collect_data(events.drain());
        prop_assert_eq!(data, expected);
    }

    #[test]
    fn prop_file_records_split_invariance(
        count in 1usize..4,
        cuts in proptest::collection::btree_set(1usize..2400, 0..6),
    ) {
        let message = format_data_response(&file_records(count));
        let cuts: Vec<usize> = cuts.into_iter().collect();

        let (mut whole, whole_events) = new_channel();
        let unsplit = file_events(&mut whole, &whole_events, &message, &[]);

        let (mut split, split_events) = new_channel();
        let reassembled = file_events(&mut split, &split_events, &message, &cuts);

        prop_assert_eq!(reassembled.len(), count + 2);
        prop_assert_eq!(reassembled, unsplit);
    }
}
