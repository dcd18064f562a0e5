//! Virtual channel boundary: chunk flags and the outbound transport.
//!
//! The engine never owns a socket. Inbound chunks are handed to
//! [`ClipboardChannel::receive`](crate::ClipboardChannel::receive) together
//! with their chunk flags, and every outbound chunk goes through a
//! [`ChannelTransport`].

use enumflags2::{bitflags, BitFlags};

/// Virtual channel chunk flags (CHANNEL_FLAG_*)
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelFlag {
    /// Chunk starts a PDU
    First = 0x0000_0001,
    /// Chunk ends a PDU
    Last = 0x0000_0002,
    /// Ask the transport to expose the chunk to protocol tracing
    ShowProtocol = 0x0000_0010,
}

/// Set of [`ChannelFlag`]
pub type ChannelFlags = BitFlags<ChannelFlag>;

/// Flags of a PDU sent as a single chunk
pub fn single_chunk() -> ChannelFlags {
    ChannelFlag::First | ChannelFlag::Last
}

/// Outbound side of the clipboard virtual channel.
///
/// `total_len` is the length of the whole PDU the chunk belongs to, which
/// equals `data.len()` for single-chunk PDUs. Delivery failures are the
/// transport's concern and are not reported back to the engine.
#[cfg_attr(test, mockall::automock)]
pub trait ChannelTransport {
    /// Send one chunk
    fn send(&mut self, data: &[u8], total_len: u32, flags: ChannelFlags);
}

impl<T: ChannelTransport + ?Sized> ChannelTransport for Box<T> {
    fn send(&mut self, data: &[u8], total_len: u32, flags: ChannelFlags) {
        (**self).send(data, total_len, flags);
    }
}

impl<T: ChannelTransport + ?Sized> ChannelTransport for &mut T {
    fn send(&mut self, data: &[u8], total_len: u32, flags: ChannelFlags) {
        (**self).send(data, total_len, flags);
    }
}

/// One chunk captured by a [`ChunkRecorder`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentChunk {
    /// Chunk bytes
    pub data: Vec<u8>,
    /// Declared PDU length
    pub total_len: u32,
    /// Chunk flags
    pub flags: ChannelFlags,
}

/// Transport that keeps every chunk in memory.
///
/// Useful for hosts that batch outbound traffic and for tests.
#[derive(Debug, Default)]
pub struct ChunkRecorder {
    chunks: Vec<SentChunk>,
}

impl ChunkRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunks sent so far
    pub fn chunks(&self) -> &[SentChunk] {
        &self.chunks
    }

    /// Remove and return the chunks sent so far
    pub fn take(&mut self) -> Vec<SentChunk> {
        std::mem::take(&mut self.chunks)
    }
}

impl ChannelTransport for ChunkRecorder {
    fn send(&mut self, data: &[u8], total_len: u32, flags: ChannelFlags) {
        self.chunks.push(SentChunk {
            data: data.to_vec(),
            total_len,
            flags,
        });
    }
}
