//! Fixed-size record reassembly.
//!
//! A FileGroupDescriptorW payload is a 4-byte record count followed by
//! 592-byte records. Channel chunks split that payload anywhere, so both
//! the count and any record may straddle chunk boundaries:
//!
//! ```text
//! chunk 1                chunk 2                       chunk 3
//! [count|record 0|rec.. ][..ord 1|record 2|rec..       ][..ord 3]
//!                  ^^^^^  ^^^^^^^               ^^^^^^^^  ^^^^^^
//!                  kept in the partial buffer until completed
//! ```

use crate::CliprdrResult;

/// Output of [`FixedRecordReassembler::feed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecordEvent<'a> {
    /// The leading record count
    Count(u32),
    /// One complete record
    Record(&'a [u8]),
}

#[derive(Debug)]
pub(crate) struct FixedRecordReassembler {
    record_size: usize,
    prefix: Vec<u8>,
    prefix_done: bool,
    partial: Vec<u8>,
}

impl FixedRecordReassembler {
    const COUNT_SIZE: usize = 4;

    pub(crate) fn new(record_size: usize) -> Self {
        Self {
            record_size,
            prefix: Vec::with_capacity(Self::COUNT_SIZE),
            prefix_done: true,
            partial: Vec::with_capacity(record_size),
        }
    }

    /// Start a new payload: drop leftovers and expect a record count
    pub(crate) fn start(&mut self) {
        self.prefix.clear();
        self.prefix_done = false;
        self.partial.clear();
    }

    /// Bytes buffered towards the next record
    pub(crate) fn partial_len(&self) -> usize {
        self.partial.len()
    }

    /// Consume one range of payload bytes.
    ///
    /// `on_event` sees the count once, then every record completed by
    /// this range in order. Bytes that do not complete a record are kept
    /// for the next call.
    pub(crate) fn feed(
        &mut self,
        mut data: &[u8],
        mut on_event: impl FnMut(RecordEvent<'_>) -> CliprdrResult<()>,
    ) -> CliprdrResult<()> {
        if !self.prefix_done {
            let take = (Self::COUNT_SIZE - self.prefix.len()).min(data.len());
            self.prefix.extend_from_slice(&data[..take]);
            data = &data[take..];

            if self.prefix.len() < Self::COUNT_SIZE {
                return Ok(());
            }

            self.prefix_done = true;
            let count = u32::from_le_bytes([self.prefix[0], self.prefix[1], self.prefix[2], self.prefix[3]]);
            on_event(RecordEvent::Count(count))?;
        }

        if !self.partial.is_empty() {
            let missing = self.record_size - self.partial.len();
            if data.len() < missing {
                self.partial.extend_from_slice(data);
                return Ok(());
            }

            self.partial.extend_from_slice(&data[..missing]);
            data = &data[missing..];
            on_event(RecordEvent::Record(&self.partial))?;
            self.partial.clear();
        }

        while data.len() >= self.record_size {
            let (record, rest) = data.split_at(self.record_size);
            on_event(RecordEvent::Record(record))?;
            data = rest;
        }

        self.partial.extend_from_slice(data);
        Ok(())
    }

    /// End the payload, returning the number of discarded leftover bytes
    pub(crate) fn finish(&mut self) -> usize {
        let leftover = self.partial.len() + if self.prefix_done { 0 } else { self.prefix.len() };
        self.prefix.clear();
        self.prefix_done = true;
        self.partial.clear();
        leftover
    }
}
