//! RX framer: turns the circular DMA capture into command lines.
//!
//! The RX channel writes into its region continuously. When the UART reports
//! a line-idle condition the framer scans only the bytes that arrived since
//! the previous scan:
//!
//! ```text
//!   region:  [ . . . . x x x x x . . . ]
//!                      ▲         ▲
//!           last_position     write_position
//! ```
//!
//! Terminator bytes close the accumulated line into the [`CommandSlot`];
//! everything else is appended while there is room.

use heapless::Vec;

use super::config::{OverwritePolicy, TransportConfig};
use super::error::{IoError, IoResult};
use super::stats::{Counters, bump};
use crate::hal::RxStream;

// =============================================================================
// Command Slot
// =============================================================================

/// Result of publishing a line into the slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotOutcome {
    /// Slot was empty
    Stored,
    /// An unread line was replaced
    Overwrote,
    /// The new line was discarded to keep the unread one
    Dropped,
}

/// One-deep mailbox holding the latest complete line.
///
/// Written from the line-idle interrupt, read from task context; both sides
/// go through the transport's critical section.
pub struct CommandSlot<const LINE: usize> {
    line: Vec<u8, LINE>,
    ready: bool,
}

impl<const LINE: usize> CommandSlot<LINE> {
    /// Create an empty slot. Const-compatible.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            line: Vec::new(),
            ready: false,
        }
    }

    /// True if an unread line is waiting
    #[inline(always)]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Length of the waiting line, if any
    pub fn pending_len(&self) -> Option<usize> {
        self.ready.then(|| self.line.len())
    }

    /// Move `accumulator` into the slot according to `policy`.
    ///
    /// The accumulator is left empty either way.
    pub fn publish(&mut self, accumulator: &mut Vec<u8, LINE>, policy: OverwritePolicy) -> SlotOutcome {
        let outcome = match (self.ready, policy) {
            (false, _) => SlotOutcome::Stored,
            (true, OverwritePolicy::LatestWins) => SlotOutcome::Overwrote,
            (true, OverwritePolicy::KeepUnread) => SlotOutcome::Dropped,
        };

        if outcome != SlotOutcome::Dropped {
            core::mem::swap(&mut self.line, accumulator);
            self.ready = true;
        }
        accumulator.clear();
        outcome
    }

    /// Copy the waiting line into `out` and clear the slot.
    ///
    /// A line that does not fit is left in place, never truncated.
    pub fn take_into(&mut self, out: &mut [u8]) -> IoResult<usize> {
        if !self.ready {
            return Err(IoError::NoLine);
        }
        let len = self.line.len();
        if len > out.len() {
            return Err(IoError::BufferTooSmall);
        }
        out[..len].copy_from_slice(&self.line);
        self.clear();
        Ok(len)
    }

    /// Take the waiting line by value and clear the slot.
    pub fn take(&mut self) -> Option<Vec<u8, LINE>> {
        if !self.ready {
            return None;
        }
        self.ready = false;
        Some(core::mem::take(&mut self.line))
    }

    /// Drop any waiting line
    pub fn clear(&mut self) {
        self.line.clear();
        self.ready = false;
    }
}

impl<const LINE: usize> Default for CommandSlot<LINE> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Framer
// =============================================================================

/// RX framer owning the capture stream and the line accumulator.
///
/// # Type Parameters
/// * `R` - Circular RX capture
/// * `LINE` - Longest line kept; extra bytes before a terminator are discarded
pub struct RxFramer<R, const LINE: usize> {
    stream: R,
    accumulator: Vec<u8, LINE>,
    /// Region offset of the first byte not yet scanned
    last_position: usize,
    /// Current line already lost bytes to a full accumulator
    truncated: bool,
}

impl<R: RxStream, const LINE: usize> RxFramer<R, LINE> {
    /// Create a framer starting at region offset 0. Const-compatible.
    #[must_use]
    pub const fn new(stream: R) -> Self {
        assert!(LINE > 0, "line buffer must hold at least one byte");
        Self {
            stream,
            accumulator: Vec::new(),
            last_position: 0,
            truncated: false,
        }
    }

    /// The capture stream
    pub fn stream(&self) -> &R {
        &self.stream
    }

    /// The capture stream, mutably
    pub fn stream_mut(&mut self) -> &mut R {
        &mut self.stream
    }

    /// Bytes of the line currently being accumulated
    pub fn partial_line(&self) -> &[u8] {
        &self.accumulator
    }

    /// Region offset the next scan starts from
    pub fn last_position(&self) -> usize {
        self.last_position
    }

    /// Line-idle handler: scan every byte captured since the last call.
    ///
    /// Returns the number of bytes scanned.
    pub(crate) fn on_line_idle(
        &mut self,
        slot: &mut CommandSlot<LINE>,
        config: &TransportConfig,
        counters: &Counters,
    ) -> usize {
        self.stream.acknowledge_idle();

        let capacity = self.stream.capacity();
        if capacity == 0 {
            return 0;
        }

        let position = self.stream.write_position() % capacity;
        let fresh = (position + capacity - self.last_position) % capacity;

        let mut index = self.last_position;
        for _ in 0..fresh {
            let byte = self.stream.read_byte(index);
            self.accept(byte, slot, config, counters);
            index = (index + 1) % capacity;
        }
        self.last_position = position;

        bump(&counters.rx_bytes, fresh as u32);
        fresh
    }

    /// Per-byte receive path: scan bytes delivered outside the DMA region
    /// (e.g. an RXNE interrupt handing over one byte at a time).
    pub(crate) fn feed(
        &mut self,
        bytes: &[u8],
        slot: &mut CommandSlot<LINE>,
        config: &TransportConfig,
        counters: &Counters,
    ) {
        for &byte in bytes {
            self.accept(byte, slot, config, counters);
        }
        bump(&counters.rx_bytes, bytes.len() as u32);
    }

    fn accept(
        &mut self,
        byte: u8,
        slot: &mut CommandSlot<LINE>,
        config: &TransportConfig,
        counters: &Counters,
    ) {
        if config.is_terminator(byte) {
            if !self.accumulator.is_empty() {
                self.close_line(slot, config, counters);
            }
            return;
        }

        if self.accumulator.push(byte).is_err() && !self.truncated {
            self.truncated = true;
            bump(&counters.rx_truncated, 1);
            #[cfg(feature = "defmt")]
            defmt::debug!("RX line longer than {} bytes, truncating", LINE);
        }
    }

    fn close_line(&mut self, slot: &mut CommandSlot<LINE>, config: &TransportConfig, counters: &Counters) {
        #[cfg(feature = "defmt")]
        defmt::debug!("RX line complete: {} bytes", self.accumulator.len());

        match slot.publish(&mut self.accumulator, config.overwrite) {
            SlotOutcome::Stored => {}
            SlotOutcome::Overwrote => bump(&counters.lines_overwritten, 1),
            SlotOutcome::Dropped => bump(&counters.lines_dropped, 1),
        }
        bump(&counters.rx_lines, 1);
        self.truncated = false;
    }
}

// =============================================================================
// Tests
// =============================================================================
