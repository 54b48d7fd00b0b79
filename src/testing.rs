//! Host-side mocks for unit tests.
//!
//! Only compiled under `cfg(test)`.

extern crate std;

use std::vec::Vec;

use crate::hal::{RxStream, TxDma};

// =============================================================================
// TX
// =============================================================================

/// Recording TX engine.
///
/// A started transfer stays busy until [`finish`](MockTxDma::finish) moves
/// its bytes onto `wire`, mimicking the hardware clearing EN at completion.
#[derive(Debug, Default)]
pub struct MockTxDma {
    /// Number of `start` calls
    pub starts: usize,
    /// Number of completion acknowledgements
    pub acks: usize,
    /// Channel enabled
    pub busy: bool,
    /// `stop` has no effect while set
    pub stuck: bool,
    /// Bytes of every finished transfer, in order
    pub wire: Vec<u8>,
    /// Bytes of the transfer currently programmed
    pub in_flight: Vec<u8>,
}

impl MockTxDma {
    /// Idle engine with nothing recorded
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete the programmed transfer.
    pub fn finish(&mut self) {
        self.wire.append(&mut self.in_flight);
        self.busy = false;
    }
}

impl TxDma for MockTxDma {
    fn start(&mut self, data: &[u8]) {
        self.starts += 1;
        self.in_flight.clear();
        self.in_flight.extend_from_slice(data);
        self.busy = true;
    }

    fn stop(&mut self) {
        if !self.stuck {
            self.busy = false;
        }
    }

    fn is_busy(&self) -> bool {
        self.busy
    }

    fn acknowledge_complete(&mut self) {
        self.acks += 1;
    }
}

// =============================================================================
// RX
// =============================================================================

/// Circular capture region filled by [`inject`](MockRxStream::inject).
#[derive(Debug)]
pub struct MockRxStream<const N: usize> {
    region: [u8; N],
    position: usize,
    /// Number of idle acknowledgements
    pub idle_acks: usize,
}

impl<const N: usize> MockRxStream<N> {
    /// Zeroed region, write position 0
    pub const fn new() -> Self {
        Self {
            region: [0u8; N],
            position: 0,
            idle_acks: 0,
        }
    }

    /// Write bytes as the DMA channel would, wrapping at the region end.
    pub fn inject(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.region[self.position] = b;
            self.position = (self.position + 1) % N;
        }
    }
}

impl<const N: usize> RxStream for MockRxStream<N> {
    fn capacity(&self) -> usize {
        N
    }

    fn write_position(&self) -> usize {
        self.position
    }

    fn read_byte(&self, index: usize) -> u8 {
        self.region[index]
    }

    fn acknowledge_idle(&mut self) {
        self.idle_acks += 1;
    }
}
