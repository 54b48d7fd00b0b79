//! Transport façade tying the TX ring, dispatcher and RX framer together.
//!
//! # Contexts
//!
//! | Entry point                         | Context                     |
//! |-------------------------------------|-----------------------------|
//! | [`Producer::submit`] and friends    | task (single producer)      |
//! | [`Transport::poll_line`]            | task                        |
//! | [`Transport::background_task`]      | task (main loop)            |
//! | [`Transport::on_transfer_complete`] | TX transfer-complete IRQ    |
//! | [`Transport::on_line_idle`]         | UART line-idle IRQ          |
//! | [`Transport::on_rx_bytes`]          | UART RXNE IRQ (optional)    |
//!
//! # Example
//!
//! ```ignore
//! use core::fmt::Write;
//! use ph_uart_dma::{TransportConfig, TransportDefault};
//!
//! static UART: TransportDefault<Usart1Tx, Usart1Rx> =
//!     TransportDefault::new(Usart1Tx::new(), Usart1Rx::new(), TransportConfig::new());
//!
//! #[interrupt]
//! fn DMA2_STREAM7() {
//!     UART.on_transfer_complete();
//! }
//!
//! #[interrupt]
//! fn USART1() {
//!     UART.on_line_idle();
//! }
//!
//! fn main() -> ! {
//!     let mut out = UART.producer().unwrap();
//!     let mut line = [0u8; 64];
//!     loop {
//!         if let Ok(len) = UART.poll_line(&mut line) {
//!             writeln!(out, "got {} bytes", len).ok();
//!         }
//!         UART.background_task();
//!     }
//! }
//! ```

use core::fmt;

use heapless::Vec;

use super::config::TransportConfig;
use super::dispatcher::{TransferState, TxDispatcher};
use super::error::{ConfigError, ConfigResult, IoError, IoResult};
use super::framer::{CommandSlot, RxFramer};
use super::stats::{Counters, Statistics, bump};
use crate::hal::{RxStream, TxDma};
use crate::internal::constants::{
    DEFAULT_LINE_SIZE, DEFAULT_STAGING_SIZE, DEFAULT_TX_RING_SIZE, LF,
};
use crate::internal::ring::TxRing;
use crate::sync::CriticalSectionCell;

const CRLF: &[u8] = b"\r\n";

// =============================================================================
// Transport
// =============================================================================

/// DMA-driven UART transport.
///
/// Meant to live in a `static` so the interrupt handlers and the main loop
/// can reach it.
///
/// # Type Parameters
/// * `D` - TX DMA engine
/// * `R` - Circular RX capture
/// * `TX` - TX ring slots (usable capacity `TX - 1`)
/// * `STAGE` - Staging buffer size (largest single transfer)
/// * `LINE` - Longest inbound line kept
pub struct Transport<D, R, const TX: usize, const STAGE: usize, const LINE: usize> {
    ring: TxRing<TX>,
    dispatcher: CriticalSectionCell<TxDispatcher<D, STAGE>>,
    framer: CriticalSectionCell<RxFramer<R, LINE>>,
    slot: CriticalSectionCell<CommandSlot<LINE>>,
    producer_taken: CriticalSectionCell<bool>,
    config: TransportConfig,
    counters: Counters,
}

impl<D, R, const TX: usize, const STAGE: usize, const LINE: usize> Transport<D, R, TX, STAGE, LINE>
where
    D: TxDma,
    R: RxStream,
{
    /// Create a transport. Const-compatible, for `static` placement.
    ///
    /// # Panics
    ///
    /// If `config` does not pass [`TransportConfig::validate`]; in a `static`
    /// initializer this is a compile-time error.
    #[must_use]
    pub const fn new(tx: D, rx: R, config: TransportConfig) -> Self {
        assert!(config.validate().is_ok(), "invalid transport configuration");
        Self {
            ring: TxRing::new(),
            dispatcher: CriticalSectionCell::new(TxDispatcher::new(tx, config.stop_spin_limit)),
            framer: CriticalSectionCell::new(RxFramer::new(rx)),
            slot: CriticalSectionCell::new(CommandSlot::new()),
            producer_taken: CriticalSectionCell::new(false),
            config,
            counters: Counters::new(),
        }
    }

    /// Create a transport, rejecting an invalid configuration.
    pub fn try_new(tx: D, rx: R, config: TransportConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::new(tx, rx, config))
    }

    /// Runtime configuration
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    // =========================================================================
    // Task side
    // =========================================================================

    /// Acquire the single TX producer handle.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ProducerInUse`] while another handle is alive.
    pub fn producer(&self) -> ConfigResult<Producer<'_, D, R, TX, STAGE, LINE>> {
        let acquired = self.producer_taken.with(|taken| {
            if *taken {
                false
            } else {
                *taken = true;
                true
            }
        });

        if !acquired {
            return Err(ConfigError::ProducerInUse);
        }
        Ok(Producer { transport: self })
    }

    /// Copy the waiting line into `out` and clear it.
    ///
    /// # Errors
    ///
    /// - [`IoError::NoLine`] if nothing complete has arrived.
    /// - [`IoError::BufferTooSmall`] if the line is longer than `out`; the
    ///   line stays available for a retry with a larger buffer.
    pub fn poll_line(&self, out: &mut [u8]) -> IoResult<usize> {
        self.slot.with(|slot| slot.take_into(out))
    }

    /// Take the waiting line by value
    pub fn take_line(&self) -> Option<Vec<u8, LINE>> {
        self.slot.with(CommandSlot::take)
    }

    /// True if a complete line is waiting
    pub fn is_line_ready(&self) -> bool {
        self.slot.with_ref(CommandSlot::is_ready)
    }

    /// Start a transfer if the engine is idle and bytes are queued.
    ///
    /// Non-blocking and idempotent; call it from the main loop so queued
    /// bytes go out even if a kick was missed. Returns `true` if a transfer
    /// was started.
    pub fn background_task(&self) -> bool {
        self.kick()
    }

    /// Bytes queued in the TX ring and not yet staged
    pub fn tx_buffered(&self) -> usize {
        self.ring.available()
    }

    /// Bytes the TX ring can still accept
    pub fn tx_free(&self) -> usize {
        self.ring.free_space()
    }

    /// Current TX transfer state
    pub fn tx_state(&self) -> TransferState {
        self.dispatcher.with_ref(TxDispatcher::state)
    }

    /// Snapshot of the diagnostic counters
    pub fn statistics(&self) -> Statistics {
        self.counters.snapshot()
    }

    /// Run `f` with the TX engine (e.g. to reinitialise it after a stall).
    pub fn with_tx_engine<T>(&self, f: impl FnOnce(&mut D) -> T) -> T {
        self.dispatcher.with(|dispatcher| f(dispatcher.engine_mut()))
    }

    /// Run `f` with the RX capture stream.
    pub fn with_rx_stream<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        self.framer.with(|framer| f(framer.stream_mut()))
    }

    // =========================================================================
    // Interrupt side
    // =========================================================================

    /// TX transfer-complete interrupt handler.
    ///
    /// Returns `true` if the next transfer was armed.
    pub fn on_transfer_complete(&self) -> bool {
        self.dispatcher
            .with(|dispatcher| dispatcher.on_transfer_complete(&self.ring, &self.counters))
    }

    /// UART line-idle interrupt handler.
    ///
    /// Returns the number of captured bytes scanned.
    pub fn on_line_idle(&self) -> usize {
        self.framer.with(|framer| {
            self.slot
                .with(|slot| framer.on_line_idle(slot, &self.config, &self.counters))
        })
    }

    /// Per-byte receive handler for UARTs without RX DMA.
    pub fn on_rx_bytes(&self, bytes: &[u8]) {
        self.framer.with(|framer| {
            self.slot
                .with(|slot| framer.feed(bytes, slot, &self.config, &self.counters));
        });
    }

    fn kick(&self) -> bool {
        self.dispatcher
            .with(|dispatcher| dispatcher.kick(&self.ring, &self.counters))
    }
}

// =============================================================================
// Producer
// =============================================================================

/// Exclusive TX producer handle.
///
/// Only one exists per transport at a time, which makes the ring's write
/// index single-writer. Dropping the handle releases it.
///
/// Implements [`core::fmt::Write`], so `write!`/`writeln!` work directly.
/// `\n` is expanded to `\r\n` on that path unless disabled in the
/// configuration.
pub struct Producer<'a, D, R, const TX: usize, const STAGE: usize, const LINE: usize> {
    transport: &'a Transport<D, R, TX, STAGE, LINE>,
}

impl<D, R, const TX: usize, const STAGE: usize, const LINE: usize> Producer<'_, D, R, TX, STAGE, LINE>
where
    D: TxDma,
    R: RxStream,
{
    /// Queue raw bytes and start a transfer if the engine is idle.
    ///
    /// Never blocks. Bytes that do not fit are dropped and counted in
    /// [`Statistics::tx_dropped`]. Returns the number of bytes accepted.
    pub fn submit(&mut self, bytes: &[u8]) -> usize {
        let accepted = self.enqueue(bytes);
        self.transport.kick();
        accepted
    }

    /// Queue a string verbatim (no newline expansion)
    pub fn submit_str(&mut self, s: &str) -> usize {
        self.submit(s.as_bytes())
    }

    /// Format and queue `args` (with newline expansion if enabled).
    ///
    /// # Errors
    ///
    /// [`IoError::Overflow`] if any byte was dropped; whatever fit is still
    /// queued.
    pub fn write_formatted(&mut self, args: fmt::Arguments<'_>) -> IoResult<()> {
        fmt::Write::write_fmt(self, args).map_err(|_| IoError::Overflow)
    }

    /// Queue a hex dump: each byte as `0x..` followed by a space, then a
    /// line end.
    ///
    /// # Errors
    ///
    /// [`IoError::Overflow`] if any byte was dropped.
    pub fn write_hex(&mut self, bytes: &[u8]) -> IoResult<()> {
        use fmt::Write as _;

        for byte in bytes {
            write!(self, "{byte:#x} ").map_err(|_| IoError::Overflow)?;
        }
        self.write_str("\n").map_err(|_| IoError::Overflow)
    }

    /// Bytes queued in the TX ring and not yet staged
    pub fn tx_buffered(&self) -> usize {
        self.transport.tx_buffered()
    }

    /// Write each byte into the ring without kicking; returns the accepted
    /// count.
    fn enqueue(&mut self, bytes: &[u8]) -> usize {
        let mut accepted = 0;
        for &byte in bytes {
            if self.transport.ring.write_byte(byte) {
                accepted += 1;
            }
        }

        let dropped = bytes.len() - accepted;
        if dropped > 0 {
            bump(&self.transport.counters.tx_dropped, dropped as u32);
            #[cfg(feature = "defmt")]
            defmt::warn!("TX ring full, dropped {} bytes", dropped);
        }
        accepted
    }

    /// [`enqueue`](Self::enqueue) with `\n` expanded to `\r\n`; returns the
    /// dropped count.
    fn enqueue_translated(&mut self, bytes: &[u8]) -> usize {
        let mut dropped = 0;
        let mut rest = bytes;
        while let Some(pos) = rest.iter().position(|&b| b == LF) {
            dropped += pos - self.enqueue(&rest[..pos]);
            dropped += CRLF.len() - self.enqueue(CRLF);
            rest = &rest[pos + 1..];
        }
        dropped + rest.len() - self.enqueue(rest)
    }
}

impl<D, R, const TX: usize, const STAGE: usize, const LINE: usize> fmt::Write
    for Producer<'_, D, R, TX, STAGE, LINE>
where
    D: TxDma,
    R: RxStream,
{
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let dropped = if self.transport.config.translate_newlines {
            self.enqueue_translated(bytes)
        } else {
            bytes.len() - self.enqueue(bytes)
        };
        self.transport.kick();

        if dropped == 0 { Ok(()) } else { Err(fmt::Error) }
    }
}

impl<D, R, const TX: usize, const STAGE: usize, const LINE: usize> Drop
    for Producer<'_, D, R, TX, STAGE, LINE>
{
    fn drop(&mut self) {
        self.transport.producer_taken.with(|taken| *taken = false);
    }
}

// =============================================================================
// Type Aliases
// =============================================================================

/// Default transport: 256-slot ring, 256-byte staging, 64-byte lines
pub type TransportDefault<D, R> =
    Transport<D, R, DEFAULT_TX_RING_SIZE, DEFAULT_STAGING_SIZE, DEFAULT_LINE_SIZE>;

/// Small transport for memory-constrained parts
pub type TransportSmall<D, R> = Transport<D, R, 64, 64, 32>;

/// Large transport for chatty logging
pub type TransportLarge<D, R> = Transport<D, R, 1024, 512, 128>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;

    use core::fmt::Write;
    use std::vec::Vec as StdVec;

    use super::*;
    use crate::driver::config::OverwritePolicy;
    use crate::testing::{MockRxStream, MockTxDma};

    type TestTransport = Transport<MockTxDma, MockRxStream<32>, 64, 16, 16>;
    type TinyTransport = Transport<MockTxDma, MockRxStream<32>, 8, 8, 16>;

    fn transport() -> TestTransport {
        Transport::new(MockTxDma::new(), MockRxStream::new(), TransportConfig::new())
    }

    /// Complete transfers until the engine goes idle; returns everything sent.
    fn drain<const TX: usize, const STAGE: usize, const LINE: usize>(
        t: &Transport<MockTxDma, MockRxStream<32>, TX, STAGE, LINE>,
    ) -> StdVec<u8> {
        while t.with_tx_engine(|e| {
            let busy = e.busy;
            if busy {
                e.finish();
            }
            busy
        }) {
            t.on_transfer_complete();
        }
        t.with_tx_engine(|e| core::mem::take(&mut e.wire))
    }

    fn receive<const TX: usize, const STAGE: usize, const LINE: usize>(
        t: &Transport<MockTxDma, MockRxStream<32>, TX, STAGE, LINE>,
        bytes: &[u8],
    ) {
        t.with_rx_stream(|s| s.inject(bytes));
        t.on_line_idle();
    }

    #[test]
    fn submitted_bytes_reach_wire_in_order() {
        let t = transport();
        let mut p = t.producer().unwrap();
        assert_eq!(p.submit(b"hello "), 6);
        assert_eq!(p.submit_str("world"), 5);

        assert_eq!(drain(&t), b"hello world");
        assert_eq!(t.tx_state(), TransferState::Idle);
    }

    #[test]
    fn full_ring_drops_excess_bytes() {
        let t: TinyTransport =
            Transport::new(MockTxDma::new(), MockRxStream::new(), TransportConfig::new());
        let mut p = t.producer().unwrap();

        assert_eq!(p.submit(b"ABCDEFGHIJ"), 7);
        assert_eq!(t.statistics().tx_dropped, 3);
        assert_eq!(drain(&t), b"ABCDEFG");
    }

    #[test]
    fn only_one_producer_at_a_time() {
        let t = transport();
        let first = t.producer().unwrap();
        assert_eq!(t.producer().err(), Some(ConfigError::ProducerInUse));

        drop(first);
        assert!(t.producer().is_ok());
    }

    #[test]
    fn formatted_output_expands_newlines() {
        let t = transport();
        let mut p = t.producer().unwrap();
        p.write_formatted(format_args!("a\nb")).unwrap();
        assert_eq!(drain(&t), b"a\r\nb");

        writeln!(p, "x={}", 2 + 3).unwrap();
        assert_eq!(drain(&t), b"x=5\r\n");
    }

    #[test]
    fn raw_submit_never_expands_newlines() {
        let t = transport();
        let mut p = t.producer().unwrap();
        p.submit(b"a\nb");
        assert_eq!(drain(&t), b"a\nb");
    }

    #[test]
    fn newline_expansion_can_be_disabled() {
        let config = TransportConfig::new().with_newline_translation(false);
        let t: TestTransport = Transport::new(MockTxDma::new(), MockRxStream::new(), config);
        let mut p = t.producer().unwrap();
        write!(p, "a\nb").unwrap();
        assert_eq!(drain(&t), b"a\nb");
    }

    #[test]
    fn formatted_overflow_reports_error_but_keeps_accepted_bytes() {
        let t: TinyTransport =
            Transport::new(MockTxDma::new(), MockRxStream::new(), TransportConfig::new());
        let mut p = t.producer().unwrap();

        assert_eq!(p.write_formatted(format_args!("0123456789")), Err(IoError::Overflow));
        assert_eq!(drain(&t), b"0123456");
        assert_eq!(t.statistics().tx_dropped, 3);
    }

    #[test]
    fn hex_dump_format() {
        let t = transport();
        let mut p = t.producer().unwrap();
        p.write_hex(&[0x01, 0xab, 0x00]).unwrap();
        assert_eq!(drain(&t), b"0x1 0xab 0x0 \r\n");
    }

    #[test]
    fn bytes_queued_during_transfer_follow_on_completion() {
        let t = transport();
        let mut p = t.producer().unwrap();
        p.submit(b"abc");
        assert_eq!(t.tx_state(), TransferState::Active { len: 3 });

        p.submit(b"de");
        assert_eq!(t.tx_buffered(), 2);
        assert_eq!(p.tx_buffered(), 2);

        t.with_tx_engine(MockTxDma::finish);
        assert!(t.on_transfer_complete());
        assert_eq!(t.tx_state(), TransferState::Active { len: 2 });
        assert_eq!(drain(&t), b"abcde");
    }

    #[test]
    fn background_task_recovers_after_stall() {
        let config = TransportConfig::new().with_stop_spin_limit(4);
        let t: TestTransport = Transport::new(MockTxDma::new(), MockRxStream::new(), config);
        t.with_tx_engine(|e| {
            e.busy = true;
            e.stuck = true;
        });

        let mut p = t.producer().unwrap();
        assert_eq!(p.submit(b"late"), 4);
        assert_eq!(t.tx_state(), TransferState::Idle);
        assert_eq!(t.tx_buffered(), 4);
        assert_eq!(t.statistics().tx_engine_stalls, 1);

        t.with_tx_engine(|e| e.stuck = false);
        assert!(t.background_task());
        assert!(!t.background_task());
        assert_eq!(drain(&t), b"late");
    }

    #[test]
    fn background_task_without_work_is_noop() {
        let t = transport();
        assert!(!t.background_task());
        assert_eq!(t.with_tx_engine(|e| e.starts), 0);
    }

    #[test]
    fn line_round_trip_through_idle_interrupt() {
        let t = transport();
        assert!(!t.is_line_ready());

        receive(&t, b"led0 on\r\n");
        assert!(t.is_line_ready());

        let mut buf = [0u8; 16];
        assert_eq!(t.poll_line(&mut buf), Ok(7));
        assert_eq!(&buf[..7], b"led0 on");
        assert_eq!(t.poll_line(&mut buf), Err(IoError::NoLine));
    }

    #[test]
    fn small_buffer_leaves_line_for_retry() {
        let t = transport();
        receive(&t, b"status\n");

        let mut small = [0u8; 4];
        assert_eq!(t.poll_line(&mut small), Err(IoError::BufferTooSmall));
        assert!(t.is_line_ready());

        let mut exact = [0u8; 6];
        assert_eq!(t.poll_line(&mut exact), Ok(6));
        assert_eq!(&exact, b"status");
    }

    #[test]
    fn take_line_and_policy() {
        let config = TransportConfig::new().with_overwrite_policy(OverwritePolicy::KeepUnread);
        let t: TestTransport = Transport::new(MockTxDma::new(), MockRxStream::new(), config);

        receive(&t, b"one\rtwo\r");
        assert_eq!(t.take_line().unwrap().as_slice(), b"one");
        assert!(t.take_line().is_none());

        let stats = t.statistics();
        assert_eq!(stats.rx_lines, 2);
        assert_eq!(stats.lines_dropped, 1);
    }

    #[test]
    fn per_byte_receive_path() {
        let t = transport();
        t.on_rx_bytes(b"pi");
        t.on_rx_bytes(b"ng\n");
        assert_eq!(t.take_line().unwrap().as_slice(), b"ping");
        assert_eq!(t.statistics().rx_bytes, 5);
    }

    #[test]
    fn try_new_rejects_invalid_config() {
        let config = TransportConfig::new().with_terminators(b"");
        let result: ConfigResult<TestTransport> =
            Transport::try_new(MockTxDma::new(), MockRxStream::new(), config);
        assert_eq!(result.err(), Some(ConfigError::EmptyTerminatorSet));
    }

    #[test]
    fn tx_free_tracks_ring_space() {
        let t = transport();
        assert_eq!(t.tx_free(), 63);
        t.with_tx_engine(|e| {
            e.busy = true;
            e.stuck = true;
        });
        let mut p = t.producer().unwrap();
        p.submit(b"abc");
        assert_eq!(t.tx_free(), 60);
        assert!(t.config().translate_newlines);
    }
}
