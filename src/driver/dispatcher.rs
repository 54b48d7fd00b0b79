//! TX dispatcher: drains the ring into the staging buffer and arms the engine.
//!
//! # State Machine
//!
//! ```text
//!            kick (ring non-empty)
//!   Idle ───────────────────────────▶ Active { len }
//!    ▲                                   │
//!    │   transfer complete, ring empty   │ transfer complete,
//!    └───────────────────────────────────┤ ring non-empty
//!                                        ▼
//!                                 Active { len' }
//! ```
//!
//! Every method that mutates the dispatcher runs inside the transport's
//! critical section, so the ring's read index has a single logical writer no
//! matter which context (task kick, background task, completion interrupt)
//! got there first.

use super::stats::{Counters, bump};
use crate::hal::TxDma;
use crate::internal::ring::TxRing;

/// Transfer state of the TX engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferState {
    /// No transfer in flight
    #[default]
    Idle,
    /// Engine is reading `len` bytes from the staging buffer
    Active {
        /// Bytes in flight
        len: usize,
    },
}

impl TransferState {
    /// True while a transfer is in flight
    #[inline(always)]
    pub const fn is_active(&self) -> bool {
        matches!(self, TransferState::Active { .. })
    }

    /// Bytes in flight (zero when idle)
    #[inline(always)]
    pub const fn in_flight(&self) -> usize {
        match self {
            TransferState::Idle => 0,
            TransferState::Active { len } => *len,
        }
    }
}

/// TX dispatcher owning the engine and its staging buffer.
///
/// # Type Parameters
/// * `D` - TX DMA engine
/// * `STAGE` - Staging buffer size; the most bytes a single transfer carries
pub struct TxDispatcher<D, const STAGE: usize> {
    engine: D,
    staging: [u8; STAGE],
    state: TransferState,
    stop_spin_limit: u32,
}

impl<D: TxDma, const STAGE: usize> TxDispatcher<D, STAGE> {
    /// Create an idle dispatcher. Const-compatible.
    #[must_use]
    pub const fn new(engine: D, stop_spin_limit: u32) -> Self {
        assert!(STAGE > 0, "staging buffer must hold at least one byte");
        Self {
            engine,
            staging: [0u8; STAGE],
            state: TransferState::Idle,
            stop_spin_limit,
        }
    }

    /// Current transfer state
    #[inline(always)]
    pub fn state(&self) -> TransferState {
        self.state
    }

    /// The engine
    pub fn engine(&self) -> &D {
        &self.engine
    }

    /// The engine, mutably
    pub fn engine_mut(&mut self) -> &mut D {
        &mut self.engine
    }

    /// Bytes the engine is currently reading (empty when idle)
    pub fn in_flight(&self) -> &[u8] {
        &self.staging[..self.state.in_flight()]
    }

    /// Idle → Active transition.
    ///
    /// Does nothing if a transfer is already in flight or the ring is empty.
    /// Returns `true` if a transfer was started.
    pub(crate) fn kick<const N: usize>(&mut self, ring: &TxRing<N>, counters: &Counters) -> bool {
        if self.state.is_active() || ring.is_empty() {
            return false;
        }

        if !self.halt_engine() {
            bump(&counters.tx_engine_stalls, 1);
            #[cfg(feature = "defmt")]
            defmt::error!(
                "TX engine still busy after stop; {} bytes left queued",
                ring.available()
            );
            return false;
        }

        let len = ring.copy_unread(&mut self.staging);
        ring.consume(len);

        self.engine.start(&self.staging[..len]);
        self.state = TransferState::Active { len };
        bump(&counters.tx_transfers, 1);
        bump(&counters.tx_bytes, len as u32);

        #[cfg(feature = "defmt")]
        defmt::trace!("TX armed: {} bytes, {} still queued", len, ring.available());

        true
    }

    /// Active → Idle transition, followed by an immediate re-kick.
    ///
    /// Called from the transfer-complete interrupt. Returns `true` if a new
    /// transfer was armed before returning.
    pub(crate) fn on_transfer_complete<const N: usize>(
        &mut self,
        ring: &TxRing<N>,
        counters: &Counters,
    ) -> bool {
        self.engine.acknowledge_complete();
        self.engine.stop();

        #[cfg(feature = "defmt")]
        {
            if let TransferState::Active { len } = self.state {
                defmt::trace!("TX complete: {} bytes", len);
            }
        }

        self.state = TransferState::Idle;
        self.kick(ring, counters)
    }

    /// Stop the engine and wait, bounded, for it to report idle.
    fn halt_engine(&mut self) -> bool {
        self.engine.stop();
        for _ in 0..self.stop_spin_limit {
            if !self.engine.is_busy() {
                return true;
            }
            core::hint::spin_loop();
        }
        !self.engine.is_busy()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTxDma;

    fn queue<const N: usize>(ring: &TxRing<N>, bytes: &[u8]) {
        for &b in bytes {
            assert!(ring.write_byte(b));
        }
    }

    #[test]
    fn transfer_state_helpers() {
        assert!(!TransferState::Idle.is_active());
        assert_eq!(TransferState::Idle.in_flight(), 0);
        assert!(TransferState::Active { len: 3 }.is_active());
        assert_eq!(TransferState::Active { len: 3 }.in_flight(), 3);
    }

    #[test]
    fn kick_with_empty_ring_stays_idle() {
        let ring: TxRing<8> = TxRing::new();
        let counters = Counters::new();
        let mut dispatcher: TxDispatcher<MockTxDma, 8> = TxDispatcher::new(MockTxDma::new(), 10);

        assert!(!dispatcher.kick(&ring, &counters));
        assert_eq!(dispatcher.state(), TransferState::Idle);
        assert_eq!(dispatcher.engine().starts, 0);
    }

    #[test]
    fn kick_moves_queued_bytes_into_staging() {
        let ring: TxRing<8> = TxRing::new();
        let counters = Counters::new();
        let mut dispatcher: TxDispatcher<MockTxDma, 8> = TxDispatcher::new(MockTxDma::new(), 10);
        queue(&ring, b"hello");

        assert!(dispatcher.kick(&ring, &counters));
        assert_eq!(dispatcher.state(), TransferState::Active { len: 5 });
        assert_eq!(dispatcher.in_flight(), b"hello");
        assert_eq!(dispatcher.engine().in_flight, b"hello");
        assert!(ring.is_empty());

        let stats = counters.snapshot();
        assert_eq!(stats.tx_transfers, 1);
        assert_eq!(stats.tx_bytes, 5);
    }

    #[test]
    fn kick_while_active_is_ignored() {
        let ring: TxRing<8> = TxRing::new();
        let counters = Counters::new();
        let mut dispatcher: TxDispatcher<MockTxDma, 8> = TxDispatcher::new(MockTxDma::new(), 10);
        queue(&ring, b"ab");
        assert!(dispatcher.kick(&ring, &counters));

        queue(&ring, b"cd");
        assert!(!dispatcher.kick(&ring, &counters));
        assert_eq!(dispatcher.engine().starts, 1);
        assert_eq!(ring.available(), 2);
    }

    #[test]
    fn staging_smaller_than_backlog_sends_in_chunks() {
        let ring: TxRing<16> = TxRing::new();
        let counters = Counters::new();
        let mut dispatcher: TxDispatcher<MockTxDma, 4> = TxDispatcher::new(MockTxDma::new(), 10);
        queue(&ring, b"0123456789");

        assert!(dispatcher.kick(&ring, &counters));
        assert_eq!(dispatcher.in_flight(), b"0123");
        assert_eq!(ring.available(), 6);

        dispatcher.engine_mut().finish();
        assert!(dispatcher.on_transfer_complete(&ring, &counters));
        assert_eq!(dispatcher.in_flight(), b"4567");

        dispatcher.engine_mut().finish();
        assert!(dispatcher.on_transfer_complete(&ring, &counters));
        assert_eq!(dispatcher.in_flight(), b"89");

        dispatcher.engine_mut().finish();
        assert!(!dispatcher.on_transfer_complete(&ring, &counters));
        assert_eq!(dispatcher.state(), TransferState::Idle);
        assert_eq!(dispatcher.engine().wire, b"0123456789");
    }

    #[test]
    fn completion_rearms_with_bytes_queued_during_transfer() {
        let ring: TxRing<8> = TxRing::new();
        let counters = Counters::new();
        let mut dispatcher: TxDispatcher<MockTxDma, 8> = TxDispatcher::new(MockTxDma::new(), 10);
        queue(&ring, b"abc");
        dispatcher.kick(&ring, &counters);

        queue(&ring, b"de");
        dispatcher.engine_mut().finish();
        assert!(dispatcher.on_transfer_complete(&ring, &counters));
        assert_eq!(dispatcher.state(), TransferState::Active { len: 2 });
        assert_eq!(dispatcher.engine().acks, 1);
    }

    #[test]
    fn completion_while_idle_only_acknowledges() {
        let ring: TxRing<8> = TxRing::new();
        let counters = Counters::new();
        let mut dispatcher: TxDispatcher<MockTxDma, 8> = TxDispatcher::new(MockTxDma::new(), 10);

        assert!(!dispatcher.on_transfer_complete(&ring, &counters));
        assert_eq!(dispatcher.engine().acks, 1);
        assert_eq!(dispatcher.state(), TransferState::Idle);
    }

    #[test]
    fn stalled_engine_leaves_bytes_queued() {
        let ring: TxRing<8> = TxRing::new();
        let counters = Counters::new();
        let mut engine = MockTxDma::new();
        engine.busy = true;
        engine.stuck = true;
        let mut dispatcher: TxDispatcher<MockTxDma, 8> = TxDispatcher::new(engine, 3);
        queue(&ring, b"xyz");

        assert!(!dispatcher.kick(&ring, &counters));
        assert_eq!(dispatcher.state(), TransferState::Idle);
        assert_eq!(ring.available(), 3);
        assert_eq!(counters.snapshot().tx_engine_stalls, 1);

        dispatcher.engine_mut().stuck = false;
        assert!(dispatcher.kick(&ring, &counters));
        assert_eq!(dispatcher.in_flight(), b"xyz");
    }

    #[test]
    fn wrapped_ring_region_is_sent_contiguously() {
        let ring: TxRing<8> = TxRing::new();
        let counters = Counters::new();
        let mut dispatcher: TxDispatcher<MockTxDma, 8> = TxDispatcher::new(MockTxDma::new(), 10);

        queue(&ring, b"123456");
        dispatcher.kick(&ring, &counters);
        dispatcher.engine_mut().finish();
        dispatcher.on_transfer_complete(&ring, &counters);

        queue(&ring, b"abcdef");
        assert!(dispatcher.kick(&ring, &counters));
        assert_eq!(dispatcher.in_flight(), b"abcdef");
    }
}
