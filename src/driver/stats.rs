//! Diagnostic counters.
//!
//! Every counter has exactly one writer context, so increments are a plain
//! load followed by a store. No read-modify-write atomics are needed, which
//! keeps this usable on cores without CAS.
//!
//! | Counter             | Writer                         |
//! |---------------------|--------------------------------|
//! | `tx_dropped`        | producer (task)                |
//! | `tx_bytes`          | dispatcher (critical section)  |
//! | `tx_transfers`      | dispatcher (critical section)  |
//! | `tx_engine_stalls`  | dispatcher (critical section)  |
//! | `rx_bytes`          | framer (line-idle interrupt)   |
//! | `rx_lines`          | framer                         |
//! | `rx_truncated`      | framer                         |
//! | `lines_overwritten` | framer                         |
//! | `lines_dropped`     | framer                         |

use core::sync::atomic::{AtomicU32, Ordering};

/// Snapshot of the transport counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Statistics {
    /// Bytes dropped because the TX ring was full
    pub tx_dropped: u32,
    /// Bytes handed to the TX engine
    pub tx_bytes: u32,
    /// TX transfers started
    pub tx_transfers: u32,
    /// Times the TX engine stayed busy after `stop()`
    pub tx_engine_stalls: u32,
    /// Bytes scanned by the receive framer
    pub rx_bytes: u32,
    /// Complete lines framed (including ones later overwritten or dropped)
    pub rx_lines: u32,
    /// Lines that lost bytes to a full accumulator
    pub rx_truncated: u32,
    /// Unread lines replaced by a newer one
    pub lines_overwritten: u32,
    /// New lines discarded because an unread one was kept
    pub lines_dropped: u32,
}

/// Live counters shared between contexts.
pub(crate) struct Counters {
    pub(crate) tx_dropped: AtomicU32,
    pub(crate) tx_bytes: AtomicU32,
    pub(crate) tx_transfers: AtomicU32,
    pub(crate) tx_engine_stalls: AtomicU32,
    pub(crate) rx_bytes: AtomicU32,
    pub(crate) rx_lines: AtomicU32,
    pub(crate) rx_truncated: AtomicU32,
    pub(crate) lines_overwritten: AtomicU32,
    pub(crate) lines_dropped: AtomicU32,
}

impl Counters {
    pub(crate) const fn new() -> Self {
        Self {
            tx_dropped: AtomicU32::new(0),
            tx_bytes: AtomicU32::new(0),
            tx_transfers: AtomicU32::new(0),
            tx_engine_stalls: AtomicU32::new(0),
            rx_bytes: AtomicU32::new(0),
            rx_lines: AtomicU32::new(0),
            rx_truncated: AtomicU32::new(0),
            lines_overwritten: AtomicU32::new(0),
            lines_dropped: AtomicU32::new(0),
        }
    }

    pub(crate) fn snapshot(&self) -> Statistics {
        Statistics {
            tx_dropped: self.tx_dropped.load(Ordering::Relaxed),
            tx_bytes: self.tx_bytes.load(Ordering::Relaxed),
            tx_transfers: self.tx_transfers.load(Ordering::Relaxed),
            tx_engine_stalls: self.tx_engine_stalls.load(Ordering::Relaxed),
            rx_bytes: self.rx_bytes.load(Ordering::Relaxed),
            rx_lines: self.rx_lines.load(Ordering::Relaxed),
            rx_truncated: self.rx_truncated.load(Ordering::Relaxed),
            lines_overwritten: self.lines_overwritten.load(Ordering::Relaxed),
            lines_dropped: self.lines_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Single-writer wrapping increment.
#[inline]
pub(crate) fn bump(counter: &AtomicU32, by: u32) {
    let value = counter.load(Ordering::Relaxed);
    counter.store(value.wrapping_add(by), Ordering::Relaxed);
}
