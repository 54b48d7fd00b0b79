//! Lock-free byte ring feeding the TX dispatcher.
//!
//! # Index Discipline
//!
//! - Only the producer advances `write` ([`TxRing::write_byte`]).
//! - Only the consumer advances `read` ([`TxRing::consume`]).
//!
//! One slot is sacrificed to tell empty from full, so the usable capacity is
//! `N - 1`. Index words are only ever loaded and stored, never
//! read-modify-written, which keeps the ring usable on cores without CAS.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Fixed-capacity SPSC byte ring.
pub struct TxRing<const N: usize> {
    storage: UnsafeCell<[u8; N]>,
    /// Next slot the producer fills
    write: AtomicUsize,
    /// Next slot the consumer drains
    read: AtomicUsize,
}

// SAFETY: the producer only writes the slot at `write` before publishing it
// with a Release store, and the consumer only reads slots in `read..write`
// after an Acquire load. Each index has exactly one writer.
unsafe impl<const N: usize> Sync for TxRing<N> {}

impl<const N: usize> TxRing<N> {
    /// Create an empty ring. Const-compatible.
    ///
    /// # Panics
    ///
    /// Compile-time assertion: `N` must be at least 2.
    #[must_use]
    pub const fn new() -> Self {
        assert!(N >= 2, "TX ring must have at least 2 slots (1 usable)");
        Self {
            storage: UnsafeCell::new([0u8; N]),
            write: AtomicUsize::new(0),
            read: AtomicUsize::new(0),
        }
    }

    /// Usable capacity (`N - 1`)
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Append one byte (producer side).
    ///
    /// Returns `false` and leaves the ring untouched when it is full.
    pub fn write_byte(&self, byte: u8) -> bool {
        let write = self.write.load(Ordering::Relaxed);
        let next = (write + 1) % N;
        if next == self.read.load(Ordering::Acquire) {
            return false;
        }

        // SAFETY: sole producer; `next != read` means the consumer is not
        // looking at slot `write`.
        unsafe {
            self.storage.get().cast::<u8>().add(write).write(byte);
        }
        self.write.store(next, Ordering::Release);
        true
    }

    /// Number of unread bytes. A snapshot; either side may move it.
    pub fn available(&self) -> usize {
        let write = self.write.load(Ordering::Acquire);
        let read = self.read.load(Ordering::Acquire);
        (write + N - read) % N
    }

    /// Bytes that can still be written before the ring reports full.
    pub fn free_space(&self) -> usize {
        self.capacity() - self.available()
    }

    /// True when there is nothing to drain
    pub fn is_empty(&self) -> bool {
        self.write.load(Ordering::Acquire) == self.read.load(Ordering::Acquire)
    }

    /// True when the next `write_byte` would fail
    pub fn is_full(&self) -> bool {
        let write = self.write.load(Ordering::Acquire);
        (write + 1) % N == self.read.load(Ordering::Acquire)
    }

    /// Copy up to `dst.len()` unread bytes into `dst` without consuming them
    /// (consumer side).
    ///
    /// The unread region may wrap past the end of storage, in which case the
    /// copy is done in two passes so `dst` always receives one contiguous run.
    pub fn copy_unread(&self, dst: &mut [u8]) -> usize {
        let read = self.read.load(Ordering::Relaxed);
        let write = self.write.load(Ordering::Acquire);
        let unread = (write + N - read) % N;
        let len = unread.min(dst.len());
        if len == 0 {
            return 0;
        }

        // Raw copies only: the producer may be filling other slots meanwhile.
        let base = self.storage.get().cast::<u8>().cast_const();
        let first = len.min(N - read);
        // SAFETY: sole consumer; slots in `read..read+len` were published by
        // the producer's Release store observed above and will not be reused
        // until `read` moves past them. `first <= N - read` and
        // `len - first <= read` keep both runs inside storage.
        unsafe {
            core::ptr::copy_nonoverlapping(base.add(read), dst.as_mut_ptr(), first);
            if len > first {
                core::ptr::copy_nonoverlapping(base, dst.as_mut_ptr().add(first), len - first);
            }
        }
        len
    }

    /// Release `n` bytes back to the producer (consumer side).
    ///
    /// `n` is clamped to the unread count.
    pub fn consume(&self, n: usize) {
        let read = self.read.load(Ordering::Relaxed);
        let n = n.min(self.available());
        self.read.store((read + n) % N, Ordering::Release);
    }
}

impl<const N: usize> Default for TxRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
