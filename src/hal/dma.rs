//! DMA channel traits
//!
//! [`TxDma`] is a one-shot memory-to-peripheral channel (normal mode with a
//! transfer-complete interrupt). [`RxStream`] is a peripheral-to-memory channel
//! running in circular mode over a fixed region, paired with the UART's
//! line-idle interrupt.

// =============================================================================
// TX Engine
// =============================================================================

/// Memory-to-peripheral DMA channel used for transmission.
///
/// # Buffer Contract
///
/// [`start`](TxDma::start) receives the dispatcher's staging buffer. The
/// dispatcher does not write to that buffer again until the completion
/// interrupt has been handled, so an implementation may program the slice's
/// address into the channel and let the hardware read it in the background.
/// The transport itself must not move while a transfer is active, which holds
/// for the usual `static` placement.
pub trait TxDma {
    /// Program source address and length, then enable the channel.
    fn start(&mut self, data: &[u8]);

    /// Disable the channel.
    fn stop(&mut self);

    /// True while the channel is still enabled (e.g. the EN bit reads back set)
    fn is_busy(&self) -> bool;

    /// Clear the transfer-complete flag.
    fn acknowledge_complete(&mut self);
}

// =============================================================================
// RX Capture
// =============================================================================

/// Peripheral-to-memory DMA channel capturing into a circular region.
///
/// The hardware writes incoming bytes into the region without CPU
/// involvement and wraps at the end.
pub trait RxStream {
    /// Size of the circular capture region in bytes.
    fn capacity(&self) -> usize;

    /// Offset of the next byte the hardware will write, in `0..capacity()`.
    ///
    /// On STM32-style channels this is `capacity() - NDTR`.
    fn write_position(&self) -> usize;

    /// Read the captured byte at `index` (`index < capacity()`).
    ///
    /// Implementations backed by DMA memory should use a volatile read.
    fn read_byte(&self, index: usize) -> u8;

    /// Clear the line-idle flag (status read followed by data read on most
    /// UARTs).
    fn acknowledge_idle(&mut self);
}

impl<T: TxDma + ?Sized> TxDma for &mut T {
    fn start(&mut self, data: &[u8]) {
        (**self).start(data);
    }

    fn stop(&mut self) {
        (**self).stop();
    }

    fn is_busy(&self) -> bool {
        (**self).is_busy()
    }

    fn acknowledge_complete(&mut self) {
        (**self).acknowledge_complete();
    }
}

impl<T: RxStream + ?Sized> RxStream for &mut T {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn write_position(&self) -> usize {
        (**self).write_position()
    }

    fn read_byte(&self, index: usize) -> u8 {
        (**self).read_byte(index)
    }

    fn acknowledge_idle(&mut self) {
        (**self).acknowledge_idle();
    }
}
