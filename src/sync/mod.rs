//! Critical-section primitives shared by the transport's interrupt paths.
//!
//! The dispatcher, the framer and the command slot each live in a
//! [`CriticalSectionCell`]. The TX ring does not: its producer side is
//! lock-free and only the consumer side runs under the dispatcher's cell.
//!
//! # Example
//!
//! ```ignore
//! use ph_uart_dma::sync::CriticalSectionCell;
//!
//! static RX_OVERRUNS: CriticalSectionCell<u32> = CriticalSectionCell::new(0);
//!
//! #[interrupt]
//! fn USART1() {
//!     RX_OVERRUNS.with(|n| *n += 1);
//! }
//! ```

mod primitives;

pub use primitives::CriticalSectionCell;
