//! DMA-driven UART Transport
//!
//! A `no_std`, `no_alloc` serial transport for microcontrollers whose UART is
//! paired with DMA channels: one for transmission, one capturing received
//! bytes into a circular region.
//!
//! # Architecture
//!
//! ```text
//!   task ──submit──▶ TxRing ──kick──▶ TxDispatcher ──start──▶ TX DMA ──▶ wire
//!                      (lock-free)      (critical section)       │
//!                                             ▲                  │ transfer complete
//!                                             └──────────────────┘
//!
//!   wire ──▶ RX DMA (circular) ──line idle──▶ RxFramer ──▶ CommandSlot ──poll_line──▶ task
//! ```
//!
//! 1. **TX ring**: single-producer byte ring; writes never
//!    block and drop on overflow
//! 2. **Dispatcher** ([`driver::dispatcher`]): Idle/Active state machine that
//!    stages queued bytes and re-arms the engine from the completion interrupt
//! 3. **Framer** ([`driver::framer`]): splits captured bytes into lines on CR or
//!    LF and keeps the latest one in a one-deep slot
//! 4. **Transport** ([`Transport`]): the façade applications and interrupt
//!    handlers call
//!
//! Hardware access goes through the [`hal::TxDma`] and [`hal::RxStream`] traits.
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting for public types and trace/debug logging
//!
//! # Example
//!
//! ```ignore
//! use core::fmt::Write;
//! use ph_uart_dma::{TransportConfig, TransportDefault};
//!
//! static UART: TransportDefault<MyTx, MyRx> =
//!     TransportDefault::new(MyTx::new(), MyRx::new(), TransportConfig::new());
//!
//! let mut out = UART.producer()?;
//! writeln!(out, "boot ok").ok();
//!
//! let mut line = [0u8; 64];
//! loop {
//!     match UART.poll_line(&mut line) {
//!         Ok(len) => dispatch(&line[..len]),
//!         Err(IoError::NoLine) => {}
//!         Err(e) => writeln!(out, "rx: {}", e).ok(),
//!     }
//!     UART.background_task();
//! }
//! ```
//!
//! # Memory Requirements
//!
//! With the default sizes (256-slot ring, 256-byte staging, 64-byte lines)
//! a transport needs roughly 700 bytes plus the HAL's channel handles and the
//! RX capture region.

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; thresholds and config are in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions
)]

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod hal;
pub mod sync;

// Internal implementation details (pub(crate) only)
pub(crate) mod internal;

#[cfg(test)]
pub(crate) mod testing;

/// Default sizes and framing constants
pub mod constants {
    pub use crate::internal::constants::*;
}

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::{
    ConfigError, ConfigResult, Error, IoError, IoResult, OverwritePolicy, Producer, Result,
    Statistics, TransferState, Transport, TransportConfig, TransportDefault, TransportLarge,
    TransportSmall,
};
pub use hal::{RxStream, TxDma};
