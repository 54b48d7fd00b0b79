//! Hardware Abstraction Layer
//!
//! Traits describing the two DMA channels the transport drives. Implement
//! them on top of your HAL's UART/DMA registers; the transport never touches
//! hardware directly.
//!
//! # Modules
//!
//! - [`dma`]: TX engine and circular RX capture traits
//!
//! # Interrupt Wiring
//!
//! The transport exposes one entry point per interrupt source:
//!
//! - DMA transfer-complete → [`Transport::on_transfer_complete`](crate::Transport::on_transfer_complete)
//! - UART line-idle → [`Transport::on_line_idle`](crate::Transport::on_line_idle)
//!
//! Give the two interrupts distinct, non-nesting priorities.

pub mod dma;

// Re-export commonly used types
pub use dma::{RxStream, TxDma};
