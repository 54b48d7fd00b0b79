//! Core transport components.
//!
//! - [`config`] - Runtime configuration and builder
//! - [`error`] - Error types and result aliases
//! - [`dispatcher`] - TX state machine feeding the DMA engine
//! - [`framer`] - RX line framing and the command slot
//! - [`stats`] - Diagnostic counters
//! - [`transport`] - The façade tying them together
//!
//! # Example
//!
//! ```ignore
//! use ph_uart_dma::driver::{OverwritePolicy, TransportConfig, TransportSmall};
//!
//! let config = TransportConfig::new().with_overwrite_policy(OverwritePolicy::KeepUnread);
//! let uart: TransportSmall<_, _> = TransportSmall::try_new(tx, rx, config)?;
//! ```

// Submodules
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod framer;
pub mod stats;
pub mod transport;

// Re-exports for convenience
pub use config::{OverwritePolicy, TransportConfig};
pub use dispatcher::{TransferState, TxDispatcher};
pub use error::{ConfigError, ConfigResult, Error, IoError, IoResult, Result};
pub use framer::{CommandSlot, RxFramer, SlotOutcome};
pub use stats::Statistics;
pub use transport::{Producer, Transport, TransportDefault, TransportLarge, TransportSmall};
