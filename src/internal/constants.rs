//! Centralized Constants
//!
//! Single source of truth for the buffer sizes and limits used throughout the
//! transport.
//!
//! # Organization
//!
//! - **Buffer sizes**: ring, staging and line capacities
//! - **Framing**: default line terminators
//! - **Timing**: bounded spin limits

// =============================================================================
// Buffer Sizes
// =============================================================================

/// Default TX ring slot count (usable capacity is one less)
pub const DEFAULT_TX_RING_SIZE: usize = 256;

/// Default staging buffer size (one DMA transfer at most)
pub const DEFAULT_STAGING_SIZE: usize = 256;

/// Default maximum received line length in bytes
pub const DEFAULT_LINE_SIZE: usize = 64;

/// Typical circular RX capture region size
pub const DEFAULT_RX_REGION_SIZE: usize = 128;

// =============================================================================
// Framing
// =============================================================================

/// Carriage return
pub const CR: u8 = b'\r';

/// Line feed
pub const LF: u8 = b'\n';

/// Default inbound line terminators (either byte closes a line)
pub const DEFAULT_TERMINATORS: &[u8] = b"\r\n";

// =============================================================================
// Timing
// =============================================================================

/// Maximum iterations waiting for the TX engine to report idle after `stop()`
pub const DEFAULT_STOP_SPIN_LIMIT: u32 = 100_000;
