//! Error types for the UART DMA transport
//!
//! Errors are organized by domain:
//! - [`ConfigError`]: Configuration and handle acquisition failures
//! - [`IoError`]: Task-side TX/RX failures
//!
//! The unified [`Error`] enum wraps both.
//!
//! Flow-control degradations inside the interrupt paths (ring overflow,
//! accumulator truncation, line overwrite) are not errors: they are counted
//! in [`Statistics`](crate::Statistics) and the transport keeps running.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and setup errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// No line terminator configured; no line could ever complete
    EmptyTerminatorSet,
    /// Stop spin limit of zero would never let a transfer start
    InvalidSpinLimit,
    /// A [`Producer`](crate::Producer) handle is already live
    ProducerInUse,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::EmptyTerminatorSet => "empty line terminator set",
            ConfigError::InvalidSpinLimit => "invalid stop spin limit",
            ConfigError::ProducerInUse => "producer already in use",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Task-side TX/RX errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// No complete line is waiting
    NoLine,
    /// A line is waiting but does not fit the caller's buffer; it stays queued
    BufferTooSmall,
    /// TX ring full; some bytes were dropped
    Overflow,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::NoLine => "no line ready",
            IoError::BufferTooSmall => "buffer too small for line",
            IoError::Overflow => "transmit ring overflow",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// ```ignore
/// match transport.poll_line(&mut buf) {
///     Ok(len) => handle(&buf[..len]),
///     Err(IoError::NoLine) => {}
///     Err(IoError::BufferTooSmall) => { /* retry with a larger buffer */ }
///     Err(_) => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// I/O error
    Io(IoError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

/// Result type alias for transport operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for I/O operations
pub type IoResult<T> = core::result::Result<T, IoError>;

// =============================================================================
// Unit Tests
// =============================================================================
