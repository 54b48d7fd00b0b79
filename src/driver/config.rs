//! Configuration types for the UART DMA transport

use super::error::{ConfigError, ConfigResult};
use crate::internal::constants::{DEFAULT_STOP_SPIN_LIMIT, DEFAULT_TERMINATORS};

/// What the receive framer does when a line completes while the previous one
/// is still unread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OverwritePolicy {
    /// Replace the unread line with the new one (freshness over completeness)
    #[default]
    LatestWins,
    /// Keep the unread line and drop the new one
    KeepUnread,
}

/// Transport configuration
///
/// Buffer sizes are const generics on [`Transport`](crate::Transport); this
/// struct holds the runtime knobs.
///
/// # Example
///
/// ```ignore
/// let config = TransportConfig::new()
///     .with_terminators(b"\n")
///     .with_overwrite_policy(OverwritePolicy::KeepUnread);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransportConfig {
    /// Bytes that close an inbound line; any one of them is enough
    pub terminators: &'static [u8],
    /// Expand `\n` to `\r\n` on the formatted output path
    pub translate_newlines: bool,
    /// Unread-line policy for the command slot
    pub overwrite: OverwritePolicy,
    /// Iterations to wait for the TX engine to report idle after `stop()`
    pub stop_spin_limit: u32,
}

impl TransportConfig {
    /// Default configuration: CR or LF terminates, LF→CRLF on output, latest
    /// line wins.
    pub const DEFAULT: Self = Self {
        terminators: DEFAULT_TERMINATORS,
        translate_newlines: true,
        overwrite: OverwritePolicy::LatestWins,
        stop_spin_limit: DEFAULT_STOP_SPIN_LIMIT,
    };

    /// Create a new configuration with default values
    #[must_use]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Set the inbound line terminator set
    #[must_use]
    pub const fn with_terminators(mut self, terminators: &'static [u8]) -> Self {
        self.terminators = terminators;
        self
    }

    /// Enable or disable `\n` → `\r\n` expansion on the formatted path
    #[must_use]
    pub const fn with_newline_translation(mut self, enabled: bool) -> Self {
        self.translate_newlines = enabled;
        self
    }

    /// Set the unread-line policy
    #[must_use]
    pub const fn with_overwrite_policy(mut self, policy: OverwritePolicy) -> Self {
        self.overwrite = policy;
        self
    }

    /// Set the TX engine stop spin limit
    #[must_use]
    pub const fn with_stop_spin_limit(mut self, limit: u32) -> Self {
        self.stop_spin_limit = limit;
        self
    }

    /// Check that the configuration can work at all
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.terminators.is_empty() {
            return Err(ConfigError::EmptyTerminatorSet);
        }
        if self.stop_spin_limit == 0 {
            return Err(ConfigError::InvalidSpinLimit);
        }
        Ok(())
    }

    /// True if `byte` closes a line
    #[inline]
    pub fn is_terminator(&self, byte: u8) -> bool {
        self.terminators.contains(&byte)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new()
    }
}
