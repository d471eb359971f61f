//! Driver configuration

use crate::WaitPolicy;

/// Timing knobs that are not board facts.
///
/// Board facts (TCXO wake-up time and voltage, device model) live on
/// [`Board`](crate::Board).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// BUSY polling schedule used by every transaction
    pub wait: WaitPolicy,
    /// How long NRESET is held low, in milliseconds
    pub reset_pulse_ms: u32,
    /// How long to wait after releasing NRESET, in milliseconds
    pub reset_settle_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wait: WaitPolicy::default(),
            reset_pulse_ms: 10,
            reset_settle_ms: 10,
        }
    }
}
