//! Driver error type
//!
//! HAL errors are collapsed into [`Error::Bus`] and [`Error::Pin`]; the
//! concrete HAL error carries no information the radio protocol can act on.

use core::fmt;

/// Errors returned by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A raw bus transfer failed
    Bus,
    /// Driving or sampling a digital line failed
    Pin,
    /// BUSY stayed high for longer than the configured [`WaitPolicy`](crate::WaitPolicy)
    DeviceNotResponding,
    /// A caller-supplied range, mask or value is outside what the device accepts
    InvalidArgument,
    /// The board does not provide the requested capability
    NotImplemented,
    /// Response bytes could not be decoded
    Deserialization,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bus => f.write_str("bus transfer failed"),
            Error::Pin => f.write_str("digital line access failed"),
            Error::DeviceNotResponding => f.write_str("device did not release BUSY"),
            Error::InvalidArgument => f.write_str("argument out of range"),
            Error::NotImplemented => f.write_str("capability not provided by this board"),
            Error::Deserialization => f.write_str("malformed response"),
        }
    }
}

impl core::error::Error for Error {}
