//! Clock and oscillator registers

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

use crate::Error;

/// RTC control register (address: 0x0902)
///
/// Stopping the RTC is part of the implicit-header RX timeout workaround.
#[register(0x0902u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RtcControl {
    /// RTC running
    pub enabled: bool,
}

/// XTA trim register (address: 0x0911)
///
/// # Important Notes
/// - Only writable in STDBY_XOSC; earlier writes are overwritten
/// - Set to 0x2F by the chip when DIO3 drives a TCXO
/// - Values above 0x2F are written as 0x2F; use [`XtaTrim::new`] to reject
///   them instead. Reads return the raw register value.
#[register(0x0911u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct XtaTrim {
    /// Load capacitance, 11.3 pF + value * 0.47 pF, at most 0x2F
    pub value: u8,
}

impl Default for XtaTrim {
    fn default() -> Self {
        Self { value: 0x05 }
    }
}

/// XTB trim register (address: 0x0912)
///
/// Same layout, constraints and clamping as [`XtaTrim`]. Unused with a TCXO.
#[register(0x0912u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct XtbTrim {
    /// Load capacitance, 11.3 pF + value * 0.47 pF, at most 0x2F
    pub value: u8,
}

impl Default for XtbTrim {
    fn default() -> Self {
        Self { value: 0x05 }
    }
}

/// Largest load capacitance setting of either trim register.
pub const TRIM_MAX: u8 = 0x2F;

fn check_trim(value: u8) -> Result<u8, Error> {
    if value > TRIM_MAX {
        return Err(Error::InvalidArgument);
    }
    Ok(value)
}

impl XtaTrim {
    /// # Errors
    /// * [`Error::InvalidArgument`] - `value` is above [`TRIM_MAX`]
    pub fn new(value: u8) -> Result<Self, Error> {
        check_trim(value).map(|value| Self { value })
    }
}

impl XtbTrim {
    /// # Errors
    /// * [`Error::InvalidArgument`] - `value` is above [`TRIM_MAX`]
    pub fn new(value: u8) -> Result<Self, Error> {
        check_trim(value).map(|value| Self { value })
    }
}

impl FromByteArray for RtcControl {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            enabled: bytes[0] & 0x01 != 0,
        })
    }
}

impl ToByteArray for RtcControl {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.enabled as u8])
    }
}

impl FromByteArray for XtaTrim {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            value: bytes[0],
        })
    }
}

impl ToByteArray for XtaTrim {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.value.min(TRIM_MAX)])
    }
}

impl FromByteArray for XtbTrim {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            value: bytes[0],
        })
    }
}

impl ToByteArray for XtbTrim {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.value.min(TRIM_MAX)])
    }
}
