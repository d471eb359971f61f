//! RF front end registers

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Random number register (address: 0x0819)
///
/// Four bytes of noise sampled from the RX chain. Only meaningful while the
/// receiver is running.
#[register(0x0819u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RandomNumber {
    /// Sampled value
    pub value: u32,
}

/// Over-current protection register (address: 0x08E7)
///
/// Rewritten by the chip on every SetPaConfig.
#[register(0x08E7u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OcpConfiguration {
    /// Current limit in steps of 2.5 mA
    pub threshold: u8,
}

impl OcpConfiguration {
    /// Reset value on the SX1261 (60 mA).
    pub const SX1261_DEFAULT: Self = Self { threshold: 0x18 };
    /// Reset value on the SX1262 (140 mA).
    pub const SX1262_DEFAULT: Self = Self { threshold: 0x38 };
}

impl FromByteArray for RandomNumber {
    type Error = Infallible;
    type Array = [u8; 4];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            value: u32::from_be_bytes(bytes),
        })
    }
}

impl FromByteArray for OcpConfiguration {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            threshold: bytes[0],
        })
    }
}

impl ToByteArray for OcpConfiguration {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.threshold])
    }
}
