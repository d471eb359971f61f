//! Transmit power command

use core::convert::Infallible;

use crate::{Command, NoParameters, ToByteArray};

/// Power amplifier ramp time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RampTime {
    /// 10 µs
    Micros10 = 0x00,
    /// 20 µs
    Micros20 = 0x01,
    /// 40 µs
    Micros40 = 0x02,
    /// 80 µs
    Micros80 = 0x03,
    /// 200 µs
    Micros200 = 0x04,
    /// 800 µs
    Micros800 = 0x05,
    /// 1700 µs
    Micros1700 = 0x06,
    /// 3400 µs
    Micros3400 = 0x07,
}

/// Output power and ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxParams {
    /// Output power in dBm (-17..=14 on SX1261, -9..=22 on SX1262)
    pub power: i8,
    /// PA ramp time
    pub ramp_time: RampTime,
}

impl ToByteArray for TxParams {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.power as u8, self.ramp_time as u8])
    }
}

/// SetTxParams command (0x8E)
#[derive(Debug, Clone)]
pub struct SetTxParams {
    /// Power and ramp
    pub params: TxParams,
}

impl Command for SetTxParams {
    type IdType = u8;
    type CommandParameters = TxParams;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x8E
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.params
    }
}
