//! DIO2 / DIO3 control commands
//!
//! DIO2 can drive an RF switch and DIO3 can power a TCXO. Both are one-shot
//! board setup performed by the startup sequencer.

use core::convert::Infallible;

use crate::{Command, NoParameters, ToByteArray};

use super::operational::u24_be;

/// RF switch control on DIO2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RfSwitchConfig {
    /// DIO2 high in TX, low otherwise
    pub enable: bool,
}

impl ToByteArray for RfSwitchConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.enable as u8])
    }
}

/// SetDio2AsRfSwitchCtrl command (0x9D)
#[derive(Debug, Clone)]
pub struct SetDio2AsRfSwitchCtrl {
    /// RF switch configuration
    pub config: RfSwitchConfig,
}

impl Command for SetDio2AsRfSwitchCtrl {
    type IdType = u8;
    type CommandParameters = RfSwitchConfig;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x9D
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.config
    }
}

/// Voltage DIO3 supplies to the TCXO
///
/// VBAT has to be at least 200 mV above the selected level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TcxoVoltage {
    /// 1.6 V
    V1_6 = 0x00,
    /// 1.7 V
    V1_7 = 0x01,
    /// 1.8 V
    V1_8 = 0x02,
    /// 2.2 V
    V2_2 = 0x03,
    /// 2.4 V
    V2_4 = 0x04,
    /// 2.7 V
    V2_7 = 0x05,
    /// 3.0 V
    V3_0 = 0x06,
    /// 3.3 V
    V3_3 = 0x07,
}

/// TCXO control parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TcxoConfig {
    /// TCXO supply voltage
    pub voltage: TcxoVoltage,
    /// Start-up delay in steps of 15.625 µs (24 bits)
    pub delay: u32,
}

impl ToByteArray for TcxoConfig {
    type Error = Infallible;
    type Array = [u8; 4];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let mut bytes = [0u8; 4];
        bytes[0] = self.voltage as u8;
        u24_be(self.delay, &mut bytes[1..4]);
        Ok(bytes)
    }
}

/// SetDio3AsTcxoCtrl command (0x97)
///
/// # Important Notes
/// - The chip waits `delay` after powering the TCXO before using it
/// - Once set, only a reset returns DIO3 to normal use
/// - Flags XOSC_START_ERR if the TCXO was not running at power-up; clear it
///   after calibration
#[derive(Debug, Clone)]
pub struct SetDio3AsTcxoCtrl {
    /// TCXO configuration
    pub config: TcxoConfig,
}

impl Command for SetDio3AsTcxoCtrl {
    type IdType = u8;
    type CommandParameters = TcxoConfig;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x97
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.config
    }
}
