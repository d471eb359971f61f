//! Status and device error commands
//!
//! Every byte the chip shifts out while the host sends an opcode is a status
//! byte:
//! - Bit 7: reserved
//! - Bits 6:4: chip mode
//! - Bits 3:1: command status
//! - Bit 0: reserved

use core::convert::Infallible;

use regiface::FromByteArray;

use crate::{Command, NoParameters};

/// Chip mode as reported in the status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipMode {
    /// STDBY_RC
    StandbyRc,
    /// STDBY_XOSC
    StandbyXosc,
    /// Frequency synthesis
    Fs,
    /// Receiving
    Rx,
    /// Transmitting
    Tx,
    /// Unused code
    Other(u8),
}

impl From<u8> for ChipMode {
    fn from(value: u8) -> Self {
        match value {
            0x2 => Self::StandbyRc,
            0x3 => Self::StandbyXosc,
            0x4 => Self::Fs,
            0x5 => Self::Rx,
            0x6 => Self::Tx,
            other => Self::Other(other),
        }
    }
}

/// Outcome of the previous command as reported in the status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandStatus {
    /// Data is available to be read
    DataAvailable,
    /// Command timed out
    Timeout,
    /// Opcode or parameters not understood
    ProcessingError,
    /// Command understood but could not be executed
    ExecutionFailure,
    /// Transmission finished
    TxDone,
    /// Reserved or RFU code
    Other(u8),
}

impl From<u8> for CommandStatus {
    fn from(value: u8) -> Self {
        match value {
            0x2 => Self::DataAvailable,
            0x3 => Self::Timeout,
            0x4 => Self::ProcessingError,
            0x5 => Self::ExecutionFailure,
            0x6 => Self::TxDone,
            other => Self::Other(other),
        }
    }
}

/// Decoded status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    /// Chip mode
    pub mode: ChipMode,
    /// Previous command outcome
    pub cmd_status: CommandStatus,
}

impl From<u8> for Status {
    fn from(byte: u8) -> Self {
        Self {
            mode: ChipMode::from((byte >> 4) & 0x7),
            cmd_status: CommandStatus::from((byte >> 1) & 0x7),
        }
    }
}

impl FromByteArray for Status {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self::from(bytes[0]))
    }
}

/// GetStatus command (0xC0)
///
/// Also the command used to wake a sleeping chip.
#[derive(Debug, Clone)]
pub struct GetStatus;

impl Command for GetStatus {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = Status;

    fn id() -> Self::IdType {
        0xC0
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}

/// Device error flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceErrors {
    /// RC64k calibration failed
    pub rc64k_calib_err: bool,
    /// RC13M calibration failed
    pub rc13m_calib_err: bool,
    /// PLL calibration failed
    pub pll_calib_err: bool,
    /// ADC calibration failed
    pub adc_calib_err: bool,
    /// Image calibration failed
    pub img_calib_err: bool,
    /// Crystal oscillator failed to start (expected once with a TCXO)
    pub xosc_start_err: bool,
    /// PLL failed to lock
    pub pll_lock_err: bool,
    /// PA ramp failed
    pub pa_ramp_err: bool,
}

impl DeviceErrors {
    /// `true` when no flag is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<[u8; 2]> for DeviceErrors {
    fn from(bytes: [u8; 2]) -> Self {
        Self {
            rc64k_calib_err: bytes[1] & 0b1 != 0,
            rc13m_calib_err: bytes[1] & 0b10 != 0,
            pll_calib_err: bytes[1] & 0b100 != 0,
            adc_calib_err: bytes[1] & 0b1000 != 0,
            img_calib_err: bytes[1] & 0b1_0000 != 0,
            xosc_start_err: bytes[1] & 0b10_0000 != 0,
            pll_lock_err: bytes[1] & 0b100_0000 != 0,
            pa_ramp_err: bytes[0] & 0b1 != 0,
        }
    }
}

/// GetDeviceErrors response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetDeviceErrorsResponse {
    /// Status byte
    pub status: Status,
    /// Error flags
    pub errors: DeviceErrors,
}

impl FromByteArray for GetDeviceErrorsResponse {
    type Error = Infallible;
    type Array = [u8; 3];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            status: Status::from(bytes[0]),
            errors: DeviceErrors::from([bytes[1], bytes[2]]),
        })
    }
}

/// GetDeviceErrors command (0x17)
///
/// Flags stay set until `ClearDeviceErrors`.
#[derive(Debug, Clone)]
pub struct GetDeviceErrors;

impl Command for GetDeviceErrors {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = GetDeviceErrorsResponse;

    fn id() -> Self::IdType {
        0x17
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}

/// ClearDeviceErrors command (0x07)
#[derive(Debug, Clone)]
pub struct ClearDeviceErrors;

impl Command for ClearDeviceErrors {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x07
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}
