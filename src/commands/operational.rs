//! Operating mode and calibration commands
//!
//! Every command here moves the chip between states of its internal state
//! machine (sleep, the two standby flavours, FS, TX, RX, RX duty cycle and
//! CAD) or runs calibration. The driver-side mirror of that state machine is
//! [`OperatingMode`](crate::OperatingMode); the `Device::set_*` helpers keep
//! the two in step.

use bitflags::bitflags;
use core::convert::Infallible;

use crate::{Command, Error, NoParameters, ToByteArray};

/// Largest value a 24-bit timer field can hold.
pub const MAX_TIMER_STEPS: u32 = 0x00FF_FFFF;

/// Writes the low 24 bits of `value` big-endian into `out`.
pub(crate) fn u24_be(value: u32, out: &mut [u8]) {
    out.copy_from_slice(&value.to_be_bytes()[1..]);
}

bitflags! {
    /// Sleep configuration
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SleepConfig: u8 {
        /// Keep the configuration across sleep (warm start)
        const WARM_START = 1 << 2;
        /// Wake up on RTC timeout as well as on NSS
        const RTC_WAKEUP = 1;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SleepConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "SleepConfig({=u8:#x})", self.bits())
    }
}

impl ToByteArray for SleepConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.bits()])
    }
}

/// SetSleep command (0x84)
///
/// # Important Notes
/// - Only valid from a standby mode
/// - BUSY stays high for the whole sleep; the next access has to wake the
///   chip first
/// - The chip needs ~500 µs after NSS rises before it may be woken again
#[derive(Debug, Clone)]
pub struct SetSleep {
    /// Sleep configuration
    pub config: SleepConfig,
}

impl Command for SetSleep {
    type IdType = u8;
    type CommandParameters = SleepConfig;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x84
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.config
    }
}

/// Oscillator used in standby
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StandbyConfig {
    /// RC13M oscillator (STDBY_RC)
    Rc = 0,
    /// 32 MHz crystal or TCXO (STDBY_XOSC)
    Xosc = 1,
}

impl ToByteArray for StandbyConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self as u8])
    }
}

/// SetStandby command (0x80)
///
/// STDBY_RC is the state after reset and the one most configuration has to
/// happen in.
#[derive(Debug, Clone)]
pub struct SetStandby {
    /// Standby oscillator
    pub config: StandbyConfig,
}

impl Command for SetStandby {
    type IdType = u8;
    type CommandParameters = StandbyConfig;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x80
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.config
    }
}

/// SetFs command (0xC1)
///
/// Locks the PLL on the configured frequency without starting TX or RX.
#[derive(Debug, Clone)]
pub struct SetFs;

impl Command for SetFs {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0xC1
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}

/// 24-bit timeout in steps of 15.625 µs
///
/// Only the low 24 bits go on the wire. The `Device::set_*` helpers run
/// [`validate`](Self::validate) first; a hand-built [`SetTx`] does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timeout(pub u32);

impl Timeout {
    /// Checks that the timeout fits the 24-bit field.
    ///
    /// # Errors
    /// * [`Error::InvalidArgument`] - the value is above [`MAX_TIMER_STEPS`]
    pub fn validate(self) -> Result<Self, Error> {
        check_timer_steps(self.0)?;
        Ok(self)
    }
}

fn check_timer_steps(steps: u32) -> Result<(), Error> {
    if steps > MAX_TIMER_STEPS {
        return Err(Error::InvalidArgument);
    }
    Ok(())
}

impl ToByteArray for Timeout {
    type Error = Infallible;
    type Array = [u8; 3];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let mut bytes = [0u8; 3];
        u24_be(self.0, &mut bytes);
        Ok(bytes)
    }
}

/// SetTx command (0x83)
///
/// A timeout of zero disables the TX timeout.
#[derive(Debug, Clone)]
pub struct SetTx {
    /// Timeout in steps of 15.625 µs
    pub timeout: Timeout,
}

impl Command for SetTx {
    type IdType = u8;
    type CommandParameters = Timeout;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x83
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.timeout
    }
}

/// How long RX stays open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxMode {
    /// Until one packet is received
    Single,
    /// Until another mode is commanded
    Continuous,
    /// Until a packet or the timeout, in steps of 15.625 µs
    Timed(u32),
}

impl RxMode {
    /// Checks that a timed window is encodable and distinct from the other
    /// two modes.
    ///
    /// On the wire 0 means single and 0xFFFFFF means continuous, so a timed
    /// window has to lie strictly between them.
    ///
    /// # Errors
    /// * [`Error::InvalidArgument`] - `Timed` is 0 or at least [`MAX_TIMER_STEPS`]
    pub fn validate(self) -> Result<Self, Error> {
        match self {
            RxMode::Timed(steps) if steps == 0 || steps >= MAX_TIMER_STEPS => {
                Err(Error::InvalidArgument)
            }
            mode => Ok(mode),
        }
    }
}

impl From<RxMode> for Timeout {
    fn from(mode: RxMode) -> Self {
        match mode {
            RxMode::Single => Timeout(0),
            RxMode::Continuous => Timeout(MAX_TIMER_STEPS),
            RxMode::Timed(steps) => Timeout(steps),
        }
    }
}

/// SetRx command (0x82)
#[derive(Debug, Clone)]
pub struct SetRx {
    /// RX window
    pub mode: RxMode,
}

impl Command for SetRx {
    type IdType = u8;
    type CommandParameters = Timeout;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x82
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.mode.into()
    }
}

/// RX duty cycle periods, both in steps of 15.625 µs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxDutyCycleConfig {
    /// Listening window
    pub rx_period: u32,
    /// Sleep between two windows
    pub sleep_period: u32,
}

impl RxDutyCycleConfig {
    /// Checks that both periods fit their 24-bit fields.
    ///
    /// # Errors
    /// * [`Error::InvalidArgument`] - a period is above [`MAX_TIMER_STEPS`]
    pub fn validate(self) -> Result<Self, Error> {
        check_timer_steps(self.rx_period)?;
        check_timer_steps(self.sleep_period)?;
        Ok(self)
    }
}

impl ToByteArray for RxDutyCycleConfig {
    type Error = Infallible;
    type Array = [u8; 6];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let mut bytes = [0u8; 6];
        u24_be(self.rx_period, &mut bytes[0..3]);
        u24_be(self.sleep_period, &mut bytes[3..6]);
        Ok(bytes)
    }
}

/// SetRxDutyCycle command (0x94)
///
/// The chip alternates between RX and sleep on its own, holding BUSY high
/// during the sleep phases. It has to be woken like a sleeping chip before
/// any other command.
#[derive(Debug, Clone)]
pub struct SetRxDutyCycle {
    /// Duty cycle periods
    pub config: RxDutyCycleConfig,
}

impl Command for SetRxDutyCycle {
    type IdType = u8;
    type CommandParameters = RxDutyCycleConfig;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x94
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.config
    }
}

/// SetCad command (0xC5)
///
/// LoRa channel activity detection. Falls back to STDBY_RC when done.
#[derive(Debug, Clone)]
pub struct SetCad;

impl Command for SetCad {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0xC5
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}

bitflags! {
    /// Calibration mask, one bit per block
    ///
    /// Bit 7 is reserved and must stay clear. [`CalibrationParams::all`]
    /// (0x7F) calibrates everything.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CalibrationParams: u8 {
        /// RC64k oscillator
        const RC64K = 1 << 0;
        /// RC13M oscillator
        const RC13M = 1 << 1;
        /// PLL
        const PLL = 1 << 2;
        /// ADC pulse
        const ADC_PULSE = 1 << 3;
        /// ADC bulk N
        const ADC_BULK_N = 1 << 4;
        /// ADC bulk P
        const ADC_BULK_P = 1 << 5;
        /// Image rejection
        const IMAGE = 1 << 6;
    }
}

impl CalibrationParams {
    /// Parses a raw mask.
    ///
    /// # Errors
    /// * [`Error::InvalidArgument`] - the reserved bit 7 is set
    pub fn from_byte(raw: u8) -> Result<Self, Error> {
        Self::from_bits(raw).ok_or(Error::InvalidArgument)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CalibrationParams {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "CalibrationParams({=u8:#x})", self.bits())
    }
}

impl ToByteArray for CalibrationParams {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.bits()])
    }
}

/// Calibrate command (0x89)
///
/// # Important Notes
/// - Issue from STDBY_RC
/// - BUSY stays high for the whole calibration, up to 3.5 ms for all blocks
/// - Check `GetDeviceErrors` afterwards
#[derive(Debug, Clone)]
pub struct Calibrate {
    /// Blocks to calibrate
    pub params: CalibrationParams,
}

impl Command for Calibrate {
    type IdType = u8;
    type CommandParameters = CalibrationParams;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x89
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_calibration_mask() {
        assert_eq!(CalibrationParams::all().bits(), 0x7F);
        assert_eq!(CalibrationParams::from_byte(0x7F), Ok(CalibrationParams::all()));
        assert_eq!(CalibrationParams::from_byte(0x80), Err(Error::InvalidArgument));
        assert_eq!(CalibrationParams::from_byte(0xFF), Err(Error::InvalidArgument));
    }

    #[test]
    fn timers_are_24_bit() {
        assert_eq!(Timeout(0x0012_3456).to_bytes().unwrap(), [0x12, 0x34, 0x56]);
        assert_eq!(
            Timeout::from(RxMode::Continuous).to_bytes().unwrap(),
            [0xFF, 0xFF, 0xFF]
        );

        let duty = RxDutyCycleConfig {
            rx_period: 0x000100,
            sleep_period: 0x0A0B0C,
        };
        assert_eq!(duty.to_bytes().unwrap(), [0x00, 0x01, 0x00, 0x0A, 0x0B, 0x0C]);
    }

    #[test]
    fn oversized_timers_are_rejected() {
        assert_eq!(Timeout(MAX_TIMER_STEPS).validate(), Ok(Timeout(MAX_TIMER_STEPS)));
        assert_eq!(Timeout(1 << 24).validate(), Err(Error::InvalidArgument));

        assert_eq!(RxMode::Timed(1).validate(), Ok(RxMode::Timed(1)));
        assert_eq!(RxMode::Timed(0).validate(), Err(Error::InvalidArgument));
        assert_eq!(RxMode::Timed(MAX_TIMER_STEPS).validate(), Err(Error::InvalidArgument));
        assert_eq!(RxMode::Timed(1 << 24).validate(), Err(Error::InvalidArgument));
        assert_eq!(RxMode::Continuous.validate(), Ok(RxMode::Continuous));

        let duty = RxDutyCycleConfig {
            rx_period: 0x40,
            sleep_period: 0x0100_0000,
        };
        assert_eq!(duty.validate(), Err(Error::InvalidArgument));
    }
}
