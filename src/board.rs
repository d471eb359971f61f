//! Board capabilities
//!
//! Everything that differs between carrier boards but is not part of the bus
//! protocol: the TCXO the radio's DIO3 powers, which chip variant is fitted,
//! an optional antenna switch supply and the frequency plan the RF front end
//! was designed for.
//!
//! Three building blocks are provided:
//! - [`ReferenceBoard`]: the SX1262 reference shield, with no antenna switch
//!   supply and no frequency plan. Asking for either returns
//!   [`Error::NotImplemented`].
//! - [`GpioSwitchBoard`]: a board whose antenna switch is powered from a GPIO.
//! - [`RangeCheckedBoard`]: wraps any board and validates RF frequencies
//!   against an inclusive range.

use embedded_hal::digital::OutputPin;

use crate::{commands::TcxoVoltage, Error};

/// Chip variant fitted on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceModel {
    /// SX1261, low power PA (+15 dBm max)
    Sx1261,
    /// SX1262, high power PA (+22 dBm max)
    Sx1262,
}

/// Board-level facts and optional capabilities.
pub trait Board {
    /// Time the TCXO needs to stabilise once DIO3 powers it, in milliseconds.
    fn tcxo_wakeup_time_ms(&self) -> u32;

    /// Supply voltage DIO3 provides to the TCXO.
    fn tcxo_voltage(&self) -> TcxoVoltage;

    /// Which chip variant is fitted.
    fn device_model(&self) -> DeviceModel;

    /// Powers the antenna switch.
    fn antenna_on(&mut self) -> Result<(), Error>;

    /// Removes antenna switch power.
    fn antenna_off(&mut self) -> Result<(), Error>;

    /// Checks that `freq_hz` is usable on this board's RF front end.
    fn check_rf_frequency(&self, freq_hz: u32) -> Result<(), Error>;
}

/// The SX1262 reference shield.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReferenceBoard;

impl ReferenceBoard {
    /// TCXO wake-up time on the reference shield.
    pub const TCXO_WAKEUP_TIME_MS: u32 = 5;
}

impl Board for ReferenceBoard {
    fn tcxo_wakeup_time_ms(&self) -> u32 {
        Self::TCXO_WAKEUP_TIME_MS
    }

    fn tcxo_voltage(&self) -> TcxoVoltage {
        TcxoVoltage::V1_7
    }

    fn device_model(&self) -> DeviceModel {
        DeviceModel::Sx1262
    }

    fn antenna_on(&mut self) -> Result<(), Error> {
        Err(Error::NotImplemented)
    }

    fn antenna_off(&mut self) -> Result<(), Error> {
        Err(Error::NotImplemented)
    }

    fn check_rf_frequency(&self, _freq_hz: u32) -> Result<(), Error> {
        Err(Error::NotImplemented)
    }
}

/// A board whose antenna switch supply is a GPIO, active high.
///
/// Board facts other than the switch are taken from `inner`.
pub struct GpioSwitchBoard<P, B = ReferenceBoard> {
    power: P,
    inner: B,
}

impl<P> GpioSwitchBoard<P, ReferenceBoard> {
    /// Reference board facts with a GPIO-powered antenna switch.
    pub fn new(power: P) -> Self {
        Self {
            power,
            inner: ReferenceBoard,
        }
    }
}

impl<P, B> GpioSwitchBoard<P, B> {
    /// Adds a GPIO-powered antenna switch to `inner`.
    pub fn wrap(power: P, inner: B) -> Self {
        Self { power, inner }
    }

    /// Returns the switch supply line and the wrapped board.
    pub fn release(self) -> (P, B) {
        (self.power, self.inner)
    }
}

impl<P, B> Board for GpioSwitchBoard<P, B>
where
    P: OutputPin,
    B: Board,
{
    fn tcxo_wakeup_time_ms(&self) -> u32 {
        self.inner.tcxo_wakeup_time_ms()
    }

    fn tcxo_voltage(&self) -> TcxoVoltage {
        self.inner.tcxo_voltage()
    }

    fn device_model(&self) -> DeviceModel {
        self.inner.device_model()
    }

    fn antenna_on(&mut self) -> Result<(), Error> {
        self.power.set_high().map_err(|_| Error::Pin)
    }

    fn antenna_off(&mut self) -> Result<(), Error> {
        self.power.set_low().map_err(|_| Error::Pin)
    }

    fn check_rf_frequency(&self, freq_hz: u32) -> Result<(), Error> {
        self.inner.check_rf_frequency(freq_hz)
    }
}

/// Restricts another board to an inclusive frequency range.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RangeCheckedBoard<B = ReferenceBoard> {
    inner: B,
    min_hz: u32,
    max_hz: u32,
}

impl<B> RangeCheckedBoard<B> {
    /// Accepts frequencies in `min_hz..=max_hz`.
    ///
    /// # Errors
    /// * [`Error::InvalidArgument`] - `min_hz` is above `max_hz`
    pub fn new(inner: B, min_hz: u32, max_hz: u32) -> Result<Self, Error> {
        if min_hz > max_hz {
            return Err(Error::InvalidArgument);
        }
        Ok(Self {
            inner,
            min_hz,
            max_hz,
        })
    }

    /// Returns the wrapped board.
    pub fn release(self) -> B {
        self.inner
    }
}

impl<B> Board for RangeCheckedBoard<B>
where
    B: Board,
{
    fn tcxo_wakeup_time_ms(&self) -> u32 {
        self.inner.tcxo_wakeup_time_ms()
    }

    fn tcxo_voltage(&self) -> TcxoVoltage {
        self.inner.tcxo_voltage()
    }

    fn device_model(&self) -> DeviceModel {
        self.inner.device_model()
    }

    fn antenna_on(&mut self) -> Result<(), Error> {
        self.inner.antenna_on()
    }

    fn antenna_off(&mut self) -> Result<(), Error> {
        self.inner.antenna_off()
    }

    fn check_rf_frequency(&self, freq_hz: u32) -> Result<(), Error> {
        if (self.min_hz..=self.max_hz).contains(&freq_hz) {
            Ok(())
        } else {
            Err(Error::InvalidArgument)
        }
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    use super::*;

    #[test]
    fn reference_board_facts() {
        let mut board = ReferenceBoard;
        assert_eq!(board.tcxo_wakeup_time_ms(), 5);
        assert_eq!(board.device_model(), DeviceModel::Sx1262);
        assert_eq!(board.antenna_on(), Err(Error::NotImplemented));
        assert_eq!(board.check_rf_frequency(868_000_000), Err(Error::NotImplemented));
    }

    #[test]
    fn gpio_switch_drives_power_line() {
        let power = PinMock::new(&[Transaction::set(State::High), Transaction::set(State::Low)]);
        let mut board = GpioSwitchBoard::new(power);

        board.antenna_on().unwrap();
        board.antenna_off().unwrap();

        let (mut power, _) = board.release();
        power.done();
    }

    #[test]
    fn range_check_is_inclusive() {
        let board = RangeCheckedBoard::new(ReferenceBoard, 863_000_000, 870_000_000).unwrap();
        assert_eq!(board.check_rf_frequency(863_000_000), Ok(()));
        assert_eq!(board.check_rf_frequency(870_000_000), Ok(()));
        assert_eq!(board.check_rf_frequency(915_000_000), Err(Error::InvalidArgument));
        assert_eq!(board.tcxo_wakeup_time_ms(), 5);
    }

    #[test]
    fn range_check_rejects_inverted_bounds() {
        assert!(RangeCheckedBoard::new(ReferenceBoard, 2, 1).is_err());
    }
}
