//! Reset, oscillator and calibration sequencing
//!
//! A cold start normally runs:
//!
//! 1. [`init_io`](Device::init_io)
//! 2. [`reset_device`](Device::reset_device)
//! 3. [`initialize_oscillator_control`](Device::initialize_oscillator_control),
//!    which arms the TCXO on DIO3 and runs a full calibration
//! 4. [`device_errors`](Device::device_errors) /
//!    [`clear_device_errors`](Device::clear_device_errors), since the chip
//!    flags XOSC_START_ERR whenever it boots with a TCXO
//! 5. optionally [`init_rf_switch`](Device::init_rf_switch) and
//!    [`set_rf_tx_power`](Device::set_rf_tx_power)

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
    spi::SpiBus,
};

use crate::{
    board::{Board, DeviceModel},
    commands::{
        Calibrate, CalibrationParams, ClearDeviceErrors, DeviceErrors, GetDeviceErrors, RampTime,
        RfSwitchConfig, SetDio2AsRfSwitchCtrl, SetDio3AsTcxoCtrl, SetTxParams, TcxoConfig,
        TxParams, MAX_TIMER_STEPS,
    },
    mode::{DebugSignals, OperatingMode},
    Device, Error,
};

/// Milliseconds to chip timer steps (15.625 µs, 64 per ms).
const TIME_BASE_SHIFT: u32 = 6;

/// Converts host milliseconds to the chip's 15.625 µs timer steps.
///
/// # Errors
/// * [`Error::InvalidArgument`] - the result does not fit in 24 bits
pub fn ms_to_timer_steps(ms: u32) -> Result<u32, Error> {
    let steps = u64::from(ms) << TIME_BASE_SHIFT;
    if steps > u64::from(MAX_TIMER_STEPS) {
        return Err(Error::InvalidArgument);
    }
    Ok(steps as u32)
}

impl<SPI, NSS, BUSY, RESET, D, DBG, B> Device<SPI, NSS, BUSY, RESET, D, DBG, B>
where
    NSS: OutputPin,
    RESET: OutputPin,
{
    /// Drives chip select and NRESET to their idle (high) levels.
    pub fn init_io(&mut self) -> Result<(), Error> {
        self.cs.deselect()?;
        self.reset.set_high().map_err(|_| Error::Pin)
    }
}

impl<SPI, NSS, BUSY, RESET, D, DBG, B> Device<SPI, NSS, BUSY, RESET, D, DBG, B>
where
    RESET: OutputPin,
    D: DelayNs,
    DBG: DebugSignals,
{
    /// Pulses NRESET.
    ///
    /// High, low for `reset_pulse_ms`, high again, then `reset_settle_ms`
    /// before returning. BUSY is not consulted: the chip is not listening
    /// while in reset. The tracked mode becomes STDBY_RC.
    pub fn reset_device(&mut self) -> Result<(), Error> {
        debug!(
            "reset: pulse {=u32} ms, settle {=u32} ms",
            self.config.reset_pulse_ms,
            self.config.reset_settle_ms
        );
        self.reset.set_high().map_err(|_| Error::Pin)?;
        self.reset.set_low().map_err(|_| Error::Pin)?;
        self.delay.delay_ms(self.config.reset_pulse_ms);
        self.reset.set_high().map_err(|_| Error::Pin)?;
        self.delay.delay_ms(self.config.reset_settle_ms);
        self.mode.set(OperatingMode::StandbyRc)
    }
}

impl<SPI, NSS, BUSY, RESET, D, DBG, B> Device<SPI, NSS, BUSY, RESET, D, DBG, B>
where
    B: Board,
{
    /// TCXO wake-up time of the board, in milliseconds.
    pub fn oscillator_wakeup_time_ms(&self) -> u32 {
        self.board.tcxo_wakeup_time_ms()
    }

    /// Chip variant fitted on the board.
    pub fn device_model(&self) -> DeviceModel {
        self.board.device_model()
    }

    /// Checks `freq_hz` against the board's RF front end.
    pub fn check_rf_frequency(&self, freq_hz: u32) -> Result<(), Error> {
        self.board.check_rf_frequency(freq_hz)
    }

    /// Powers the antenna switch.
    pub fn antenna_on(&mut self) -> Result<(), Error> {
        self.board.antenna_on()
    }

    /// Removes antenna switch power.
    pub fn antenna_off(&mut self) -> Result<(), Error> {
        self.board.antenna_off()
    }
}

impl<SPI, NSS, BUSY, RESET, D, DBG, B> Device<SPI, NSS, BUSY, RESET, D, DBG, B>
where
    SPI: SpiBus,
    NSS: OutputPin,
    BUSY: InputPin,
    D: DelayNs,
    B: Board,
{
    /// Arms DIO3 as TCXO supply and runs a full calibration.
    ///
    /// The TCXO start-up delay is the board's wake-up time converted to timer
    /// steps; 5 ms becomes 320.
    ///
    /// # Errors
    /// * [`Error::InvalidArgument`] - the wake-up time overflows 24 bits
    pub fn initialize_oscillator_control(&mut self) -> Result<(), Error> {
        let delay = ms_to_timer_steps(self.oscillator_wakeup_time_ms())?;
        let voltage = self.board.tcxo_voltage();
        debug!("tcxo: delay {=u32} steps", delay);

        self.execute_command(SetDio3AsTcxoCtrl {
            config: TcxoConfig { voltage, delay },
        })?;
        self.calibrate(CalibrationParams::all())
    }

    /// Runs the selected calibrations.
    ///
    /// Only meaningful in STDBY_RC. BUSY stays high until every block is
    /// done, so this returns once calibration completes.
    pub fn calibrate(&mut self, params: CalibrationParams) -> Result<(), Error> {
        debug!("calibrate {=u8:#x}", params.bits());
        self.execute_command(Calibrate { params })?;
        Ok(())
    }

    /// Lets DIO2 drive the antenna switch, high during TX.
    pub fn init_rf_switch(&mut self) -> Result<(), Error> {
        self.execute_command(SetDio2AsRfSwitchCtrl {
            config: RfSwitchConfig { enable: true },
        })?;
        Ok(())
    }

    /// Sets the TX output power, with a 40 µs PA ramp.
    pub fn set_rf_tx_power(&mut self, dbm: i8) -> Result<(), Error> {
        self.execute_command(SetTxParams {
            params: TxParams {
                power: dbm,
                ramp_time: RampTime::Micros40,
            },
        })?;
        Ok(())
    }

    /// Reads the latched device error flags.
    pub fn device_errors(&mut self) -> Result<DeviceErrors, Error> {
        let response = self.execute_command(GetDeviceErrors)?;
        if !response.errors.is_empty() {
            warn!("device errors: {}", response.errors);
        }
        Ok(response.errors)
    }

    /// Clears every device error flag.
    pub fn clear_device_errors(&mut self) -> Result<(), Error> {
        self.execute_command(ClearDeviceErrors)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        digital::{Mock as PinMock, State, Transaction as PinTransaction},
        spi::Mock as SpiMock,
    };

    use super::*;
    use crate::Pins;

    #[test]
    fn timer_step_conversion() {
        assert_eq!(ms_to_timer_steps(5), Ok(320));
        assert_eq!(ms_to_timer_steps(0), Ok(0));
        assert_eq!(ms_to_timer_steps(0x3_FFFF), Ok(0xFF_FFC0));
        assert_eq!(ms_to_timer_steps(0x4_0000), Err(Error::InvalidArgument));
    }

    #[test]
    fn init_io_and_reset_drive_lines_in_order() {
        let pins = Pins {
            nss: PinMock::new(&[PinTransaction::set(State::High)]),
            busy: PinMock::new(&[]),
            reset: PinMock::new(&[
                PinTransaction::set(State::High),
                PinTransaction::set(State::High),
                PinTransaction::set(State::Low),
                PinTransaction::set(State::High),
            ]),
        };
        let mut device = Device::new(SpiMock::<u8>::new(&[]), pins, NoopDelay::new());

        device.init_io().unwrap();
        device.mode.set(OperatingMode::Tx).unwrap();
        device.reset_device().unwrap();
        assert_eq!(device.mode(), OperatingMode::StandbyRc);

        let (mut spi, mut pins, _, _, _) = device.release();
        spi.done();
        pins.nss.done();
        pins.busy.done();
        pins.reset.done();
    }

    #[test]
    fn reference_board_facts() {
        let device = Device::new(
            SpiMock::<u8>::new(&[]),
            Pins {
                nss: PinMock::new(&[]),
                busy: PinMock::new(&[]),
                reset: PinMock::new(&[]),
            },
            NoopDelay::new(),
        );
        assert_eq!(device.oscillator_wakeup_time_ms(), 5);
        assert_eq!(device.device_model(), DeviceModel::Sx1262);
        assert_eq!(device.check_rf_frequency(868_000_000), Err(Error::NotImplemented));

        let (mut spi, mut pins, _, _, _) = device.release();
        spi.done();
        pins.nss.done();
        pins.busy.done();
        pins.reset.done();
    }
}
