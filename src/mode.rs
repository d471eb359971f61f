//! Operating mode tracking
//!
//! The chip does not announce mode changes, so the driver remembers the last
//! mode it commanded. [`ModeTracker`] holds that value for one device and can
//! mirror it onto two debug lines (TX and RX) for a logic analyser. Mirroring
//! is chosen at construction: [`NoDebugSignals`] does nothing, [`DebugPins`]
//! drives two GPIOs.
//!
//! The `Device::set_*` methods in this module issue the mode-changing commands
//! and update the tracker in one step. Each has an `_async` twin; recording a
//! mode with `Device::set_mode` needs no bus at all.

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
    spi::SpiBus,
};
use embedded_hal_async::{delay::DelayNs as AsyncDelayNs, spi::SpiBus as AsyncSpiBus};

use crate::{
    board::Board,
    commands::{
        GetStatus, RxDutyCycleConfig, RxMode, SetCad, SetFs, SetRx, SetRxDutyCycle, SetSleep,
        SetStandby, SetTx, SleepConfig, StandbyConfig, Timeout,
    },
    Command, Device, Error,
};

/// Host-side settling time after SetSleep before the chip may be woken.
const SLEEP_SETTLE_MS: u32 = 2;

/// Last mode commanded to the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    /// Sleep, BUSY held high
    Sleep,
    /// STDBY_RC, the state after reset
    #[default]
    StandbyRc,
    /// STDBY_XOSC
    StandbyXosc,
    /// Frequency synthesis
    Fs,
    /// Transmitting
    Tx,
    /// Receiving
    Rx,
    /// Alternating RX and sleep
    RxDutyCycle,
    /// Channel activity detection
    Cad,
}

impl OperatingMode {
    /// Level of the TX and RX debug lines for this mode.
    pub fn debug_levels(self) -> (bool, bool) {
        match self {
            OperatingMode::Tx => (true, false),
            OperatingMode::Rx | OperatingMode::RxDutyCycle => (false, true),
            _ => (false, false),
        }
    }

    /// `true` when the chip has to be woken before it accepts a command.
    pub fn needs_wakeup(self) -> bool {
        matches!(self, OperatingMode::Sleep | OperatingMode::RxDutyCycle)
    }
}

/// Sink for the TX/RX debug lines.
pub trait DebugSignals {
    /// Drives the TX line.
    fn set_tx(&mut self, active: bool) -> Result<(), Error>;

    /// Drives the RX line.
    fn set_rx(&mut self, active: bool) -> Result<(), Error>;
}

/// Debug mirroring disabled.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoDebugSignals;

impl DebugSignals for NoDebugSignals {
    fn set_tx(&mut self, _active: bool) -> Result<(), Error> {
        Ok(())
    }

    fn set_rx(&mut self, _active: bool) -> Result<(), Error> {
        Ok(())
    }
}

/// Two active-high GPIOs showing TX and RX.
pub struct DebugPins<TX, RX> {
    tx: TX,
    rx: RX,
}

impl<TX, RX> DebugPins<TX, RX> {
    /// Wraps the TX and RX debug outputs.
    pub fn new(tx: TX, rx: RX) -> Self {
        Self { tx, rx }
    }

    /// Gives the outputs back.
    pub fn release(self) -> (TX, RX) {
        (self.tx, self.rx)
    }
}

fn drive<P: OutputPin>(pin: &mut P, active: bool) -> Result<(), Error> {
    if active {
        pin.set_high()
    } else {
        pin.set_low()
    }
    .map_err(|_| Error::Pin)
}

impl<TX, RX> DebugSignals for DebugPins<TX, RX>
where
    TX: OutputPin,
    RX: OutputPin,
{
    fn set_tx(&mut self, active: bool) -> Result<(), Error> {
        drive(&mut self.tx, active)
    }

    fn set_rx(&mut self, active: bool) -> Result<(), Error> {
        drive(&mut self.rx, active)
    }
}

/// Per-device record of the commanded mode.
pub struct ModeTracker<DBG = NoDebugSignals> {
    mode: OperatingMode,
    signals: DBG,
}

impl<DBG> ModeTracker<DBG> {
    /// Starts in STDBY_RC.
    pub fn new(signals: DBG) -> Self {
        Self {
            mode: OperatingMode::default(),
            signals,
        }
    }

    /// Mode last recorded with [`set`](Self::set).
    pub fn get(&self) -> OperatingMode {
        self.mode
    }

    /// Gives the debug sink back.
    pub fn release(self) -> DBG {
        self.signals
    }

    pub(crate) fn map_signals<T>(self, signals: T) -> ModeTracker<T> {
        ModeTracker {
            mode: self.mode,
            signals,
        }
    }
}

impl<DBG> ModeTracker<DBG>
where
    DBG: DebugSignals,
{
    /// Records `mode` and mirrors it onto the debug lines.
    ///
    /// The mode is recorded even if driving a debug line fails.
    pub fn set(&mut self, mode: OperatingMode) -> Result<(), Error> {
        self.mode = mode;
        let (tx, rx) = mode.debug_levels();
        self.signals.set_tx(tx)?;
        self.signals.set_rx(rx)
    }
}

impl<DBG> Default for ModeTracker<DBG>
where
    DBG: Default,
{
    fn default() -> Self {
        Self::new(DBG::default())
    }
}

impl<SPI, NSS, BUSY, RESET, D, DBG, B> Device<SPI, NSS, BUSY, RESET, D, DBG, B> {
    /// Mode last commanded to the chip.
    pub fn mode(&self) -> OperatingMode {
        self.mode.get()
    }
}

impl<SPI, NSS, BUSY, RESET, D, DBG, B> Device<SPI, NSS, BUSY, RESET, D, DBG, B>
where
    DBG: DebugSignals,
{
    /// Records `mode` as current without talking to the chip.
    ///
    /// For callers that changed the mode through a raw command, or learned it
    /// from an IRQ (TX done, RX done, CAD done all fall back to standby).
    pub fn set_mode(&mut self, mode: OperatingMode) -> Result<(), Error> {
        trace!("mode -> {}", mode);
        self.mode.set(mode)
    }
}

fn standby_mode(config: StandbyConfig) -> OperatingMode {
    match config {
        StandbyConfig::Rc => OperatingMode::StandbyRc,
        StandbyConfig::Xosc => OperatingMode::StandbyXosc,
    }
}

impl<SPI, NSS, BUSY, RESET, D, DBG, B> Device<SPI, NSS, BUSY, RESET, D, DBG, B>
where
    SPI: SpiBus,
    NSS: OutputPin,
    BUSY: InputPin,
    D: DelayNs,
    DBG: DebugSignals,
    B: Board,
{
    /// Enters STDBY_RC or STDBY_XOSC.
    pub fn set_standby(&mut self, config: StandbyConfig) -> Result<(), Error> {
        self.execute_command(SetStandby { config })?;
        self.set_mode(standby_mode(config))
    }

    /// Enters FS.
    pub fn set_fs(&mut self) -> Result<(), Error> {
        self.execute_command(SetFs)?;
        self.set_mode(OperatingMode::Fs)
    }

    /// Starts transmitting the staged buffer.
    ///
    /// # Errors
    /// * [`Error::InvalidArgument`] - `timeout` does not fit 24 bits; nothing is sent
    pub fn set_tx(&mut self, timeout: Timeout) -> Result<(), Error> {
        let timeout = timeout.validate()?;
        self.execute_command(SetTx { timeout })?;
        self.set_mode(OperatingMode::Tx)
    }

    /// Opens the receiver.
    ///
    /// # Errors
    /// * [`Error::InvalidArgument`] - see [`RxMode::validate`]; nothing is sent
    pub fn set_rx(&mut self, mode: RxMode) -> Result<(), Error> {
        let mode = mode.validate()?;
        self.execute_command(SetRx { mode })?;
        self.set_mode(OperatingMode::Rx)
    }

    /// Starts the autonomous RX / sleep loop.
    ///
    /// # Errors
    /// * [`Error::InvalidArgument`] - a period does not fit 24 bits; nothing is sent
    pub fn set_rx_duty_cycle(&mut self, config: RxDutyCycleConfig) -> Result<(), Error> {
        let config = config.validate()?;
        self.execute_command(SetRxDutyCycle { config })?;
        self.set_mode(OperatingMode::RxDutyCycle)
    }

    /// Starts channel activity detection.
    pub fn set_cad(&mut self) -> Result<(), Error> {
        self.execute_command(SetCad)?;
        self.set_mode(OperatingMode::Cad)
    }

    /// Puts the chip to sleep.
    ///
    /// Unlike every other command this one is not followed by a BUSY wait: a
    /// sleeping chip holds BUSY high until it is woken.
    pub fn set_sleep(&mut self, config: SleepConfig) -> Result<(), Error> {
        self.wait_until_ready()?;
        let Self { spi, cs, .. } = self;
        cs.frame(|| {
            spi.write(&[SetSleep::id(), config.bits()])
                .map_err(|_| Error::Bus)?;
            spi.flush().map_err(|_| Error::Bus)
        })?;
        self.delay.delay_ms(SLEEP_SETTLE_MS);
        self.set_mode(OperatingMode::Sleep)
    }

    /// Wakes the chip from sleep or RX duty cycle.
    ///
    /// The falling edge of NSS is what wakes the chip, so no BUSY wait comes
    /// before the frame; BUSY is awaited once the frame is done.
    pub fn wakeup(&mut self) -> Result<(), Error> {
        debug!("waking radio");
        let Self { spi, cs, .. } = self;
        cs.frame(|| {
            spi.write(&[GetStatus::id(), 0x00]).map_err(|_| Error::Bus)?;
            spi.flush().map_err(|_| Error::Bus)
        })?;
        self.wait_until_ready()?;
        self.set_mode(OperatingMode::StandbyRc)
    }

    /// Makes the chip addressable.
    ///
    /// Wakes it and powers the antenna switch when the tracked mode is sleep
    /// or RX duty cycle, otherwise just waits for BUSY. A board without an
    /// antenna switch is not an error here.
    pub fn ensure_ready(&mut self) -> Result<(), Error> {
        if !self.mode().needs_wakeup() {
            return self.wait_until_ready();
        }
        self.wakeup()?;
        match self.board.antenna_on() {
            Err(Error::NotImplemented) => Ok(()),
            other => other,
        }
    }
}

impl<SPI, NSS, BUSY, RESET, D, DBG, B> Device<SPI, NSS, BUSY, RESET, D, DBG, B>
where
    SPI: AsyncSpiBus,
    NSS: OutputPin,
    BUSY: InputPin,
    D: AsyncDelayNs,
    DBG: DebugSignals,
    B: Board,
{
    /// Clocks `bytes` in one NSS frame with no BUSY wait on either side.
    async fn unguarded_frame_async(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.cs.select()?;
        let result = match self.spi.write(bytes).await {
            Ok(()) => self.spi.flush().await,
            Err(e) => Err(e),
        }
        .map_err(|_| Error::Bus);
        let released = self.cs.deselect();
        result?;
        released
    }

    /// Async version of [`set_standby`](Device::set_standby).
    pub async fn set_standby_async(&mut self, config: StandbyConfig) -> Result<(), Error> {
        self.execute_command_async(SetStandby { config }).await?;
        self.set_mode(standby_mode(config))
    }

    /// Async version of [`set_fs`](Device::set_fs).
    pub async fn set_fs_async(&mut self) -> Result<(), Error> {
        self.execute_command_async(SetFs).await?;
        self.set_mode(OperatingMode::Fs)
    }

    /// Async version of [`set_tx`](Device::set_tx).
    pub async fn set_tx_async(&mut self, timeout: Timeout) -> Result<(), Error> {
        let timeout = timeout.validate()?;
        self.execute_command_async(SetTx { timeout }).await?;
        self.set_mode(OperatingMode::Tx)
    }

    /// Async version of [`set_rx`](Device::set_rx).
    pub async fn set_rx_async(&mut self, mode: RxMode) -> Result<(), Error> {
        let mode = mode.validate()?;
        self.execute_command_async(SetRx { mode }).await?;
        self.set_mode(OperatingMode::Rx)
    }

    /// Async version of [`set_rx_duty_cycle`](Device::set_rx_duty_cycle).
    pub async fn set_rx_duty_cycle_async(
        &mut self,
        config: RxDutyCycleConfig,
    ) -> Result<(), Error> {
        let config = config.validate()?;
        self.execute_command_async(SetRxDutyCycle { config }).await?;
        self.set_mode(OperatingMode::RxDutyCycle)
    }

    /// Async version of [`set_cad`](Device::set_cad).
    pub async fn set_cad_async(&mut self) -> Result<(), Error> {
        self.execute_command_async(SetCad).await?;
        self.set_mode(OperatingMode::Cad)
    }

    /// Async version of [`set_sleep`](Device::set_sleep).
    pub async fn set_sleep_async(&mut self, config: SleepConfig) -> Result<(), Error> {
        self.wait_until_ready_async().await?;
        self.unguarded_frame_async(&[SetSleep::id(), config.bits()])
            .await?;
        self.delay.delay_ms(SLEEP_SETTLE_MS).await;
        self.set_mode(OperatingMode::Sleep)
    }

    /// Async version of [`wakeup`](Device::wakeup).
    pub async fn wakeup_async(&mut self) -> Result<(), Error> {
        debug!("waking radio");
        self.unguarded_frame_async(&[GetStatus::id(), 0x00]).await?;
        self.wait_until_ready_async().await?;
        self.set_mode(OperatingMode::StandbyRc)
    }

    /// Async version of [`ensure_ready`](Device::ensure_ready).
    pub async fn ensure_ready_async(&mut self) -> Result<(), Error> {
        if !self.mode().needs_wakeup() {
            return self.wait_until_ready_async().await;
        }
        self.wakeup_async().await?;
        match self.board.antenna_on() {
            Err(Error::NotImplemented) => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    use super::*;

    #[test]
    fn default_is_standby_rc() {
        let tracker: ModeTracker = ModeTracker::default();
        assert_eq!(tracker.get(), OperatingMode::StandbyRc);
    }

    #[test]
    fn debug_pins_follow_mode() {
        let tx = PinMock::new(&[
            Transaction::set(State::High),
            Transaction::set(State::Low),
            Transaction::set(State::Low),
        ]);
        let rx = PinMock::new(&[
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::set(State::Low),
        ]);
        let mut tracker = ModeTracker::new(DebugPins::new(tx, rx));

        tracker.set(OperatingMode::Tx).unwrap();
        tracker.set(OperatingMode::RxDutyCycle).unwrap();
        tracker.set(OperatingMode::Fs).unwrap();
        assert_eq!(tracker.get(), OperatingMode::Fs);

        let (mut tx, mut rx) = tracker.release().release();
        tx.done();
        rx.done();
    }
}
