//! Chip-select framing
//!
//! Every transaction with the radio is bracketed by exactly one falling and
//! one rising edge of NSS. [`ChipSelect`] owns that line and nothing else.

use embedded_hal::digital::OutputPin;

use crate::Error;

/// Spin iterations on either side of an NSS edge.
///
/// The SX126x needs a few tens of nanoseconds of setup and hold around NSS;
/// a handful of spin-loop hints covers that on any MCU fast enough to drive it.
const SETTLE_CYCLES: u32 = 3;

#[inline(always)]
fn settle() {
    for _ in 0..SETTLE_CYCLES {
        core::hint::spin_loop();
    }
}

/// Owner of the active-low NSS line.
pub struct ChipSelect<NSS> {
    pin: NSS,
}

impl<NSS> ChipSelect<NSS> {
    /// Wraps the NSS output.
    pub fn new(pin: NSS) -> Self {
        Self { pin }
    }

    /// Gives the NSS output back.
    pub fn release(self) -> NSS {
        self.pin
    }
}

impl<NSS> ChipSelect<NSS>
where
    NSS: OutputPin,
{
    /// Drives NSS low, starting a transaction.
    pub fn select(&mut self) -> Result<(), Error> {
        settle();
        self.pin.set_low().map_err(|_| Error::Pin)?;
        settle();
        Ok(())
    }

    /// Drives NSS high, ending a transaction.
    pub fn deselect(&mut self) -> Result<(), Error> {
        settle();
        self.pin.set_high().map_err(|_| Error::Pin)?;
        settle();
        Ok(())
    }

    /// Runs `f` with NSS asserted.
    ///
    /// NSS is released again even when `f` fails, so a bus error never leaves
    /// the device selected. The error from `f` wins over a deselect error.
    pub fn frame<T>(&mut self, f: impl FnOnce() -> Result<T, Error>) -> Result<T, Error> {
        self.select()?;
        let result = f();
        let released = self.deselect();
        let value = result?;
        released?;
        Ok(value)
    }
}
