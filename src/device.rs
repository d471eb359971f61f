//! SX126x Radio Device Interface
//!
//! [`Device`] owns the SPI bus, the NSS, BUSY and NRESET lines and a delay
//! source, and exposes the transaction primitives every higher layer is built
//! from:
//! - [`issue_command`](Device::issue_command) / [`read_command`](Device::read_command)
//! - [`write_registers`](Device::write_registers) / [`read_registers`](Device::read_registers)
//! - [`write_buffer`](Device::write_buffer) / [`read_buffer`](Device::read_buffer)
//!
//! Each one runs the same sequence: wait for BUSY low, drive NSS low, clock
//! the bytes, drive NSS high, wait for BUSY low again. `&mut self` keeps two
//! transactions from ever overlapping on one device; sharing a device between
//! threads needs an outer mutex held for the whole call.
//!
//! Typed access sits on top: [`execute_command`](Device::execute_command) for
//! [`regiface::Command`]s and [`fetch_register`](Device::fetch_register) /
//! [`store_register`](Device::store_register) for registers.
//!
//! Every primitive has an `_async` twin for `embedded-hal-async` buses and
//! delays. They poll BUSY the same way but yield while sleeping.
//!
//! # Example
//! ```no_run
//! use embedded_hal::{delay::DelayNs, digital::{InputPin, OutputPin}, spi::SpiBus};
//! use sx126x_link::{Device, Error, Pins};
//!
//! fn stage_payload<SPI, NSS, BUSY, RESET, D>(
//!     spi: SPI,
//!     pins: Pins<NSS, BUSY, RESET>,
//!     delay: D,
//! ) -> Result<(), Error>
//! where
//!     SPI: SpiBus,
//!     NSS: OutputPin,
//!     BUSY: InputPin,
//!     RESET: OutputPin,
//!     D: DelayNs,
//! {
//!     let mut device = Device::new(spi, pins, delay);
//!     device.write_buffer(0, &[0x01, 0x02, 0x03])?;
//!     Ok(())
//! }
//! ```

use core::convert::Infallible;

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
    spi::{Operation, SpiBus},
};
use embedded_hal_async::{delay::DelayNs as AsyncDelayNs, spi::SpiBus as AsyncSpiBus};
use regiface::{ByteArray, Command, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

use crate::{
    board::ReferenceBoard,
    bus::ChipSelect,
    mode::{ModeTracker, NoDebugSignals},
    ready, Config, Error,
};

const WRITE_REGISTER: u8 = 0x0D;
const READ_REGISTER: u8 = 0x1D;
const WRITE_BUFFER: u8 = 0x0E;
const READ_BUFFER: u8 = 0x1E;
/// Dummy byte clocked while the chip prepares read data.
const NOP: u8 = 0x00;

/// Size of the chip's data buffer.
pub const DATA_BUFFER_SIZE: usize = 256;
const REGISTER_SPACE: usize = 0x1_0000;

fn check_buffer_range(offset: u8, len: usize) -> Result<(), Error> {
    if offset as usize + len > DATA_BUFFER_SIZE {
        return Err(Error::InvalidArgument);
    }
    Ok(())
}

fn check_register_range(address: u16, len: usize) -> Result<(), Error> {
    if address as usize + len > REGISTER_SPACE {
        return Err(Error::InvalidArgument);
    }
    Ok(())
}

/// Control lines of the radio.
pub struct Pins<NSS, BUSY, RESET> {
    /// Chip select, active low
    pub nss: NSS,
    /// BUSY, high while the chip cannot accept a command
    pub busy: BUSY,
    /// NRESET, active low
    pub reset: RESET,
}

/// Main device interface for the SX126x radio.
///
/// `DBG` selects debug mirroring of the operating mode and `B` supplies board
/// facts; both can be swapped with [`with_debug_signals`](Self::with_debug_signals)
/// and [`with_board`](Self::with_board).
pub struct Device<SPI, NSS, BUSY, RESET, D, DBG = NoDebugSignals, B = ReferenceBoard> {
    pub(crate) spi: SPI,
    pub(crate) cs: ChipSelect<NSS>,
    pub(crate) busy: BUSY,
    pub(crate) reset: RESET,
    pub(crate) delay: D,
    pub(crate) mode: ModeTracker<DBG>,
    pub(crate) board: B,
    pub(crate) config: Config,
}

impl<SPI, NSS, BUSY, RESET, D> Device<SPI, NSS, BUSY, RESET, D> {
    /// Creates a device for the reference board with default timing and no
    /// debug mirroring.
    ///
    /// Touches no line; call [`init_io`](Self::init_io) and
    /// [`reset_device`](Self::reset_device) before the first transaction.
    pub fn new(spi: SPI, pins: Pins<NSS, BUSY, RESET>, delay: D) -> Self {
        Self {
            spi,
            cs: ChipSelect::new(pins.nss),
            busy: pins.busy,
            reset: pins.reset,
            delay,
            mode: ModeTracker::new(NoDebugSignals),
            board: ReferenceBoard,
            config: Config::default(),
        }
    }
}

impl<SPI, NSS, BUSY, RESET, D, DBG, B> Device<SPI, NSS, BUSY, RESET, D, DBG, B> {
    /// Replaces the timing configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Replaces the debug mirroring sink, keeping the tracked mode.
    pub fn with_debug_signals<T>(self, signals: T) -> Device<SPI, NSS, BUSY, RESET, D, T, B> {
        Device {
            spi: self.spi,
            cs: self.cs,
            busy: self.busy,
            reset: self.reset,
            delay: self.delay,
            mode: self.mode.map_signals(signals),
            board: self.board,
            config: self.config,
        }
    }

    /// Replaces the board description.
    pub fn with_board<T>(self, board: T) -> Device<SPI, NSS, BUSY, RESET, D, DBG, T> {
        Device {
            spi: self.spi,
            cs: self.cs,
            busy: self.busy,
            reset: self.reset,
            delay: self.delay,
            mode: self.mode,
            board,
            config: self.config,
        }
    }

    /// Active timing configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Board description.
    pub fn board(&self) -> &B {
        &self.board
    }

    /// Releases every owned part.
    pub fn release(self) -> (SPI, Pins<NSS, BUSY, RESET>, D, DBG, B) {
        let pins = Pins {
            nss: self.cs.release(),
            busy: self.busy,
            reset: self.reset,
        };
        (self.spi, pins, self.delay, self.mode.release(), self.board)
    }
}

impl<SPI, NSS, BUSY, RESET, D, DBG, B> Device<SPI, NSS, BUSY, RESET, D, DBG, B>
where
    SPI: SpiBus,
    NSS: OutputPin,
    BUSY: InputPin,
    D: DelayNs,
{
    /// Blocks until BUSY reads low.
    ///
    /// # Errors
    /// * [`Error::DeviceNotResponding`] - BUSY outlived a bounded [`WaitPolicy`](crate::WaitPolicy)
    /// * [`Error::Pin`] - BUSY could not be sampled
    pub fn wait_until_ready(&mut self) -> Result<(), Error> {
        ready::wait_until_ready(&mut self.busy, &mut self.delay, &self.config.wait).map(|_| ())
    }

    /// Runs `operations` as one framed transaction.
    ///
    /// Waits for BUSY, asserts NSS, performs the operations in order, flushes
    /// the bus, releases NSS and waits for BUSY again. Empty reads and writes
    /// are skipped.
    pub fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Error> {
        self.wait_until_ready()?;
        let Self { spi, cs, delay, .. } = self;
        cs.frame(|| {
            for op in operations.iter_mut() {
                match op {
                    Operation::Read(buf) if !buf.is_empty() => spi.read(buf),
                    Operation::Write(buf) if !buf.is_empty() => spi.write(buf),
                    Operation::Transfer(read, write) => spi.transfer(read, write),
                    Operation::TransferInPlace(buf) => spi.transfer_in_place(buf),
                    Operation::DelayNs(ns) => spi.flush().map(|()| delay.delay_ns(*ns)),
                    _ => Ok(()),
                }
                .map_err(|_| Error::Bus)?;
            }
            spi.flush().map_err(|_| Error::Bus)
        })?;
        self.wait_until_ready()
    }

    /// Sends `opcode` followed by `payload`.
    pub fn issue_command(&mut self, opcode: u8, payload: &[u8]) -> Result<(), Error> {
        trace!("command {=u8:#x}, {=usize} bytes", opcode, payload.len());
        self.transaction(&mut [Operation::Write(&[opcode]), Operation::Write(payload)])
    }

    /// Sends `opcode` and reads `buffer.len()` response bytes.
    ///
    /// Returns the status byte the chip shifts out right after the opcode.
    pub fn read_command(&mut self, opcode: u8, buffer: &mut [u8]) -> Result<u8, Error> {
        trace!("query {=u8:#x}, {=usize} bytes", opcode, buffer.len());
        let mut status = [NOP];
        self.transaction(&mut [
            Operation::Write(&[opcode]),
            Operation::Read(&mut status),
            Operation::Read(buffer),
        ])?;
        Ok(status[0])
    }

    /// Writes `data` to consecutive registers starting at `address`.
    ///
    /// # Errors
    /// * [`Error::InvalidArgument`] - the range runs past 0xFFFF
    pub fn write_registers(&mut self, address: u16, data: &[u8]) -> Result<(), Error> {
        check_register_range(address, data.len())?;
        let [hi, lo] = address.to_be_bytes();
        self.transaction(&mut [
            Operation::Write(&[WRITE_REGISTER, hi, lo]),
            Operation::Write(data),
        ])
    }

    /// Reads consecutive registers starting at `address` into `buffer`.
    ///
    /// # Errors
    /// * [`Error::InvalidArgument`] - the range runs past 0xFFFF
    pub fn read_registers(&mut self, address: u16, buffer: &mut [u8]) -> Result<(), Error> {
        check_register_range(address, buffer.len())?;
        let [hi, lo] = address.to_be_bytes();
        self.transaction(&mut [
            Operation::Write(&[READ_REGISTER, hi, lo, NOP]),
            Operation::Read(buffer),
        ])
    }

    /// Writes a single register.
    pub fn write_register(&mut self, address: u16, value: u8) -> Result<(), Error> {
        self.write_registers(address, &[value])
    }

    /// Reads a single register.
    pub fn read_register(&mut self, address: u16) -> Result<u8, Error> {
        let mut value = [0u8];
        self.read_registers(address, &mut value)?;
        Ok(value[0])
    }

    /// Writes `data` into the data buffer at `offset`.
    ///
    /// # Errors
    /// * [`Error::InvalidArgument`] - the range runs past the 256-byte buffer
    pub fn write_buffer(&mut self, offset: u8, data: &[u8]) -> Result<(), Error> {
        check_buffer_range(offset, data.len())?;
        self.transaction(&mut [
            Operation::Write(&[WRITE_BUFFER, offset]),
            Operation::Write(data),
        ])
    }

    /// Reads the data buffer from `offset` into `buffer`.
    ///
    /// # Errors
    /// * [`Error::InvalidArgument`] - the range runs past the 256-byte buffer
    pub fn read_buffer(&mut self, offset: u8, buffer: &mut [u8]) -> Result<(), Error> {
        check_buffer_range(offset, buffer.len())?;
        self.transaction(&mut [
            Operation::Write(&[READ_BUFFER, offset, NOP]),
            Operation::Read(buffer),
        ])
    }

    /// Reads a typed register.
    ///
    /// # Errors
    /// * [`Error::Deserialization`] - the register bytes did not decode
    pub fn fetch_register<R>(&mut self) -> Result<R, Error>
    where
        R: ReadableRegister<IdType = u16>,
    {
        let mut raw_value = R::Array::new();
        self.read_registers(R::id(), raw_value.as_mut())?;
        R::from_bytes(raw_value).map_err(|_| Error::Deserialization)
    }

    /// Writes a typed register.
    pub fn store_register<R>(&mut self, register: R) -> Result<(), Error>
    where
        R: WritableRegister<IdType = u16, Error = Infallible>,
    {
        let raw_value = register.to_bytes().unwrap_or_else(|e| match e {});
        self.write_registers(R::id(), raw_value.as_ref())
    }

    /// Executes a typed command.
    ///
    /// Opcode, parameters and response share one transaction. The response
    /// bytes are whatever the command type declares, status byte included.
    ///
    /// # Errors
    /// * [`Error::Deserialization`] - the response did not decode
    pub fn execute_command<C>(&mut self, command: C) -> Result<C::ResponseParameters, Error>
    where
        C: Command<IdType = u8>,
        C::CommandParameters: ToByteArray<Error = Infallible>,
    {
        let request = command
            .invoking_parameters()
            .to_bytes()
            .unwrap_or_else(|e| match e {});
        let mut raw_response = <C::ResponseParameters as FromByteArray>::Array::new();

        trace!("command {=u8:#x}", C::id());
        self.transaction(&mut [
            Operation::Write(&[C::id()]),
            Operation::Write(request.as_ref()),
            Operation::Read(raw_response.as_mut()),
        ])?;

        C::ResponseParameters::from_bytes(raw_response).map_err(|_| Error::Deserialization)
    }
}

impl<SPI, NSS, BUSY, RESET, D, DBG, B> Device<SPI, NSS, BUSY, RESET, D, DBG, B>
where
    SPI: AsyncSpiBus,
    NSS: OutputPin,
    BUSY: InputPin,
    D: AsyncDelayNs,
{
    /// Async version of [`wait_until_ready`](Device::wait_until_ready).
    pub async fn wait_until_ready_async(&mut self) -> Result<(), Error> {
        ready::wait_until_ready_async(&mut self.busy, &mut self.delay, &self.config.wait)
            .await
            .map(|_| ())
    }

    /// Async version of [`transaction`](Device::transaction).
    pub async fn transaction_async(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> Result<(), Error> {
        self.wait_until_ready_async().await?;

        self.cs.select()?;
        let result = self.run_async(operations).await;
        let released = self.cs.deselect();
        result?;
        released?;

        self.wait_until_ready_async().await
    }

    async fn run_async(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Error> {
        let spi = &mut self.spi;
        for op in operations.iter_mut() {
            match op {
                Operation::Read(buf) if !buf.is_empty() => spi.read(buf).await,
                Operation::Write(buf) if !buf.is_empty() => spi.write(buf).await,
                Operation::Transfer(read, write) => spi.transfer(read, write).await,
                Operation::TransferInPlace(buf) => spi.transfer_in_place(buf).await,
                Operation::DelayNs(ns) => match spi.flush().await {
                    Ok(()) => {
                        self.delay.delay_ns(*ns).await;
                        Ok(())
                    }
                    Err(e) => Err(e),
                },
                _ => Ok(()),
            }
            .map_err(|_| Error::Bus)?;
        }
        spi.flush().await.map_err(|_| Error::Bus)
    }

    /// Async version of [`issue_command`](Device::issue_command).
    pub async fn issue_command_async(&mut self, opcode: u8, payload: &[u8]) -> Result<(), Error> {
        self.transaction_async(&mut [Operation::Write(&[opcode]), Operation::Write(payload)])
            .await
    }

    /// Async version of [`read_command`](Device::read_command).
    pub async fn read_command_async(
        &mut self,
        opcode: u8,
        buffer: &mut [u8],
    ) -> Result<u8, Error> {
        let mut status = [NOP];
        self.transaction_async(&mut [
            Operation::Write(&[opcode]),
            Operation::Read(&mut status),
            Operation::Read(buffer),
        ])
        .await?;
        Ok(status[0])
    }

    /// Async version of [`write_registers`](Device::write_registers).
    pub async fn write_registers_async(&mut self, address: u16, data: &[u8]) -> Result<(), Error> {
        check_register_range(address, data.len())?;
        let [hi, lo] = address.to_be_bytes();
        self.transaction_async(&mut [
            Operation::Write(&[WRITE_REGISTER, hi, lo]),
            Operation::Write(data),
        ])
        .await
    }

    /// Async version of [`read_registers`](Device::read_registers).
    pub async fn read_registers_async(
        &mut self,
        address: u16,
        buffer: &mut [u8],
    ) -> Result<(), Error> {
        check_register_range(address, buffer.len())?;
        let [hi, lo] = address.to_be_bytes();
        self.transaction_async(&mut [
            Operation::Write(&[READ_REGISTER, hi, lo, NOP]),
            Operation::Read(buffer),
        ])
        .await
    }

    /// Async version of [`write_register`](Device::write_register).
    pub async fn write_register_async(&mut self, address: u16, value: u8) -> Result<(), Error> {
        self.write_registers_async(address, &[value]).await
    }

    /// Async version of [`read_register`](Device::read_register).
    pub async fn read_register_async(&mut self, address: u16) -> Result<u8, Error> {
        let mut value = [0u8];
        self.read_registers_async(address, &mut value).await?;
        Ok(value[0])
    }

    /// Async version of [`write_buffer`](Device::write_buffer).
    pub async fn write_buffer_async(&mut self, offset: u8, data: &[u8]) -> Result<(), Error> {
        check_buffer_range(offset, data.len())?;
        self.transaction_async(&mut [
            Operation::Write(&[WRITE_BUFFER, offset]),
            Operation::Write(data),
        ])
        .await
    }

    /// Async version of [`read_buffer`](Device::read_buffer).
    pub async fn read_buffer_async(&mut self, offset: u8, buffer: &mut [u8]) -> Result<(), Error> {
        check_buffer_range(offset, buffer.len())?;
        self.transaction_async(&mut [
            Operation::Write(&[READ_BUFFER, offset, NOP]),
            Operation::Read(buffer),
        ])
        .await
    }

    /// Async version of [`execute_command`](Device::execute_command).
    pub async fn execute_command_async<C>(
        &mut self,
        command: C,
    ) -> Result<C::ResponseParameters, Error>
    where
        C: Command<IdType = u8>,
        C::CommandParameters: ToByteArray<Error = Infallible>,
    {
        let request = command
            .invoking_parameters()
            .to_bytes()
            .unwrap_or_else(|e| match e {});
        let mut raw_response = <C::ResponseParameters as FromByteArray>::Array::new();

        self.transaction_async(&mut [
            Operation::Write(&[C::id()]),
            Operation::Write(request.as_ref()),
            Operation::Read(raw_response.as_mut()),
        ])
        .await?;

        C::ResponseParameters::from_bytes(raw_response).map_err(|_| Error::Deserialization)
    }
}
