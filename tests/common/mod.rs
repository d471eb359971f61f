//! Simulated SX126x for integration tests
//!
//! Every line, bus transfer and delay the driver issues is appended to one
//! shared event log. The simulated chip keeps a full register file, the
//! 256-byte data buffer, a chip mode for the status byte and the error flags,
//! and holds BUSY high while asleep or while a scripted busy period runs.

#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    convert::Infallible,
    rc::Rc,
};

use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType as PinErrorType, InputPin, OutputPin},
    spi::{ErrorType as SpiErrorType, SpiBus},
};
use sx126x_link::{Config, Device, Pins, WaitPolicy};

const STATUS_DATA_AVAILABLE: u8 = 0x02 << 1;
const XOSC_START_ERR: u16 = 1 << 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    Nss,
    Reset,
    DebugTx,
    DebugRx,
    Antenna,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Set(Line, bool),
    BusySampled(bool),
    Write(Vec<u8>),
    Read(usize),
    Flush,
    Delay(u64),
}

impl Event {
    pub fn is_bus(&self) -> bool {
        matches!(self, Event::Write(_) | Event::Read(_) | Event::Flush)
    }
}

pub struct Chip {
    events: Vec<Event>,
    levels: HashMap<Line, bool>,
    registers: Vec<u8>,
    buffer: [u8; 256],
    busy_script: VecDeque<bool>,
    elapsed_ns: u64,
    frame: Vec<u8>,
    frames: Vec<Vec<u8>>,
    chip_mode: u8,
    errors: u16,
    asleep: bool,
}

impl Chip {
    fn new() -> Self {
        Self {
            events: Vec::new(),
            levels: HashMap::new(),
            registers: vec![0; 0x1_0000],
            buffer: [0; 256],
            busy_script: VecDeque::new(),
            elapsed_ns: 0,
            frame: Vec::new(),
            frames: Vec::new(),
            chip_mode: 0x2,
            errors: XOSC_START_ERR,
            asleep: false,
        }
    }

    fn selected(&self) -> bool {
        self.levels.get(&Line::Nss) == Some(&false)
    }

    fn set(&mut self, line: Line, high: bool) {
        self.events.push(Event::Set(line, high));
        let was_high = self.levels.insert(line, high).unwrap_or(true);
        match (line, was_high, high) {
            (Line::Nss, true, false) => {
                self.frame.clear();
                if self.asleep {
                    self.asleep = false;
                    self.busy_script.extend([true, true]);
                }
            }
            (Line::Nss, false, true) => self.end_frame(),
            (Line::Reset, _, false) => {
                self.chip_mode = 0x2;
                self.asleep = false;
                self.errors = XOSC_START_ERR;
            }
            _ => {}
        }
    }

    fn end_frame(&mut self) {
        let frame = std::mem::take(&mut self.frame);
        match frame.first().copied() {
            None => return,
            Some(0x0D) => {
                let address = u16::from_be_bytes([frame[1], frame[2]]);
                for (i, byte) in frame[3..].iter().enumerate() {
                    self.registers[address as usize + i] = *byte;
                }
            }
            Some(0x0E) => {
                let offset = frame[1];
                for (i, byte) in frame[2..].iter().enumerate() {
                    self.buffer[offset.wrapping_add(i as u8) as usize] = *byte;
                }
            }
            Some(0x80) => self.chip_mode = if frame.get(1) == Some(&1) { 0x3 } else { 0x2 },
            Some(0xC1) => self.chip_mode = 0x4,
            Some(0x82) => self.chip_mode = 0x5,
            Some(0x83) => self.chip_mode = 0x6,
            Some(0x84) => self.asleep = true,
            Some(0x07) => self.errors = 0,
            Some(0x89) => self.busy_script.extend([true; 3]),
            _ => {}
        }
        self.frames.push(frame);
    }

    fn status(&self) -> u8 {
        (self.chip_mode << 4) | STATUS_DATA_AVAILABLE
    }

    fn write(&mut self, words: &[u8]) {
        assert!(self.selected(), "bytes clocked with NSS released");
        self.events.push(Event::Write(words.to_vec()));
        self.frame.extend_from_slice(words);
    }

    fn read(&mut self, words: &mut [u8]) {
        assert!(self.selected(), "bytes clocked with NSS released");
        self.events.push(Event::Read(words.len()));
        for word in words.iter_mut() {
            *word = self.next_response_byte();
            self.frame.push(0x00);
        }
    }

    fn next_response_byte(&self) -> u8 {
        let frame = &self.frame;
        match frame[0] {
            0x1D => {
                let address = u16::from_be_bytes([frame[1], frame[2]]) as usize;
                self.registers[address + frame.len() - 4]
            }
            0x1E => {
                let index = frame[1] as usize + frame.len() - 3;
                self.buffer[index % 256]
            }
            opcode => match (opcode, frame.len() - 1) {
                (_, 0) => self.status(),
                (0x17, 1) => (self.errors >> 8) as u8,
                (0x17, 2) => self.errors as u8,
                _ => 0x00,
            },
        }
    }

    fn sample_busy(&mut self) -> bool {
        let high = self.asleep || self.busy_script.pop_front().unwrap_or(false);
        self.events.push(Event::BusySampled(high));
        high
    }

    fn delay(&mut self, ns: u32) {
        self.events.push(Event::Delay(ns as u64));
        self.elapsed_ns += ns as u64;
    }
}

pub type Shared = Rc<RefCell<Chip>>;

pub struct SimSpi(Shared);

impl SpiErrorType for SimSpi {
    type Error = Infallible;
}

impl SpiBus for SimSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.0.borrow_mut().read(words);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        self.0.borrow_mut().write(words);
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let mut chip = self.0.borrow_mut();
        chip.write(write);
        chip.read(read);
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let mut chip = self.0.borrow_mut();
        chip.write(words);
        chip.read(words);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().events.push(Event::Flush);
        Ok(())
    }
}

impl embedded_hal_async::spi::SpiBus for SimSpi {
    async fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        SpiBus::read(self, words)
    }

    async fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        SpiBus::write(self, words)
    }

    async fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        SpiBus::transfer(self, read, write)
    }

    async fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        SpiBus::transfer_in_place(self, words)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        SpiBus::flush(self)
    }
}

pub struct SimPin {
    line: Line,
    chip: Shared,
}

impl PinErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.chip.borrow_mut().set(self.line, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.chip.borrow_mut().set(self.line, true);
        Ok(())
    }
}

pub struct SimBusy(Shared);

impl PinErrorType for SimBusy {
    type Error = Infallible;
}

impl InputPin for SimBusy {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.borrow_mut().sample_busy())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

pub struct SimDelay(Shared);

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().delay(ns);
    }
}

impl embedded_hal_async::delay::DelayNs for SimDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().delay(ns);
    }
}

pub type SimDevice = Device<SimSpi, SimPin, SimBusy, SimPin, SimDelay>;

/// Bus with only the `embedded-hal-async` interface.
pub struct AsyncOnlySpi(SimSpi);

impl SpiErrorType for AsyncOnlySpi {
    type Error = Infallible;
}

impl embedded_hal_async::spi::SpiBus for AsyncOnlySpi {
    async fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        SpiBus::read(&mut self.0, words)
    }

    async fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        SpiBus::write(&mut self.0, words)
    }

    async fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        SpiBus::transfer(&mut self.0, read, write)
    }

    async fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        SpiBus::transfer_in_place(&mut self.0, words)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        SpiBus::flush(&mut self.0)
    }
}

/// Delay with only the `embedded-hal-async` interface.
pub struct AsyncOnlyDelay(SimDelay);

impl embedded_hal_async::delay::DelayNs for AsyncOnlyDelay {
    async fn delay_ns(&mut self, ns: u32) {
        DelayNs::delay_ns(&mut self.0, ns)
    }
}

pub type AsyncSimDevice = Device<AsyncOnlySpi, SimPin, SimBusy, SimPin, AsyncOnlyDelay>;

/// Handle on the simulated chip, shared with every part handed to a device.
#[derive(Clone)]
pub struct Sim {
    chip: Shared,
}

impl Sim {
    pub fn new() -> Self {
        Self {
            chip: Rc::new(RefCell::new(Chip::new())),
        }
    }

    /// A device on this chip. BUSY polling gives up after 1000 samples so a
    /// handshake bug fails the test instead of hanging it.
    pub fn device(&self) -> SimDevice {
        self.device_with_wait(WaitPolicy::bounded(10, 1000))
    }

    pub fn device_with_wait(&self, wait: WaitPolicy) -> SimDevice {
        let pins = Pins {
            nss: self.pin(Line::Nss),
            busy: SimBusy(self.chip.clone()),
            reset: self.pin(Line::Reset),
        };
        Device::new(SimSpi(self.chip.clone()), pins, SimDelay(self.chip.clone())).with_config(
            Config {
                wait,
                ..Config::default()
            },
        )
    }

    /// A device whose bus and delay only speak `embedded-hal-async`.
    pub fn async_device(&self) -> AsyncSimDevice {
        let pins = Pins {
            nss: self.pin(Line::Nss),
            busy: SimBusy(self.chip.clone()),
            reset: self.pin(Line::Reset),
        };
        Device::new(
            AsyncOnlySpi(SimSpi(self.chip.clone())),
            pins,
            AsyncOnlyDelay(SimDelay(self.chip.clone())),
        )
        .with_config(Config {
            wait: WaitPolicy::bounded(10, 1000),
            ..Config::default()
        })
    }

    pub fn pin(&self, line: Line) -> SimPin {
        SimPin {
            line,
            chip: self.chip.clone(),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.chip.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        let mut chip = self.chip.borrow_mut();
        chip.events.clear();
        chip.frames.clear();
    }

    /// Complete NSS-framed byte sequences, filler bytes included.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.chip.borrow().frames.clone()
    }

    pub fn level(&self, line: Line) -> Option<bool> {
        self.chip.borrow().levels.get(&line).copied()
    }

    /// Holds BUSY high for the next `samples` reads.
    pub fn hold_busy(&self, samples: usize) {
        self.chip
            .borrow_mut()
            .busy_script
            .extend(std::iter::repeat(true).take(samples));
    }

    pub fn elapsed_ns(&self) -> u64 {
        self.chip.borrow().elapsed_ns
    }

    pub fn register(&self, address: u16) -> u8 {
        self.chip.borrow().registers[address as usize]
    }

    pub fn set_register(&self, address: u16, value: u8) {
        self.chip.borrow_mut().registers[address as usize] = value;
    }

    pub fn buffer(&self) -> [u8; 256] {
        self.chip.borrow().buffer
    }

    pub fn is_asleep(&self) -> bool {
        self.chip.borrow().asleep
    }
}
