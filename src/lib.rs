#![cfg_attr(not(test), no_std)]
//! SX126x Radio Link Layer
//!
//! This crate drives the host side of the Semtech SX1261/2 SPI interface: the
//! chip select framing, the BUSY handshake, the six bus transactions every
//! radio command is made of, the operating mode the chip was last put in and
//! the reset/TCXO/calibration bring-up.
//!
//! # Architecture
//! - [`bus`]: chip select framing with setup/hold settling
//! - [`ready`]: BUSY polling and the [`WaitPolicy`] that bounds it
//! - [`device`]: the [`Device`] and its transaction primitives
//!   - `issue_command` / `read_command`
//!   - `write_registers` / `read_registers` (plus single-register wrappers)
//!   - `write_buffer` / `read_buffer`
//!   - typed `execute_command`, `fetch_register`, `store_register`
//! - [`mode`]: [`OperatingMode`] tracking, debug line mirroring, and the
//!   mode-changing commands (`set_standby`, `set_tx`, `set_sleep`, `wakeup`...)
//! - [`startup`]: reset, TCXO arming and calibration
//! - [`board`]: the [`Board`] trait for board facts and optional capabilities
//! - [`commands`] / [`registers`]: `regiface` types for the commands and
//!   registers this layer uses
//!
//! # Transactions
//! Every transaction is: wait for BUSY low, NSS low, transfer, NSS high, wait
//! for BUSY low. The only departures are `set_sleep` (no trailing wait, the
//! sleeping chip keeps BUSY high), `wakeup` (no leading wait, NSS falling is
//! what wakes the chip) and `reset_device` (BUSY is ignored).
//!
//! # Example
//! ```no_run
//! use embedded_hal::{delay::DelayNs, digital::{InputPin, OutputPin}, spi::SpiBus};
//! use sx126x_link::{commands::StandbyConfig, Device, Error, Pins};
//!
//! fn bring_up<SPI, NSS, BUSY, RESET, D>(
//!     spi: SPI,
//!     pins: Pins<NSS, BUSY, RESET>,
//!     delay: D,
//! ) -> Result<Device<SPI, NSS, BUSY, RESET, D>, Error>
//! where
//!     SPI: SpiBus,
//!     NSS: OutputPin,
//!     BUSY: InputPin,
//!     RESET: OutputPin,
//!     D: DelayNs,
//! {
//!     let mut device = Device::new(spi, pins, delay);
//!     device.init_io()?;
//!     device.reset_device()?;
//!     device.initialize_oscillator_control()?;
//!     device.clear_device_errors()?;
//!     device.set_standby(StandbyConfig::Xosc)?;
//!     Ok(device)
//! }
//! ```
//!
//! # Features
//! - `defmt`: log through `defmt` and derive `defmt::Format` on public types

#[macro_use]
mod fmt;

use regiface::*;

pub mod board;
pub mod bus;
pub mod commands;
pub mod config;
pub mod device;
pub mod error;
pub mod mode;
pub mod ready;
pub mod registers;
pub mod startup;

pub use board::{Board, DeviceModel, GpioSwitchBoard, RangeCheckedBoard, ReferenceBoard};
pub use bus::ChipSelect;
pub use config::Config;
pub use device::{Device, Pins};
pub use error::Error;
pub use mode::{DebugPins, DebugSignals, ModeTracker, NoDebugSignals, OperatingMode};
pub use ready::WaitPolicy;
