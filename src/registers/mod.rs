//! Typed registers
//!
//! Accessed with [`Device::fetch_register`](crate::Device::fetch_register)
//! and [`Device::store_register`](crate::Device::store_register), which sit
//! on top of the ranged register primitives.

mod rf;
mod system;

pub use rf::*;
pub use system::*;
