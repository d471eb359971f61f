//! Typed device commands
//!
//! Each command is a type implementing [`regiface::Command`] with a one-byte
//! opcode, serialisable parameters and a decodable response. They are run
//! with [`Device::execute_command`](crate::Device::execute_command), which
//! frames opcode, parameters and response in a single transaction.
//!
//! Only the commands the transaction and startup layer needs are carried:
//! - `operational`: sleep, standby, FS, TX, RX, RX duty cycle, CAD and
//!   calibration
//! - `dio`: DIO2 RF switch and DIO3 TCXO control
//! - `rf`: transmit power
//! - `status`: status byte and device errors

mod dio;
mod operational;
mod rf;
mod status;

pub use dio::*;
pub use operational::*;
pub use rf::*;
pub use status::*;
