//! BUSY handshake
//!
//! The SX126x holds BUSY high while it processes a command, wakes up or
//! calibrates. Nothing may be clocked into it until BUSY reads low again.
//!
//! Waiting is plain polling at a fixed interval. By default it never gives up,
//! matching the hardware contract that BUSY always clears eventually; a
//! [`WaitPolicy`] with a poll budget turns a stuck line into
//! [`Error::DeviceNotResponding`].

use embedded_hal::digital::InputPin;

use crate::Error;

/// Polling schedule for the BUSY line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WaitPolicy {
    /// Sleep between two samples of BUSY, in microseconds
    pub poll_interval_us: u32,
    /// Number of sleeps after which a still-busy device is reported as not
    /// responding. `None` waits forever.
    pub max_polls: Option<u32>,
}

impl WaitPolicy {
    /// 10 µs polling without a deadline.
    pub const UNBOUNDED: Self = Self {
        poll_interval_us: 10,
        max_polls: None,
    };

    /// Polls every `poll_interval_us` and gives up after `max_polls` sleeps.
    pub const fn bounded(poll_interval_us: u32, max_polls: u32) -> Self {
        Self {
            poll_interval_us,
            max_polls: Some(max_polls),
        }
    }

    fn expired(&self, polls: u32) -> bool {
        matches!(self.max_polls, Some(max) if polls >= max)
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// Blocks until BUSY reads low.
///
/// Returns the number of poll intervals slept.
pub(crate) fn wait_until_ready<BUSY, D>(
    busy: &mut BUSY,
    delay: &mut D,
    policy: &WaitPolicy,
) -> Result<u32, Error>
where
    BUSY: InputPin,
    D: embedded_hal::delay::DelayNs,
{
    let mut polls = 0u32;
    while busy.is_high().map_err(|_| Error::Pin)? {
        if policy.expired(polls) {
            warn!("BUSY still high after {=u32} polls", polls);
            return Err(Error::DeviceNotResponding);
        }
        delay.delay_us(policy.poll_interval_us);
        polls = polls.saturating_add(1);
    }
    Ok(polls)
}

/// Async counterpart of [`wait_until_ready`].
pub(crate) async fn wait_until_ready_async<BUSY, D>(
    busy: &mut BUSY,
    delay: &mut D,
    policy: &WaitPolicy,
) -> Result<u32, Error>
where
    BUSY: InputPin,
    D: embedded_hal_async::delay::DelayNs,
{
    let mut polls = 0u32;
    while busy.is_high().map_err(|_| Error::Pin)? {
        if policy.expired(polls) {
            warn!("BUSY still high after {=u32} polls", polls);
            return Err(Error::DeviceNotResponding);
        }
        delay.delay_us(policy.poll_interval_us).await;
        polls = polls.saturating_add(1);
    }
    Ok(polls)
}
