//! Latest-value cell shared between the echo-capture task and the control
//! loop's range finder.
//!
//! Only the most recent measurement matters, so this is an overwrite-on-write
//! cell rather than a queue. The pulse width and the overrun counter are
//! packed into one 64-bit word so consumers always read a coherent pair; on
//! the Cortex-M0+ `portable-atomic` synthesizes the 64-bit access with a
//! short critical section.

#![allow(dead_code)]

use portable_atomic::{AtomicU64, Ordering};

/// One echo measurement snapshot.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct EchoSample {
    /// Width of the last completed echo pulse, in microseconds.
    pub pulse_us: u32,
    /// Measurements abandoned because the echo never came back.
    pub overruns: u32,
}

impl EchoSample {
    fn pack(self) -> u64 {
        (u64::from(self.pulse_us) << 32) | u64::from(self.overruns)
    }

    fn unpack(word: u64) -> Self {
        Self {
            pulse_us: (word >> 32) as u32,
            overruns: word as u32,
        }
    }
}

/// Single-producer/single-consumer cell holding the latest [`EchoSample`].
pub struct EchoCell {
    word: AtomicU64,
}

impl EchoCell {
    pub const fn new() -> Self {
        Self {
            word: AtomicU64::new(0),
        }
    }

    /// Publishes a completed pulse measurement.
    pub fn publish_pulse(&self, pulse_us: u32) {
        let mut sample = self.snapshot();
        sample.pulse_us = pulse_us;
        self.word.store(sample.pack(), Ordering::Release);
    }

    /// Records a measurement that timed out without an echo.
    pub fn note_overrun(&self) {
        let mut sample = self.snapshot();
        sample.overruns = sample.overruns.wrapping_add(1);
        self.word.store(sample.pack(), Ordering::Release);
    }

    /// Reads the latest sample as one coherent pair.
    pub fn snapshot(&self) -> EchoSample {
        EchoSample::unpack(self.word.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_packing_roundtrips() {
        let sample = EchoSample {
            pulse_us: 1_160,
            overruns: 3,
        };
        assert_eq!(EchoSample::unpack(sample.pack()), sample);
    }

    #[test]
    fn publish_keeps_overrun_count() {
        let cell = EchoCell::new();
        cell.note_overrun();
        cell.publish_pulse(580);
        assert_eq!(
            cell.snapshot(),
            EchoSample {
                pulse_us: 580,
                overruns: 1,
            }
        );
    }

    #[test]
    fn overrun_keeps_last_pulse() {
        let cell = EchoCell::new();
        cell.publish_pulse(1_740);
        cell.note_overrun();
        let sample = cell.snapshot();
        assert_eq!(sample.pulse_us, 1_740);
        assert_eq!(sample.overruns, 1);
    }
}
