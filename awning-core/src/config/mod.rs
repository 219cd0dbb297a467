//! Calibration thresholds and their persistence contract.
//!
//! Four floats configure the device: the trigger sensor's min/max pair and
//! the travel distance's min/max pair. Each lives at a fixed logical address
//! in non-volatile storage and is mirrored in memory for the state machine.
//! Zero is the "never written" sentinel: a device with any zero threshold
//! is treated as uncalibrated, not as having a zero cutoff.

use core::fmt;

/// Logical float slots in non-volatile storage.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigSlot {
    TriggerMax,
    TriggerMin,
    DistanceMax,
    DistanceMin,
}

impl ConfigSlot {
    /// All slots, in storage-address order.
    pub const ALL: [Self; 4] = [
        ConfigSlot::TriggerMax,
        ConfigSlot::TriggerMin,
        ConfigSlot::DistanceMax,
        ConfigSlot::DistanceMin,
    ];

    /// Byte address of this slot's float in the logical storage space. Part
    /// of the device's storage layout; must stay stable across revisions.
    #[must_use]
    pub const fn address(self) -> u32 {
        match self {
            ConfigSlot::TriggerMax => 0,
            ConfigSlot::TriggerMin => 4,
            ConfigSlot::DistanceMax => 8,
            ConfigSlot::DistanceMin => 12,
        }
    }

    const fn index(self) -> usize {
        (self.address() / 4) as usize
    }
}

/// Failure writing a value to non-volatile storage.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StoreError {
    /// The backing page could not be erased.
    Erase,
    /// The value could not be programmed.
    Program,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Erase => f.write_str("storage erase failed"),
            StoreError::Program => f.write_str("storage program failed"),
        }
    }
}

/// Non-volatile float storage at fixed logical addresses.
///
/// `load` reports absent or erased values as 0.0, which doubles as the
/// uncalibrated sentinel.
pub trait ConfigStore {
    fn load(&mut self, slot: ConfigSlot) -> f32;

    /// Persists `value`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backing storage rejects the write;
    /// callers must not update any mirror of the value in that case.
    fn store(&mut self, slot: ConfigSlot, value: f32) -> Result<(), StoreError>;
}

/// In-memory mirror of the four calibration thresholds.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Thresholds {
    pub trigger_min: f32,
    pub trigger_max: f32,
    pub distance_min: f32,
    pub distance_max: f32,
}

impl Thresholds {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            trigger_min: 0.0,
            trigger_max: 0.0,
            distance_min: 0.0,
            distance_max: 0.0,
        }
    }

    /// Reads all four slots from `store`.
    pub fn load_from<P: ConfigStore>(store: &mut P) -> Self {
        let mut thresholds = Self::new();
        for slot in ConfigSlot::ALL {
            thresholds.set(slot, store.load(slot));
        }
        thresholds
    }

    #[must_use]
    pub const fn get(&self, slot: ConfigSlot) -> f32 {
        match slot {
            ConfigSlot::TriggerMax => self.trigger_max,
            ConfigSlot::TriggerMin => self.trigger_min,
            ConfigSlot::DistanceMax => self.distance_max,
            ConfigSlot::DistanceMin => self.distance_min,
        }
    }

    pub const fn set(&mut self, slot: ConfigSlot, value: f32) {
        match slot {
            ConfigSlot::TriggerMax => self.trigger_max = value,
            ConfigSlot::TriggerMin => self.trigger_min = value,
            ConfigSlot::DistanceMax => self.distance_max = value,
            ConfigSlot::DistanceMin => self.distance_min = value,
        }
    }

    /// A device is calibrated once every threshold is non-zero.
    #[must_use]
    pub fn is_calibrated(&self) -> bool {
        self.trigger_min != 0.0
            && self.trigger_max != 0.0
            && self.distance_min != 0.0
            && self.distance_max != 0.0
    }
}

/// Volatile [`ConfigStore`] for host tooling and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: [f32; 4],
    fail_next: bool,
}

impl MemoryStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: [0.0; 4],
            fail_next: false,
        }
    }

    /// Makes the next `store` call fail, simulating a storage fault.
    pub fn fail_next_store(&mut self) {
        self.fail_next = true;
    }
}

impl ConfigStore for MemoryStore {
    fn load(&mut self, slot: ConfigSlot) -> f32 {
        self.values[slot.index()]
    }

    fn store(&mut self, slot: ConfigSlot, value: f32) -> Result<(), StoreError> {
        if self.fail_next {
            self.fail_next = false;
            return Err(StoreError::Program);
        }
        self.values[slot.index()] = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_addresses_match_storage_layout() {
        assert_eq!(ConfigSlot::TriggerMax.address(), 0);
        assert_eq!(ConfigSlot::TriggerMin.address(), 4);
        assert_eq!(ConfigSlot::DistanceMax.address(), 8);
        assert_eq!(ConfigSlot::DistanceMin.address(), 12);
    }

    #[test]
    fn any_zero_threshold_reads_uncalibrated() {
        let mut thresholds = Thresholds {
            trigger_min: 400.0,
            trigger_max: 600.0,
            distance_min: 10.0,
            distance_max: 30.0,
        };
        assert!(thresholds.is_calibrated());

        for slot in ConfigSlot::ALL {
            let mut partial = thresholds;
            partial.set(slot, 0.0);
            assert!(!partial.is_calibrated());
        }

        thresholds.set(ConfigSlot::TriggerMin, 0.0);
        assert!(!thresholds.is_calibrated());
    }

    #[test]
    fn load_from_reads_every_slot() {
        let mut store = MemoryStore::new();
        store
            .store(ConfigSlot::DistanceMin, 12.5)
            .expect("memory store never fails unprompted");
        let thresholds = Thresholds::load_from(&mut store);
        assert_eq!(thresholds.distance_min, 12.5);
        assert_eq!(thresholds.trigger_max, 0.0);
    }
}
