//! Flash-backed configuration storage.
//!
//! The four calibration floats live in the last flash page as one 16-byte
//! block. Every store rewrites the whole block: read, patch, erase the page,
//! program it back.

use embassy_stm32::flash::Flash;
use embassy_stm32::mode::Blocking;

use awning_core::config::{ConfigSlot, ConfigStore, StoreError};
use awning_core::protocol::{bytes_to_float, float_to_bytes};

/// Offset of the configuration page (the last 2 KiB page of 512 KiB flash).
const CONFIG_OFFSET: u32 = 0x0007_F800;
/// One flash page.
const PAGE_SIZE: u32 = 2048;
/// Size of the packed threshold block.
const BLOCK_LEN: usize = 16;

pub struct FlashStore {
    flash: Flash<'static, Blocking>,
}

impl FlashStore {
    pub fn new(flash: Flash<'static, Blocking>) -> Self {
        Self { flash }
    }

    fn read_block(&mut self) -> [u8; BLOCK_LEN] {
        let mut block = [0; BLOCK_LEN];
        if self.flash.blocking_read(CONFIG_OFFSET, &mut block).is_err() {
            defmt::warn!("store: flash read failed, reporting uncalibrated");
            return [0; BLOCK_LEN];
        }
        block
    }
}

impl ConfigStore for FlashStore {
    fn load(&mut self, slot: ConfigSlot) -> f32 {
        let block = self.read_block();
        let at = slot.address() as usize;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&block[at..at + 4]);
        let value = bytes_to_float(bytes);
        // Erased flash reads back all ones, which decodes to NaN; report the
        // uncalibrated sentinel instead.
        if value.is_nan() { 0.0 } else { value }
    }

    fn store(&mut self, slot: ConfigSlot, value: f32) -> Result<(), StoreError> {
        let mut block = self.read_block();
        let at = slot.address() as usize;
        block[at..at + 4].copy_from_slice(&float_to_bytes(value));

        self.flash
            .blocking_erase(CONFIG_OFFSET, CONFIG_OFFSET + PAGE_SIZE)
            .map_err(|_| {
                defmt::warn!("store: flash erase failed");
                StoreError::Erase
            })?;
        self.flash.blocking_write(CONFIG_OFFSET, &block).map_err(|_| {
            defmt::warn!("store: flash program failed");
            StoreError::Program
        })
    }
}
