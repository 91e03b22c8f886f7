//! The battery-backed part of an MBC6 cartridge.
//!
//! RAM and flash are persisted as one blob: the 32KiB of RAM come first, the
//! 1MiB flash array occupies the tail. The two parts are only ever handed out
//! as separate slices.

use super::flash::FLASH_SIZE;


/// Size of one RAM bank as mapped into `0xA000` or `0xB000`.
pub(crate) const RAM_BANK_SIZE: usize = 0x1000;

/// Number of RAM banks. Selected with 3 bits.
pub(crate) const RAM_BANKS: usize = 8;

pub(crate) const RAM_SIZE: usize = RAM_BANK_SIZE * RAM_BANKS;

/// Size of the whole persisted region.
pub(crate) const SAVE_SIZE: usize = RAM_SIZE + FLASH_SIZE;


pub(crate) struct SaveRegion {
    bytes: Box<[u8]>,
}

impl SaveRegion {
    /// Creates a region in its factory state: RAM cleared, flash erased.
    pub(crate) fn blank() -> Self {
        let mut bytes = vec![0x00; SAVE_SIZE].into_boxed_slice();
        bytes[RAM_SIZE..].iter_mut().for_each(|b| *b = 0xFF);

        Self { bytes }
    }

    pub(crate) fn ram(&self) -> &[u8] {
        &self.bytes[..RAM_SIZE]
    }

    pub(crate) fn ram_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[..RAM_SIZE]
    }

    pub(crate) fn flash(&self) -> &[u8] {
        &self.bytes[RAM_SIZE..]
    }

    pub(crate) fn flash_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[RAM_SIZE..]
    }

    /// The whole region as it is persisted.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}
