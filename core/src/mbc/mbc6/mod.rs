use std::fmt;

use failure::{Error, ResultExt};

use crate::{
    log::*,
    primitives::{Byte, Word},
    save::SaveStore,
};
use self::{
    flash::Flash,
    storage::{SaveRegion, RAM_BANK_SIZE},
};
use super::Mbc;

mod flash;
mod storage;


/// Size of a ROM or flash bank as mapped into `0x4000` or `0x6000`.
const ROM_BANK_SIZE: usize = 0x2000;

/// The MBC6, used by exactly one game: "Net de Get: Minigame @ 100".
///
/// Both the ROM area at `0x4000 -- 0x7FFF` and the RAM area at
/// `0xA000 -- 0xBFFF` are split into two independently banked halves ("A" and
/// "B"). Each of the two ROM halves can map either an 8KiB ROM bank or an 8KiB
/// bank of the 1MiB flash chip on the cartridge. RAM is 32KiB in 4KiB banks.
///
/// RAM and flash share one save region, see `storage`.
pub struct Mbc6 {
    rom: Box<[u8]>,
    save: SaveRegion,
    regs: BankRegisters,
    flash: Flash,

    /// The save store, if the cartridge has a battery.
    battery: Option<Box<dyn SaveStore>>,

    /// Whether RAM or flash changed since the last flush.
    dirty: bool,
}

/// Bank register of one ROM/flash half. Bits 0--6 select the bank, bit 7
/// selects flash instead of ROM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RomBank(u8);

impl RomBank {
    fn bank(self) -> usize {
        (self.0 & 0x7F) as usize
    }

    fn is_flash(self) -> bool {
        self.0 & 0x80 != 0
    }

    fn set_bank(&mut self, byte: u8) {
        self.0 = (self.0 & 0x80) | (byte & 0x7F);
    }

    fn set_flash(&mut self, byte: u8) {
        self.0 = ((byte & 0x1) << 7) | (self.0 & 0x7F);
    }

    /// Offset of `addr` inside the bank, relative to the start of ROM or
    /// flash.
    fn offset(self, addr: Word) -> usize {
        self.bank() * ROM_BANK_SIZE + (addr.get() as usize & (ROM_BANK_SIZE - 1))
    }
}

#[derive(Debug, Default)]
struct BankRegisters {
    ram_enabled: bool,

    /// 3 bit RAM bank numbers for `0xA000` and `0xB000`.
    ram_bank_a: u8,
    ram_bank_b: u8,

    rom_bank_a: RomBank,
    rom_bank_b: RomBank,
}

impl BankRegisters {
    /// Returns the index into RAM for the relative RAM area address `addr`.
    fn ram_index(&self, addr: Word) -> usize {
        let bank = if addr.get() < 0x1000 {
            self.ram_bank_a
        } else {
            self.ram_bank_b
        };

        bank as usize * RAM_BANK_SIZE + (addr.get() as usize & (RAM_BANK_SIZE - 1))
    }
}

impl Mbc6 {
    /// Creates the controller. If `battery` is given, RAM and flash are
    /// loaded from it. Otherwise they start blank and are never persisted.
    pub fn new(rom: &[u8], mut battery: Option<Box<dyn SaveStore>>) -> Result<Self, Error> {
        assert!(
            !rom.is_empty() && rom.len() % 0x4000 == 0,
            "ROM length 0x{:x} is not a non-zero multiple of 16KiB",
            rom.len(),
        );

        let mut save = SaveRegion::blank();
        if let Some(store) = &mut battery {
            store.load(save.as_bytes_mut()).context("failed to load cartridge save")?;
        }

        Ok(Self {
            rom: rom.to_vec().into_boxed_slice(),
            save,
            regs: BankRegisters::default(),
            flash: Flash::new(),
            battery,
            dirty: false,
        })
    }

    fn load_banked_byte(&self, bank: RomBank, addr: Word) -> Byte {
        let offset = bank.offset(addr);
        if bank.is_flash() {
            Byte::new(self.flash.load_byte(self.save.flash(), offset as u32))
        } else {
            // The game might select a bank past the end of a smaller ROM. In
            // that case we return FF.
            Byte::new(self.rom.get(offset).cloned().unwrap_or(0xFF))
        }
    }

    fn store_banked_byte(&mut self, bank: RomBank, addr: Word, byte: Byte) {
        if !bank.is_flash() {
            trace!("[mbc6] write {} to ROM at {} ignored", byte, addr);
            return;
        }

        if !self.flash.master.write_enabled {
            warn!("[mbc6] write {} to flash at {} while flash is write protected", byte, addr);
            return;
        }

        let offset = bank.offset(addr) as u32;
        if self.flash.accept(self.save.flash_mut(), offset, byte.get()) {
            self.dirty = true;
        }
    }

    fn store_ram_enable(&mut self, byte: Byte) {
        let enable = byte.get() == 0x0A;
        if self.regs.ram_enabled && !enable {
            self.flush_or_log();
        }
        self.regs.ram_enabled = enable;
    }

    /// Flush for the paths that have nobody to report to. The save stays
    /// dirty on failure.
    fn flush_or_log(&mut self) {
        if let Err(e) = self.flush() {
            error!("[mbc6] failed to write save: {}", e);
        }
    }
}

impl Mbc for Mbc6 {
    fn load_rom_byte(&self, addr: Word) -> Byte {
        match addr.get() {
            // Fixed banks
            0x0000..0x4000 => Byte::new(self.rom[addr.get() as usize]),

            0x4000..0x6000 => self.load_banked_byte(self.regs.rom_bank_a, addr),
            0x6000..0x8000 => self.load_banked_byte(self.regs.rom_bank_b, addr),

            _ => unreachable!(),
        }
    }

    fn store_rom_byte(&mut self, addr: Word, byte: Byte) {
        trace!("[mbc6] store {} at {}", byte, addr);

        match addr.get() {
            0x0000..0x0400 => self.store_ram_enable(byte),
            0x0400..0x0800 => self.regs.ram_bank_a = byte.get() & 0x7,
            0x0800..0x0C00 => self.regs.ram_bank_b = byte.get() & 0x7,
            0x0C00..0x1000 => self.flash.store_enable(byte.get()),

            // Only this exact address is decoded, the rest of the 1KiB
            // window does nothing.
            0x1000 => self.flash.store_write_enable(byte.get()),
            0x1001..0x2000 => {}

            0x2000..0x2800 => self.regs.rom_bank_a.set_bank(byte.get()),
            0x2800..0x3000 => self.regs.rom_bank_a.set_flash(byte.get()),
            0x3000..0x3800 => self.regs.rom_bank_b.set_bank(byte.get()),
            0x3800..0x4000 => self.regs.rom_bank_b.set_flash(byte.get()),

            0x4000..0x6000 => self.store_banked_byte(self.regs.rom_bank_a, addr, byte),
            0x6000..0x8000 => self.store_banked_byte(self.regs.rom_bank_b, addr, byte),

            _ => unreachable!(),
        }
    }

    fn load_ram_byte(&self, addr: Word) -> Byte {
        if !self.regs.ram_enabled {
            return Byte::new(0xFF);
        }

        Byte::new(self.save.ram()[self.regs.ram_index(addr)])
    }

    fn store_ram_byte(&mut self, addr: Word, byte: Byte) {
        if !self.regs.ram_enabled {
            return;
        }

        let idx = self.regs.ram_index(addr);
        let cell = &mut self.save.ram_mut()[idx];
        if *cell != byte.get() {
            *cell = byte.get();
            self.dirty = true;
        }
    }

    fn flush(&mut self) -> Result<(), Error> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(store) = &mut self.battery {
            store.save(self.save.as_bytes()).context("failed to write cartridge save")?;
            self.dirty = false;
        }

        Ok(())
    }
}

impl Drop for Mbc6 {
    fn drop(&mut self) {
        self.flush_or_log();
    }
}

// Manual implementation to omit printing the full memory.
impl fmt::Debug for Mbc6 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Mbc6")
            .field("rom_len", &self.rom.len())
            .field("regs", &self.regs)
            .field("flash_state", &self.flash.state)
            .field("flash_master", &self.flash.master)
            .field("battery", &self.battery.is_some())
            .field("dirty", &self.dirty)
            .finish()
    }
}
