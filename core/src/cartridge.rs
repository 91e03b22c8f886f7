//! The cartridge as seen from the CPU bus.

use std::fmt;

use failure::Error;

use crate::{
    log::*,
    mbc::{Mbc, Mbc6},
    primitives::{Byte, Word},
    save::SaveStore,
};


/// A cartridge plugged into the bus.
///
/// The cartridge owns `0x0000 -- 0x7FFF` (ROM area, also used for MBC
/// registers) and `0xA000 -- 0xBFFF` (external RAM area). Everything else
/// belongs to the console: reads from there return `0x00` and writes are
/// ignored.
pub struct Cartridge {
    mbc: Box<dyn Mbc>,
}

impl Cartridge {
    pub fn new(mbc: Box<dyn Mbc>) -> Self {
        Self { mbc }
    }

    /// Creates an MBC6 cartridge. `battery` is the save store for RAM and
    /// flash; `None` means the cartridge has no battery.
    pub fn mbc6(rom: &[u8], battery: Option<Box<dyn SaveStore>>) -> Result<Self, Error> {
        let has_battery = battery.is_some();
        let mbc = Mbc6::new(rom, battery)?;
        info!("[cartridge] MBC6, {}KiB ROM, battery: {}", rom.len() / 1024, has_battery);

        Ok(Self::new(Box::new(mbc)))
    }

    /// Loads a byte from the given address.
    pub fn load_byte(&self, addr: Word) -> Byte {
        match addr.get() {
            0x0000..0x8000 => self.mbc.load_rom_byte(addr),
            0xA000..0xC000 => self.mbc.load_ram_byte(addr - 0xA000),
            _ => Byte::zero(),
        }
    }

    /// Stores the given byte at the given address.
    pub fn store_byte(&mut self, addr: Word, byte: Byte) {
        match addr.get() {
            0x0000..0x8000 => self.mbc.store_rom_byte(addr, byte),
            0xA000..0xC000 => self.mbc.store_ram_byte(addr - 0xA000, byte),
            _ => trace!("[cartridge] ignored write {} to {}", byte, addr),
        }
    }

    /// Writes battery-backed memory to the save store if it changed. On
    /// error, the next flush (or dropping the cartridge) tries again.
    pub fn flush(&mut self) -> Result<(), Error> {
        self.mbc.flush()
    }
}

// Manual implementation to omit printing the full memory.
impl fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Cartridge").finish()
    }
}


#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        fs,
        process,
        rc::Rc,
    };

    use failure::format_err;

    use super::*;
    use crate::save::{FileSave, SaveError};

    /// Counts flushes that reached the store.
    #[derive(Clone, Default)]
    struct CountingStore(Rc<Cell<usize>>);

    impl SaveStore for CountingStore {
        fn load(&mut self, _: &mut [u8]) -> Result<bool, Error> {
            Ok(false)
        }

        fn save(&mut self, _: &[u8]) -> Result<(), Error> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    /// A store whose disk is always full.
    struct BrokenStore;

    impl SaveStore for BrokenStore {
        fn load(&mut self, _: &mut [u8]) -> Result<bool, Error> {
            Ok(false)
        }

        fn save(&mut self, _: &[u8]) -> Result<(), Error> {
            Err(format_err!("disk full"))
        }
    }

    fn rom() -> Vec<u8> {
        (0..0x8000).map(|i: usize| (i >> 8) as u8).collect()
    }

    fn cartridge(store: Option<CountingStore>) -> Cartridge {
        let battery = store.map(|s| Box::new(s) as Box<dyn SaveStore>);
        Cartridge::mbc6(&rom(), battery).unwrap()
    }

    fn load(cart: &Cartridge, addr: u16) -> u8 {
        cart.load_byte(Word::new(addr)).get()
    }

    fn store(cart: &mut Cartridge, addr: u16, byte: u8) {
        cart.store_byte(Word::new(addr), Byte::new(byte));
    }

    #[test]
    fn unmapped_areas() {
        let mut cart = cartridge(None);
        for &addr in &[0x8000, 0x9FFF, 0xC000, 0xDFFF, 0xFF00, 0xFFFF] {
            assert_eq!(load(&cart, addr), 0x00);
            store(&mut cart, addr, 0x42);
            assert_eq!(load(&cart, addr), 0x00);
        }
    }

    #[test]
    fn rom_area() {
        let cart = cartridge(None);
        assert_eq!(load(&cart, 0x0000), 0x00);
        assert_eq!(load(&cart, 0x1234), 0x12);
        assert_eq!(load(&cart, 0x3FFF), 0x3F);

        // Bank 0 is mapped to both halves after power on.
        assert_eq!(load(&cart, 0x4000), 0x00);
        assert_eq!(load(&cart, 0x6100), 0x01);
    }

    #[test]
    fn reads_have_no_side_effects() {
        let mut cart = cartridge(None);
        store(&mut cart, 0x0000, 0x0A);
        store(&mut cart, 0xA010, 0x05);

        let before: Vec<u8> = (0..=0xFFFFu16).map(|a| load(&cart, a)).collect();
        let after: Vec<u8> = (0..=0xFFFFu16).map(|a| load(&cart, a)).collect();
        assert!(before == after);
    }

    #[test]
    fn ram_through_bus() {
        let mut cart = cartridge(None);
        assert_eq!(load(&cart, 0xA010), 0xFF);

        store(&mut cart, 0x0000, 0x0A);
        store(&mut cart, 0xA010, 0x05);
        assert_eq!(load(&cart, 0xA010), 0x05);

        // B window with another bank
        store(&mut cart, 0x0800, 1);
        store(&mut cart, 0xB010, 0x06);
        assert_eq!(load(&cart, 0xB010), 0x06);
        assert_eq!(load(&cart, 0xA010), 0x05);
        store(&mut cart, 0x0400, 1);
        assert_eq!(load(&cart, 0xA010), 0x06);
    }

    #[test]
    fn disable_ram_flushes_once() {
        let store_count = CountingStore::default();
        let mut cart = cartridge(Some(store_count.clone()));

        store(&mut cart, 0x0000, 0x0A);
        store(&mut cart, 0xA000, 0x01);
        store(&mut cart, 0x0000, 0x00);
        assert_eq!(store_count.0.get(), 1);

        cart.flush().unwrap();
        drop(cart);
        assert_eq!(store_count.0.get(), 1);
    }

    #[test]
    fn explicit_flush() {
        let store_count = CountingStore::default();
        let mut cart = cartridge(Some(store_count.clone()));

        store(&mut cart, 0x0000, 0x0A);
        store(&mut cart, 0xA000, 0x01);
        cart.flush().unwrap();
        assert_eq!(store_count.0.get(), 1);

        // Still enabled, disabling now finds nothing to flush.
        store(&mut cart, 0x0000, 0x00);
        assert_eq!(store_count.0.get(), 1);
    }

    #[test]
    fn failed_flush_is_an_error() {
        let mut cart = Cartridge::mbc6(&rom(), Some(Box::new(BrokenStore))).unwrap();

        // Clean, so the store isn't asked.
        assert!(cart.flush().is_ok());

        store(&mut cart, 0x0000, 0x0A);
        store(&mut cart, 0xA000, 0x01);
        assert!(cart.flush().is_err());

        // Still dirty, so the next attempt fails again.
        assert!(cart.flush().is_err());
    }

    #[test]
    fn save_file_of_wrong_length() {
        let path = std::env::temp_dir()
            .join(format!("flashbank-{}-cartridge-short.sav", process::id()));
        fs::write(&path, &[0u8; 0x8000]).unwrap();

        let battery = Box::new(FileSave::new(&path)) as Box<dyn SaveStore>;
        let err = Cartridge::mbc6(&rom(), Some(battery)).unwrap_err();
        assert!(err.iter_chain().any(|c| match c.downcast_ref::<SaveError>() {
            Some(SaveError::WrongSize { actual: 0x8000, .. }) => true,
            _ => false,
        }));

        fs::remove_file(&path).unwrap();
    }
}
