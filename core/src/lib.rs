//! Emulation of the MBC6 memory bank controller of Game Boy cartridges,
//! including the flash chip it drives.
//!
//! The entry point is [`Cartridge`]: plug it into the bus of an emulator and
//! forward all cartridge reads and writes to it. Battery-backed memory is
//! loaded from and written to a [`SaveStore`].

pub mod cartridge;
pub mod log;
pub mod mbc;
pub mod primitives;
pub mod save;

pub use crate::{
    cartridge::Cartridge,
    mbc::{Mbc, Mbc6},
    primitives::{Byte, Word},
    save::{FileSave, SaveError, SaveStore},
};
