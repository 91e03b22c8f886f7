//! The NOR flash chip soldered onto MBC6 cartridges.
//!
//! The chip speaks the usual JEDEC/AMD command protocol: every command is
//! preceded by an unlock sequence of two magic writes (`0xAA` to `0x5555`,
//! then `0x55` to `0x2AAA`). Erasing needs the unlock sequence twice, with the
//! erase setup command `0x80` in between. Programming stages one 128 byte page
//! in a buffer which is then AND-ed into the array, so programming can only
//! ever clear bits. Only erasing sets them again.
//!
//! While an erase is pending or a page is being committed, the array cannot be
//! read. The chip answers with fixed status bytes instead, which games poll.

use crate::log::*;


/// Size of the flash array: 1MiB.
pub(crate) const FLASH_SIZE: usize = 0x10_0000;

/// Size of an erase sector. This equals the size of a flash bank mapped into
/// one of the two ROM/flash windows.
pub(crate) const SECTOR_SIZE: usize = 0x2000;

/// Size of one program page.
pub(crate) const PAGE_SIZE: usize = 0x80;

const UNLOCK_ADDR_1: u32 = 0x5555;
const UNLOCK_ADDR_2: u32 = 0x2AAA;

/// Status byte returned while an erase is pending or a page is committed.
const STATUS_BUSY: u8 = 0x80;

/// Status byte returned while the chip waits for page data.
const STATUS_PROGRAMMING: u8 = 0x00;


/// Where the chip is in its command protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommandState {
    /// Plain array reads, waiting for the first unlock write.
    Idle,

    /// Got `0xAA` at `0x5555`.
    GotAA,

    /// Got the full unlock sequence, the next write at `0x5555` is a command.
    Got55,

    /// The erase setup command `0x80` was accepted. Another unlock sequence
    /// has to follow.
    EraseArmed,

    /// Got `0xAA` at `0x5555` after the erase setup command.
    ErasePending1,

    /// Got the second unlock sequence, the next write picks chip or sector
    /// erase.
    ErasePending2,

    /// The program command `0xA0` was accepted, writes fill the page buffer.
    Programming,

    /// The page buffer was committed. The chip reports busy until the commit
    /// is acknowledged.
    BufferFlushing,
}

/// The two flash control bits in the MBC6 register space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FlashMaster {
    /// Set through `0x0C00`.
    pub(crate) enabled: bool,

    /// Set through `0x1000`. Without it, no write ever reaches the chip.
    pub(crate) write_enabled: bool,
}

impl FlashMaster {
    /// Whether the chip accepts the program (`0xA0`) and erase setup (`0x80`)
    /// commands. The hardware only arms those when writing is enabled while
    /// the master enable bit is clear.
    fn accepts_double_commands(&self) -> bool {
        self.write_enabled && !self.enabled
    }
}

/// Erase operations that have not been acknowledged by a reset command yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct EraseStatus {
    pub(crate) chip: bool,
    pub(crate) sector: bool,
}

impl EraseStatus {
    fn any(&self) -> bool {
        self.chip || self.sector
    }
}

/// Staging area for one program operation.
struct PageBuffer {
    data: [u8; PAGE_SIZE],

    /// The address of the page the buffer belongs to. It is latched by the
    /// first write after the program command; writes to other pages are
    /// dropped until the next program command.
    base: Option<u32>,

    /// Set as soon as the last byte of the page was written once. Writing
    /// `0x00` to the last byte again commits the buffer.
    final_written: bool,
}

impl PageBuffer {
    fn new() -> Self {
        Self {
            data: [0xFF; PAGE_SIZE],
            base: None,
            final_written: false,
        }
    }

    fn clear(&mut self) {
        *self = Self::new();
    }
}

/// The flash chip's command interpreter and status bits.
///
/// The array itself lives in the save region of the controller and is passed
/// in by reference, so this type only holds protocol state.
pub(crate) struct Flash {
    pub(crate) state: CommandState,
    pub(crate) master: FlashMaster,

    /// Set by the software ID command (`0x90`) and never cleared again.
    pub(crate) erase_suspend_allowed: bool,

    pub(crate) erase: EraseStatus,
    page: PageBuffer,
}

impl Flash {
    pub(crate) fn new() -> Self {
        Self {
            state: CommandState::Idle,
            master: FlashMaster::default(),
            erase_suspend_allowed: false,
            erase: EraseStatus::default(),
            page: PageBuffer::new(),
        }
    }

    /// Handles a write to the flash enable register (`0x0C00`). Only has an
    /// effect after the software ID command was issued once.
    pub(crate) fn store_enable(&mut self, byte: u8) {
        if self.erase_suspend_allowed {
            self.master.enabled = byte & 0x1 != 0;
        } else {
            trace!("[flash] enable write 0x{:02x} ignored, software ID not issued", byte);
        }
    }

    /// Handles a write to the flash write-enable register (`0x1000`).
    pub(crate) fn store_write_enable(&mut self, byte: u8) {
        self.master.write_enabled = byte & 0x1 != 0;
    }

    /// Reads one byte of the array at `addr`, unless the chip is busy, in
    /// which case a status byte is returned instead.
    pub(crate) fn load_byte(&self, array: &[u8], addr: u32) -> u8 {
        if self.erase.any() || self.state == CommandState::BufferFlushing {
            STATUS_BUSY
        } else if self.state == CommandState::Programming {
            STATUS_PROGRAMMING
        } else {
            array[addr as usize]
        }
    }

    /// Feeds one bus write into the command interpreter. `addr` is the
    /// absolute address inside the flash array.
    ///
    /// Must only be called while writing is enabled. Returns `true` if the
    /// array was modified.
    pub(crate) fn accept(&mut self, array: &mut [u8], addr: u32, byte: u8) -> bool {
        use self::CommandState::*;

        debug_assert!(self.master.write_enabled);
        debug_assert_eq!(array.len(), FLASH_SIZE);
        debug_assert!((addr as usize) < FLASH_SIZE);

        // The unlock sequence is recognized in every state and restarts
        // whatever command was in progress.
        if addr == UNLOCK_ADDR_1 && byte == 0xAA {
            self.state = match self.state {
                EraseArmed => ErasePending1,
                _ => GotAA,
            };
            return false;
        }
        if addr == UNLOCK_ADDR_2 && byte == 0x55 {
            self.state = match self.state {
                GotAA => Got55,
                ErasePending1 => ErasePending2,
                _ => Idle,
            };
            return false;
        }

        let sector_aligned = addr as usize % SECTOR_SIZE == 0;
        match self.state {
            Got55 if addr == UNLOCK_ADDR_1 => {
                self.command(byte);
                false
            }
            Got55 if sector_aligned => {
                if byte == 0xF0 {
                    debug!("[flash] sector erase acknowledged at 0x{:05x}", addr);
                    self.erase.sector = false;
                }
                self.state = Idle;
                false
            }
            ErasePending2 if addr == UNLOCK_ADDR_1 && byte == 0x10 => {
                debug!("[flash] chip erase");
                array.fill(0xFF);
                self.erase.chip = true;
                self.state = Idle;
                true
            }
            ErasePending2 if sector_aligned && byte == 0x30 => {
                debug!("[flash] sector erase at 0x{:05x}", addr);
                let start = addr as usize;
                array[start..start + SECTOR_SIZE].fill(0xFF);
                self.erase.sector = true;
                self.state = Idle;
                true
            }
            Programming => self.program(array, addr, byte),
            BufferFlushing => {
                if self.page.base.map(|base| base + PAGE_SIZE as u32 - 1) == Some(addr)
                    && byte == 0xF0
                {
                    debug!("[flash] page commit acknowledged");
                    self.state = Idle;
                }
                false
            }
            _ => {
                if self.state != Idle {
                    trace!(
                        "[flash] unexpected write 0x{:02x} to 0x{:05x} in state {:?}",
                        byte,
                        addr,
                        self.state,
                    );
                }
                self.state = Idle;
                false
            }
        }
    }

    /// Executes a command byte written to `0x5555` after a full unlock
    /// sequence.
    fn command(&mut self, byte: u8) {
        use self::CommandState::*;

        self.state = match byte {
            0xA0 | 0x80 => {
                self.page.clear();
                if !self.master.accepts_double_commands() {
                    debug!("[flash] command 0x{:02x} rejected by master bits", byte);
                    Idle
                } else if byte == 0xA0 {
                    debug!("[flash] program armed");
                    Programming
                } else {
                    debug!("[flash] erase armed");
                    EraseArmed
                }
            }

            // Reset
            0xF0 => {
                if self.erase_suspend_allowed || self.erase.any() {
                    debug!("[flash] reset, clearing erase status");
                    self.erase = EraseStatus::default();
                }
                Idle
            }

            // Software ID
            0x90 => {
                debug!("[flash] software ID, erase suspend allowed");
                self.erase_suspend_allowed = true;
                Idle
            }

            _ => {
                trace!("[flash] unknown command 0x{:02x}", byte);
                Idle
            }
        };
    }

    /// Stores one byte into the page buffer and commits the buffer if this
    /// write completes the program operation.
    fn program(&mut self, array: &mut [u8], addr: u32, byte: u8) -> bool {
        let page_mask = PAGE_SIZE as u32 - 1;
        let base = *self.page.base.get_or_insert(addr & !page_mask);
        if base != addr & !page_mask {
            trace!("[flash] write to 0x{:05x} outside of page 0x{:05x} dropped", addr, base);
            return false;
        }

        let offset = (addr & page_mask) as usize;
        self.page.data[offset] = byte;
        if offset != PAGE_SIZE - 1 {
            return false;
        }

        let commit = self.page.final_written && byte == 0;
        self.page.final_written = true;
        if commit {
            debug!("[flash] committing page 0x{:05x}", base);
            let start = base as usize;
            let page = &mut array[start..start + PAGE_SIZE];
            for (dst, src) in page.iter_mut().zip(self.page.data.iter()) {
                *dst &= *src;
            }
            self.state = CommandState::BufferFlushing;
        }

        commit
    }
}
