use std::{
    ops::Sub,
    fmt::{self, Debug, Display},
};

use derive_more::{From, Into};


/// A single byte on the cartridge bus.
#[derive(Clone, Copy, PartialEq, Eq, From, Into)]
pub struct Byte(u8);

impl Byte {
    pub fn new(val: u8) -> Self {
        Byte(val)
    }

    pub fn zero() -> Self {
        Self::new(0)
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Debug for Byte {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

impl Display for Byte {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

/// A 16 bit address on the cartridge bus.
#[derive(Clone, Copy, PartialEq, Eq, From, Into)]
pub struct Word(u16);

impl Word {
    pub fn new(val: u16) -> Self {
        Word(val)
    }

    pub fn get(&self) -> u16 {
        self.0
    }
}

impl Sub<u16> for Word {
    type Output = Self;

    fn sub(self, rhs: u16) -> Self {
        Word(self.0.wrapping_sub(rhs))
    }
}

impl Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

impl Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Debug::fmt(self, f)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_subtraction_wraps() {
        assert_eq!(Word::new(0xB123) - 0xA000, Word::new(0x1123));
        assert_eq!(Word::new(0xA000) - 0xA000, Word::new(0));
        assert_eq!(Word::new(0x0000) - 1, Word::new(0xFFFF));
    }

    #[test]
    fn conversions() {
        let b: Byte = 0x0Au8.into();
        assert_eq!(b.get(), 0x0A);
        assert_eq!(u8::from(Byte::new(0x80)), 0x80);

        let w: Word = 0x5555u16.into();
        assert_eq!(w.get(), 0x5555);
        assert_eq!(format!("{}", w), "0x5555");
        assert_eq!(format!("{:?}", Byte::new(0xF)), "0x0f");
    }
}
