//! Parsing of bus scripts.

use failure::{bail, format_err, Error, ResultExt};

use flashbank::primitives::{Byte, Word};


/// One operation of a bus script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Write(Word, Byte),
    Read {
        addr: Word,
        expected: Option<Byte>,
    },
    Flush,
}

/// An operation together with the line it came from (starting at 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Line {
    pub(crate) number: usize,
    pub(crate) op: Op,
}

pub(crate) fn parse(src: &str) -> Result<Vec<Line>, Error> {
    let mut out = Vec::new();
    for (i, raw) in src.lines().enumerate() {
        let number = i + 1;
        let content = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        };

        let words: Vec<_> = content.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let op = parse_op(&words).with_context(|_| format!("invalid script line {}", number))?;
        out.push(Line { number, op });
    }

    Ok(out)
}

fn parse_op(words: &[&str]) -> Result<Op, Error> {
    let op = match words {
        ["w", addr, value] => Op::Write(parse_addr(addr)?, parse_byte(value)?),
        ["r", addr] => Op::Read {
            addr: parse_addr(addr)?,
            expected: None,
        },
        ["r", addr, value] => Op::Read {
            addr: parse_addr(addr)?,
            expected: Some(parse_byte(value)?),
        },
        ["flush"] => Op::Flush,
        _ => bail!("expected 'w ADDR VALUE', 'r ADDR [VALUE]' or 'flush', found '{}'", words.join(" ")),
    };

    Ok(op)
}

fn parse_addr(src: &str) -> Result<Word, Error> {
    u16::from_str_radix(src, 16)
        .map(Word::new)
        .map_err(|e| format_err!(
            "failed to parse address '{}': {} (values like '4000' are valid -- no \
                leading `0x`!)",
            src,
            e,
        ))
}

fn parse_byte(src: &str) -> Result<Byte, Error> {
    u8::from_str_radix(src, 16)
        .map(Byte::new)
        .map_err(|e| format_err!(
            "failed to parse byte '{}': {} (values like 'ff' are valid -- no \
                leading `0x`!)",
            src,
            e,
        ))
}
