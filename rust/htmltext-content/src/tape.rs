//! Binary run tape
//!
//! Flat encoding of an `AttributedText` for hosts that read runs in one
//! copy instead of one call per field:
//!
//! ```text
//! TapeHeader | RunRecord * run_count | UTF-8 pool (pool_len bytes)
//! ```
//!
//! Integers are in host byte order; the tape never leaves the process.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::runs::{AttributedText, RunKind, StyledRun};
use crate::style::StyleFlags;

/// Tape magic number "HTXR"
pub const MAGIC_NUMBER: u32 = 0x48545852;
/// Current tape format version
pub const FORMAT_VERSION: u32 = 1;
/// `href_offset` of runs without a link
pub const NO_HREF: u32 = u32::MAX;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct TapeHeader {
    pub magic: u32,
    pub version: u32,
    pub run_count: u32,
    pub pool_len: u32,
}

/// One run; text and href are byte ranges into the pool
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct RunRecord {
    pub kind: u8,
    pub flags: u8,
    pub _pad: [u8; 2],
    pub text_offset: u32,
    pub text_len: u32,
    pub href_offset: u32,
    pub href_len: u32,
}

/// Decoded tape
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunTape {
    pub records: Vec<RunRecord>,
    pub pool: Vec<u8>,
}

impl RunTape {
    /// Lay out runs as records over a shared string pool
    pub fn encode(text: &AttributedText) -> Self {
        let mut tape = Self::default();
        for run in text {
            let (text_offset, text_len) = tape.intern(&run.text);
            let (href_offset, href_len) = match &run.href {
                Some(href) => tape.intern(href),
                None => (NO_HREF, 0),
            };
            tape.records.push(RunRecord {
                kind: run.kind as u8,
                flags: run.flags.bits(),
                _pad: [0; 2],
                text_offset,
                text_len,
                href_offset,
                href_len,
            });
        }
        tape
    }

    fn intern(&mut self, s: &str) -> (u32, u32) {
        let offset = self.pool.len() as u32;
        self.pool.extend_from_slice(s.as_bytes());
        (offset, s.len() as u32)
    }

    pub fn write_binary(&self) -> Vec<u8> {
        let header = TapeHeader {
            magic: MAGIC_NUMBER,
            version: FORMAT_VERSION,
            run_count: self.records.len() as u32,
            pool_len: self.pool.len() as u32,
        };

        let mut buf = Vec::with_capacity(
            size_of::<TapeHeader>() + self.records.len() * size_of::<RunRecord>() + self.pool.len(),
        );
        buf.extend_from_slice(header.as_bytes());
        for record in &self.records {
            buf.extend_from_slice(record.as_bytes());
        }
        buf.extend_from_slice(&self.pool);
        buf
    }

    /// Parse a tape; `None` on a bad header or truncated data
    pub fn read_binary(data: &[u8]) -> Option<Self> {
        let (header, mut rest) = TapeHeader::read_from_prefix(data).ok()?;
        if header.magic != MAGIC_NUMBER || header.version != FORMAT_VERSION {
            return None;
        }

        let run_count = header.run_count as usize;
        if rest.len() < run_count.checked_mul(size_of::<RunRecord>())? {
            return None;
        }
        let mut records = Vec::with_capacity(run_count);
        for _ in 0..run_count {
            let (record, tail) = RunRecord::read_from_prefix(rest).ok()?;
            records.push(record);
            rest = tail;
        }

        if rest.len() != header.pool_len as usize {
            return None;
        }
        Some(Self {
            records,
            pool: rest.to_vec(),
        })
    }

    fn pool_str(&self, offset: u32, len: u32) -> Option<&str> {
        let start = offset as usize;
        let end = start.checked_add(len as usize)?;
        std::str::from_utf8(self.pool.get(start..end)?).ok()
    }

    /// Rebuild the runs; `None` if any record is inconsistent
    pub fn decode(&self) -> Option<AttributedText> {
        let mut runs = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let kind = RunKind::from_u8(record.kind)?;
            let text = self.pool_str(record.text_offset, record.text_len)?;
            if (kind == RunKind::Text) == text.is_empty() {
                return None;
            }
            let href = match record.href_offset {
                NO_HREF => None,
                offset => Some(self.pool_str(offset, record.href_len)?.to_string()),
            };
            runs.push(StyledRun {
                kind,
                text: text.to_string(),
                flags: StyleFlags::from_bits(record.flags),
                href,
            });
        }
        Some(AttributedText::from_runs(runs))
    }
}

impl AttributedText {
    pub fn write_binary(&self) -> Vec<u8> {
        RunTape::encode(self).write_binary()
    }

    pub fn read_binary(data: &[u8]) -> Option<Self> {
        RunTape::read_binary(data)?.decode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AttributedText {
        AttributedText::from_runs(vec![
            StyledRun::text("Hello ", StyleFlags::NONE),
            StyledRun::link("world", StyleFlags::UNDERLINE | StyleFlags::BOLD, "https://a.test"),
            StyledRun::paragraph_break(),
        ])
    }

    #[test]
    fn test_record_layout() {
        assert_eq!(size_of::<TapeHeader>(), 16);
        assert_eq!(size_of::<RunRecord>(), 20);
    }

    #[test]
    fn test_binary_roundtrip() {
        let text = sample();
        let bytes = text.write_binary();
        assert_eq!(&bytes[..4], MAGIC_NUMBER.to_ne_bytes().as_slice());

        let tape = RunTape::read_binary(&bytes).unwrap();
        assert_eq!(tape.records.len(), 3);
        assert_eq!(tape.records[2].kind, RunKind::ParagraphBreak as u8);
        assert_eq!(tape.records[2].href_offset, NO_HREF);
        assert_eq!(tape.decode().unwrap(), text);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = sample().write_binary();
        bytes[0] ^= 0xFF;
        assert!(RunTape::read_binary(&bytes).is_none());
    }

    #[test]
    fn test_rejects_truncated() {
        let bytes = sample().write_binary();
        assert!(RunTape::read_binary(&bytes[..bytes.len() - 1]).is_none());
        assert!(RunTape::read_binary(&bytes[..10]).is_none());
        assert!(RunTape::read_binary(&[]).is_none());
    }

    #[test]
    fn test_decode_rejects_out_of_range_text() {
        let mut tape = RunTape::encode(&sample());
        tape.records[0].text_len = 1000;
        assert!(tape.decode().is_none());
    }

    #[test]
    fn test_empty_tape() {
        let bytes = AttributedText::empty().write_binary();
        assert_eq!(bytes.len(), size_of::<TapeHeader>());
        assert_eq!(AttributedText::read_binary(&bytes), Some(AttributedText::empty()));
    }
}
