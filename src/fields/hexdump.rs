use crate::cursor::{ByteReader, ByteWriter};
use crate::element::TypeCode;
use crate::err::Result;
use crate::fields::Kind;

/// Raw byte blocks rendered as hex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum HexForm {
    /// HEXD: all bytes to the end of the data.
    ToEnd,
    /// H###: a fixed number of bytes.
    Fixed(usize),
    /// BHEX/WHEX/LHEX: length prefix of `width` bytes, not counting itself.
    /// BSHX/WSHX/LSHX: same, but the stored length includes the prefix.
    Prefixed { width: u8, self_inclusive: bool },
}

#[derive(Debug, Clone)]
pub(crate) struct HexDumpField {
    pub(crate) form: HexForm,
    pub(crate) bytes: Vec<u8>,
}

pub(crate) fn hex_dump(tc: TypeCode, _label: &str) -> Option<Kind> {
    let form = match &tc.as_bytes() {
        b"HEXD" => HexForm::ToEnd,
        b"BHEX" => HexForm::Prefixed {
            width: 1,
            self_inclusive: false,
        },
        b"WHEX" => HexForm::Prefixed {
            width: 2,
            self_inclusive: false,
        },
        b"LHEX" => HexForm::Prefixed {
            width: 4,
            self_inclusive: false,
        },
        b"BSHX" => HexForm::Prefixed {
            width: 1,
            self_inclusive: true,
        },
        b"WSHX" => HexForm::Prefixed {
            width: 2,
            self_inclusive: true,
        },
        b"LSHX" => HexForm::Prefixed {
            width: 4,
            self_inclusive: true,
        },
        _ => {
            if tc.prefix1() != b"H" {
                return None;
            }
            HexForm::Fixed(tc.hex_suffix()? as usize)
        }
    };
    Some(Kind::HexDump(HexDumpField {
        form,
        bytes: Vec::new(),
    }))
}

impl HexDumpField {
    pub(crate) fn read(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        let len = match self.form {
            HexForm::ToEnd => r.remaining(),
            HexForm::Fixed(n) => n,
            HexForm::Prefixed {
                width,
                self_inclusive,
            } => {
                let stored = r.uint(width, "hex dump length")? as usize;
                if self_inclusive {
                    stored.saturating_sub(usize::from(width))
                } else {
                    stored
                }
            }
        };
        self.bytes = r.take_bytes(len, "hex dump")?.to_vec();
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        match self.form {
            HexForm::ToEnd => w.write_bytes(&self.bytes),
            HexForm::Fixed(n) => {
                // Edits never change the declared size; pad or truncate.
                if self.bytes.len() >= n {
                    w.write_bytes(&self.bytes[..n]);
                } else {
                    w.write_bytes(&self.bytes);
                    w.pad(n - self.bytes.len());
                }
            }
            HexForm::Prefixed {
                width,
                self_inclusive,
            } => {
                // The length is back-filled once the payload is in place.
                let at = w.position();
                w.write_uint(width, 0);
                w.write_bytes(&self.bytes);
                let mut stored = w.position() - at - usize::from(width);
                if self_inclusive {
                    stored += usize::from(width);
                }
                match width {
                    1 => w.write_u8_at(stored as u8, at),
                    2 => w.write_u16_at(stored as u16, at),
                    _ => w.write_u32_at(stored as u32, at),
                }
            }
        }
    }

    pub(crate) fn size(&self, size: &mut u64) {
        *size += match self.form {
            HexForm::ToEnd => self.bytes.len() as u64,
            HexForm::Fixed(n) => n as u64,
            HexForm::Prefixed { width, .. } => u64::from(width) + self.bytes.len() as u64,
        };
    }

    pub(crate) fn set(&mut self, bytes: &[u8]) -> std::result::Result<(), String> {
        if let HexForm::Prefixed {
            width,
            self_inclusive,
        } = self.form
        {
            let mut max = match width {
                1 => 0xFFu64,
                2 => 0xFFFF,
                _ => 0xFFFF_FFFF,
            };
            if self_inclusive {
                // The prefix itself counts against the stored length.
                max -= u64::from(width);
            }
            if bytes.len() as u64 > max {
                return Err(format!("hex dump is longer than {max} bytes"));
            }
        }
        self.bytes = bytes.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn self_inclusive_length_counts_the_prefix() {
        let Some(Kind::HexDump(mut f)) = hex_dump(TypeCode::new(*b"BSHX"), "") else {
            panic!("expected a hex dump")
        };
        let data = [0x04, 0xAA, 0xBB, 0xCC];
        f.read(&mut ByteReader::new(&data)).unwrap();
        assert_eq!(f.bytes, vec![0xAA, 0xBB, 0xCC]);

        let mut w = ByteWriter::default();
        f.write(&mut w);
        assert_eq!(w.as_slice(), &data);
    }

    #[test]
    fn hexd_consumes_everything() {
        let Some(Kind::HexDump(mut f)) = hex_dump(TypeCode::new(*b"HEXD"), "") else {
            panic!("expected a hex dump")
        };
        let data = [1, 2, 3, 4, 5];
        let mut r = ByteReader::new(&data);
        r.skip(2, "prefix").unwrap();
        f.read(&mut r).unwrap();
        assert_eq!(f.bytes, vec![3, 4, 5]);
        assert_eq!(r.remaining(), 0);
    }
}
