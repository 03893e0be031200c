use log::warn;

use crate::cursor::{ByteReader, ByteWriter};
use crate::element::TypeCode;
use crate::err::Result;
use crate::fields::Kind;

/// List counters: the decoded count drives the following counted list.
///
/// Unsigned counters store the count directly; signed ("zero-based")
/// counters store count − 1, so −1 encodes an empty list. FCNT carries a
/// fixed count in its label and occupies no bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CounterForm {
    Stored { width: u8, zero_based: bool },
    Fixed,
}

#[derive(Debug, Clone)]
pub(crate) struct CounterField {
    pub(crate) form: CounterForm,
    pub(crate) count: u32,
}

pub(crate) fn counter(tc: TypeCode, _label: &str) -> Option<Kind> {
    let (width, zero_based) = match &tc.as_bytes() {
        b"BCNT" => (1, false),
        b"OCNT" | b"WCNT" => (2, false),
        b"LCNT" => (4, false),
        b"ZCNT" => (2, true),
        b"LZCT" => (4, true),
        _ => return None,
    };
    Some(Kind::Counter(CounterField {
        form: CounterForm::Stored { width, zero_based },
        count: 0,
    }))
}

pub(crate) fn fixed_count(_tc: TypeCode, label: &str) -> Option<Kind> {
    // The count is the leading run of digits in the label, e.g. "16 Colors".
    let digits: String = label.chars().take_while(|c| c.is_ascii_digit()).collect();
    let count = digits.parse().ok()?;
    Some(Kind::Counter(CounterField {
        form: CounterForm::Fixed,
        count,
    }))
}

impl CounterField {
    pub(crate) fn is_fixed(&self) -> bool {
        self.form == CounterForm::Fixed
    }

    pub(crate) fn read(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        let CounterForm::Stored { width, zero_based } = self.form else {
            return Ok(());
        };
        self.count = if zero_based {
            let raw = r.int(width, "count")?;
            if raw < -1 {
                warn!("{raw} is an irregular zero-based count, coercing to empty");
            }
            u32::try_from(raw + 1).unwrap_or(0)
        } else {
            r.uint(width, "count")? as u32
        };
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        let CounterForm::Stored { width, zero_based } = self.form else {
            return;
        };
        if zero_based {
            w.write_int(width, i64::from(self.count) - 1);
        } else {
            w.write_uint(width, u64::from(self.count));
        }
    }

    pub(crate) fn size(&self, size: &mut u64) {
        if let CounterForm::Stored { width, .. } = self.form {
            *size += u64::from(width);
        }
    }

    /// The largest entry count this counter can encode.
    pub(crate) fn max_count(&self) -> u32 {
        match self.form {
            CounterForm::Fixed => self.count,
            CounterForm::Stored { width, zero_based } => {
                let bits = u32::from(width) * 8;
                if zero_based {
                    1 << (bits - 1)
                } else if bits >= 32 {
                    u32::MAX
                } else {
                    (1 << bits) - 1
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn zero_based_counts_are_offset_by_one() {
        let Some(Kind::Counter(mut c)) = counter(TypeCode::new(*b"ZCNT"), "") else {
            panic!("expected a counter")
        };
        let data = [0xFF, 0xFF]; // -1: empty list
        c.read(&mut ByteReader::new(&data)).unwrap();
        assert_eq!(c.count, 0);
        let mut w = ByteWriter::default();
        c.write(&mut w);
        assert_eq!(w.as_slice(), &data);

        let data = [0x00, 0x02]; // 2: three entries
        c.read(&mut ByteReader::new(&data)).unwrap();
        assert_eq!(c.count, 3);
    }

    #[test]
    fn fixed_count_comes_from_the_label() {
        let Some(Kind::Counter(c)) = fixed_count(TypeCode::new(*b"FCNT"), "12 Entries") else {
            panic!("expected a counter")
        };
        assert_eq!(c.count, 12);
        assert!(c.is_fixed());
        let mut size = 0;
        c.size(&mut size);
        assert_eq!(size, 0);
    }

    #[test]
    fn fixed_count_requires_digits() {
        assert!(fixed_count(TypeCode::new(*b"FCNT"), "Entries").is_none());
    }
}
