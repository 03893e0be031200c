use log::warn;

use crate::cursor::{ByteReader, ByteWriter};
use crate::element::{ElemId, ListId, TypeCode};
use crate::err::Result;
use crate::fields::Kind;
use crate::fields::case::{CaseOption, parse_int, pop_options};
use crate::template::Template;
use crate::value::Value;

/// BBIT/WBIT/LBIT single bits and BB##/WB##/LB## bit ranges.
///
/// Consecutive bit elements share one backing integer: the first element of
/// a run claims the following bit elements until the backing width is
/// exactly filled, then reads/writes the whole integer on their behalf.
#[derive(Debug, Clone)]
pub(crate) struct BitsField {
    pub(crate) width: u8,
    pub(crate) bits: u32,
    pub(crate) shift: Option<u32>,
    /// Populated on the first element of a run only.
    pub(crate) members: Vec<ElemId>,
    pub(crate) first: bool,
    pub(crate) value: u64,
    pub(crate) options: Vec<CaseOption>,
}

pub(crate) fn bit_field(tc: TypeCode, _label: &str) -> Option<Kind> {
    let (width, bits) = match &tc.as_bytes() {
        b"BBIT" => (1, 1),
        b"WBIT" => (2, 1),
        b"LBIT" => (4, 1),
        _ => {
            let bits = tc.dec_suffix()?;
            let width = match tc.prefix2() {
                b"BB" => 1,
                b"WB" => 2,
                b"LB" => 4,
                _ => return None,
            };
            if bits == 0 || bits > u32::from(width) * 8 {
                return None;
            }
            (width, bits)
        }
    };
    Some(Kind::Bits(BitsField {
        width,
        bits,
        shift: None,
        members: Vec::new(),
        first: false,
        value: 0,
        options: Vec::new(),
    }))
}

impl BitsField {
    fn mask(bits: u32) -> u64 {
        if bits >= 64 { u64::MAX } else { (1 << bits) - 1 }
    }

    pub(crate) fn configure(
        &mut self,
        tpl: &mut Template,
        id: ElemId,
        list: ListId,
    ) -> Result<()> {
        self.options = pop_options(tpl, list);
        if self.shift.is_some() {
            // Claimed by an earlier element of the run.
            return Ok(());
        }
        self.first = true;
        let total = u32::from(self.width) * 8;
        let mut pos = total
            .checked_sub(self.bits)
            .ok_or_else(|| tpl.invalid(id, "bit range exceeds its backing integer"))?;
        self.shift = Some(pos);
        // Bits are assigned high-to-low; the scan skips option entries that
        // belong to upcoming members.
        let mut n = 1;
        while pos > 0 {
            let Some(next) = tpl.peek(list, n) else {
                return Err(tpl.invalid(id, "not enough bits to fill the bit field"));
            };
            n += 1;
            let member_bits = match &tpl.elem(next).kind {
                Kind::Case(_) | Kind::CaseRange(_) => continue,
                Kind::Bits(b) if b.width == self.width && b.bits <= pos => b.bits,
                _ => {
                    return Err(tpl.invalid(id, "not enough bits to fill the bit field"));
                }
            };
            pos -= member_bits;
            if let Kind::Bits(b) = &mut tpl.elem_mut(next).kind {
                b.shift = Some(pos);
            }
            self.members.push(next);
        }
        Ok(())
    }

    pub(crate) fn read(&mut self, tpl: &mut Template, r: &mut ByteReader<'_>) -> Result<()> {
        if !self.first {
            return Ok(());
        }
        let raw = r.uint(self.width, "bit field")?;
        let shift = self.shift.unwrap_or(0);
        self.value = (raw >> shift) & Self::mask(self.bits);
        for &m in &self.members {
            if let Kind::Bits(b) = &mut tpl.elem_mut(m).kind {
                let shift = b.shift.unwrap_or(0);
                b.value = (raw >> shift) & Self::mask(b.bits);
            }
        }
        Ok(())
    }

    pub(crate) fn write(&self, tpl: &Template, w: &mut ByteWriter) {
        if !self.first {
            return;
        }
        let shift = self.shift.unwrap_or(0);
        let mut raw = (self.value & Self::mask(self.bits)) << shift;
        for &m in &self.members {
            if let Kind::Bits(b) = &tpl.elem(m).kind {
                let shift = b.shift.unwrap_or(0);
                raw |= (b.value & Self::mask(b.bits)) << shift;
            }
        }
        w.write_uint(self.width, raw);
    }

    pub(crate) fn size(&self, size: &mut u64) {
        if self.first {
            *size += u64::from(self.width);
        }
    }

    pub(crate) fn set(&mut self, v: u64) -> std::result::Result<(), String> {
        if v > Self::mask(self.bits) {
            return Err(format!("{v} does not fit {} bit(s)", self.bits));
        }
        self.value = v;
        Ok(())
    }
}

/// BORV/WORV/LORV: a backing integer treated as an OR-combination of named
/// masks declared by the following CASE entries.
///
/// The raw integer is authoritative; masks are toggles over it. Clearing a
/// mask clears exactly its bits, including any shared with other set masks.
#[derive(Debug, Clone)]
pub(crate) struct OrValueField {
    pub(crate) width: u8,
    pub(crate) raw: u64,
    pub(crate) options: Vec<CaseOption>,
}

pub(crate) fn or_value(tc: TypeCode, _label: &str) -> Option<Kind> {
    let width = match &tc.as_bytes() {
        b"BORV" => 1,
        b"WORV" => 2,
        b"LORV" => 4,
        _ => return None,
    };
    Some(Kind::OrValue(OrValueField {
        width,
        raw: 0,
        options: Vec::new(),
    }))
}

impl OrValueField {
    pub(crate) fn configure(&mut self, tpl: &mut Template, list: ListId) -> Result<()> {
        self.options = pop_options(tpl, list);
        Ok(())
    }

    pub(crate) fn read(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        self.raw = r.uint(self.width, "or-value")?;
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_uint(self.width, self.raw);
    }

    pub(crate) fn value(&self) -> Value<'_> {
        Value::Hex(self.raw)
    }

    /// The mask declared by a named option, if it parses as an integer.
    pub(crate) fn mask_of(&self, name: &str) -> Option<u64> {
        self.options
            .iter()
            .find(|o| o.name() == name)
            .and_then(|o| o.raw_value())
            .and_then(parse_int)
            .map(|v| v as u64)
    }

    /// Whether all bits of the named mask are currently set.
    pub(crate) fn is_set(&self, name: &str) -> Option<bool> {
        self.mask_of(name).map(|m| self.raw & m == m)
    }

    pub(crate) fn toggle(&mut self, name: &str, on: bool) -> std::result::Result<(), String> {
        let Some(mask) = self.mask_of(name) else {
            return Err(format!("no option named \u{201c}{name}\u{201d}"));
        };
        if on {
            self.raw |= mask;
        } else {
            self.raw &= !mask;
        }
        Ok(())
    }

    pub(crate) fn set(&mut self, v: u64) -> std::result::Result<(), String> {
        let bits = u32::from(self.width) * 8;
        if v >> bits != 0 {
            warn!("or-value {v:#x} exceeds the {bits}-bit backing integer");
            return Err(format!("{v:#x} does not fit {bits} bits"));
        }
        self.raw = v;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn or_field(options: &[(&str, &str)]) -> OrValueField {
        OrValueField {
            width: 1,
            raw: 0,
            options: options
                .iter()
                .map(|(n, v)| CaseOption::One {
                    name: n.to_string(),
                    value: v.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn overlapping_masks_last_toggle_wins() {
        crate::ensure_env_logger_initialized();
        let mut f = or_field(&[("A", "0x03"), ("B", "0x06")]);
        f.toggle("A", true).unwrap();
        f.toggle("B", true).unwrap();
        assert_eq!(f.raw, 0x07);
        // Clearing B clears its bits even though bit 1 was also claimed by A.
        f.toggle("B", false).unwrap();
        assert_eq!(f.raw, 0x01);
        assert_eq!(f.is_set("A"), Some(false));
    }

    #[test]
    fn bit_mask_helper() {
        assert_eq!(BitsField::mask(1), 0b1);
        assert_eq!(BitsField::mask(5), 0b1_1111);
        assert_eq!(BitsField::mask(64), u64::MAX);
    }
}
