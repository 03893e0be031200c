use crate::cursor::{ByteReader, ByteWriter};
use crate::element::{ListId, TypeCode};
use crate::err::Result;
use crate::fields::Kind;
use crate::fields::case::{CaseOption, pop_options};
use crate::template::Template;
use crate::value::Value;

/// Signed integer fields (`DBYT`/`DWRD`/`DLNG`/`DLLG` plus the signed
/// compatibility aliases).
#[derive(Debug, Clone)]
pub(crate) struct IntField {
    pub(crate) width: u8,
    pub(crate) value: i64,
    pub(crate) options: Vec<CaseOption>,
}

pub(crate) fn signed_int(tc: TypeCode, _label: &str) -> Option<Kind> {
    let width = match &tc.as_bytes() {
        b"DBYT" | b"STYL" => 1,
        b"DWRD" | b"SCPC" | b"LNGC" | b"RGNC" => 2,
        b"DLNG" => 4,
        b"DLLG" => 8,
        _ => return None,
    };
    Some(Kind::Int(IntField {
        width,
        value: 0,
        options: Vec::new(),
    }))
}

impl IntField {
    pub(crate) fn configure(&mut self, tpl: &mut Template, list: ListId) -> Result<()> {
        self.options = pop_options(tpl, list);
        Ok(())
    }

    pub(crate) fn read(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        self.value = r.int(self.width, "signed integer")?;
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_int(self.width, self.value);
    }

    pub(crate) fn set(&mut self, v: i64) -> std::result::Result<(), String> {
        let bits = u32::from(self.width) * 8;
        let min = -(1i64 << (bits - 1));
        let max = (1i64 << (bits - 1)) - 1;
        if self.width < 8 && !(min..=max).contains(&v) {
            return Err(format!("{v} does not fit a {bits}-bit signed field"));
        }
        self.value = v;
        Ok(())
    }
}

/// Unsigned integer fields, plain (`UBYT`…) or hex-rendered (`HBYT`…), and
/// the unsigned fixed-fraction compatibility aliases.
#[derive(Debug, Clone)]
pub(crate) struct UIntField {
    pub(crate) width: u8,
    pub(crate) hex: bool,
    pub(crate) value: u64,
    pub(crate) options: Vec<CaseOption>,
}

pub(crate) fn unsigned_int(tc: TypeCode, _label: &str) -> Option<Kind> {
    let width = match &tc.as_bytes() {
        b"UBYT" => 1,
        b"UWRD" | b"SFRC" | b"FXYZ" | b"FWID" => 2,
        b"ULNG" | b"FRAC" | b"FIXD" => 4,
        b"ULLG" => 8,
        _ => return None,
    };
    Some(Kind::UInt(UIntField {
        width,
        hex: false,
        value: 0,
        options: Vec::new(),
    }))
}

pub(crate) fn hex_int(tc: TypeCode, _label: &str) -> Option<Kind> {
    let width = match &tc.as_bytes() {
        b"HBYT" => 1,
        b"HWRD" => 2,
        b"HLNG" => 4,
        b"HLLG" => 8,
        _ => return None,
    };
    Some(Kind::UInt(UIntField {
        width,
        hex: true,
        value: 0,
        options: Vec::new(),
    }))
}

impl UIntField {
    pub(crate) fn configure(&mut self, tpl: &mut Template, list: ListId) -> Result<()> {
        self.options = pop_options(tpl, list);
        Ok(())
    }

    pub(crate) fn read(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        self.value = r.uint(self.width, "unsigned integer")?;
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_uint(self.width, self.value);
    }

    pub(crate) fn value(&self) -> Value<'_> {
        if self.hex {
            Value::Hex(self.value)
        } else {
            Value::UInt(self.value)
        }
    }

    pub(crate) fn set(&mut self, v: u64) -> std::result::Result<(), String> {
        let bits = u32::from(self.width) * 8;
        if self.width < 8 && v >> bits != 0 {
            return Err(format!("{v} does not fit a {bits}-bit unsigned field"));
        }
        self.value = v;
        Ok(())
    }
}

/// BOOL: a word whose true sentinel is 256. Any nonzero word decodes as
/// true, but the raw word is preserved so unedited data round-trips exactly.
#[derive(Debug, Clone)]
pub(crate) struct BoolField {
    pub(crate) raw: u16,
}

pub(crate) fn bool_field(_tc: TypeCode, _label: &str) -> Option<Kind> {
    Some(Kind::Bool(BoolField { raw: 0 }))
}

impl BoolField {
    pub(crate) fn read(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        self.raw = r.u16("boolean")?;
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_u16(self.raw);
    }

    pub(crate) fn set(&mut self, v: bool) {
        self.raw = if v { 256 } else { 0 };
    }
}

/// BFLG/WFLG/LFLG: a 0-or-1 flag the size of a byte/word/long.
#[derive(Debug, Clone)]
pub(crate) struct FlagField {
    pub(crate) width: u8,
    pub(crate) raw: u64,
}

pub(crate) fn flag(tc: TypeCode, _label: &str) -> Option<Kind> {
    let width = match &tc.as_bytes() {
        b"BFLG" => 1,
        b"WFLG" => 2,
        b"LFLG" => 4,
        _ => return None,
    };
    Some(Kind::Flag(FlagField { width, raw: 0 }))
}

impl FlagField {
    pub(crate) fn read(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        self.raw = r.uint(self.width, "flag")?;
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_uint(self.width, self.raw);
    }

    pub(crate) fn set(&mut self, v: bool) {
        self.raw = u64::from(v);
    }
}

/// REAL/DOUB: IEEE floats, stored as raw bits for byte-exact round-trips.
#[derive(Debug, Clone)]
pub(crate) struct RealField {
    pub(crate) bits: u32,
}

pub(crate) fn real(_tc: TypeCode, _label: &str) -> Option<Kind> {
    Some(Kind::Real(RealField { bits: 0 }))
}

impl RealField {
    pub(crate) fn read(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        self.bits = r.f32_bits("single float")?;
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_u32(self.bits);
    }
}

#[derive(Debug, Clone)]
pub(crate) struct DoubField {
    pub(crate) bits: u64,
}

pub(crate) fn doub(_tc: TypeCode, _label: &str) -> Option<Kind> {
    Some(Kind::Doub(DoubField { bits: 0 }))
}

impl DoubField {
    pub(crate) fn read(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        self.bits = r.f64_bits("double float")?;
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_u64(self.bits);
    }
}

/// RECT: four signed words in top/left/bottom/right order.
#[derive(Debug, Clone, Default)]
pub(crate) struct RectField {
    pub(crate) top: i16,
    pub(crate) left: i16,
    pub(crate) bottom: i16,
    pub(crate) right: i16,
}

pub(crate) fn rect(_tc: TypeCode, _label: &str) -> Option<Kind> {
    Some(Kind::Rect(RectField::default()))
}

impl RectField {
    pub(crate) fn read(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        self.top = r.i16("rect.top")?;
        self.left = r.i16("rect.left")?;
        self.bottom = r.i16("rect.bottom")?;
        self.right = r.i16("rect.right")?;
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_i16(self.top);
        w.write_i16(self.left);
        w.write_i16(self.bottom);
        w.write_i16(self.right);
    }
}

/// PNT : two signed words in v/h order.
#[derive(Debug, Clone, Default)]
pub(crate) struct PointField {
    pub(crate) v: i16,
    pub(crate) h: i16,
}

pub(crate) fn point(_tc: TypeCode, _label: &str) -> Option<Kind> {
    Some(Kind::Point(PointField::default()))
}

impl PointField {
    pub(crate) fn read(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        self.v = r.i16("point.v")?;
        self.h = r.i16("point.h")?;
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_i16(self.v);
        w.write_i16(self.h);
    }
}

/// AWRD/ALNG/AL08/AL16: pad the cursor to a 2/4/8/16-byte boundary.
/// Contributes to size but carries no value.
#[derive(Debug, Clone)]
pub(crate) struct AlignField {
    pub(crate) boundary: u64,
}

pub(crate) fn align(tc: TypeCode, _label: &str) -> Option<Kind> {
    let boundary = match &tc.as_bytes() {
        b"AWRD" => 2,
        b"ALNG" => 4,
        b"AL08" => 8,
        b"AL16" => 16,
        _ => return None,
    };
    Some(Kind::Align(AlignField { boundary }))
}

impl AlignField {
    fn pad_for(&self, pos: u64) -> u64 {
        (self.boundary - pos % self.boundary) % self.boundary
    }

    pub(crate) fn read(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        let pad = self.pad_for(r.position());
        r.skip(pad as usize, "alignment padding")
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        let pad = self.pad_for(w.position() as u64);
        w.pad(pad as usize);
    }

    pub(crate) fn size(&self, size: &mut u64) {
        *size += self.pad_for(*size);
    }
}

/// FBYT/FWRD/FLNG/FLLG and `F###`: skip a fixed number of filler bytes.
#[derive(Debug, Clone)]
pub(crate) struct FillField {
    pub(crate) length: u64,
}

pub(crate) fn fill(tc: TypeCode, _label: &str) -> Option<Kind> {
    let length = match &tc.as_bytes() {
        b"FBYT" => 1,
        b"FWRD" => 2,
        b"FLNG" => 4,
        b"FLLG" => 8,
        _ => u64::from(tc.hex_suffix()?),
    };
    Some(Kind::Fill(FillField { length }))
}

impl FillField {
    pub(crate) fn read(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        r.skip(self.length as usize, "filler")
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.pad(self.length as usize);
    }
}
