use crate::cursor::{ByteReader, ByteWriter, decode_bytes, encode_string};
use crate::element::TypeCode;
use crate::err::Result;
use crate::fields::Kind;
use crate::template::Template;
use crate::value::Value;
use encoding::EncodingRef;

/// Layout of a string field's length/termination/padding bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum StringForm {
    /// Length prefix of `len_width` bytes, no padding.
    Pascal,
    /// Pascal padded so the total (prefix + data + pad) has odd length.
    PascalOdd,
    /// Pascal padded so the total has even length.
    PascalEven,
    /// NUL-terminated.
    C,
    /// C string padded so the total (data + NUL + pad) has odd length.
    COdd,
    /// C string padded so the total has even length.
    CEven,
    /// One length byte plus data, always occupying `n` bytes total.
    FixedPascal(usize),
    /// NUL-terminated data always occupying `n` bytes total.
    FixedC(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct StringField {
    pub(crate) form: StringForm,
    pub(crate) len_width: u8,
    pub(crate) max_len: usize,
    pub(crate) value: String,
}

pub(crate) fn string(tc: TypeCode, _label: &str) -> Option<Kind> {
    let (form, len_width) = match &tc.as_bytes() {
        b"PSTR" | b"BSTR" => (StringForm::Pascal, 1),
        b"WSTR" => (StringForm::Pascal, 2),
        b"LSTR" => (StringForm::Pascal, 4),
        b"OSTR" => (StringForm::PascalOdd, 1),
        b"ESTR" => (StringForm::PascalEven, 1),
        b"CSTR" => (StringForm::C, 0),
        b"OCST" => (StringForm::COdd, 0),
        b"ECST" => (StringForm::CEven, 0),
        _ => {
            let n = tc.hex_suffix()? as usize;
            if n == 0 {
                return None;
            }
            match tc.prefix1() {
                b"P" => (StringForm::FixedPascal(n), 1),
                b"C" => (StringForm::FixedC(n), 0),
                _ => return None,
            }
        }
    };
    let max_len = match form {
        StringForm::FixedPascal(n) => (n - 1).min(255),
        StringForm::FixedC(n) => n - 1,
        _ => match len_width {
            1 => 255,
            2 => 65535,
            _ => u32::MAX as usize,
        },
    };
    Some(Kind::Str(StringField {
        form,
        len_width,
        max_len,
        value: String::new(),
    }))
}

impl StringField {
    pub(crate) fn read(&mut self, tpl: &Template, r: &mut ByteReader<'_>) -> Result<()> {
        let codec = tpl.settings().get_text_codec();
        match self.form {
            StringForm::FixedPascal(n) => {
                let len = (r.u8("string length")? as usize).min(n - 1);
                let bytes = r.take_bytes(len, "string")?;
                self.value = decode_bytes(bytes, codec);
                r.skip(n - 1 - len, "string padding")?;
            }
            StringForm::FixedC(n) => {
                let bytes = r.take_bytes(n, "string")?;
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                self.value = decode_bytes(&bytes[..end], codec);
            }
            StringForm::C | StringForm::COdd | StringForm::CEven => {
                let bytes = r.read_cstring_bytes("string")?;
                self.value = decode_bytes(bytes, codec);
                let total = bytes.len() + 1;
                if self.parity_pad(total) {
                    r.skip(1, "string padding")?;
                }
            }
            StringForm::Pascal | StringForm::PascalOdd | StringForm::PascalEven => {
                let len = r.uint(self.len_width, "string length")? as usize;
                let bytes = r.take_bytes(len, "string")?;
                self.value = decode_bytes(bytes, codec);
                let total = self.len_width as usize + len;
                if self.parity_pad(total) {
                    r.skip(1, "string padding")?;
                }
            }
        }
        Ok(())
    }

    /// Whether one pad byte follows `total` consumed bytes for this form.
    fn parity_pad(&self, total: usize) -> bool {
        match self.form {
            StringForm::PascalOdd | StringForm::COdd => total % 2 == 0,
            StringForm::PascalEven | StringForm::CEven => total % 2 == 1,
            _ => false,
        }
    }

    fn encoded(&self, codec: EncodingRef) -> Vec<u8> {
        let mut bytes = encode_string(&self.value, codec);
        bytes.truncate(self.max_len);
        bytes
    }

    pub(crate) fn write(&self, tpl: &Template, w: &mut ByteWriter) {
        let bytes = self.encoded(tpl.settings().get_text_codec());
        match self.form {
            StringForm::FixedPascal(n) => {
                w.write_u8(bytes.len() as u8);
                w.write_bytes(&bytes);
                w.pad(n - 1 - bytes.len());
            }
            StringForm::FixedC(n) => {
                w.write_bytes(&bytes);
                w.pad(n - bytes.len());
            }
            StringForm::C | StringForm::COdd | StringForm::CEven => {
                w.write_bytes(&bytes);
                w.write_u8(0);
                if self.parity_pad(bytes.len() + 1) {
                    w.pad(1);
                }
            }
            StringForm::Pascal | StringForm::PascalOdd | StringForm::PascalEven => {
                w.write_uint(self.len_width, bytes.len() as u64);
                w.write_bytes(&bytes);
                if self.parity_pad(self.len_width as usize + bytes.len()) {
                    w.pad(1);
                }
            }
        }
    }

    pub(crate) fn size(&self, tpl: &Template, size: &mut u64) {
        let len = self.encoded(tpl.settings().get_text_codec()).len();
        *size += match self.form {
            StringForm::FixedPascal(n) | StringForm::FixedC(n) => n as u64,
            StringForm::C | StringForm::COdd | StringForm::CEven => {
                let total = len + 1;
                (total + usize::from(self.parity_pad(total))) as u64
            }
            StringForm::Pascal | StringForm::PascalOdd | StringForm::PascalEven => {
                let total = self.len_width as usize + len;
                (total + usize::from(self.parity_pad(total))) as u64
            }
        };
    }

    pub(crate) fn set(&mut self, v: &str, codec: EncodingRef) -> std::result::Result<(), String> {
        if encode_string(v, codec).len() > self.max_len {
            return Err(format!("string is longer than {} bytes", self.max_len));
        }
        self.value = v.to_string();
        Ok(())
    }
}

/// CHAR: a single byte presented as a character.
#[derive(Debug, Clone)]
pub(crate) struct CharField {
    pub(crate) raw: u8,
}

pub(crate) fn char_field(_tc: TypeCode, _label: &str) -> Option<Kind> {
    Some(Kind::Char(CharField { raw: 0 }))
}

impl CharField {
    pub(crate) fn read(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        self.raw = r.u8("char")?;
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_u8(self.raw);
    }

    pub(crate) fn value(&self, tpl: &Template) -> Value<'_> {
        let decoded = decode_bytes(&[self.raw], tpl.settings().get_text_codec());
        Value::Char(decoded.chars().next().unwrap_or('\0'))
    }

    pub(crate) fn set(&mut self, c: char, codec: EncodingRef) {
        let bytes = encode_string(&c.to_string(), codec);
        self.raw = bytes.first().copied().unwrap_or(0);
    }
}

/// TNAM: a 4-byte type code value (e.g. a record type stored in data).
#[derive(Debug, Clone)]
pub(crate) struct TypeNameField {
    pub(crate) raw: [u8; 4],
}

pub(crate) fn type_name(_tc: TypeCode, _label: &str) -> Option<Kind> {
    Some(Kind::TypeName(TypeNameField { raw: [0; 4] }))
}

impl TypeNameField {
    pub(crate) fn read(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        self.raw.copy_from_slice(r.take_bytes(4, "type name")?);
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_bytes(&self.raw);
    }

    pub(crate) fn set(&mut self, tc: TypeCode) {
        self.raw = tc.as_bytes();
    }
}
