use log::warn;

use crate::cursor::{ByteReader, ByteWriter, encode_string};
use crate::element::{ElemId, ListId, TypeCode};
use crate::err::Result;
use crate::fields::Kind;
use crate::fields::case::{CaseOption, parse_int, pop_options};
use crate::template::Template;
use crate::value::Value;

pub(crate) const KEYB: TypeCode = TypeCode::new(*b"KEYB");
pub(crate) const KEYE: TypeCode = TypeCode::new(*b"KEYE");

/// The scalar shape of a key field's driving value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum KeyRepr {
    SInt { width: u8 },
    UInt { width: u8 },
    Hex { width: u8 },
    Char,
    TypeCode,
    /// KRID: keyed on the id of the record being decoded; occupies no bytes.
    OwnId,
}

/// A key's decoded value, comparable across the scalar shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum KeyVal {
    I(i64),
    U(u64),
}

/// A key field: reads a scalar whose value selects which of the declared
/// KEYB sections is active. Only the active section's fields occupy bytes.
#[derive(Debug, Clone)]
pub(crate) struct KeyField {
    pub(crate) repr: KeyRepr,
    pub(crate) value: KeyVal,
    pub(crate) options: Vec<CaseOption>,
    pub(crate) sections: Vec<(Vec<KeyVal>, ElemId)>,
    pub(crate) current: Option<ElemId>,
}

pub(crate) fn key_field(tc: TypeCode, _label: &str) -> Option<Kind> {
    let repr = match &tc.as_bytes() {
        b"KBYT" => KeyRepr::SInt { width: 1 },
        b"KWRD" => KeyRepr::SInt { width: 2 },
        b"KLNG" => KeyRepr::SInt { width: 4 },
        b"KLLG" => KeyRepr::SInt { width: 8 },
        b"KUBT" => KeyRepr::UInt { width: 1 },
        b"KUWD" => KeyRepr::UInt { width: 2 },
        b"KULG" => KeyRepr::UInt { width: 4 },
        b"KULL" => KeyRepr::UInt { width: 8 },
        b"KHBT" => KeyRepr::Hex { width: 1 },
        b"KHWD" => KeyRepr::Hex { width: 2 },
        b"KHLG" => KeyRepr::Hex { width: 4 },
        b"KHLL" => KeyRepr::Hex { width: 8 },
        b"KCHR" => KeyRepr::Char,
        b"KTYP" => KeyRepr::TypeCode,
        b"KRID" => KeyRepr::OwnId,
        _ => return None,
    };
    let value = match repr {
        KeyRepr::SInt { .. } | KeyRepr::OwnId => KeyVal::I(0),
        _ => KeyVal::U(0),
    };
    Some(Kind::Key(KeyField {
        repr,
        value,
        options: Vec::new(),
        sections: Vec::new(),
        current: None,
    }))
}

impl KeyField {
    pub(crate) fn configure(
        &mut self,
        tpl: &mut Template,
        id: ElemId,
        list: ListId,
    ) -> Result<()> {
        self.options = pop_options(tpl, list);

        // Claim the KEYB sections that follow, extracting each section's
        // fields up to its matching KEYE.
        while let Some(next) = tpl.pop_of_type(list, KEYB) {
            let tc = tpl.elem(next).type_code;
            let label = tpl.elem(next).label.clone();
            let sub = tpl.sub_list(list, KEYE, tc, &label)?;
            tpl.configure_list(sub)?;
            match &mut tpl.elem_mut(next).kind {
                Kind::Section(s) => {
                    s.claimed = true;
                    s.sub = Some(sub);
                }
                _ => unreachable!(),
            }

            let mut values = Vec::new();
            let line = label.split('\n').next().unwrap_or_default();
            for spec in line.split(',') {
                let Some(v) = self.parse_case(spec, tpl) else {
                    return Err(tpl.invalid(
                        next,
                        format!("\u{201c}{spec}\u{201d} is not a valid key value"),
                    ));
                };
                values.push(v);
            }
            self.sections.push((values, next));
        }

        if self.sections.is_empty() {
            return Err(tpl.invalid(id, "no KEYB sections found"));
        }

        // The initial selection follows the first declared option, falling
        // back to the first section's first value.
        let initial = self
            .options
            .first()
            .and_then(|o| o.raw_value())
            .and_then(|raw| self.parse_case(raw, tpl))
            .unwrap_or(self.sections[0].0[0]);
        self.value = match self.repr {
            KeyRepr::OwnId => KeyVal::I(i64::from(tpl.settings().get_resource_id())),
            _ => initial,
        };
        if let Some(section) = self.section_for(self.value) {
            // Inserted with the configure contract: the walk skips it, and
            // the section was configured above.
            tpl.insert_existing_at_cursor(list, section);
            self.current = Some(section);
        }
        Ok(())
    }

    /// Parses a declared case value according to this key's scalar shape.
    fn parse_case(&self, s: &str, tpl: &Template) -> Option<KeyVal> {
        let s = s.trim();
        match self.repr {
            KeyRepr::SInt { .. } | KeyRepr::OwnId => parse_int(s).map(KeyVal::I),
            KeyRepr::UInt { .. } | KeyRepr::Hex { .. } => {
                parse_int(s).map(|v| KeyVal::U(v as u64))
            }
            KeyRepr::Char => {
                let bytes = encode_string(s, tpl.settings().get_text_codec());
                match bytes.as_slice() {
                    [b] => Some(KeyVal::U(u64::from(*b))),
                    _ => None,
                }
            }
            KeyRepr::TypeCode => {
                let bytes = encode_string(s, tpl.settings().get_text_codec());
                let arr: [u8; 4] = bytes.try_into().ok()?;
                Some(KeyVal::U(u64::from(u32::from_be_bytes(arr))))
            }
        }
    }

    fn section_for(&self, v: KeyVal) -> Option<ElemId> {
        self.sections
            .iter()
            .find(|(values, _)| values.contains(&v))
            .map(|(_, id)| *id)
    }

    /// Swaps the active section in the owning list. The new section lands
    /// right after the key, so an in-flight read pass visits it next.
    fn select(&mut self, tpl: &mut Template, id: ElemId, list: ListId, want: Option<ElemId>) {
        if self.current == want {
            return;
        }
        if let Some(old) = self.current {
            tpl.remove_from_list(list, old);
        }
        if let Some(new) = want {
            tpl.insert_after_elem(list, new, id);
        }
        self.current = want;
    }

    pub(crate) fn read(
        &mut self,
        tpl: &mut Template,
        id: ElemId,
        list: ListId,
        r: &mut ByteReader<'_>,
    ) -> Result<()> {
        self.value = match self.repr {
            KeyRepr::SInt { width } => KeyVal::I(r.int(width, "key")?),
            KeyRepr::UInt { width } | KeyRepr::Hex { width } => KeyVal::U(r.uint(width, "key")?),
            KeyRepr::Char => KeyVal::U(u64::from(r.u8("key")?)),
            KeyRepr::TypeCode => KeyVal::U(u64::from(r.u32("key")?)),
            KeyRepr::OwnId => KeyVal::I(i64::from(tpl.settings().get_resource_id())),
        };
        let section = self.section_for(self.value);
        if section.is_none() {
            warn!("key value {:?} matches no declared section", self.value);
        }
        self.select(tpl, id, list, section);
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        match (self.repr, self.value) {
            (KeyRepr::SInt { width }, KeyVal::I(v)) => w.write_int(width, v),
            (KeyRepr::UInt { width } | KeyRepr::Hex { width }, KeyVal::U(v)) => {
                w.write_uint(width, v)
            }
            (KeyRepr::Char, KeyVal::U(v)) => w.write_u8(v as u8),
            (KeyRepr::TypeCode, KeyVal::U(v)) => w.write_u32(v as u32),
            (KeyRepr::OwnId, _) => {}
            _ => unreachable!("key value shape always matches its repr"),
        }
    }

    pub(crate) fn size(&self, size: &mut u64) {
        *size += match self.repr {
            KeyRepr::SInt { width } | KeyRepr::UInt { width } | KeyRepr::Hex { width } => {
                u64::from(width)
            }
            KeyRepr::Char => 1,
            KeyRepr::TypeCode => 4,
            KeyRepr::OwnId => 0,
        };
    }

    pub(crate) fn value(&self) -> Value<'_> {
        match (self.repr, self.value) {
            (KeyRepr::Hex { .. }, KeyVal::U(v)) => Value::Hex(v),
            (KeyRepr::Char, KeyVal::U(v)) => Value::Char(v as u8 as char),
            (KeyRepr::TypeCode, KeyVal::U(v)) => {
                Value::TypeCode(TypeCode::new((v as u32).to_be_bytes()))
            }
            (_, KeyVal::I(v)) => Value::Int(v),
            (_, KeyVal::U(v)) => Value::UInt(v),
        }
    }

    /// Re-keys the field from an edited value, swapping the active section.
    pub(crate) fn set(
        &mut self,
        tpl: &mut Template,
        id: ElemId,
        list: ListId,
        v: KeyVal,
    ) -> std::result::Result<(), String> {
        if self.repr == KeyRepr::OwnId {
            return Err("own-id keys follow the record id and cannot be edited".to_string());
        }
        let Some(section) = self.section_for(v) else {
            return Err("value matches no declared section".to_string());
        };
        self.value = v;
        self.select(tpl, id, list, Some(section));
        Ok(())
    }
}

/// KEYB: one alternative sub-layout of a keyed section. Its label lists the
/// key values it covers, comma-separated.
#[derive(Debug, Clone)]
pub(crate) struct SectionField {
    pub(crate) claimed: bool,
    pub(crate) sub: Option<ListId>,
}

pub(crate) fn section(_tc: TypeCode, _label: &str) -> Option<Kind> {
    Some(Kind::Section(SectionField {
        claimed: false,
        sub: None,
    }))
}

impl SectionField {
    pub(crate) fn configure(&mut self, tpl: &Template, id: ElemId) -> Result<()> {
        if !self.claimed {
            return Err(tpl.invalid(id, "KEYB must follow a key field"));
        }
        Ok(())
    }

    pub(crate) fn read(&mut self, tpl: &mut Template, r: &mut ByteReader<'_>) -> Result<()> {
        match self.sub {
            Some(sub) => tpl.read_list(sub, r),
            None => Ok(()),
        }
    }

    pub(crate) fn write(&self, tpl: &Template, w: &mut ByteWriter) {
        if let Some(sub) = self.sub {
            tpl.write_list(sub, w);
        }
    }

    pub(crate) fn size(&self, tpl: &Template, size: &mut u64) {
        if let Some(sub) = self.sub {
            tpl.size_list(sub, size);
        }
    }
}
