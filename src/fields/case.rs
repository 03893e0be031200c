use log::trace;

use crate::cursor::{ByteReader, ByteWriter};
use crate::element::{ElemId, ListId, TypeCode};
use crate::err::Result;
use crate::fields::Kind;
use crate::template::Template;
use crate::value::Value;

/// A named option (or option range) attached to the preceding field.
///
/// Options are declared as standalone schema entries but occupy no bytes;
/// the field they follow absorbs them during its configure step.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseOption {
    One { name: String, value: String },
    Range { name: String, lo: i64, hi: i64 },
}

impl CaseOption {
    pub fn name(&self) -> &str {
        match self {
            CaseOption::One { name, .. } => name,
            CaseOption::Range { name, .. } => name,
        }
    }

    /// The raw declared value for single-value options.
    pub fn raw_value(&self) -> Option<&str> {
        match self {
            CaseOption::One { value, .. } => Some(value),
            CaseOption::Range { .. } => None,
        }
    }

    /// Whether a decoded integer falls under this option.
    pub fn matches_int(&self, v: i64) -> bool {
        match self {
            CaseOption::One { value, .. } => parse_int(value) == Some(v),
            CaseOption::Range { lo, hi, .. } => (*lo..=*hi).contains(&v),
        }
    }
}

/// Parses a declared option value as an integer, accepting `0x`/`$` hex.
pub(crate) fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("$")) {
        u64::from_str_radix(hex, 16).ok().map(|v| v as i64)
    } else {
        s.parse().ok()
    }
}

/// Consumes the run of CASE/CASR entries immediately following the cursor.
pub(crate) fn pop_options(tpl: &mut Template, list: ListId) -> Vec<CaseOption> {
    let mut options = Vec::new();
    loop {
        let Some(next) = tpl.peek(list, 1) else { break };
        match &tpl.elem(next).kind {
            Kind::Case(c) => {
                options.push(CaseOption::One {
                    name: c.name.clone(),
                    value: c.value.clone(),
                });
            }
            Kind::CaseRange(c) => {
                options.push(CaseOption::Range {
                    name: c.name.clone(),
                    lo: c.lo,
                    hi: c.hi,
                });
            }
            _ => break,
        }
        let popped = tpl.pop(list);
        debug_assert_eq!(popped, Some(next));
    }
    if !options.is_empty() {
        trace!("absorbed {} option(s) into preceding field", options.len());
    }
    options
}

/// CASE: a single named option for the preceding field.
#[derive(Debug, Clone)]
pub(crate) struct CaseField {
    pub(crate) name: String,
    pub(crate) value: String,
}

pub(crate) fn case_field(_tc: TypeCode, label: &str) -> Option<Kind> {
    let line = label.split('\n').next().unwrap_or_default();
    let (name, value) = match line.split_once('=') {
        Some((name, value)) => (name.to_string(), value.to_string()),
        None => (line.to_string(), line.to_string()),
    };
    Some(Kind::Case(CaseField { name, value }))
}

impl CaseField {
    // A CASE that survives to its own configure step was not absorbed by a
    // preceding field, which is a template authoring error.
    pub(crate) fn configure(&mut self, tpl: &Template, id: ElemId) -> Result<()> {
        Err(tpl.invalid(id, "CASE must follow a field that supports options"))
    }
}

/// CASR: a named inclusive value range for the preceding field.
#[derive(Debug, Clone)]
pub(crate) struct CaseRangeField {
    pub(crate) name: String,
    pub(crate) lo: i64,
    pub(crate) hi: i64,
}

pub(crate) fn case_range(_tc: TypeCode, label: &str) -> Option<Kind> {
    let line = label.split('\n').next().unwrap_or_default();
    let (name, spec) = line.split_once('=')?;
    let (lo, hi) = match spec.split_once("..") {
        Some((lo, hi)) => (parse_int(lo)?, parse_int(hi)?),
        None => {
            let v = parse_int(spec)?;
            (v, v)
        }
    };
    if lo > hi {
        return None;
    }
    Some(Kind::CaseRange(CaseRangeField {
        name: name.to_string(),
        lo,
        hi,
    }))
}

impl CaseRangeField {
    pub(crate) fn configure(&mut self, tpl: &Template, id: ElemId) -> Result<()> {
        Err(tpl.invalid(id, "CASR must follow a field that supports options"))
    }
}

/// RSID: a signed 16-bit reference to another record. The label names the
/// target type and an id offset, e.g. `Weapon='weap' 128`.
#[derive(Debug, Clone)]
pub(crate) struct ResIdField {
    pub(crate) raw: i16,
    pub(crate) target: Option<TypeCode>,
    pub(crate) offset: i64,
    pub(crate) options: Vec<CaseOption>,
}

pub(crate) fn res_id(_tc: TypeCode, label: &str) -> Option<Kind> {
    let (target, offset) = parse_resource_ref(label);
    Some(Kind::ResId(ResIdField {
        raw: 0,
        target,
        offset,
        options: Vec::new(),
    }))
}

/// Extracts a `'TYPE'` clause and an optional trailing id offset from a label.
pub(crate) fn parse_resource_ref(label: &str) -> (Option<TypeCode>, i64) {
    let line = label.split('\n').next().unwrap_or_default();
    let Some(open) = line.find('\'') else {
        return (None, 0);
    };
    let quoted = &line[open + 1..];
    let Some(close) = quoted.find('\'') else {
        return (None, 0);
    };
    let code = &quoted[..close];
    let target = if code.len() == 4 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(code.as_bytes());
        Some(TypeCode::new(bytes))
    } else {
        None
    };
    let offset = quoted[close + 1..]
        .split_whitespace()
        .next()
        .and_then(parse_int)
        .unwrap_or(0);
    (target, offset)
}

impl ResIdField {
    pub(crate) fn configure(&mut self, tpl: &mut Template, list: ListId) -> Result<()> {
        self.options = pop_options(tpl, list);
        Ok(())
    }

    pub(crate) fn read(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        self.raw = r.i16("resource id")?;
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_i16(self.raw);
    }

    pub(crate) fn value(&self) -> Value<'_> {
        Value::ResourceId {
            id: i64::from(self.raw) + self.offset,
            target: self.target,
        }
    }

    pub(crate) fn set_id(&mut self, id: i64) -> std::result::Result<(), String> {
        let raw = id - self.offset;
        i16::try_from(raw)
            .map(|raw| self.raw = raw)
            .map_err(|_| format!("id {id} is out of range for this reference"))
    }
}
