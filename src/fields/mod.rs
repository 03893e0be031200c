//! The field-kind families behind the type registry.
//!
//! Each schema entry resolves to one variant of [`Kind`], a closed enum over
//! the capability set {configure, read_data, write_data, data_size}. The
//! variants carry their decoded state; dispatch is a plain match.

pub(crate) mod bits;
pub(crate) mod case;
pub(crate) mod color;
pub(crate) mod cosmetic;
pub(crate) mod counter;
pub(crate) mod datetime;
pub(crate) mod hexdump;
pub(crate) mod key;
pub(crate) mod list;
pub(crate) mod scalar;
pub(crate) mod string;

use crate::cursor::{ByteReader, ByteWriter};
use crate::element::{ElemId, ListId, TypeCode};
use crate::err::Result;
use crate::template::Template;
use crate::value::Value;

use bits::{BitsField, OrValueField};
use case::{CaseField, CaseRangeField, ResIdField};
use color::ColorField;
use cosmetic::{CrossRefField, PackField};
use counter::CounterField;
use datetime::DateField;
use hexdump::HexDumpField;
use key::{KeyField, SectionField};
use list::ListField;
use scalar::{
    AlignField, BoolField, DoubField, FillField, FlagField, IntField, PointField, RealField,
    RectField, UIntField,
};
use string::{CharField, StringField, TypeNameField};

#[derive(Debug, Clone)]
pub(crate) enum Kind {
    Int(IntField),
    UInt(UIntField),
    Bool(BoolField),
    Flag(FlagField),
    Real(RealField),
    Doub(DoubField),
    Rect(RectField),
    Point(PointField),
    Align(AlignField),
    Fill(FillField),
    Str(StringField),
    Char(CharField),
    TypeName(TypeNameField),
    Bits(BitsField),
    OrValue(OrValueField),
    HexDump(HexDumpField),
    Counter(CounterField),
    List(ListField),
    Key(KeyField),
    Section(SectionField),
    Case(CaseField),
    CaseRange(CaseRangeField),
    ResId(ResIdField),
    Date(DateField),
    Color(ColorField),
    Divider,
    CrossRef(CrossRefField),
    Pack(PackField),
    /// LSTE/KEYE markers. Also serves as the inert placeholder left in an
    /// element's slot while its kind is checked out for a dispatch step.
    End,
}

impl Kind {
    /// The code that closes this kind's scope, for scope openers.
    pub(crate) fn end_type(&self) -> Option<TypeCode> {
        match self {
            Kind::List(_) => Some(list::LSTE),
            Kind::Section(_) => Some(key::KEYE),
            _ => None,
        }
    }

    /// Whether elements of this kind are presented to consumers by default.
    pub(crate) fn default_visible(&self) -> bool {
        !matches!(self, Kind::Align(_) | Kind::Fill(_) | Kind::End)
    }

    pub(crate) fn configure(
        &mut self,
        tpl: &mut Template,
        id: ElemId,
        list: ListId,
    ) -> Result<()> {
        match self {
            Kind::Int(f) => f.configure(tpl, list),
            Kind::UInt(f) => f.configure(tpl, list),
            Kind::Bits(f) => f.configure(tpl, id, list),
            Kind::OrValue(f) => f.configure(tpl, list),
            Kind::List(f) => f.configure(tpl, id, list),
            Kind::Key(f) => f.configure(tpl, id, list),
            Kind::Section(f) => f.configure(tpl, id),
            Kind::Case(f) => f.configure(tpl, id),
            Kind::CaseRange(f) => f.configure(tpl, id),
            Kind::ResId(f) => f.configure(tpl, list),
            Kind::Pack(f) => f.configure(tpl, id, list),
            _ => Ok(()),
        }
    }

    pub(crate) fn read_data(
        &mut self,
        tpl: &mut Template,
        id: ElemId,
        list: ListId,
        r: &mut ByteReader<'_>,
    ) -> Result<()> {
        match self {
            Kind::Int(f) => f.read(r),
            Kind::UInt(f) => f.read(r),
            Kind::Bool(f) => f.read(r),
            Kind::Flag(f) => f.read(r),
            Kind::Real(f) => f.read(r),
            Kind::Doub(f) => f.read(r),
            Kind::Rect(f) => f.read(r),
            Kind::Point(f) => f.read(r),
            Kind::Align(f) => f.read(r),
            Kind::Fill(f) => f.read(r),
            Kind::Str(f) => f.read(tpl, r),
            Kind::Char(f) => f.read(r),
            Kind::TypeName(f) => f.read(r),
            Kind::Bits(f) => f.read(tpl, r),
            Kind::OrValue(f) => f.read(r),
            Kind::HexDump(f) => f.read(r),
            Kind::Counter(f) => f.read(r),
            Kind::List(f) => f.read(tpl, id, list, r),
            Kind::Key(f) => f.read(tpl, id, list, r),
            Kind::Section(f) => f.read(tpl, r),
            Kind::ResId(f) => f.read(r),
            Kind::Date(f) => f.read(r),
            Kind::Color(f) => f.read(r),
            Kind::Case(_)
            | Kind::CaseRange(_)
            | Kind::Divider
            | Kind::CrossRef(_)
            | Kind::Pack(_)
            | Kind::End => Ok(()),
        }
    }

    pub(crate) fn write_data(&self, tpl: &Template, w: &mut ByteWriter) {
        match self {
            Kind::Int(f) => f.write(w),
            Kind::UInt(f) => f.write(w),
            Kind::Bool(f) => f.write(w),
            Kind::Flag(f) => f.write(w),
            Kind::Real(f) => f.write(w),
            Kind::Doub(f) => f.write(w),
            Kind::Rect(f) => f.write(w),
            Kind::Point(f) => f.write(w),
            Kind::Align(f) => f.write(w),
            Kind::Fill(f) => f.write(w),
            Kind::Str(f) => f.write(tpl, w),
            Kind::Char(f) => f.write(w),
            Kind::TypeName(f) => f.write(w),
            Kind::Bits(f) => f.write(tpl, w),
            Kind::OrValue(f) => f.write(w),
            Kind::HexDump(f) => f.write(w),
            Kind::Counter(f) => f.write(w),
            Kind::List(f) => f.write(tpl, w),
            Kind::Key(f) => f.write(w),
            Kind::Section(f) => f.write(tpl, w),
            Kind::ResId(f) => f.write(w),
            Kind::Date(f) => f.write(w),
            Kind::Color(f) => f.write(w),
            Kind::Case(_)
            | Kind::CaseRange(_)
            | Kind::Divider
            | Kind::CrossRef(_)
            | Kind::Pack(_)
            | Kind::End => {}
        }
    }

    pub(crate) fn data_size(&self, tpl: &Template, size: &mut u64) {
        match self {
            Kind::Int(f) => *size += u64::from(f.width),
            Kind::UInt(f) => *size += u64::from(f.width),
            Kind::Bool(_) => *size += 2,
            Kind::Flag(f) => *size += u64::from(f.width),
            Kind::Real(_) => *size += 4,
            Kind::Doub(_) => *size += 8,
            Kind::Rect(_) => *size += 8,
            Kind::Point(_) => *size += 4,
            Kind::Align(f) => f.size(size),
            Kind::Fill(f) => *size += f.length,
            Kind::Str(f) => f.size(tpl, size),
            Kind::Char(_) => *size += 1,
            Kind::TypeName(_) => *size += 4,
            Kind::Bits(f) => f.size(size),
            Kind::OrValue(f) => *size += u64::from(f.width),
            Kind::HexDump(f) => f.size(size),
            Kind::Counter(f) => f.size(size),
            Kind::List(f) => f.size(tpl, size),
            Kind::Key(f) => f.size(size),
            Kind::Section(f) => f.size(tpl, size),
            Kind::ResId(_) => *size += 2,
            Kind::Date(f) => *size += u64::from(f.width),
            Kind::Color(f) => f.size(size),
            Kind::Case(_)
            | Kind::CaseRange(_)
            | Kind::Divider
            | Kind::CrossRef(_)
            | Kind::Pack(_)
            | Kind::End => {}
        }
    }

    pub(crate) fn value<'t>(&'t self, tpl: &'t Template) -> Value<'t> {
        match self {
            Kind::Int(f) => Value::Int(f.value),
            Kind::UInt(f) => f.value(),
            Kind::Bool(f) => Value::Bool(f.raw != 0),
            Kind::Flag(f) => Value::Bool(f.raw != 0),
            Kind::Real(f) => Value::Float(f32::from_bits(f.bits)),
            Kind::Doub(f) => Value::Double(f64::from_bits(f.bits)),
            Kind::Rect(f) => Value::Rect {
                top: f.top,
                left: f.left,
                bottom: f.bottom,
                right: f.right,
            },
            Kind::Point(f) => Value::Point { v: f.v, h: f.h },
            Kind::Str(f) => Value::String(&f.value),
            Kind::Char(f) => f.value(tpl),
            Kind::TypeName(f) => Value::TypeCode(TypeCode::new(f.raw)),
            Kind::Bits(f) => Value::UInt(f.value),
            Kind::OrValue(f) => f.value(),
            Kind::HexDump(f) => Value::Bytes(&f.bytes),
            Kind::Counter(f) => Value::Count(f.count),
            Kind::Key(f) => f.value(),
            Kind::ResId(f) => f.value(),
            Kind::Date(f) => f.value(),
            Kind::Color(f) => f.value(),
            Kind::CrossRef(f) => f.value(),
            Kind::Align(_)
            | Kind::Fill(_)
            | Kind::List(_)
            | Kind::Section(_)
            | Kind::Case(_)
            | Kind::CaseRange(_)
            | Kind::Divider
            | Kind::Pack(_)
            | Kind::End => Value::None,
        }
    }

    /// The declared options of a cased field, if it carries any.
    pub(crate) fn options(&self) -> &[case::CaseOption] {
        match self {
            Kind::Int(f) => &f.options,
            Kind::UInt(f) => &f.options,
            Kind::Bits(f) => &f.options,
            Kind::OrValue(f) => &f.options,
            Kind::Key(f) => &f.options,
            Kind::ResId(f) => &f.options,
            _ => &[],
        }
    }
}
