use std::fmt;

use crate::fields::Kind;
use crate::registry::Constructor;

/// A 4-character schema type identifier, e.g. `DBYT` or `PNT `.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeCode([u8; 4]);

impl TypeCode {
    pub const fn new(bytes: [u8; 4]) -> Self {
        TypeCode(bytes)
    }

    pub fn as_bytes(&self) -> [u8; 4] {
        self.0
    }

    /// The single-letter family prefix used by `X###` parametrized codes.
    pub(crate) fn prefix1(&self) -> &[u8] {
        &self.0[..1]
    }

    /// The two-letter family prefix used by `XX##` parametrized codes.
    pub(crate) fn prefix2(&self) -> &[u8] {
        &self.0[..2]
    }

    /// Parses the 3-hex-digit suffix of an `X###` code.
    pub(crate) fn hex_suffix(&self) -> Option<u32> {
        let s = std::str::from_utf8(&self.0[1..]).ok()?;
        u32::from_str_radix(s, 16).ok()
    }

    /// Parses the 2-decimal-digit suffix of an `XX##` code.
    pub(crate) fn dec_suffix(&self) -> Option<u32> {
        let s = std::str::from_utf8(&self.0[2..]).ok()?;
        s.parse().ok()
    }
}

impl PartialEq<&[u8; 4]> for TypeCode {
    fn eq(&self, other: &&[u8; 4]) -> bool {
        &self.0 == *other
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '?'
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeCode(\"{self}\")")
    }
}

/// Handle of an element in the template's arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ElemId(pub(crate) u32);

/// Handle of an element list in the template's arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ListId(pub(crate) u32);

impl ElemId {
    #[inline]
    pub(crate) fn idx(self) -> usize {
        self.0 as usize
    }
}

impl ListId {
    #[inline]
    pub(crate) fn idx(self) -> usize {
        self.0 as usize
    }
}

/// One schema entry: a typed, labeled field descriptor.
///
/// The raw label doubles as metadata carrier: text after the first `=` on the
/// first line parametrizes certain kinds, and text after the first newline is
/// the tooltip. The owning list is a non-owning arena handle used only for
/// upward lookups.
pub struct Element {
    pub(crate) type_code: TypeCode,
    pub(crate) label: String,
    pub(crate) visible: bool,
    pub(crate) parent: ListId,
    pub(crate) ctor: Constructor,
    pub(crate) kind: Kind,
}

impl Element {
    pub(crate) fn new(
        type_code: TypeCode,
        label: String,
        ctor: Constructor,
        kind: Kind,
    ) -> Element {
        Element {
            type_code,
            label,
            visible: kind.default_visible(),
            // Reassigned on insertion; the root list owns orphans until then.
            parent: ListId(0),
            ctor,
            kind,
        }
    }

    pub fn type_code(&self) -> TypeCode {
        self.type_code
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The human-readable label: the first line, truncated at the first `=`.
    pub fn display_label(&self) -> &str {
        let line = self.label.split('\n').next().unwrap_or_default();
        line.split('=').next().unwrap_or_default()
    }

    /// Metadata embedded after the first `=` on the first line, if any.
    pub(crate) fn meta(&self) -> Option<&str> {
        let line = self.label.split('\n').next()?;
        line.split_once('=').map(|(_, meta)| meta)
    }

    /// Documentation text embedded after the first newline.
    pub fn tooltip(&self) -> &str {
        self.label.split_once('\n').map_or("", |(_, rest)| rest)
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn parent(&self) -> ListId {
        self.parent
    }

    /// The code that legally closes this element's scope, for scope openers.
    pub fn end_type(&self) -> Option<TypeCode> {
        self.kind.end_type()
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \u{201c}{}\u{201d}", self.type_code, self.display_label())
    }
}
