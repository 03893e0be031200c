use log::{debug, warn};

use crate::cursor::{ByteReader, ByteWriter};
use crate::element::{Element, ElemId, ListId, TypeCode};
use crate::element_list::ElementList;
use crate::err::{Result, TemplateError};
use crate::fields::case::CaseOption;
use crate::fields::cosmetic;
use crate::fields::key::{KeyRepr, KeyVal};
use crate::fields::Kind;
use crate::fields::list::{ListForm, ListRole, check_capacity, entry_element};
use crate::parser;
use crate::registry::Registry;
use crate::settings::TemplateSettings;
use crate::value::Value;

/// A parsed template instantiated as a field tree.
///
/// All lists and elements live in arenas owned here; handles index into
/// them and cannot dangle because slots are only discarded with the whole
/// tree. One `Template` serves one decode/encode session and is not meant
/// to be shared across threads.
#[derive(Debug)]
pub struct Template {
    pub(crate) lists: Vec<ElementList>,
    pub(crate) elems: Vec<Element>,
    pub(crate) settings: TemplateSettings,
    root: ListId,
}

impl Template {
    fn empty(settings: TemplateSettings) -> Template {
        let mut tpl = Template {
            lists: Vec::new(),
            elems: Vec::new(),
            settings,
            root: ListId(0),
        };
        tpl.root = tpl.new_list(None);
        tpl
    }

    #[cfg(test)]
    pub(crate) fn bare() -> Template {
        Template::empty(TemplateSettings::new())
    }

    /// Parses a template definition stream into a configured field tree.
    pub fn parse(
        data: &[u8],
        registry: &Registry,
        settings: TemplateSettings,
    ) -> Result<Template> {
        let (tpl, err) = Self::parse_or_diagnostic(data, registry, settings);
        match err {
            None => Ok(tpl),
            Some(err) => Err(err),
        }
    }

    /// Like [`Template::parse`], but always yields a tree: on failure the
    /// root is replaced with a single divider describing the error, so a
    /// consumer has at least one renderable node even for a malformed
    /// schema.
    pub fn parse_or_diagnostic(
        data: &[u8],
        registry: &Registry,
        settings: TemplateSettings,
    ) -> (Template, Option<TemplateError>) {
        let mut tpl = Template::empty(settings);
        match parser::parse_into(&mut tpl, registry, data) {
            Ok(()) => (tpl, None),
            Err(err) => {
                tpl.install_error_divider(&err);
                (tpl, Some(err))
            }
        }
    }

    fn install_error_divider(&mut self, err: &TemplateError) {
        let label = format!("Template Error\n{err}");
        let el = Element::new(
            TypeCode::new(*b"DVDR"),
            label,
            cosmetic::divider,
            Kind::Divider,
        );
        let root = self.root;
        let id = self.push_elem(el, root);
        let list = self.list_mut(root);
        list.elements = vec![id];
        list.visible = vec![id];
        list.configured = true;
    }

    /// Decodes resource bytes into the field tree. Data shorter than the
    /// template implies is tolerated: decoding stops at the truncation
    /// point and later fields keep their default values.
    pub fn read_resource(&mut self, data: &[u8]) -> Result<()> {
        let root = self.root;
        let mut r = ByteReader::new(data);
        match self.read_list(root, &mut r) {
            Err(err) if err.is_out_of_data() => {
                warn!("resource data ended early: {err}");
                Ok(())
            }
            other => other,
        }
    }

    /// Re-encodes the field tree, sized exactly to its current contents.
    pub fn get_resource_data(&self) -> Vec<u8> {
        let mut size = 0u64;
        self.size_list(self.root, &mut size);
        debug!("encoding resource data, {size} byte(s)");
        let mut w = ByteWriter::with_capacity(size as usize);
        self.write_list(self.root, &mut w);
        w.into_bytes()
    }

    // MARK: tree access

    pub fn root(&self) -> ListId {
        self.root
    }

    pub fn settings(&self) -> &TemplateSettings {
        &self.settings
    }

    pub fn element(&self, id: ElemId) -> &Element {
        self.elem(id)
    }

    /// The elements a consumer should present, in layout order.
    pub fn visible_elements(&self, list: ListId) -> &[ElemId] {
        &self.list(list).visible
    }

    /// All elements of a list in layout order, hidden ones included.
    pub fn elements(&self, list: ListId) -> &[ElemId] {
        &self.list(list).elements
    }

    /// The nested list owned by a list entry or keyed section, if any.
    pub fn children(&self, id: ElemId) -> Option<ListId> {
        match &self.elem(id).kind {
            Kind::List(f) => match &f.role {
                ListRole::Entry { sub, .. } => Some(*sub),
                ListRole::Master { .. } => None,
            },
            Kind::Section(s) => s.sub,
            _ => None,
        }
    }

    /// The materialized entries of a repeating list marker.
    pub fn entries(&self, id: ElemId) -> &[ElemId] {
        match &self.elem(id).kind {
            Kind::List(f) => f.entries(),
            _ => &[],
        }
    }

    /// Whether an element is a repeating list's marker (as opposed to one of
    /// its materialized entries, which share the marker's label).
    pub fn is_list_master(&self, id: ElemId) -> bool {
        matches!(
            &self.elem(id).kind,
            Kind::List(f) if matches!(f.role, ListRole::Master { .. })
        )
    }

    pub fn value(&self, id: ElemId) -> Value<'_> {
        self.elem(id).kind.value(self)
    }

    /// The declared options of a cased field.
    pub fn options(&self, id: ElemId) -> &[CaseOption] {
        self.elem(id).kind.options()
    }

    /// The option name matching the field's current value, if any.
    pub fn option_label(&self, id: ElemId) -> Option<&str> {
        let current = match self.value(id) {
            Value::Int(v) => v,
            Value::UInt(v) | Value::Hex(v) => i64::try_from(v).ok()?,
            _ => return None,
        };
        self.options(id)
            .iter()
            .find(|o| o.matches_int(current))
            .map(|o| o.name())
    }

    // MARK: editing

    /// Applies an edited value to a field, validating shape and bounds.
    pub fn set_value(&mut self, id: ElemId, v: Value<'_>) -> Result<()> {
        let codec = self.settings.get_text_codec();
        let list = self.elem(id).parent;
        let mut kind = std::mem::replace(&mut self.elem_mut(id).kind, Kind::End);
        let res = match (&mut kind, &v) {
            (Kind::Int(f), Value::Int(n)) => f.set(*n),
            (Kind::UInt(f), Value::UInt(n) | Value::Hex(n)) => f.set(*n),
            (Kind::Bool(f), Value::Bool(b)) => {
                f.set(*b);
                Ok(())
            }
            (Kind::Flag(f), Value::Bool(b)) => {
                f.set(*b);
                Ok(())
            }
            (Kind::Real(f), Value::Float(x)) => {
                f.bits = x.to_bits();
                Ok(())
            }
            (Kind::Doub(f), Value::Double(x)) => {
                f.bits = x.to_bits();
                Ok(())
            }
            (Kind::Rect(f), Value::Rect { top, left, bottom, right }) => {
                f.top = *top;
                f.left = *left;
                f.bottom = *bottom;
                f.right = *right;
                Ok(())
            }
            (Kind::Point(f), Value::Point { v, h }) => {
                f.v = *v;
                f.h = *h;
                Ok(())
            }
            (Kind::Str(f), Value::String(s)) => f.set(s, codec),
            (Kind::Char(f), Value::Char(c)) => {
                f.set(*c, codec);
                Ok(())
            }
            (Kind::TypeName(f), Value::TypeCode(tc)) => {
                f.set(*tc);
                Ok(())
            }
            (Kind::Bits(f), Value::UInt(n)) => f.set(*n),
            (Kind::OrValue(f), Value::UInt(n) | Value::Hex(n)) => f.set(*n),
            (Kind::HexDump(f), Value::Bytes(bytes)) => f.set(bytes),
            (Kind::Date(f), Value::Timestamp(ts)) => f.set(*ts),
            (Kind::Color(f), Value::Color { r, g, b }) => {
                f.set(*r, *g, *b);
                Ok(())
            }
            (Kind::ResId(f), Value::ResourceId { id: rid, .. }) => f.set_id(*rid),
            (Kind::Key(f), v) => {
                let want = match (f.repr, v) {
                    (KeyRepr::SInt { .. }, Value::Int(n)) => Some(KeyVal::I(*n)),
                    (KeyRepr::UInt { .. } | KeyRepr::Hex { .. }, Value::UInt(n) | Value::Hex(n)) => {
                        Some(KeyVal::U(*n))
                    }
                    (KeyRepr::Char, Value::Char(c)) => Some(KeyVal::U(u64::from(*c as u8))),
                    (KeyRepr::TypeCode, Value::TypeCode(tc)) => {
                        Some(KeyVal::U(u64::from(u32::from_be_bytes(tc.as_bytes()))))
                    }
                    _ => None,
                };
                match want {
                    Some(want) => f.set(self, id, list, want),
                    None => Err("value does not match the key's type".to_string()),
                }
            }
            (Kind::Counter(_), _) => {
                Err("counts follow their list; add or remove entries instead".to_string())
            }
            _ => Err("value does not match the field's type".to_string()),
        };
        self.elem_mut(id).kind = kind;
        res.map_err(|msg| self.invalid(id, msg))
    }

    /// Whether all bits of a named OR-value mask are currently set.
    pub fn option_set(&self, id: ElemId, name: &str) -> Option<bool> {
        match &self.elem(id).kind {
            Kind::OrValue(f) => f.is_set(name),
            _ => None,
        }
    }

    /// Toggles a named OR-value mask on or off.
    pub fn set_option(&mut self, id: ElemId, name: &str, on: bool) -> Result<()> {
        let res = match &mut self.elem_mut(id).kind {
            Kind::OrValue(f) => f.toggle(name, on),
            _ => Err("field has no OR-value options".to_string()),
        };
        res.map_err(|msg| self.invalid(id, msg))
    }

    /// Appends a fresh entry to a repeating list, keeping any driving
    /// counter in sync. Fixed-count lists cannot grow.
    pub fn insert_entry(&mut self, master: ElemId) -> Result<ElemId> {
        let (form, template, counter) = match &self.elem(master).kind {
            Kind::List(f) => match &f.role {
                ListRole::Master {
                    template, counter, ..
                } => (f.form, *template, *counter),
                ListRole::Entry { .. } => {
                    return Err(self.invalid(master, "not a list marker"));
                }
            },
            _ => return Err(self.invalid(master, "not a list marker")),
        };
        if form == ListForm::FixedCount {
            return Err(self.invalid(master, "fixed-count lists cannot change size"));
        }
        let Some(template) = template else {
            return Err(self.invalid(master, "list is not configured"));
        };
        let new_count = self.entries(master).len() + 1;
        if let Some(counter_id) = counter
            && let Kind::Counter(c) = &self.elem(counter_id).kind
            && let Err(msg) = check_capacity(c, new_count)
        {
            return Err(self.invalid(master, msg));
        }

        let parent = self.elem(master).parent;
        let sub = self.instantiate_list(template, parent)?;
        let entry = entry_element(self.elem(master), sub, true);
        let entry_id = self.push_elem(entry, parent);
        self.insert_before_elem(parent, entry_id, master);
        if let Kind::List(f) = &mut self.elem_mut(master).kind
            && let ListRole::Master { entries, .. } = &mut f.role
        {
            entries.push(entry_id);
        }
        self.sync_counter(master);
        Ok(entry_id)
    }

    /// Removes a previously materialized entry from a repeating list.
    pub fn remove_entry(&mut self, master: ElemId, entry: ElemId) -> Result<()> {
        let parent = self.elem(master).parent;
        match &self.elem(master).kind {
            Kind::List(f) if f.form != ListForm::FixedCount => {
                if !f.entries().contains(&entry) {
                    return Err(self.invalid(master, "entry does not belong to this list"));
                }
            }
            Kind::List(_) => {
                return Err(self.invalid(master, "fixed-count lists cannot change size"));
            }
            _ => return Err(self.invalid(master, "not a list marker")),
        }
        self.remove_from_list(parent, entry);
        if let Kind::List(f) = &mut self.elem_mut(master).kind
            && let ListRole::Master { entries, .. } = &mut f.role
        {
            entries.retain(|&e| e != entry);
        }
        self.sync_counter(master);
        Ok(())
    }

    fn sync_counter(&mut self, master: ElemId) {
        let count = self.entries(master).len() as u32;
        let counter = match &self.elem(master).kind {
            Kind::List(f) => f.counter_id(),
            _ => None,
        };
        if let Some(counter) = counter
            && let Kind::Counter(c) = &mut self.elem_mut(counter).kind
        {
            c.count = count;
        }
    }

    /// Positional insertion directly before an anchor element.
    fn insert_before_elem(&mut self, list: ListId, id: ElemId, anchor: ElemId) {
        let Some(idx) = self.list(list).elements.iter().position(|&e| e == anchor) else {
            return;
        };
        self.elem_mut(id).parent = list;
        {
            let l = self.list_mut(list);
            l.elements.insert(idx, id);
            if idx <= l.current {
                l.current += 1;
            }
        }
        if self.elem(id).visible {
            self.visible_insert(list, idx, id);
        }
    }
}
