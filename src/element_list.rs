//! The interpreter core: ordered element lists with configure/read/write
//! passes and cursor-relative mutation primitives.
//!
//! Lists may grow while a pass is in flight, so every pass walks by index
//! against the live length; language iterators would invalidate under the
//! mutation the field kinds are allowed to perform.

use std::mem;

use crate::cursor::{ByteReader, ByteWriter};
use crate::element::{Element, ElemId, ListId, TypeCode};
use crate::err::{Result, TemplateError};
use crate::fields::Kind;
use crate::template::Template;

/// One ordered scope of elements. `elements` order is authoritative for
/// byte layout; `visible` is the same order filtered for presentation.
#[derive(Debug, Default)]
pub(crate) struct ElementList {
    pub(crate) elements: Vec<ElemId>,
    pub(crate) visible: Vec<ElemId>,
    pub(crate) current: usize,
    pub(crate) parent: Option<ListId>,
    pub(crate) configured: bool,
}

impl Template {
    pub(crate) fn new_list(&mut self, parent: Option<ListId>) -> ListId {
        let id = ListId(self.lists.len() as u32);
        self.lists.push(ElementList {
            parent,
            ..ElementList::default()
        });
        id
    }

    #[inline]
    pub(crate) fn list(&self, list: ListId) -> &ElementList {
        &self.lists[list.idx()]
    }

    #[inline]
    pub(crate) fn list_mut(&mut self, list: ListId) -> &mut ElementList {
        &mut self.lists[list.idx()]
    }

    #[inline]
    pub(crate) fn elem(&self, id: ElemId) -> &Element {
        &self.elems[id.idx()]
    }

    #[inline]
    pub(crate) fn elem_mut(&mut self, id: ElemId) -> &mut Element {
        &mut self.elems[id.idx()]
    }

    /// Adds an element to the arena without inserting it into any list.
    pub(crate) fn push_elem(&mut self, mut el: Element, parent: ListId) -> ElemId {
        el.parent = parent;
        let id = ElemId(self.elems.len() as u32);
        self.elems.push(el);
        id
    }

    /// Appends to the end of a list; used while parsing the schema stream.
    pub(crate) fn append(&mut self, list: ListId, id: ElemId) {
        self.elem_mut(id).parent = list;
        self.list_mut(list).elements.push(id);
    }

    /// Builds an `InvalidStructure` error carrying an element's identity.
    pub(crate) fn invalid(&self, id: ElemId, message: impl Into<String>) -> TemplateError {
        let el = self.elem(id);
        TemplateError::InvalidStructure {
            type_code: el.type_code.to_string(),
            label: el.display_label().to_string(),
            message: message.into(),
        }
    }

    // Visibility bookkeeping. `visible` always equals `elements` filtered to
    // the visible members, so an insertion position is the count of visible
    // members that precede the element.
    pub(crate) fn visible_pos(&self, list: ListId, elem_idx: usize) -> usize {
        let l = self.list(list);
        l.elements[..elem_idx]
            .iter()
            .filter(|id| l.visible.contains(id))
            .count()
    }

    pub(crate) fn visible_insert(&mut self, list: ListId, elem_idx: usize, id: ElemId) {
        let pos = self.visible_pos(list, elem_idx);
        self.list_mut(list).visible.insert(pos, id);
    }

    /// Inserts a new element relative to the cursor. During configure the
    /// element lands after the cursor and the walk skips it (it must arrive
    /// pre-configured); during read it lands before the cursor and the pass
    /// does not revisit it.
    pub(crate) fn insert_at_cursor(&mut self, list: ListId, el: Element) -> ElemId {
        let id = self.push_elem(el, list);
        self.insert_existing_at_cursor(list, id);
        id
    }

    /// The cursor-relative insertion contract for an element that already
    /// lives in the arena (e.g. a keyed section being re-attached).
    pub(crate) fn insert_existing_at_cursor(&mut self, list: ListId, id: ElemId) {
        self.elem_mut(id).parent = list;
        let configured = self.list(list).configured;
        let idx = if !configured {
            let l = self.list_mut(list);
            l.current += 1;
            let idx = l.current.min(l.elements.len());
            l.elements.insert(idx, id);
            idx
        } else {
            let l = self.list_mut(list);
            let idx = l.current.min(l.elements.len());
            l.elements.insert(idx, id);
            l.current += 1;
            idx
        };
        if self.elem(id).visible {
            self.visible_insert(list, idx, id);
        }
    }

    /// Positional insertion directly after an anchor element.
    pub(crate) fn insert_after_elem(&mut self, list: ListId, id: ElemId, anchor: ElemId) {
        self.elem_mut(id).parent = list;
        let Some(pos) = self.position_of(list, anchor) else {
            return;
        };
        let idx = pos + 1;
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

    pub(crate) fn remove_from_list(&mut self, list: ListId, id: ElemId) {
        let Some(pos) = self.position_of(list, id) else {
            return;
        };
        let l = self.list_mut(list);
        l.elements.remove(pos);
        if pos < l.current {
            l.current -= 1;
        }
        l.visible.retain(|&v| v != id);
    }

    fn position_of(&self, list: ListId, id: ElemId) -> Option<usize> {
        self.list(list).elements.iter().position(|&e| e == id)
    }

    /// Peeks at the element `n` positions ahead of the cursor.
    pub(crate) fn peek(&self, list: ListId, n: usize) -> Option<ElemId> {
        let l = self.list(list);
        l.elements.get(l.current + n).copied()
    }

    /// Removes and returns the element just past the cursor.
    pub(crate) fn pop(&mut self, list: ListId) -> Option<ElemId> {
        let l = self.list_mut(list);
        let i = l.current + 1;
        if i >= l.elements.len() {
            return None;
        }
        Some(l.elements.remove(i))
    }

    /// Type-filtered [`Template::pop`]: leaves the list untouched when the
    /// next element's code does not match.
    pub(crate) fn pop_of_type(&mut self, list: ListId, tc: TypeCode) -> Option<ElemId> {
        let next = self.peek(list, 1)?;
        if self.elem(next).type_code != tc {
            return None;
        }
        self.pop(list)
    }

    /// Forward scan from just past the cursor, not consuming.
    pub(crate) fn next_matching(
        &self,
        list: ListId,
        pred: impl Fn(&Element) -> bool,
    ) -> Option<ElemId> {
        let l = self.list(list);
        l.elements[(l.current + 1).min(l.elements.len())..]
            .iter()
            .copied()
            .find(|&id| pred(self.elem(id)))
    }

    pub(crate) fn next_with_label(&self, list: ListId, label: &str) -> Option<ElemId> {
        self.next_matching(list, |el| el.display_label() == label)
    }

    /// Backward scan from just before the cursor, continuing into the parent
    /// list when the scope is exhausted.
    pub(crate) fn previous_matching(
        &self,
        list: ListId,
        pred: impl Fn(&Element) -> bool,
    ) -> Option<ElemId> {
        let l = self.list(list);
        let found = l.elements[..l.current.min(l.elements.len())]
            .iter()
            .rev()
            .copied()
            .find(|&id| pred(self.elem(id)));
        match (found, l.parent) {
            (Some(id), _) => Some(id),
            (None, Some(parent)) => self.previous_matching(parent, pred),
            (None, None) => None,
        }
    }

    /// Extracts everything past the cursor up to the matching `end` marker
    /// into a new child list. A nesting counter skips same-family open/close
    /// pairs; exhausting the scope first is `UnclosedElement`.
    pub(crate) fn sub_list(
        &mut self,
        list: ListId,
        end: TypeCode,
        start_tc: TypeCode,
        start_label: &str,
    ) -> Result<ListId> {
        let new = self.new_list(Some(list));
        let mut nesting = 0u32;
        loop {
            let Some(id) = self.pop(list) else {
                return Err(TemplateError::UnclosedElement {
                    type_code: start_tc.to_string(),
                    label: start_label.split('\n').next().unwrap_or_default().to_string(),
                    end_type: end.to_string(),
                });
            };
            let el = self.elem(id);
            if el.end_type() == Some(end) {
                nesting += 1;
            } else if el.type_code == end {
                if nesting == 0 {
                    break;
                }
                nesting -= 1;
            }
            self.append(new, id);
        }
        Ok(new)
    }

    /// Materializes a fresh, configured copy of an unconfigured template
    /// list. Elements are rebuilt from their type code and label through
    /// their own constructors, so per-instance state starts clean.
    pub(crate) fn instantiate_list(&mut self, template: ListId, parent: ListId) -> Result<ListId> {
        let new = self.new_list(Some(parent));
        let src: Vec<ElemId> = self.list(template).elements.clone();
        for src_id in src {
            let (tc, label, ctor) = {
                let el = self.elem(src_id);
                (el.type_code, el.label.clone(), el.ctor)
            };
            let kind = ctor(tc, &label).ok_or_else(|| {
                TemplateError::UnknownElement(tc.to_string())
            })?;
            let el = Element::new(tc, label, ctor, kind);
            let id = self.push_elem(el, new);
            self.list_mut(new).elements.push(id);
        }
        self.configure_list(new)?;
        Ok(new)
    }

    /// The one-shot configure pass. Walks by index so elements appended by
    /// other elements' configure steps are still visited; the visible
    /// position is captured before the step runs because an element may
    /// change its own visibility while configuring.
    pub(crate) fn configure_list(&mut self, list: ListId) -> Result<()> {
        if self.list(list).configured {
            return Ok(());
        }
        self.list_mut(list).current = 0;
        while self.list(list).current < self.list(list).elements.len() {
            let idx = self.list(list).current;
            let id = self.list(list).elements[idx];
            self.elem_mut(id).parent = list;
            let res = self.dispatch_configure(id, list);
            res?;
            if self.elem(id).visible {
                let idx = self.list(list)
                    .elements
                    .iter()
                    .position(|&e| e == id)
                    .unwrap_or(idx);
                self.visible_insert(list, idx, id);
            }
            self.list_mut(list).current += 1;
        }
        self.list_mut(list).configured = true;
        Ok(())
    }

    fn dispatch_configure(&mut self, id: ElemId, list: ListId) -> Result<()> {
        // The slot holds an inert marker while its kind is checked out; a
        // kind never inspects its own element during its step.
        let mut kind = mem::replace(&mut self.elem_mut(id).kind, Kind::End);
        let res = kind.configure(self, id, list);
        self.elem_mut(id).kind = kind;
        res
    }

    /// The decode pass: a single linear walk against the live element list,
    /// stopping early once the byte cursor is exhausted. Short data is the
    /// caller's early-stop signal, not an error here.
    pub(crate) fn read_list(&mut self, list: ListId, r: &mut ByteReader<'_>) -> Result<()> {
        self.list_mut(list).current = 0;
        while self.list(list).current < self.list(list).elements.len() && r.remaining() > 0 {
            let id = self.list(list).elements[self.list(list).current];
            let mut kind = mem::replace(&mut self.elem_mut(id).kind, Kind::End);
            let res = kind.read_data(self, id, list, r);
            self.elem_mut(id).kind = kind;
            res?;
            self.list_mut(list).current += 1;
        }
        Ok(())
    }

    /// The encode pass: plain ordered walk, infallible by construction.
    pub(crate) fn write_list(&self, list: ListId, w: &mut ByteWriter) {
        for &id in &self.list(list).elements {
            self.elem(id).kind.write_data(self, w);
        }
    }

    /// Accumulates the encoded byte footprint of a list.
    pub(crate) fn size_list(&self, list: ListId, size: &mut u64) {
        for &id in &self.list(list).elements {
            self.elem(id).kind.data_size(self, size);
        }
    }
}
