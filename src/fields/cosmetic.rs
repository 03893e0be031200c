use crate::element::{ElemId, ListId, TypeCode};
use crate::err::Result;
use crate::fields::Kind;
use crate::fields::case::parse_resource_ref;
use crate::template::Template;
use crate::value::Value;

pub(crate) fn divider(_tc: TypeCode, _label: &str) -> Option<Kind> {
    Some(Kind::Divider)
}

/// LSTE/KEYE close markers. Normally consumed during sub-list extraction;
/// an orphan is inert and invisible.
pub(crate) fn end(_tc: TypeCode, _label: &str) -> Option<Kind> {
    Some(Kind::End)
}

/// RREF: a static cross-reference to another record, named in the label.
#[derive(Debug, Clone)]
pub(crate) struct CrossRefField {
    pub(crate) target: Option<TypeCode>,
    pub(crate) id: i64,
}

pub(crate) fn cross_ref(_tc: TypeCode, label: &str) -> Option<Kind> {
    let (target, id) = parse_resource_ref(label);
    Some(Kind::CrossRef(CrossRefField { target, id }))
}

impl CrossRefField {
    pub(crate) fn value(&self) -> Value<'_> {
        match self.target {
            Some(target) => Value::ResourceId {
                id: self.id,
                target: Some(target),
            },
            None => Value::None,
        }
    }
}

/// PACK: groups the named sibling fields into one presentation row.
///
/// The grouped fields are hidden but keep their own byte positions; PACK
/// itself occupies no bytes.
#[derive(Debug, Clone)]
pub(crate) struct PackField {
    pub(crate) members: Vec<ElemId>,
}

pub(crate) fn pack(_tc: TypeCode, _label: &str) -> Option<Kind> {
    Some(Kind::Pack(PackField {
        members: Vec::new(),
    }))
}

impl PackField {
    pub(crate) fn configure(
        &mut self,
        tpl: &mut Template,
        id: ElemId,
        list: ListId,
    ) -> Result<()> {
        let Some(meta) = tpl.elem(id).meta().map(str::to_string) else {
            return Err(tpl.invalid(id, "no element labels to pack"));
        };
        for name in meta.split(',') {
            let Some(member) = tpl.next_with_label(list, name) else {
                return Err(tpl.invalid(
                    id,
                    format!("packed element \u{201c}{name}\u{201d} not found"),
                ));
            };
            tpl.elem_mut(member).visible = false;
            self.members.push(member);
        }
        Ok(())
    }
}
