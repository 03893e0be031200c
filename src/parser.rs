//! Reads the template definition stream: a flat sequence of
//! (length-prefixed label, 4-byte type code) pairs, consumed in order.

use log::trace;

use crate::cursor::ByteReader;
use crate::element::{Element, ElemId, TypeCode};
use crate::err::{Result, TemplateError};
use crate::registry::Registry;
use crate::template::Template;

/// Parses the whole schema stream into the root list, then configures it.
pub(crate) fn parse_into(tpl: &mut Template, registry: &Registry, data: &[u8]) -> Result<()> {
    let mut r = ByteReader::new(data);
    while r.remaining() > 0 {
        if let Some(id) = read_element(tpl, registry, &mut r)? {
            let root = tpl.root();
            tpl.append(root, id);
        }
    }
    tpl.configure_list(tpl.root())
}

/// Reads one schema entry and resolves it against the registry.
///
/// Returns `None` for the repeat pseudo-element `R###`, which consumes the
/// next entry and appends its expansions directly: each copy gets any `%`
/// in the label replaced with its 1-based index plus an optional offset
/// declared as `=<offset>` in the repeat's own label.
pub(crate) fn read_element(
    tpl: &mut Template,
    registry: &Registry,
    r: &mut ByteReader<'_>,
) -> Result<Option<ElemId>> {
    let codec = tpl.settings().get_text_codec();
    let label = r
        .read_pstring(codec, "element label")
        .map_err(|_| TemplateError::Corrupt)?;
    let code_bytes: [u8; 4] = r
        .take_bytes(4, "element type")
        .map_err(|_| TemplateError::Corrupt)?
        .try_into()
        .expect("take_bytes returns the requested length");
    let tc = TypeCode::new(code_bytes);
    trace!(
        "Offset `0x{offset:08x}` read element {tc} \u{201c}{label}\u{201d}",
        offset = r.position()
    );

    if registry.is_repeat(tc) {
        let count = tc
            .hex_suffix()
            .expect("repeat codes always carry a hex suffix");
        let offset: i64 = label
            .split('=')
            .next_back()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);
        let proto = read_element(tpl, registry, r)?.ok_or(TemplateError::Corrupt)?;
        let (proto_tc, proto_label, ctor) = {
            let el = tpl.elem(proto);
            (el.type_code, el.label.clone(), el.ctor)
        };
        for i in 0..i64::from(count) {
            let label = proto_label.replace('%', &(i + offset).to_string());
            let kind =
                ctor(proto_tc, &label).ok_or_else(|| {
                    TemplateError::UnknownElement(proto_tc.to_string())
                })?;
            let el = Element::new(proto_tc, label, ctor, kind);
            let root = tpl.root();
            let id = tpl.push_elem(el, root);
            tpl.append(root, id);
        }
        // The prototype itself is discarded; only the expansions survive.
        return Ok(None);
    }

    let Some(ctor) = registry.resolve(tc) else {
        return Err(TemplateError::UnknownElement(tc.to_string()));
    };
    let Some(kind) = ctor(tc, &label) else {
        return Err(TemplateError::UnknownElement(tc.to_string()));
    };
    let root = tpl.root();
    let id = tpl.push_elem(Element::new(tc, label, ctor, kind), root);
    Ok(Some(id))
}
