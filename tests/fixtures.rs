#![allow(dead_code)]

use std::sync::Once;

use restmpl::{Registry, Template, TemplateSettings};

static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}

/// Encodes a template definition stream: (length-prefixed label, type code)
/// pairs in declaration order.
pub fn schema(entries: &[(&str, &[u8; 4])]) -> Vec<u8> {
    let mut out = Vec::new();
    for (label, code) in entries {
        out.push(u8::try_from(label.len()).expect("fixture labels stay under 256 bytes"));
        out.extend_from_slice(label.as_bytes());
        out.extend_from_slice(&code[..]);
    }
    out
}

/// Parses a fixture schema that is expected to be well-formed.
pub fn parse(entries: &[(&str, &[u8; 4])]) -> Template {
    ensure_env_logger_initialized();
    let registry = Registry::new();
    Template::parse(&schema(entries), &registry, TemplateSettings::new())
        .expect("fixture template should parse")
}

/// Parses a schema and decodes `data` against it.
pub fn parse_with_data(entries: &[(&str, &[u8; 4])], data: &[u8]) -> Template {
    let mut tpl = parse(entries);
    tpl.read_resource(data).expect("fixture data should decode");
    tpl
}

/// Finds the first visible element with the given display label, searching
/// the whole tree depth-first.
pub fn find(tpl: &Template, label: &str) -> restmpl::ElemId {
    fn walk(tpl: &Template, list: restmpl::ListId, label: &str) -> Option<restmpl::ElemId> {
        for &id in tpl.visible_elements(list) {
            if tpl.element(id).display_label() == label {
                return Some(id);
            }
            if let Some(sub) = tpl.children(id) {
                if let Some(found) = walk(tpl, sub, label) {
                    return Some(found);
                }
            }
        }
        None
    }
    walk(tpl, tpl.root(), label).unwrap_or_else(|| panic!("no element labeled {label:?}"))
}

/// Finds a repeating list's marker element by label. Entries share the
/// marker's label, so a plain label search could land on an entry instead.
pub fn find_master(tpl: &Template, label: &str) -> restmpl::ElemId {
    fn walk(tpl: &Template, list: restmpl::ListId, label: &str) -> Option<restmpl::ElemId> {
        for &id in tpl.visible_elements(list) {
            if tpl.element(id).display_label() == label && tpl.is_list_master(id) {
                return Some(id);
            }
            if let Some(sub) = tpl.children(id) {
                if let Some(found) = walk(tpl, sub, label) {
                    return Some(found);
                }
            }
        }
        None
    }
    walk(tpl, tpl.root(), label).unwrap_or_else(|| panic!("no list marker labeled {label:?}"))
}
