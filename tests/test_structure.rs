mod fixtures;

use fixtures::{ensure_env_logger_initialized, find, find_master, parse, parse_with_data, schema};
use pretty_assertions::assert_eq;
use restmpl::{Registry, Template, TemplateError, TemplateSettings, Value};

fn parse_err(entries: &[(&str, &[u8; 4])]) -> TemplateError {
    ensure_env_logger_initialized();
    let registry = Registry::new();
    Template::parse(&schema(entries), &registry, TemplateSettings::new())
        .expect_err("template should not parse")
}

#[test]
fn unknown_type_code_is_rejected() {
    let err = parse_err(&[("Mystery", b"ZZZZ")]);
    match err {
        TemplateError::UnknownElement(code) => assert_eq!(code, "ZZZZ"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unclosed_list_is_rejected() {
    let err = parse_err(&[("Items", b"LSTB"), ("Id", b"UBYT")]);
    match err {
        TemplateError::UnclosedElement {
            type_code,
            end_type,
            ..
        } => {
            assert_eq!(type_code, "LSTB");
            assert_eq!(end_type, "LSTE");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn truncated_schema_is_corrupt() {
    ensure_env_logger_initialized();
    let registry = Registry::new();
    let mut bytes = schema(&[("Level", b"DBYT")]);
    bytes.truncate(bytes.len() - 2);
    let err = Template::parse(&bytes, &registry, TemplateSettings::new())
        .expect_err("template should not parse");
    assert!(matches!(err, TemplateError::Corrupt));
}

#[test]
fn malformed_schema_still_yields_a_renderable_tree() {
    ensure_env_logger_initialized();
    let registry = Registry::new();
    let bytes = schema(&[("Level", b"DBYT"), ("Mystery", b"ZZZZ")]);
    let (tpl, err) = Template::parse_or_diagnostic(&bytes, &registry, TemplateSettings::new());

    assert!(matches!(err, Some(TemplateError::UnknownElement(_))));
    let visible = tpl.visible_elements(tpl.root());
    assert_eq!(visible.len(), 1);
    let divider = tpl.element(visible[0]);
    assert_eq!(divider.display_label(), "Template Error");
    assert!(divider.tooltip().contains("ZZZZ"));
}

#[test]
fn repeat_expands_with_indexed_labels() {
    let tpl = parse(&[("", b"R003"), ("Item %", b"UBYT")]);
    let labels: Vec<_> = tpl
        .visible_elements(tpl.root())
        .iter()
        .map(|&id| tpl.element(id).display_label().to_string())
        .collect();
    assert_eq!(labels, vec!["Item 1", "Item 2", "Item 3"]);
}

#[test]
fn repeat_offset_comes_from_its_label() {
    let tpl = parse(&[("=0", b"R002"), ("Slot %", b"UBYT")]);
    let labels: Vec<_> = tpl
        .visible_elements(tpl.root())
        .iter()
        .map(|&id| tpl.element(id).display_label().to_string())
        .collect();
    assert_eq!(labels, vec!["Slot 0", "Slot 1"]);
}

#[test]
fn keyed_section_reads_only_the_matching_block() {
    let entries: &[(&str, &[u8; 4])] = &[
        ("Kind", b"KBYT"),
        ("Point=0", b"CASE"),
        ("Size=2", b"CASE"),
        ("0", b"KEYB"),
        ("X", b"DBYT"),
        ("Y", b"DBYT"),
        ("", b"KEYE"),
        ("2", b"KEYB"),
        ("Width", b"UWRD"),
        ("", b"KEYE"),
    ];
    // Key value 2 selects the Width block.
    let data = vec![2, 0x01, 0x00];

    let tpl = parse_with_data(entries, &data);

    assert_eq!(tpl.value(find(&tpl, "Kind")), Value::Int(2));
    assert_eq!(tpl.value(find(&tpl, "Width")), Value::UInt(256));
    // The sibling block for key 0 is neither visible nor written.
    let visible_labels: Vec<_> = {
        fn walk(tpl: &Template, list: restmpl::ListId, out: &mut Vec<String>) {
            for &id in tpl.visible_elements(list) {
                out.push(tpl.element(id).display_label().to_string());
                if let Some(sub) = tpl.children(id) {
                    walk(tpl, sub, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&tpl, tpl.root(), &mut out);
        out
    };
    assert!(!visible_labels.contains(&"X".to_string()));
    assert_eq!(tpl.get_resource_data(), data);
}

#[test]
fn keyed_section_covers_multiple_values() {
    let entries: &[(&str, &[u8; 4])] = &[
        ("Kind", b"KUBT"),
        ("A=1", b"CASE"),
        ("B=2", b"CASE"),
        ("1,2", b"KEYB"),
        ("Payload", b"UBYT"),
        ("", b"KEYE"),
    ];
    let data = vec![2, 9];
    let tpl = parse_with_data(entries, &data);
    assert_eq!(tpl.value(find(&tpl, "Payload")), Value::UInt(9));
    assert_eq!(tpl.get_resource_data(), data);
}

#[test]
fn nested_same_type_lists_extract_with_a_nesting_counter() {
    // The outer list's extraction must skip the inner begin/end pair.
    let entries: &[(&str, &[u8; 4])] = &[
        ("Outer", b"LSTB"),
        ("Inner", b"LSTZ"),
        ("Id", b"UBYT"),
        ("", b"LSTE"),
        ("", b"LSTE"),
        ("Tail", b"UBYT"),
    ];
    let tpl = parse(entries);

    // "Tail" must survive at the root: a naive extraction would have
    // stopped at the inner LSTE and swallowed it.
    let root_labels: Vec<_> = tpl
        .visible_elements(tpl.root())
        .iter()
        .map(|&id| tpl.element(id).display_label().to_string())
        .collect();
    assert_eq!(root_labels, vec!["Outer", "Tail"]);
}

#[test]
fn nested_same_type_lists_round_trip() {
    let entries: &[(&str, &[u8; 4])] = &[
        ("Outer", b"LSTB"),
        ("Inner", b"LSTZ"),
        ("Id", b"UBYT"),
        ("", b"LSTE"),
        ("", b"LSTE"),
    ];
    // Two outer entries: inner lists [1] and [2, 3].
    let data = vec![1, 0, 2, 3, 0];
    let tpl = parse_with_data(entries, &data);

    let outer = find_master(&tpl, "Outer");
    assert_eq!(tpl.entries(outer).len(), 2);
    assert_eq!(tpl.get_resource_data(), data);
}

#[test]
fn fixed_count_lists_materialize_at_configure_time() {
    let entries: &[(&str, &[u8; 4])] = &[
        ("3 Slots", b"FCNT"),
        ("Slot", b"LSTC"),
        ("Id", b"UBYT"),
        ("", b"LSTE"),
    ];
    // Entries exist before any data is read.
    let tpl = parse(entries);
    let master = find_master(&tpl, "Slot");
    assert_eq!(tpl.entries(master).len(), 3);

    let mut tpl = tpl;
    tpl.read_resource(&[4, 5, 6]).unwrap();
    assert_eq!(tpl.get_resource_data(), vec![4, 5, 6]);

    // Fixed lists cannot change size.
    assert!(tpl.insert_entry(master).is_err());
}

#[test]
fn orphan_case_is_invalid_structure() {
    let err = parse_err(&[("Lone=1", b"CASE")]);
    assert!(matches!(err, TemplateError::InvalidStructure { .. }));
}

#[test]
fn orphan_keyed_section_is_invalid_structure() {
    let err = parse_err(&[("1", b"KEYB"), ("X", b"UBYT"), ("", b"KEYE")]);
    assert!(matches!(err, TemplateError::InvalidStructure { .. }));
}

#[test]
fn counted_list_requires_a_preceding_counter() {
    let err = parse_err(&[("Items", b"LSTC"), ("Id", b"UBYT"), ("", b"LSTE")]);
    assert!(matches!(err, TemplateError::InvalidStructure { .. }));
}

#[test]
fn incomplete_bit_run_is_invalid_structure() {
    let err = parse_err(&[("Lonely", b"BBIT"), ("Tail", b"UBYT")]);
    assert!(matches!(err, TemplateError::InvalidStructure { .. }));
}

#[test]
fn pack_hides_its_members() {
    let entries: &[(&str, &[u8; 4])] = &[
        ("Position=X,Y", b"PACK"),
        ("X", b"DBYT"),
        ("Y", b"DBYT"),
    ];
    let tpl = parse_with_data(entries, &[3, 4]);

    let root_labels: Vec<_> = tpl
        .visible_elements(tpl.root())
        .iter()
        .map(|&id| tpl.element(id).display_label().to_string())
        .collect();
    assert_eq!(root_labels, vec!["Position"]);
    // Hidden members still decode and encode in place.
    assert_eq!(tpl.get_resource_data(), vec![3, 4]);
}

#[test]
fn case_options_label_matching_values() {
    let entries: &[(&str, &[u8; 4])] = &[
        ("Terrain", b"DBYT"),
        ("Plains=0", b"CASE"),
        ("Hills=1", b"CASE"),
        ("Peaks=2..5", b"CASR"),
    ];
    let mut tpl = parse(entries);
    tpl.read_resource(&[1]).unwrap();
    let terrain = find(&tpl, "Terrain");
    assert_eq!(tpl.options(terrain).len(), 3);
    assert_eq!(tpl.option_label(terrain), Some("Hills"));

    tpl.read_resource(&[4]).unwrap();
    assert_eq!(tpl.option_label(terrain), Some("Peaks"));

    tpl.read_resource(&[9]).unwrap();
    assert_eq!(tpl.option_label(terrain), None);
}

#[test]
fn own_id_key_follows_the_record_id() {
    let entries: &[(&str, &[u8; 4])] = &[
        ("", b"KRID"),
        ("128", b"KEYB"),
        ("Extra", b"UBYT"),
        ("", b"KEYE"),
        ("129", b"KEYB"),
        ("Other", b"UWRD"),
        ("", b"KEYE"),
    ];
    ensure_env_logger_initialized();
    let registry = Registry::new();
    let settings = TemplateSettings::new().resource_id(129);
    let mut tpl = Template::parse(&schema(entries), &registry, settings).unwrap();
    tpl.read_resource(&[0x02, 0x01]).unwrap();

    assert_eq!(tpl.value(find(&tpl, "Other")), Value::UInt(0x0201));
    assert_eq!(tpl.get_resource_data(), vec![0x02, 0x01]);
}

#[test]
fn resource_id_reference_applies_its_offset() {
    let entries: &[(&str, &[u8; 4])] = &[("Sound='snd ' 128", b"RSID")];
    let tpl = parse_with_data(entries, &[0x00, 0x02]);
    assert_eq!(
        tpl.value(find(&tpl, "Sound")),
        Value::ResourceId {
            id: 130,
            target: Some(restmpl::TypeCode::new(*b"snd ")),
        }
    );
}
