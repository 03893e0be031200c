mod fixtures;

use fixtures::{find, find_master, parse, parse_with_data};
use pretty_assertions::assert_eq;
use restmpl::Value;

#[test]
fn scalar_fields_round_trip() {
    let entries: &[(&str, &[u8; 4])] = &[
        ("Level", b"DBYT"),
        ("Flags", b"HWRD"),
        ("Weight", b"UWRD"),
        ("Bounds", b"RECT"),
        ("Origin", b"PNT "),
        ("Enabled", b"BOOL"),
        ("Scale", b"REAL"),
    ];
    let data: Vec<u8> = [
        vec![0xFEu8],                                     // Level = -2
        vec![0xBE, 0xEF],                                 // Flags
        vec![0x01, 0x00],                                 // Weight = 256
        vec![0, 1, 0, 2, 0, 3, 0, 4],                     // Bounds
        vec![0xFF, 0xFF, 0x00, 0x05],                     // Origin v=-1 h=5
        vec![0x01, 0x00],                                 // Enabled (true)
        1.5f32.to_be_bytes().to_vec(),                    // Scale
    ]
    .concat();

    let mut tpl = parse_with_data(entries, &data);

    assert_eq!(tpl.value(find(&tpl, "Level")), Value::Int(-2));
    assert_eq!(tpl.value(find(&tpl, "Flags")), Value::Hex(0xBEEF));
    assert_eq!(tpl.value(find(&tpl, "Weight")), Value::UInt(256));
    assert_eq!(
        tpl.value(find(&tpl, "Bounds")),
        Value::Rect {
            top: 1,
            left: 2,
            bottom: 3,
            right: 4
        }
    );
    assert_eq!(tpl.value(find(&tpl, "Origin")), Value::Point { v: -1, h: 5 });
    assert_eq!(tpl.value(find(&tpl, "Enabled")), Value::Bool(true));
    assert_eq!(tpl.value(find(&tpl, "Scale")), Value::Float(1.5));

    assert_eq!(tpl.get_resource_data(), data);

    // An in-range edit changes exactly the edited bytes.
    let level = find(&tpl, "Level");
    tpl.set_value(level, Value::Int(7)).unwrap();
    let mut expected = data.clone();
    expected[0] = 7;
    assert_eq!(tpl.get_resource_data(), expected);
}

#[test]
fn string_fields_round_trip() {
    let entries: &[(&str, &[u8; 4])] = &[
        ("Name", b"PSTR"),
        ("Padded", b"ESTR"),
        ("Path", b"CSTR"),
        ("Code", b"P008"),
        ("Type", b"TNAM"),
        ("Initial", b"CHAR"),
    ];
    let data: Vec<u8> = [
        &[3, b'a', b'b', b'c'][..],                   // Name
        &[2, b'h', b'i', 0][..],                      // Padded: 3 bytes data + pad
        &[b'/', b't', b'm', b'p', 0][..],             // Path
        &[3, b'x', b'y', b'z', 0, 0, 0, 0][..],       // Code: 8 bytes total
        b"icns",                                      // Type
        &[b'Q'][..],                                  // Initial
    ]
    .concat();

    let mut tpl = parse_with_data(entries, &data);

    assert_eq!(tpl.value(find(&tpl, "Name")), Value::String("abc"));
    assert_eq!(tpl.value(find(&tpl, "Padded")), Value::String("hi"));
    assert_eq!(tpl.value(find(&tpl, "Path")), Value::String("/tmp"));
    assert_eq!(tpl.value(find(&tpl, "Code")), Value::String("xyz"));
    assert_eq!(
        tpl.value(find(&tpl, "Type")),
        Value::TypeCode(restmpl::TypeCode::new(*b"icns"))
    );
    assert_eq!(tpl.value(find(&tpl, "Initial")), Value::Char('Q'));

    assert_eq!(tpl.get_resource_data(), data);

    // Variable-length edits legitimately change the total length.
    let name = find(&tpl, "Name");
    tpl.set_value(name, Value::String("longer")).unwrap();
    let out = tpl.get_resource_data();
    assert_eq!(out.len(), data.len() + 3);
    assert_eq!(&out[..7], &[6, b'l', b'o', b'n', b'g', b'e', b'r']);
}

#[test]
fn counted_list_round_trips() {
    let entries: &[(&str, &[u8; 4])] = &[
        ("Stars", b"OCNT"),
        ("Star", b"LSTC"),
        ("Brightness", b"DBYT"),
        ("", b"LSTE"),
    ];
    let data = vec![0x00, 0x03, 5, 6, 7];

    let tpl = parse_with_data(entries, &data);

    let master = find_master(&tpl, "Star");
    assert_eq!(tpl.entries(master).len(), 3);
    assert_eq!(tpl.value(find(&tpl, "Stars")), Value::Count(3));

    let brightness: Vec<_> = tpl
        .entries(master)
        .iter()
        .map(|&e| {
            let sub = tpl.children(e).expect("entries own a sub-list");
            tpl.value(tpl.visible_elements(sub)[0]).clone()
        })
        .collect();
    assert_eq!(
        brightness,
        vec![Value::Int(5), Value::Int(6), Value::Int(7)]
    );

    assert_eq!(tpl.get_resource_data(), data);
}

#[test]
fn zero_terminated_and_open_lists_round_trip() {
    let entries: &[(&str, &[u8; 4])] = &[
        ("Tag", b"LSTZ"),
        ("Id", b"UBYT"),
        ("", b"LSTE"),
        ("Rest", b"LSTB"),
        ("Word", b"UWRD"),
        ("", b"LSTE"),
    ];
    let data = vec![9, 8, 0, 0x12, 0x34, 0x56, 0x78];

    let tpl = parse_with_data(entries, &data);

    assert_eq!(tpl.entries(find_master(&tpl, "Tag")).len(), 2);
    assert_eq!(tpl.entries(find_master(&tpl, "Rest")).len(), 2);
    assert_eq!(tpl.get_resource_data(), data);
}

#[test]
fn nested_counted_lists_round_trip() {
    let entries: &[(&str, &[u8; 4])] = &[
        ("Groups", b"OCNT"),
        ("Group", b"LSTC"),
        ("Members", b"BCNT"),
        ("Member", b"LSTC"),
        ("Id", b"UBYT"),
        ("", b"LSTE"),
        ("", b"LSTE"),
    ];
    // Two groups: [10, 11] and [12].
    let data = vec![0x00, 0x02, 2, 10, 11, 1, 12];

    let tpl = parse_with_data(entries, &data);

    let groups = find_master(&tpl, "Group");
    assert_eq!(tpl.entries(groups).len(), 2);
    assert_eq!(tpl.get_resource_data(), data);
}

#[test]
fn bit_fields_share_one_backing_byte() {
    let entries: &[(&str, &[u8; 4])] = &[
        ("High", b"BB04"),
        ("Mid", b"BB02"),
        ("A", b"BBIT"),
        ("B", b"BBIT"),
        ("Tail", b"UBYT"),
    ];
    let data = vec![0b1011_0110, 0xAA];

    let tpl = parse_with_data(entries, &data);

    assert_eq!(tpl.value(find(&tpl, "High")), Value::UInt(0b1011));
    assert_eq!(tpl.value(find(&tpl, "Mid")), Value::UInt(0b01));
    assert_eq!(tpl.value(find(&tpl, "A")), Value::UInt(1));
    assert_eq!(tpl.value(find(&tpl, "B")), Value::UInt(0));
    assert_eq!(tpl.value(find(&tpl, "Tail")), Value::UInt(0xAA));
    assert_eq!(tpl.get_resource_data(), data);
}

#[test]
fn hex_dumps_round_trip() {
    let entries: &[(&str, &[u8; 4])] = &[
        ("Header", b"H003"),
        ("Blob", b"BSHX"),
        ("Tail", b"HEXD"),
    ];
    let data = vec![1, 2, 3, 0x03, 0xAA, 0xBB, 0xFE, 0xFF];

    let tpl = parse_with_data(entries, &data);

    assert_eq!(tpl.value(find(&tpl, "Header")), Value::Bytes(&[1, 2, 3]));
    // BSHX length includes the length byte itself.
    assert_eq!(tpl.value(find(&tpl, "Blob")), Value::Bytes(&[0xAA, 0xBB]));
    assert_eq!(tpl.value(find(&tpl, "Tail")), Value::Bytes(&[0xFE, 0xFF]));
    assert_eq!(tpl.get_resource_data(), data);
}

#[test]
fn alignment_and_fill_account_for_their_bytes() {
    let entries: &[(&str, &[u8; 4])] = &[
        ("Id", b"UBYT"),
        ("", b"AWRD"),
        ("Word", b"UWRD"),
        ("", b"FBYT"),
        ("Last", b"UBYT"),
    ];
    let data = vec![7, 0, 0x12, 0x34, 0, 9];

    let tpl = parse_with_data(entries, &data);

    assert_eq!(tpl.value(find(&tpl, "Word")), Value::UInt(0x1234));
    assert_eq!(tpl.value(find(&tpl, "Last")), Value::UInt(9));
    assert_eq!(tpl.get_resource_data(), data);
}

#[test]
fn dates_round_trip_through_the_classic_epoch() {
    let entries: &[(&str, &[u8; 4])] = &[("Modified", b"DATE")];
    // 2_082_844_800 seconds after 1904-01-01 is the Unix epoch.
    let data = 2_082_844_800u32.to_be_bytes().to_vec();

    let tpl = parse_with_data(entries, &data);

    match tpl.value(find(&tpl, "Modified")) {
        Value::Timestamp(ts) => assert_eq!(ts.as_second(), 0),
        other => panic!("unexpected value: {other:?}"),
    }
    assert_eq!(tpl.get_resource_data(), data);
}

#[test]
fn colors_round_trip() {
    let entries: &[(&str, &[u8; 4])] = &[("Deep", b"COLR"), ("Packed", b"WCOL")];
    let data = vec![0xFF, 0xFF, 0x80, 0x00, 0x00, 0x00, 0x7C, 0x00];

    let tpl = parse_with_data(entries, &data);

    assert_eq!(
        tpl.value(find(&tpl, "Deep")),
        Value::Color {
            r: 0xFF,
            g: 0x80,
            b: 0x00
        }
    );
    assert_eq!(
        tpl.value(find(&tpl, "Packed")),
        Value::Color {
            r: 0xFF,
            g: 0x00,
            b: 0x00
        }
    );
    assert_eq!(tpl.get_resource_data(), data);
}

#[test]
fn short_data_stops_quietly_and_leaves_defaults() {
    let entries: &[(&str, &[u8; 4])] = &[
        ("First", b"UWRD"),
        ("Second", b"UWRD"),
        ("Third", b"UWRD"),
    ];
    // Only the first field and half of the second are present.
    let mut tpl = parse(entries);
    tpl.read_resource(&[0x00, 0x05, 0x01]).unwrap();

    assert_eq!(tpl.value(find(&tpl, "First")), Value::UInt(5));
    assert_eq!(tpl.value(find(&tpl, "Second")), Value::UInt(0));
    assert_eq!(tpl.value(find(&tpl, "Third")), Value::UInt(0));
}
