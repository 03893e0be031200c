use hashbrown::HashMap;

use crate::element::TypeCode;
use crate::fields::{Kind, bits, case, color, cosmetic, counter, datetime, hexdump, key, list,
    scalar, string};

/// Builds a [`Kind`] from a resolved type code and the entry's raw label.
/// Returns `None` when the code's parameters are unusable, which surfaces as
/// `UnknownElement` exactly like an unregistered code.
pub(crate) type Constructor = fn(TypeCode, &str) -> Option<Kind>;

/// The type-code table: exact 4-character codes, plus family constructors
/// for the `X###` (letter + 3 hex digits, suffix `000` reserved) and `XX##`
/// (two letters + 2 digits, suffix `00` reserved) parametrized patterns.
///
/// Built once and passed explicitly to the parser; there is no global table.
pub struct Registry {
    codes: HashMap<&'static [u8], Constructor>,
}

impl Registry {
    pub fn new() -> Self {
        let mut codes: HashMap<&'static [u8], Constructor> = HashMap::new();
        let mut reg = |code: &'static [u8], ctor: Constructor| {
            codes.insert(code, ctor);
        };

        // integers
        reg(b"DBYT", scalar::signed_int);
        reg(b"DWRD", scalar::signed_int);
        reg(b"DLNG", scalar::signed_int);
        reg(b"DLLG", scalar::signed_int);
        reg(b"UBYT", scalar::unsigned_int);
        reg(b"UWRD", scalar::unsigned_int);
        reg(b"ULNG", scalar::unsigned_int);
        reg(b"ULLG", scalar::unsigned_int);
        reg(b"HBYT", scalar::hex_int);
        reg(b"HWRD", scalar::hex_int);
        reg(b"HLNG", scalar::hex_int);
        reg(b"HLLG", scalar::hex_int);

        // multiple fields
        reg(b"RECT", scalar::rect);
        reg(b"PNT ", scalar::point);

        // align & fill
        reg(b"AWRD", scalar::align);
        reg(b"ALNG", scalar::align);
        reg(b"AL08", scalar::align);
        reg(b"AL16", scalar::align);
        reg(b"FBYT", scalar::fill);
        reg(b"FWRD", scalar::fill);
        reg(b"FLNG", scalar::fill);
        reg(b"FLLG", scalar::fill);
        reg(b"F", scalar::fill); // Fnnn

        // fractions
        reg(b"REAL", scalar::real);
        reg(b"DOUB", scalar::doub);

        // strings
        reg(b"PSTR", string::string);
        reg(b"BSTR", string::string);
        reg(b"WSTR", string::string);
        reg(b"LSTR", string::string);
        reg(b"OSTR", string::string);
        reg(b"ESTR", string::string);
        reg(b"CSTR", string::string);
        reg(b"OCST", string::string);
        reg(b"ECST", string::string);
        reg(b"P", string::string); // Pnnn
        reg(b"C", string::string); // Cnnn
        reg(b"CHAR", string::char_field);
        reg(b"TNAM", string::type_name);

        // bits
        reg(b"BOOL", scalar::bool_field);
        reg(b"BFLG", scalar::flag);
        reg(b"WFLG", scalar::flag);
        reg(b"LFLG", scalar::flag);
        reg(b"BBIT", bits::bit_field);
        reg(b"BB", bits::bit_field); // BBnn bit field
        reg(b"WBIT", bits::bit_field);
        reg(b"WB", bits::bit_field); // WBnn
        reg(b"LBIT", bits::bit_field);
        reg(b"LB", bits::bit_field); // LBnn
        reg(b"BORV", bits::or_value);
        reg(b"WORV", bits::or_value);
        reg(b"LORV", bits::or_value);

        // hex dumps
        reg(b"HEXD", hexdump::hex_dump);
        reg(b"H", hexdump::hex_dump); // Hnnn
        reg(b"BHEX", hexdump::hex_dump);
        reg(b"WHEX", hexdump::hex_dump);
        reg(b"LHEX", hexdump::hex_dump);
        reg(b"BSHX", hexdump::hex_dump);
        reg(b"WSHX", hexdump::hex_dump);
        reg(b"LSHX", hexdump::hex_dump);

        // list counters
        reg(b"OCNT", counter::counter);
        reg(b"ZCNT", counter::counter);
        reg(b"BCNT", counter::counter);
        reg(b"WCNT", counter::counter);
        reg(b"LCNT", counter::counter);
        reg(b"LZCT", counter::counter);
        reg(b"FCNT", counter::fixed_count);
        // list begin/end
        reg(b"LSTB", list::list_field);
        reg(b"LSTZ", list::list_field);
        reg(b"LSTC", list::list_field);
        reg(b"LSTE", cosmetic::end);

        // option lists
        reg(b"CASE", case::case_field);
        reg(b"CASR", case::case_range);
        reg(b"RSID", case::res_id);

        // key selection
        reg(b"KBYT", key::key_field);
        reg(b"KWRD", key::key_field);
        reg(b"KLNG", key::key_field);
        reg(b"KLLG", key::key_field);
        reg(b"KUBT", key::key_field);
        reg(b"KUWD", key::key_field);
        reg(b"KULG", key::key_field);
        reg(b"KULL", key::key_field);
        reg(b"KHBT", key::key_field);
        reg(b"KHWD", key::key_field);
        reg(b"KHLG", key::key_field);
        reg(b"KHLL", key::key_field);
        reg(b"KCHR", key::key_field);
        reg(b"KTYP", key::key_field);
        reg(b"KRID", key::key_field);
        // keyed section begin/end
        reg(b"KEYB", key::section);
        reg(b"KEYE", cosmetic::end);

        // dates
        reg(b"DATE", datetime::date);
        reg(b"MDAT", datetime::date);
        reg(b"LLDT", datetime::date);

        // colours
        reg(b"COLR", color::color);
        reg(b"WCOL", color::color);
        reg(b"LCOL", color::color);

        // cosmetic
        reg(b"DVDR", cosmetic::divider);
        reg(b"RREF", cosmetic::cross_ref);
        reg(b"PACK", cosmetic::pack);

        // compatibility aliases, decoded as plain integers
        reg(b"SFRC", scalar::unsigned_int); // 0.16 fixed fraction
        reg(b"FXYZ", scalar::unsigned_int); // 1.15 fixed fraction
        reg(b"FWID", scalar::unsigned_int); // 4.12 fixed fraction
        reg(b"FRAC", scalar::unsigned_int); // 2.30 fixed fraction
        reg(b"FIXD", scalar::unsigned_int); // 16.16 fixed fraction
        reg(b"STYL", scalar::signed_int); // QuickDraw font style
        reg(b"SCPC", scalar::signed_int); // script code
        reg(b"LNGC", scalar::signed_int); // language code
        reg(b"RGNC", scalar::signed_int); // region code

        Registry { codes }
    }

    /// Resolves a type code: exact codes first, then the parametrized
    /// patterns keyed by their letter prefix.
    pub(crate) fn resolve(&self, tc: TypeCode) -> Option<Constructor> {
        let bytes = tc.as_bytes();
        if let Some(&ctor) = self.codes.get(bytes.as_slice()) {
            return Some(ctor);
        }
        if is_x_pattern(&bytes) {
            if let Some(&ctor) = self.codes.get(tc.prefix1()) {
                return Some(ctor);
            }
        }
        if is_xx_pattern(&bytes) {
            if let Some(&ctor) = self.codes.get(tc.prefix2()) {
                return Some(ctor);
            }
        }
        None
    }

    /// Whether the code is the repeat pseudo-element `R###`.
    pub(crate) fn is_repeat(&self, tc: TypeCode) -> bool {
        let bytes = tc.as_bytes();
        bytes[0] == b'R' && is_x_pattern(&bytes)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// One uppercase letter, a decimal digit, then two hex digits; the all-zero
/// suffix is reserved so plain alphabetic codes stay available.
fn is_x_pattern(bytes: &[u8; 4]) -> bool {
    bytes[0].is_ascii_uppercase()
        && bytes[1].is_ascii_digit()
        && bytes[2..].iter().all(|b| b.is_ascii_hexdigit())
        && &bytes[1..] != b"000"
}

/// Two uppercase letters then two decimal digits; the `00` suffix is reserved.
fn is_xx_pattern(bytes: &[u8; 4]) -> bool {
    bytes[..2].iter().all(|b| b.is_ascii_uppercase())
        && bytes[2..].iter().all(|b| b.is_ascii_digit())
        && &bytes[2..] != b"00"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tc(code: &[u8; 4]) -> TypeCode {
        TypeCode::new(*code)
    }

    #[test]
    fn exact_codes_resolve() {
        let reg = Registry::new();
        assert!(reg.resolve(tc(b"DBYT")).is_some());
        assert!(reg.resolve(tc(b"PNT ")).is_some());
        assert!(reg.resolve(tc(b"ZZZZ")).is_none());
    }

    #[test]
    fn parametrized_patterns_resolve_by_prefix() {
        let reg = Registry::new();
        assert!(reg.resolve(tc(b"P100")).is_some());
        assert!(reg.resolve(tc(b"C020")).is_some());
        assert!(reg.resolve(tc(b"H00C")).is_some());
        assert!(reg.resolve(tc(b"F0FF")).is_some());
        assert!(reg.resolve(tc(b"BB08")).is_some());
        assert!(reg.resolve(tc(b"WB12")).is_some());
    }

    #[test]
    fn reserved_suffixes_do_not_match_patterns() {
        let reg = Registry::new();
        // The 000/00 suffixes stay reserved for plain codes.
        assert!(reg.resolve(tc(b"P000")).is_none());
        assert!(reg.resolve(tc(b"BB00")).is_none());
        // Alphabetic second characters are not pattern material.
        assert!(reg.resolve(tc(b"PACE")).is_none());
    }

    #[test]
    fn repeat_is_detected_but_not_registered() {
        let reg = Registry::new();
        assert!(reg.is_repeat(tc(b"R003")));
        assert!(!reg.is_repeat(tc(b"R000")));
        assert!(reg.resolve(tc(b"R003")).is_none());
    }
}
