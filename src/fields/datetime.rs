use jiff::Timestamp;
use log::warn;

use crate::cursor::{ByteReader, ByteWriter};
use crate::element::TypeCode;
use crate::err::Result;
use crate::fields::Kind;
use crate::value::Value;

/// Seconds between the classic epoch (1904-01-01T00:00:00Z) and the Unix
/// epoch.
pub(crate) const CLASSIC_EPOCH_OFFSET: i64 = 2_082_844_800;

/// DATE/MDAT: 4-byte seconds since the classic epoch; LLDT: the 8-byte form.
#[derive(Debug, Clone)]
pub(crate) struct DateField {
    pub(crate) width: u8,
    pub(crate) raw: u64,
}

pub(crate) fn date(tc: TypeCode, _label: &str) -> Option<Kind> {
    let width = match &tc.as_bytes() {
        b"DATE" | b"MDAT" => 4,
        b"LLDT" => 8,
        _ => return None,
    };
    Some(Kind::Date(DateField { width, raw: 0 }))
}

impl DateField {
    pub(crate) fn read(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        self.raw = r.uint(self.width, "date")?;
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.write_uint(self.width, self.raw);
    }

    pub(crate) fn value(&self) -> Value<'_> {
        let Ok(raw) = i64::try_from(self.raw) else {
            warn!("date value {} is not representable", self.raw);
            return Value::UInt(self.raw);
        };
        match Timestamp::from_second(raw - CLASSIC_EPOCH_OFFSET) {
            Ok(ts) => Value::Timestamp(ts),
            Err(_) => {
                warn!("date value {} is not representable", self.raw);
                Value::UInt(self.raw)
            }
        }
    }

    pub(crate) fn set(&mut self, ts: Timestamp) -> std::result::Result<(), String> {
        let secs = ts.as_second() + CLASSIC_EPOCH_OFFSET;
        if secs < 0 {
            return Err("date precedes the classic epoch".to_string());
        }
        if self.width == 4 && secs > i64::from(u32::MAX) {
            return Err("date does not fit a 4-byte field".to_string());
        }
        self.raw = secs as u64;
        Ok(())
    }
}
