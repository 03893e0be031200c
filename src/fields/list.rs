use log::{debug, trace};

use crate::cursor::{ByteReader, ByteWriter};
use crate::element::{Element, ElemId, ListId, TypeCode};
use crate::err::Result;
use crate::fields::Kind;
use crate::fields::counter::CounterField;
use crate::template::Template;

pub(crate) const LSTE: TypeCode = TypeCode::new(*b"LSTE");

/// How a repeating list decides when to stop producing entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ListForm {
    /// LSTB: entries repeat until the data runs out.
    Open,
    /// LSTZ: entries repeat until a zero byte appears where the next entry
    /// would begin; the terminator is consumed.
    ZeroTerminated,
    /// LSTC: the entry count comes from the nearest preceding counter.
    Counted,
    /// LSTC driven by FCNT: the count is static, entries exist from
    /// configure time and cannot be added or removed.
    FixedCount,
}

#[derive(Debug, Clone)]
pub(crate) enum ListRole {
    /// The marker element from the schema. It owns the unconfigured template
    /// of the repeated block and tracks the materialized entries, which live
    /// as its siblings.
    Master {
        template: Option<ListId>,
        counter: Option<ElemId>,
        entries: Vec<ElemId>,
    },
    /// One materialized repetition, owning its own configured sub-list.
    /// Entries of dynamic lists are driven by the master during the read
    /// pass; entries of fixed lists read themselves from the main walk.
    Entry { sub: ListId, managed: bool },
}

#[derive(Debug, Clone)]
pub(crate) struct ListField {
    pub(crate) form: ListForm,
    pub(crate) role: ListRole,
}

pub(crate) fn list_field(tc: TypeCode, _label: &str) -> Option<Kind> {
    let form = match &tc.as_bytes() {
        b"LSTB" => ListForm::Open,
        b"LSTZ" => ListForm::ZeroTerminated,
        b"LSTC" => ListForm::Counted,
        _ => return None,
    };
    Some(Kind::List(ListField {
        form,
        role: ListRole::Master {
            template: None,
            counter: None,
            entries: Vec::new(),
        },
    }))
}

impl ListField {
    pub(crate) fn configure(
        &mut self,
        tpl: &mut Template,
        id: ElemId,
        list: ListId,
    ) -> Result<()> {
        let ListRole::Master {
            template,
            counter,
            entries,
        } = &mut self.role
        else {
            return Ok(());
        };
        let tc = tpl.elem(id).type_code;
        let label = tpl.elem(id).label.clone();
        let tmpl = tpl.sub_list(list, LSTE, tc, &label)?;
        *template = Some(tmpl);

        if self.form == ListForm::Counted {
            let found = tpl.previous_matching(list, |e| matches!(e.kind, Kind::Counter(_)));
            let Some(counter_id) = found else {
                return Err(tpl.invalid(id, "no preceding count field"));
            };
            let fixed = matches!(
                &tpl.elem(counter_id).kind,
                Kind::Counter(c) if c.is_fixed()
            );
            if fixed {
                self.form = ListForm::FixedCount;
                let count = match &tpl.elem(counter_id).kind {
                    Kind::Counter(c) => c.count,
                    _ => unreachable!(),
                };
                debug!("materializing {count} fixed entries for {tc} \u{201c}{label}\u{201d}");
                for _ in 0..count {
                    let sub = tpl.instantiate_list(tmpl, list)?;
                    let entry = entry_element(tpl.elem(id), sub, false);
                    let entry_id = tpl.insert_at_cursor(list, entry);
                    entries.push(entry_id);
                }
            }
            *counter = Some(counter_id);
        }
        Ok(())
    }

    pub(crate) fn read(
        &mut self,
        tpl: &mut Template,
        id: ElemId,
        list: ListId,
        r: &mut ByteReader<'_>,
    ) -> Result<()> {
        let ListRole::Master {
            template,
            counter,
            entries,
        } = &mut self.role
        else {
            // Fixed-count entries are read by the main walk; dynamic entries
            // were already filled in by their master.
            if let ListRole::Entry {
                sub,
                managed: false,
            } = &self.role
            {
                return tpl.read_list(*sub, r);
            }
            return Ok(());
        };
        if self.form == ListForm::FixedCount {
            return Ok(());
        }
        let tmpl = template.expect("configured list master always has a template");

        // A fresh read pass replaces any entries from a previous one.
        for stale in entries.drain(..) {
            tpl.remove_from_list(list, stale);
        }

        fn produce(
            tpl: &mut Template,
            entries: &mut Vec<ElemId>,
            r: &mut ByteReader<'_>,
            tmpl: ListId,
            id: ElemId,
            list: ListId,
        ) -> Result<()> {
            let sub = tpl.instantiate_list(tmpl, list)?;
            let entry = entry_element(tpl.elem(id), sub, true);
            let entry_id = tpl.insert_at_cursor(list, entry);
            entries.push(entry_id);
            tpl.read_list(sub, r)
        }

        match self.form {
            ListForm::Open => {
                while r.remaining() > 0 {
                    produce(tpl, entries, r, tmpl, id, list)?;
                }
            }
            ListForm::ZeroTerminated => {
                loop {
                    if r.remaining() == 0 {
                        break;
                    }
                    let mark = r.position() as usize;
                    if r.u8("list terminator")? == 0 {
                        break;
                    }
                    r.set_position(mark, "list entry")?;
                    produce(tpl, entries, r, tmpl, id, list)?;
                }
            }
            ListForm::Counted => {
                let count = match counter.map(|c| &tpl.elem(c).kind) {
                    Some(Kind::Counter(c)) => c.count,
                    _ => 0,
                };
                trace!("reading {count} counted entries");
                for _ in 0..count {
                    produce(tpl, entries, r, tmpl, id, list)?;
                }
            }
            ListForm::FixedCount => unreachable!(),
        }
        Ok(())
    }

    pub(crate) fn write(&self, tpl: &Template, w: &mut ByteWriter) {
        match &self.role {
            ListRole::Master { .. } => {
                // Entries are siblings and write themselves; the zero
                // terminator trails them because the master sits after the
                // entries it inserted.
                if self.form == ListForm::ZeroTerminated {
                    w.write_u8(0);
                }
            }
            ListRole::Entry { sub, .. } => tpl.write_list(*sub, w),
        }
    }

    pub(crate) fn size(&self, tpl: &Template, size: &mut u64) {
        match &self.role {
            ListRole::Master { .. } => {
                if self.form == ListForm::ZeroTerminated {
                    *size += 1;
                }
            }
            ListRole::Entry { sub, .. } => tpl.size_list(*sub, size),
        }
    }

    pub(crate) fn entries(&self) -> &[ElemId] {
        match &self.role {
            ListRole::Master { entries, .. } => entries,
            ListRole::Entry { .. } => &[],
        }
    }

    pub(crate) fn counter_id(&self) -> Option<ElemId> {
        match &self.role {
            ListRole::Master { counter, .. } => *counter,
            ListRole::Entry { .. } => None,
        }
    }
}

/// Builds the element representing one materialized repetition.
pub(crate) fn entry_element(master: &Element, sub: ListId, managed: bool) -> Element {
    Element::new(
        master.type_code,
        master.label.clone(),
        master.ctor,
        Kind::List(ListField {
            form: ListForm::FixedCount,
            role: ListRole::Entry { sub, managed },
        }),
    )
}

/// Validates that a counter can still encode `count` entries.
pub(crate) fn check_capacity(counter: &CounterField, count: usize) -> std::result::Result<(), String> {
    if count as u64 > u64::from(counter.max_count()) {
        return Err(format!(
            "the count field cannot encode more than {} entries",
            counter.max_count()
        ));
    }
    Ok(())
}
