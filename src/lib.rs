//! A fast (and safe) interpreter for classic Macintosh resource templates.
//!
//! A template is a declarative schema describing the byte layout of a
//! resource: fixed fields, repeating lists, keyed variant sections, option
//! enumerations, alignment and fill, and references to other records. This
//! crate parses a template definition into a tree of typed field
//! descriptors, decodes arbitrary resource bytes against that tree, and
//! re-encodes edited fields back to bytes preserving the original layout.
//!
//! ```no_run
//! use restmpl::{Registry, Template, TemplateSettings};
//!
//! # fn main() -> restmpl::Result<()> {
//! let registry = Registry::new();
//! let schema: &[u8] = &[/* (label, type code) pairs */];
//! let mut template = Template::parse(schema, &registry, TemplateSettings::new())?;
//! template.read_resource(&[/* resource bytes */])?;
//! for &field in template.visible_elements(template.root()) {
//!     println!("{}: {:?}", template.element(field).display_label(), template.value(field));
//! }
//! let bytes = template.get_resource_data();
//! # let _ = bytes;
//! # Ok(())
//! # }
//! ```

mod cursor;
mod element;
mod element_list;
mod err;
mod fields;
mod parser;
mod registry;
mod settings;
mod template;
mod value;

pub use crate::cursor::{ByteReader, ByteWriter};
pub use crate::element::{ElemId, Element, ListId, TypeCode};
pub use crate::err::{Result, TemplateError};
pub use crate::fields::case::CaseOption;
pub use crate::registry::Registry;
pub use crate::settings::TemplateSettings;
pub use crate::template::Template;
pub use crate::value::Value;

#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub(crate) fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}
