use thiserror::Error;

pub type Result<T> = std::result::Result<T, TemplateError>;

/// Errors surfaced by template parsing and resource decoding.
///
/// Encoding does not produce errors: `write_data` only serializes state that
/// already passed validation, so a failure there is a programming error, not
/// a recoverable condition.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("corrupt or insufficient template data")]
    Corrupt,

    #[error("unknown element type `{0}`")]
    UnknownElement(String),

    #[error("{type_code} \u{201c}{label}\u{201d}: closing `{end_type}` element not found")]
    UnclosedElement {
        type_code: String,
        label: String,
        end_type: String,
    },

    #[error("{type_code} \u{201c}{label}\u{201d}: {message}")]
    InvalidStructure {
        type_code: String,
        label: String,
        message: String,
    },

    #[error("offset {offset}: ran out of data reading {what} (need {need}, have {have})")]
    OutOfData {
        what: &'static str,
        offset: u64,
        need: usize,
        have: usize,
    },
}

impl TemplateError {
    /// True for the truncation variant that the top-level read pass tolerates
    /// as an early-stop signal.
    pub fn is_out_of_data(&self) -> bool {
        matches!(self, TemplateError::OutOfData { .. })
    }
}
