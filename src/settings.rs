use encoding::EncodingRef;
use encoding::all::MAC_ROMAN;
use std::fmt;

/// Decode/encode configuration, threaded by reference through every pass.
///
/// Classic resource data carries text in a single-byte legacy encoding; the
/// codec is configurable for templates that target another script system.
#[derive(Clone, Copy)]
pub struct TemplateSettings {
    text_codec: EncodingRef,
    resource_id: i16,
}

impl TemplateSettings {
    pub fn new() -> Self {
        TemplateSettings {
            text_codec: MAC_ROMAN,
            resource_id: 0,
        }
    }

    /// Sets the legacy text codec used for all label and string decoding.
    pub fn text_codec(mut self, codec: EncodingRef) -> Self {
        self.text_codec = codec;
        self
    }

    /// Sets the id of the record being decoded, consumed by own-id keys.
    pub fn resource_id(mut self, id: i16) -> Self {
        self.resource_id = id;
        self
    }

    pub fn get_text_codec(&self) -> EncodingRef {
        self.text_codec
    }

    pub fn get_resource_id(&self) -> i16 {
        self.resource_id
    }
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TemplateSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateSettings")
            .field("text_codec", &self.text_codec.name())
            .field("resource_id", &self.resource_id)
            .finish()
    }
}
