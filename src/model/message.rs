//! Messages: field reordering, byte length and CRC_EXTRA

use std::cmp::Reverse;

use crate::checksum::CrcExtra;

use super::names::{format_description, format_name, NameFormat};
use super::{Deprecation, Field};

/// A field together with its byte offset inside the payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSlot<'a> {
    pub offset: usize,
    pub field: &'a Field,
}

/// A single wire message.
///
/// All derived attributes (wire order, lengths, CRC_EXTRA) are computed once by
/// [`MessageBuilder::build`]; a `Message` is immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    id: u32,
    name: String,
    description: Option<String>,
    /// Declaration order; extension fields start at `extension_start`
    fields: Vec<Field>,
    extension_start: usize,
    has_extensions: bool,
    /// Indices into `fields` in serialization order
    wire_order: Vec<usize>,
    byte_length: usize,
    base_byte_length: usize,
    crc_extra: CrcExtra,
    deprecation: Option<Deprecation>,
    wip: bool,
}

impl Message {
    pub fn builder(id: u32, name: impl Into<String>) -> MessageBuilder {
        MessageBuilder {
            id,
            name: name.into(),
            description: None,
            fields: Vec::new(),
            extension_fields: Vec::new(),
            has_extensions: false,
            deprecation: None,
            wip: false,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Message name in the requested casing
    pub fn name_as(&self, format: NameFormat) -> String {
        format_name(&self.name, format)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn formatted_description(&self, line_prefix: Option<&str>, leading_newline: bool) -> Option<String> {
        self.description
            .as_deref()
            .map(|d| format_description(d, line_prefix, leading_newline))
    }

    /// Non-extension fields in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields[..self.extension_start]
    }

    /// Extension fields in declaration order
    pub fn extension_fields(&self) -> &[Field] {
        &self.fields[self.extension_start..]
    }

    /// Every field in declaration order, extensions last
    pub fn all_fields(&self) -> &[Field] {
        &self.fields
    }

    /// Every field in serialization order: non-extension fields by descending
    /// base width (stable), then extension fields in declaration order
    pub fn sorted_fields(&self) -> impl Iterator<Item = &Field> + '_ {
        self.wire_order.iter().map(|&idx| &self.fields[idx])
    }

    /// The reordered non-extension fields, the ones covered by CRC_EXTRA
    pub fn sorted_base_fields(&self) -> impl Iterator<Item = &Field> + '_ {
        self.wire_order[..self.extension_start]
            .iter()
            .map(|&idx| &self.fields[idx])
    }

    /// Fields with their payload offsets, in serialization order
    pub fn wire_layout(&self) -> Vec<FieldSlot<'_>> {
        let mut offset = 0;
        self.sorted_fields()
            .map(|field| {
                let slot = FieldSlot { offset, field };
                offset += field.byte_length();
                slot
            })
            .collect()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Number of fields including extension fields
    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Whether an `<extensions/>` marker was declared (it may be followed by no fields)
    pub fn has_extensions(&self) -> bool {
        self.has_extensions
    }

    /// Maximum payload length in bytes, extension fields included
    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    /// Payload length without extension fields
    pub fn base_byte_length(&self) -> usize {
        self.base_byte_length
    }

    pub fn crc_extra(&self) -> CrcExtra {
        self.crc_extra
    }

    pub fn deprecation(&self) -> Option<&Deprecation> {
        self.deprecation.as_ref()
    }

    pub fn is_wip(&self) -> bool {
        self.wip
    }
}

/// Collects a message's declared content, then derives its layout
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    id: u32,
    name: String,
    description: Option<String>,
    fields: Vec<Field>,
    extension_fields: Vec<Field>,
    has_extensions: bool,
    deprecation: Option<Deprecation>,
    wip: bool,
}

impl MessageBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a field. After [`MessageBuilder::extensions`] it becomes an extension field.
    pub fn field(mut self, field: Field) -> Self {
        if self.has_extensions {
            self.extension_fields.push(field);
        } else {
            self.fields.push(field);
        }
        self
    }

    /// Mark the start of the extension fields
    pub fn extensions(mut self) -> Self {
        self.has_extensions = true;
        self
    }

    pub fn deprecated(mut self, deprecation: Deprecation) -> Self {
        self.deprecation = Some(deprecation);
        self
    }

    pub fn wip(mut self) -> Self {
        self.wip = true;
        self
    }

    pub fn build(self) -> Message {
        let extension_start = self.fields.len();

        // widest first, declaration order among equal widths
        let mut wire_order: Vec<usize> = (0..extension_start).collect();
        wire_order.sort_by_key(|&idx| Reverse(self.fields[idx].base_type_len()));

        let base_byte_length: usize = self.fields.iter().map(Field::byte_length).sum();
        let byte_length = base_byte_length
            + self
                .extension_fields
                .iter()
                .map(Field::byte_length)
                .sum::<usize>();

        let crc_extra = CrcExtra::compute(
            &self.name,
            wire_order.iter().map(|&idx| &self.fields[idx]),
        );

        let mut fields = self.fields;
        fields.extend(self.extension_fields);
        wire_order.extend(extension_start..fields.len());

        Message {
            id: self.id,
            name: self.name,
            description: self.description,
            fields,
            extension_start,
            has_extensions: self.has_extensions,
            wire_order,
            byte_length,
            base_byte_length,
            crc_extra,
            deprecation: self.deprecation,
            wip: self.wip,
        }
    }
}
