//! Message fields and their derived byte layout

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::names::{format_description, format_name, NameFormat};

/// Declared type of the special field that carries the protocol version.
/// It is laid out and checksummed as a plain `uint8_t`.
pub const MAVLINK_VERSION_TYPE: &str = "uint8_t_mavlink_version";

/// Largest array length a field may declare. The length enters the CRC_EXTRA
/// stream as a single byte.
pub const MAX_ARRAY_LEN: u8 = u8::MAX;

/// Primitive wire types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Uint64,
    Int64,
    Double,
    Uint32,
    Int32,
    Float,
    Uint16,
    Int16,
    Uint8,
    Int8,
    Char,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 11] = [
        PrimitiveType::Uint64,
        PrimitiveType::Int64,
        PrimitiveType::Double,
        PrimitiveType::Uint32,
        PrimitiveType::Int32,
        PrimitiveType::Float,
        PrimitiveType::Uint16,
        PrimitiveType::Int16,
        PrimitiveType::Uint8,
        PrimitiveType::Int8,
        PrimitiveType::Char,
    ];

    /// Look up a primitive by the name used in dialect files (e.g. `uint16_t`)
    pub fn from_c_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.c_name() == name)
    }

    /// Name used in dialect files and in the CRC_EXTRA stream
    pub fn c_name(&self) -> &'static str {
        match self {
            PrimitiveType::Uint64 => "uint64_t",
            PrimitiveType::Int64 => "int64_t",
            PrimitiveType::Double => "double",
            PrimitiveType::Uint32 => "uint32_t",
            PrimitiveType::Int32 => "int32_t",
            PrimitiveType::Float => "float",
            PrimitiveType::Uint16 => "uint16_t",
            PrimitiveType::Int16 => "int16_t",
            PrimitiveType::Uint8 => "uint8_t",
            PrimitiveType::Int8 => "int8_t",
            PrimitiveType::Char => "char",
        }
    }

    /// Width in bytes of a single value
    pub fn width(&self) -> usize {
        match self {
            PrimitiveType::Uint64 | PrimitiveType::Int64 | PrimitiveType::Double => 8,
            PrimitiveType::Uint32 | PrimitiveType::Int32 | PrimitiveType::Float => 4,
            PrimitiveType::Uint16 | PrimitiveType::Int16 => 2,
            PrimitiveType::Uint8 | PrimitiveType::Int8 | PrimitiveType::Char => 1,
        }
    }
}

impl std::fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.c_name())
    }
}

/// Why a declared type string could not be laid out
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("unknown base type '{0}'")]
    UnknownType(String),

    #[error("{0}")]
    MalformedArray(String),
}

/// Layout derived from a declared type string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldLayout {
    pub base_type: PrimitiveType,
    /// 0 for scalars
    pub array_len: u8,
    /// Declared as `uint8_t_mavlink_version`
    pub is_version: bool,
}

impl FieldLayout {
    pub fn is_array(&self) -> bool {
        self.array_len > 0
    }

    pub fn base_width(&self) -> usize {
        self.base_type.width()
    }

    /// Total bytes the field occupies on the wire
    pub fn byte_length(&self) -> usize {
        if self.is_array() {
            self.base_width() * usize::from(self.array_len)
        } else {
            self.base_width()
        }
    }
}

/// Derive the byte layout of a declared field type such as `float` or `char[16]`.
///
/// Pure: the same input always produces the same layout or the same error.
pub fn derive_layout(type_decl: &str) -> Result<FieldLayout, LayoutError> {
    let Some(open) = type_decl.find('[') else {
        if type_decl == MAVLINK_VERSION_TYPE {
            return Ok(FieldLayout {
                base_type: PrimitiveType::Uint8,
                array_len: 0,
                is_version: true,
            });
        }
        let base_type = PrimitiveType::from_c_name(type_decl)
            .ok_or_else(|| LayoutError::UnknownType(type_decl.to_string()))?;
        return Ok(FieldLayout { base_type, array_len: 0, is_version: false });
    };

    let base = &type_decl[..open];
    let base_type = PrimitiveType::from_c_name(base)
        .ok_or_else(|| LayoutError::UnknownType(base.to_string()))?;

    let inner = type_decl[open + 1..].strip_suffix(']').ok_or_else(|| {
        LayoutError::MalformedArray(format!("missing closing bracket in '{}'", type_decl))
    })?;
    let len: u32 = inner.parse().map_err(|_| {
        LayoutError::MalformedArray(format!("array length '{}' is not an integer", inner))
    })?;
    if len == 0 || len > u32::from(MAX_ARRAY_LEN) {
        return Err(LayoutError::MalformedArray(format!(
            "array length {} outside 1..={}",
            len, MAX_ARRAY_LEN
        )));
    }

    Ok(FieldLayout {
        base_type,
        array_len: len as u8,
        is_version: false,
    })
}

/// Opaque per-field metadata, passed through to emitters untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    /// Name of the enum the field's values come from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_format: Option<String>,
    #[serde(default)]
    pub instance: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub increment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<String>,
}

/// A single message field. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    type_decl: String,
    layout: FieldLayout,
    description: Option<String>,
    metadata: FieldMetadata,
}

impl Field {
    /// Create a field, deriving its layout from `type_decl`
    pub fn new(name: impl Into<String>, type_decl: impl Into<String>) -> Result<Self, LayoutError> {
        let type_decl = type_decl.into();
        let layout = derive_layout(&type_decl)?;
        Ok(Self {
            name: name.into(),
            type_decl,
            layout,
            description: None,
            metadata: FieldMetadata::default(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metadata(mut self, metadata: FieldMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field name in the requested casing
    pub fn name_as(&self, format: NameFormat) -> String {
        format_name(&self.name, format)
    }

    /// Type exactly as declared, e.g. `char[16]`
    pub fn type_decl(&self) -> &str {
        &self.type_decl
    }

    pub fn layout(&self) -> FieldLayout {
        self.layout
    }

    pub fn base_type(&self) -> PrimitiveType {
        self.layout.base_type
    }

    /// Width of one element of the base type
    pub fn base_type_len(&self) -> usize {
        self.layout.base_width()
    }

    /// 0 for scalars
    pub fn array_len(&self) -> u8 {
        self.layout.array_len
    }

    pub fn is_array(&self) -> bool {
        self.layout.is_array()
    }

    pub fn is_version(&self) -> bool {
        self.layout.is_version
    }

    /// Total bytes on the wire
    pub fn byte_length(&self) -> usize {
        self.layout.byte_length()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn formatted_description(&self, line_prefix: Option<&str>, leading_newline: bool) -> Option<String> {
        self.description
            .as_deref()
            .map(|d| format_description(d, line_prefix, leading_newline))
    }

    pub fn metadata(&self) -> &FieldMetadata {
        &self.metadata
    }
}
